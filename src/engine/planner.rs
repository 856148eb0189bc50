//! Workspace-level planning: one change per configured or recorded space

use anyhow::{Context, Result};
use declarative::{ExecutionPlan, MutationStep, Preview, Reconciler, SpaceClient, SpaceState};

use crate::config::SpacesConfig;
use crate::state::StateFile;

/// What happens to one space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Update,
    Delete,
    NoOp,
    Invalid,
}

impl Action {
    fn of(plan: &ExecutionPlan) -> Self {
        if plan.invalid_reason().is_some() {
            Self::Invalid
        } else if plan.is_create() {
            Self::Create
        } else if plan.is_delete() {
            Self::Delete
        } else if plan.is_empty() {
            Self::NoOp
        } else {
            Self::Update
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Create => "+",
            Self::Update => "~",
            Self::Delete => "-",
            Self::NoOp => "=",
            Self::Invalid => "!",
        }
    }
}

/// A planned change for the space at `address`
#[derive(Debug, Clone)]
pub struct SpaceChange {
    pub address: String,
    pub action: Action,
    pub preview: Preview,
}

impl SpaceChange {
    fn new(address: &str, preview: Preview) -> Self {
        Self {
            address: address.to_string(),
            action: Action::of(&preview.plan),
            preview,
        }
    }

    fn delete(address: &str, prior: &SpaceState) -> Self {
        Self::new(
            address,
            Preview {
                plan: ExecutionPlan::delete(),
                working: prior.clone(),
            },
        )
    }

    /// Remote identity if known, else the name the space will be created with
    pub fn target(&self) -> String {
        if let Some(id) = &self.preview.working.id {
            return id.to_string();
        }
        match self.preview.plan.steps.first() {
            Some(MutationStep::Create(spec)) => match &spec.owner {
                Some(owner) => format!("{owner}/{}", spec.name),
                None => spec.name.clone(),
            },
            _ => self.preview.working.name.clone(),
        }
    }

    pub fn is_change(&self) -> bool {
        self.action != Action::NoOp
    }
}

/// Plan every configured space against the recorded state.
///
/// Spaces recorded in state but absent from the config are planned for
/// deletion.
pub fn build_plan<C: SpaceClient>(
    reconciler: &Reconciler<C>,
    config: &SpacesConfig,
    state: &StateFile,
    target: Option<&str>,
) -> Result<Vec<SpaceChange>> {
    let mut changes = Vec::new();

    for (address, spec) in &config.spaces {
        if !matches_target(address, target) {
            continue;
        }
        let preview = reconciler
            .preview(spec, state.get(address))
            .with_context(|| format!("Failed to plan '{address}'"))?;
        log::debug!("{address}: {} step(s)", preview.plan.len());
        changes.push(SpaceChange::new(address, preview));
    }

    for (address, prior) in &state.spaces {
        if config.spaces.contains_key(address) || !matches_target(address, target) {
            continue;
        }
        log::debug!("{address}: recorded but not configured, planning delete");
        changes.push(SpaceChange::delete(address, prior));
    }

    ensure_target_found(&changes, target)?;
    Ok(changes)
}

/// Plan deletion of every recorded space
pub fn build_destroy_plan(state: &StateFile, target: Option<&str>) -> Result<Vec<SpaceChange>> {
    let changes: Vec<_> = state
        .spaces
        .iter()
        .filter(|(address, _)| matches_target(address, target))
        .map(|(address, prior)| SpaceChange::delete(address, prior))
        .collect();
    ensure_target_found(&changes, target)?;
    Ok(changes)
}

fn matches_target(address: &str, target: Option<&str>) -> bool {
    target.is_none_or(|t| t == address)
}

fn ensure_target_found(changes: &[SpaceChange], target: Option<&str>) -> Result<()> {
    match target {
        Some(t) if changes.is_empty() => {
            anyhow::bail!("No space '{t}' in the configuration or the state file")
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::mock::MockClient;
    use declarative::{SpaceId, SpaceSpec};

    fn config(specs: &[(&str, SpaceSpec)]) -> SpacesConfig {
        let mut config = SpacesConfig::default();
        for (address, spec) in specs {
            config.spaces.insert((*address).to_string(), spec.clone());
        }
        config
    }

    fn spec(name: &str) -> SpaceSpec {
        let mut spec = SpaceSpec::new(name);
        spec.owner = Some("alice".into());
        spec
    }

    fn recorded(address: &str, spec: &SpaceSpec) -> (String, SpaceState) {
        let id = SpaceId::new("alice", spec.name.clone()).unwrap();
        (address.to_string(), SpaceState::from_spec(id, spec))
    }

    #[test]
    fn test_actions() {
        let reconciler = Reconciler::new(MockClient::new());
        let unchanged = spec("docs");
        let mut changed = spec("demo");
        changed.private = Some(true);

        let mut state = StateFile::default();
        let (a, s) = recorded("docs", &unchanged);
        state.record(&a, s);
        let (a, s) = recorded("demo", &spec("demo"));
        state.record(&a, s);
        let (a, s) = recorded("old", &spec("old"));
        state.record(&a, s);

        let config = config(&[
            ("demo", changed),
            ("docs", unchanged),
            ("fresh", spec("fresh")),
            ("broken", SpaceSpec::new("has space")),
        ]);
        let changes = build_plan(&reconciler, &config, &state, None).unwrap();
        let actions: Vec<_> = changes
            .iter()
            .map(|c| (c.address.as_str(), c.action))
            .collect();

        assert_eq!(
            actions,
            vec![
                ("broken", Action::Invalid),
                ("demo", Action::Update),
                ("docs", Action::NoOp),
                ("fresh", Action::Create),
                ("old", Action::Delete),
            ]
        );
        assert!(reconciler.client().calls().is_empty());
    }

    #[test]
    fn test_target_filters() {
        let reconciler = Reconciler::new(MockClient::new());
        let config = config(&[("a", spec("a")), ("b", spec("b"))]);
        let changes = build_plan(&reconciler, &config, &StateFile::default(), Some("b")).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].target(), "alice/b");

        let err = build_plan(&reconciler, &config, &StateFile::default(), Some("zzz")).unwrap_err();
        assert!(err.to_string().contains("zzz"));
    }

    #[test]
    fn test_destroy_covers_state_only() {
        let mut state = StateFile::default();
        let (a, s) = recorded("demo", &spec("demo"));
        state.record(&a, s);

        let changes = build_destroy_plan(&state, None).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].action, Action::Delete);
        assert_eq!(changes[0].target(), "alice/demo");

        assert!(build_destroy_plan(&StateFile::default(), None).unwrap().is_empty());
        assert!(build_destroy_plan(&state, Some("other")).is_err());
    }

    #[test]
    fn test_refresh_failure_names_address() {
        let client = MockClient::new();
        let reconciler = Reconciler::new(client).with_key_refresh(true);
        let mut state = StateFile::default();
        // recorded, but missing remotely
        let (a, s) = recorded("demo", &spec("demo"));
        state.record(&a, s);

        let err = build_plan(&reconciler, &config(&[("demo", spec("demo"))]), &state, None)
            .unwrap_err();
        assert!(err.to_string().contains("'demo'"));
    }
}
