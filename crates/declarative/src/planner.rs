//! Diff planner - builds ordered mutation plans from desired and recorded state

use crate::diff::{FieldChange, diff_keys, immutable_changes};
use crate::error::StepKind;
use crate::types::{Collection, SpaceId, SpaceSpec, SpaceState};
use std::fmt;

/// One remote mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationStep {
    /// Create the space with every field of the `SpaceSpec`, then push its keys
    Create(SpaceSpec),
    /// Rename to `to`; owner is never changed
    Rename { to: SpaceId },
    SetVisibility { private: bool },
    SetHardware { tier: String },
    SetStorage { tier: String },
    SetSleepTime { seconds: i64 },
    RemoveKey { collection: Collection, key: String },
    AddKey { collection: Collection, key: String, value: String },
    Delete,
    /// The desired spec failed validation; executing this plan is refused
    Invalid { reason: String },
}

impl MutationStep {
    pub fn kind(&self) -> StepKind {
        match self {
            Self::Create(_) => StepKind::Create,
            Self::Rename { .. } => StepKind::Rename,
            Self::SetVisibility { .. } => StepKind::SetVisibility,
            Self::SetHardware { .. } => StepKind::SetHardware,
            Self::SetStorage { .. } => StepKind::SetStorage,
            Self::SetSleepTime { .. } => StepKind::SetSleepTime,
            Self::RemoveKey { collection: Collection::Secrets, .. } => StepKind::RemoveSecret,
            Self::RemoveKey { collection: Collection::Variables, .. } => StepKind::RemoveVariable,
            Self::AddKey { collection: Collection::Secrets, .. } => StepKind::AddSecret,
            Self::AddKey { collection: Collection::Variables, .. } => StepKind::AddVariable,
            Self::Delete => StepKind::Delete,
            Self::Invalid { .. } => StepKind::Invalid,
        }
    }

    /// Collection key addressed by this step, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::RemoveKey { key, .. } | Self::AddKey { key, .. } => Some(key),
            _ => None,
        }
    }

    /// Plan-output symbol: `+` add, `-` remove, `~` change.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Create(_) | Self::AddKey { .. } => "+",
            Self::Delete | Self::RemoveKey { .. } => "-",
            Self::Invalid { .. } => "!",
            _ => "~",
        }
    }
}

impl fmt::Display for MutationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create(spec) => {
                let keys = spec.secrets.len() + spec.variables.len();
                write!(f, "create space '{}'", spec.name)?;
                if keys > 0 {
                    write!(f, " with {keys} key(s)")?;
                }
                Ok(())
            }
            Self::Rename { to } => write!(f, "rename to {to}"),
            Self::SetVisibility { private: true } => write!(f, "make private"),
            Self::SetVisibility { private: false } => write!(f, "make public"),
            Self::SetHardware { tier } => write!(f, "set hardware to {tier}"),
            Self::SetStorage { tier } => write!(f, "set storage to {tier}"),
            Self::SetSleepTime { seconds } => write!(f, "set sleep time to {seconds}s"),
            Self::RemoveKey { collection, key } => write!(f, "remove {} {key}", collection.noun()),
            Self::AddKey { collection: Collection::Secrets, key, .. } => {
                write!(f, "add secret {key} = (sensitive)")
            }
            Self::AddKey { collection: Collection::Variables, key, value } => {
                write!(f, "add variable {key} = {value:?}")
            }
            Self::Delete => write!(f, "delete space"),
            Self::Invalid { reason } => write!(f, "invalid: {reason}"),
        }
    }
}

/// An ordered list of mutations for one space
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub steps: Vec<MutationStep>,
    /// Differences in create-only attributes; never executed
    pub ignored: Vec<FieldChange>,
}

impl ExecutionPlan {
    /// Create a new empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Single-step plan deleting the space
    pub fn delete() -> Self {
        Self {
            steps: vec![MutationStep::Delete],
            ignored: Vec::new(),
        }
    }

    fn invalid(reason: impl Into<String>) -> Self {
        Self {
            steps: vec![MutationStep::Invalid {
                reason: reason.into(),
            }],
            ignored: Vec::new(),
        }
    }

    /// Check if plan is empty
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Reason of the validation failure, if the plan is the invalid sentinel
    pub fn invalid_reason(&self) -> Option<&str> {
        self.steps.iter().find_map(|step| match step {
            MutationStep::Invalid { reason } => Some(reason.as_str()),
            _ => None,
        })
    }

    pub fn is_create(&self) -> bool {
        matches!(self.steps.first(), Some(MutationStep::Create(_)))
    }

    pub fn is_delete(&self) -> bool {
        matches!(self.steps.as_slice(), [MutationStep::Delete])
    }
}

/// Build the plan converging `prior` to `desired`.
///
/// A missing prior (or one without identity) yields a single `Create`.
/// Never fails: an invalid spec yields the `Invalid` sentinel plan.
pub fn plan(desired: &SpaceSpec, prior: Option<&SpaceState>) -> ExecutionPlan {
    if let Some(reason) = validate(desired) {
        return ExecutionPlan::invalid(reason);
    }

    let Some((id, prior)) = prior.and_then(|p| p.id.as_ref().map(|id| (id, p))) else {
        return ExecutionPlan {
            steps: vec![MutationStep::Create(desired.clone())],
            ignored: Vec::new(),
        };
    };

    let mut steps = Vec::new();

    let recorded_name = if prior.name.is_empty() { id.name() } else { prior.name.as_str() };
    if desired.name != recorded_name {
        match id.with_name(&desired.name) {
            Ok(to) => steps.push(MutationStep::Rename { to }),
            Err(e) => return ExecutionPlan::invalid(e.to_string()),
        }
    }

    if let Some(private) = desired.private
        && prior.private != Some(private)
    {
        steps.push(MutationStep::SetVisibility { private });
    }

    for collection in [Collection::Secrets, Collection::Variables] {
        let diff = diff_keys(collection, desired, prior);
        steps.extend(
            diff.removed
                .into_iter()
                .map(|key| MutationStep::RemoveKey { collection, key }),
        );
        steps.extend(
            diff.added
                .into_iter()
                .map(|(key, value)| MutationStep::AddKey { collection, key, value }),
        );
    }

    if let Some(tier) = &desired.hardware
        && prior.hardware.as_ref() != Some(tier)
    {
        steps.push(MutationStep::SetHardware { tier: tier.clone() });
    }
    if let Some(tier) = &desired.storage
        && prior.storage.as_ref() != Some(tier)
    {
        steps.push(MutationStep::SetStorage { tier: tier.clone() });
    }
    if let Some(seconds) = desired.sleep_time
        && prior.sleep_time != Some(seconds)
    {
        steps.push(MutationStep::SetSleepTime { seconds });
    }

    ExecutionPlan {
        steps,
        ignored: immutable_changes(desired, prior),
    }
}

/// Structural validation of a desired spec
fn validate(desired: &SpaceSpec) -> Option<String> {
    if desired.name.is_empty() {
        return Some("space name is empty".into());
    }
    if desired.name.contains('/') || desired.name.chars().any(char::is_whitespace) {
        return Some(format!(
            "space name '{}' must not contain '/' or whitespace",
            desired.name
        ));
    }
    if let Some(owner) = &desired.owner
        && (owner.is_empty() || owner.contains('/') || owner.chars().any(char::is_whitespace))
    {
        return Some(format!("owner '{owner}' is not a valid namespace"));
    }
    if let Some(seconds) = desired.sleep_time
        && seconds < 0
    {
        return Some(format!("sleep time must not be negative (got {seconds})"));
    }
    for collection in [Collection::Secrets, Collection::Variables] {
        if collection.declared(desired).keys().any(|k| k.trim().is_empty()) {
            return Some(format!("empty {} key", collection.noun()));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_spec() -> SpaceSpec {
        let mut spec = SpaceSpec::new("demo");
        spec.private = Some(true);
        spec.sdk = Some("gradio".into());
        spec.hardware = Some("cpu-basic".into());
        spec.storage = Some("small".into());
        spec.sleep_time = Some(3600);
        spec.secrets.insert("TOKEN".into(), "s3cret".into());
        spec.variables.insert("MODE".into(), "prod".into());
        spec
    }

    fn id(s: &str) -> SpaceId {
        SpaceId::parse(s).unwrap()
    }

    #[test]
    fn test_converged_prior_is_noop() {
        let spec = full_spec();
        let prior = SpaceState::from_spec(id("alice/demo"), &spec);
        let plan = plan(&spec, Some(&prior));
        assert!(plan.is_empty());
        assert!(plan.ignored.is_empty());
    }

    #[test]
    fn test_no_prior_is_single_create() {
        let spec = full_spec();
        let plan = plan(&spec, None);
        assert_eq!(plan.steps, vec![MutationStep::Create(spec)]);
        assert!(plan.is_create());
    }

    #[test]
    fn test_prior_without_identity_is_create() {
        let spec = full_spec();
        let prior = SpaceState::default();
        assert!(plan(&spec, Some(&prior)).is_create());
    }

    #[test]
    fn test_rename_and_visibility_order() {
        let prior = SpaceState {
            id: Some(id("alice/old")),
            name: "old".into(),
            private: Some(false),
            ..Default::default()
        };
        let mut desired = SpaceSpec::new("new");
        desired.private = Some(true);

        let plan = plan(&desired, Some(&prior));
        assert_eq!(
            plan.steps,
            vec![
                MutationStep::Rename { to: id("alice/new") },
                MutationStep::SetVisibility { private: true },
            ]
        );
    }

    #[test]
    fn test_collection_steps_order() {
        let mut prior_spec = SpaceSpec::new("demo");
        prior_spec.secrets.insert("b".into(), "2".into());
        prior_spec.secrets.insert("c".into(), "3".into());
        prior_spec.variables.insert("x".into(), "0".into());
        let prior = SpaceState::from_spec(id("alice/demo"), &prior_spec);

        let mut desired = SpaceSpec::new("demo");
        desired.secrets.insert("a".into(), "1".into());
        desired.secrets.insert("b".into(), "2".into());
        desired.variables.insert("x".into(), "1".into());
        desired.hardware = Some("t4-small".into());

        let kinds: Vec<_> = plan(&desired, Some(&prior))
            .steps
            .iter()
            .map(|s| (s.kind(), s.key().map(str::to_string)))
            .collect();
        assert_eq!(
            kinds,
            vec![
                (StepKind::RemoveSecret, Some("c".into())),
                (StepKind::AddSecret, Some("a".into())),
                (StepKind::RemoveVariable, Some("x".into())),
                (StepKind::AddVariable, Some("x".into())),
                (StepKind::SetHardware, None),
            ]
        );
    }

    #[test]
    fn test_full_update_order() {
        let mut prior_spec = SpaceSpec::new("old");
        prior_spec.private = Some(false);
        prior_spec.hardware = Some("cpu-basic".into());
        prior_spec.secrets.insert("stale".into(), "x".into());
        prior_spec.secrets.insert("rotated".into(), "v1".into());
        prior_spec.variables.insert("MODE".into(), "dev".into());
        prior_spec.variables.insert("OLD".into(), "1".into());
        let prior = SpaceState::from_spec(id("alice/old"), &prior_spec);

        let mut desired = SpaceSpec::new("new");
        desired.private = Some(true);
        desired.hardware = Some("t4-small".into());
        desired.secrets.insert("fresh".into(), "y".into());
        desired.secrets.insert("rotated".into(), "v2".into());
        desired.variables.insert("MODE".into(), "prod".into());
        desired.variables.insert("NEW".into(), "2".into());

        let steps: Vec<_> = plan(&desired, Some(&prior))
            .steps
            .iter()
            .map(|s| (s.kind(), s.key().map(str::to_string)))
            .collect();
        assert_eq!(
            steps,
            vec![
                (StepKind::Rename, None),
                (StepKind::SetVisibility, None),
                (StepKind::RemoveSecret, Some("rotated".into())),
                (StepKind::RemoveSecret, Some("stale".into())),
                (StepKind::AddSecret, Some("fresh".into())),
                (StepKind::AddSecret, Some("rotated".into())),
                (StepKind::RemoveVariable, Some("MODE".into())),
                (StepKind::RemoveVariable, Some("OLD".into())),
                (StepKind::AddVariable, Some("MODE".into())),
                (StepKind::AddVariable, Some("NEW".into())),
                (StepKind::SetHardware, None),
            ]
        );
    }

    #[test]
    fn test_unset_fields_are_unmanaged() {
        let prior = SpaceState::from_spec(id("alice/demo"), &full_spec());
        let desired = SpaceSpec {
            secrets: full_spec().secrets,
            variables: full_spec().variables,
            ..SpaceSpec::new("demo")
        };
        assert!(plan(&desired, Some(&prior)).is_empty());
    }

    #[test]
    fn test_scalar_tail_order() {
        let prior = SpaceState::from_spec(id("alice/demo"), &SpaceSpec::new("demo"));
        let mut desired = SpaceSpec::new("demo");
        desired.sleep_time = Some(600);
        desired.storage = Some("large".into());
        desired.hardware = Some("a10g-small".into());

        let kinds: Vec<_> = plan(&desired, Some(&prior)).steps.iter().map(MutationStep::kind).collect();
        assert_eq!(
            kinds,
            vec![StepKind::SetHardware, StepKind::SetStorage, StepKind::SetSleepTime]
        );
    }

    #[test]
    fn test_create_only_changes_are_ignored() {
        let prior = SpaceState::from_spec(id("alice/demo"), &full_spec());
        let mut desired = full_spec();
        desired.sdk = Some("docker".into());

        let plan = plan(&desired, Some(&prior));
        assert!(plan.is_empty());
        assert_eq!(plan.ignored.len(), 1);
        assert_eq!(plan.ignored[0].field, "sdk");
    }

    #[test]
    fn test_invalid_specs() {
        let cases = [
            SpaceSpec::new(""),
            SpaceSpec::new("a/b"),
            SpaceSpec::new("my space"),
            SpaceSpec {
                sleep_time: Some(-1),
                ..SpaceSpec::new("demo")
            },
            SpaceSpec {
                owner: Some(String::new()),
                ..SpaceSpec::new("demo")
            },
        ];
        for spec in &cases {
            let plan = plan(spec, None);
            assert_eq!(plan.len(), 1, "{spec:?}");
            assert!(plan.invalid_reason().is_some(), "{spec:?}");
        }

        let mut spec = SpaceSpec::new("demo");
        spec.variables.insert(String::new(), "x".into());
        assert_eq!(plan(&spec, None).invalid_reason(), Some("empty variable key"));
    }

    #[test]
    fn test_display_redacts_secrets() {
        let step = MutationStep::AddKey {
            collection: Collection::Secrets,
            key: "TOKEN".into(),
            value: "hunter2".into(),
        };
        let text = step.to_string();
        assert!(text.contains("TOKEN"));
        assert!(!text.contains("hunter2"));
        assert!(format!("{:?}", step.kind()).contains("AddSecret"));

        let step = MutationStep::AddKey {
            collection: Collection::Variables,
            key: "MODE".into(),
            value: "prod".into(),
        };
        assert_eq!(step.to_string(), "add variable MODE = \"prod\"");
    }

    #[test]
    fn test_delete_plan() {
        let plan = ExecutionPlan::delete();
        assert!(plan.is_delete());
        assert_eq!(plan.steps[0].symbol(), "-");
    }
}
