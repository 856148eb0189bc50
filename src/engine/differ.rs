//! Plan display

use colored::{ColoredString, Colorize};
use std::fmt;

use super::planner::{Action, SpaceChange};

/// Per-action counts of a workspace plan
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PlanCounts {
    pub create: usize,
    pub update: usize,
    pub delete: usize,
    pub unchanged: usize,
    pub invalid: usize,
}

impl PlanCounts {
    pub fn of(changes: &[SpaceChange]) -> Self {
        let mut counts = Self::default();
        for change in changes {
            match change.action {
                Action::Create => counts.create += 1,
                Action::Update => counts.update += 1,
                Action::Delete => counts.delete += 1,
                Action::NoOp => counts.unchanged += 1,
                Action::Invalid => counts.invalid += 1,
            }
        }
        counts
    }

    pub fn pending(&self) -> usize {
        self.create + self.update + self.delete
    }
}

impl fmt::Display for PlanCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} to delete",
            self.create, self.update, self.delete
        )?;
        if self.invalid > 0 {
            write!(f, ", {} invalid", self.invalid)?;
        }
        Ok(())
    }
}

fn colored_symbol(symbol: &str) -> ColoredString {
    match symbol {
        "+" => symbol.green(),
        "-" => symbol.red(),
        "~" => symbol.yellow(),
        "!" => symbol.red().bold(),
        _ => symbol.dimmed(),
    }
}

fn action_label(action: Action) -> &'static str {
    match action {
        Action::Create => "will be created",
        Action::Update => "will be updated in place",
        Action::Delete => "will be deleted",
        Action::NoOp => "up to date",
        Action::Invalid => "invalid configuration",
    }
}

/// Whether a change gets a block in the plan display: anything that will
/// run, plus no-op spaces with create-only differences to warn about
fn is_shown(change: &SpaceChange) -> bool {
    change.is_change() || !change.preview.plan.ignored.is_empty()
}

/// Warnings for create-only differences that will not be applied
fn ignored_warnings(change: &SpaceChange) -> Vec<String> {
    change
        .preview
        .plan
        .ignored
        .iter()
        .map(|ignored| format!("{ignored} (create-only, not applied)"))
        .collect()
}

/// Display a workspace plan
pub fn display_plan(changes: &[SpaceChange]) {
    let counts = PlanCounts::of(changes);
    let shown: Vec<&SpaceChange> = changes.iter().filter(|c| is_shown(c)).collect();
    if shown.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Execution Plan".bold()
    );
    println!("│");

    for change in shown {
        println!(
            "│ {} {} {}",
            colored_symbol(change.action.symbol()),
            change.address.bold(),
            format!("({}) {}", change.target(), action_label(change.action)).dimmed()
        );

        if change.action == Action::Create {
            // The create step carries the whole spec; show it field by field.
            if let Some(declarative::MutationStep::Create(spec)) = change.preview.plan.steps.first()
            {
                for line in create_details(spec) {
                    println!("│     {} {}", "+".green(), line);
                }
            }
        } else {
            for step in &change.preview.plan.steps {
                println!("│     {} {}", colored_symbol(step.symbol()), step);
            }
        }

        for warning in ignored_warnings(change) {
            println!("│     {} {}", "⚠".yellow(), warning);
        }
        println!("│");
    }

    println!("├─────────────────────────────────────────────────────┤");
    println!("│ Plan: {}", counts.to_string().bold());
    if counts.unchanged > 0 {
        println!("│ {}", format!("{} unchanged", counts.unchanged).dimmed());
    }
    println!("└─────────────────────────────────────────────────────┘");
}

/// One line per field a create will set
fn create_details(spec: &declarative::SpaceSpec) -> Vec<String> {
    let mut lines = Vec::new();
    let scalars = [
        ("private", spec.private.map(|p| p.to_string())),
        ("sdk", spec.sdk.clone()),
        ("template", spec.template.clone()),
        ("hardware", spec.hardware.clone()),
        ("storage", spec.storage.clone()),
        ("sleep_time", spec.sleep_time.map(|s| format!("{s}s"))),
    ];
    for (field, value) in scalars {
        if let Some(value) = value {
            lines.push(format!("{field} = {value}"));
        }
    }
    for key in spec.secrets.keys() {
        lines.push(format!("secret {key} = (sensitive)"));
    }
    for (key, value) in &spec.variables {
        lines.push(format!("variable {key} = {value:?}"));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpacesConfig;
    use crate::engine::planner::build_plan;
    use crate::state::StateFile;
    use declarative::mock::MockClient;
    use declarative::{Reconciler, SpaceId, SpaceSpec, SpaceState};

    #[test]
    fn test_counts_display() {
        let counts = PlanCounts {
            create: 1,
            update: 2,
            delete: 0,
            unchanged: 4,
            invalid: 0,
        };
        assert_eq!(counts.to_string(), "1 to create, 2 to update, 0 to delete");
        assert_eq!(counts.pending(), 3);

        let invalid = PlanCounts {
            invalid: 1,
            ..Default::default()
        };
        assert_eq!(
            invalid.to_string(),
            "0 to create, 0 to update, 0 to delete, 1 invalid"
        );
    }

    #[test]
    fn test_create_details_hide_secrets() {
        let mut spec = SpaceSpec::new("demo");
        spec.private = Some(true);
        spec.sleep_time = Some(300);
        spec.secrets.insert("API_KEY".into(), "sk-live".into());
        spec.variables.insert("MODE".into(), "prod".into());

        let lines = create_details(&spec);
        assert_eq!(
            lines,
            vec![
                "private = true",
                "sleep_time = 300s",
                "secret API_KEY = (sensitive)",
                "variable MODE = \"prod\"",
            ]
        );
        assert!(lines.iter().all(|l| !l.contains("sk-live")));
    }

    #[test]
    fn test_create_only_difference_is_shown_without_steps() {
        let mut recorded = SpaceSpec::new("demo");
        recorded.owner = Some("alice".into());
        recorded.sdk = Some("gradio".into());
        let mut desired = recorded.clone();
        desired.sdk = Some("docker".into());

        let mut state = StateFile::default();
        let id = SpaceId::new("alice", "demo").unwrap();
        state.record("demo", SpaceState::from_spec(id, &recorded));
        let mut config = SpacesConfig::default();
        config.spaces.insert("demo".into(), desired);

        let reconciler = Reconciler::new(MockClient::new());
        let changes = build_plan(&reconciler, &config, &state, None).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].action, Action::NoOp);
        assert!(changes[0].preview.plan.steps.is_empty());

        assert!(is_shown(&changes[0]));
        assert_eq!(
            ignored_warnings(&changes[0]),
            vec!["sdk: gradio → docker (create-only, not applied)"]
        );
        display_plan(&changes);
    }

    #[test]
    fn test_unchanged_space_is_not_shown() {
        let mut spec = SpaceSpec::new("docs");
        spec.owner = Some("alice".into());
        let mut state = StateFile::default();
        let id = SpaceId::new("alice", "docs").unwrap();
        state.record("docs", SpaceState::from_spec(id, &spec));
        let mut config = SpacesConfig::default();
        config.spaces.insert("docs".into(), spec);

        let reconciler = Reconciler::new(MockClient::new());
        let changes = build_plan(&reconciler, &config, &state, None).unwrap();
        assert_eq!(changes[0].action, Action::NoOp);
        assert!(!is_shown(&changes[0]));
        assert!(ignored_warnings(&changes[0]).is_empty());
    }
}
