//! Plan execution with confirmation, progress and state persistence

use anyhow::Result;
use colored::Colorize;
use declarative::{ApplyError, Reconciler, SpaceClient};
use std::path::Path;

use crate::progress::StepProgress;
use crate::state::StateFile;
use crate::ui;

use super::differ::{PlanCounts, display_plan};
use super::planner::{Action, SpaceChange};

/// Options for execution
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    /// Show the plan only
    pub dry_run: bool,
    /// Skip confirmation prompts
    pub yes: bool,
}

/// Summary of execution results
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExecuteSummary {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failed: usize,
}

impl ExecuteSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

/// Show, confirm and run a workspace plan.
///
/// Spaces run one after another; a failing space keeps its partial snapshot
/// and the remaining spaces still run. State is saved after every space.
pub fn execute<C: SpaceClient>(
    reconciler: &Reconciler<C>,
    changes: Vec<SpaceChange>,
    state: &mut StateFile,
    state_path: &Path,
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary> {
    display_plan(&changes);

    let counts = PlanCounts::of(&changes);
    if counts.invalid > 0 {
        for change in changes.iter().filter(|c| c.action == Action::Invalid) {
            let reason = change.preview.plan.invalid_reason().unwrap_or("invalid");
            eprintln!("  {} {}: {}", "✗".red(), change.address, reason);
        }
        anyhow::bail!("{} space(s) have an invalid configuration", counts.invalid);
    }

    if counts.pending() == 0 {
        return Ok(ExecuteSummary::default());
    }

    if opts.dry_run {
        println!();
        println!(
            "  {} No changes made; run {} to apply",
            "ℹ".blue(),
            "hfspaces apply".bold()
        );
        return Ok(ExecuteSummary::default());
    }

    if !opts.yes && !confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(ExecuteSummary::default());
    }

    let mut summary = ExecuteSummary::default();
    for change in changes.into_iter().filter(SpaceChange::is_change) {
        println!();
        println!(
            "  {} {} {}",
            "→".cyan(),
            change.address.bold(),
            format!("({})", change.target()).dimmed()
        );
        run_change(reconciler, change, state, &mut summary);
        state.save(state_path)?;
    }

    print_summary(&summary);
    Ok(summary)
}

fn run_change<C: SpaceClient>(
    reconciler: &Reconciler<C>,
    change: SpaceChange,
    state: &mut StateFile,
    summary: &mut ExecuteSummary,
) {
    let mut progress = StepProgress::new(&change.address);
    let address = change.address;

    let outcome = match change.action {
        Action::Delete => reconciler
            .delete_with(change.preview.working, &mut progress)
            .map(|()| None),
        _ => reconciler.execute(change.preview, &mut progress).map(Some),
    };
    progress.finish();

    match outcome {
        Ok(snapshot) => {
            match change.action {
                Action::Create => summary.created += 1,
                Action::Delete => summary.deleted += 1,
                _ => summary.updated += 1,
            }
            match snapshot {
                Some(snapshot) => state.record(&address, snapshot),
                None => {
                    state.remove(&address);
                }
            }
        }
        Err(e) => {
            summary.failed += 1;
            report_failure(&address, &e);
            state.record(&address, e.into_state());
        }
    }
}

fn report_failure(address: &str, e: &ApplyError) {
    ui::error(&format!("{address}: {e}"));
    let category = e.source.category();
    eprintln!("      {}", category.advice().dimmed());
    if e.is_partial_create() {
        eprintln!(
            "      {}",
            "The space was created but not fully configured; the next apply resumes from here."
                .dimmed()
        );
    }
    log::debug!("{address}: {} ({})", category.description(), category);
}

/// Confirm with user
fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}

/// Print final summary
fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Spaces reconciled successfully!", "✓".green().bold());
    } else {
        println!("  {} Spaces reconciled with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} spaces created", summary.created);
    }
    if summary.updated > 0 {
        println!("    • {} spaces updated", summary.updated);
    }
    if summary.deleted > 0 {
        println!("    • {} spaces deleted", summary.deleted);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "spaces".red());
    }
}
