//! state list / state rm

use anyhow::Result;
use colored::Colorize;
use declarative::SpaceState;

use crate::Context;
use crate::state::StateFile;
use crate::ui;

pub fn list(ctx: &Context) -> Result<()> {
    let path = ctx.state_path()?;
    let state = StateFile::load(&path)?;

    if state.spaces.is_empty() {
        ui::info(&format!("No spaces recorded in {}", path.display()));
        return Ok(());
    }

    ui::header("Recorded spaces");
    for (address, snapshot) in &state.spaces {
        println!("  {:<20} {}", address.bold(), describe(snapshot));
    }
    println!();
    ui::kv("state file", &path.display().to_string());
    ui::kv(
        "last updated",
        &state.last_updated.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
    );
    Ok(())
}

pub fn rm(ctx: &Context, address: &str) -> Result<()> {
    let path = ctx.state_path()?;
    let mut state = StateFile::load(&path)?;
    let snapshot = forget(&mut state, address)?;
    state.save(&path)?;

    ui::success(&format!("Forgot '{address}' ({})", describe(&snapshot)));
    ui::dim("The remote space was not touched.");
    Ok(())
}

fn forget(state: &mut StateFile, address: &str) -> Result<SpaceState> {
    state
        .remove(address)
        .ok_or_else(|| anyhow::anyhow!("No space '{address}' in state"))
}

/// One-line summary of a snapshot; never shows values
fn describe(snapshot: &SpaceState) -> String {
    let id = snapshot
        .id
        .as_ref()
        .map_or_else(|| snapshot.name.clone(), ToString::to_string);
    let visibility = match snapshot.private {
        Some(true) => "private",
        Some(false) => "public",
        None => "default visibility",
    };
    format!(
        "{id} ({visibility}, {}, {})",
        ui::count(snapshot.secrets.len(), "secret"),
        ui::count(snapshot.variables.len(), "variable")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::{SpaceId, SpaceSpec};

    fn snapshot() -> SpaceState {
        let mut spec = SpaceSpec::new("demo");
        spec.private = Some(true);
        spec.secrets.insert("TOKEN".into(), "s3cret".into());
        spec.variables.insert("A".into(), "1".into());
        spec.variables.insert("B".into(), "2".into());
        SpaceState::from_spec(SpaceId::parse("alice/demo").unwrap(), &spec)
    }

    #[test]
    fn test_describe() {
        assert_eq!(
            describe(&snapshot()),
            "alice/demo (private, 1 secret, 2 variables)"
        );
    }

    #[test]
    fn test_forget() {
        let mut state = StateFile::default();
        state.record("demo", snapshot());

        assert_eq!(forget(&mut state, "demo").unwrap(), snapshot());
        assert!(state.spaces.is_empty());
        assert!(forget(&mut state, "demo").is_err());
    }
}
