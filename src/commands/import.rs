//! import ADDRESS OWNER/NAME

use anyhow::{Context as _, Result};
use declarative::{Reconciler, SpaceClient, SpaceId};

use crate::Context;
use crate::config::is_valid_address;
use crate::state::StateFile;
use crate::ui;

pub fn run(ctx: &Context, address: &str, id: &str) -> Result<()> {
    let config = ctx.config_or_default()?;
    let state_path = ctx.state_path()?;
    let mut state = StateFile::load(&state_path)?;

    let reconciler = Reconciler::new(ctx.client(&config));
    adopt(&reconciler, &mut state, address, id)?;
    state.save(&state_path)?;

    ui::success(&format!("Imported {id} as '{address}'"));
    if config.spaces.contains_key(address) {
        ui::dim("Secret and variable values are not readable remotely;");
        ui::dim("the next apply pushes every declared key once.");
    } else {
        ui::warn(&format!(
            "'{address}' is not declared in {}; the next apply would delete it",
            ctx.config_path.display()
        ));
    }
    Ok(())
}

/// Read `id` and record it under `address`
fn adopt<C: SpaceClient>(
    reconciler: &Reconciler<C>,
    state: &mut StateFile,
    address: &str,
    id: &str,
) -> Result<()> {
    if !is_valid_address(address) {
        anyhow::bail!("Invalid address '{address}': use letters, digits, '-' or '_'");
    }
    if let Some(existing) = state.get(address) {
        let tracked = existing
            .id
            .as_ref()
            .map_or_else(|| existing.name.clone(), ToString::to_string);
        anyhow::bail!(
            "'{address}' already tracks {tracked}; run `hfspaces state rm {address}` first"
        );
    }

    let space_id = SpaceId::parse(id)?;
    if let Some(other) = state.address_of(&space_id) {
        anyhow::bail!("{space_id} is already tracked as '{other}'");
    }

    let snapshot = reconciler
        .import(id)
        .with_context(|| format!("Failed to import {id}"))?;
    state.record(address, snapshot);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::mock::{MockClient, MockSpace};

    fn reconciler() -> Reconciler<MockClient> {
        let client = MockClient::new();
        client.insert(
            SpaceId::parse("alice/demo").unwrap(),
            MockSpace {
                private: true,
                sdk: Some("docker".into()),
                ..Default::default()
            },
        );
        Reconciler::new(client)
    }

    #[test]
    fn test_adopt_records_snapshot() {
        let reconciler = reconciler();
        let mut state = StateFile::default();
        adopt(&reconciler, &mut state, "demo", "alice/demo").unwrap();

        let snapshot = state.get("demo").unwrap();
        assert_eq!(snapshot.private, Some(true));
        assert_eq!(snapshot.sdk.as_deref(), Some("docker"));
        assert!(snapshot.secrets.is_empty());
    }

    #[test]
    fn test_adopt_refuses_taken_address_and_duplicate_id() {
        let reconciler = reconciler();
        let mut state = StateFile::default();
        adopt(&reconciler, &mut state, "demo", "alice/demo").unwrap();
        reconciler.client().clear_calls();

        let err = adopt(&reconciler, &mut state, "demo", "alice/other").unwrap_err();
        assert!(err.to_string().contains("already tracks alice/demo"));

        let err = adopt(&reconciler, &mut state, "copy", "alice/demo").unwrap_err();
        assert!(err.to_string().contains("already tracked as 'demo'"));
        assert!(reconciler.client().calls().is_empty());
    }

    #[test]
    fn test_adopt_missing_remote() {
        let reconciler = reconciler();
        let mut state = StateFile::default();
        let err = adopt(&reconciler, &mut state, "ghost", "alice/ghost").unwrap_err();
        assert!(err.to_string().contains("Failed to import alice/ghost"));
        assert!(state.spaces.is_empty());
    }

    #[test]
    fn test_adopt_rejects_bad_input() {
        let reconciler = reconciler();
        let mut state = StateFile::default();
        assert!(adopt(&reconciler, &mut state, "a b", "alice/demo").is_err());
        assert!(adopt(&reconciler, &mut state, "demo", "no-slash").is_err());
        assert!(reconciler.client().calls().is_empty());
    }
}
