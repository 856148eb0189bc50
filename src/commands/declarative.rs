//! plan / apply / destroy

use anyhow::Result;
use declarative::Reconciler;

use crate::Context;
use crate::engine::{self, ExecuteOptions, ExecuteSummary};
use crate::state::StateFile;
use crate::ui;

/// Show the plan without executing it
pub fn plan(ctx: &Context, target: Option<&str>, refresh_keys: bool) -> Result<()> {
    let opts = ExecuteOptions {
        dry_run: true,
        yes: true,
    };
    reconcile(ctx, target, refresh_keys, &opts).map(|_| ())
}

/// Converge remote spaces to the configuration
pub fn apply(ctx: &Context, target: Option<&str>, yes: bool, refresh_keys: bool) -> Result<()> {
    let opts = ExecuteOptions {
        dry_run: false,
        yes,
    };
    let summary = reconcile(ctx, target, refresh_keys, &opts)?;
    check(&summary)
}

/// Delete every recorded space (or just `target`)
pub fn destroy(ctx: &Context, target: Option<&str>, yes: bool) -> Result<()> {
    let config = ctx.config_or_default()?;
    let state_path = ctx.state_path()?;
    let mut state = StateFile::load(&state_path)?;

    if state.spaces.is_empty() {
        ui::info("No spaces recorded in state");
        return Ok(());
    }

    let reconciler = Reconciler::new(ctx.client(&config));
    let changes = engine::build_destroy_plan(&state, target)?;
    let opts = ExecuteOptions {
        dry_run: false,
        yes,
    };
    let summary = engine::execute(&reconciler, changes, &mut state, &state_path, &opts)?;
    check(&summary)
}

fn reconcile(
    ctx: &Context,
    target: Option<&str>,
    refresh_keys: bool,
    opts: &ExecuteOptions,
) -> Result<ExecuteSummary> {
    let config = ctx.config()?;
    let state_path = ctx.state_path()?;
    let mut state = StateFile::load(&state_path)?;

    let client = ctx.client(&config);
    if !client.is_authenticated() {
        ui::warn("No token configured (--token, HF_TOKEN or provider.token); requests are anonymous");
    }
    let reconciler = Reconciler::new(client).with_key_refresh(refresh_keys);

    let changes = engine::build_plan(&reconciler, &config, &state, target)?;
    engine::execute(&reconciler, changes, &mut state, &state_path, opts)
}

fn check(summary: &ExecuteSummary) -> Result<()> {
    if summary.is_success() {
        Ok(())
    } else {
        anyhow::bail!(
            "{} failed; state keeps their partial progress, run apply again to resume",
            ui::count(summary.failed, "space")
        )
    }
}
