//! show OWNER/NAME

use anyhow::{Context as _, Result};
use declarative::{SpaceClient, SpaceId, SpaceRecord};

use crate::Context;
use crate::state::StateFile;
use crate::ui;

pub fn run(ctx: &Context, id: &str) -> Result<()> {
    let space_id = SpaceId::parse(id)?;
    let config = ctx.config_or_default()?;
    let client = ctx.client(&config);

    let record = client
        .fetch(&space_id)
        .with_context(|| format!("Failed to fetch {space_id}"))?;

    ui::header(&space_id.to_string());
    for (key, value) in fields(&record) {
        ui::kv(key, &value);
    }

    let state = StateFile::load(&ctx.state_path()?)?;
    match state.address_of(&space_id) {
        Some(address) => ui::info(&format!("Tracked in state as '{address}'")),
        None => ui::dim("Not tracked in state"),
    }
    Ok(())
}

fn fields(record: &SpaceRecord) -> Vec<(&'static str, String)> {
    vec![
        ("author", ui::opt(record.author.as_ref())),
        (
            "visibility",
            if record.private { "private" } else { "public" }.to_string(),
        ),
        ("sdk", ui::opt(record.sdk.as_ref())),
        ("hardware", ui::opt(record.hardware.as_ref())),
        ("storage", ui::opt(record.storage.as_ref())),
        (
            "sleep time",
            ui::opt(record.sleep_time.map(|s| format!("{s}s")).as_ref()),
        ),
        ("likes", ui::opt(record.likes.as_ref())),
        ("last modified", ui::opt(record.last_modified.as_ref())),
    ]
}
