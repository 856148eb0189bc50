use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use declarative::SpaceState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Current on-disk format version
pub const STATE_VERSION: u32 = 1;

// ============================================================================
// State Structures
// ============================================================================

/// Recorded snapshots of every managed space
///
/// Secret values are only kept as unsalted blake3 fingerprints. They reveal
/// whether a value changed but are not confidential: a low-entropy secret can
/// be recovered by guessing, so treat the state file like the secrets in it.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct StateFile {
    #[serde(default = "default_version")]
    pub version: u32,

    /// Last time the state was saved
    pub last_updated: DateTime<Utc>,

    /// Snapshots keyed by resource address
    #[serde(default)]
    pub spaces: BTreeMap<String, SpaceState>,
}

fn default_version() -> u32 {
    STATE_VERSION
}

impl Default for StateFile {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            last_updated: Utc::now(),
            spaces: BTreeMap::new(),
        }
    }
}

// ============================================================================
// StateFile Implementation
// ============================================================================

impl StateFile {
    /// Load state from disk, or return an empty state if the file doesn't exist
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("State file {} does not exist, using empty state", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read state file: {}", path.display()))?;

        let state: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse state file: {}", path.display()))?;

        if state.version > STATE_VERSION {
            anyhow::bail!(
                "State file {} has version {}, this build understands up to {}",
                path.display(),
                state.version,
                STATE_VERSION
            );
        }

        log::debug!(
            "Loaded {} snapshot(s) from {}",
            state.spaces.len(),
            path.display()
        );
        Ok(state)
    }

    /// Stamp and save state to disk (via a sibling temp file + rename)
    pub fn save(&mut self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        }

        self.version = STATE_VERSION;
        self.last_updated = Utc::now();
        let content = toml::to_string_pretty(&*self).context("Failed to serialize state to TOML")?;

        let tmp = path.with_extension("toml.tmp");
        fs::write(&tmp, &content)
            .with_context(|| format!("Failed to write state file: {}", tmp.display()))?;
        fs::rename(&tmp, path)
            .with_context(|| format!("Failed to replace state file: {}", path.display()))?;

        log::debug!("Saved state to {}", path.display());
        Ok(())
    }

    pub fn get(&self, address: &str) -> Option<&SpaceState> {
        self.spaces.get(address)
    }

    /// Record a snapshot; a snapshot without remote identity is dropped
    /// since there is nothing left to track.
    pub fn record(&mut self, address: &str, snapshot: SpaceState) {
        if snapshot.is_created() {
            self.spaces.insert(address.to_string(), snapshot);
        } else {
            self.spaces.remove(address);
        }
    }

    pub fn remove(&mut self, address: &str) -> Option<SpaceState> {
        self.spaces.remove(address)
    }

    /// Address already tracking `id`, if any
    pub fn address_of(&self, id: &declarative::SpaceId) -> Option<&str> {
        self.spaces
            .iter()
            .find(|(_, s)| s.id.as_ref() == Some(id))
            .map(|(address, _)| address.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================
