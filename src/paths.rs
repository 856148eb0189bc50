//! Centralized path resolution for hfspaces
//!
//! # Environment Variables
//!
//! - `HFSPACES_STATE_DIR` - Override state directory
//!
//! # Path Resolution Priority
//!
//! For state_dir():
//! 1. `HFSPACES_STATE_DIR` environment variable
//! 2. `XDG_STATE_HOME/hfspaces` (if set)
//! 3. Platform default:
//!    - Windows: `%LOCALAPPDATA%\hfspaces`
//!    - macOS/Linux: `~/.local/state/hfspaces`

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable for state directory override
pub const ENV_STATE_DIR: &str = "HFSPACES_STATE_DIR";

/// File name of the state file inside the state directory
pub const STATE_FILE: &str = "state.toml";

/// Default desired-configuration file
pub const DEFAULT_CONFIG_FILE: &str = "spaces.toml";

/// Get the hfspaces state directory path
pub fn state_dir() -> Result<PathBuf> {
    let override_dir = std::env::var(ENV_STATE_DIR).ok();
    let xdg_state = std::env::var("XDG_STATE_HOME").ok();
    resolve_state_dir(override_dir.as_deref(), xdg_state.as_deref(), dirs::home_dir().as_deref())
}

fn resolve_state_dir(
    override_dir: Option<&str>,
    xdg_state: Option<&str>,
    home: Option<&Path>,
) -> Result<PathBuf> {
    // 1. Environment variable override
    if let Some(dir) = override_dir.filter(|d| !d.is_empty()) {
        let path = expand(dir);
        log::debug!("Using state dir from {}: {}", ENV_STATE_DIR, path.display());
        return Ok(path);
    }

    // 2. XDG_STATE_HOME
    if let Some(xdg) = xdg_state.filter(|d| !d.is_empty()) {
        let path = PathBuf::from(xdg).join("hfspaces");
        log::debug!("Using XDG_STATE_HOME: {}", path.display());
        return Ok(path);
    }

    // 3. Platform default
    #[cfg(windows)]
    {
        if let Some(local_app_data) = dirs::data_local_dir() {
            return Ok(local_app_data.join("hfspaces"));
        }
    }

    let home = home.context("Could not determine home directory")?;
    let path = home.join(".local").join("state").join("hfspaces");
    log::debug!("Using default state dir: {}", path.display());
    Ok(path)
}

/// State file to use: `--state` if given, else `<state_dir>/state.toml`
pub fn state_file(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => Ok(expand(&path.to_string_lossy())),
        None => Ok(state_dir()?.join(STATE_FILE)),
    }
}

/// Expand ~ and environment variables in a path string.
///
/// Unknown variables are left as-is.
pub fn expand(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).unwrap_or(std::borrow::Cow::Borrowed(path));
    PathBuf::from(expanded.as_ref())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_override_wins() {
        let path = resolve_state_dir(
            Some("/custom/state"),
            Some("/xdg"),
            Some(Path::new("/home/u")),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/custom/state"));
    }

    #[test]
    fn test_xdg_state_home() {
        let path = resolve_state_dir(None, Some("/tmp/xdg-state"), Some(Path::new("/home/u")))
            .unwrap();
        assert_eq!(path, PathBuf::from("/tmp/xdg-state/hfspaces"));
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let path = resolve_state_dir(Some(""), Some(""), Some(Path::new("/home/u"))).unwrap();
        #[cfg(unix)]
        assert_eq!(path, PathBuf::from("/home/u/.local/state/hfspaces"));
        #[cfg(not(unix))]
        let _ = path;
    }

    #[cfg(unix)]
    #[test]
    fn test_default_state_dir_unix() {
        let path = resolve_state_dir(None, None, Some(Path::new("/home/u"))).unwrap();
        assert_eq!(path, PathBuf::from("/home/u/.local/state/hfspaces"));
    }

    #[cfg(unix)]
    #[test]
    fn test_no_home_is_error() {
        assert!(resolve_state_dir(None, None, None).is_err());
    }

    #[test]
    fn test_explicit_state_file() {
        let path = state_file(Some(Path::new("/tmp/my-state.toml"))).unwrap();
        assert_eq!(path, PathBuf::from("/tmp/my-state.toml"));
    }

    #[test]
    fn test_expand_with_tilde() {
        let result = expand("~/test/path");
        let home = dirs::home_dir().unwrap();
        assert_eq!(result, home.join("test").join("path"));
    }

    #[test]
    fn test_expand_unknown_env_var_unchanged() {
        let result = expand("/path/$HFSPACES_NONEXISTENT_12345/file");
        assert_eq!(result, PathBuf::from("/path/$HFSPACES_NONEXISTENT_12345/file"));
    }
}
