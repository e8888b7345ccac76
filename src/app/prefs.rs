// Weblog Tail - app/prefs.rs
//
// Preference persistence: the page URL and the last selector survive
// restarts. Log rows never do.
//
// Saved atomically (write temp, rename) so a crash mid-save keeps the
// previous file intact. Load problems are logged and treated as a first run.

use crate::util::constants::{DEFAULT_PAGE_URL, PREFS_FILE_NAME};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Bump on incompatible changes; mismatched files are ignored.
pub const PREFS_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefsData {
    pub version: u32,

    #[serde(default)]
    pub page_url: Option<String>,

    /// Last selector sent to the backend.
    #[serde(default)]
    pub last_query: Option<String>,
}

impl PrefsData {
    pub fn new(page_url: Option<String>, last_query: Option<String>) -> Self {
        Self {
            version: PREFS_VERSION,
            page_url,
            last_query,
        }
    }
}

/// Page URL to open at start-up: command line, then `config.toml`, then the
/// URL saved on the last exit, then the built-in default.
pub fn resolve_page_url(cli: Option<&str>, config: Option<&str>, saved: Option<&str>) -> String {
    cli.or(config)
        .or(saved)
        .unwrap_or(DEFAULT_PAGE_URL)
        .to_string()
}

pub fn prefs_path(data_dir: &Path) -> PathBuf {
    data_dir.join(PREFS_FILE_NAME)
}

/// Write `data` to `path` atomically, creating parent directories.
///
/// The error string is meant for a `tracing::warn!`; callers do not surface
/// it to the user.
pub fn save(data: &PrefsData, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            format!("cannot create prefs directory '{}': {e}", parent.display())
        })?;
    }

    let json =
        serde_json::to_string_pretty(data).map_err(|e| format!("failed to serialise prefs: {e}"))?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json.as_bytes())
        .map_err(|e| format!("failed to write prefs temp file '{}': {e}", tmp.display()))?;

    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        format!("failed to finalise prefs file '{}': {e}", path.display())
    })?;

    tracing::debug!(path = %path.display(), "Preferences saved");
    Ok(())
}

/// `None` on a missing, malformed, or wrong-version file.
pub fn load(path: &Path) -> Option<PrefsData> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!(path = %path.display(), error = %e, "Cannot read prefs file");
            }
        })
        .ok()?;

    let data: PrefsData = serde_json::from_str(&content)
        .map_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "Prefs file is malformed, ignoring");
        })
        .ok()?;

    if data.version != PREFS_VERSION {
        tracing::warn!(
            found = data.version,
            expected = PREFS_VERSION,
            "Prefs file version mismatch, ignoring"
        );
        return None;
    }

    tracing::info!(path = %path.display(), "Preferences loaded");
    Some(data)
}
