// Weblog Tail - platform/config.rs
//
// Platform directory resolution and config.toml loading with startup
// validation.
//
// Uses the `directories` crate for XDG (Linux), AppData (Windows),
// Library (macOS) compliance.

use crate::util::constants;
use crate::util::error::ConfigError;
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Resolved platform paths for configuration and persisted preferences.
#[derive(Debug, Clone)]
pub struct PlatformPaths {
    /// Holds config.toml (e.g. ~/.config/weblog-tail/).
    pub config_dir: PathBuf,

    /// Holds prefs.json (e.g. ~/.local/share/weblog-tail/).
    pub data_dir: PathBuf,
}

impl PlatformPaths {
    /// Falls back to the current directory if platform dirs cannot be
    /// determined.
    pub fn resolve() -> Self {
        if let Some(proj_dirs) = ProjectDirs::from("", "", constants::APP_ID) {
            let config_dir = proj_dirs.config_dir().to_path_buf();
            let data_dir = proj_dirs.data_dir().to_path_buf();
            tracing::debug!(
                config = %config_dir.display(),
                data = %data_dir.display(),
                "Platform paths resolved"
            );
            Self {
                config_dir,
                data_dir,
            }
        } else {
            tracing::warn!("Could not determine platform directories, using current directory");
            Self {
                config_dir: PathBuf::from("."),
                data_dir: PathBuf::from("."),
            }
        }
    }
}

// =============================================================================
// config.toml loading and validation
// =============================================================================

/// Raw deserialisable shape of config.toml.
///
/// Unknown keys are ignored so a newer config file still loads.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct RawConfig {
    pub connection: ConnectionSection,
    pub display: DisplaySection,
    pub logging: LoggingSection,
}

/// `[connection]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct ConnectionSection {
    /// Page URL the socket endpoint is derived from.
    pub page_url: Option<String>,
    /// Reconnect automatically after the socket goes away.
    pub reconnect: Option<bool>,
    pub reconnect_initial_ms: Option<u64>,
    pub reconnect_max_ms: Option<u64>,
}

/// `[display]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct DisplaySection {
    /// Row cap (0 = unlimited).
    pub max_rows: Option<usize>,
    /// "dark" or "light".
    pub theme: Option<String>,
    pub font_size: Option<f32>,
}

/// `[logging]` config section.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// "error", "warn", "info", "debug", or "trace".
    pub level: Option<String>,
    /// Log file path (empty = stderr only).
    pub file: Option<String>,
}

/// Validated configuration. Invalid values in config.toml are reported as
/// warnings and replaced by the defaults below.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    // -- Connection --
    pub page_url: Option<String>,
    pub reconnect: bool,
    pub reconnect_initial: Duration,
    pub reconnect_max: Duration,

    // -- Display --
    pub max_rows: usize,
    pub dark_mode: bool,
    pub font_size: f32,

    // -- Logging --
    /// Read before tracing is initialised.
    pub log_level: Option<String>,
    pub log_file: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            page_url: None,
            reconnect: false,
            reconnect_initial: Duration::from_millis(constants::DEFAULT_RECONNECT_INITIAL_MS),
            reconnect_max: Duration::from_millis(constants::DEFAULT_RECONNECT_MAX_MS),
            max_rows: constants::DEFAULT_MAX_ROWS,
            dark_mode: true,
            font_size: constants::DEFAULT_FONT_SIZE,
            log_level: None,
            log_file: None,
        }
    }
}

/// Load and validate `config.toml` from `config_dir`.
///
/// A missing file yields defaults and no warnings (first run). An unreadable
/// or unparseable file yields defaults and a single warning: the application
/// still starts but the user is told.
pub fn load_config(config_dir: &Path) -> (AppConfig, Vec<ConfigError>) {
    let config_path = config_dir.join(constants::CONFIG_FILE_NAME);

    if !config_path.exists() {
        tracing::debug!(path = %config_path.display(), "No config.toml found; using defaults");
        return (AppConfig::default(), Vec::new());
    }

    let content = match std::fs::read_to_string(&config_path) {
        Ok(c) => c,
        Err(source) => {
            let err = ConfigError::Io {
                path: config_path,
                source,
            };
            tracing::warn!(error = %err, "Using default configuration");
            return (AppConfig::default(), vec![err]);
        }
    };

    let raw: RawConfig = match toml::from_str(&content) {
        Ok(r) => r,
        Err(source) => {
            let err = ConfigError::TomlParse {
                path: config_path,
                source,
            };
            tracing::warn!(error = %err, "Using default configuration");
            return (AppConfig::default(), vec![err]);
        }
    };

    tracing::info!(path = %config_path.display(), "Loaded config.toml");
    validate(raw)
}

fn out_of_range(field: &str, value: impl ToString, expected: impl Into<String>) -> ConfigError {
    ConfigError::ValueOutOfRange {
        field: field.to_string(),
        value: value.to_string(),
        expected: expected.into(),
    }
}

/// Check every field against its allowed range, collecting all problems.
pub fn validate(raw: RawConfig) -> (AppConfig, Vec<ConfigError>) {
    let mut config = AppConfig::default();
    let mut warnings = Vec::new();

    // -- Connection --
    if let Some(url) = raw.connection.page_url {
        if url.trim().is_empty() {
            warnings.push(out_of_range("connection.page_url", "", "a non-empty http(s) URL"));
        } else {
            config.page_url = Some(url);
        }
    }

    if let Some(reconnect) = raw.connection.reconnect {
        config.reconnect = reconnect;
    }

    let delay_range = constants::MIN_RECONNECT_MS..=constants::MAX_RECONNECT_MS;
    let delay_expected = format!(
        "{}-{} milliseconds",
        constants::MIN_RECONNECT_MS,
        constants::MAX_RECONNECT_MS
    );
    if let Some(ms) = raw.connection.reconnect_initial_ms {
        if delay_range.contains(&ms) {
            config.reconnect_initial = Duration::from_millis(ms);
        } else {
            warnings.push(out_of_range(
                "connection.reconnect_initial_ms",
                ms,
                delay_expected.clone(),
            ));
        }
    }
    if let Some(ms) = raw.connection.reconnect_max_ms {
        if delay_range.contains(&ms) {
            config.reconnect_max = Duration::from_millis(ms);
        } else {
            warnings.push(out_of_range("connection.reconnect_max_ms", ms, delay_expected));
        }
    }
    if config.reconnect_max < config.reconnect_initial {
        warnings.push(out_of_range(
            "connection.reconnect_max_ms",
            config.reconnect_max.as_millis(),
            format!(">= reconnect_initial_ms ({})", config.reconnect_initial.as_millis()),
        ));
        config.reconnect_max = config.reconnect_initial;
    }

    // -- Display --
    if let Some(rows) = raw.display.max_rows {
        if rows <= constants::ABSOLUTE_MAX_ROWS {
            config.max_rows = rows;
        } else {
            warnings.push(out_of_range(
                "display.max_rows",
                rows,
                format!("0 (unlimited) to {}", constants::ABSOLUTE_MAX_ROWS),
            ));
        }
    }

    if let Some(theme) = raw.display.theme {
        match theme.to_lowercase().as_str() {
            "dark" => config.dark_mode = true,
            "light" => config.dark_mode = false,
            _ => warnings.push(out_of_range("display.theme", theme, "\"dark\" or \"light\"")),
        }
    }

    if let Some(size) = raw.display.font_size {
        if (constants::MIN_FONT_SIZE..=constants::MAX_FONT_SIZE).contains(&size) {
            config.font_size = size;
        } else {
            warnings.push(out_of_range(
                "display.font_size",
                size,
                format!("{}-{}", constants::MIN_FONT_SIZE, constants::MAX_FONT_SIZE),
            ));
        }
    }

    // -- Logging --
    if let Some(level) = raw.logging.level {
        let valid = ["error", "warn", "info", "debug", "trace"];
        if valid.contains(&level.to_lowercase().as_str()) {
            config.log_level = Some(level);
        } else {
            warnings.push(out_of_range(
                "logging.level",
                level,
                "error, warn, info, debug, or trace",
            ));
        }
    }

    if let Some(file) = raw.logging.file {
        if !file.is_empty() {
            config.log_file = Some(file);
        }
    }

    for warning in &warnings {
        tracing::warn!(warning = %warning, "Config value ignored; using default");
    }

    (config, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) {
        std::fs::write(dir.path().join(constants::CONFIG_FILE_NAME), body).unwrap();
    }

    #[test]
    fn test_missing_config_is_default_without_warnings() {
        let dir = TempDir::new().unwrap();
        let (config, warnings) = load_config(dir.path());
        assert_eq!(config, AppConfig::default());
        assert!(warnings.is_empty());
        assert!(!config.reconnect);
    }

    #[test]
    fn test_valid_config_is_applied() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            r#"
            [connection]
            page_url = "https://logs.example.com/weblog/"
            reconnect = true
            reconnect_initial_ms = 500
            reconnect_max_ms = 8000

            [display]
            max_rows = 5000
            theme = "Light"
            font_size = 16.0

            [logging]
            level = "debug"
            file = "/tmp/weblog-tail.log"
            "#,
        );
        let (config, warnings) = load_config(dir.path());
        assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
        assert_eq!(config.page_url.as_deref(), Some("https://logs.example.com/weblog/"));
        assert!(config.reconnect);
        assert_eq!(config.reconnect_initial, Duration::from_millis(500));
        assert_eq!(config.reconnect_max, Duration::from_millis(8000));
        assert_eq!(config.max_rows, 5000);
        assert!(!config.dark_mode);
        assert_eq!(config.font_size, 16.0);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.log_file.as_deref(), Some("/tmp/weblog-tail.log"));
    }

    #[test]
    fn test_out_of_range_values_fall_back() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            r#"
            [connection]
            reconnect_initial_ms = 5

            [display]
            max_rows = 999999999
            theme = "solarized"
            font_size = 64.0

            [logging]
            level = "loud"
            "#,
        );
        let (config, warnings) = load_config(dir.path());
        assert_eq!(warnings.len(), 5);
        assert!(warnings
            .iter()
            .all(|w| matches!(w, ConfigError::ValueOutOfRange { .. })));
        assert_eq!(config.max_rows, constants::DEFAULT_MAX_ROWS);
        assert!(config.dark_mode);
        assert_eq!(config.font_size, constants::DEFAULT_FONT_SIZE);
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_max_below_initial_is_raised() {
        let dir = TempDir::new().unwrap();
        write_config(
            &dir,
            "[connection]\nreconnect_initial_ms = 5000\nreconnect_max_ms = 1000\n",
        );
        let (config, warnings) = load_config(dir.path());
        assert_eq!(warnings.len(), 1);
        assert_eq!(config.reconnect_max, config.reconnect_initial);
    }

    #[test]
    fn test_unparseable_config_warns_and_uses_defaults() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "[display\nmax_rows = ");
        let (config, warnings) = load_config(dir.path());
        assert_eq!(config, AppConfig::default());
        assert!(matches!(warnings.as_slice(), [ConfigError::TomlParse { .. }]));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let dir = TempDir::new().unwrap();
        write_config(&dir, "[future]\nflag = true\n[display]\nmax_rows = 10\n");
        let (config, warnings) = load_config(dir.path());
        assert!(warnings.is_empty());
        assert_eq!(config.max_rows, 10);
    }
}
