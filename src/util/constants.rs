// Weblog Tail - util/constants.rs
//
// Single source of truth for all named constants, limits, and defaults.

// =============================================================================
// Application metadata
// =============================================================================

/// Application display name.
pub const APP_NAME: &str = "Weblog Tail";

/// Application identifier used for config/data directories.
pub const APP_ID: &str = "weblog-tail";

/// Current application version.
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

// =============================================================================
// Endpoint and wire protocol
// =============================================================================

/// Path segment appended to the page URL to reach the streaming socket.
pub const SOCKET_PATH_SEGMENT: &str = "socket";

/// Page URL used when neither the CLI, the saved preferences, nor
/// config.toml provide one.
pub const DEFAULT_PAGE_URL: &str = "http://127.0.0.1:8080/";

/// Maximum number of characters of an offending frame quoted in protocol
/// error messages and debug output.
pub const FRAME_PREVIEW_CHARS: usize = 200;

// =============================================================================
// Connection worker
// =============================================================================

/// Socket read timeout. The worker checks its command channel (sends and
/// close requests) at least this often.
pub const SOCKET_READ_TIMEOUT_MS: u64 = 100;

/// Default initial reconnect delay when reconnection is enabled.
pub const DEFAULT_RECONNECT_INITIAL_MS: u64 = 1_000;

/// Default upper bound on the reconnect delay.
pub const DEFAULT_RECONNECT_MAX_MS: u64 = 30_000;

/// Smallest configurable reconnect delay.
pub const MIN_RECONNECT_MS: u64 = 100;

/// Largest configurable reconnect delay (10 minutes).
pub const MAX_RECONNECT_MS: u64 = 600_000;

// =============================================================================
// Per-frame UI message budget
// =============================================================================

/// Maximum number of connection events dispatched per UI frame. Anything
/// beyond this stays queued for the next frame so a burst of log lines
/// cannot stall rendering.
pub const MAX_EVENTS_PER_FRAME: usize = 500;

/// Repaint cadence while a connection is active, so frames that arrive
/// between input events still show up promptly.
pub const ACTIVE_REPAINT_INTERVAL_MS: u64 = 100;

// =============================================================================
// Log table
// =============================================================================

/// Default row cap. 0 means unlimited: rows are only removed by `clear`.
pub const DEFAULT_MAX_ROWS: usize = 0;

/// Hard upper bound on a configured row cap.
pub const ABSOLUTE_MAX_ROWS: usize = 1_000_000;

/// Text shown in the prefix column when an event carries no `prefix` field.
pub const PREFIX_PLACEHOLDER: &str = "[none]";

/// Text shown in the level column when an event has no `level`.
pub const MISSING_LEVEL_TEXT: &str = "unknown";

/// Text shown in the message column when an event has no `message`.
pub const MISSING_MESSAGE_TEXT: &str = "(no message)";

// =============================================================================
// UI defaults
// =============================================================================

/// Default UI body font size in points.
pub const DEFAULT_FONT_SIZE: f32 = 14.0;

/// Minimum user-configurable UI font size (points).
pub const MIN_FONT_SIZE: f32 = 10.0;

/// Maximum user-configurable UI font size (points).
pub const MAX_FONT_SIZE: f32 = 24.0;

// =============================================================================
// Logging
// =============================================================================

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// =============================================================================
// Configuration and persistence
// =============================================================================

/// Configuration file name.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Preferences file name (stored in the platform data directory).
pub const PREFS_FILE_NAME: &str = "prefs.json";
