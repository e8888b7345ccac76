// Weblog Tail - core/model.rs
//
// Core data model types. Pure data definitions with no I/O, no UI,
// no platform dependencies.
//
// These types are the shared vocabulary across all layers.

use crate::util::constants::PREFIX_PLACEHOLDER;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

// =============================================================================
// Connection state
// =============================================================================

/// Lifecycle of the single streaming socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    Connecting,
    Connected,
    #[default]
    Disconnected,
}

impl ConnectionState {
    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
        }
    }

    /// State-named marker the presentation layer keys its styling on.
    pub fn marker(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "weblog-connecting",
            ConnectionState::Connected => "weblog-connected",
            ConnectionState::Disconnected => "weblog-disconnected",
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Connection events (worker thread -> UI thread)
// =============================================================================

/// Why a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// `close()` or the shutdown hook was invoked on this side.
    Local,
    /// The backend closed the socket.
    Remote,
    /// Handshake, read, or write failure.
    Failed,
}

/// Messages sent from the connection worker to the UI thread.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// A connection attempt is starting. `attempt` counts from 1 and resets
    /// after every successful open.
    Connecting { attempt: u32 },
    /// The socket is open.
    Opened,
    /// One inbound text frame, in transport order.
    Frame { text: String },
    /// A transport error occurred; a `Closed` event follows.
    Error { message: String },
    /// The socket is gone.
    Closed { reason: CloseReason },
}

// =============================================================================
// Severity
// =============================================================================

/// Normalised severity derived from the free-form `level` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Severity {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
    #[default]
    Unknown,
}

impl Severity {
    /// Map a backend level name (logrus-style, case-insensitive).
    pub fn from_level(level: &str) -> Self {
        match level.trim().to_ascii_lowercase().as_str() {
            "panic" | "fatal" | "critical" | "crit" => Severity::Critical,
            "error" | "err" => Severity::Error,
            "warning" | "warn" => Severity::Warning,
            "info" | "information" => Severity::Info,
            "debug" | "trace" => Severity::Debug,
            _ => Severity::Unknown,
        }
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Critical => "Critical",
            Severity::Error => "Error",
            Severity::Warning => "Warning",
            Severity::Info => "Info",
            Severity::Debug => "Debug",
            Severity::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Base time
// =============================================================================

/// Reference instant for relative row offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaseTime(DateTime<Utc>);

impl BaseTime {
    /// Base time anchored at the local clock.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn at(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }

    pub fn instant(&self) -> DateTime<Utc> {
        self.0
    }

    /// Whole seconds from the base time to `time`, rounded the way
    /// JavaScript's `Math.round` does (halves toward positive infinity).
    /// Negative when `time` precedes the base.
    pub fn offset_secs(&self, time: DateTime<Utc>) -> i64 {
        let ms = (time - self.0).num_milliseconds();
        (ms as f64 / 1000.0 + 0.5).floor() as i64
    }
}

// =============================================================================
// Log event (wire payload of a `log` message)
// =============================================================================

/// One structured log event as received from the backend.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogEvent {
    #[serde(deserialize_with = "crate::core::timestamp::deserialize")]
    pub time: DateTime<Utc>,

    /// Non-string values are kept as their JSON text.
    #[serde(default, deserialize_with = "deserialize_text")]
    pub level: Option<String>,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub message: Option<String>,

    /// Structured fields. Non-string values are kept as their JSON text;
    /// `null` values are dropped.
    #[serde(default, deserialize_with = "deserialize_fields")]
    pub fields: BTreeMap<String, String>,
}

impl LogEvent {
    pub fn prefix(&self) -> Option<&str> {
        self.fields.get("prefix").map(String::as_str)
    }
}

fn value_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(serde_json::Value::deserialize(deserializer)?))
}

fn deserialize_fields<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<serde_json::Map<String, serde_json::Value>> =
        Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| value_text(value).map(|text| (key, text)))
        .collect())
}

// =============================================================================
// Rendered row
// =============================================================================

/// Content of the prefix column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prefix {
    Present(String),
    /// The event had no `prefix` field; rendered as a styled placeholder.
    Missing,
}

impl Prefix {
    pub fn text(&self) -> &str {
        match self {
            Prefix::Present(value) => value,
            Prefix::Missing => PREFIX_PLACEHOLDER,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Prefix::Missing)
    }
}

/// One row of the log table. Built once from a `LogEvent` and never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRow {
    /// Arrival sequence number within the session.
    pub seq: u64,
    /// Seconds relative to the base time in force when the row was built.
    pub offset_secs: i64,
    pub severity: Severity,
    pub level: String,
    pub prefix: Prefix,
    pub message: String,
    pub time: DateTime<Utc>,
    pub fields: BTreeMap<String, String>,
}

impl LogRow {
    /// Offset column text, e.g. `[5]`.
    pub fn offset_label(&self) -> String {
        format!("[{}]", self.offset_secs)
    }
}
