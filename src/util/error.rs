// Weblog Tail - util/error.rs
//
// Typed error hierarchy with context-preserving error chains.
// Every variant keeps its underlying cause reachable through `source()` so
// diagnostic logging can print the full chain.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Top-level error type for all Weblog Tail operations.
/// Errors are categorised by the subsystem that produced them.
#[derive(Debug)]
pub enum WeblogError {
    /// The socket endpoint could not be derived from the page URL.
    Endpoint(EndpointError),

    /// Connection lifecycle or transport failure.
    Connection(ConnectionError),

    /// An inbound frame could not be decoded, or an outbound one encoded.
    Protocol(ProtocolError),
}

impl fmt::Display for WeblogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Endpoint(e) => write!(f, "Endpoint error: {e}"),
            Self::Connection(e) => write!(f, "Connection error: {e}"),
            Self::Protocol(e) => write!(f, "Protocol error: {e}"),
        }
    }
}

impl std::error::Error for WeblogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Endpoint(e) => Some(e),
            Self::Connection(e) => Some(e),
            Self::Protocol(e) => Some(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Endpoint errors
// ---------------------------------------------------------------------------

/// Errors deriving the WebSocket endpoint from a page URL.
#[derive(Debug)]
pub enum EndpointError {
    /// The page URL is not a valid absolute URL.
    InvalidUrl {
        input: String,
        source: url::ParseError,
    },

    /// The page URL uses a scheme with no WebSocket counterpart.
    UnsupportedScheme { input: String, scheme: String },

    /// The `url` crate refused the http→ws scheme rewrite.
    SchemeRewrite { input: String },
}

impl fmt::Display for EndpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl { input, source } => {
                write!(f, "'{input}' is not a valid page URL: {source}")
            }
            Self::UnsupportedScheme { input, scheme } => write!(
                f,
                "'{input}' uses scheme '{scheme}'. Expected http, https, ws or wss."
            ),
            Self::SchemeRewrite { input } => {
                write!(f, "cannot rewrite the scheme of '{input}' to a WebSocket scheme")
            }
        }
    }
}

impl std::error::Error for EndpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidUrl { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<EndpointError> for WeblogError {
    fn from(e: EndpointError) -> Self {
        Self::Endpoint(e)
    }
}

// ---------------------------------------------------------------------------
// Connection errors
// ---------------------------------------------------------------------------

/// Errors related to the socket connection and its worker thread.
#[derive(Debug)]
pub enum ConnectionError {
    /// A send was attempted while the socket was not open.
    NotConnected { state: &'static str },

    /// The WebSocket handshake failed.
    Connect {
        endpoint: String,
        source: tungstenite::Error,
    },

    /// Writing a frame to the socket failed.
    Send { source: tungstenite::Error },

    /// Reading a frame from the socket failed.
    Receive { source: tungstenite::Error },

    /// Socket-level I/O failure outside the WebSocket layer.
    Io {
        operation: &'static str,
        source: io::Error,
    },

    /// The worker thread has exited and no longer accepts commands.
    WorkerGone,
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected { state } => {
                write!(f, "socket is not open (state: {state})")
            }
            Self::Connect { endpoint, source } => {
                write!(f, "cannot connect to '{endpoint}': {source}")
            }
            Self::Send { source } => write!(f, "send failed: {source}"),
            Self::Receive { source } => write!(f, "receive failed: {source}"),
            Self::Io { operation, source } => {
                write!(f, "I/O error during {operation}: {source}")
            }
            Self::WorkerGone => write!(f, "connection worker has stopped"),
        }
    }
}

impl std::error::Error for ConnectionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Connect { source, .. } => Some(source),
            Self::Send { source } => Some(source),
            Self::Receive { source } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConnectionError> for WeblogError {
    fn from(e: ConnectionError) -> Self {
        Self::Connection(e)
    }
}

// ---------------------------------------------------------------------------
// Protocol errors
// ---------------------------------------------------------------------------

/// Errors decoding inbound frames or encoding outbound envelopes.
#[derive(Debug)]
pub enum ProtocolError {
    /// The frame is not valid JSON.
    InvalidJson {
        preview: String,
        source: serde_json::Error,
    },

    /// The frame is JSON but not an object.
    NotAnObject,

    /// The `type` discriminator is absent or not a string.
    MissingType,

    /// The `type` discriminator names a message this client does not know.
    UnknownType { kind: String },

    /// The payload of a known message type does not match its schema.
    Malformed {
        kind: &'static str,
        source: serde_json::Error,
    },

    /// An outbound envelope could not be serialised.
    Encode { source: serde_json::Error },
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidJson { preview, source } => {
                write!(f, "frame is not valid JSON ({source}): '{preview}'")
            }
            Self::NotAnObject => write!(f, "frame is not a JSON object"),
            Self::MissingType => write!(f, "frame has no string 'type' field"),
            Self::UnknownType { kind } => write!(f, "unrecognised message type '{kind}'"),
            Self::Malformed { kind, source } => {
                write!(f, "malformed '{kind}' message: {source}")
            }
            Self::Encode { source } => write!(f, "cannot encode envelope: {source}"),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::InvalidJson { source, .. } => Some(source),
            Self::Malformed { source, .. } => Some(source),
            Self::Encode { source } => Some(source),
            _ => None,
        }
    }
}

impl From<ProtocolError> for WeblogError {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

// ---------------------------------------------------------------------------
// Config errors
// ---------------------------------------------------------------------------

/// Errors related to configuration loading. Reported as start-up warnings;
/// the affected value falls back to its default.
#[derive(Debug)]
pub enum ConfigError {
    /// TOML parsing failed.
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// A config value is out of the allowed range.
    ValueOutOfRange {
        field: String,
        value: String,
        expected: String,
    },

    /// I/O error reading config file.
    Io { path: PathBuf, source: io::Error },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TomlParse { path, source } => {
                write!(f, "Config parse error '{}': {source}", path.display())
            }
            Self::ValueOutOfRange {
                field,
                value,
                expected,
            } => write!(
                f,
                "Config '{field}' = '{value}' is out of range. Expected: {expected}"
            ),
            Self::Io { path, source } => {
                write!(f, "Config I/O error '{}': {source}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::TomlParse { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Convenience type alias for Weblog Tail results.
pub type Result<T> = std::result::Result<T, WeblogError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_protocol_error_source_chain_is_preserved() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: WeblogError = ProtocolError::InvalidJson {
            preview: "{".to_string(),
            source,
        }
        .into();
        let inner = err.source().expect("top-level error must expose its cause");
        assert!(inner.source().is_some(), "serde_json cause must stay reachable");
        assert!(err.to_string().starts_with("Protocol error:"));
    }

    #[test]
    fn test_endpoint_error_converts_with_context() {
        let err: WeblogError = EndpointError::UnsupportedScheme {
            input: "ftp://host/".to_string(),
            scheme: "ftp".to_string(),
        }
        .into();
        assert!(matches!(err, WeblogError::Endpoint(_)));
        assert!(err.to_string().starts_with("Endpoint error:"));
        assert!(err.to_string().contains("ftp"));
    }

    #[test]
    fn test_not_connected_mentions_state() {
        let err = ConnectionError::NotConnected {
            state: "disconnected",
        };
        assert_eq!(err.to_string(), "socket is not open (state: disconnected)");
        assert!(err.source().is_none());
    }
}
