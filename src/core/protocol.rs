// Weblog Tail - core/protocol.rs
//
// Wire protocol: JSON text frames in both directions.
//
// Inbound frames are decoded into the closed `InboundMessage` union. Decoding
// never panics: every way a frame can be wrong maps to a `ProtocolError`
// variant the caller can log, count, or surface.
//
// Outbound envelopes are built with serde, so selector text containing quotes,
// backslashes, or non-ASCII characters is always escaped correctly.

use crate::core::model::LogEvent;
use crate::util::constants::FRAME_PREVIEW_CHARS;
use crate::util::error::ProtocolError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every inbound message this client understands.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundMessage {
    /// Empty the log table.
    Clear,
    /// Replace the base time used for row offsets.
    BaseTime(DateTime<Utc>),
    /// Append one log event.
    Log(LogEvent),
    /// The backend reported a problem, e.g. an unparseable selector.
    ServerError {
        message: String,
        detail: Option<String>,
    },
}

/// Every outbound message this client sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OutboundMessage {
    Selector { selector: String },
}

#[derive(Deserialize)]
struct BaseTimePayload {
    #[serde(deserialize_with = "crate::core::timestamp::deserialize")]
    basetime: DateTime<Utc>,
}

#[derive(Deserialize)]
struct LogPayload {
    log: LogEvent,
}

#[derive(Deserialize)]
struct ErrorPayload {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Decode one inbound text frame.
pub fn decode(text: &str) -> Result<InboundMessage, ProtocolError> {
    let value: Value = serde_json::from_str(text).map_err(|source| ProtocolError::InvalidJson {
        preview: preview(text),
        source,
    })?;

    let kind = match &value {
        Value::Object(obj) => match obj.get("type") {
            Some(Value::String(kind)) => kind.clone(),
            _ => return Err(ProtocolError::MissingType),
        },
        _ => return Err(ProtocolError::NotAnObject),
    };

    match kind.as_str() {
        "clear" => Ok(InboundMessage::Clear),
        "basetime" => {
            let payload: BaseTimePayload = payload("basetime", value)?;
            Ok(InboundMessage::BaseTime(payload.basetime))
        }
        "log" => {
            let payload: LogPayload = payload("log", value)?;
            Ok(InboundMessage::Log(payload.log))
        }
        "error" => {
            let payload: ErrorPayload = payload("error", value)?;
            Ok(InboundMessage::ServerError {
                message: payload
                    .message
                    .unwrap_or_else(|| "backend reported an error".to_string()),
                detail: payload.error,
            })
        }
        _ => Err(ProtocolError::UnknownType { kind }),
    }
}

fn payload<T: for<'de> Deserialize<'de>>(
    kind: &'static str,
    value: Value,
) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|source| ProtocolError::Malformed { kind, source })
}

/// Serialise an outbound message to its JSON text frame.
pub fn encode(message: &OutboundMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(|source| ProtocolError::Encode { source })
}

/// Build the `selector` envelope for a user query, verbatim.
pub fn selector_envelope(selector: &str) -> Result<String, ProtocolError> {
    encode(&OutboundMessage::Selector {
        selector: selector.to_string(),
    })
}

/// Char-boundary-safe prefix of `text` for diagnostics.
pub fn preview(text: &str) -> String {
    match text.char_indices().nth(FRAME_PREVIEW_CHARS) {
        Some((idx, _)) => format!("{}\u{2026}", &text[..idx]),
        None => text.to_string(),
    }
}
