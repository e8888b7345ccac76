// Weblog Tail - app/stream.rs
//
// Log stream handler: decodes inbound frames and applies them to the
// rendered log table and the rolling base time.
//
// Frames are handled one at a time, in the order the connection delivers
// them; each dispatch completes before the next frame is looked at.

use crate::core::log_table::LogTable;
use crate::core::model::BaseTime;
use crate::core::protocol::{self, InboundMessage};
use crate::util::error::ProtocolError;
use chrono::{DateTime, Utc};

/// What a single inbound message did.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Cleared { removed: usize },
    BaseTimeSet(DateTime<Utc>),
    Appended,
    ServerError {
        message: String,
        detail: Option<String>,
    },
}

/// Owns the base time and the table it is applied to.
#[derive(Debug)]
pub struct LogStreamHandler {
    base_time: BaseTime,
    table: LogTable,
}

impl LogStreamHandler {
    /// Base time starts at the local clock until the backend sends one.
    pub fn new(max_rows: usize) -> Self {
        Self {
            base_time: BaseTime::now(),
            table: LogTable::new(max_rows),
        }
    }

    /// Decode `text` and apply it. Undecodable frames leave all state as-is.
    pub fn handle_frame(&mut self, text: &str) -> Result<Dispatch, ProtocolError> {
        let message = protocol::decode(text)?;
        Ok(self.apply(message))
    }

    pub fn apply(&mut self, message: InboundMessage) -> Dispatch {
        match message {
            InboundMessage::Clear => {
                let removed = self.table.clear();
                tracing::debug!(removed, "Log table cleared");
                Dispatch::Cleared { removed }
            }
            InboundMessage::BaseTime(instant) => {
                // Rows already rendered keep their offsets.
                self.base_time = BaseTime::at(instant);
                tracing::debug!(basetime = %instant, "Base time updated");
                Dispatch::BaseTimeSet(instant)
            }
            InboundMessage::Log(event) => {
                let row = self.table.prepend(event, &self.base_time);
                tracing::trace!(seq = row.seq, offset = row.offset_secs, "Row appended");
                Dispatch::Appended
            }
            InboundMessage::ServerError { message, detail } => {
                tracing::warn!(
                    message = %message,
                    detail = detail.as_deref().unwrap_or(""),
                    "Backend reported an error"
                );
                Dispatch::ServerError { message, detail }
            }
        }
    }

    pub fn base_time(&self) -> BaseTime {
        self.base_time
    }

    pub fn table(&self) -> &LogTable {
        &self.table
    }
}
