// Weblog Tail - app/session.rs
//
// The live tailing session: one connection manager, one stream handler, and
// the selector the user is currently following.
//
// The UI owns exactly one `Session` and calls `pump` once per frame. All
// session state is mutated on that thread only.

use crate::app::connection::{ConnectionManager, ShutdownHook};
use crate::app::stream::{Dispatch, LogStreamHandler};
use crate::core::log_table::LogTable;
use crate::core::model::{BaseTime, CloseReason, ConnectionEvent, ConnectionState};
use crate::core::protocol;
use crate::util::error::{ProtocolError, WeblogError};

/// Counts from one `pump` call, for status-bar updates and tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PumpSummary {
    /// Worker events handled this call.
    pub events: usize,
    pub rows_appended: usize,
    pub protocol_errors: usize,
    pub cleared: bool,
    pub state_changed: bool,
}

pub struct Session {
    connection: ConnectionManager,
    stream: LogStreamHandler,
    /// Last selector sent (or queued before the first open). Re-sent on open.
    last_query: Option<String>,
    protocol_errors: u64,
    last_server_error: Option<String>,
    last_transport_error: Option<String>,
}

impl Session {
    pub fn new(connection: ConnectionManager, max_rows: usize) -> Self {
        Self {
            connection,
            stream: LogStreamHandler::new(max_rows),
            last_query: None,
            protocol_errors: 0,
            last_server_error: None,
            last_transport_error: None,
        }
    }

    pub fn connect(&mut self) {
        self.last_transport_error = None;
        self.connection.connect();
    }

    pub fn close(&mut self) {
        self.connection.close();
    }

    /// Send `selector` now. Remembered for re-sending only if it went out.
    pub fn submit_query(&mut self, selector: &str) -> Result<(), WeblogError> {
        self.connection.send_query(selector)?;
        self.last_query = Some(selector.to_string());
        self.last_server_error = None;
        Ok(())
    }

    /// Remember `selector` without sending it; it goes out on the next open.
    pub fn queue_query(&mut self, selector: &str) {
        self.last_query = Some(selector.to_string());
    }

    /// Drain up to `budget` worker events and dispatch them in order.
    pub fn pump(&mut self, budget: usize) -> PumpSummary {
        let events = self.connection.drain_events(budget);
        self.handle_events(events)
    }

    /// Apply one worker event as if it had just been drained from the
    /// channel, state transition included.
    pub fn handle_event(&mut self, event: ConnectionEvent) -> PumpSummary {
        self.handle_events(vec![event])
    }

    /// Apply a batch of worker events in order. Each event's state transition
    /// is applied immediately before its side effects.
    ///
    /// The selector is re-sent only for an `Opened` that no later `Opened` or
    /// `Closed` in the same batch supersedes. Commands always reach the
    /// worker's current socket, whichever `Opened` they were sent for.
    pub fn handle_events(&mut self, events: Vec<ConnectionEvent>) -> PumpSummary {
        let before = self.connection.state();
        let mut summary = PumpSummary {
            events: events.len(),
            ..PumpSummary::default()
        };
        let last_transition = events.iter().rposition(|e| {
            matches!(e, ConnectionEvent::Opened | ConnectionEvent::Closed { .. })
        });
        for (index, event) in events.into_iter().enumerate() {
            self.connection.apply_event(&event);
            let current_open = Some(index) == last_transition;
            self.dispatch(event, current_open, &mut summary);
        }
        summary.state_changed = self.connection.state() != before;
        summary
    }

    /// Per-event side effects. The state transition has already been applied.
    fn dispatch(&mut self, event: ConnectionEvent, current_open: bool, summary: &mut PumpSummary) {
        match event {
            ConnectionEvent::Connecting { attempt } => {
                tracing::debug!(attempt, "Connection attempt");
            }
            ConnectionEvent::Opened => {
                self.last_transport_error = None;
                if !current_open {
                    tracing::debug!("Socket already replaced; selector not re-sent");
                } else if let Some(selector) = self.last_query.clone() {
                    match self.connection.send_query(&selector) {
                        Ok(()) => tracing::info!(selector = %selector, "Selector re-sent on open"),
                        Err(e) => tracing::warn!(error = %e, "Could not re-send selector"),
                    }
                }
            }
            ConnectionEvent::Frame { text } => match self.stream.handle_frame(&text) {
                Ok(Dispatch::Appended) => summary.rows_appended += 1,
                Ok(Dispatch::Cleared { .. }) => summary.cleared = true,
                Ok(Dispatch::BaseTimeSet(_)) => {}
                Ok(Dispatch::ServerError { message, detail }) => {
                    self.last_server_error = Some(match detail {
                        Some(detail) => format!("{message}: {detail}"),
                        None => message,
                    });
                }
                // Untyped objects such as the backend's greeting frame.
                Err(ProtocolError::MissingType) => {
                    tracing::debug!(frame = %protocol::preview(&text), "Ignoring untyped frame");
                }
                Err(e) => {
                    self.protocol_errors += 1;
                    summary.protocol_errors += 1;
                    tracing::warn!(
                        error = %e,
                        frame = %protocol::preview(&text),
                        "Discarding inbound frame"
                    );
                }
            },
            ConnectionEvent::Error { message } => {
                self.last_transport_error = Some(message);
            }
            ConnectionEvent::Closed { reason } => {
                if reason != CloseReason::Local {
                    tracing::info!(?reason, "Disconnected");
                }
            }
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn table(&self) -> &LogTable {
        self.stream.table()
    }

    pub fn base_time(&self) -> BaseTime {
        self.stream.base_time()
    }

    pub fn last_query(&self) -> Option<&str> {
        self.last_query.as_deref()
    }

    /// Frames discarded because they could not be decoded. Untyped frames
    /// are ignored without being counted.
    pub fn protocol_errors(&self) -> u64 {
        self.protocol_errors
    }

    /// Most recent `error` message from the backend, cleared by the next
    /// successful submit.
    pub fn last_server_error(&self) -> Option<&str> {
        self.last_server_error.as_deref()
    }

    /// Reason for the most recent transport failure, cleared on open.
    pub fn last_transport_error(&self) -> Option<&str> {
        self.last_transport_error.as_deref()
    }

    pub fn shutdown_hook(&self) -> Option<ShutdownHook> {
        self.connection.shutdown_hook()
    }
}

// =============================================================================
// Unit tests
// =============================================================================
