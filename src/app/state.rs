// Weblog Tail - app/state.rs
//
// Application state owned by the eframe::App implementation: the live
// session plus the UI-only bits around it (query input, selection, status).

use crate::app::session::{PumpSummary, Session};
use crate::core::model::{ConnectionState, LogRow};

/// Top-level application state.
pub struct AppState {
    pub session: Session,

    /// Page URL the endpoint was derived from. Saved to prefs on exit.
    pub page_url: String,

    /// Text currently in the query input.
    pub query_input: String,

    /// Row selected in the log table, by sequence number so it survives
    /// new rows being prepended.
    pub selected_seq: Option<u64>,

    pub status_message: String,

    /// Config warnings shown once at start-up.
    pub warnings: Vec<String>,

    pub dark_mode: bool,
    pub font_size: f32,
}

impl AppState {
    pub fn new(session: Session, page_url: String) -> Self {
        let query_input = session.last_query().unwrap_or_default().to_string();
        Self {
            session,
            page_url,
            query_input,
            selected_seq: None,
            status_message: "Ready.".to_string(),
            warnings: Vec::new(),
            dark_mode: true,
            font_size: crate::util::constants::DEFAULT_FONT_SIZE,
        }
    }

    /// Forward the query input to the backend.
    pub fn submit_query(&mut self) {
        let selector = self.query_input.clone();
        match self.session.submit_query(&selector) {
            Ok(()) => {
                self.status_message = if selector.is_empty() {
                    "Following all events.".to_string()
                } else {
                    format!("Query sent: {selector}")
                };
            }
            Err(e) => {
                // Nothing is queued; the query is only delivered to an open socket.
                tracing::debug!(error = %e, "Query not sent");
                self.status_message = format!("Query not sent: {}", self.session.state());
            }
        }
    }

    /// Reopen the connection after a disconnect.
    pub fn reconnect(&mut self) {
        self.session.connect();
        self.status_message = format!("Connecting to {}", self.session.connection().endpoint());
    }

    /// Drain worker events and refresh derived UI state.
    pub fn pump(&mut self, budget: usize) -> PumpSummary {
        let summary = self.session.pump(budget);

        if summary.cleared {
            self.selected_seq = None;
        }
        if let Some(seq) = self.selected_seq {
            if !self.session.table().rows().any(|r| r.seq == seq) {
                self.selected_seq = None;
            }
        }

        if summary.state_changed {
            self.status_message = match self.session.state() {
                ConnectionState::Connecting => {
                    format!("Connecting to {}", self.session.connection().endpoint())
                }
                ConnectionState::Connected => {
                    format!("Connected to {}", self.session.connection().endpoint())
                }
                ConnectionState::Disconnected => match self.session.last_transport_error() {
                    Some(reason) => format!("Disconnected: {reason}"),
                    None => "Disconnected.".to_string(),
                },
            };
        }
        summary
    }

    /// The currently selected row, if it is still in the table.
    pub fn selected_row(&self) -> Option<&LogRow> {
        let seq = self.selected_seq?;
        self.session.table().rows().find(|r| r.seq == seq)
    }
}
