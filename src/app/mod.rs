// Weblog Tail - app/mod.rs
//
// Application layer: connection supervision, stream handling, session
// orchestration, and preference persistence.
// Dependencies: core layer.
// Must NOT depend on: ui, platform specifics.

pub mod connection;
pub mod prefs;
pub mod session;
pub mod state;
pub mod stream;
