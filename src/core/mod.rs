// Weblog Tail - core/mod.rs
//
// Core logic layer: data model, wire protocol, endpoint derivation, and the
// rendered log table.
// Must NOT depend on: ui, platform, app, or perform socket I/O.

pub mod endpoint;
pub mod log_table;
pub mod model;
pub mod protocol;
pub mod timestamp;
