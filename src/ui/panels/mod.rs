// Weblog Tail - ui/panels/mod.rs

pub mod banner;
pub mod detail;
pub mod log_table;
pub mod query_bar;
