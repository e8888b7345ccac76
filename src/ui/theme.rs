// Weblog Tail - ui/theme.rs
//
// Severity palette, connection indicator colours, and layout constants.
// No dependencies on app state or business logic.

use crate::core::model::{ConnectionState, Severity};
use egui::Color32;

/// Level-column colour for a severity.
pub fn severity_colour(severity: Severity, dark_mode: bool) -> Color32 {
    match severity {
        Severity::Critical => Color32::from_rgb(220, 38, 38), // Red 600
        Severity::Error => Color32::from_rgb(239, 68, 68),    // Red 500
        Severity::Warning => Color32::from_rgb(217, 119, 6),  // Amber 600
        Severity::Info if dark_mode => Color32::from_rgb(96, 165, 250), // Blue 400
        Severity::Info => Color32::from_rgb(37, 99, 235),     // Blue 600
        Severity::Debug => Color32::from_rgb(107, 114, 128),  // Gray 500
        Severity::Unknown => Color32::from_rgb(156, 163, 175), // Gray 400
    }
}

/// Foreground for offset, prefix, and message columns.
pub fn row_text_colour(dark_mode: bool) -> Color32 {
    if dark_mode {
        Color32::from_rgb(229, 231, 235) // Gray 200
    } else {
        Color32::from_rgb(17, 24, 39) // Gray 900
    }
}

/// Dimmed colour for the missing-prefix placeholder.
pub fn placeholder_colour(dark_mode: bool) -> Color32 {
    if dark_mode {
        Color32::from_rgb(107, 114, 128)
    } else {
        Color32::from_rgb(156, 163, 175)
    }
}

/// Status-bar indicator colour per connection state.
pub fn connection_colour(state: ConnectionState) -> Color32 {
    match state {
        ConnectionState::Connecting => Color32::from_rgb(234, 179, 8), // Yellow 500
        ConnectionState::Connected => Color32::from_rgb(34, 197, 94),  // Green 500
        ConnectionState::Disconnected => Color32::from_rgb(220, 38, 38),
    }
}

pub const BANNER_BG: Color32 = Color32::from_rgb(127, 29, 29); // Red 900
pub const BANNER_TEXT: Color32 = Color32::from_rgb(254, 226, 226); // Red 100

/// Layout constants.
pub const DETAIL_PANE_HEIGHT: f32 = 180.0;
pub const ROW_HEIGHT: f32 = 20.0;
pub const ROW_FONT_SIZE: f32 = 12.0;
pub const LEVEL_COLUMN_CHARS: usize = 8;
pub const PREFIX_COLUMN_CHARS: usize = 12;
