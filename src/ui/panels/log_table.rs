// Weblog Tail - ui/panels/log_table.rs
//
// Virtual-scrolling log table, newest row at the top.
//
// `ScrollArea::show_rows` lays out only the visible rows. Each row is one
// LayoutJob with four monospace columns: offset, level (severity coloured),
// prefix (dimmed italic when missing), message (first line).

use crate::app::state::AppState;
use crate::core::model::LogRow;
use crate::ui::theme;
use egui::text::{LayoutJob, TextFormat};

pub fn render(ui: &mut egui::Ui, state: &mut AppState) {
    let total = state.session.table().len();

    if total == 0 {
        ui.centered_and_justified(|ui| {
            ui.label("Waiting for log events\u{2026}");
        });
        return;
    }

    // Applied after show_rows so `state` is not borrowed mutably while a row
    // reference is alive.
    let mut clicked: Option<u64> = None;

    egui::ScrollArea::vertical()
        .auto_shrink([false; 2])
        .show_rows(ui, theme::ROW_HEIGHT, total, |ui, row_range| {
            for index in row_range {
                let Some(row) = state.session.table().get(index) else {
                    continue;
                };
                let is_selected = state.selected_seq == Some(row.seq);
                let job = row_job(row, state.dark_mode);

                let response = ui.selectable_label(is_selected, job);
                if response.clicked() {
                    clicked = Some(row.seq);
                }
                response.on_hover_text(row.time.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string());
            }
        });

    if let Some(seq) = clicked {
        state.selected_seq = if state.selected_seq == Some(seq) {
            None
        } else {
            Some(seq)
        };
    }
}

fn row_job(row: &LogRow, dark_mode: bool) -> LayoutJob {
    let font = egui::FontId::monospace(theme::ROW_FONT_SIZE);
    let body = TextFormat {
        font_id: font.clone(),
        color: theme::row_text_colour(dark_mode),
        ..Default::default()
    };

    let mut job = LayoutJob::default();
    job.append(&format!("{:>7} ", row.offset_label()), 0.0, body.clone());
    job.append(
        &format!("{:<width$} ", row.level, width = theme::LEVEL_COLUMN_CHARS),
        0.0,
        TextFormat {
            color: theme::severity_colour(row.severity, dark_mode),
            ..body.clone()
        },
    );

    let prefix_format = if row.prefix.is_missing() {
        TextFormat {
            color: theme::placeholder_colour(dark_mode),
            italics: true,
            ..body.clone()
        }
    } else {
        body.clone()
    };
    job.append(
        &format!(
            "{:<width$} ",
            row.prefix.text(),
            width = theme::PREFIX_COLUMN_CHARS
        ),
        0.0,
        prefix_format,
    );

    let first_line = row.message.lines().next().unwrap_or(&row.message);
    job.append(first_line, 0.0, body);
    job
}
