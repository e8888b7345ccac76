// Weblog Tail - ui/panels/detail.rs
//
// Detail pane for the selected row: time, level, every field, full message.

use crate::app::state::AppState;

/// Render the detail pane (bottom panel).
pub fn render(ui: &mut egui::Ui, state: &AppState) {
    let Some(row) = state.selected_row() else {
        ui.centered_and_justified(|ui| {
            ui.label("Select a row to view details.");
        });
        return;
    };

    egui::Grid::new("detail_grid")
        .num_columns(2)
        .spacing([8.0, 4.0])
        .show(ui, |ui| {
            ui.label("Time:");
            ui.label(row.time.to_rfc3339());
            ui.end_row();

            ui.label("Offset:");
            ui.label(format!("{} s", row.offset_secs));
            ui.end_row();

            ui.label("Level:");
            ui.label(format!("{} ({})", row.level, row.severity));
            ui.end_row();

            for (key, value) in &row.fields {
                ui.label(format!("{key}:"));
                ui.label(egui::RichText::new(value).monospace());
                ui.end_row();
            }
        });

    ui.separator();
    ui.label("Message:");
    egui::ScrollArea::vertical()
        .max_height(100.0)
        .show(ui, |ui| {
            ui.label(egui::RichText::new(&row.message).monospace());
        });
}
