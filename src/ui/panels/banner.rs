// Weblog Tail - ui/panels/banner.rs
//
// "Disconnected" banner. Visible only while the connection is down.

use crate::app::state::AppState;
use crate::core::model::ConnectionState;
use crate::ui::theme;

/// Returns `true` if the banner was drawn.
pub fn render(ctx: &egui::Context, state: &mut AppState) -> bool {
    if state.session.state() != ConnectionState::Disconnected {
        return false;
    }

    egui::TopBottomPanel::top("disconnected_banner")
        .frame(
            egui::Frame::default()
                .fill(theme::BANNER_BG)
                .inner_margin(egui::Margin::symmetric(8, 6)),
        )
        .show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new("Disconnected")
                        .strong()
                        .color(theme::BANNER_TEXT),
                );
                if let Some(reason) = state.session.last_transport_error() {
                    ui.label(egui::RichText::new(reason).small().color(theme::BANNER_TEXT));
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Reconnect").clicked() {
                        state.reconnect();
                    }
                });
            });
        });
    true
}
