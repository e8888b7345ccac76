// Weblog Tail - ui/panels/query_bar.rs
//
// Selector input and Search button. The text is sent verbatim; Enter in the
// input and the button do the same thing.

use crate::app::state::AppState;
use crate::core::model::ConnectionState;

const SEARCH_BUTTON_WIDTH: f32 = 72.0;

pub fn render(ui: &mut egui::Ui, state: &mut AppState) {
    ui.horizontal(|ui| {
        ui.label("Query:");

        let input = ui.add(
            egui::TextEdit::singleline(&mut state.query_input)
                .hint_text("selector, e.g. level = \"error\"")
                .font(egui::TextStyle::Monospace)
                .desired_width(ui.available_width() - SEARCH_BUTTON_WIDTH - 8.0),
        );
        let enter = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        let mut search = ui.add_sized([SEARCH_BUTTON_WIDTH, 20.0], egui::Button::new("Search"));
        if state.session.state() != ConnectionState::Connected {
            search = search.on_hover_text("Queries are only delivered while connected");
        }

        if enter || search.clicked() {
            state.submit_query();
            if enter {
                input.request_focus();
            }
        }
    });
}
