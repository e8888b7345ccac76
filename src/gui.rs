// Weblog Tail - gui.rs
//
// Top-level eframe::App implementation.
// Drains the connection once per frame and lays out the panels.

use crate::app::prefs::{self, PrefsData};
use crate::app::state::AppState;
use crate::core::model::ConnectionState;
use crate::ui;
use crate::util::constants::{ACTIVE_REPAINT_INTERVAL_MS, MAX_EVENTS_PER_FRAME};
use std::path::PathBuf;
use std::time::Duration;

pub struct WeblogApp {
    pub state: AppState,
    prefs_path: PathBuf,
}

impl WeblogApp {
    pub fn new(cc: &eframe::CreationContext<'_>, state: AppState, prefs_path: PathBuf) -> Self {
        apply_style(&cc.egui_ctx, state.dark_mode, state.font_size);
        Self { state, prefs_path }
    }

    fn save_prefs(&self) {
        let data = PrefsData::new(
            Some(self.state.page_url.clone()),
            self.state.session.last_query().map(str::to_string),
        );
        if let Err(e) = prefs::save(&data, &self.prefs_path) {
            tracing::warn!(error = %e, "Could not save preferences");
        }
    }
}

fn apply_style(ctx: &egui::Context, dark_mode: bool, font_size: f32) {
    ctx.set_visuals(if dark_mode {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    });
    ctx.style_mut(|style| {
        for (text_style, font) in style.text_styles.iter_mut() {
            if matches!(text_style, egui::TextStyle::Body | egui::TextStyle::Button) {
                font.size = font_size;
            }
        }
    });
}

impl eframe::App for WeblogApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let summary = self.state.pump(MAX_EVENTS_PER_FRAME);
        if summary.events == MAX_EVENTS_PER_FRAME {
            // Budget exhausted; more events are likely queued.
            ctx.request_repaint();
        } else if self.state.session.connection().is_active() {
            ctx.request_repaint_after(Duration::from_millis(ACTIVE_REPAINT_INTERVAL_MS));
        }

        // Top menu bar
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("Connection", |ui| {
                    let state = self.state.session.state();
                    if ui
                        .add_enabled(
                            state == ConnectionState::Disconnected,
                            egui::Button::new("Reconnect"),
                        )
                        .clicked()
                    {
                        self.state.reconnect();
                        ui.close_menu();
                    }
                    if ui
                        .add_enabled(
                            state != ConnectionState::Disconnected,
                            egui::Button::new("Disconnect"),
                        )
                        .clicked()
                    {
                        self.state.session.close();
                        self.state.status_message = "Disconnected.".to_string();
                        ui.close_menu();
                    }
                    ui.separator();
                    if ui.button("Exit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("View", |ui| {
                    if ui.checkbox(&mut self.state.dark_mode, "Dark mode").changed() {
                        apply_style(ctx, self.state.dark_mode, self.state.font_size);
                    }
                });
            });
        });

        ui::panels::banner::render(ctx, &mut self.state);

        egui::TopBottomPanel::top("query_bar").show(ctx, |ui| {
            ui.add_space(2.0);
            ui::panels::query_bar::render(ui, &mut self.state);
            ui.add_space(2.0);
        });

        // Status bar
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                let conn = self.state.session.state();
                ui.label(
                    egui::RichText::new(format!("\u{25cf} {conn}"))
                        .strong()
                        .color(ui::theme::connection_colour(conn)),
                )
                .on_hover_text(conn.marker());
                ui.separator();
                ui.label(&self.state.status_message);
                if let Some(err) = self.state.session.last_server_error() {
                    ui.separator();
                    ui.label(
                        egui::RichText::new(err)
                            .color(ui::theme::severity_colour(
                                crate::core::model::Severity::Error,
                                self.state.dark_mode,
                            )),
                    );
                }
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let table = self.state.session.table();
                    ui.label(format!(
                        "{} rows ({} received)",
                        table.len(),
                        table.total_received()
                    ));
                    ui.separator();
                    let base = self.state.session.base_time().instant();
                    ui.label(format!("base {}", base.format("%H:%M:%S")))
                        .on_hover_text(format!(
                            "Row offsets are seconds from {}",
                            base.format("%Y-%m-%d %H:%M:%S%.3f UTC")
                        ));
                    let dropped = self.state.session.protocol_errors();
                    if dropped > 0 {
                        ui.separator();
                        ui.label(format!("{dropped} frames dropped"))
                            .on_hover_text("Undecodable frames; see the log for details");
                    }
                    if !self.state.warnings.is_empty() {
                        ui.separator();
                        let text = self.state.warnings.join("\n");
                        ui.label(format!("{} config warning(s)", self.state.warnings.len()))
                            .on_hover_text(text);
                    }
                });
            });
        });

        // Detail pane (bottom)
        egui::TopBottomPanel::bottom("detail_pane")
            .resizable(true)
            .default_height(ui::theme::DETAIL_PANE_HEIGHT)
            .show(ctx, |ui| {
                ui::panels::detail::render(ui, &self.state);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui::panels::log_table::render(ui, &mut self.state);
        });
    }

    /// Called by eframe when the window is about to close.
    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.save_prefs();
        self.state.session.close();
    }
}
