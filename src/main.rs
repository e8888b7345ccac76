// Weblog Tail - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. config.toml loading and logging initialisation
// 3. Page URL resolution and socket endpoint derivation
// 4. Session start-up and eframe GUI launch

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod gui;

// Re-export library modules so `gui.rs` can use `crate::app::...` etc.
pub use weblog_tail::app;
pub use weblog_tail::core;
pub use weblog_tail::platform;
pub use weblog_tail::ui;
pub use weblog_tail::util;

use app::connection::{ConnectionManager, ReconnectPolicy, WsConnector};
use app::session::Session;
use clap::Parser;
use std::sync::Arc;
use util::constants;

/// Weblog Tail - live viewer for a weblog streaming backend.
///
/// Connects to the socket served next to PAGE_URL and shows log events as
/// they arrive, newest first.
#[derive(Parser, Debug)]
#[command(name = "weblog-tail", version, about)]
struct Cli {
    /// URL of the weblog page, e.g. http://host:8080/weblog/ (the socket is
    /// derived from it).
    page_url: Option<String>,

    /// Selector to send once the socket opens.
    #[arg(short = 'q', long = "query")]
    query: Option<String>,

    /// Reconnect automatically with exponential backoff.
    #[arg(short = 'r', long = "reconnect")]
    reconnect: bool,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug")]
    debug: bool,
}

/// Derive the socket endpoint, build the session, and start connecting.
fn start_session(
    cli: &Cli,
    config: &platform::config::AppConfig,
    page_url: &str,
    query: Option<&str>,
) -> util::error::Result<Session> {
    let endpoint = core::endpoint::socket_endpoint(page_url)?;

    let policy = if cli.reconnect || config.reconnect {
        ReconnectPolicy::with_backoff(config.reconnect_initial, config.reconnect_max)
    } else {
        ReconnectPolicy::disabled()
    };

    let manager = ConnectionManager::new(endpoint, Arc::new(WsConnector::new()), policy);
    let mut session = Session::new(manager, config.max_rows);
    if let Some(query) = query {
        session.queue_query(query);
    }
    session.connect();
    Ok(session)
}

fn main() {
    let cli = Cli::parse();

    let platform_paths = platform::config::PlatformPaths::resolve();
    let (config, config_warnings) = platform::config::load_config(&platform_paths.config_dir);

    util::logging::init(
        cli.debug,
        config.log_level.as_deref(),
        config.log_file.as_deref(),
    );

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "Weblog Tail starting"
    );
    for warning in &config_warnings {
        tracing::warn!(warning = %warning, "Configuration warning");
    }

    let prefs_path = app::prefs::prefs_path(&platform_paths.data_dir);
    let saved = app::prefs::load(&prefs_path);

    let page_url = app::prefs::resolve_page_url(
        cli.page_url.as_deref(),
        config.page_url.as_deref(),
        saved.as_ref().and_then(|p| p.page_url.as_deref()),
    );

    // -q wins over the selector saved on the last exit.
    let query = cli.query.clone().or_else(|| saved.and_then(|p| p.last_query));

    let session = match start_session(&cli, &config, &page_url, query.as_deref()) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, page_url = %page_url, "Cannot start session");
            eprintln!("Error: {e}");
            std::process::exit(2);
        }
    };

    let mut state = app::state::AppState::new(session, page_url);
    state.dark_mode = config.dark_mode;
    state.font_size = config.font_size;
    state.warnings = config_warnings.iter().map(ToString::to_string).collect();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!(
                "{} v{} - {}",
                constants::APP_NAME,
                constants::APP_VERSION,
                state.page_url
            ))
            .with_inner_size([1100.0, 700.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    let result = eframe::run_native(
        constants::APP_NAME,
        native_options,
        Box::new(move |cc| Ok(Box::new(gui::WeblogApp::new(cc, state, prefs_path)))),
    );

    if let Err(e) = result {
        tracing::error!(error = %e, "Failed to launch GUI");
        eprintln!("Error: Failed to launch Weblog Tail GUI: {e}");
        std::process::exit(1);
    }
}
