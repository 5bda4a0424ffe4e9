mod app;
mod color;
mod state;
mod ui;

use std::path::PathBuf;

use anyhow::anyhow;
use app::EvDashboardApp;
use eframe::egui;
use ev_dashboard::config::DashboardConfig;
use state::AppState;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut config = DashboardConfig::load()?;
    if let Some(path) = std::env::args_os().nth(1) {
        config.data_path = PathBuf::from(path);
    }
    log::info!("Reading vehicle data from {}", config.data_path.display());

    let mut state = AppState::new(config);
    state.reload();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([640.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "EV Population Dashboard",
        options,
        Box::new(|_cc| Ok(Box::new(EvDashboardApp::new(state)))),
    )
    .map_err(|e| anyhow!("{e}"))
}
