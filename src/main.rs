mod app;
mod color;
mod ui;

use app::DashboardApp;
use eframe::egui;
use sp_dashboard::config::Config;

fn main() -> eframe::Result {
    let config = match Config::new("dashboard") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {e}");
            std::process::exit(1);
        }
    };

    env_logger::Builder::new()
        .filter_level(config.log.level.into())
        .parse_default_env()
        .init();

    let state = sp_dashboard::state::bootstrap(&config);
    if let Err(e) = &state {
        log::error!("Dashboard unavailable: {e}");
    }

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([800.0, 500.0]),
        ..Default::default()
    };

    eframe::run_native(
        "São Paulo Listings",
        options,
        Box::new(|_cc| Ok(Box::new(DashboardApp::new(state)))),
    )
}
