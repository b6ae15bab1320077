mod app;
mod color;
mod config;
mod data;
mod state;
mod ui;

use std::sync::Arc;

use app::BikeDashboardApp;
use clap::Parser;
use config::Cli;
use data::loader::DatasetCache;
use eframe::egui;

fn main() -> eframe::Result {
    env_logger::init();
    let cli = Cli::parse();

    let sources = cli.sources();
    log::info!(
        "Data sources: daily = {}, hourly = {}",
        sources.daily,
        sources.hourly
    );
    let cache = Arc::new(DatasetCache::new(sources));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 900.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Bike Sharing Dashboard",
        options,
        Box::new(move |_cc| Ok(Box::new(BikeDashboardApp::new(cache)))),
    )
}
