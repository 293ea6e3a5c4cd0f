mod app;
mod state;
mod ui;

use app::SpexViewerApp;
use eframe::egui;
use spex_prism::LibraryConfig;

fn main() -> eframe::Result {
    env_logger::init();

    let config = LibraryConfig::from_env();
    log::debug!("Library config: {config:?}");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "SpeX Prism – Spectral Library Viewer",
        options,
        Box::new(move |_cc| Ok(Box::new(SpexViewerApp::with_config(config)))),
    )
}
