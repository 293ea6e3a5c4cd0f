use eframe::egui;
use spex_prism::LibraryConfig;

use crate::state::AppState;
use crate::ui::{panels, plot};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct SpexViewerApp {
    pub state: AppState,
}

impl SpexViewerApp {
    /// Start with the library named by the environment, if it opens.
    pub fn with_config(config: LibraryConfig) -> Self {
        let mut state = AppState::default();
        if config.index_path().is_file() {
            state.open_library(config);
        }
        Self { state }
    }
}

impl eframe::App for SpexViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: spectral types ----
        egui::SidePanel::left("type_panel")
            .default_width(220.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Bottom panel: members of the selected type ----
        egui::TopBottomPanel::bottom("member_panel")
            .resizable(true)
            .default_height(160.0)
            .show(ctx, |ui| {
                panels::member_table(ui, &self.state);
            });

        // ---- Central panel: plot ----
        egui::CentralPanel::default().show(ctx, |ui| {
            plot::spectral_plot(ui, &self.state);
        });
    }
}
