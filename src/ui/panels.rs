use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use spex_prism::data::filter::matching_types;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – spectral type browser
// ---------------------------------------------------------------------------

/// Render the left panel: spectral types grouped by class.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Spectral types");
    ui.separator();

    if state.library.is_none() {
        ui.label("No library opened.");
        return;
    }

    ui.horizontal(|ui: &mut Ui| {
        ui.label("Filter");
        ui.text_edit_singleline(&mut state.type_query);
    });
    ui.separator();

    // Clone what we need so we can mutate state after the loop.
    let groups = state.type_groups.clone();
    let selected = state.selected_type.clone();
    let mut clicked: Option<String> = None;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for (class, members) in &groups {
                let visible = matching_types(members, &state.type_query);
                if visible.is_empty() {
                    continue;
                }
                let header_text = format!("{class}  ({})", members.len());

                egui::CollapsingHeader::new(RichText::new(header_text).strong())
                    .id_salt(class)
                    .default_open(true)
                    .show(ui, |ui: &mut Ui| {
                        for &i in &visible {
                            let ty = &members[i];
                            let is_selected = selected.as_deref() == Some(ty.as_str());
                            if ui.selectable_label(is_selected, ty).clicked() {
                                clicked = Some(ty.clone());
                            }
                        }
                    });
            }
        });

    if let Some(ty) = clicked {
        state.select_type(&ty);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open library…").clicked() {
                open_library_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ty) = &state.selected_type {
            ui.label(format!("{ty}: {} spectra loaded", state.loaded_count()));
        }

        ui.separator();

        if ui
            .selectable_label(state.minmax_scaling, "Min-Max Scaling")
            .clicked()
        {
            state.minmax_scaling = !state.minmax_scaling;
        }

        if ui
            .selectable_label(state.common_grid, "Common Grid")
            .clicked()
        {
            let on = !state.common_grid;
            state.set_common_grid(on);
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// Bottom panel – members of the selected type
// ---------------------------------------------------------------------------

/// Table of the selected type's spectra, plus any that failed to load.
pub fn member_table(ui: &mut Ui, state: &AppState) {
    let Some(batch) = &state.batch else {
        ui.label("Select a spectral type to list its spectra.");
        return;
    };

    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto().at_least(240.0))
        .column(Column::auto().at_least(80.0))
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("File");
            });
            header.col(|ui| {
                ui.strong("Samples");
            });
            header.col(|ui| {
                ui.strong("Wavelength range");
            });
        })
        .body(|mut body| {
            for i in 0..batch.len() {
                let filename = &batch.filenames[i];
                let color = state
                    .color_map
                    .as_ref()
                    .map(|cm| cm.color_for(filename))
                    .unwrap_or(Color32::LIGHT_BLUE);
                let range = batch
                    .spectrum(i)
                    .and_then(|sp| sp.wavelength_range())
                    .map(|(lo, hi)| format!("{lo:.4} – {hi:.4}"))
                    .unwrap_or_else(|| "–".to_string());

                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(RichText::new(filename).color(color));
                    });
                    row.col(|ui| {
                        ui.label(batch.wavelengths[i].len().to_string());
                    });
                    row.col(|ui| {
                        ui.label(range);
                    });
                });
            }
            for (filename, reason) in &state.failures {
                body.row(18.0, |mut row| {
                    row.col(|ui| {
                        ui.label(RichText::new(filename).color(Color32::RED));
                    });
                    row.col(|ui| {
                        ui.label("–");
                    });
                    row.col(|ui| {
                        ui.label(RichText::new(reason).color(Color32::RED));
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

pub fn open_library_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open spectral library directory")
        .pick_folder();

    if let Some(root) = folder {
        state.open_root(&root);
    }
}
