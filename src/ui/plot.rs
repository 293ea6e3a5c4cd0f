use eframe::egui::{Color32, Ui};
use egui_plot::{Line, Plot, PlotPoints};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Spectral plot (central panel)
// ---------------------------------------------------------------------------

fn minmax_scale(values: &[f64]) -> Vec<f64> {
    let min = values.iter().cloned().filter(|v| v.is_finite()).fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().filter(|v| v.is_finite()).fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    if !range.is_finite() || range.abs() < f64::EPSILON {
        vec![0.0; values.len()]
    } else {
        values.iter().map(|&v| (v - min) / range).collect()
    }
}

fn points(x: &[f64], y: &[f64]) -> PlotPoints<'static> {
    x.iter()
        .zip(y.iter())
        .filter(|(xi, yi)| xi.is_finite() && yi.is_finite())
        .map(|(&xi, &yi)| [xi, yi])
        .collect()
}

/// Render the spectral plot in the central panel.
pub fn spectral_plot(ui: &mut Ui, state: &AppState) {
    let batch = match &state.batch {
        Some(b) => b,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a library and pick a spectral type  (File → Open library…)");
            });
            return;
        }
    };

    // On the common grid every member is drawn from its resampled copy.
    let (drawn, mean) = match &state.shared {
        Some(shared) => (&shared.batch, Some(&shared.mean_flux)),
        None => (batch, None),
    };

    Plot::new("spectral_plot")
        .legend(egui_plot::Legend::default())
        .x_axis_label("Wavelength (µm)")
        .y_axis_label("Flux")
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for i in 0..drawn.len() {
                let name = &drawn.filenames[i];
                let color = state
                    .color_map
                    .as_ref()
                    .map(|cm| cm.color_for(name))
                    .unwrap_or(Color32::LIGHT_BLUE);

                let flux = if state.minmax_scaling {
                    minmax_scale(&drawn.fluxes[i])
                } else {
                    drawn.fluxes[i].clone()
                };

                let line = Line::new(points(&drawn.wavelengths[i], &flux))
                    .name(name)
                    .color(color)
                    .width(1.5);

                plot_ui.line(line);
            }

            if let (Some(mean), Some(grid)) = (mean, drawn.wavelengths.first()) {
                let flux = if state.minmax_scaling {
                    minmax_scale(mean)
                } else {
                    mean.clone()
                };
                let line = Line::new(points(grid, &flux))
                    .name(format!("{} mean", drawn.spectral_type))
                    .color(Color32::WHITE)
                    .width(3.0);
                plot_ui.line(line);
            }
        });
}
