use eframe::egui::{self, Color32, RichText, ScrollArea, TextureHandle, Ui};
use egui_extras::{Column, TableBuilder};

use phonolab::color::HeatScale;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Output screen (central panel)
// ---------------------------------------------------------------------------

/// Start/Stop control and the streamed process output.
pub fn output_log(ui: &mut Ui, state: &mut AppState) {
    ui.horizontal(|ui: &mut Ui| {
        let label = if state.is_running() { "Stop" } else { "Start" };
        if ui.button(label).clicked() {
            state.toggle_run();
        }
        ui.label(format!("{} lines", state.output.len()));
    });
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .stick_to_bottom(true)
        .show(ui, |ui: &mut Ui| {
            for line in &state.output {
                ui.monospace(line);
            }
        });
}

// ---------------------------------------------------------------------------
// Confusion matrix (right side panel)
// ---------------------------------------------------------------------------

/// Heatmap of the last run plus per-phoneme accuracy.
pub fn matrix_panel(ui: &mut Ui, state: &AppState, texture: Option<&TextureHandle>) {
    let Some(matrix) = &state.matrix else {
        return;
    };

    ui.heading("Confusion matrix");
    if let Some(overall) = matrix.overall_accuracy() {
        ui.label(format!("Overall accuracy: {:.2}%", overall * 100.0));
    }
    if let Some(texture) = texture {
        ui.add(
            egui::Image::new(texture)
                .max_width(ui.available_width())
                .max_height(ui.available_width()),
        );
    }
    ui.separator();

    let scale = HeatScale::new(0.0, 1.0);
    let accuracy = matrix.row_accuracy();
    TableBuilder::new(ui)
        .striped(true)
        .column(Column::auto())
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui: &mut Ui| {
                ui.strong("Phoneme");
            });
            header.col(|ui: &mut Ui| {
                ui.strong("Correct");
            });
        })
        .body(|mut body| {
            for (label, acc) in matrix.labels.iter().zip(accuracy) {
                body.row(18.0, |mut row| {
                    row.col(|ui: &mut Ui| {
                        ui.label(label);
                    });
                    row.col(|ui: &mut Ui| match acc {
                        Some(acc) => {
                            let [r, g, b] = scale.color_for(acc);
                            ui.label(
                                RichText::new(format!("{:.2}%", acc * 100.0))
                                    .background_color(Color32::from_rgb(r, g, b))
                                    .color(if acc > 0.5 { Color32::BLACK } else { Color32::WHITE }),
                            );
                        }
                        None => {
                            ui.label("–");
                        }
                    });
                });
            }
        });
}
