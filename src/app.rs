use std::path::Path;
use std::time::Duration;

use eframe::egui;

use crate::state::{AppState, Screen};
use crate::ui::{output, panels};

/// Repaint cadence while a run streams output.
const POLL_REPAINT: Duration = Duration::from_millis(50);

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct PhonolabApp {
    pub state: AppState,
    /// Heatmap texture and the `matrix_version` it was loaded from.
    matrix_texture: Option<(u64, egui::TextureHandle)>,
}

impl PhonolabApp {
    /// Upload the rendered heatmap once per new matrix.
    fn refresh_texture(&mut self, ctx: &egui::Context) {
        let Some(path) = &self.state.matrix_image else {
            self.matrix_texture = None;
            return;
        };
        let version = self.state.matrix_version;
        if self.matrix_texture.as_ref().is_some_and(|(v, _)| *v == version) {
            return;
        }
        match load_color_image(path) {
            Ok(image) => {
                let texture = ctx.load_texture("confusion_matrix", image, egui::TextureOptions::NEAREST);
                self.matrix_texture = Some((version, texture));
            }
            Err(e) => {
                log::error!("loading {}: {e:#}", path.display());
                self.state.status_message = Some(format!("Cannot show matrix: {e:#}"));
                self.state.matrix_image = None;
            }
        }
    }
}

impl eframe::App for PhonolabApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.poll();
        if self.state.is_running() {
            ctx.request_repaint_after(POLL_REPAINT);
        }
        self.refresh_texture(ctx);

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Right side panel: confusion matrix of the last run ----
        if self.state.screen == Screen::Output && self.state.matrix.is_some() {
            egui::SidePanel::right("matrix_panel")
                .default_width(320.0)
                .resizable(true)
                .show(ctx, |ui| {
                    let texture = self.matrix_texture.as_ref().map(|(_, t)| t);
                    output::matrix_panel(ui, &self.state, texture);
                });
        }

        // ---- Central panel: parameter form or process output ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.screen {
            Screen::Parameters => panels::parameter_form(ui, &mut self.state),
            Screen::Output => output::output_log(ui, &mut self.state),
        });
    }
}

fn load_color_image(path: &Path) -> anyhow::Result<egui::ColorImage> {
    let image = image::open(path)?;
    let size = [image.width() as usize, image.height() as usize];
    let rgba = image.to_rgba8();
    Ok(egui::ColorImage::from_rgba_unmultiplied(
        size,
        rgba.as_flat_samples().as_slice(),
    ))
}
