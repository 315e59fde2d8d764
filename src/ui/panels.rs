use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use phonolab::dtw::{DtwFlag, SpeakerSet};

use crate::state::{AppState, Screen};

// ---------------------------------------------------------------------------
// Parameter form (main screen)
// ---------------------------------------------------------------------------

/// Render the parameter form: one text field per numeric parameter,
/// mode flags, and the executable location.
pub fn parameter_form(ui: &mut Ui, state: &mut AppState) {
    ui.heading("DTW parameters");
    ui.label("Empty fields keep the value shown in grey.");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            egui::Grid::new("dtw_parameters")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui: &mut Ui| {
                    for name in AppState::editable_parameters() {
                        let current = state.params.get(name).map(|v| v.to_string()).unwrap_or_default();
                        let text = state.edits.entry(name).or_default();
                        ui.label(name);
                        ui.add(
                            egui::TextEdit::singleline(text)
                                .hint_text(current)
                                .desired_width(120.0),
                        );
                        ui.end_row();
                    }
                });

            ui.add_space(8.0);
            ui.strong("Modes");
            ui.horizontal_wrapped(|ui: &mut Ui| {
                for flag in DtwFlag::ALL {
                    let mut on = state.params.has_flag(flag);
                    if ui.checkbox(&mut on, flag.as_arg()).changed() {
                        state.params.set_flag(flag, on);
                    }
                }
            });

            egui::ComboBox::from_label("Speakers")
                .selected_text(state.params.speakers.label())
                .show_ui(ui, |ui: &mut Ui| {
                    for set in SpeakerSet::ALL {
                        ui.selectable_value(&mut state.params.speakers, set, set.label());
                    }
                });

            ui.add_space(8.0);
            ui.strong("Executable");
            ui.horizontal(|ui: &mut Ui| {
                ui.label(state.command.program.display().to_string());
                if ui.small_button("Browse…").clicked() {
                    if let Some(path) = rfd::FileDialog::new()
                        .set_title("DTW executable")
                        .pick_file()
                    {
                        state.command.program = path;
                    }
                }
            });
            ui.horizontal(|ui: &mut Ui| {
                let dir = state
                    .command
                    .working_dir
                    .as_ref()
                    .map(|d| d.display().to_string())
                    .unwrap_or_else(|| "(current directory)".into());
                ui.label(format!("Working directory: {dir}"));
                if ui.small_button("Browse…").clicked() {
                    if let Some(dir) = rfd::FileDialog::new()
                        .set_title("DTW working directory")
                        .pick_folder()
                    {
                        state.command.working_dir = Some(dir);
                    }
                }
            });
            ui.checkbox(&mut state.command.line_buffered, "Unbuffered output (stdbuf -o0)");

            ui.add_space(12.0);
            ui.horizontal(|ui: &mut Ui| {
                if ui.button("Reset").clicked() {
                    state.reset_edits();
                }
                if ui.button("Run ▸").clicked() {
                    state.go_to_output();
                }
            });
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Load preset…").clicked() {
                if let Some(path) = preset_dialog().pick_file() {
                    state.load_preset(&path);
                }
                ui.close_menu();
            }
            if ui.button("Save preset…").clicked() {
                if let Some(path) = preset_dialog().save_file() {
                    state.save_preset(&path);
                }
                ui.close_menu();
            }
        });

        ui.separator();

        let parameters = state.screen == Screen::Parameters;
        if ui.selectable_label(parameters, "Parameters").clicked() {
            state.screen = Screen::Parameters;
        }
        if ui.selectable_label(!parameters, "Output").clicked() && parameters {
            state.go_to_output();
        }

        ui.separator();

        if let Some(msg) = &state.status_message {
            if state.is_running() {
                ui.label(RichText::new(msg).color(Color32::LIGHT_GREEN));
            } else {
                ui.label(msg);
            }
        }
    });
}

fn preset_dialog() -> rfd::FileDialog {
    rfd::FileDialog::new()
        .set_title("DTW parameter preset")
        .add_filter("JSON", &["json"])
}
