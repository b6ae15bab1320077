use std::path::Path;
use std::sync::Arc;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use crate::data::category::{Season, Weather};
use crate::data::loader::{DatasetCache, Sources};
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.dataset.is_none() {
        ui.label("No dataset loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            // ---- Date range ----
            ui.strong("Date range");
            if let Some((first, last)) = state.date_bounds() {
                ui.small(format!("Data covers {first} to {last}"));
            }

            let mut start = state.start;
            let mut end = state.end;
            egui::Grid::new("date_range").num_columns(2).show(ui, |ui: &mut Ui| {
                ui.label("Start");
                ui.add(DatePickerButton::new(&mut start).id_salt("start_date"));
                ui.end_row();
                ui.label("End");
                ui.add(DatePickerButton::new(&mut end).id_salt("end_date"));
                ui.end_row();
            });
            if start != state.start {
                state.set_start(start);
            }
            if end != state.end {
                state.set_end(end);
            }
            if state.start > state.end {
                ui.label(RichText::new("Start date is after end date").color(Color32::YELLOW));
            }
            ui.separator();

            // ---- Seasons ----
            let header = format!("Seasons  ({}/{})", state.seasons.len(), Season::ALL.len());
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("seasons")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_seasons();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_no_seasons();
                        }
                    });
                    for season in Season::ALL {
                        let mut checked = state.seasons.contains(&season);
                        let text = RichText::new(season.name())
                            .color(state.season_colors.color_for(season.name()));
                        if ui.checkbox(&mut checked, text).changed() {
                            state.toggle_season(season);
                        }
                    }
                });

            // ---- Weather ----
            let header = format!("Weather  ({}/{})", state.weathers.len(), Weather::ALL.len());
            egui::CollapsingHeader::new(RichText::new(header).strong())
                .id_salt("weathers")
                .default_open(true)
                .show(ui, |ui: &mut Ui| {
                    ui.horizontal(|ui: &mut Ui| {
                        if ui.small_button("All").clicked() {
                            state.select_all_weathers();
                        }
                        if ui.small_button("None").clicked() {
                            state.select_no_weathers();
                        }
                    });
                    for weather in Weather::ALL {
                        let mut checked = state.weathers.contains(&weather);
                        let text = RichText::new(weather.name())
                            .color(state.weather_colors.color_for(weather.name()));
                        if ui.checkbox(&mut checked, text).changed() {
                            state.toggle_weather(weather);
                        }
                    }
                });

            ui.separator();
            if ui.button("Reset filters").clicked() {
                state.reset_filters();
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open data folder…").clicked() {
                open_folder_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(ds) = &state.dataset {
            let (days, hours) = state
                .view
                .as_ref()
                .map_or((0, 0), |v| (v.daily_rows, v.hourly_rows));
            ui.label(format!(
                "{} days / {} hours loaded, {days} / {hours} matching",
                ds.daily.len(),
                ds.hourly.len(),
            ));
        }

        if let Some(msg) = state.status_message.clone() {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
            if ui.button("Retry").clicked() {
                state.load();
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Folder dialog
// ---------------------------------------------------------------------------

/// Switch to `day.csv` / `hour.csv` from a folder picked by the user.
pub fn open_folder_dialog(state: &mut AppState) {
    let folder = rfd::FileDialog::new()
        .set_title("Open folder containing day.csv and hour.csv")
        .pick_folder();

    if let Some(dir) = folder {
        open_folder(state, &dir);
    }
}

fn open_folder(state: &mut AppState, dir: &Path) {
    log::info!("Switching data source to {}", dir.display());
    state.cache = Arc::new(DatasetCache::new(Sources::from_dir(dir)));
    state.load();
}
