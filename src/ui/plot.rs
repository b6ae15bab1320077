use std::ops::RangeInclusive;

use eframe::egui::{self, Align2, Color32, FontId, RichText, ScrollArea, Sense, Ui};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoints};

use crate::color::{heat_color, ColorMap, MISSING_COLOR};
use crate::data::aggregate::{GroupedTable, Matrix};
use crate::data::category;
use crate::data::dashboard::{DashboardView, Summary};
use crate::data::model::{Key, Measure};
use crate::state::AppState;

const CHART_HEIGHT: f32 = 220.0;
const CASUAL_COLOR: Color32 = Color32::from_rgb(0x4e, 0x78, 0xa8);
const REGISTERED_COLOR: Color32 = Color32::from_rgb(0xf2, 0x8e, 0x2b);
const TOTAL_COLOR: Color32 = Color32::from_rgb(0x59, 0xa1, 0x4f);

const USER_SERIES: [(Measure, &str, Color32); 2] = [
    (Measure::Casual, "Casual", CASUAL_COLOR),
    (Measure::Registered, "Registered", REGISTERED_COLOR),
];
const TOTAL_SERIES: [(Measure, &str, Color32); 1] = [(Measure::Total, "Rentals", TOTAL_COLOR)];

// ---------------------------------------------------------------------------
// Dashboard (central panel)
// ---------------------------------------------------------------------------

/// Render every chart of the current view in the central panel.
pub fn dashboard(ui: &mut Ui, state: &AppState) {
    let Some(view) = &state.view else {
        ui.centered_and_justified(|ui: &mut Ui| {
            if state.status_message.is_some() {
                ui.heading("No data: loading failed (see the message above)");
            } else {
                ui.heading("Open a data folder to view rentals  (File → Open data folder…)");
            }
        });
        return;
    };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Bike Sharing Analysis");
            summary_row(ui, &view.summary);
            ui.separator();

            ui.heading("Season and weather");
            ui.columns(2, |cols| {
                section(&mut cols[0], "Average daily rentals by season", |ui| {
                    bar_chart(ui, "by_season", &view.by_season, &TOTAL_SERIES)
                });
                section(&mut cols[1], "Average daily rentals by weather", |ui| {
                    bar_chart(ui, "by_weather", &view.by_weather, &TOTAL_SERIES)
                });
            });
            section(ui, "Season × weather", |ui| {
                hue_bar_chart(ui, "season_weather", &view.season_weather, &state.weather_colors)
            });
            section(ui, "Monthly trend by season", |ui| {
                month_lines(ui, "monthly_season", &view.monthly_by_season, &state.season_colors)
            });
            section(ui, "Monthly trend by weather", |ui| {
                month_lines(ui, "monthly_weather", &view.monthly_by_weather, &state.weather_colors)
            });
            ui.separator();

            ui.heading("Time of day");
            section(ui, "Average rentals per hour", |ui| {
                hour_lines(ui, "hourly", &view.hourly, &TOTAL_SERIES)
            });
            section(ui, "Average rentals by hour and weekday", |ui| {
                heatmap(ui, &view.hour_weekday)
            });
            ui.separator();

            ui.heading("Casual vs registered users");
            user_share(ui, view);
            ui.columns(2, |cols| {
                section(&mut cols[0], "By season", |ui| {
                    bar_chart(ui, "season_users", &view.season_users, &USER_SERIES)
                });
                section(&mut cols[1], "By weekday", |ui| {
                    bar_chart(ui, "weekday_users", &view.weekday_users, &USER_SERIES)
                });
            });
            section(ui, "By hour", |ui| {
                hour_lines(ui, "hourly_users", &view.hourly_users, &USER_SERIES)
            });
            ui.columns(2, |cols| {
                section(&mut cols[0], "Working day vs holiday/weekend", |ui| {
                    bar_chart(ui, "workingday_users", &view.workingday_users, &USER_SERIES)
                });
                section(&mut cols[1], "By weather", |ui| {
                    bar_chart(ui, "weather_users", &view.weather_users, &USER_SERIES)
                });
            });
        });
}

fn section(ui: &mut Ui, title: &str, body: impl FnOnce(&mut Ui)) {
    ui.add_space(6.0);
    ui.strong(title);
    body(ui);
}

fn empty_note(ui: &mut Ui) {
    ui.label(RichText::new("No records match the current filters.").italics());
}

fn fmt_metric(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "–".to_string(), |v| format!("{v:.decimals$}"))
}

fn summary_row(ui: &mut Ui, summary: &Summary) {
    ui.columns(4, |cols| {
        let metrics = [
            ("Total rentals", fmt_metric(summary.total_rentals, 0)),
            ("Daily average", fmt_metric(summary.mean_daily_rentals, 1)),
            ("Casual users", fmt_metric(summary.casual_rentals, 0)),
            ("Registered users", fmt_metric(summary.registered_rentals, 0)),
        ];
        for (col, (label, value)) in cols.iter_mut().zip(metrics) {
            col.vertical(|ui: &mut Ui| {
                ui.label(label);
                ui.heading(value);
            });
        }
    });
}

fn user_share(ui: &mut Ui, view: &DashboardView) {
    match view.user_share() {
        Some((casual, registered)) => {
            ui.horizontal(|ui: &mut Ui| {
                ui.label(RichText::new(format!("Casual {casual:.1}%")).color(CASUAL_COLOR));
                ui.label("·");
                ui.label(
                    RichText::new(format!("Registered {registered:.1}%")).color(REGISTERED_COLOR),
                );
            });
        }
        None => empty_note(ui),
    }
}

// ---------------------------------------------------------------------------
// Chart helpers
// ---------------------------------------------------------------------------

/// Labels of the key at `idx` for every row.
fn key_labels(table: &GroupedTable, idx: usize) -> Vec<String> {
    table
        .rows
        .iter()
        .map(|r| match r.keys.get(idx) {
            Some(Key::Bool(true)) => "Working day".to_string(),
            Some(Key::Bool(false)) => "Holiday / weekend".to_string(),
            Some(k) => k.to_string(),
            None => String::new(),
        })
        .collect()
}

/// Axis formatter printing `labels[i]` at integer positions only.
fn category_axis(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let pos = mark.value.round();
        if (mark.value - pos).abs() > 1e-6 || pos < 0.0 {
            return String::new();
        }
        labels.get(pos as usize).cloned().unwrap_or_default()
    }
}

fn base_plot(id: &str) -> Plot<'static> {
    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .allow_scroll(false)
        .allow_drag(false)
        .allow_zoom(false)
        .include_y(0.0)
}

/// One bar per row (first key on the x axis), side by side per measure.
fn bar_chart(ui: &mut Ui, id: &str, table: &GroupedTable, series: &[(Measure, &str, Color32)]) {
    if table.is_empty() {
        empty_note(ui);
        return;
    }
    let width = 0.8 / series.len() as f64;
    let labels = key_labels(table, 0);

    base_plot(id)
        .x_axis_formatter(category_axis(labels.clone()))
        .show(ui, |plot_ui| {
            for (s, &(measure, name, color)) in series.iter().enumerate() {
                let offset = (s as f64 - (series.len() as f64 - 1.0) / 2.0) * width;
                let bars: Vec<Bar> = table
                    .rows
                    .iter()
                    .enumerate()
                    .filter_map(|(i, row)| {
                        let v = table.value(row, measure)?;
                        Some(Bar::new(i as f64 + offset, v).width(width).name(&labels[i]))
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).name(name).color(color));
            }
        });
}

/// Bars grouped by the first key, one colour per second-key category.
fn hue_bar_chart(ui: &mut Ui, id: &str, table: &GroupedTable, colors: &ColorMap) {
    if table.is_empty() {
        empty_note(ui);
        return;
    }
    let mut groups: Vec<String> = Vec::new();
    for label in key_labels(table, 0) {
        if !groups.contains(&label) {
            groups.push(label);
        }
    }
    let mut hues: Vec<String> = key_labels(table, 1);
    hues.sort();
    hues.dedup();

    let width = 0.8 / hues.len() as f64;
    let group_of = key_labels(table, 0);
    let hue_of = key_labels(table, 1);

    base_plot(id)
        .x_axis_formatter(category_axis(groups.clone()))
        .show(ui, |plot_ui| {
            for (h, hue) in hues.iter().enumerate() {
                let offset = (h as f64 - (hues.len() as f64 - 1.0) / 2.0) * width;
                let bars: Vec<Bar> = table
                    .rows
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| &hue_of[*i] == hue)
                    .filter_map(|(i, row)| {
                        let g = groups.iter().position(|x| *x == group_of[i])?;
                        let v = table.value(row, Measure::Total)?;
                        Some(Bar::new(g as f64 + offset, v).width(width))
                    })
                    .collect();
                plot_ui.bar_chart(
                    BarChart::new(bars)
                        .name(hue)
                        .color(colors.color_for(hue)),
                );
            }
        });
}

/// One line per category (third key) over month number (first key).
fn month_lines(ui: &mut Ui, id: &str, table: &GroupedTable, colors: &ColorMap) {
    if table.is_empty() {
        empty_note(ui);
        return;
    }
    let mut hues = key_labels(table, 2);
    hues.sort();
    hues.dedup();
    let hue_of = key_labels(table, 2);
    let month_axis: Vec<String> = std::iter::once(String::new())
        .chain((1..=12).map(|m| category::month_abbrev(m).unwrap_or_default().to_string()))
        .collect();

    base_plot(id)
        .x_axis_formatter(category_axis(month_axis))
        .include_x(1.0)
        .include_x(12.0)
        .show(ui, |plot_ui| {
            for hue in &hues {
                let points: PlotPoints = table
                    .rows
                    .iter()
                    .enumerate()
                    .filter(|(i, _)| &hue_of[*i] == hue)
                    .filter_map(|(_, row)| {
                        let month = row.keys.first()?.as_i64()? as f64;
                        Some([month, table.value(row, Measure::Total)?])
                    })
                    .collect();
                plot_ui.line(
                    Line::new(points)
                        .name(hue)
                        .color(colors.color_for(hue))
                        .width(2.0),
                );
            }
        });
}

/// Lines over the hour of day (first key), one per measure.
fn hour_lines(ui: &mut Ui, id: &str, table: &GroupedTable, series: &[(Measure, &str, Color32)]) {
    if table.is_empty() {
        empty_note(ui);
        return;
    }
    base_plot(id)
        .x_axis_label("Hour")
        .include_x(0.0)
        .include_x(23.0)
        .show(ui, |plot_ui| {
            for &(measure, name, color) in series {
                let points: PlotPoints = table
                    .rows
                    .iter()
                    .filter_map(|row| {
                        let hour = row.keys.first()?.as_i64()? as f64;
                        Some([hour, table.value(row, measure)?])
                    })
                    .collect();
                plot_ui.line(Line::new(points).name(name).color(color).width(2.0));
            }
        });
}

// ---------------------------------------------------------------------------
// Hour × weekday heatmap
// ---------------------------------------------------------------------------

/// Grid of coloured cells. Missing combinations are drawn grey with no value.
fn heatmap(ui: &mut Ui, matrix: &Matrix) {
    if matrix.is_empty() {
        empty_note(ui);
        return;
    }
    let (lo, hi) = matrix.value_range().unwrap_or((0.0, 0.0));
    let span = (hi - lo).max(f64::EPSILON);
    let cell = egui::vec2(52.0, 16.0);

    egui::Grid::new("hour_weekday_heatmap")
        .spacing([2.0, 2.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("hr");
            for col in &matrix.cols {
                let name = col
                    .as_i64()
                    .and_then(|c| u8::try_from(c).ok())
                    .and_then(category::weekday_name)
                    .map_or_else(|| col.to_string(), |n| n[..3].to_string());
                ui.label(name);
            }
            ui.end_row();

            for (r, row_key) in matrix.rows.iter().enumerate() {
                ui.label(row_key.to_string());
                for c in 0..matrix.cols.len() {
                    let (rect, response) = ui.allocate_exact_size(cell, Sense::hover());
                    match matrix.cell(r, c) {
                        Some(v) => {
                            ui.painter().rect_filled(rect, 2.0, heat_color((v - lo) / span));
                            ui.painter().text(
                                rect.center(),
                                Align2::CENTER_CENTER,
                                format!("{v:.0}"),
                                FontId::monospace(10.0),
                                Color32::BLACK,
                            );
                        }
                        None => {
                            ui.painter().rect_filled(rect, 2.0, MISSING_COLOR);
                            response.on_hover_text("No records");
                        }
                    }
                }
                ui.end_row();
            }
        });
}
