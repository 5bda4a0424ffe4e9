use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use ev_dashboard::data::filter::FilterParams;
use ev_dashboard::data::model::VehicleTable;

use crate::state::{AppState, Page, SetFilter};

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.base.is_empty() {
        ui.label("No dataset loaded.");
        return;
    }

    // Clone what we need so we can mutate state inside the closures.
    let base = state.base.clone();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            set_filter(ui, state, SetFilter::Makes, "Make", &base.makes);
            set_filter(ui, state, SetFilter::VehicleTypes, "Vehicle type", &base.vehicle_types);
            if base.columns.county {
                set_filter(ui, state, SetFilter::Counties, "County", &base.counties);
            }
            ui.separator();

            let mut next = state.params.clone();
            range_filters(ui, &mut next, &base);

            if base.columns.cafv {
                ui.checkbox(&mut next.cafv_only, "CAFV eligible only");
            }
            ui.separator();

            if ui.button("Reset all filters").clicked() {
                next = FilterParams::default();
            }
            state.apply(next);
        });
}

/// Collapsible checklist for one set filter. No ticks means no restriction.
fn set_filter(
    ui: &mut Ui,
    state: &mut AppState,
    which: SetFilter,
    title: &str,
    all_values: &BTreeSet<String>,
) {
    let selected = which.selected(&state.params).clone();
    let summary = if selected.is_empty() {
        "all".to_string()
    } else {
        format!("{}/{}", selected.len(), all_values.len())
    };

    egui::CollapsingHeader::new(RichText::new(format!("{title}  ({summary})")).strong())
        .id_salt(title)
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            if ui
                .add_enabled(!selected.is_empty(), egui::Button::new("Clear").small())
                .clicked()
            {
                state.clear(which);
            }

            ScrollArea::vertical()
                .id_salt(format!("{title}_values"))
                .max_height(220.0)
                .show(ui, |ui: &mut Ui| {
                    for val in all_values {
                        let mut checked = selected.contains(val);
                        let mut text = RichText::new(val);
                        if which == SetFilter::VehicleTypes {
                            text = text.color(state.type_colors.color_for(val));
                        }
                        if ui.checkbox(&mut checked, text).changed() {
                            state.toggle(which, val);
                        }
                    }
                });
        });
}

/// Year, range and price sliders. A range left at the data bounds is unset.
fn range_filters(ui: &mut Ui, next: &mut FilterParams, base: &VehicleTable) {
    if let Some(bounds) = &base.year_bounds {
        let (mut lo, mut hi) = next
            .years
            .as_ref()
            .map(|r| (*r.start(), *r.end()))
            .unwrap_or((*bounds.start(), *bounds.end()));
        ui.strong("Model year");
        ui.add(egui::Slider::new(&mut lo, bounds.clone()).text("from"));
        ui.add(egui::Slider::new(&mut hi, bounds.clone()).text("to"));
        next.years = (lo != *bounds.start() || hi != *bounds.end()).then(|| lo..=hi);
    }

    if let Some(bounds) = &base.range_bounds {
        ui.strong("Electric range (miles)");
        next.electric_range = float_range(ui, next.electric_range.clone(), bounds);
    }

    if base.columns.msrp {
        if let Some(bounds) = &base.price_bounds {
            ui.strong("Base MSRP ($)");
            next.price = float_range(ui, next.price.clone(), bounds);
        }
    }
}

fn float_range(
    ui: &mut Ui,
    current: Option<RangeInclusive<f64>>,
    bounds: &RangeInclusive<f64>,
) -> Option<RangeInclusive<f64>> {
    let (mut lo, mut hi) = current
        .map(|r| (*r.start(), *r.end()))
        .unwrap_or((*bounds.start(), *bounds.end()));
    ui.add(egui::Slider::new(&mut lo, bounds.clone()).text("min"));
    ui.add(egui::Slider::new(&mut hi, bounds.clone()).text("max"));
    (lo != *bounds.start() || hi != *bounds.end()).then(|| lo..=hi)
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            if ui.button("Reload").clicked() {
                state.refresh();
                ui.close_menu();
            }
        });

        ui.separator();

        for page in Page::ALL {
            ui.selectable_value(&mut state.page, page, page.title());
        }

        ui.separator();

        ui.label(format!(
            "{} vehicles loaded, {} match",
            state.base.len(),
            state.filtered.len()
        ));

        let mut use_sample = state.use_sample;
        let label = format!("Sample ({} points)", state.config.sample_cap);
        if ui.checkbox(&mut use_sample, label).changed() {
            state.set_sampling(use_sample);
        }
        if state.is_sampled() {
            ui.label(format!("showing {}", state.display.len()));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open vehicle data")
        .add_filter("Supported files", &["csv", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        log::info!("Opening {}", path.display());
        state.open(&path);
    }
}
