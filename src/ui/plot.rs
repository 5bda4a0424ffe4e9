use eframe::egui::{self, Color32, RichText, Sense, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, BoxElem, BoxPlot, BoxSpread, Legend, Line, Plot, PlotPoints, Points};
use ev_dashboard::data::charts::{
    count_by, histogram, make_year_heatmap, price_category_share, range_boxplots,
    range_category_share, top_n, yearly_mean, Category, Measure,
};

use crate::color::{generate_palette, viridis};
use crate::state::{AppState, Page};

const CHART_HEIGHT: f32 = 280.0;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render the selected page in the central panel.
pub fn central_panel(ui: &mut Ui, state: &AppState) {
    if state.base.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No vehicle data  (File → Open…)");
        });
        return;
    }
    if state.filtered.is_empty() {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No vehicles match the current filters.");
        });
        return;
    }

    egui::ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| match state.page {
            Page::Overview => overview_page(ui, state),
            Page::Range => range_page(ui, state),
            Page::Manufacturers => manufacturers_page(ui, state),
            Page::Data => data_page(ui, state),
        });
}

// ---------------------------------------------------------------------------
// Overview
// ---------------------------------------------------------------------------

fn fmt_pct(v: Option<f64>) -> String {
    v.map(|v| format!("{v:+.1}%")).unwrap_or_else(|| "n/a".into())
}

fn metric(ui: &mut Ui, label: &str, value: String) {
    ui.vertical(|ui: &mut Ui| {
        ui.label(RichText::new(label).small());
        ui.label(RichText::new(value).heading().strong());
    });
}

fn overview_page(ui: &mut Ui, state: &AppState) {
    let m = &state.metrics;

    ui.heading("Summary");
    ui.horizontal_wrapped(|ui: &mut Ui| {
        metric(ui, "Vehicles", m.total_vehicles.to_string());
        metric(ui, "Makes", m.distinct_makes.to_string());
        if let Some(models) = m.distinct_models {
            metric(ui, "Models", models.to_string());
        }
        metric(
            ui,
            "Mean range",
            m.mean_range
                .map(|v| format!("{v:.0} mi"))
                .unwrap_or_else(|| "n/a".into()),
        );
        if let Some(price) = m.mean_msrp {
            metric(ui, "Mean MSRP", format!("${price:.0}"));
        }
        if let Some(n) = m.cafv_eligible {
            metric(ui, "CAFV eligible", n.to_string());
        }
    });
    ui.add_space(6.0);
    ui.horizontal_wrapped(|ui: &mut Ui| {
        metric(ui, "YoY growth", fmt_pct(m.growth_rate));
        metric(ui, "Range trend", fmt_pct(m.range_trend));
        if state.filtered.columns.msrp {
            metric(ui, "Price trend", fmt_pct(m.price_trend));
        }
        metric(ui, "Range improvement", fmt_pct(m.range_improvement));
        metric(
            ui,
            "Market concentration (HHI)",
            m.market_concentration
                .map(|v| format!("{v:.1}"))
                .unwrap_or_else(|| "n/a".into()),
        );
        metric(
            ui,
            "Fastest growing make",
            m.fastest_growing_make
                .as_ref()
                .map(|g| format!("{} ({:+.0}%)", g.make, g.growth_pct))
                .unwrap_or_else(|| "none found".into()),
        );
    });
    ui.separator();

    ui.strong("Vehicles by type");
    let type_counts = count_by(&state.filtered, Category::VehicleType);
    Plot::new("type_counts")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .y_axis_label("Number of vehicles")
        .show(ui, |plot_ui| {
            for (i, (label, n)) in type_counts.iter().enumerate() {
                let color = state.type_colors.color_for(label);
                let bar = Bar::new(i as f64, *n as f64).name(label).fill(color);
                plot_ui.bar_chart(BarChart::new(vec![bar]).name(label).color(color));
            }
        });

    ui.columns(2, |cols| {
        if state.filtered.columns.msrp {
            cols[0].strong("Price tiers");
            let shares: Vec<(String, usize)> = price_category_share(&state.filtered)
                .into_iter()
                .map(|(c, n)| (c.to_string(), n))
                .collect();
            share_chart(&mut cols[0], "price_share", &shares);
        }
        cols[1].strong("Range tiers");
        let shares: Vec<(String, usize)> = range_category_share(&state.filtered)
            .into_iter()
            .map(|(c, n)| (c.to_string(), n))
            .collect();
        share_chart(&mut cols[1], "range_share", &shares);
    });
}

/// Bar chart of category shares in percent.
fn share_chart(ui: &mut Ui, id: &str, shares: &[(String, usize)]) {
    let total: usize = shares.iter().map(|(_, n)| n).sum();
    let palette = generate_palette(shares.len());
    Plot::new(id)
        .legend(Legend::default())
        .height(CHART_HEIGHT * 0.8)
        .y_axis_label("% of vehicles")
        .show(ui, |plot_ui| {
            for (i, ((label, n), color)) in shares.iter().zip(&palette).enumerate() {
                let pct = if total == 0 { 0.0 } else { *n as f64 / total as f64 * 100.0 };
                let bar = Bar::new(i as f64, pct).name(label).fill(*color);
                plot_ui.bar_chart(BarChart::new(vec![bar]).name(label).color(*color));
            }
        });
}

// ---------------------------------------------------------------------------
// Range
// ---------------------------------------------------------------------------

fn range_page(ui: &mut Ui, state: &AppState) {
    let title = if state.is_sampled() {
        format!(
            "Electric range vs. model year  (random sample of {} of {})",
            state.display.len(),
            state.filtered.len()
        )
    } else {
        "Electric range vs. model year".to_string()
    };
    ui.strong(title);

    Plot::new("range_scatter")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label("Model year")
        .y_axis_label("Electric range (miles)")
        .show(ui, |plot_ui| {
            for vehicle_type in &state.display.vehicle_types {
                let points: PlotPoints = state
                    .display
                    .records
                    .iter()
                    .filter(|r| &r.vehicle_type == vehicle_type)
                    .map(|r| [r.model_year as f64, r.electric_range])
                    .collect();
                plot_ui.points(
                    Points::new(points)
                        .name(vehicle_type)
                        .radius(2.5)
                        .color(state.type_colors.color_for(vehicle_type)),
                );
            }
        });

    ui.strong("Range by vehicle type (top 5)");
    let top_types = top_n(&state.filtered, Category::VehicleType, 5);
    let boxes = range_boxplots(&state.filtered, &top_types);
    Plot::new("range_boxplot")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .y_axis_label("Electric range (miles)")
        .show(ui, |plot_ui| {
            for (i, b) in boxes.iter().enumerate() {
                let color = state.type_colors.color_for(&b.label);
                let elem = BoxElem::new(i as f64, BoxSpread::new(b.min, b.q1, b.median, b.q3, b.max))
                    .name(format!("{} (n={})", b.label, b.count))
                    .fill(color.gamma_multiply(0.4))
                    .stroke(egui::Stroke::new(1.5, color));
                plot_ui.box_plot(BoxPlot::new(vec![elem]).name(&b.label).color(color));
            }
        });

    ui.columns(2, |cols| {
        cols[0].strong("Mean range by model year");
        let yearly: PlotPoints = yearly_mean(&state.filtered, Measure::ElectricRange)
            .into_iter()
            .map(|(y, v)| [y as f64, v])
            .collect();
        Plot::new("range_line")
            .height(CHART_HEIGHT * 0.8)
            .x_axis_label("Model year")
            .show(&mut cols[0], |plot_ui| {
                plot_ui.line(Line::new(yearly).name("mean range").width(2.0));
            });

        cols[1].strong("Range distribution");
        let ranges: Vec<f64> = state.filtered.records.iter().map(|r| r.electric_range).collect();
        let bars: Vec<Bar> = histogram(&ranges, 20)
            .into_iter()
            .map(|bin| {
                let width = (bin.end - bin.start).max(1.0);
                Bar::new((bin.start + bin.end) / 2.0, bin.count as f64)
                    .width(width)
                    .name(format!("{:.0}-{:.0} mi", bin.start, bin.end))
            })
            .collect();
        Plot::new("range_histogram")
            .height(CHART_HEIGHT * 0.8)
            .x_axis_label("Electric range (miles)")
            .show(&mut cols[1], |plot_ui| {
                plot_ui.bar_chart(BarChart::new(bars).color(Color32::LIGHT_BLUE));
            });
    });
}

// ---------------------------------------------------------------------------
// Manufacturers
// ---------------------------------------------------------------------------

fn manufacturers_page(ui: &mut Ui, state: &AppState) {
    ui.strong("Top 10 manufacturers");
    let top: Vec<(String, usize)> = count_by(&state.filtered, Category::Make)
        .into_iter()
        .take(10)
        .collect();
    let max = top.first().map(|(_, n)| *n).unwrap_or(0).max(1);
    Plot::new("top_makes")
        .legend(Legend::default())
        .height(CHART_HEIGHT)
        .x_axis_label("Number of vehicles")
        .show(ui, |plot_ui| {
            // Largest at the top.
            for (i, (make, n)) in top.iter().enumerate() {
                let color = viridis(*n as f64 / max as f64);
                let bar = Bar::new((top.len() - i) as f64, *n as f64).name(make).fill(color);
                plot_ui.bar_chart(BarChart::new(vec![bar]).name(make).color(color).horizontal());
            }
        });

    ui.add_space(8.0);
    ui.strong("Vehicle count by make and model year");
    let makes: Vec<String> = top.into_iter().map(|(m, _)| m).collect();
    heatmap(ui, &makes, state);
}

fn heatmap(ui: &mut Ui, makes: &[String], state: &AppState) {
    let hm = make_year_heatmap(&state.filtered, makes);
    let max = hm.max_count().max(1) as f64;
    let cell = egui::vec2(34.0, 20.0);

    egui::ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
        egui::Grid::new("make_year_heatmap")
            .spacing(egui::vec2(2.0, 2.0))
            .show(ui, |ui: &mut Ui| {
                ui.label("");
                for year in &hm.years {
                    ui.label(RichText::new(year.to_string()).small());
                }
                ui.end_row();

                for (make, row) in hm.makes.iter().zip(&hm.counts) {
                    ui.label(make);
                    for (year, &count) in hm.years.iter().zip(row) {
                        let (rect, response) = ui.allocate_exact_size(cell, Sense::hover());
                        let fill = if count == 0 {
                            Color32::from_gray(40)
                        } else {
                            viridis(count as f64 / max)
                        };
                        ui.painter().rect_filled(rect, 2.0, fill);
                        response.on_hover_text(format!("{make} {year}: {count}"));
                    }
                    ui.end_row();
                }
            });
    });
}

// ---------------------------------------------------------------------------
// Data preview
// ---------------------------------------------------------------------------

fn data_page(ui: &mut Ui, state: &AppState) {
    let rows = &state.display.records;
    ui.label(format!("{} rows shown", rows.len()));

    let headers = [
        "Model Year", "Make", "Model", "Type", "Range", "MSRP", "County", "City", "CAFV",
    ];
    let opt = |v: &Option<String>| v.clone().unwrap_or_default();

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .columns(Column::auto().at_least(60.0), headers.len())
        .header(20.0, |mut header| {
            for name in headers {
                header.col(|ui: &mut Ui| {
                    ui.strong(name);
                });
            }
        })
        .body(|body| {
            body.rows(18.0, rows.len(), |mut row| {
                let rec = &rows[row.index()];
                row.col(|ui: &mut Ui| {
                    ui.label(rec.model_year.to_string());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(&rec.make);
                });
                row.col(|ui: &mut Ui| {
                    ui.label(opt(&rec.model));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(&rec.vehicle_type);
                });
                row.col(|ui: &mut Ui| {
                    ui.label(format!("{:.0}", rec.electric_range));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(rec.base_msrp.map(|p| format!("{p:.0}")).unwrap_or_default());
                });
                row.col(|ui: &mut Ui| {
                    ui.label(opt(&rec.county));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(opt(&rec.city));
                });
                row.col(|ui: &mut Ui| {
                    ui.label(opt(&rec.cafv_eligibility));
                });
            });
        });
}
