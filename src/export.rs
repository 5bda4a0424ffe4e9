//! Standalone HTML chart pages.
//!
//! Each page embeds a Vega-Lite spec and loads the Vega runtime from a CDN, so
//! the files can be served as static templates or opened directly.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde_json::{json, Value};

use crate::data::charts::{count_by, mean_range_by, top_n, yearly_mean, Category, Measure};
use crate::data::model::VehicleTable;

pub const AVERAGE_STATS_FILE: &str = "average_stats_by_vehicle_type.html";
pub const RANGE_TRENDS_FILE: &str = "electric_range_trends.html";
pub const TOP_MANUFACTURERS_FILE: &str = "top_manufacturers.html";
pub const INDEX_FILE: &str = "index.html";

const VEGA_SCRIPTS: &str = r#"<script src="https://cdn.jsdelivr.net/npm/vega@5"></script>
    <script src="https://cdn.jsdelivr.net/npm/vega-lite@5"></script>
    <script src="https://cdn.jsdelivr.net/npm/vega-embed@6"></script>"#;

/// Shared axis / title styling.
fn chart_config() -> Value {
    json!({
        "axis": { "labelFontSize": 12, "titleFontSize": 14 },
        "title": { "fontSize": 18, "anchor": "start" }
    })
}

// ---------------------------------------------------------------------------
// Vega-Lite specs
// ---------------------------------------------------------------------------

/// Bar chart of mean electric range per vehicle type.
pub fn average_range_spec(table: &VehicleTable) -> Value {
    let values: Vec<Value> = mean_range_by(table, Category::VehicleType)
        .into_iter()
        .map(|(vehicle_type, avg)| json!({ "Electric Vehicle Type": vehicle_type, "Avg Range": avg }))
        .collect();

    json!({
        "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
        "title": "Average Electric Range by Vehicle Type",
        "width": 600,
        "height": 400,
        "data": { "values": values },
        "mark": "bar",
        "encoding": {
            "x": { "field": "Electric Vehicle Type", "type": "nominal", "title": "Vehicle Type" },
            "y": { "field": "Avg Range", "type": "quantitative", "title": "Average Electric Range (miles)" },
            "color": {
                "field": "Electric Vehicle Type",
                "type": "nominal",
                "scale": { "scheme": "tableau20" }
            },
            "tooltip": [
                { "field": "Electric Vehicle Type", "type": "nominal", "title": "Vehicle Type" },
                { "field": "Avg Range", "type": "quantitative", "format": ".2f", "title": "Average Range (miles)" }
            ]
        },
        "config": chart_config()
    })
}

/// Line chart of mean range by model year, one vehicle type at a time,
/// chosen through a dropdown over the five most common types.
pub fn range_trend_spec(table: &VehicleTable) -> Value {
    let top_types = top_n(table, Category::VehicleType, 5);

    let mut values = Vec::new();
    for vehicle_type in &top_types {
        let subset = VehicleTable::from_records(
            table
                .records
                .iter()
                .filter(|r| &r.vehicle_type == vehicle_type)
                .cloned()
                .collect(),
            table.columns,
        );
        for (year, avg) in yearly_mean(&subset, Measure::ElectricRange) {
            values.push(json!({
                "Model Year": year,
                "Electric Vehicle Type": vehicle_type,
                "Electric Range": avg
            }));
        }
    }

    let initial = top_types
        .first()
        .map(|t| json!([{ "Electric Vehicle Type": t }]))
        .unwrap_or(Value::Null);

    let mut param = json!({
        "name": "type_select",
        "select": { "type": "point", "fields": ["Electric Vehicle Type"] },
        "bind": { "input": "select", "options": top_types, "name": "Select Vehicle Type: " }
    });
    if !initial.is_null() {
        param["value"] = initial;
    }

    json!({
        "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
        "title": "Electric Range Trends by Vehicle Type",
        "width": 700,
        "height": 400,
        "data": { "values": values },
        "params": [param],
        "transform": [{ "filter": { "param": "type_select" } }],
        "mark": { "type": "line", "point": true },
        "encoding": {
            "x": { "field": "Model Year", "type": "ordinal", "sort": "ascending", "title": "Model Year" },
            "y": { "field": "Electric Range", "type": "quantitative", "title": "Electric Range (miles)" },
            "color": {
                "field": "Electric Vehicle Type",
                "type": "nominal",
                "legend": null,
                "scale": { "scheme": "tableau20" }
            },
            "tooltip": [
                { "field": "Model Year", "type": "ordinal", "title": "Model Year" },
                { "field": "Electric Vehicle Type", "type": "nominal", "title": "Vehicle Type" },
                { "field": "Electric Range", "type": "quantitative", "format": ".2f", "title": "Range (miles)" }
            ]
        },
        "config": chart_config()
    })
}

/// Horizontal bar leaderboard of the ten most common makes, highlighted on hover.
pub fn top_manufacturers_spec(table: &VehicleTable) -> Value {
    let values: Vec<Value> = count_by(table, Category::Make)
        .into_iter()
        .take(10)
        .map(|(make, n)| json!({ "Make": make, "Vehicle Count": n }))
        .collect();

    json!({
        "$schema": "https://vega.github.io/schema/vega-lite/v5.json",
        "title": "Top 10 Manufacturers by Vehicle Count",
        "width": 600,
        "height": 400,
        "data": { "values": values },
        "params": [{
            "name": "highlight",
            "select": { "type": "point", "on": "mouseover", "clear": "mouseout", "fields": ["Make"] }
        }],
        "mark": "bar",
        "encoding": {
            "y": { "field": "Make", "type": "nominal", "sort": "-x", "title": "Manufacturer" },
            "x": { "field": "Vehicle Count", "type": "quantitative", "title": "Number of Vehicles" },
            "color": {
                "condition": {
                    "param": "highlight",
                    "empty": false,
                    "field": "Vehicle Count",
                    "type": "quantitative",
                    "scale": { "scheme": "viridis" }
                },
                "value": "lightgray"
            },
            "tooltip": [
                { "field": "Make", "type": "nominal", "title": "Manufacturer" },
                { "field": "Vehicle Count", "type": "quantitative", "format": ",", "title": "Count" }
            ]
        },
        "config": chart_config()
    })
}

// ---------------------------------------------------------------------------
// HTML rendering
// ---------------------------------------------------------------------------

/// Render a self-contained page that embeds `spec`.
pub fn render_chart_page(title: &str, spec: &Value) -> String {
    // `</` inside an inline script would end the script element early.
    let spec_json = spec.to_string().replace("</", "<\\/");
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    {scripts}
</head>
<body>
    <div id="vis"></div>
    <script>
        vegaEmbed("#vis", {spec});
    </script>
</body>
</html>
"##,
        title = html_escape(title),
        scripts = VEGA_SCRIPTS,
        spec = spec_json,
    )
}

/// Landing page linking the three chart pages with relative links.
pub fn render_index() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>EV Population Visualizations</title>
</head>
<body>
    <h1>EV Population Visualizations (Washington State)</h1>
    <ul>
        <li><a href="{AVERAGE_STATS_FILE}">Average Stats by Vehicle Type</a></li>
        <li><a href="{RANGE_TRENDS_FILE}">Electric Range Trends</a></li>
        <li><a href="{TOP_MANUFACTURERS_FILE}">Top Manufacturers by Count</a></li>
    </ul>
</body>
</html>
"#
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Write every chart page plus the index into each of `dirs`.
pub fn export_all(table: &VehicleTable, dirs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let pages = [
        (
            AVERAGE_STATS_FILE,
            render_chart_page("Average Electric Range by Vehicle Type", &average_range_spec(table)),
        ),
        (
            RANGE_TRENDS_FILE,
            render_chart_page("Electric Range Trends by Vehicle Type", &range_trend_spec(table)),
        ),
        (
            TOP_MANUFACTURERS_FILE,
            render_chart_page("Top 10 Manufacturers by Vehicle Count", &top_manufacturers_spec(table)),
        ),
        (INDEX_FILE, render_index()),
    ];

    let mut written = Vec::new();
    for dir in dirs {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating output directory {}", dir.display()))?;
        for (name, html) in &pages {
            let path = dir.join(name);
            write_page(&path, html)?;
            written.push(path);
        }
    }
    Ok(written)
}

fn write_page(path: &Path, html: &str) -> Result<()> {
    std::fs::write(path, html).with_context(|| format!("writing {}", path.display()))?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::{scenario, table, vehicle};

    #[test]
    fn average_range_spec_inlines_means() {
        let spec = average_range_spec(&scenario());
        let values = spec["data"]["values"].as_array().unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0]["Electric Vehicle Type"], "BEV");
        assert!((values[0]["Avg Range"].as_f64().unwrap() - 700.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn range_trend_binds_dropdown_to_top_types() {
        let t = table(vec![
            vehicle(2020, "Tesla", "BEV", 250.0),
            vehicle(2021, "Tesla", "BEV", 300.0),
            vehicle(2021, "Kia", "PHEV", 30.0),
        ]);
        let spec = range_trend_spec(&t);
        let param = &spec["params"][0];
        assert_eq!(param["bind"]["options"], json!(["BEV", "PHEV"]));
        assert_eq!(param["value"][0]["Electric Vehicle Type"], "BEV");
        assert_eq!(spec["data"]["values"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn range_trend_on_empty_table_has_no_initial_value() {
        let spec = range_trend_spec(&table(vec![]));
        assert!(spec["params"][0].get("value").is_none());
    }

    #[test]
    fn top_manufacturers_caps_at_ten() {
        let makes = ["A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L"];
        let t = table(makes.iter().map(|m| vehicle(2020, m, "BEV", 100.0)).collect());
        let spec = top_manufacturers_spec(&t);
        assert_eq!(spec["data"]["values"].as_array().unwrap().len(), 10);
        assert_eq!(spec["encoding"]["color"]["value"], "lightgray");
    }

    #[test]
    fn chart_page_is_standalone_and_script_safe() {
        let spec = json!({ "title": "</script><b>" });
        let html = render_chart_page("A & B", &spec);
        assert!(html.contains("<title>A &amp; B</title>"));
        assert!(html.contains("vega-embed@6"));
        assert!(!html.contains("</script><b>"));
    }

    #[test]
    fn export_writes_pages_into_every_dir() {
        let dir = tempfile::tempdir().unwrap();
        let dirs = vec![dir.path().join("templates"), dir.path().join("docs")];
        let written = export_all(&scenario(), &dirs).unwrap();
        assert_eq!(written.len(), 8);
        for d in &dirs {
            for name in [AVERAGE_STATS_FILE, RANGE_TRENDS_FILE, TOP_MANUFACTURERS_FILE, INDEX_FILE] {
                assert!(d.join(name).exists(), "{name} missing in {}", d.display());
            }
        }
        let index = std::fs::read_to_string(dirs[0].join(INDEX_FILE)).unwrap();
        assert!(index.contains(r#"href="top_manufacturers.html""#));
    }
}
