//! Chart-ready series derived from a table.
//!
//! These are plain data so any presentation layer (the egui views, the
//! Vega-Lite exporter) can bind to them.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::model::{PriceCategory, RangeCategory, VehicleRecord, VehicleTable};

/// Categorical columns that charts group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Make,
    VehicleType,
    County,
}

impl Category {
    fn value(self, rec: &VehicleRecord) -> Option<&str> {
        match self {
            Category::Make => Some(rec.make.as_str()),
            Category::VehicleType => Some(rec.vehicle_type.as_str()),
            Category::County => rec.county.as_deref(),
        }
    }
}

/// Numeric columns that charts aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    ElectricRange,
    BaseMsrp,
}

impl Measure {
    fn value(self, rec: &VehicleRecord) -> Option<f64> {
        match self {
            Measure::ElectricRange => Some(rec.electric_range),
            Measure::BaseMsrp => rec.base_msrp,
        }
    }
}

/// `(label, count)` descending by count, ties by label.
pub fn count_by(table: &VehicleTable, key: Category) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for rec in &table.records {
        if let Some(v) = key.value(rec) {
            *counts.entry(v).or_default() += 1;
        }
    }
    let mut out: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(k, n)| (k.to_string(), n))
        .collect();
    out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    out
}

/// Labels of the `n` most frequent values of `key`.
pub fn top_n(table: &VehicleTable, key: Category, n: usize) -> Vec<String> {
    count_by(table, key)
        .into_iter()
        .take(n)
        .map(|(label, _)| label)
        .collect()
}

/// Mean electric range per value of `key`, sorted by label.
pub fn mean_range_by(table: &VehicleTable, key: Category) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for rec in &table.records {
        if let Some(v) = key.value(rec) {
            let slot = sums.entry(v).or_default();
            slot.0 += rec.electric_range;
            slot.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(k, (sum, n))| (k.to_string(), sum / n as f64))
        .collect()
}

/// Mean of `measure` per model year, ascending.
pub fn yearly_mean(table: &VehicleTable, measure: Measure) -> Vec<(i32, f64)> {
    let mut sums: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for rec in &table.records {
        if let Some(v) = measure.value(rec) {
            let slot = sums.entry(rec.model_year).or_default();
            slot.0 += v;
            slot.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(y, (sum, n))| (y, sum / n as f64))
        .collect()
}

/// Vehicle counts for a set of makes across model years.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Heatmap {
    /// Row labels.
    pub makes: Vec<String>,
    /// Column labels, ascending.
    pub years: Vec<i32>,
    /// `counts[row][col]`.
    pub counts: Vec<Vec<usize>>,
}

impl Heatmap {
    pub fn max_count(&self) -> usize {
        self.counts.iter().flatten().copied().max().unwrap_or(0)
    }
}

/// Count vehicles by make × year for `makes` (rows keep the given order).
pub fn make_year_heatmap(table: &VehicleTable, makes: &[String]) -> Heatmap {
    let row_of: HashMap<&str, usize> = makes
        .iter()
        .enumerate()
        .map(|(i, m)| (m.as_str(), i))
        .collect();

    let mut cells: BTreeMap<i32, Vec<usize>> = BTreeMap::new();
    for rec in &table.records {
        if let Some(&row) = row_of.get(rec.make.as_str()) {
            cells
                .entry(rec.model_year)
                .or_insert_with(|| vec![0; makes.len()])[row] += 1;
        }
    }

    let years: Vec<i32> = cells.keys().copied().collect();
    let counts = (0..makes.len())
        .map(|row| cells.values().map(|col| col[row]).collect())
        .collect();

    Heatmap {
        makes: makes.to_vec(),
        years,
        counts,
    }
}

/// Five-number summary for a box plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxStats {
    pub label: String,
    pub min: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub max: f64,
    pub count: usize,
}

/// Linear-interpolated quantile of sorted, non-empty `values`.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

pub fn box_stats(label: &str, values: &[f64]) -> Option<BoxStats> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(BoxStats {
        label: label.to_string(),
        min: sorted[0],
        q1: quantile(&sorted, 0.25),
        median: quantile(&sorted, 0.5),
        q3: quantile(&sorted, 0.75),
        max: sorted[sorted.len() - 1],
        count: sorted.len(),
    })
}

/// Electric range box plots for each vehicle type in `types`, in that order.
pub fn range_boxplots(table: &VehicleTable, types: &[String]) -> Vec<BoxStats> {
    types
        .iter()
        .filter_map(|t| {
            let values: Vec<f64> = table
                .records
                .iter()
                .filter(|r| &r.vehicle_type == t)
                .map(|r| r.electric_range)
                .collect();
            box_stats(t, &values)
        })
        .collect()
}

/// One equal-width histogram bin `[start, end)` (the last bin is closed).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

/// Equal-width histogram over the value span. Empty input yields no bins.
pub fn histogram(values: &[f64], bins: usize) -> Vec<Bin> {
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if span.abs() < f64::EPSILON {
        return vec![Bin {
            start: min,
            end: max,
            count: values.len(),
        }];
    }

    let width = span / bins as f64;
    let mut counts = vec![0usize; bins];
    for &v in values {
        let idx = (((v - min) / width) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
        .into_iter()
        .enumerate()
        .map(|(i, count)| Bin {
            start: min + width * i as f64,
            end: min + width * (i + 1) as f64,
            count,
        })
        .collect()
}

/// Vehicle count per price tier, every tier listed (rows without MSRP skipped).
pub fn price_category_share(table: &VehicleTable) -> Vec<(PriceCategory, usize)> {
    PriceCategory::ALL
        .iter()
        .map(|&c| {
            let n = table
                .records
                .iter()
                .filter(|r| r.price_category == Some(c))
                .count();
            (c, n)
        })
        .collect()
}

/// Vehicle count per range tier, every tier listed.
pub fn range_category_share(table: &VehicleTable) -> Vec<(RangeCategory, usize)> {
    RangeCategory::ALL
        .iter()
        .map(|&c| {
            let n = table
                .records
                .iter()
                .filter(|r| r.range_category == c)
                .count();
            (c, n)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::{priced, scenario, table, vehicle};

    #[test]
    fn count_by_orders_by_count_then_label() {
        let t = table(vec![
            vehicle(2020, "Kia", "PHEV", 30.0),
            vehicle(2020, "Tesla", "BEV", 250.0),
            vehicle(2021, "Audi", "BEV", 200.0),
            vehicle(2021, "Tesla", "BEV", 300.0),
        ]);
        assert_eq!(
            count_by(&t, Category::Make),
            vec![("Tesla".to_string(), 2), ("Audi".to_string(), 1), ("Kia".to_string(), 1)]
        );
        assert_eq!(top_n(&t, Category::VehicleType, 1), vec!["BEV".to_string()]);
        assert!(count_by(&t, Category::County).is_empty());
    }

    #[test]
    fn mean_range_and_yearly_mean() {
        let t = scenario();
        assert_eq!(
            mean_range_by(&t, Category::Make),
            vec![("Nissan".to_string(), 150.0), ("Tesla".to_string(), 275.0)]
        );
        assert_eq!(
            yearly_mean(&t, Measure::ElectricRange),
            vec![(2020, 250.0), (2021, 225.0)]
        );
        assert!(yearly_mean(&t, Measure::BaseMsrp).is_empty());
    }

    #[test]
    fn heatmap_counts_make_by_year() {
        let t = scenario();
        let hm = make_year_heatmap(&t, &["Tesla".into(), "Nissan".into()]);
        assert_eq!(hm.years, vec![2020, 2021]);
        assert_eq!(hm.counts, vec![vec![1, 1], vec![0, 1]]);
        assert_eq!(hm.max_count(), 1);
        assert_eq!(make_year_heatmap(&t, &[]).max_count(), 0);
    }

    #[test]
    fn box_stats_interpolates_quartiles() {
        let s = box_stats("BEV", &[4.0, 1.0, 3.0, 2.0, 5.0]).unwrap();
        assert_eq!((s.min, s.q1, s.median, s.q3, s.max), (1.0, 2.0, 3.0, 4.0, 5.0));
        let s = box_stats("x", &[1.0, 2.0]).unwrap();
        assert_eq!(s.median, 1.5);
        assert!(box_stats("none", &[]).is_none());
    }

    #[test]
    fn range_boxplots_skip_absent_types() {
        let t = scenario();
        let boxes = range_boxplots(&t, &["BEV".into(), "PHEV".into()]);
        assert_eq!(boxes.len(), 1);
        assert_eq!(boxes[0].count, 3);
        assert_eq!(boxes[0].median, 250.0);
    }

    #[test]
    fn histogram_puts_max_in_last_bin() {
        let bins = histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], 2);
        assert_eq!(bins.len(), 2);
        assert_eq!(bins[0].count, 2);
        assert_eq!(bins[1].count, 3);
        assert_eq!(histogram(&[7.0, 7.0], 5)[0].count, 2);
        assert!(histogram(&[], 5).is_empty());
    }

    #[test]
    fn category_shares_list_every_tier() {
        let t = table(vec![
            priced(vehicle(2020, "Tesla", "BEV", 250.0), 45_000.0),
            priced(vehicle(2021, "BMW", "BEV", 310.0), 90_000.0),
        ]);
        let price = price_category_share(&t);
        assert_eq!(price.len(), 4);
        assert_eq!(price[1], (PriceCategory::Mid, 1));
        assert_eq!(price[3], (PriceCategory::Luxury, 1));
        let range = range_category_share(&t);
        assert_eq!(range[2], (RangeCategory::Long, 1));
        assert_eq!(range[3], (RangeCategory::Ultra, 1));
    }
}
