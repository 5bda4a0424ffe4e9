//! Summary statistics over a filtered table.
//!
//! Every helper returns `None` instead of failing when the table cannot
//! support the statistic: no rows, fewer than two model years, or a missing
//! optional column.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::model::{VehicleRecord, VehicleTable};

/// Minimum rows before [`fastest_growing_make`] reports anything.
pub const MIN_ROWS_FOR_GROWTH: usize = 50;
/// Minimum vehicles a make needs in the latest year to be a candidate.
pub const MIN_LATEST_YEAR_COUNT: usize = 5;

fn percent_change(from: f64, to: f64) -> Option<f64> {
    if from == 0.0 || !from.is_finite() || !to.is_finite() {
        None
    } else {
        Some((to - from) / from * 100.0)
    }
}

/// Per-year mean of `value`, ascending by year. Rows where `value` is `None`
/// do not contribute.
fn yearly_means(
    table: &VehicleTable,
    value: impl Fn(&VehicleRecord) -> Option<f64>,
) -> BTreeMap<i32, f64> {
    let mut sums: BTreeMap<i32, (f64, usize)> = BTreeMap::new();
    for rec in &table.records {
        if let Some(v) = value(rec) {
            let slot = sums.entry(rec.model_year).or_default();
            slot.0 += v;
            slot.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(year, (sum, n))| (year, sum / n as f64))
        .collect()
}

fn yearly_counts(table: &VehicleTable) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for rec in &table.records {
        *counts.entry(rec.model_year).or_default() += 1;
    }
    counts
}

/// Percent change between the last two entries of an ascending year map.
fn last_two_change(by_year: &BTreeMap<i32, f64>) -> Option<f64> {
    let mut rev = by_year.values().rev();
    let latest = *rev.next()?;
    let previous = *rev.next()?;
    percent_change(previous, latest)
}

/// Percent change in row count between the two most recent model years.
pub fn growth_rate(table: &VehicleTable) -> Option<f64> {
    let counts: BTreeMap<i32, f64> = yearly_counts(table)
        .into_iter()
        .map(|(y, n)| (y, n as f64))
        .collect();
    last_two_change(&counts)
}

/// Percent change in mean MSRP between the two most recent model years.
pub fn price_trend(table: &VehicleTable) -> Option<f64> {
    if !table.columns.msrp {
        return None;
    }
    last_two_change(&yearly_means(table, |r| r.base_msrp))
}

/// Percent change in mean electric range between the two most recent model years.
pub fn range_trend(table: &VehicleTable) -> Option<f64> {
    last_two_change(&yearly_means(table, |r| Some(r.electric_range)))
}

/// Percent change in mean electric range from the earliest to the latest model year.
pub fn range_improvement(table: &VehicleTable) -> Option<f64> {
    let means = yearly_means(table, |r| Some(r.electric_range));
    if means.len() < 2 {
        return None;
    }
    let (_, first) = means.first_key_value()?;
    let (_, last) = means.last_key_value()?;
    percent_change(*first, *last)
}

/// Herfindahl–Hirschman index over make shares, scaled to `(0, 100]`.
pub fn market_concentration(table: &VehicleTable) -> Option<f64> {
    if table.is_empty() {
        return None;
    }
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for rec in &table.records {
        *counts.entry(rec.make.as_str()).or_default() += 1;
    }
    let total = table.len() as f64;
    let hhi: f64 = counts
        .values()
        .map(|&n| {
            let share = n as f64 / total;
            share * share
        })
        .sum();
    Some(hhi * 100.0)
}

/// A make and its year-over-year growth in registrations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MakeGrowth {
    pub make: String,
    pub growth_pct: f64,
}

/// The make with the highest growth from the second-latest to the latest year.
///
/// Candidates need at least [`MIN_LATEST_YEAR_COUNT`] vehicles in the latest
/// year and at least one in the year before. Ties go to the
/// alphabetically first make.
pub fn fastest_growing_make(table: &VehicleTable) -> Option<MakeGrowth> {
    if table.len() < MIN_ROWS_FOR_GROWTH {
        return None;
    }
    let years = table.distinct_years();
    let [.., previous, latest] = years.as_slice() else {
        return None;
    };

    let mut per_make: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for rec in &table.records {
        if rec.model_year == *latest {
            per_make.entry(rec.make.as_str()).or_default().1 += 1;
        } else if rec.model_year == *previous {
            per_make.entry(rec.make.as_str()).or_default().0 += 1;
        }
    }

    let mut best: Option<MakeGrowth> = None;
    for (make, (prev, cur)) in per_make {
        if cur < MIN_LATEST_YEAR_COUNT || prev == 0 {
            continue;
        }
        let Some(growth_pct) = percent_change(prev as f64, cur as f64) else {
            continue;
        };
        if best.as_ref().map_or(true, |b| growth_pct > b.growth_pct) {
            best = Some(MakeGrowth {
                make: make.to_string(),
                growth_pct,
            });
        }
    }
    best
}

// ---------------------------------------------------------------------------
// Summary bundle for the metrics view
// ---------------------------------------------------------------------------

/// Headline numbers for one filtered table.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SummaryMetrics {
    pub total_vehicles: usize,
    pub distinct_makes: usize,
    /// `None` when the source has no model column.
    pub distinct_models: Option<usize>,
    pub mean_range: Option<f64>,
    pub mean_msrp: Option<f64>,
    pub cafv_eligible: Option<usize>,
    pub growth_rate: Option<f64>,
    pub price_trend: Option<f64>,
    pub range_trend: Option<f64>,
    pub range_improvement: Option<f64>,
    pub market_concentration: Option<f64>,
    pub fastest_growing_make: Option<MakeGrowth>,
}

impl SummaryMetrics {
    pub fn compute(table: &VehicleTable) -> Self {
        let n = table.len();
        let mean_range = (n > 0)
            .then(|| table.records.iter().map(|r| r.electric_range).sum::<f64>() / n as f64);

        let mean_msrp = if table.columns.msrp {
            let prices: Vec<f64> = table.records.iter().filter_map(|r| r.base_msrp).collect();
            (!prices.is_empty()).then(|| prices.iter().sum::<f64>() / prices.len() as f64)
        } else {
            None
        };

        let distinct_models = table.columns.model.then(|| {
            table
                .records
                .iter()
                .filter_map(|r| r.model.as_deref().map(|m| (r.make.as_str(), m)))
                .collect::<BTreeSet<_>>()
                .len()
        });

        let cafv_eligible = table.columns.cafv.then(|| {
            table
                .records
                .iter()
                .filter(|r| r.cafv_eligibility.is_some())
                .count()
        });

        SummaryMetrics {
            total_vehicles: n,
            distinct_makes: table.makes.len(),
            distinct_models,
            mean_range,
            mean_msrp,
            cafv_eligible,
            growth_rate: growth_rate(table),
            price_trend: price_trend(table),
            range_trend: range_trend(table),
            range_improvement: range_improvement(table),
            market_concentration: market_concentration(table),
            fastest_growing_make: fastest_growing_make(table),
        }
    }

    /// JSON form for presentation layers that bind to plain data.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::{filter, FilterParams};
    use crate::data::model::fixtures::{priced, scenario, table, vehicle};
    use crate::data::model::OptionalColumns;

    fn approx(a: Option<f64>, b: f64) {
        let a = a.expect("value expected");
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn scenario_growth_rate_is_one_hundred_percent() {
        approx(growth_rate(&scenario()), 100.0);
    }

    #[test]
    fn scenario_concentration_for_latest_year() {
        let latest = filter(
            &scenario(),
            &FilterParams {
                years: Some(2021..=2021),
                ..Default::default()
            },
        );
        approx(market_concentration(&latest), 50.0);
    }

    #[test]
    fn single_make_concentration_is_one_hundred() {
        let t = table(vec![
            vehicle(2020, "Tesla", "BEV", 250.0),
            vehicle(2022, "Tesla", "BEV", 300.0),
        ]);
        approx(market_concentration(&t), 100.0);
        let mixed = table(vec![
            vehicle(2020, "Tesla", "BEV", 250.0),
            vehicle(2020, "Tesla", "BEV", 250.0),
            vehicle(2020, "Tesla", "BEV", 250.0),
            vehicle(2020, "Kia", "BEV", 250.0),
        ]);
        assert!(market_concentration(&mixed).unwrap() < 100.0);
        assert!(market_concentration(&table(vec![])).is_none());
    }

    #[test]
    fn trends_need_two_years() {
        let one_year = VehicleTable::from_records(
            vec![
                priced(vehicle(2021, "Tesla", "BEV", 250.0), 50_000.0),
                priced(vehicle(2021, "Kia", "BEV", 200.0), 40_000.0),
            ],
            OptionalColumns::all(),
        );
        assert!(growth_rate(&one_year).is_none());
        assert!(price_trend(&one_year).is_none());
        assert!(range_trend(&one_year).is_none());
        assert!(range_improvement(&one_year).is_none());

        let empty = table(vec![]);
        assert!(growth_rate(&empty).is_none());
        assert!(range_improvement(&empty).is_none());
    }

    #[test]
    fn trends_compare_last_two_years_in_order() {
        // Rows deliberately out of chronological order.
        let records = vec![
            priced(vehicle(2022, "Tesla", "BEV", 300.0), 60_000.0),
            priced(vehicle(2018, "Tesla", "BEV", 100.0), 40_000.0),
            priced(vehicle(2021, "Kia", "BEV", 200.0), 50_000.0),
            priced(vehicle(2021, "Kia", "BEV", 200.0), 50_000.0),
        ];
        let t = VehicleTable::from_records(records, OptionalColumns::all());
        approx(growth_rate(&t), -50.0);
        approx(price_trend(&t), 20.0);
        approx(range_trend(&t), 50.0);
        approx(range_improvement(&t), 200.0);
    }

    #[test]
    fn price_trend_needs_msrp_column() {
        assert!(price_trend(&scenario()).is_none());
    }

    fn growth_table() -> VehicleTable {
        let mut rows = Vec::new();
        // Tesla 10 -> 15 (+50%), Kia 2 -> 6 (+200%), Ford 0 -> 8 (skipped),
        // Audi 1 -> 4 (+300% but below the latest-year minimum).
        for _ in 0..10 {
            rows.push(vehicle(2022, "Tesla", "BEV", 300.0));
        }
        for _ in 0..15 {
            rows.push(vehicle(2023, "Tesla", "BEV", 300.0));
        }
        for _ in 0..2 {
            rows.push(vehicle(2022, "Kia", "BEV", 250.0));
        }
        for _ in 0..6 {
            rows.push(vehicle(2023, "Kia", "BEV", 250.0));
        }
        for _ in 0..8 {
            rows.push(vehicle(2023, "Ford", "BEV", 230.0));
        }
        rows.push(vehicle(2022, "Audi", "BEV", 200.0));
        for _ in 0..4 {
            rows.push(vehicle(2023, "Audi", "BEV", 200.0));
        }
        for _ in 0..10 {
            rows.push(vehicle(2015, "Nissan", "BEV", 80.0));
        }
        table(rows)
    }

    #[test]
    fn fastest_growing_make_picks_highest_eligible_growth() {
        let t = growth_table();
        assert!(t.len() >= MIN_ROWS_FOR_GROWTH);
        let best = fastest_growing_make(&t).unwrap();
        assert_eq!(best.make, "Kia");
        assert!((best.growth_pct - 200.0).abs() < 1e-9);
    }

    #[test]
    fn fastest_growing_make_needs_enough_rows() {
        assert!(fastest_growing_make(&scenario()).is_none());
        let single_year = table((0..60).map(|_| vehicle(2023, "Tesla", "BEV", 300.0)).collect());
        assert!(fastest_growing_make(&single_year).is_none());
    }

    #[test]
    fn fastest_growing_make_ties_go_to_first_make() {
        let mut rows = Vec::new();
        for make in ["Volvo", "BMW"] {
            for _ in 0..5 {
                rows.push(vehicle(2022, make, "BEV", 200.0));
            }
            for _ in 0..10 {
                rows.push(vehicle(2023, make, "BEV", 200.0));
            }
        }
        for _ in 0..30 {
            rows.push(vehicle(2010, "Nissan", "BEV", 80.0));
        }
        assert_eq!(fastest_growing_make(&table(rows)).unwrap().make, "BMW");
    }

    #[test]
    fn summary_handles_empty_table() {
        let m = SummaryMetrics::compute(&VehicleTable::empty(OptionalColumns::all()));
        assert_eq!(m.total_vehicles, 0);
        assert_eq!(m.mean_range, None);
        assert_eq!(m.mean_msrp, None);
        assert_eq!(m.distinct_models, Some(0));
        assert_eq!(m.cafv_eligible, Some(0));
        assert_eq!(m.market_concentration, None);
        assert_eq!(m.to_json()["total_vehicles"], 0);
    }

    #[test]
    fn summary_on_scenario() {
        let m = SummaryMetrics::compute(&scenario());
        assert_eq!(m.total_vehicles, 3);
        assert_eq!(m.distinct_makes, 2);
        assert_eq!(m.distinct_models, None);
        approx(m.mean_range, 700.0 / 3.0);
        approx(m.growth_rate, 100.0);
        assert!(m.to_json()["price_trend"].is_null());
    }
}
