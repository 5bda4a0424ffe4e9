use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::model::{VehicleRecord, VehicleTable};

// ---------------------------------------------------------------------------
// Filter predicate: user-chosen selections for one interaction
// ---------------------------------------------------------------------------

/// Immutable filter parameters for one recompute.
///
/// Set-valued selections use "empty means all": an empty set applies no
/// restriction. `None` ranges are unrestricted; bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterParams {
    pub makes: BTreeSet<String>,
    pub vehicle_types: BTreeSet<String>,
    /// Ignored when the table has no county column.
    pub counties: BTreeSet<String>,
    pub years: Option<RangeInclusive<i32>>,
    pub electric_range: Option<RangeInclusive<f64>>,
    /// Ignored when the table has no MSRP column.
    pub price: Option<RangeInclusive<f64>>,
    /// Keep only rows with a non-null CAFV eligibility.
    pub cafv_only: bool,
}

impl FilterParams {
    /// Whether this set of parameters restricts nothing.
    pub fn is_unrestricted(&self) -> bool {
        *self == FilterParams::default()
    }

    /// Whether the county selection narrows `table` at all. Ticking every
    /// county present is the same as ticking none, so rows without a county
    /// survive both.
    fn restricts_counties(&self, table: &VehicleTable) -> bool {
        table.columns.county && !self.counties.is_empty() && !table.counties.is_subset(&self.counties)
    }

    fn accepts(&self, table: &VehicleTable, rec: &VehicleRecord, counties: bool) -> bool {
        if !self.makes.is_empty() && !self.makes.contains(&rec.make) {
            return false;
        }
        if !self.vehicle_types.is_empty() && !self.vehicle_types.contains(&rec.vehicle_type) {
            return false;
        }
        if counties {
            match &rec.county {
                Some(county) if self.counties.contains(county) => {}
                _ => return false,
            }
        }
        if let Some(years) = &self.years {
            if !years.contains(&rec.model_year) {
                return false;
            }
        }
        if let Some(range) = &self.electric_range {
            if !range.contains(&rec.electric_range) {
                return false;
            }
        }
        if table.columns.msrp {
            if let Some(price) = &self.price {
                match rec.base_msrp {
                    Some(msrp) if price.contains(&msrp) => {}
                    _ => return false,
                }
            }
        }
        if self.cafv_only && rec.cafv_eligibility.is_none() {
            return false;
        }
        true
    }
}

/// Return indices of rows that pass every predicate, in source order.
pub fn filtered_indices(table: &VehicleTable, params: &FilterParams) -> Vec<usize> {
    let counties = params.restricts_counties(table);
    table
        .records
        .iter()
        .enumerate()
        .filter(|(_, rec)| params.accepts(table, rec, counties))
        .map(|(i, _)| i)
        .collect()
}

/// Build a new table holding the rows that pass `params`.
///
/// Pure: the input table is untouched and all columns are kept.
pub fn filter(table: &VehicleTable, params: &FilterParams) -> VehicleTable {
    if params.is_unrestricted() {
        return table.clone();
    }
    table.select(&filtered_indices(table, params))
}

// ---------------------------------------------------------------------------
// Sampling (display only; aggregates always use the full filtered table)
// ---------------------------------------------------------------------------

/// Uniform sample of exactly `cap` rows, reproducible for a given `seed`.
///
/// Tables with at most `cap` rows are returned unchanged. Sampled rows keep
/// their relative source order.
pub fn sample(table: &VehicleTable, cap: usize, seed: u64) -> VehicleTable {
    if table.len() <= cap {
        return table.clone();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut picked = rand::seq::index::sample(&mut rng, table.len(), cap).into_vec();
    picked.sort_unstable();
    table.select(&picked)
}

/// Rows to draw in point-based charts: sampled when `enabled`, else everything.
pub fn display_rows(table: &VehicleTable, cap: usize, seed: u64, enabled: bool) -> VehicleTable {
    if enabled {
        sample(table, cap, seed)
    } else {
        table.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::fixtures::{priced, table, vehicle};
    use crate::data::model::OptionalColumns;

    fn sample_table() -> VehicleTable {
        let mut kia = vehicle(2022, "Kia", "PHEV", 32.0);
        kia.county = Some("Pierce".into());
        let mut tesla = priced(vehicle(2021, "Tesla", "BEV", 300.0), 55_000.0);
        tesla.county = Some("King".into());
        tesla.cafv_eligibility = Some("Eligible".into());
        let mut nissan = priced(vehicle(2019, "Nissan", "BEV", 150.0), 31_000.0);
        nissan.county = Some("King".into());
        let mut tesla_old = priced(vehicle(2018, "Tesla", "BEV", 215.0), 80_000.0);
        tesla_old.county = None;
        kia.base_msrp = Some(40_000.0);
        VehicleTable::from_records(vec![kia, tesla, nissan, tesla_old], OptionalColumns::all())
    }

    fn makes(t: &VehicleTable) -> Vec<&str> {
        t.records.iter().map(|r| r.make.as_str()).collect()
    }

    #[test]
    fn default_params_keep_everything() {
        let t = sample_table();
        assert_eq!(filter(&t, &FilterParams::default()), t);
    }

    #[test]
    fn empty_selection_equals_all_values_selected() {
        let t = sample_table();
        let all = FilterParams {
            makes: t.makes.clone(),
            vehicle_types: t.vehicle_types.clone(),
            counties: t.counties.clone(),
            ..Default::default()
        };
        assert_eq!(filter(&t, &FilterParams::default()), filter(&t, &all));
    }

    #[test]
    fn every_county_selected_keeps_rows_without_county() {
        let mut king = vehicle(2021, "Tesla", "BEV", 300.0);
        king.county = Some("King".into());
        let unknown = vehicle(2020, "Nissan", "BEV", 150.0);
        let t = VehicleTable::from_records(vec![king, unknown], OptionalColumns::all());

        let none_ticked = FilterParams::default();
        let all_ticked = FilterParams {
            counties: t.counties.clone(),
            ..Default::default()
        };
        assert_eq!(filter(&t, &none_ticked).len(), 2);
        assert_eq!(filter(&t, &all_ticked).len(), 2);

        // A value outside the data still counts as covering it.
        let superset = FilterParams {
            counties: ["King".to_string(), "Pierce".to_string()].into(),
            ..Default::default()
        };
        assert_eq!(filter(&t, &superset).len(), 2);
    }

    #[test]
    fn predicates_combine_with_and_and_keep_order() {
        let t = sample_table();
        let params = FilterParams {
            makes: ["Tesla".to_string(), "Nissan".to_string()].into(),
            years: Some(2019..=2021),
            ..Default::default()
        };
        let out = filter(&t, &params);
        assert_eq!(makes(&out), ["Tesla", "Nissan"]);
        assert_eq!(out.columns, t.columns);
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let t = sample_table();
        let params = FilterParams {
            electric_range: Some(150.0..=300.0),
            price: Some(31_000.0..=55_000.0),
            ..Default::default()
        };
        assert_eq!(makes(&filter(&t, &params)), ["Tesla", "Nissan"]);
    }

    #[test]
    fn inverted_range_matches_nothing() {
        let t = sample_table();
        let params = FilterParams {
            years: Some(2022..=2018),
            ..Default::default()
        };
        assert!(filter(&t, &params).is_empty());
    }

    #[test]
    fn county_filter_drops_rows_without_county() {
        let t = sample_table();
        let params = FilterParams {
            counties: ["King".to_string()].into(),
            ..Default::default()
        };
        assert_eq!(makes(&filter(&t, &params)), ["Tesla", "Nissan"]);
    }

    #[test]
    fn county_and_price_ignored_when_columns_absent() {
        let t = table(vec![vehicle(2020, "Tesla", "BEV", 250.0)]);
        let params = FilterParams {
            counties: ["King".to_string()].into(),
            price: Some(1.0..=2.0),
            ..Default::default()
        };
        assert_eq!(filter(&t, &params).len(), 1);
    }

    #[test]
    fn cafv_only_keeps_non_null_eligibility() {
        let t = sample_table();
        let params = FilterParams {
            cafv_only: true,
            ..Default::default()
        };
        assert_eq!(makes(&filter(&t, &params)), ["Tesla"]);
    }

    #[test]
    fn filtering_is_idempotent_and_pure() {
        let t = sample_table();
        let before = t.clone();
        let params = FilterParams {
            vehicle_types: ["BEV".to_string()].into(),
            electric_range: Some(200.0..=400.0),
            ..Default::default()
        };
        let once = filter(&t, &params);
        let twice = filter(&once, &params);
        assert_eq!(once.records, twice.records);
        assert_eq!(t, before);
    }

    #[test]
    fn unknown_make_yields_empty_table() {
        let t = sample_table();
        let params = FilterParams {
            makes: ["Rivian".to_string()].into(),
            ..Default::default()
        };
        let out = filter(&t, &params);
        assert!(out.is_empty());
        assert!(out.year_bounds.is_none());
    }

    fn big_table(n: usize) -> VehicleTable {
        table(
            (0..n)
                .map(|i| vehicle(2010 + (i % 14) as i32, "Make", "BEV", 1.0 + i as f64))
                .collect(),
        )
    }

    #[test]
    fn sample_below_cap_is_identity() {
        let t = big_table(10);
        assert_eq!(sample(&t, 10, 42), t);
        assert_eq!(sample(&t, 1000, 7), t);
    }

    #[test]
    fn sample_is_deterministic_for_a_seed() {
        let t = big_table(500);
        let a = sample(&t, 50, 42);
        let b = sample(&t, 50, 42);
        assert_eq!(a.len(), 50);
        assert_eq!(a.records, b.records);

        let ranges: Vec<f64> = a.records.iter().map(|r| r.electric_range).collect();
        assert!(ranges.windows(2).all(|w| w[0] < w[1]), "source order kept");
    }

    #[test]
    fn different_seeds_draw_different_rows() {
        let t = big_table(500);
        assert_ne!(sample(&t, 50, 1).records, sample(&t, 50, 2).records);
    }

    #[test]
    fn display_rows_respects_toggle() {
        let t = big_table(100);
        assert_eq!(display_rows(&t, 10, 42, true).len(), 10);
        assert_eq!(display_rows(&t, 10, 42, false).len(), 100);
    }
}
