use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;

use serde::Serialize;

// ---------------------------------------------------------------------------
// Derived categories
// ---------------------------------------------------------------------------

/// Price tier derived from `Base MSRP`. Bins are right-open except the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum PriceCategory {
    Budget,
    Mid,
    Premium,
    Luxury,
}

impl PriceCategory {
    pub const ALL: [PriceCategory; 4] = [Self::Budget, Self::Mid, Self::Premium, Self::Luxury];

    /// Bin an MSRP: `[0, 30K)`, `[30K, 50K)`, `[50K, 80K)`, `[80K, ∞)`.
    pub fn from_msrp(msrp: f64) -> Self {
        if msrp < 30_000.0 {
            Self::Budget
        } else if msrp < 50_000.0 {
            Self::Mid
        } else if msrp < 80_000.0 {
            Self::Premium
        } else {
            Self::Luxury
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Budget => "Budget (<30K)",
            Self::Mid => "Mid (30-50K)",
            Self::Premium => "Premium (50-80K)",
            Self::Luxury => "Luxury (80K+)",
        }
    }
}

/// Range tier derived from `Electric Range` in miles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RangeCategory {
    Short,
    Medium,
    Long,
    Ultra,
}

impl RangeCategory {
    pub const ALL: [RangeCategory; 4] = [Self::Short, Self::Medium, Self::Long, Self::Ultra];

    /// Bin a range: `[0, 100)`, `[100, 200)`, `[200, 300)`, `[300, ∞)`.
    pub fn from_range(miles: f64) -> Self {
        if miles < 100.0 {
            Self::Short
        } else if miles < 200.0 {
            Self::Medium
        } else if miles < 300.0 {
            Self::Long
        } else {
            Self::Ultra
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Short => "Short (<100)",
            Self::Medium => "Medium (100-200)",
            Self::Long => "Long (200-300)",
            Self::Ultra => "Ultra (300+)",
        }
    }
}

impl fmt::Display for PriceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl fmt::Display for RangeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// VehicleRecord – one row of the source CSV
// ---------------------------------------------------------------------------

/// A single registered vehicle after cleaning.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleRecord {
    pub model_year: i32,
    pub make: String,
    pub model: Option<String>,
    pub vehicle_type: String,
    /// Always `> 0`.
    pub electric_range: f64,
    /// `Some(> 0)` when the source has an MSRP column, otherwise `None`.
    pub base_msrp: Option<f64>,
    pub county: Option<String>,
    pub city: Option<String>,
    pub cafv_eligibility: Option<String>,
    pub price_category: Option<PriceCategory>,
    pub range_category: RangeCategory,
}

/// Which optional source columns were present in the file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OptionalColumns {
    pub model: bool,
    pub msrp: bool,
    pub county: bool,
    pub city: bool,
    pub cafv: bool,
}

impl OptionalColumns {
    pub fn all() -> Self {
        Self {
            model: true,
            msrp: true,
            county: true,
            city: true,
            cafv: true,
        }
    }
}

// ---------------------------------------------------------------------------
// VehicleTable – the cleaned dataset
// ---------------------------------------------------------------------------

/// A cleaned table of vehicles with pre-computed distinct values and bounds.
///
/// The base table is never mutated after load; filtering and sampling build
/// new tables that share the same column layout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VehicleTable {
    /// All rows, in source order.
    pub records: Vec<VehicleRecord>,
    pub columns: OptionalColumns,
    /// Sorted distinct makes.
    pub makes: BTreeSet<String>,
    /// Sorted distinct vehicle types.
    pub vehicle_types: BTreeSet<String>,
    /// Sorted distinct counties (empty when the column is absent).
    pub counties: BTreeSet<String>,
    pub year_bounds: Option<RangeInclusive<i32>>,
    pub range_bounds: Option<RangeInclusive<f64>>,
    pub price_bounds: Option<RangeInclusive<f64>>,
}

impl VehicleTable {
    /// Build distinct-value indices and bounds from the records.
    pub fn from_records(records: Vec<VehicleRecord>, columns: OptionalColumns) -> Self {
        let mut makes = BTreeSet::new();
        let mut vehicle_types = BTreeSet::new();
        let mut counties = BTreeSet::new();
        let mut year_bounds: Option<(i32, i32)> = None;
        let mut range_bounds: Option<(f64, f64)> = None;
        let mut price_bounds: Option<(f64, f64)> = None;

        for rec in &records {
            makes.insert(rec.make.clone());
            vehicle_types.insert(rec.vehicle_type.clone());
            if let Some(county) = &rec.county {
                counties.insert(county.clone());
            }
            year_bounds = Some(match year_bounds {
                Some((lo, hi)) => (lo.min(rec.model_year), hi.max(rec.model_year)),
                None => (rec.model_year, rec.model_year),
            });
            range_bounds = Some(extend(range_bounds, rec.electric_range));
            if let Some(msrp) = rec.base_msrp {
                price_bounds = Some(extend(price_bounds, msrp));
            }
        }

        VehicleTable {
            records,
            columns,
            makes,
            vehicle_types,
            counties,
            year_bounds: year_bounds.map(|(lo, hi)| lo..=hi),
            range_bounds: range_bounds.map(|(lo, hi)| lo..=hi),
            price_bounds: price_bounds.map(|(lo, hi)| lo..=hi),
        }
    }

    /// An empty table that still remembers which columns exist.
    pub fn empty(columns: OptionalColumns) -> Self {
        Self::from_records(Vec::new(), columns)
    }

    /// New table holding clones of the rows at `indices`, in the given order.
    pub fn select(&self, indices: &[usize]) -> Self {
        let records = indices
            .iter()
            .filter_map(|&i| self.records.get(i).cloned())
            .collect();
        Self::from_records(records, self.columns)
    }

    /// Number of vehicles.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct model years, ascending.
    pub fn distinct_years(&self) -> Vec<i32> {
        let years: BTreeSet<i32> = self.records.iter().map(|r| r.model_year).collect();
        years.into_iter().collect()
    }
}

fn extend(bounds: Option<(f64, f64)>, v: f64) -> (f64, f64) {
    match bounds {
        Some((lo, hi)) => (lo.min(v), hi.max(v)),
        None => (v, v),
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    /// Minimal record; optional fields left empty.
    pub fn vehicle(year: i32, make: &str, vehicle_type: &str, range: f64) -> VehicleRecord {
        VehicleRecord {
            model_year: year,
            make: make.to_string(),
            model: None,
            vehicle_type: vehicle_type.to_string(),
            electric_range: range,
            base_msrp: None,
            county: None,
            city: None,
            cafv_eligibility: None,
            price_category: None,
            range_category: RangeCategory::from_range(range),
        }
    }

    pub fn priced(mut rec: VehicleRecord, msrp: f64) -> VehicleRecord {
        rec.base_msrp = Some(msrp);
        rec.price_category = Some(PriceCategory::from_msrp(msrp));
        rec
    }

    pub fn table(records: Vec<VehicleRecord>) -> VehicleTable {
        VehicleTable::from_records(records, OptionalColumns::default())
    }

    /// The three-row scenario used across aggregate tests.
    pub fn scenario() -> VehicleTable {
        table(vec![
            vehicle(2020, "Tesla", "BEV", 250.0),
            vehicle(2021, "Tesla", "BEV", 300.0),
            vehicle(2021, "Nissan", "BEV", 150.0),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn price_bins_are_right_open() {
        assert_eq!(PriceCategory::from_msrp(29_999.0), PriceCategory::Budget);
        assert_eq!(PriceCategory::from_msrp(30_000.0), PriceCategory::Mid);
        assert_eq!(PriceCategory::from_msrp(50_000.0), PriceCategory::Premium);
        assert_eq!(PriceCategory::from_msrp(80_000.0), PriceCategory::Luxury);
        assert_eq!(PriceCategory::from_msrp(845_000.0), PriceCategory::Luxury);
    }

    #[test]
    fn range_bins_are_right_open() {
        assert_eq!(RangeCategory::from_range(99.9), RangeCategory::Short);
        assert_eq!(RangeCategory::from_range(100.0), RangeCategory::Medium);
        assert_eq!(RangeCategory::from_range(200.0), RangeCategory::Long);
        assert_eq!(RangeCategory::from_range(300.0), RangeCategory::Ultra);
    }

    #[test]
    fn from_records_collects_distinct_values_and_bounds() {
        let t = table(vec![
            priced(vehicle(2019, "Tesla", "BEV", 220.0), 60_000.0),
            vehicle(2023, "Kia", "PHEV", 32.0),
            vehicle(2021, "Tesla", "BEV", 300.0),
        ]);
        assert_eq!(t.makes.iter().cloned().collect::<Vec<_>>(), ["Kia", "Tesla"]);
        assert_eq!(t.vehicle_types.len(), 2);
        assert_eq!(t.year_bounds, Some(2019..=2023));
        assert_eq!(t.range_bounds, Some(32.0..=300.0));
        assert_eq!(t.price_bounds, Some(60_000.0..=60_000.0));
        assert_eq!(t.distinct_years(), vec![2019, 2021, 2023]);
    }

    #[test]
    fn select_keeps_requested_order_and_columns() {
        let mut t = scenario();
        t.columns = OptionalColumns::all();
        let t = VehicleTable::from_records(t.records, t.columns);
        let picked = t.select(&[2, 0, 99]);
        assert_eq!(picked.len(), 2);
        assert_eq!(picked.records[0].make, "Nissan");
        assert_eq!(picked.records[1].model_year, 2020);
        assert_eq!(picked.columns, OptionalColumns::all());
    }

    #[test]
    fn empty_table_has_no_bounds() {
        let t = VehicleTable::empty(OptionalColumns::all());
        assert!(t.is_empty());
        assert!(t.year_bounds.is_none());
        assert!(t.distinct_years().is_empty());
    }
}
