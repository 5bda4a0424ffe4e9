/// Data layer: core types, loading, filtering and summaries.
///
/// Architecture:
/// ```text
///  electric_vehicle_population.csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse + clean → VehicleTable
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  cache    │  DataStore: load once, shared Arc<VehicleTable>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterParams → filtered table → (sample for display)
///   └──────────┘
///        │
///        ├──────────────┐
///        ▼              ▼
///   ┌──────────┐   ┌──────────┐
///   │ aggregate │   │  charts   │  summary metrics / chart-ready series
///   └──────────┘   └──────────┘
/// ```

pub mod aggregate;
pub mod cache;
pub mod charts;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
