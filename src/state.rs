use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use ev_dashboard::config::DashboardConfig;
use ev_dashboard::data::aggregate::SummaryMetrics;
use ev_dashboard::data::cache::DataStore;
use ev_dashboard::data::filter::{display_rows, filter, FilterParams};
use ev_dashboard::data::model::{OptionalColumns, VehicleTable};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Pages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    #[default]
    Overview,
    Range,
    Manufacturers,
    Data,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Overview, Page::Range, Page::Manufacturers, Page::Data];

    pub fn title(self) -> &'static str {
        match self {
            Page::Overview => "Overview",
            Page::Range => "Range",
            Page::Manufacturers => "Manufacturers",
            Page::Data => "Data",
        }
    }
}

/// Which set-valued filter a widget edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetFilter {
    Makes,
    VehicleTypes,
    Counties,
}

impl SetFilter {
    pub fn selected(self, params: &FilterParams) -> &BTreeSet<String> {
        match self {
            SetFilter::Makes => &params.makes,
            SetFilter::VehicleTypes => &params.vehicle_types,
            SetFilter::Counties => &params.counties,
        }
    }

    fn selected_mut(self, params: &mut FilterParams) -> &mut BTreeSet<String> {
        match self {
            SetFilter::Makes => &mut params.makes,
            SetFilter::VehicleTypes => &mut params.vehicle_types,
            SetFilter::Counties => &mut params.counties,
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state for one session, independent of rendering.
///
/// The base table is shared and read-only. Every change goes through
/// [`AppState::apply`], which swaps in a new [`FilterParams`] value and
/// recomputes the derived tables synchronously.
pub struct AppState {
    pub config: DashboardConfig,
    store: DataStore,

    /// Cleaned base table (empty until a file loads).
    pub base: Arc<VehicleTable>,

    /// Current filter selections.
    pub params: FilterParams,

    /// Rows passing `params`; aggregates always use this.
    pub filtered: VehicleTable,

    /// `filtered`, sampled for point-based charts when sampling is on.
    pub display: VehicleTable,

    pub metrics: SummaryMetrics,

    /// Draw at most `config.sample_cap` points.
    pub use_sample: bool,

    pub page: Page,

    /// Colours per vehicle type.
    pub type_colors: ColorMap,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        let store = DataStore::new(&config.data_path, config.cache_ttl());
        Self {
            config,
            store,
            base: Arc::new(VehicleTable::default()),
            params: FilterParams::default(),
            filtered: VehicleTable::default(),
            display: VehicleTable::default(),
            metrics: SummaryMetrics::default(),
            use_sample: true,
            page: Page::default(),
            type_colors: ColorMap::default(),
            status_message: None,
        }
    }

    /// Fetch the base table from the store. A missing file leaves an empty
    /// dashboard with a message instead of failing.
    pub fn reload(&mut self) {
        match self.store.table() {
            Ok(table) => {
                if let Some(report) = self.store.last_report() {
                    log::info!(
                        "{}: {} vehicles loaded, {} rows dropped during cleaning",
                        self.store.path().display(),
                        report.kept,
                        report.dropped()
                    );
                }
                self.status_message = None;
                self.replace_base(table, false);
            }
            Err(e) => {
                log::error!("Failed to load data: {e}");
                self.status_message = Some(if e.is_unavailable() {
                    format!("Data unavailable: {e}. Showing an empty dataset.")
                } else {
                    format!("Error: {e}")
                });
                self.replace_base(Arc::new(VehicleTable::empty(OptionalColumns::default())), false);
            }
        }
    }

    /// Drop the cached table and read the file again.
    pub fn refresh(&mut self) {
        self.store.invalidate();
        self.reload();
    }

    /// Swap in a fresh base table once the cache TTL runs out, keeping the
    /// current filter selections.
    pub fn refresh_if_expired(&mut self) {
        if !self.store.is_expired() {
            return;
        }
        match self.store.table() {
            Ok(table) => {
                log::info!("Base table refreshed ({} vehicles)", table.len());
                self.replace_base(table, true);
            }
            Err(e) => {
                // Wait a full interval before trying again.
                self.store.touch();
                log::warn!("Refresh failed, keeping previous data: {e}");
                self.status_message = Some(format!("Refresh failed: {e}"));
            }
        }
    }

    /// Point the store at another file and load it.
    pub fn open(&mut self, path: &Path) {
        self.config.data_path = path.to_path_buf();
        self.store = DataStore::new(path, self.config.cache_ttl());
        self.reload();
    }

    /// Ingest a base table and rebuild colours, optionally clearing filters.
    fn replace_base(&mut self, table: Arc<VehicleTable>, keep_filters: bool) {
        self.type_colors = ColorMap::new(&table.vehicle_types);
        self.base = table;
        if !keep_filters {
            self.params = FilterParams::default();
        }
        self.recompute();
    }

    /// Replace the filter parameters; recompute only when they changed.
    pub fn apply(&mut self, params: FilterParams) {
        if params != self.params {
            self.params = params;
            self.recompute();
        }
    }

    pub fn set_sampling(&mut self, enabled: bool) {
        if enabled != self.use_sample {
            self.use_sample = enabled;
            self.display = self.sampled();
        }
    }

    /// Toggle one value of a set filter.
    pub fn toggle(&mut self, which: SetFilter, value: &str) {
        let mut next = self.params.clone();
        let set = which.selected_mut(&mut next);
        if !set.remove(value) {
            set.insert(value.to_string());
        }
        self.apply(next);
    }

    /// Clear a set filter, which shows every value.
    pub fn clear(&mut self, which: SetFilter) {
        let mut next = self.params.clone();
        which.selected_mut(&mut next).clear();
        self.apply(next);
    }

    /// Whether the display table is a sample of the filtered rows.
    pub fn is_sampled(&self) -> bool {
        self.display.len() < self.filtered.len()
    }

    fn sampled(&self) -> VehicleTable {
        display_rows(
            &self.filtered,
            self.config.sample_cap,
            self.config.sample_seed,
            self.use_sample,
        )
    }

    fn recompute(&mut self) {
        self.filtered = filter(&self.base, &self.params);
        self.display = self.sampled();
        self.metrics = SummaryMetrics::compute(&self.filtered);
        log::debug!(
            "Filtered {} of {} vehicles, displaying {}",
            self.filtered.len(),
            self.base.len(),
            self.display.len()
        );
    }
}
