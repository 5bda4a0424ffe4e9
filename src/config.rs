use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Env var naming a JSON config file.
pub const CONFIG_ENV: &str = "EV_DASHBOARD_CONFIG";
/// Config file picked up from the working directory when the env var is unset.
pub const DEFAULT_CONFIG_FILE: &str = "ev_dashboard.json";

// ---------------------------------------------------------------------------
// Dashboard configuration
// ---------------------------------------------------------------------------

/// Runtime settings shared by the dashboard and the exporter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Source CSV (or Parquet) file.
    pub data_path: PathBuf,
    /// Maximum rows drawn in point-based charts.
    pub sample_cap: usize,
    /// Seed for reproducible sampling.
    pub sample_seed: u64,
    /// Base table refresh interval in seconds; `0` loads once.
    pub cache_ttl_secs: u64,
    /// Directories receiving the exported chart pages.
    pub export_dirs: Vec<PathBuf>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/electric_vehicle_population.csv"),
            sample_cap: 5000,
            sample_seed: 42,
            cache_ttl_secs: 3600,
            export_dirs: vec![PathBuf::from("templates"), PathBuf::from("docs")],
        }
    }
}

impl DashboardConfig {
    /// Resolve the config: `$EV_DASHBOARD_CONFIG`, then `./ev_dashboard.json`,
    /// then defaults.
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }
        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::from_file(local);
        }
        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// TTL for the data cache; `None` means never refresh.
    pub fn cache_ttl(&self) -> Option<Duration> {
        (self.cache_ttl_secs > 0).then(|| Duration::from_secs(self.cache_ttl_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, r#"{ "sample_cap": 1000, "cache_ttl_secs": 0 }"#).unwrap();

        let cfg = DashboardConfig::from_file(&path).unwrap();
        assert_eq!(cfg.sample_cap, 1000);
        assert_eq!(cfg.sample_seed, 42);
        assert_eq!(cfg.cache_ttl(), None);
        assert_eq!(cfg.data_path, DashboardConfig::default().data_path);
    }

    #[test]
    fn malformed_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cfg.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = DashboardConfig::from_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("cfg.json"));
    }

    #[test]
    fn default_ttl_is_one_hour() {
        assert_eq!(
            DashboardConfig::default().cache_ttl(),
            Some(Duration::from_secs(3600))
        );
    }
}
