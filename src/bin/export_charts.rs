//! Writes the static chart pages for the vehicle dataset.
//!
//! Usage: `export_charts [DATA_PATH] [OUT_DIR...]`

use std::path::PathBuf;

use anyhow::{bail, Result};
use ev_dashboard::config::DashboardConfig;
use ev_dashboard::data::loader::load_file;
use ev_dashboard::export::export_all;

fn main() -> Result<()> {
    env_logger::init();

    let mut config = DashboardConfig::load()?;
    let mut args = std::env::args_os().skip(1);
    if let Some(path) = args.next() {
        config.data_path = PathBuf::from(path);
    }
    let extra: Vec<PathBuf> = args.map(PathBuf::from).collect();
    if !extra.is_empty() {
        config.export_dirs = extra;
    }

    let (table, report) = match load_file(&config.data_path) {
        Ok(loaded) => loaded,
        Err(e) if e.is_unavailable() => {
            bail!("cannot export charts: {e}");
        }
        Err(e) => return Err(e.into()),
    };
    log::info!(
        "{} of {} rows kept ({} missing fields, {} bad years, {} bad ranges, {} bad prices)",
        report.kept,
        report.rows_read,
        report.missing_required,
        report.bad_year,
        report.bad_range,
        report.bad_price
    );

    let written = export_all(&table, &config.export_dirs)?;
    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}
