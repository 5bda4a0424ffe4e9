//! Writes a synthetic vehicle registration CSV for trying out the dashboard.
//!
//! Usage: `generate_sample [OUT] [ROWS]`
//!
//! A few rows are deliberately malformed so the loader's cleaning path has
//! something to drop.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const HEADER: [&str; 9] = [
    "Model Year",
    "Make",
    "Model",
    "Electric Vehicle Type",
    "Electric Range",
    "Base MSRP",
    "County",
    "City",
    "Clean Alternative Fuel Vehicle (CAFV) Eligibility",
];

/// (make, model, vehicle type, typical range, typical price)
const MODELS: &[(&str, &str, &str, f64, f64)] = &[
    ("TESLA", "MODEL 3", "Battery Electric Vehicle (BEV)", 280.0, 45_000.0),
    ("TESLA", "MODEL Y", "Battery Electric Vehicle (BEV)", 300.0, 52_000.0),
    ("TESLA", "MODEL S", "Battery Electric Vehicle (BEV)", 370.0, 89_000.0),
    ("NISSAN", "LEAF", "Battery Electric Vehicle (BEV)", 150.0, 29_000.0),
    ("CHEVROLET", "BOLT EV", "Battery Electric Vehicle (BEV)", 250.0, 33_000.0),
    ("CHEVROLET", "VOLT", "Plug-in Hybrid Electric Vehicle (PHEV)", 50.0, 34_000.0),
    ("KIA", "NIRO", "Plug-in Hybrid Electric Vehicle (PHEV)", 26.0, 30_000.0),
    ("FORD", "MUSTANG MACH-E", "Battery Electric Vehicle (BEV)", 270.0, 48_000.0),
    ("BMW", "I3", "Battery Electric Vehicle (BEV)", 150.0, 46_000.0),
    ("TOYOTA", "PRIUS PRIME", "Plug-in Hybrid Electric Vehicle (PHEV)", 25.0, 28_000.0),
    ("PORSCHE", "TAYCAN", "Battery Electric Vehicle (BEV)", 220.0, 95_000.0),
];

const PLACES: &[(&str, &str)] = &[
    ("King", "Seattle"),
    ("King", "Bellevue"),
    ("Snohomish", "Everett"),
    ("Pierce", "Tacoma"),
    ("Clark", "Vancouver"),
    ("Thurston", "Olympia"),
    ("Spokane", "Spokane"),
];

const CAFV: [&str; 3] = [
    "Clean Alternative Fuel Vehicle Eligible",
    "Not eligible due to low battery range",
    "Eligibility unknown as battery range has not been researched",
];

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let out = args
        .next()
        .unwrap_or_else(|| "data/electric_vehicle_population.csv".to_string());
    let rows: usize = match args.next() {
        Some(n) => n.parse().with_context(|| format!("invalid row count {n:?}"))?,
        None => 20_000,
    };

    if let Some(parent) = std::path::Path::new(&out).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating {}", parent.display()))?;
        }
    }

    let mut rng = StdRng::seed_from_u64(42);
    let mut writer =
        csv::Writer::from_path(&out).with_context(|| format!("creating {out}"))?;
    writer.write_record(HEADER)?;

    let mut dirty = 0usize;
    for i in 0..rows {
        let (make, model, vehicle_type, range, price) = *MODELS
            .choose(&mut rng)
            .context("no models to sample")?;
        let (county, city) = *PLACES.choose(&mut rng).context("no places to sample")?;

        // Newer years are more common and have more range.
        let year: i32 = 2011 + (rng.gen::<f64>().sqrt() * 13.0) as i32;
        let age_factor = 0.75 + 0.25 * (year - 2011) as f64 / 12.0;
        let electric_range = (range * age_factor * rng.gen_range(0.85..1.15)).round();
        let msrp = (price * rng.gen_range(0.9..1.1) / 100.0).round() * 100.0;
        let cafv = if electric_range >= 30.0 { CAFV[0] } else { CAFV[1] };

        let mut record = vec![
            year.to_string(),
            make.to_string(),
            model.to_string(),
            vehicle_type.to_string(),
            electric_range.to_string(),
            msrp.to_string(),
            county.to_string(),
            city.to_string(),
            cafv.to_string(),
        ];

        // Roughly one row in a hundred is broken in some way.
        if i % 97 == 13 {
            match rng.gen_range(0..5) {
                0 => record[0] = "unknown".to_string(),
                1 => record[4] = "0".to_string(),
                2 => record[4] = String::new(),
                3 => record[5] = "N/A".to_string(),
                _ => record[1] = String::new(),
            }
            dirty += 1;
        }
        if i % 41 == 7 {
            record[8] = CAFV[2].to_string();
        }

        writer.write_record(&record)?;
    }
    writer.flush()?;

    log::info!("{dirty} rows carry deliberate defects");
    println!("Wrote {rows} vehicles to {out}");
    Ok(())
}
