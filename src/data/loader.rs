use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Serialize;

use super::error::{DataError, Result};
use super::model::{OptionalColumns, PriceCategory, RangeCategory, VehicleRecord, VehicleTable};

// ---------------------------------------------------------------------------
// Source column names
// ---------------------------------------------------------------------------

pub const COL_MODEL_YEAR: &str = "Model Year";
pub const COL_MAKE: &str = "Make";
pub const COL_VEHICLE_TYPE: &str = "Electric Vehicle Type";
pub const COL_ELECTRIC_RANGE: &str = "Electric Range";
pub const COL_BASE_MSRP: &str = "Base MSRP";
pub const COL_COUNTY: &str = "County";
pub const COL_CITY: &str = "City";
pub const COL_CAFV: &str = "Clean Alternative Fuel Vehicle (CAFV) Eligibility";
pub const COL_MODEL: &str = "Model";

const REQUIRED: [&str; 4] = [COL_MODEL_YEAR, COL_MAKE, COL_VEHICLE_TYPE, COL_ELECTRIC_RANGE];

// ---------------------------------------------------------------------------
// Load report
// ---------------------------------------------------------------------------

/// Row accounting for one load. Dropped rows are data cleaning, not errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub missing_required: usize,
    pub bad_year: usize,
    pub bad_range: usize,
    pub bad_price: usize,
    pub kept: usize,
}

impl LoadReport {
    pub fn dropped(&self) -> usize {
        self.rows_read - self.kept
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load and clean the vehicle table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – the public registration export (recommended)
/// * `.parquet` – same column names, any string or numeric physical type
pub fn load_file(path: &Path) -> Result<(VehicleTable, LoadReport)> {
    if !path.exists() {
        log::warn!("Data file {} does not exist", path.display());
        return Err(DataError::DataUnavailable {
            path: path.to_path_buf(),
        });
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let (rows, columns) = match ext.as_str() {
        "csv" => read_csv(path)?,
        "parquet" | "pq" => read_parquet(path)?,
        other => {
            return Err(DataError::UnsupportedFormat {
                extension: other.to_string(),
            })
        }
    };

    let (table, report) = clean(rows, columns);
    log::info!(
        "Loaded {}: {} rows read, {} kept ({} missing required, {} bad year, {} bad range, {} bad price)",
        path.display(),
        report.rows_read,
        report.kept,
        report.missing_required,
        report.bad_year,
        report.bad_range,
        report.bad_price,
    );
    Ok((table, report))
}

// ---------------------------------------------------------------------------
// Raw rows: text cells before cleaning
// ---------------------------------------------------------------------------

/// One source row as optional text cells. `None` means null or empty.
#[derive(Debug, Clone, Default)]
struct RawRow {
    model_year: Option<String>,
    make: Option<String>,
    vehicle_type: Option<String>,
    electric_range: Option<String>,
    base_msrp: Option<String>,
    county: Option<String>,
    city: Option<String>,
    cafv: Option<String>,
    model: Option<String>,
}

/// Positions of the known columns in a header row.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    model_year: usize,
    make: usize,
    vehicle_type: usize,
    electric_range: usize,
    base_msrp: Option<usize>,
    county: Option<usize>,
    city: Option<usize>,
    cafv: Option<usize>,
    model: Option<usize>,
}

impl ColumnIndex {
    fn from_headers(headers: &[&str]) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.trim() == name);
        let require = |name: &str| {
            find(name).ok_or_else(|| DataError::MissingColumn {
                column: name.to_string(),
            })
        };

        Ok(ColumnIndex {
            model_year: require(REQUIRED[0])?,
            make: require(REQUIRED[1])?,
            vehicle_type: require(REQUIRED[2])?,
            electric_range: require(REQUIRED[3])?,
            base_msrp: find(COL_BASE_MSRP),
            county: find(COL_COUNTY),
            city: find(COL_CITY),
            cafv: find(COL_CAFV),
            model: find(COL_MODEL),
        })
    }

    fn columns(&self) -> OptionalColumns {
        OptionalColumns {
            model: self.model.is_some(),
            msrp: self.base_msrp.is_some(),
            county: self.county.is_some(),
            city: self.city.is_some(),
            cafv: self.cafv.is_some(),
        }
    }

    /// Build a raw row, reading each cell through `cell`.
    fn row(&self, cell: impl Fn(usize) -> Option<String>) -> RawRow {
        RawRow {
            model_year: cell(self.model_year),
            make: cell(self.make),
            vehicle_type: cell(self.vehicle_type),
            electric_range: cell(self.electric_range),
            base_msrp: self.base_msrp.and_then(&cell),
            county: self.county.and_then(&cell),
            city: self.city.and_then(&cell),
            cafv: self.cafv.and_then(&cell),
            model: self.model.and_then(&cell),
        }
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

/// CSV layout: header row with the source column names; extra columns ignored.
fn read_csv(path: &Path) -> Result<(Vec<RawRow>, OptionalColumns)> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let index = ColumnIndex::from_headers(&headers.iter().collect::<Vec<_>>())?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        rows.push(index.row(|i| record.get(i).and_then(non_empty)));
    }

    Ok((rows, index.columns()))
}

// ---------------------------------------------------------------------------
// Parquet reader
// ---------------------------------------------------------------------------

/// Load a Parquet file with the same column names as the CSV export.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn read_parquet(path: &Path) -> Result<(Vec<RawRow>, OptionalColumns)> {
    let file = std::fs::File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    let index = {
        let schema = builder.schema();
        let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
        ColumnIndex::from_headers(&names)?
    };
    let reader = builder.build()?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result?;
        for row in 0..batch.num_rows() {
            rows.push(index.row(|i| cell_text(batch.column(i), row)));
        }
    }

    Ok((rows, index.columns()))
}

/// Render a single Arrow cell as text so both formats share one cleaning path.
fn cell_text(col: &ArrayRef, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    let text = match col.data_type() {
        DataType::Utf8 => col.as_string::<i32>().value(row).to_string(),
        DataType::LargeUtf8 => col.as_string::<i64>().value(row).to_string(),
        DataType::Int32 => col.as_primitive::<Int32Type>().value(row).to_string(),
        DataType::Int64 => col.as_primitive::<Int64Type>().value(row).to_string(),
        DataType::Float32 => col.as_primitive::<Float32Type>().value(row).to_string(),
        DataType::Float64 => col.as_primitive::<Float64Type>().value(row).to_string(),
        _ => array_value_to_string(col, row).ok()?,
    };
    non_empty(&text)
}

// ---------------------------------------------------------------------------
// Cleaning
// ---------------------------------------------------------------------------

fn clean(rows: Vec<RawRow>, columns: OptionalColumns) -> (VehicleTable, LoadReport) {
    let mut report = LoadReport {
        rows_read: rows.len(),
        ..LoadReport::default()
    };

    let mut records = Vec::with_capacity(rows.len());
    for raw in rows {
        let (Some(year), Some(make), Some(vehicle_type), Some(range)) =
            (raw.model_year, raw.make, raw.vehicle_type, raw.electric_range)
        else {
            report.missing_required += 1;
            continue;
        };

        let Some(model_year) = parse_year(&year) else {
            report.bad_year += 1;
            continue;
        };

        let Some(electric_range) = parse_positive(&range) else {
            report.bad_range += 1;
            continue;
        };

        let base_msrp = if columns.msrp {
            match raw.base_msrp.as_deref().and_then(parse_positive) {
                Some(msrp) => Some(msrp),
                None => {
                    report.bad_price += 1;
                    continue;
                }
            }
        } else {
            None
        };

        records.push(VehicleRecord {
            model_year,
            make,
            model: raw.model,
            vehicle_type,
            electric_range,
            base_msrp,
            county: raw.county.as_deref().map(title_case),
            city: raw.city.as_deref().map(title_case),
            cafv_eligibility: raw.cafv,
            price_category: base_msrp.map(PriceCategory::from_msrp),
            range_category: RangeCategory::from_range(electric_range),
        });
    }

    report.kept = records.len();
    (VehicleTable::from_records(records, columns), report)
}

/// Integer years, or float text truncated toward zero ("2020.0" → 2020).
fn parse_year(s: &str) -> Option<i32> {
    if let Ok(y) = s.parse::<i32>() {
        return Some(y);
    }
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.abs() < i32::MAX as f64 {
        Some(f.trunc() as i32)
    } else {
        None
    }
}

/// A finite number strictly greater than zero.
fn parse_positive(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite() && *v > 0.0)
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
