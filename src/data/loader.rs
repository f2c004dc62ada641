use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use log::{debug, info};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{Column, Table};
use crate::error::PrepError;

/// Cell spellings read as missing values (compared after trimming).
const NULL_MARKERS: &[&str] = &["", "NA", "N/A", "n/a", "NaN", "nan", "NULL", "null", "None"];

// ---------------------------------------------------------------------------
// Source – where a raw table comes from
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Path(PathBuf),
    Url(String),
}

impl Source {
    /// `http://` and `https://` strings become URLs, everything else a path.
    pub fn parse(s: &str) -> Self {
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Url(s.to_string())
        } else {
            Source::Path(PathBuf::from(s))
        }
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Source::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Source::Path(path)
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(p) => write!(f, "{}", p.display()),
            Source::Url(u) => write!(f, "{u}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load a raw table from `source`. Any failure is reported as
/// [`PrepError::Load`] naming the source.
pub fn load_table(source: &Source) -> crate::error::Result<Table> {
    let loaded = match source {
        Source::Path(path) => load_file(path),
        Source::Url(url) => load_url(url),
    };
    let table = loaded.map_err(|cause| PrepError::Load {
        source_name: source.to_string(),
        cause,
    })?;
    info!(
        "loaded {source}: {} rows × {} columns",
        table.n_rows(),
        table.n_cols()
    );
    Ok(table)
}

/// Load a table from a file.  Dispatch by extension; unknown extensions are
/// read as CSV.
///
/// Supported formats:
/// * `.csv`     – header row, comma-delimited
/// * `.json`    – `[{ "col": value, ... }, ...]` (records orient)
/// * `.parquet` – flat columns of strings, ints, floats or bools
pub fn load_file(path: &Path) -> Result<Table> {
    if !path.exists() {
        bail!("file does not exist");
    }
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        _ => {
            let file = std::fs::File::open(path).context("opening CSV")?;
            load_csv(file)
        }
    }
}

// ---------------------------------------------------------------------------
// Remote fetch
// ---------------------------------------------------------------------------

#[cfg(feature = "remote")]
fn load_url(url: &str) -> Result<Table> {
    let client = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("building HTTP client")?;
    let response = client
        .get(url)
        .send()
        .context("sending request")?
        .error_for_status()
        .context("server returned an error status")?;
    let bytes = response.bytes().context("reading response body")?;
    debug!("fetched {} bytes from {url}", bytes.len());
    load_csv(bytes.as_ref())
}

#[cfg(not(feature = "remote"))]
fn load_url(_url: &str) -> Result<Table> {
    bail!("built without the `remote` feature; download the file and pass a path instead")
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one entity per row. Column types
/// are inferred: a column is numeric when every present cell parses as a float,
/// otherwise it is text.
fn load_csv<R: Read>(input: R) -> Result<Table> {
    let mut reader = csv::Reader::from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();
    if headers.is_empty() {
        bail!("CSV has no header row");
    }

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        for (col_idx, value) in record.iter().enumerate() {
            cells[col_idx].push(parse_cell(value));
        }
    }
    // The reader is dropped here, releasing the underlying handle.
    drop(reader);

    let columns = headers.into_iter().zip(cells).map(|(name, values)| {
        let column = infer_column(values);
        debug!("column '{name}' inferred as {}", column.kind());
        (name, column)
    });
    Table::from_columns(columns).context("assembling table")
}

fn parse_cell(s: &str) -> Option<String> {
    if NULL_MARKERS.contains(&s.trim()) {
        None
    } else {
        Some(s.to_string())
    }
}

fn infer_column(values: Vec<Option<String>>) -> Column {
    let numeric: Option<Vec<Option<f64>>> = values
        .iter()
        .map(|cell| match cell {
            None => Some(None),
            Some(s) => s.trim().parse::<f64>().ok().map(Some),
        })
        .collect();
    match numeric {
        Some(v) => Column::Numeric(v),
        None => Column::Text(values),
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "unitid": 100654, "state": "Alabama", "grad_150_value": 29.1 },
///   ...
/// ]
/// ```
///
/// Columns appear in first-seen key order; a key absent from a record is a
/// missing cell.
fn load_json(path: &Path) -> Result<Table> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut names: Vec<String> = Vec::new();
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let columns = names.iter().map(|name| {
        let values: Vec<Option<&JsonValue>> = records
            .iter()
            .map(|rec| rec.get(name).filter(|v| !v.is_null()))
            .collect();
        (name.clone(), json_column(&values))
    });
    Table::from_columns(columns).context("assembling table")
}

fn json_column(values: &[Option<&JsonValue>]) -> Column {
    let all_numbers = values.iter().flatten().all(|v| v.is_number());
    if all_numbers {
        return Column::Numeric(values.iter().map(|v| v.and_then(JsonValue::as_f64)).collect());
    }
    Column::Text(
        values
            .iter()
            .map(|v| {
                v.map(|v| match v {
                    JsonValue::String(s) => s.clone(),
                    other => other.to_string(),
                })
            })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of flat columns.
///
/// Utf8 / LargeUtf8 columns become text, integer and float columns become
/// numeric, and booleans become text (`"true"` / `"false"`). Works with files
/// written by both **Pandas** (`df.to_parquet()`) and **Polars**
/// (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<(String, Column)> = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        if columns.is_empty() {
            for field in schema.fields() {
                let empty = match field.data_type() {
                    DataType::Utf8 | DataType::LargeUtf8 | DataType::Boolean => {
                        Column::Text(Vec::new())
                    }
                    DataType::Int32 | DataType::Int64 | DataType::Float32 | DataType::Float64 => {
                        Column::Numeric(Vec::new())
                    }
                    other => bail!("column '{}': unsupported type {other:?}", field.name()),
                };
                columns.push((field.name().clone(), empty));
            }
        }

        for (idx, (name, column)) in columns.iter_mut().enumerate() {
            append_arrow(column, batch.column(idx))
                .with_context(|| format!("column '{name}'"))?;
        }
    }

    Table::from_columns(columns).context("assembling table")
}

// -- Parquet / Arrow helpers --

/// Append every row of an Arrow array onto an accumulating column.
fn append_arrow(column: &mut Column, array: &ArrayRef) -> Result<()> {
    let n = array.len();
    match (column, array.data_type()) {
        (Column::Text(out), DataType::Utf8) => {
            let arr = array.as_string::<i32>();
            out.extend((0..n).map(|i| (!arr.is_null(i)).then(|| arr.value(i).to_string())));
        }
        (Column::Text(out), DataType::LargeUtf8) => {
            let arr = array.as_string::<i64>();
            out.extend((0..n).map(|i| (!arr.is_null(i)).then(|| arr.value(i).to_string())));
        }
        (Column::Text(out), DataType::Boolean) => {
            let arr = array.as_boolean();
            out.extend((0..n).map(|i| (!arr.is_null(i)).then(|| arr.value(i).to_string())));
        }
        (Column::Numeric(out), DataType::Int32) => {
            let arr = array.as_primitive::<Int32Type>();
            out.extend(arr.iter().map(|v| v.map(f64::from)));
        }
        (Column::Numeric(out), DataType::Int64) => {
            let arr = array.as_primitive::<Int64Type>();
            out.extend(arr.iter().map(|v| v.map(|x| x as f64)));
        }
        (Column::Numeric(out), DataType::Float32) => {
            let arr = array.as_primitive::<Float32Type>();
            out.extend(arr.iter().map(|v| v.map(f64::from)));
        }
        (Column::Numeric(out), DataType::Float64) => {
            let arr = array.as_primitive::<Float64Type>();
            out.extend(arr.iter());
        }
        (_, other) => bail!("type changed between record batches (now {other:?})"),
    }
    Ok(())
}
