use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{DataType, Float32Type, Float64Type, Int32Type, Int64Type};
use arrow::util::display::array_value_to_string;
use log::info;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::error::LoadError;
use super::model::{canonical_column, Cell, RawRecord, RawTable, CATEGORY_COLUMNS};

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

static SOURCE: OnceLock<Result<RawTable, LoadError>> = OnceLock::new();

/// Load the listings source once per process.
///
/// The first call reads `path`; every later call returns that same outcome,
/// success or failure, and ignores its own `path`. Concurrent first calls
/// block until the single read completes.
pub fn load(path: &Path) -> Result<&'static RawTable, LoadError> {
    SOURCE
        .get_or_init(|| load_file(path))
        .as_ref()
        .map_err(LoadError::clone)
}

/// Read a listings table from a file, uncached. Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row plus one row per listing (recommended)
/// * `.parquet` – one column per attribute, as written by Pandas or Polars
/// * `.json`    – `[{ "Price": 1000, "District": "...", ... }, ...]`
pub fn load_file(path: &Path) -> Result<RawTable, LoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parse: fn(&Path) -> Result<RawTable> = match ext.as_str() {
        "csv" => load_csv,
        "parquet" | "pq" => load_parquet,
        "json" => load_json,
        other => return Err(LoadError::UnsupportedFormat(other.to_owned())),
    };

    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => {}
        Ok(_) => {
            return Err(LoadError::Unreadable {
                path: path.to_path_buf(),
                reason: "not a regular file".to_owned(),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(LoadError::Missing {
                path: path.to_path_buf(),
            })
        }
        Err(e) => {
            return Err(LoadError::Unreadable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    }

    let table = parse(path).map_err(|e| LoadError::Malformed {
        path: path.to_path_buf(),
        reason: format!("{e:#}"),
    })?;

    info!(
        "Loaded {} rows with columns {:?} from {}",
        table.len(),
        table.columns,
        path.display()
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Field values read as missing, as Pandas' `read_csv` does by default.
const CSV_NULL_MARKERS: [&str; 13] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
];

/// CSV layout: header row with column names, one listing per row.
/// Empty fields and null markers are read as nulls; category columns stay
/// text and everything else is type-guessed.
fn load_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(canonical_column)
        .collect();

    let mut records = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let cells: RawRecord = headers
            .iter()
            .zip(record.iter())
            .map(|(col, value)| (col.clone(), csv_cell(col, value)))
            .collect();

        records.push(cells);
    }

    Ok(RawTable::with_columns(headers, records))
}

fn csv_cell(column: &str, value: &str) -> Cell {
    let value = value.trim();
    if CSV_NULL_MARKERS.contains(&value) {
        Cell::Null
    } else if CATEGORY_COLUMNS.contains(&column) {
        Cell::Text(value.to_owned())
    } else {
        guess_cell(value)
    }
}

fn guess_cell(s: &str) -> Cell {
    let s = s.trim();
    if s.is_empty() {
        return Cell::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Cell::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return if f.is_finite() { Cell::Float(f) } else { Cell::Null };
    }
    if s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("false") {
        return Cell::Bool(s.eq_ignore_ascii_case("true"));
    }
    Cell::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Price": 930000, "Size": 47, "District": "Artur Alvim/São Paulo", "Negotiation Type": "rent" },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let rows = root.as_array().context("Expected top-level JSON array")?;

    let mut records = Vec::with_capacity(rows.len());

    for (i, row) in rows.iter().enumerate() {
        let obj = row
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let cells: RawRecord = obj
            .iter()
            .map(|(key, val)| (canonical_column(key), json_to_cell(val)))
            .collect();

        records.push(cells);
    }

    Ok(RawTable::from_records(records))
}

fn json_to_cell(val: &JsonValue) -> Cell {
    match val {
        JsonValue::String(s) if s.trim().is_empty() => Cell::Null,
        JsonValue::String(s) => Cell::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Cell::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Cell::Float(f)
            } else {
                Cell::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => Cell::Bool(*b),
        JsonValue::Null => Cell::Null,
        other => Cell::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per listing attribute.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let columns: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| canonical_column(f.name()))
        .collect();

    let reader = builder.build().context("building parquet reader")?;

    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        for row in 0..batch.num_rows() {
            let cells: RawRecord = columns
                .iter()
                .enumerate()
                .map(|(col_idx, col_name)| {
                    (col_name.clone(), extract_cell(batch.column(col_idx), row))
                })
                .collect();
            records.push(cells);
        }
    }

    Ok(RawTable::with_columns(columns, records))
}

/// Extract a single cell from an Arrow column at a given row.
fn extract_cell(col: &ArrayRef, row: usize) -> Cell {
    if col.is_null(row) {
        return Cell::Null;
    }
    let cell = match col.data_type() {
        DataType::Utf8 => col.as_string_opt::<i32>().map(|a| text_cell(a.value(row))),
        DataType::LargeUtf8 => col.as_string_opt::<i64>().map(|a| text_cell(a.value(row))),
        DataType::Utf8View => col.as_string_view_opt().map(|a| text_cell(a.value(row))),
        DataType::Int32 => col
            .as_primitive_opt::<Int32Type>()
            .map(|a| Cell::Integer(a.value(row) as i64)),
        DataType::Int64 => col
            .as_primitive_opt::<Int64Type>()
            .map(|a| Cell::Integer(a.value(row))),
        DataType::Float32 => col
            .as_primitive_opt::<Float32Type>()
            .map(|a| Cell::Float(a.value(row) as f64)),
        DataType::Float64 => col
            .as_primitive_opt::<Float64Type>()
            .map(|a| Cell::Float(a.value(row))),
        DataType::Boolean => col.as_boolean_opt().map(|a| Cell::Bool(a.value(row))),
        _ => None,
    };
    // Anything else is kept as its display text; the processor decides
    // whether it is usable.
    cell.unwrap_or_else(|| {
        array_value_to_string(col, row)
            .map(|s| guess_cell(&s))
            .unwrap_or(Cell::Null)
    })
}

fn text_cell(s: &str) -> Cell {
    if s.trim().is_empty() {
        Cell::Null
    } else {
        Cell::Text(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::tempdir;

    const CSV: &str = "\
Price,Condo,Size,Rooms,Toilets,Suites,Parking,Elevator,Furnished,Swimming Pool,New,District,Negotiation Type,Property Type,Latitude,Longitude
930,220,47,2,2,1,1,0,0,0,0,Artur Alvim/São Paulo,rent,apartment,-23.54,-46.48
1000,,45,2,2,,1,1,0,0,0,Artur Alvim/São Paulo,rent,apartment,,
";

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        write!(file, "{contents}").unwrap();
        path
    }

    #[test]
    fn test_load_csv_canonicalises_headers_and_nulls() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "listings.csv", CSV);

        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.has_column("negotiation_type"));
        assert!(table.has_column("swimming_pool"));
        assert!(table.has_column("new"));

        let second = &table.records[1];
        assert_eq!(second["condo"], Cell::Null);
        assert_eq!(second["latitude"], Cell::Null);
        assert_eq!(second["price"], Cell::Integer(1000));
        assert_eq!(second["negotiation_type"], Cell::Text("rent".into()));
        assert_eq!(table.records[0]["latitude"], Cell::Float(-23.54));
    }

    #[test]
    fn test_load_csv_header_only_keeps_schema() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "empty.csv", "Price,Size,Negotiation Type\n");

        let table = load_file(&path).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns, vec!["price", "size", "negotiation_type"]);
    }

    #[test]
    fn test_load_csv_null_markers_and_category_text() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "markers.csv",
            "Price,Size,Negotiation Type,Property Type,District\n\
             1000,nan,NaN,01,123\n\
             2000,inf,sale,house,N/A\n",
        );

        let table = load_file(&path).unwrap();
        let first = &table.records[0];
        assert_eq!(first["size"], Cell::Null);
        assert_eq!(first["negotiation_type"], Cell::Null);
        assert_eq!(first["property_type"], Cell::Text("01".into()));
        assert_eq!(first["district"], Cell::Text("123".into()));

        let second = &table.records[1];
        assert_eq!(second["size"], Cell::Null);
        assert_eq!(second["district"], Cell::Null);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_file(&dir.path().join("nope.csv")).unwrap_err();
        assert!(matches!(err, LoadError::Missing { .. }));
    }

    #[test]
    fn test_load_unsupported_extension() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "listings.xlsx", "");
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "xlsx"));
    }

    #[test]
    fn test_load_ragged_csv_is_malformed() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "ragged.csv", "Price,Size\n1,2\n3\n");
        let err = load_file(&path).unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }

    #[test]
    fn test_load_json_records() {
        let dir = tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "listings.json",
            r#"[{"Price": 300000.5, "Size": 100, "Negotiation Type": "Sale", "Elevator": true},
                {"Price": 2000, "Size": 50, "Negotiation Type": null}]"#,
        );

        let table = load_file(&path).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records[0]["price"], Cell::Float(300000.5));
        assert_eq!(table.records[0]["elevator"], Cell::Bool(true));
        assert_eq!(table.records[1]["negotiation_type"], Cell::Null);
    }

    #[test]
    fn test_load_json_rejects_non_array() {
        let dir = tempdir().unwrap();
        let path = write_file(dir.path(), "listings.json", r#"{"Price": 1}"#);
        assert!(matches!(
            load_file(&path).unwrap_err(),
            LoadError::Malformed { .. }
        ));
    }

    #[test]
    fn test_load_parquet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("listings.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("Price", DataType::Float64, true),
            Field::new("Size", DataType::Int64, true),
            Field::new("Negotiation Type", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Float64Array::from(vec![Some(300000.0), None])),
                Arc::new(Int64Array::from(vec![100, 50])),
                Arc::new(StringArray::from(vec![Some("sale"), None])),
            ],
        )
        .unwrap();
        let file = File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.columns, vec!["price", "size", "negotiation_type"]);
        assert_eq!(table.records[0]["price"], Cell::Float(300000.0));
        assert_eq!(table.records[1]["price"], Cell::Null);
        assert_eq!(table.records[1]["size"], Cell::Integer(50));
        assert_eq!(table.records[0]["negotiation_type"], Cell::Text("sale".into()));
    }

    #[test]
    fn test_load_is_cached_for_the_process() {
        let dir = tempdir().unwrap();
        let first = write_file(dir.path(), "first.csv", "Price,Size\n1,2\n");
        let second = write_file(dir.path(), "second.csv", "Price,Size\n1,2\n3,4\n");

        let a = load(&first).unwrap();
        let b = load(&second).unwrap();
        assert!(std::ptr::eq(a, b));
        assert_eq!(b.len(), 1);
    }
}
