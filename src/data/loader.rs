use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, bail};
use arrow::array::{
    Array, ArrayRef, Float32Array, Float64Array, LargeListArray, ListArray, new_empty_array,
};
use arrow::compute::concat;
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::NdBlock;
use crate::error::{Result, SpexError};

/// Column (Parquet) or key (JSON) holding the primary block.  Parquet files
/// without such a column fall back to their first column.
pub const DATA_COLUMN: &str = "data";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// On-disk container kinds, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    Parquet,
    Json,
    Csv,
}

impl ContainerFormat {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match ext.as_str() {
            "parquet" | "pq" => Some(ContainerFormat::Parquet),
            "json" => Some(ContainerFormat::Json),
            "csv" => Some(ContainerFormat::Csv),
            _ => None,
        }
    }
}

/// Read the primary numeric block of a spectrum container.
///
/// Supported formats:
/// * `.parquet` – a `List<Float>` column (2-D, one row per array) or a
///   `List<List<Float>>` column (3-D, the whole triple wrapped in one row)
/// * `.json`    – nested numeric arrays, top-level or under `"data"`
/// * `.csv`     – headerless, one record per row of a 2-D block
///
/// The file handle is dropped before returning.
pub fn load_block(path: &Path) -> Result<NdBlock> {
    let file = File::open(path).map_err(|source| SpexError::FileNotFound {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed = match ContainerFormat::from_path(path) {
        Some(ContainerFormat::Parquet) => parse_parquet(file),
        Some(ContainerFormat::Json) => parse_json(file),
        Some(ContainerFormat::Csv) => parse_csv(file),
        None => Err(anyhow::anyhow!(
            "unsupported container extension: {}",
            path.display()
        )),
    };

    let block = parsed.map_err(|e| SpexError::malformed(path, e))?;
    log::debug!("Read {} with block shape {:?}", path.display(), block.shape());
    Ok(block)
}

// ---------------------------------------------------------------------------
// Parquet
// ---------------------------------------------------------------------------

/// The block's dimensionality is one (the row axis) plus the list nesting
/// depth of the data column.  Leaves may be Float64 or Float32; list levels
/// may be List or LargeList.  Null leaves read as NaN.
fn parse_parquet(file: File) -> anyhow::Result<NdBlock> {
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let schema = builder.schema().clone();
    let col_idx = schema.index_of(DATA_COLUMN).unwrap_or(0);
    let field = schema
        .fields()
        .get(col_idx)
        .context("Parquet file has no columns")?
        .clone();
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<ArrayRef> = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        columns.push(batch.column(col_idx).clone());
    }

    let column = if columns.is_empty() {
        new_empty_array(field.data_type())
    } else {
        let parts: Vec<&dyn Array> = columns.iter().map(|c| c.as_ref()).collect();
        concat(&parts).context("joining record batches")?
    };

    let mut values = Vec::new();
    let shape = flatten_arrow(&column, &mut values)
        .with_context(|| format!("column '{}'", field.name()))?;
    NdBlock::new(shape, values).context("block shape does not match its values")
}

/// Append every leaf of `array` to `out` (row-major) and return its shape.
fn flatten_arrow(array: &ArrayRef, out: &mut Vec<f64>) -> anyhow::Result<Vec<usize>> {
    match array.data_type() {
        DataType::Float64 => {
            let arr = array
                .as_any()
                .downcast_ref::<Float64Array>()
                .context("expected Float64Array")?;
            out.extend(arr.iter().map(|v| v.unwrap_or(f64::NAN)));
            Ok(vec![arr.len()])
        }
        DataType::Float32 => {
            let arr = array
                .as_any()
                .downcast_ref::<Float32Array>()
                .context("expected Float32Array")?;
            out.extend(arr.iter().map(|v| v.unwrap_or(f32::NAN) as f64));
            Ok(vec![arr.len()])
        }
        DataType::List(inner) => {
            let list = array
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            let rows = list_rows(list.len(), |i| list.is_null(i), |i| list.value(i))?;
            flatten_rows(&rows, inner.data_type(), out)
        }
        DataType::LargeList(inner) => {
            let list = array
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            let rows = list_rows(list.len(), |i| list.is_null(i), |i| list.value(i))?;
            flatten_rows(&rows, inner.data_type(), out)
        }
        other => bail!("expected float or list values, got {other:?}"),
    }
}

fn list_rows(
    len: usize,
    is_null: impl Fn(usize) -> bool,
    value: impl Fn(usize) -> ArrayRef,
) -> anyhow::Result<Vec<ArrayRef>> {
    (0..len)
        .map(|i| {
            if is_null(i) {
                bail!("entry {i} is null");
            }
            Ok(value(i))
        })
        .collect()
}

fn flatten_rows(
    rows: &[ArrayRef],
    inner_type: &DataType,
    out: &mut Vec<f64>,
) -> anyhow::Result<Vec<usize>> {
    let mut inner: Option<Vec<usize>> = None;
    for (i, row) in rows.iter().enumerate() {
        let shape = flatten_arrow(row, out).with_context(|| format!("entry {i}"))?;
        match &inner {
            None => inner = Some(shape),
            Some(expected) if *expected != shape => {
                bail!("ragged block: entry {i} has shape {shape:?}, expected {expected:?}")
            }
            Some(_) => {}
        }
    }
    let inner = match inner {
        Some(shape) => shape,
        None => vec![0; arrow_depth(inner_type)?],
    };
    Ok(std::iter::once(rows.len()).chain(inner).collect())
}

/// Number of axes contributed by values of type `dt`.
fn arrow_depth(dt: &DataType) -> anyhow::Result<usize> {
    match dt {
        DataType::Float32 | DataType::Float64 => Ok(1),
        DataType::List(inner) | DataType::LargeList(inner) => {
            Ok(1 + arrow_depth(inner.data_type())?)
        }
        other => bail!("expected float or list values, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// JSON
// ---------------------------------------------------------------------------

/// Expected layout, either bare or wrapped as `{ "data": ... }`:
///
/// ```json
/// [[1.10, 1.11, ...], [3.2e-15, 3.1e-15, ...], [1e-17, 1e-17, ...]]
/// ```
///
/// `null` leaves read as NaN.
fn parse_json(file: File) -> anyhow::Result<NdBlock> {
    let mut text = String::new();
    BufReader::new(file)
        .read_to_string(&mut text)
        .context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let data = match &root {
        JsonValue::Object(obj) => obj
            .get(DATA_COLUMN)
            .with_context(|| format!("JSON object has no '{DATA_COLUMN}' key"))?,
        other => other,
    };
    if !data.is_array() {
        bail!("Expected a JSON array as the data block");
    }

    let mut values = Vec::new();
    let shape = flatten_json(data, &mut values, "data")?;
    NdBlock::new(shape, values).context("block shape does not match its values")
}

fn flatten_json(val: &JsonValue, out: &mut Vec<f64>, at: &str) -> anyhow::Result<Vec<usize>> {
    match val {
        JsonValue::Number(n) => {
            out.push(n.as_f64().with_context(|| format!("{at}: not a number"))?);
            Ok(Vec::new())
        }
        JsonValue::Null => {
            out.push(f64::NAN);
            Ok(Vec::new())
        }
        JsonValue::Array(items) => {
            let mut inner: Option<Vec<usize>> = None;
            for (j, item) in items.iter().enumerate() {
                let shape = flatten_json(item, out, &format!("{at}[{j}]"))?;
                match &inner {
                    None => inner = Some(shape),
                    Some(expected) if *expected != shape => {
                        bail!("ragged block at {at}[{j}]: shape {shape:?}, expected {expected:?}")
                    }
                    Some(_) => {}
                }
            }
            Ok(std::iter::once(items.len())
                .chain(inner.unwrap_or_default())
                .collect())
        }
        other => bail!("{at}: expected a number or array, got {other}"),
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// No header; record `r` is row `r` of a 2-D block.  Empty cells read as
/// NaN.  All records must have the same number of fields.
fn parse_csv(file: File) -> anyhow::Result<NdBlock> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(BufReader::new(file));

    let mut values = Vec::new();
    let mut rows = 0usize;
    let mut width = 0usize;

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if row_no == 0 {
            width = record.len();
        }
        for (j, tok) in record.iter().enumerate() {
            let tok = tok.trim();
            let v = if tok.is_empty() {
                f64::NAN
            } else {
                tok.parse::<f64>()
                    .with_context(|| format!("Row {row_no}, column {j}: '{tok}' is not a number"))?
            };
            values.push(v);
        }
        rows += 1;
    }

    NdBlock::new(vec![rows, width], values).context("CSV rows have unequal lengths")
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float32Builder, Float64Builder, ListBuilder};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use tempfile::TempDir;

    use super::*;

    fn write_text(dir: &TempDir, name: &str, text: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(text.as_bytes()).unwrap();
        path
    }

    fn write_batch(dir: &TempDir, name: &str, column: ArrayRef) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let schema = Arc::new(Schema::new(vec![Field::new(
            DATA_COLUMN,
            column.data_type().clone(),
            true,
        )]));
        let batch = RecordBatch::try_new(schema.clone(), vec![column]).unwrap();
        let mut writer = ArrowWriter::try_new(File::create(&path).unwrap(), schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        path
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ContainerFormat::from_path(Path::new("a.PQ")), Some(ContainerFormat::Parquet));
        assert_eq!(ContainerFormat::from_path(Path::new("a.json")), Some(ContainerFormat::Json));
        assert_eq!(ContainerFormat::from_path(Path::new("a.fits")), None);
    }

    #[test]
    fn parquet_2d_float32() {
        let dir = TempDir::new().unwrap();
        let mut builder = ListBuilder::new(Float32Builder::new());
        for row in [[1.0f32, 2.0], [3.0, 4.0], [0.5, 0.25]] {
            builder.values().append_slice(&row);
            builder.append(true);
        }
        let path = write_batch(&dir, "f32.parquet", Arc::new(builder.finish()));

        let block = load_block(&path).unwrap();
        assert_eq!(block.shape(), &[3, 2]);
        assert_eq!(block.lane(&[2]).unwrap(), &[0.5, 0.25]);
    }

    #[test]
    fn parquet_3d_nested_list() {
        let dir = TempDir::new().unwrap();
        let mut builder = ListBuilder::new(ListBuilder::new(Float64Builder::new()));
        for row in [[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]] {
            builder.values().values().append_slice(&row);
            builder.values().append(true);
        }
        builder.append(true);
        let path = write_batch(&dir, "nested.parquet", Arc::new(builder.finish()));

        let block = load_block(&path).unwrap();
        assert_eq!(block.shape(), &[1, 3, 2]);
        assert_eq!(block.lane(&[0, 1]).unwrap(), &[3.0, 4.0]);
    }

    #[test]
    fn parquet_ragged_rows_are_malformed() {
        let dir = TempDir::new().unwrap();
        let mut builder = ListBuilder::new(Float64Builder::new());
        builder.values().append_slice(&[1.0, 2.0]);
        builder.append(true);
        builder.values().append_slice(&[1.0]);
        builder.append(true);
        let path = write_batch(&dir, "ragged.parquet", Arc::new(builder.finish()));

        let err = load_block(&path).unwrap_err();
        assert!(err.to_string().contains("ragged"), "{err}");
    }

    #[test]
    fn json_bare_and_wrapped() {
        let dir = TempDir::new().unwrap();
        let bare = write_text(&dir, "bare.json", "[[1, 2], [3, 4], [5, null]]");
        let wrapped = write_text(&dir, "wrapped.json", r#"{"data": [[[1, 2], [3, 4], [5, 6]]]}"#);

        let block = load_block(&bare).unwrap();
        assert_eq!(block.shape(), &[3, 2]);
        assert!(block.lane(&[2]).unwrap()[1].is_nan());

        assert_eq!(load_block(&wrapped).unwrap().shape(), &[1, 3, 2]);
    }

    #[test]
    fn json_non_numeric_leaf_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write_text(&dir, "bad.json", r#"[[1, "two"], [3, 4], [5, 6]]"#);
        let err = load_block(&path).unwrap_err();
        assert!(matches!(err, SpexError::MalformedContainer { .. }));
        assert!(err.to_string().contains("data[0][1]"), "{err}");
    }

    #[test]
    fn csv_rows() {
        let dir = TempDir::new().unwrap();
        let path = write_text(&dir, "s.csv", "1.0,1.5,2.0\n3,4,\n0.1, 0.1 ,0.2\n");
        let block = load_block(&path).unwrap();
        assert_eq!(block.shape(), &[3, 3]);
        assert!(block.lane(&[1]).unwrap()[2].is_nan());
        assert_eq!(block.lane(&[2]).unwrap(), &[0.1, 0.1, 0.2]);
    }

    #[test]
    fn csv_unequal_rows_are_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write_text(&dir, "s.csv", "1,2,3\n4,5\n");
        assert!(matches!(
            load_block(&path).unwrap_err(),
            SpexError::MalformedContainer { .. }
        ));
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_block(Path::new("/no/such/spectrum.parquet")).unwrap_err();
        assert!(matches!(err, SpexError::FileNotFound { .. }));
    }

    #[test]
    fn unsupported_extension_is_malformed() {
        let dir = TempDir::new().unwrap();
        let path = write_text(&dir, "spectrum.fits", "SIMPLE = T");
        let err = load_block(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported container extension"));
    }
}
