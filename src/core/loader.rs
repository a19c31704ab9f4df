use crate::domain::model::{Cell, Column, ColumnKind, Table};
use crate::utils::dates::parse_datetime;
use crate::utils::error::{LoadFailure, ReportError, Result};
use calamine::{Data, Reader, Xlsx};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::io::Cursor;
use std::path::Path;

type ParseResult<T> = std::result::Result<T, LoadFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Json,
    /// Tab-delimited, falling back to comma-delimited.
    Txt,
}

impl FileFormat {
    /// Detects the format from the file extension, ignoring case.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_lowercase()))
            .unwrap_or_default();

        match extension.as_str() {
            ".csv" => Ok(FileFormat::Csv),
            ".xlsx" => Ok(FileFormat::Xlsx),
            ".json" => Ok(FileFormat::Json),
            ".txt" => Ok(FileFormat::Txt),
            _ => Err(ReportError::UnsupportedFormat { extension }),
        }
    }
}

pub struct FileLoader;

impl FileLoader {
    /// Reads and parses `path`. Any failure after format detection is a `LoadError`.
    pub fn load(path: &Path) -> Result<Table> {
        let format = FileFormat::from_path(path)?;
        let bytes =
            std::fs::read(path).map_err(|e| ReportError::load(path.display().to_string(), e))?;
        Self::parse(path, format, &bytes)
    }

    /// Parses already-read file contents, using `path` only for format detection.
    pub fn parse_bytes(path: &Path, bytes: &[u8]) -> Result<Table> {
        let format = FileFormat::from_path(path)?;
        Self::parse(path, format, bytes)
    }

    fn parse(path: &Path, format: FileFormat, bytes: &[u8]) -> Result<Table> {
        let table = match format {
            FileFormat::Csv => parse_delimited(bytes, b',', false),
            FileFormat::Xlsx => parse_xlsx(bytes),
            FileFormat::Json => parse_json(bytes),
            FileFormat::Txt => match parse_delimited(bytes, b'\t', true) {
                Err(e) if e.is_parse_failure() => {
                    tracing::debug!(
                        "Tab-delimited parse of {} failed ({}), retrying with commas",
                        path.display(),
                        e
                    );
                    parse_delimited(bytes, b',', false)
                }
                other => other,
            },
        }
        .map_err(|source| ReportError::load(path.display().to_string(), source))?;

        tracing::debug!(
            "Loaded {} rows x {} columns from {}",
            table.row_count(),
            table.column_count(),
            path.display()
        );
        Ok(table)
    }
}

/// `require_delimiter` rejects input whose header holds a single field, so a
/// comma file read as tab-delimited fails instead of collapsing to one column.
fn parse_delimited(bytes: &[u8], delimiter: u8, require_delimiter: bool) -> ParseResult<Table> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);
    let mut records = reader.records();

    let header = match records.next() {
        Some(record) => record?,
        None => return Err(LoadFailure::malformed("no columns to parse from file")),
    };
    if require_delimiter && header.len() < 2 {
        return Err(LoadFailure::malformed(format!(
            "header contains no {:?} delimiter",
            delimiter as char
        )));
    }

    let names = column_names(header.iter().map(|h| h.trim_start_matches('\u{feff}')));
    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];

    for (index, record) in records.enumerate() {
        let record = record?;
        if record.len() > names.len() {
            return Err(LoadFailure::malformed(format!(
                "expected {} fields in line {}, saw {}",
                names.len(),
                index + 2,
                record.len()
            )));
        }
        for (i, column) in raw.iter_mut().enumerate() {
            let value = record.get(i).filter(|v| !v.trim().is_empty());
            column.push(value.map(str::to_string));
        }
    }

    let columns = names
        .into_iter()
        .zip(raw)
        .map(|(name, values)| Column::from_raw(name, values))
        .collect();
    build_table(columns)
}

fn parse_xlsx(bytes: &[u8]) -> ParseResult<Table> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LoadFailure::malformed("workbook contains no sheets"))??;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| LoadFailure::malformed("no columns to parse from file"))?;
    let names = column_names(header.iter().map(|cell| cell.to_string()));

    let mut cells: Vec<Vec<Cell>> = vec![Vec::new(); names.len()];
    for row in rows {
        for (i, column) in cells.iter_mut().enumerate() {
            column.push(row.get(i).map(spreadsheet_cell).unwrap_or(Cell::Null));
        }
    }

    let columns = names
        .into_iter()
        .zip(cells)
        .map(|(name, cells)| integral_floats_to_ints(Column::new(name, cells)))
        .collect();
    build_table(columns)
}

fn spreadsheet_cell(cell: &Data) -> Cell {
    match cell {
        Data::Int(i) => Cell::Int(*i),
        Data::Float(f) => Cell::Float(*f),
        Data::String(s) if s.trim().is_empty() => Cell::Null,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(dt) => dt.as_datetime().map(Cell::Date).unwrap_or(Cell::Null),
        Data::DateTimeIso(s) => parse_datetime(s)
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::Empty | Data::Error(_) => Cell::Null,
        other => Cell::Text(other.to_string()),
    }
}

/// Spreadsheets store every number as a float; whole-number columns become integers.
fn integral_floats_to_ints(column: Column) -> Column {
    let integral = column.kind() == ColumnKind::Numeric
        && column.non_null().all(|cell| match cell {
            Cell::Float(f) => f.fract() == 0.0 && f.abs() < i64::MAX as f64,
            _ => true,
        });
    if !integral {
        return column;
    }

    let cells = column
        .cells()
        .iter()
        .map(|cell| match cell {
            Cell::Float(f) if !f.is_nan() => Cell::Int(*f as i64),
            other => other.clone(),
        })
        .collect();
    Column::new(column.name(), cells)
}

fn parse_json(bytes: &[u8]) -> ParseResult<Table> {
    let value: Value = serde_json::from_slice(bytes)?;
    match value {
        Value::Array(items) => json_records(items),
        Value::Object(map) => json_columns(map),
        _ => Err(LoadFailure::malformed(
            "expected an array of records or an object of columns",
        )),
    }
}

fn json_records(items: Vec<Value>) -> ParseResult<Table> {
    let mut records = Vec::with_capacity(items.len());
    for item in items {
        match item {
            Value::Object(map) => records.push(map),
            other => {
                return Err(LoadFailure::malformed(format!(
                    "expected a JSON object per record, found {}",
                    other
                )))
            }
        }
    }

    let mut names: Vec<String> = Vec::new();
    for record in &records {
        for key in record.keys() {
            if !names.contains(key) {
                names.push(key.clone());
            }
        }
    }

    let columns = names
        .into_iter()
        .map(|name| {
            let cells = records
                .iter()
                .map(|r| r.get(&name).map(json_cell).unwrap_or(Cell::Null))
                .collect();
            Column::new(name, cells)
        })
        .collect();
    build_table(columns)
}

fn json_columns(map: Map<String, Value>) -> ParseResult<Table> {
    if map.values().all(Value::is_array) {
        let columns = map
            .into_iter()
            .map(|(name, values)| {
                let cells = match values {
                    Value::Array(items) => items.iter().map(json_cell).collect(),
                    _ => Vec::new(),
                };
                Column::new(name, cells)
            })
            .collect();
        return build_table(columns);
    }

    if map.values().all(Value::is_object) {
        let mut index: Vec<String> = Vec::new();
        for values in map.values() {
            if let Value::Object(rows) = values {
                for key in rows.keys() {
                    if !index.contains(key) {
                        index.push(key.clone());
                    }
                }
            }
        }

        let columns = map
            .iter()
            .map(|(name, values)| {
                let cells = index
                    .iter()
                    .map(|key| values.get(key).map(json_cell).unwrap_or(Cell::Null))
                    .collect();
                Column::new(name.clone(), cells)
            })
            .collect();
        return build_table(columns);
    }

    Err(LoadFailure::malformed(
        "object values must be all arrays or all objects",
    ))
}

fn json_cell(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Bool(b) => Cell::Bool(*b),
        Value::Number(n) => n
            .as_i64()
            .map(Cell::Int)
            .or_else(|| n.as_f64().map(Cell::Float))
            .unwrap_or(Cell::Null),
        Value::String(s) => Cell::Text(s.clone()),
        other => Cell::Text(other.to_string()),
    }
}

/// Blank names become `Unnamed: <i>`; repeats get `.1`, `.2`, ... suffixes.
fn column_names<S: AsRef<str>>(raw: impl Iterator<Item = S>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for (i, name) in raw.enumerate() {
        let name = name.as_ref();
        let base = if name.trim().is_empty() {
            format!("Unnamed: {}", i)
        } else {
            name.to_string()
        };

        let mut candidate = base.clone();
        let mut suffix = 1;
        while seen.contains(&candidate) {
            candidate = format!("{}.{}", base, suffix);
            suffix += 1;
        }
        seen.insert(candidate.clone());
        names.push(candidate);
    }

    names
}

fn build_table(columns: Vec<Column>) -> ParseResult<Table> {
    Table::new(columns).map_err(|e| LoadFailure::malformed(e.to_string()))
}
