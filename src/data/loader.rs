use std::collections::HashSet;
use std::fmt;
use std::io::Cursor;
use std::path::Path;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;

use super::model::{CellValue, Column, Table, TableError};

/// Column names coerced to dates unless the configuration says otherwise.
pub const DEFAULT_DATE_COLUMNS: [&str; 5] = [
    "Date de début",
    "Date de fin",
    "Date_Debut_Execution_relle",
    "Date_Engagement",
    "Date_Paiement",
];

/// CSV tokens read as missing values.
const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

// ---------------------------------------------------------------------------
// Options & errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Csv,
    Spreadsheet,
}

impl FileFormat {
    pub const ALL: [FileFormat; 2] = [FileFormat::Csv, FileFormat::Spreadsheet];

    /// Extensions offered by the file dialog for this format.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            FileFormat::Csv => &["csv"],
            FileFormat::Spreadsheet => &["xlsx", "xlsm", "xlsb", "xls", "ods"],
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.extensions().contains(&ext.as_str()))
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Csv => f.write_str("csv"),
            FileFormat::Spreadsheet => f.write_str("spreadsheet"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    /// CSV field separator.
    pub delimiter: u8,
    /// Columns coerced to dates, matched by exact name.
    pub date_columns: Vec<String>,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            delimiter: b';',
            date_columns: DEFAULT_DATE_COLUMNS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("file is empty")]
    Empty,
    #[error("file is not valid UTF-8 (line {line})")]
    Decode { line: u64 },
    #[error("CSV line {line}: expected {expected} fields, saw {actual}")]
    RowWidth {
        line: u64,
        expected: usize,
        actual: usize,
    },
    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("cannot read spreadsheet: {0}")]
    Spreadsheet(#[from] calamine::Error),
    #[error("spreadsheet has no worksheet")]
    NoWorksheet,
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("reading file: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read a file from disk and load it as `format`.
pub fn load_file(path: &Path, format: FileFormat, options: &LoaderOptions) -> Result<Table, LoadError> {
    let bytes = std::fs::read(path)?;
    load(&bytes, format, options)
}

/// Parse raw file content into a [`Table`] and coerce the configured date columns.
pub fn load(bytes: &[u8], format: FileFormat, options: &LoaderOptions) -> Result<Table, LoadError> {
    let mut table = match format {
        FileFormat::Csv => load_csv(bytes, options.delimiter)?,
        FileFormat::Spreadsheet => load_spreadsheet(bytes)?,
    };
    coerce_date_columns(&mut table, &options.date_columns);
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(bytes: &[u8], delimiter: u8) -> Result<Table, LoadError> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers = reader.headers().map_err(map_csv_error)?.clone();
    if headers.is_empty() {
        return Err(LoadError::Empty);
    }
    let width = headers.len();
    let names = dedupe_names(
        headers
            .iter()
            .enumerate()
            .map(|(i, h)| match h.trim() {
                "" => unnamed(i),
                _ => h.to_string(),
            })
            .collect(),
    );

    let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); width];
    for result in reader.records() {
        let record = result.map_err(map_csv_error)?;
        if record.len() > width {
            return Err(LoadError::RowWidth {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected: width,
                actual: record.len(),
            });
        }
        for (col_idx, values) in raw.iter_mut().enumerate() {
            let field = record.get(col_idx).filter(|f| !NA_TOKENS.contains(f));
            values.push(field.map(str::to_string));
        }
    }

    let columns = names
        .into_iter()
        .zip(raw)
        .map(|(name, values)| Column::new(name, infer_csv_values(values)))
        .collect();
    Ok(Table::new(columns)?)
}

fn map_csv_error(err: csv::Error) -> LoadError {
    match err.kind() {
        csv::ErrorKind::Utf8 { pos, .. } => LoadError::Decode {
            line: pos.as_ref().map(|p| p.line()).unwrap_or(0),
        },
        _ => LoadError::Csv(err),
    }
}

/// Decide one type for a whole CSV column, the way a dataframe reader does:
/// integers, then floats, then booleans, else text kept verbatim.
fn infer_csv_values(raw: Vec<Option<String>>) -> Vec<CellValue> {
    let present = || raw.iter().flatten();
    if present().all(|s| s.parse::<i64>().is_ok()) {
        return raw
            .iter()
            .map(|v| match v.as_deref().map(str::parse::<i64>) {
                Some(Ok(i)) => CellValue::Integer(i),
                _ => CellValue::Null,
            })
            .collect();
    }
    if present().all(|s| s.parse::<f64>().is_ok()) {
        return raw
            .iter()
            .map(|v| match v.as_deref().map(str::parse::<f64>) {
                Some(Ok(f)) if !f.is_nan() => CellValue::Float(f),
                _ => CellValue::Null,
            })
            .collect();
    }
    if present().all(|s| parse_bool(s).is_some()) {
        return raw
            .iter()
            .map(|v| match v.as_deref().and_then(parse_bool) {
                Some(b) => CellValue::Bool(b),
                None => CellValue::Null,
            })
            .collect();
    }
    raw.into_iter()
        .map(|v| v.map(CellValue::Text).unwrap_or(CellValue::Null))
        .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "True" | "TRUE" | "true" => Some(true),
        "False" | "FALSE" | "false" => Some(false),
        _ => None,
    }
}

/// Placeholder name for a blank header cell, shared by both readers.
fn unnamed(index: usize) -> String {
    format!("Unnamed: {index}")
}

/// Suffix repeated header names with `.1`, `.2`, ... so names stay unique.
fn dedupe_names(names: Vec<String>) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::with_capacity(names.len());
    for name in names {
        let mut candidate = name.clone();
        let mut n = 1;
        while seen.contains(&candidate) {
            candidate = format!("{name}.{n}");
            n += 1;
        }
        seen.insert(candidate.clone());
        out.push(candidate);
    }
    out
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Load the first worksheet; its first row holds the column names.
fn load_spreadsheet(bytes: &[u8]) -> Result<Table, LoadError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(LoadError::NoWorksheet)??;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Err(LoadError::Empty);
    };
    let names = dedupe_names(
        header
            .iter()
            .enumerate()
            .map(|(i, cell)| match cell {
                Data::Empty => unnamed(i),
                Data::String(s) if s.trim().is_empty() => unnamed(i),
                other => other.to_string(),
            })
            .collect(),
    );

    let mut values: Vec<Vec<CellValue>> = vec![Vec::new(); names.len()];
    for row in rows {
        for (col_idx, column) in values.iter_mut().enumerate() {
            column.push(row.get(col_idx).map(convert_cell).unwrap_or(CellValue::Null));
        }
    }

    let columns = names
        .into_iter()
        .zip(values)
        .map(|(name, values)| Column::new(name, values))
        .collect();
    Ok(Table::new(columns)?)
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) if s.is_empty() => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) if f.is_nan() => CellValue::Null,
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        // calamine resolves the workbook's 1900 or 1904 date system.
        Data::DateTime(dt) if dt.is_datetime() => dt
            .as_datetime()
            .map(CellValue::Date)
            .unwrap_or(CellValue::Null),
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) => parse_day_first(s)
            .map(CellValue::Date)
            .unwrap_or_else(|| CellValue::Text(s.clone())),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

// ---------------------------------------------------------------------------
// Date coercion
// ---------------------------------------------------------------------------

/// Coerce every column named in `date_columns` to a date column in place.
/// Values that cannot be read as dates become null.
pub fn coerce_date_columns(table: &mut Table, date_columns: &[String]) {
    for name in date_columns {
        let Some(column) = table.column_mut(name) else {
            continue;
        };
        let values = std::mem::take(&mut column.values);
        let before = values.iter().filter(|v| !v.is_null()).count();
        let coerced: Vec<CellValue> = values.into_iter().map(coerce_date).collect();
        let after = coerced.iter().filter(|v| !v.is_null()).count();
        if after < before {
            log::debug!("{name}: {} value(s) could not be read as dates", before - after);
        }
        *column = Column::dates(name.clone(), coerced);
    }
}

fn coerce_date(value: CellValue) -> CellValue {
    match value {
        CellValue::Date(_) => value,
        CellValue::Text(s) => parse_day_first(&s)
            .map(CellValue::Date)
            .unwrap_or(CellValue::Null),
        _ => CellValue::Null,
    }
}

/// Date layouts tried in order: day-first, ISO, then month-first. Two-digit
/// years come before four-digit ones since `%Y` would read `23` as year 23.
const DATE_FORMATS: &[&str] = &[
    "%d/%m/%y", "%d/%m/%Y", "%d-%m-%y", "%d-%m-%Y", "%d.%m.%y", "%d.%m.%Y",
    "%Y-%m-%d", "%Y/%m/%d",
    "%m/%d/%y", "%m/%d/%Y", "%m-%d-%y", "%m-%d-%Y", "%m.%d.%y", "%m.%d.%Y",
];

/// Time suffixes accepted after any of [`DATE_FORMATS`].
const TIME_FORMATS: &[&str] = &[" %H:%M:%S%.f", " %H:%M", "T%H:%M:%S%.f", "T%H:%M"];

/// Parse a date written day-first (`31/12/2023`, `31-12-23 14:30`), or ISO
/// (`2023-12-31`). Falls back to month-first when the day-first reading is
/// not a calendar date.
pub fn parse_day_first(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    DATE_FORMATS.iter().find_map(|date_fmt| {
        if let Ok(date) = NaiveDate::parse_from_str(s, date_fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
        TIME_FORMATS.iter().find_map(|time_fmt| {
            NaiveDateTime::parse_from_str(s, &format!("{date_fmt}{time_fmt}")).ok()
        })
    })
}
