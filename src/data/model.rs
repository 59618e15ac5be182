use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::{NaiveDateTime, Timelike};
use thiserror::Error;

// ---------------------------------------------------------------------------
// CellValue – a single cell of a table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell mirroring the scalar types a spreadsheet holds.
/// Selections live in `BTreeSet`s downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDateTime),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                Text(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Text(a), Text(b)) => a.cmp(b),
            (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::Text(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Date(d) => d.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) if d.time().num_seconds_from_midnight() == 0 => {
                write!(f, "{}", d.format("%d/%m/%Y"))
            }
            CellValue::Date(d) => write!(f, "{}", d.format("%d/%m/%Y %H:%M:%S")),
            CellValue::Null => write!(f, ""),
        }
    }
}

impl CellValue {
    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            CellValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Column
// ---------------------------------------------------------------------------

/// Scalar type shared by every non-null value of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Number,
    Bool,
    Date,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Text => "text",
            ColumnType::Number => "number",
            ColumnType::Bool => "bool",
            ColumnType::Date => "date",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub values: Vec<CellValue>,
}

impl Column {
    /// Build a column, inferring its type from the values.
    ///
    /// Integers mixed with floats are promoted to floats. Any other mix of
    /// kinds makes a text column, and every non-null value is then rendered
    /// as text so the column orders lexically. An all-null column is text.
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        let column_type = infer_type(&values);
        let values = match column_type {
            ColumnType::Number if values.iter().any(|v| matches!(v, CellValue::Float(_))) => values
                .into_iter()
                .map(|v| match v.as_f64() {
                    Some(f) => CellValue::Float(f),
                    None => v,
                })
                .collect(),
            ColumnType::Text => values
                .into_iter()
                .map(|v| match v {
                    CellValue::Null | CellValue::Text(_) => v,
                    other => CellValue::Text(other.to_string()),
                })
                .collect(),
            _ => values,
        };
        Column {
            name: name.into(),
            column_type,
            values,
        }
    }

    /// Build a date column. Every value that is not already a date becomes null.
    pub fn dates(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        let values = values
            .into_iter()
            .map(|v| match v {
                CellValue::Date(_) => v,
                _ => CellValue::Null,
            })
            .collect();
        Column {
            name: name.into(),
            column_type: ColumnType::Date,
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Sorted set of distinct non-null values.
    pub fn unique_values(&self) -> BTreeSet<CellValue> {
        self.values
            .iter()
            .filter(|v| !v.is_null())
            .cloned()
            .collect()
    }

    /// Earliest and latest timestamp, if this is a date column with at least one value.
    pub fn date_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        if self.column_type != ColumnType::Date {
            return None;
        }
        let mut dates = self.values.iter().filter_map(CellValue::as_date);
        let first = dates.next()?;
        Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
    }
}

fn infer_type(values: &[CellValue]) -> ColumnType {
    let mut non_null = values.iter().filter(|v| !v.is_null()).peekable();
    if non_null.peek().is_none() {
        return ColumnType::Text;
    }
    let mut numeric = true;
    let mut boolean = true;
    let mut date = true;
    for v in non_null {
        numeric &= matches!(v, CellValue::Integer(_) | CellValue::Float(_));
        boolean &= matches!(v, CellValue::Bool(_));
        date &= matches!(v, CellValue::Date(_));
    }
    if numeric {
        ColumnType::Number
    } else if boolean {
        ColumnType::Bool
    } else if date {
        ColumnType::Date
    } else {
        ColumnType::Text
    }
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("column not found: {0}")]
    ColumnNotFound(String),
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),
    #[error("column {column} has {actual} values, expected {expected}")]
    RaggedColumn {
        column: String,
        expected: usize,
        actual: usize,
    },
}

/// An in-memory table: named, typed columns with positionally-aligned rows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
    num_rows: usize,
}

impl Table {
    /// Assemble a table, checking that names are unique and lengths agree.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let num_rows = columns.first().map(Column::len).unwrap_or(0);
        let mut seen = HashSet::new();
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(TableError::DuplicateColumn(col.name.clone()));
            }
            if col.len() != num_rows {
                return Err(TableError::RaggedColumn {
                    column: col.name.clone(),
                    expected: num_rows,
                    actual: col.len(),
                });
            }
        }
        Ok(Table { columns, num_rows })
    }

    pub fn num_rows(&self) -> usize {
        self.num_rows
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.num_rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    /// Look a column up by name.
    pub fn column(&self, name: &str) -> Result<&Column, TableError> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| TableError::ColumnNotFound(name.to_string()))
    }

    pub(crate) fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Values of one row, in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&CellValue>> {
        if index >= self.num_rows {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }

    /// New table holding the given rows, in the given order.
    ///
    /// Indices must be in bounds.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                column_type: c.column_type,
                values: indices.iter().map(|&i| c.values[i].clone()).collect(),
            })
            .collect();
        Table {
            columns,
            num_rows: indices.len(),
        }
    }

    /// The first `n` rows.
    pub fn head(&self, n: usize) -> Table {
        let indices: Vec<usize> = (0..n.min(self.num_rows)).collect();
        self.take_rows(&indices)
    }
}
