use std::collections::{BTreeMap, BTreeSet};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use super::model::{CellValue, ColumnType, Table};

// ---------------------------------------------------------------------------
// Constraints: which rows a column lets through
// ---------------------------------------------------------------------------

/// Inclusive timestamp interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    /// Whole days: from the start of `start` to the last instant of `end`.
    pub fn from_dates(start: NaiveDate, end: NaiveDate) -> Self {
        let last = NaiveTime::from_hms_nano_opt(23, 59, 59, 999_999_999).unwrap_or(NaiveTime::MIN);
        Self {
            start: start.and_time(NaiveTime::MIN),
            end: end.and_time(last),
        }
    }

    pub fn contains(&self, value: NaiveDateTime) -> bool {
        self.start <= value && value <= self.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Allowed values. An empty set means "show all".
    Categorical(BTreeSet<CellValue>),
    /// Inclusive bound on a date column.
    Range(DateRange),
}

/// Per-column constraints, combined with AND.
/// A column absent from the map is unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSpec {
    constraints: BTreeMap<String, Constraint>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(
        mut self,
        column: impl Into<String>,
        values: impl IntoIterator<Item = CellValue>,
    ) -> Self {
        self.set(column, Constraint::Categorical(values.into_iter().collect()));
        self
    }

    pub fn with_date_range(mut self, column: impl Into<String>, range: DateRange) -> Self {
        self.set(column, Constraint::Range(range));
        self
    }

    pub fn set(&mut self, column: impl Into<String>, constraint: Constraint) {
        self.constraints.insert(column.into(), constraint);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Constraint)> {
        self.constraints.iter()
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// A constraint resolved against a concrete table: column values plus predicate.
enum Active<'a> {
    Values(&'a [CellValue], &'a BTreeSet<CellValue>),
    Range(&'a [CellValue], DateRange),
}

impl Active<'_> {
    fn passes(&self, row: usize) -> bool {
        match self {
            Active::Values(values, allowed) => {
                let v = &values[row];
                !v.is_null() && allowed.contains(v)
            }
            Active::Range(values, range) => values[row].as_date().is_some_and(|d| range.contains(d)),
        }
    }
}

/// Resolve the constraints that actually apply to `table`.
///
/// Skipped:
/// * constraints on columns the table does not have
/// * empty categorical sets
/// * range constraints on a column that is not a date column or holds no dates
fn active_constraints<'a>(table: &'a Table, spec: &'a FilterSpec) -> Vec<Active<'a>> {
    let mut active = Vec::new();
    for (name, constraint) in spec.iter() {
        let Ok(column) = table.column(name) else {
            log::debug!("filter on {name:?} skipped: column not in table");
            continue;
        };
        match constraint {
            Constraint::Categorical(allowed) if allowed.is_empty() => {}
            Constraint::Categorical(allowed) => {
                active.push(Active::Values(&column.values, allowed));
            }
            Constraint::Range(range) => {
                if column.column_type != ColumnType::Date || column.date_bounds().is_none() {
                    log::debug!("date range on {name:?} skipped: no dates in column");
                    continue;
                }
                active.push(Active::Range(&column.values, *range));
            }
        }
    }
    active
}

/// Return indices of rows that pass all active constraints, in table order.
pub fn filtered_indices(table: &Table, spec: &FilterSpec) -> Vec<usize> {
    let active = active_constraints(table, spec);
    (0..table.num_rows())
        .filter(|&row| active.iter().all(|c| c.passes(row)))
        .collect()
}

/// Derive a new table holding only the rows that pass `spec`.
pub fn filter(table: &Table, spec: &FilterSpec) -> Table {
    let indices = filtered_indices(table, spec);
    log::debug!("filter kept {} of {} rows", indices.len(), table.num_rows());
    table.take_rows(&indices)
}

// ---------------------------------------------------------------------------
// Which filters can be offered for a table
// ---------------------------------------------------------------------------

/// Distinct non-null values of `column`, or `None` if the table lacks it.
pub fn available_values(table: &Table, column: &str) -> Option<BTreeSet<CellValue>> {
    table.column(column).ok().map(|c| c.unique_values())
}

/// Earliest and latest timestamp of `column`, or `None` when a date range
/// cannot apply to it.
pub fn date_bounds(table: &Table, column: &str) -> Option<(NaiveDateTime, NaiveDateTime)> {
    table.column(column).ok().and_then(|c| c.date_bounds())
}
