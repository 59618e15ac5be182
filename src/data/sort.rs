use std::cmp::Ordering;

use super::model::{CellValue, Table, TableError};

/// Column to sort by and direction. Missing values always go last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub column: String,
    pub ascending: bool,
}

impl SortSpec {
    pub fn ascending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn descending(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// Order two cells; nulls last regardless of direction.
fn compare(a: &CellValue, b: &CellValue, ascending: bool) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) if ascending => a.cmp(b),
        (false, false) => b.cmp(a),
    }
}

/// Stable permutation of row indices ordering `table` by `spec`.
pub fn sorted_indices(table: &Table, spec: &SortSpec) -> Result<Vec<usize>, TableError> {
    let values = &table.column(&spec.column)?.values;
    let mut indices: Vec<usize> = (0..table.num_rows()).collect();
    // `sort_by` is stable, so equal keys keep their input order.
    indices.sort_by(|&a, &b| compare(&values[a], &values[b], spec.ascending));
    Ok(indices)
}

/// Reorder `table` by `spec`, failing if the column does not exist.
pub fn try_sort(table: &Table, spec: &SortSpec) -> Result<Table, TableError> {
    let indices = sorted_indices(table, spec)?;
    Ok(table.take_rows(&indices))
}

/// Reorder `table` by `spec`. An unknown column leaves the order unchanged.
pub fn sort(table: &Table, spec: &SortSpec) -> Table {
    match try_sort(table, spec) {
        Ok(sorted) => sorted,
        Err(e) => {
            log::warn!("sort skipped: {e}");
            table.clone()
        }
    }
}
