use super::filter::{filter, FilterSpec};
use super::model::Table;
use super::sort::{sort, SortSpec};

/// Rows shown in the raw-data preview unless configured otherwise.
pub const DEFAULT_PREVIEW_ROWS: usize = 10;

/// First `rows` rows of the loaded table.
pub fn preview(table: &Table, rows: usize) -> Table {
    table.head(rows)
}

/// Filter, then sort. A missing sort column leaves the filtered order as is.
pub fn apply(table: &Table, filters: &FilterSpec, sort_spec: Option<&SortSpec>) -> Table {
    let filtered = filter(table, filters);
    match sort_spec {
        Some(spec) => sort(&filtered, spec),
        None => filtered,
    }
}
