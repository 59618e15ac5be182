use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use plan_viewer::config::ViewerConfig;
use plan_viewer::data::cache::LoadCache;
use plan_viewer::data::filter::{available_values, date_bounds, DateRange, FilterSpec};
use plan_viewer::data::loader::{FileFormat, LoaderOptions};
use plan_viewer::data::model::{CellValue, Table};
use plan_viewer::data::pipeline::{apply, preview};
use plan_viewer::data::sort::SortSpec;

/// The two value-set filters the viewer offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoricalFilter {
    Domain,
    BudgetLine,
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering. One per session.
pub struct AppState {
    pub config: ViewerConfig,
    loader_options: LoaderOptions,

    /// Last loaded upload, keyed by content.
    cache: LoadCache,

    /// Format used for the next file opened.
    pub format: FileFormat,

    /// Path of the loaded file.
    pub source: Option<PathBuf>,

    /// Loaded table (None until the user loads a file).
    pub table: Option<Arc<Table>>,

    /// First rows of the loaded table.
    pub preview: Option<Table>,

    /// Filtered and sorted table (cached).
    pub view: Option<Table>,

    /// Values offered per categorical filter; `None` when the column is absent.
    pub domain_options: Option<BTreeSet<CellValue>>,
    pub budget_options: Option<BTreeSet<CellValue>>,

    /// Selected values; empty means "show all".
    pub domain_selection: BTreeSet<CellValue>,
    pub budget_selection: BTreeSet<CellValue>,

    /// Earliest / latest value of the date-range column, if a range can apply.
    pub date_bounds: Option<(NaiveDateTime, NaiveDateTime)>,

    /// Selected inclusive day range.
    pub date_range: Option<(NaiveDate, NaiveDate)>,

    pub sort_column: Option<String>,
    pub sort_ascending: bool,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: ViewerConfig) -> Self {
        let loader_options = config.loader_options();
        Self {
            config,
            loader_options,
            cache: LoadCache::new(),
            format: FileFormat::Csv,
            source: None,
            table: None,
            preview: None,
            view: None,
            domain_options: None,
            budget_options: None,
            domain_selection: BTreeSet::new(),
            budget_selection: BTreeSet::new(),
            date_bounds: None,
            date_range: None,
            sort_column: None,
            sort_ascending: true,
            status_message: None,
        }
    }

    /// Read and load a file. A known extension overrides the selected format.
    pub fn load_path(&mut self, path: &Path) {
        let detected = path
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(FileFormat::from_extension);
        if let Some(detected) = detected.filter(|&f| f != self.format) {
            log::warn!(
                "{} has a {detected} extension; reading it as {detected} instead of {}",
                path.display(),
                self.format
            );
            self.format = detected;
        }

        match std::fs::read(path) {
            Ok(bytes) => {
                self.load_bytes(&bytes);
                if self.table.is_some() {
                    self.source = Some(path.to_path_buf());
                }
            }
            Err(e) => self.fail(format!("Error: cannot read {}: {e}", path.display())),
        }
    }

    /// Load raw content with the current format. A failure clears the
    /// previous table rather than leaving it on screen.
    pub fn load_bytes(&mut self, bytes: &[u8]) {
        let format = self.format;
        match self.cache.get_or_load(bytes, format, &self.loader_options) {
            Ok(table) => {
                log::info!(
                    "Loaded {} rows with columns {:?} ({format})",
                    table.num_rows(),
                    table.column_names()
                );
                self.set_table(table);
            }
            Err(e) => {
                log::error!("Failed to load file: {e}");
                self.fail(format!("Error: {e}"));
            }
        }
    }

    fn fail(&mut self, message: String) {
        self.table = None;
        self.preview = None;
        self.view = None;
        self.source = None;
        self.status_message = Some(message);
    }

    /// Ingest a newly loaded table and reset every selection.
    pub fn set_table(&mut self, table: Arc<Table>) {
        self.domain_options = available_values(&table, &self.config.domain_column);
        self.budget_options = available_values(&table, &self.config.budget_line_column);
        self.domain_selection.clear();
        self.budget_selection.clear();

        self.date_bounds = date_bounds(&table, &self.config.date_range_column);
        self.date_range = self.date_bounds.map(|(lo, hi)| (lo.date(), hi.date()));

        // Default sort column: first column (if any).
        self.sort_column = table.column_names().first().map(|s| s.to_string());
        self.sort_ascending = true;

        self.preview = Some(preview(&table, self.config.preview_rows));
        self.table = Some(table);
        self.status_message = None;
        self.refilter();
    }

    /// Current selections as a filter spec. Filters the table does not offer
    /// are left out.
    pub fn filter_spec(&self) -> FilterSpec {
        let mut spec = FilterSpec::new();
        if self.domain_options.is_some() {
            spec = spec.with_values(
                self.config.domain_column.clone(),
                self.domain_selection.iter().cloned(),
            );
        }
        if self.budget_options.is_some() {
            spec = spec.with_values(
                self.config.budget_line_column.clone(),
                self.budget_selection.iter().cloned(),
            );
        }
        if let (Some(_), Some((start, end))) = (self.date_bounds, self.date_range) {
            spec = spec.with_date_range(
                self.config.date_range_column.clone(),
                DateRange::from_dates(start, end),
            );
        }
        spec
    }

    /// Recompute `view` after any selection change.
    pub fn refilter(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        if let Some(col) = &self.sort_column {
            if !table.has_column(col) {
                self.sort_column = table.column_names().first().map(|s| s.to_string());
            }
        }
        let sort = self.sort_column.as_ref().map(|column| SortSpec {
            column: column.clone(),
            ascending: self.sort_ascending,
        });
        self.view = Some(apply(table, &self.filter_spec(), sort.as_ref()));
    }

    pub fn column_name(&self, which: CategoricalFilter) -> &str {
        match which {
            CategoricalFilter::Domain => &self.config.domain_column,
            CategoricalFilter::BudgetLine => &self.config.budget_line_column,
        }
    }

    pub fn options(&self, which: CategoricalFilter) -> Option<&BTreeSet<CellValue>> {
        match which {
            CategoricalFilter::Domain => self.domain_options.as_ref(),
            CategoricalFilter::BudgetLine => self.budget_options.as_ref(),
        }
    }

    pub fn selection(&self, which: CategoricalFilter) -> &BTreeSet<CellValue> {
        match which {
            CategoricalFilter::Domain => &self.domain_selection,
            CategoricalFilter::BudgetLine => &self.budget_selection,
        }
    }

    fn selection_mut(&mut self, which: CategoricalFilter) -> &mut BTreeSet<CellValue> {
        match which {
            CategoricalFilter::Domain => &mut self.domain_selection,
            CategoricalFilter::BudgetLine => &mut self.budget_selection,
        }
    }

    /// Toggle a single value in a filter's selection.
    pub fn toggle_filter_value(&mut self, which: CategoricalFilter, value: &CellValue) {
        let selected = self.selection_mut(which);
        if selected.contains(value) {
            selected.remove(value);
        } else {
            selected.insert(value.clone());
        }
        self.refilter();
    }

    /// Select every offered value.
    pub fn select_all(&mut self, which: CategoricalFilter) {
        if let Some(all_vals) = self.options(which).cloned() {
            *self.selection_mut(which) = all_vals;
            self.refilter();
        }
    }

    /// Clear the selection (shows every row).
    pub fn select_none(&mut self, which: CategoricalFilter) {
        self.selection_mut(which).clear();
        self.refilter();
    }

    pub fn set_date_range(&mut self, start: NaiveDate, end: NaiveDate) {
        if self.date_bounds.is_some() {
            self.date_range = Some((start, end));
            self.refilter();
        }
    }

    /// Back to the full span of the column.
    pub fn reset_date_range(&mut self) {
        self.date_range = self.date_bounds.map(|(lo, hi)| (lo.date(), hi.date()));
        self.refilter();
    }

    pub fn set_sort_column(&mut self, column: String) {
        self.sort_column = Some(column);
        self.refilter();
    }

    pub fn set_sort_ascending(&mut self, ascending: bool) {
        self.sort_ascending = ascending;
        self.refilter();
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(ViewerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const PLAN: &str = "Domaines de dépense;Ligne budgétaire;Date de début\n\
                        A;L1;01/01/2023\n\
                        B;L2;15/06/2023\n\
                        A;L1;20/12/2023\n";

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn loaded() -> AppState {
        let mut state = AppState::default();
        state.load_bytes(PLAN.as_bytes());
        state
    }

    #[test]
    fn loading_offers_every_filter() {
        let state = loaded();
        assert_eq!(state.preview.as_ref().unwrap().num_rows(), 3);
        assert_eq!(state.view.as_ref().unwrap().num_rows(), 3);
        assert_eq!(state.options(CategoricalFilter::Domain).unwrap().len(), 2);
        assert_eq!(state.options(CategoricalFilter::BudgetLine).unwrap().len(), 2);
        assert_eq!(
            state.date_range,
            Some((
                NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2023, 12, 20).unwrap()
            ))
        );
        assert_eq!(state.sort_column.as_deref(), Some("Domaines de dépense"));
    }

    #[test]
    fn selections_narrow_the_view() {
        let mut state = loaded();
        state.toggle_filter_value(CategoricalFilter::Domain, &text("A"));
        assert_eq!(state.view.as_ref().unwrap().num_rows(), 2);

        state.set_date_range(
            NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
        );
        assert_eq!(state.view.as_ref().unwrap().num_rows(), 1);

        state.reset_date_range();
        state.select_none(CategoricalFilter::Domain);
        assert_eq!(state.view.as_ref().unwrap().num_rows(), 3);

        state.select_all(CategoricalFilter::BudgetLine);
        assert_eq!(state.view.as_ref().unwrap().num_rows(), 3);
    }

    #[test]
    fn sorting_descending_by_date() {
        let mut state = loaded();
        state.set_sort_column("Date de début".to_string());
        state.set_sort_ascending(false);
        let view = state.view.as_ref().unwrap();
        let domains = &view.column("Domaines de dépense").unwrap().values;
        assert_eq!(domains, &vec![text("A"), text("B"), text("A")]);
        assert_eq!(view.row(0).unwrap()[1], &text("L1"));
    }

    #[test]
    fn no_date_column_means_no_range_filter() {
        let mut state = AppState::default();
        state.load_bytes(b"Domaines de d\xc3\xa9pense;Montant\nA;1\n");
        assert_eq!(state.date_bounds, None);
        assert_eq!(state.date_range, None);
        assert_eq!(state.options(CategoricalFilter::BudgetLine), None);
        assert_eq!(state.filter_spec().iter().count(), 1);
    }

    #[test]
    fn initial_range_keeps_every_dated_row() {
        let mut state = AppState::default();
        state.load_bytes(
            "Date de début;n\n01/01/2023;1\n20/12/2023 23:59:59.9995;2\n;3\n".as_bytes(),
        );
        assert_eq!(state.table.as_ref().unwrap().num_rows(), 3);
        assert_eq!(state.view.as_ref().unwrap().num_rows(), 2);
    }

    #[test]
    fn file_extension_selects_the_format() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(PLAN.as_bytes()).unwrap();

        let mut state = AppState::default();
        state.format = FileFormat::Spreadsheet;
        state.load_path(file.path());
        assert_eq!(state.format, FileFormat::Csv);
        assert_eq!(state.table.as_ref().unwrap().num_rows(), 3);
        assert_eq!(state.source.as_deref(), Some(file.path()));
    }

    #[test]
    fn unknown_extension_keeps_the_selected_format() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        file.write_all(PLAN.as_bytes()).unwrap();

        let mut state = AppState::default();
        state.load_path(file.path());
        assert_eq!(state.format, FileFormat::Csv);
        assert!(state.table.is_some());
    }

    #[test]
    fn failed_load_clears_previous_table() {
        let mut state = loaded();
        state.format = FileFormat::Spreadsheet;
        state.load_bytes(b"not a workbook");
        assert!(state.table.is_none());
        assert!(state.view.is_none());
        assert!(state.status_message.is_some());
    }
}
