use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::DatePickerButton;

use plan_viewer::data::loader::FileFormat;

use crate::state::{AppState, CategoricalFilter};

// ---------------------------------------------------------------------------
// Left side panel – filter and sort widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    if state.table.is_none() {
        ui.label("No file loaded.");
        return;
    }

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            categorical_filter(ui, state, CategoricalFilter::Domain);
            categorical_filter(ui, state, CategoricalFilter::BudgetLine);
            date_range_filter(ui, state);
            ui.separator();
            sort_controls(ui, state);
        });
}

/// Checkbox list over the distinct values of one column. Hidden when the
/// loaded table has no such column.
fn categorical_filter(ui: &mut Ui, state: &mut AppState, which: CategoricalFilter) {
    let Some(all_values) = state.options(which).cloned() else {
        return;
    };
    let column = state.column_name(which).to_string();

    // Show count of selected / total in the header
    let n_selected = state.selection(which).len();
    let n_total = all_values.len();
    let header_text = format!("{column}  ({n_selected}/{n_total})");

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt(&column)
        .default_open(true)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    state.select_all(which);
                }
                if ui.small_button("None").clicked() {
                    state.select_none(which);
                }
            });
            if n_selected == 0 {
                ui.label(RichText::new("Nothing selected: showing all rows").weak());
            }

            for val in &all_values {
                let mut checked = state.selection(which).contains(val);
                if ui.checkbox(&mut checked, val.to_string()).changed() {
                    state.toggle_filter_value(which, val);
                }
            }
        });
}

/// Start / end pickers over the configured date column, offered only when
/// that column holds dates.
fn date_range_filter(ui: &mut Ui, state: &mut AppState) {
    let (Some((min, max)), Some((mut start, mut end))) = (state.date_bounds, state.date_range) else {
        return;
    };

    ui.separator();
    ui.strong(format!("Range of '{}'", state.config.date_range_column));
    ui.label(
        RichText::new(format!(
            "Data spans {} to {}",
            min.format("%d/%m/%Y"),
            max.format("%d/%m/%Y")
        ))
        .weak(),
    );

    let mut changed = false;
    egui::Grid::new("date_range_grid").show(ui, |ui: &mut Ui| {
        ui.label("From");
        changed |= ui
            .add(DatePickerButton::new(&mut start).id_salt("date_range_start"))
            .changed();
        ui.end_row();
        ui.label("To");
        changed |= ui
            .add(DatePickerButton::new(&mut end).id_salt("date_range_end"))
            .changed();
        ui.end_row();
    });
    if changed {
        state.set_date_range(start, end);
    }
    if ui.small_button("Full range").clicked() {
        state.reset_date_range();
    }
}

fn sort_controls(ui: &mut Ui, state: &mut AppState) {
    let Some(view) = &state.view else {
        return;
    };
    let columns: Vec<String> = view.column_names().iter().map(|s| s.to_string()).collect();

    ui.strong("Sort by");
    let current = state.sort_column.clone().unwrap_or_default();
    egui::ComboBox::from_id_salt("sort_column")
        .selected_text(&current)
        .show_ui(ui, |ui: &mut Ui| {
            for col in &columns {
                if ui.selectable_label(current == *col, col).clicked() {
                    state.set_sort_column(col.clone());
                }
            }
        });

    let mut ascending = state.sort_ascending;
    ui.horizontal(|ui: &mut Ui| {
        ui.radio_value(&mut ascending, true, "Ascending");
        ui.radio_value(&mut ascending, false, "Descending");
    });
    if ascending != state.sort_ascending {
        state.set_sort_ascending(ascending);
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        ui.label("File type");
        egui::ComboBox::from_id_salt("file_format")
            .selected_text(state.format.to_string())
            .show_ui(ui, |ui: &mut Ui| {
                for format in FileFormat::ALL {
                    ui.selectable_value(&mut state.format, format, format.to_string());
                }
            });

        ui.separator();

        if let (Some(table), Some(view)) = (&state.table, &state.view) {
            let name = state
                .source
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            ui.label(format!(
                "{name}: {} rows loaded, {} shown",
                table.num_rows(),
                view.num_rows()
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let (title, label) = match state.format {
        FileFormat::Csv => ("Open a CSV file", "CSV"),
        FileFormat::Spreadsheet => ("Open a spreadsheet", "Spreadsheet"),
    };
    let file = rfd::FileDialog::new()
        .set_title(title)
        .add_filter(label, state.format.extensions())
        .pick_file();

    if let Some(path) = file {
        state.load_path(&path);
    }
}
