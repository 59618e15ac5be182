use eframe::egui::{Align, Layout, ScrollArea, TextStyle, Ui};
use egui_extras::{Column as TableColumn, TableBuilder};

use plan_viewer::data::model::Table;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Central panel: raw preview + filtered result
// ---------------------------------------------------------------------------

pub fn tables(ui: &mut Ui, state: &AppState) {
    let (Some(preview), Some(view)) = (&state.preview, &state.view) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Please load a file to get started  (File → Open…)");
        });
        return;
    };

    ui.heading("Raw data preview");
    data_table(ui, "preview_table", preview, 240.0);

    ui.add_space(8.0);
    ui.separator();
    ui.heading(format!("Filtered data ({} rows)", view.num_rows()));
    let remaining = ui.available_height();
    data_table(ui, "filtered_table", view, remaining);
}

/// One table widget: a header row with column names, then every row.
fn data_table(ui: &mut Ui, id_salt: &str, table: &Table, max_height: f32) {
    if table.num_columns() == 0 {
        ui.label("(no columns)");
        return;
    }
    let row_height = ui.text_style_height(&TextStyle::Body) + 4.0;

    ui.push_id(id_salt, |ui: &mut Ui| {
        ScrollArea::horizontal().show(ui, |ui: &mut Ui| {
            TableBuilder::new(ui)
                .striped(true)
                .resizable(true)
                .max_scroll_height(max_height)
                .cell_layout(Layout::left_to_right(Align::Center))
                .columns(TableColumn::auto().at_least(80.0), table.num_columns())
                .header(row_height, |mut header| {
                    for col in table.columns() {
                        header.col(|ui: &mut Ui| {
                            ui.strong(&col.name)
                                .on_hover_text(col.column_type.to_string());
                        });
                    }
                })
                .body(|body| {
                    body.rows(row_height, table.num_rows(), |mut row| {
                        let index = row.index();
                        for col in table.columns() {
                            row.col(|ui: &mut Ui| {
                                ui.label(col.values[index].to_string());
                            });
                        }
                    });
                });
        });
    });
}
