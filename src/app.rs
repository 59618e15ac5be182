use eframe::egui;

use crate::state::AppState;
use crate::ui::{panels, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct PlanViewerApp {
    pub state: AppState,
}

impl PlanViewerApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for PlanViewerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Left side panel: filters and sort ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state);
            });

        // ---- Central panel: tables ----
        egui::CentralPanel::default().show(ctx, |ui| {
            table::tables(ui, &self.state);
        });
    }
}
