use eframe::egui::{self, Color32, RichText};
use sp_dashboard::data::error::DashboardError;
use sp_dashboard::state::AppState;

use crate::color::DistrictColors;
use crate::ui::{charts, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct DashboardApp {
    /// Fatal load/schema errors replace the whole dashboard.
    pub state: Result<AppState, DashboardError>,
    colors: DistrictColors,
}

impl DashboardApp {
    pub fn new(state: Result<AppState, DashboardError>) -> Self {
        let colors = match &state {
            Ok(state) => DistrictColors::new(state.dataset.districts()),
            Err(_) => DistrictColors::default(),
        };
        Self { state, colors }
    }
}

impl eframe::App for DashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let state = match &mut self.state {
            Ok(state) => state,
            Err(e) => {
                let message = format!("Could not load the listings: {e}");
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.centered_and_justified(|ui| {
                        ui.label(RichText::new(message).heading().color(Color32::RED));
                    });
                });
                return;
            }
        };

        // ---- Top panel: status bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, state);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(260.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, state);
            });

        // ---- Central panel: metrics and charts ----
        egui::CentralPanel::default().show(ctx, |ui| {
            charts::dashboard(ui, state, &self.colors);
        });
    }
}
