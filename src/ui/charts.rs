use std::collections::BTreeMap;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Plot, PlotPoints, Points};
use sp_dashboard::data::aggregate::{
    BuyRentRatio, DistrictAggregate, DistrictMetric, HistogramBin, SummaryStats,
};
use sp_dashboard::state::AppState;

use crate::color::DistrictColors;

const CHART_HEIGHT: f32 = 260.0;

// ---------------------------------------------------------------------------
// Central panel
// ---------------------------------------------------------------------------

/// Render metrics and charts for the current criteria. Each block handles
/// its own empty state.
pub fn dashboard(ui: &mut Ui, state: &AppState, colors: &DistrictColors) {
    let top = state.display.top_districts;
    let price_label = state
        .negotiation
        .map(|nt| nt.price_label())
        .unwrap_or("Price (R$)");

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            ui.heading("Overview");
            summary_metrics(ui, state.results.summary.as_ref(), price_label);
            ui.separator();

            ui.columns(2, |cols: &mut [Ui]| {
                cols[0].strong(format!("Top {top} districts by price per m²"));
                district_chart(
                    &mut cols[0],
                    "price_per_m2_chart",
                    &state.results.by_price_per_m2,
                    DistrictMetric::PricePerM2,
                    top,
                    colors,
                );
                cols[1].strong(format!("Top {top} districts by condo fee"));
                district_chart(
                    &mut cols[1],
                    "condo_chart",
                    &state.results.by_condo,
                    DistrictMetric::Condo,
                    top,
                    colors,
                );
            });
            ui.push_id("district_table", |ui: &mut Ui| {
                district_table(ui, &state.results.by_price_per_m2, top);
            });
            ui.separator();

            ui.columns(2, |cols: &mut [Ui]| {
                cols[0].strong(format!("{price_label} distribution"));
                histogram_chart(&mut cols[0], "price_histogram", &state.results.price_histogram);
                cols[1].strong("Size (m²) distribution");
                histogram_chart(&mut cols[1], "size_histogram", &state.results.size_histogram);
            });
            ui.separator();

            ui.strong("Location of matching listings");
            location_scatter(ui, state, colors);
            ui.separator();

            ui.strong(format!(
                "Buy/rent ratio, top {} districts (all listings, ignores filters)",
                state.display.top_ratios
            ));
            ratio_chart(ui, &state.ratios, state.display.top_ratios, colors);
            ui.push_id("ratio_table", |ui: &mut Ui| {
                ratio_table(ui, &state.ratios, state.display.top_ratios);
            });
        });
}

fn no_data(ui: &mut Ui, message: &str) {
    ui.label(RichText::new(message).italics().color(Color32::GRAY));
}

// ---------------------------------------------------------------------------
// Summary metrics
// ---------------------------------------------------------------------------

fn summary_metrics(ui: &mut Ui, summary: Option<&SummaryStats>, price_label: &str) {
    let Some(stats) = summary else {
        no_data(ui, "No listings match the current filters.");
        return;
    };

    egui::Grid::new("summary_metrics")
        .num_columns(6)
        .spacing([32.0, 4.0])
        .show(ui, |ui: &mut Ui| {
            ui.label("Listings");
            ui.label(format!("Mean {}", price_label.to_lowercase()));
            ui.label("Mean condo");
            ui.label("Mean total cost");
            ui.label("Mean size");
            ui.label("Mean price per m²");
            ui.end_row();

            ui.label(RichText::new(stats.count.to_string()).heading());
            ui.label(RichText::new(format_brl(stats.mean_price)).heading());
            ui.label(RichText::new(format_brl(stats.mean_condo)).heading());
            ui.label(RichText::new(format_brl(stats.mean_total_cost)).heading());
            ui.label(RichText::new(format!("{:.0} m²", stats.mean_size)).heading());
            let per_m2 = stats
                .mean_price_per_m2
                .map(format_brl)
                .unwrap_or_else(|| "n/a".to_owned());
            ui.label(RichText::new(per_m2).heading());
            ui.end_row();
        });
}

/// `R$ 1,234,567` style, rounded to whole reais.
fn format_brl(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if rounded < 0 { "-" } else { "" };
    format!("{sign}R$ {grouped}")
}

// ---------------------------------------------------------------------------
// District rankings
// ---------------------------------------------------------------------------

fn district_chart(
    ui: &mut Ui,
    id: &str,
    rows: &[DistrictAggregate],
    metric: DistrictMetric,
    top: usize,
    colors: &DistrictColors,
) {
    let bars: Vec<Bar> = rows
        .iter()
        .filter_map(|row| row.metric(metric).map(|value| (row, value)))
        .take(top)
        .enumerate()
        .map(|(i, (row, value))| {
            Bar::new(i as f64, value)
                .name(&row.district)
                .fill(colors.color_for(&row.district))
        })
        .collect();

    if bars.is_empty() {
        no_data(ui, "No district data for the current filters.");
        return;
    }

    Plot::new(id)
        .height(CHART_HEIGHT)
        .y_axis_label("R$")
        .show_axes([false, true])
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).width(0.7));
        });
}

fn district_table(ui: &mut Ui, rows: &[DistrictAggregate], top: usize) {
    if rows.is_empty() {
        return;
    }
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::remainder())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("District");
            });
            header.col(|ui| {
                ui.strong("Mean price per m²");
            });
            header.col(|ui| {
                ui.strong("Mean condo");
            });
            header.col(|ui| {
                ui.strong("Listings");
            });
        })
        .body(|mut body| {
            for row in rows.iter().take(top) {
                body.row(18.0, |mut table_row| {
                    table_row.col(|ui| {
                        ui.label(&row.district);
                    });
                    table_row.col(|ui| {
                        ui.label(
                            row.mean_price_per_m2
                                .map(format_brl)
                                .unwrap_or_else(|| "n/a".to_owned()),
                        );
                    });
                    table_row.col(|ui| {
                        ui.label(format_brl(row.mean_condo));
                    });
                    table_row.col(|ui| {
                        ui.label(row.count.to_string());
                    });
                });
            }
        });
}

// ---------------------------------------------------------------------------
// Histograms
// ---------------------------------------------------------------------------

fn histogram_chart(ui: &mut Ui, id: &str, bins: &[HistogramBin]) {
    if bins.is_empty() {
        no_data(ui, "Nothing to plot.");
        return;
    }
    let bars: Vec<Bar> = bins
        .iter()
        .map(|bin| {
            Bar::new(bin.center(), bin.count as f64)
                .width(bin.width().max(f64::EPSILON))
                .name(format!("{:.0} – {:.0}", bin.start, bin.end))
        })
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .y_axis_label("Listings")
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).color(Color32::LIGHT_BLUE));
        });
}

// ---------------------------------------------------------------------------
// Map-like scatter
// ---------------------------------------------------------------------------

fn location_scatter(ui: &mut Ui, state: &AppState, colors: &DistrictColors) {
    // One plot item per district keeps the item count small.
    let mut by_district: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
    for listing in state.visible().iter() {
        if let (Some(lat), Some(lon)) = (listing.latitude, listing.longitude) {
            by_district
                .entry(listing.district.as_str())
                .or_default()
                .push([lon, lat]);
        }
    }

    if by_district.is_empty() {
        no_data(ui, "No matching listing has coordinates.");
        return;
    }

    Plot::new("location_scatter")
        .height(CHART_HEIGHT * 1.5)
        .data_aspect(1.0)
        .x_axis_label("Longitude")
        .y_axis_label("Latitude")
        .show(ui, |plot_ui| {
            for (district, points) in by_district {
                plot_ui.points(
                    Points::new(PlotPoints::new(points))
                        .name(district)
                        .radius(2.0)
                        .color(colors.color_for(district)),
                );
            }
        });
}

// ---------------------------------------------------------------------------
// Buy / rent ratio
// ---------------------------------------------------------------------------

fn ratio_chart(ui: &mut Ui, ratios: &[BuyRentRatio], top: usize, colors: &DistrictColors) {
    if ratios.is_empty() {
        no_data(ui, "No district has both sale and rent listings.");
        return;
    }
    let bars: Vec<Bar> = ratios
        .iter()
        .take(top)
        .enumerate()
        .map(|(i, r)| {
            Bar::new(i as f64, r.ratio)
                .name(&r.district)
                .fill(colors.color_for(&r.district))
        })
        .collect();

    Plot::new("ratio_chart")
        .height(CHART_HEIGHT)
        .y_axis_label("Years of rent")
        .show_axes([false, true])
        .allow_drag(false)
        .allow_scroll(false)
        .allow_zoom(false)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(bars).width(0.7));
        });
}

fn ratio_table(ui: &mut Ui, ratios: &[BuyRentRatio], top: usize) {
    if ratios.is_empty() {
        return;
    }
    TableBuilder::new(ui)
        .striped(true)
        .vscroll(false)
        .column(Column::remainder())
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::auto())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong("District");
            });
            header.col(|ui| {
                ui.strong("Mean sale price");
            });
            header.col(|ui| {
                ui.strong("Mean annual rent");
            });
            header.col(|ui| {
                ui.strong("Ratio");
            });
        })
        .body(|mut body| {
            for r in ratios.iter().take(top) {
                body.row(18.0, |mut table_row| {
                    table_row.col(|ui| {
                        ui.label(&r.district);
                    });
                    table_row.col(|ui| {
                        ui.label(format_brl(r.mean_sale_price));
                    });
                    table_row.col(|ui| {
                        ui.label(format_brl(r.mean_annual_rent));
                    });
                    table_row.col(|ui| {
                        ui.label(format!("{:.1}", r.ratio));
                    });
                });
            }
        });
}
