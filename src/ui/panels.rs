use eframe::egui::{self, emath::Numeric, RichText, ScrollArea, Ui};
use sp_dashboard::data::filter::{Bounds, FilterCriteria, FilterDomain};
use sp_dashboard::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel.
///
/// Widgets edit a draft copy of the criteria; the state recomputes only
/// when the draft differs from the current criteria.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Filters");
    ui.separator();

    let negotiation_types = state.dataset.negotiation_types();
    if negotiation_types.is_empty() {
        ui.label("No listings loaded.");
        return;
    }

    ui.strong("Negotiation type");
    let mut negotiation = state.negotiation;
    ui.horizontal(|ui: &mut Ui| {
        for nt in &negotiation_types {
            ui.radio_value(&mut negotiation, Some(*nt), nt.to_string());
        }
    });
    if negotiation != state.negotiation {
        if let Some(nt) = negotiation {
            state.select_negotiation(nt);
        }
    }
    ui.separator();

    let (Some(domain), Some(current)) = (state.domain.clone(), state.criteria.clone()) else {
        ui.label("No listings for this negotiation type.");
        return;
    };
    let mut draft = current;
    let top_n = state.display.default_districts;

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            property_type_selector(ui, &domain, &mut draft);
            ui.separator();
            district_selector(ui, &domain, &mut draft, top_n);
            ui.separator();

            range_slider(
                ui,
                domain.negotiation_type.price_label(),
                &mut draft.price,
                domain.price,
                true,
            );
            range_slider(ui, "Size (m²)", &mut draft.size, domain.size, false);
            optional_range(ui, "Rooms", &mut draft.rooms, domain.rooms);
            optional_range(ui, "Parking spots", &mut draft.parking, domain.parking);
            ui.separator();

            ui.strong("Amenities");
            ui.checkbox(&mut draft.amenities.elevator, "Elevator");
            ui.checkbox(&mut draft.amenities.furnished, "Furnished");
            ui.checkbox(&mut draft.amenities.swimming_pool, "Swimming pool");
            ui.checkbox(&mut draft.amenities.new, "New");
        });

    state.set_criteria(draft);
}

fn property_type_selector(ui: &mut Ui, domain: &FilterDomain, draft: &mut FilterCriteria) {
    ui.strong("Property type");
    egui::ComboBox::from_id_salt("property_type")
        .selected_text(category_label(&draft.property_type))
        .show_ui(ui, |ui: &mut Ui| {
            for pt in &domain.property_types {
                ui.selectable_value(&mut draft.property_type, pt.clone(), category_label(pt));
            }
        });
}

fn district_selector(ui: &mut Ui, domain: &FilterDomain, draft: &mut FilterCriteria, top_n: usize) {
    let n_total = domain.districts.len();
    let header_text = if draft.districts.is_empty() {
        format!("Districts  (all {n_total})")
    } else {
        format!("Districts  ({}/{n_total})", draft.districts.len())
    };

    egui::CollapsingHeader::new(RichText::new(header_text).strong())
        .id_salt("districts")
        .default_open(false)
        .show(ui, |ui: &mut Ui| {
            ui.horizontal(|ui: &mut Ui| {
                if ui.small_button("All").clicked() {
                    draft.districts.clear();
                }
                if top_n > 0 && ui.small_button(format!("Top {top_n}")).clicked() {
                    draft.districts = domain.most_common_districts(top_n).into_iter().collect();
                }
            });
            ui.label(RichText::new("Nothing ticked shows every district.").weak().small());

            for district in &domain.districts {
                let count = domain.district_counts.get(district).copied().unwrap_or(0);
                let mut checked = draft.districts.contains(district);
                let label = format!("{}  ({count})", category_label(district));
                if ui.checkbox(&mut checked, label).changed() {
                    if checked {
                        draft.districts.insert(district.clone());
                    } else {
                        draft.districts.remove(district);
                    }
                }
            }
        });
}

fn range_slider<T: Numeric + PartialOrd>(
    ui: &mut Ui,
    label: &str,
    bounds: &mut Bounds<T>,
    domain: Bounds<T>,
    logarithmic: bool,
) {
    ui.strong(label);
    ui.add(
        egui::Slider::new(&mut bounds.min, domain.min..=domain.max)
            .logarithmic(logarithmic)
            .text("min"),
    );
    ui.add(
        egui::Slider::new(&mut bounds.max, domain.min..=domain.max)
            .logarithmic(logarithmic)
            .text("max"),
    );
    *bounds = bounds.clamped();
}

fn optional_range(ui: &mut Ui, label: &str, slot: &mut Option<Bounds<i64>>, domain: Bounds<i64>) {
    let mut active = slot.is_some();
    ui.checkbox(&mut active, format!("Filter by {}", label.to_lowercase()));
    match (active, slot.as_mut()) {
        (true, Some(bounds)) => range_slider(ui, label, bounds, domain, false),
        (true, None) => *slot = Some(domain),
        (false, _) => *slot = None,
    }
}

fn category_label(value: &str) -> String {
    if value.is_empty() {
        "(unspecified)".to_owned()
    } else {
        value.to_owned()
    }
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top status bar.
pub fn top_bar(ui: &mut Ui, state: &AppState) {
    ui.horizontal(|ui: &mut Ui| {
        ui.strong("São Paulo listings");
        ui.separator();
        ui.label(format!(
            "{} listings loaded, {} visible",
            state.dataset.len(),
            state.visible_indices.len()
        ));
        if state.report.dropped() > 0 {
            ui.separator();
            ui.label(
                RichText::new(format!(
                    "{} source rows skipped during cleaning",
                    state.report.dropped()
                ))
                .weak(),
            );
        }
    });
}
