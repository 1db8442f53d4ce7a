use eframe::egui::{self, Color32, RichText, ScrollArea, Slider, Ui};

use super::{Command, Intents};
use crate::color::{density_color, ModeColors};
use crate::data::format::format_file_size;
use crate::data::model::{SortBy, SortOrder};
use crate::state::{Action, SessionState, Tab};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &SessionState, intents: &mut Intents) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("Detections", |ui: &mut Ui| {
            if ui.button("Fetch configured feed").clicked() {
                intents.run(Command::LoadDetectionFeed);
                ui.close_menu();
            }
            if ui.button("Open CSV…").clicked() {
                intents.run(Command::OpenDetectionFile);
                ui.close_menu();
            }
            if ui.button("Use demo detections").clicked() {
                intents.run(Command::UseSyntheticDetections);
                ui.close_menu();
            }
        });

        ui.separator();

        for tab in Tab::ALL {
            if ui.selectable_label(state.tab == tab, tab.label()).clicked() && state.tab != tab {
                intents.act(Action::SelectTab(tab));
            }
        }

        ui.separator();

        ui.label("Cruise");
        let mut cruise = state.cruise.clone();
        let edit = ui.add(egui::TextEdit::singleline(&mut cruise).desired_width(70.0));
        if edit.changed() {
            intents.act(Action::SetCruise(cruise));
        }
        let submitted = edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));
        let reload = ui.add_enabled(
            !state.catalog_status.is_loading(),
            egui::Button::new("Reload"),
        );
        if submitted || reload.clicked() {
            intents.run(Command::ReloadCatalog);
        }

        if state.catalog_status.is_loading() || state.detection_status.is_loading() {
            ui.spinner();
        }

        if let Some(origin) = &state.detection_origin {
            ui.separator();
            let text = RichText::new(format!("Detections: {origin}"));
            ui.label(if origin.is_synthetic() {
                text.color(Color32::YELLOW)
            } else {
                text
            });
        }
        if let Some(msg) = state.detection_status.error() {
            ui.label(RichText::new(format!("Detections: {msg}")).color(Color32::RED));
        }
    });
}

/// Red banner with a retry button, shown when the catalog failed to load.
pub fn catalog_error(ui: &mut Ui, state: &SessionState, intents: &mut Intents) -> bool {
    let Some(msg) = state.catalog_status.error() else {
        return false;
    };
    ui.horizontal(|ui: &mut Ui| {
        ui.label(RichText::new(format!("Error loading files: {msg}")).color(Color32::RED));
        if ui.button("Retry Loading").clicked() {
            intents.run(Command::ReloadCatalog);
        }
    });
    true
}

// ---------------------------------------------------------------------------
// Left side panel – analyzer filters and statistics
// ---------------------------------------------------------------------------

/// Render the analyzer's filter panel.
pub fn side_panel(ui: &mut Ui, state: &SessionState, intents: &mut Intents, colors: &ModeColors) {
    ui.heading("Filters");
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            let mut min_density = state.filters.min_density;
            let density = Slider::new(&mut min_density, 0.0..=1.0)
                .step_by(0.1)
                .custom_formatter(|v, _| format!("{:.0}%", v * 100.0))
                .text("Min density");
            if ui.add(density).changed() {
                intents.act(Action::SetMinDensity(min_density));
            }

            let mut min_confidence = state.filters.min_confidence;
            let confidence = Slider::new(&mut min_confidence, 0.0..=1.0)
                .step_by(0.1)
                .custom_formatter(|v, _| format!("{:.0}%", v * 100.0))
                .text("Min confidence");
            if ui.add(confidence).changed() {
                intents.act(Action::SetMinConfidence(min_confidence));
            }

            ui.add_space(4.0);
            ui.strong("Sort by");
            egui::ComboBox::from_id_salt("sort_by")
                .selected_text(state.filters.sort_by.to_string())
                .show_ui(ui, |ui: &mut Ui| {
                    for by in SortBy::ALL {
                        if ui
                            .selectable_label(state.filters.sort_by == by, by.to_string())
                            .clicked()
                        {
                            intents.act(Action::SetSortBy(by));
                        }
                    }
                });
            ui.horizontal(|ui: &mut Ui| {
                for order in [SortOrder::Desc, SortOrder::Asc] {
                    if ui
                        .selectable_label(state.filters.sort_order == order, order.to_string())
                        .clicked()
                    {
                        intents.act(Action::SetSortOrder(order));
                    }
                }
            });

            ui.separator();
            ui.heading("Summary");
            let stats = state.stats();
            egui::Grid::new("summary_grid")
                .num_columns(2)
                .show(ui, |ui: &mut Ui| {
                    ui.label("Raw files");
                    ui.label(stats.total_files.to_string());
                    ui.end_row();
                    ui.label("With detections");
                    ui.label(stats.detected_files.to_string());
                    ui.end_row();
                    ui.label("Match rate");
                    ui.label(format!("{:.1}%", stats.match_rate()));
                    ui.end_row();
                    ui.label("High confidence");
                    ui.label(stats.high_confidence.to_string());
                    ui.end_row();
                    ui.label("Mean density");
                    ui.label(
                        RichText::new(format!("{:.0}%", stats.mean_density * 100.0))
                            .color(density_color(stats.mean_density)),
                    );
                    ui.end_row();
                    ui.label("Shown");
                    ui.label(state.visible_count().to_string());
                    ui.end_row();
                });

            ui.separator();
            ui.strong("Transmission mode");
            for (label, color) in colors.legend_entries() {
                ui.label(RichText::new(format!("● {label}")).color(color));
            }
        });
}

/// One-line summary above the dataset browser.
pub fn catalog_summary(ui: &mut Ui, state: &SessionState) {
    let total: u64 = crate::data::filter::total_size(&state.catalog);
    ui.horizontal(|ui: &mut Ui| {
        ui.label(format!("{} raw files", state.catalog.len()));
        ui.separator();
        ui.label(format!("{} total", format_file_size(total)));
        ui.separator();
        ui.label(format!("Cruise {}", state.cruise));
    });
}
