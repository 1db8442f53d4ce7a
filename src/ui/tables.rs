use eframe::egui::{self, Align, Layout, ProgressBar, RichText, Ui};
use egui_extras::{Column, TableBuilder};

use super::Intents;
use crate::color::{confidence_color, density_color, ModeColors};
use crate::data::filter::paginate;
use crate::state::{Action, SessionState};

const ROW_HEIGHT: f32 = 22.0;

// ---------------------------------------------------------------------------
// Dataset browser
// ---------------------------------------------------------------------------

/// Search fields, paginated catalog table and download links.
pub fn browser_table(ui: &mut Ui, state: &SessionState, intents: &mut Intents, colors: &ModeColors) {
    ui.horizontal(|ui: &mut Ui| {
        let mut search = state.query.search.clone();
        let edit = egui::TextEdit::singleline(&mut search)
            .hint_text("Search by filename…")
            .desired_width(260.0);
        if ui.add(edit).changed() {
            intents.act(Action::SetSearch(search));
        }

        let mut date = state.query.date.clone();
        let edit = egui::TextEdit::singleline(&mut date)
            .hint_text("YYYY-MM-DD")
            .desired_width(100.0);
        if ui.add(edit).changed() {
            intents.act(Action::SetDate(date));
        }
    });
    ui.label(format!("Raw files ({} found)", state.browsed_count()));
    ui.separator();

    let files: Vec<_> = state.browsed_files().collect();
    let page = paginate(&files, state.page_size, state.browser_page);

    let table_height = (ui.available_height() - 36.0).max(ROW_HEIGHT * 4.0);
    ui.push_id("browser_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(table_height)
            .cell_layout(Layout::left_to_right(Align::Center))
            .column(Column::remainder().at_least(260.0))
            .column(Column::auto().at_least(60.0))
            .column(Column::auto().at_least(140.0))
            .column(Column::auto().at_least(80.0))
            .column(Column::auto())
            .header(ROW_HEIGHT, |mut header| {
                for title in ["Filename", "Mode", "Last modified", "Size", ""] {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for file in page {
                    body.row(ROW_HEIGHT, |mut row| {
                        row.col(|ui: &mut Ui| {
                            ui.monospace(&file.filename);
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(
                                RichText::new(file.transmission_mode.to_string())
                                    .color(colors.color_for(file.transmission_mode)),
                            );
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(format!("{} {}", file.parsed_date, file.parsed_time));
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(&file.formatted_size);
                        });
                        row.col(|ui: &mut Ui| {
                            ui.hyperlink_to("Download", &file.source_url);
                        });
                    });
                }
            });
    });

    if let Some(page) = pager(
        ui,
        "browser",
        state.browser_page,
        state.browser_page_count(),
        files.len(),
        state.page_size,
    ) {
        intents.act(Action::SetBrowserPage(page));
    }
}

// ---------------------------------------------------------------------------
// Detection analyzer
// ---------------------------------------------------------------------------

/// Paginated table of matched files passing the filters.
pub fn detection_table(ui: &mut Ui, state: &SessionState, intents: &mut Intents) {
    let matches = state.visible_matches();
    if matches.is_empty() {
        ui.label("No matched files pass the current filters.");
        return;
    }
    let page = paginate(&matches, state.page_size, state.analyzer_page);

    ui.push_id("detection_table", |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .max_scroll_height(ROW_HEIGHT * (state.page_size as f32 + 1.0))
            .cell_layout(Layout::left_to_right(Align::Center))
            .column(Column::remainder().at_least(240.0))
            .column(Column::auto().at_least(120.0))
            .column(Column::auto().at_least(110.0))
            .column(Column::auto().at_least(70.0))
            .column(Column::auto().at_least(120.0))
            .column(Column::auto())
            .header(ROW_HEIGHT, |mut header| {
                for title in ["Filename", "Detected", "Density", "Confidence", "Position", ""] {
                    header.col(|ui: &mut Ui| {
                        ui.strong(title);
                    });
                }
            })
            .body(|mut body| {
                for m in page {
                    let d = m.detection;
                    body.row(ROW_HEIGHT, |mut row| {
                        row.col(|ui: &mut Ui| {
                            let selected = state.selected.as_deref() == Some(m.file.filename.as_str());
                            if ui.selectable_label(selected, &m.file.filename).clicked() {
                                intents.act(Action::SelectFile(Some(m.file.filename.clone())));
                            }
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(short_timestamp(&d.timestamp));
                        });
                        row.col(|ui: &mut Ui| {
                            ui.add(
                                ProgressBar::new(d.sardine_density as f32)
                                    .desired_width(100.0)
                                    .fill(density_color(d.sardine_density))
                                    .text(format!("{:.0}%", d.sardine_density * 100.0)),
                            );
                        });
                        row.col(|ui: &mut Ui| {
                            ui.label(
                                RichText::new(format!("{:.0}%", d.confidence * 100.0))
                                    .color(confidence_color(d.confidence)),
                            );
                        });
                        row.col(|ui: &mut Ui| match d.position() {
                            Some((lat, lon)) => {
                                ui.label(format!("{lat:.2}, {lon:.2}"));
                            }
                            None => {
                                ui.weak("N/A");
                            }
                        });
                        row.col(|ui: &mut Ui| {
                            ui.hyperlink_to("Download", &m.file.source_url);
                        });
                    });
                }
            });
    });

    if let Some(page) = pager(
        ui,
        "analyzer",
        state.analyzer_page,
        state.analyzer_page_count(),
        matches.len(),
        state.page_size,
    ) {
        intents.act(Action::SetAnalyzerPage(page));
    }
}

/// `2021-08-13T08:00:00Z` → `Aug 13, 08:00`. Unparsable input is shown as is.
pub fn short_timestamp(ts: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.format("%b %d, %H:%M").to_string())
        .unwrap_or_else(|_| ts.to_string())
}

// ---------------------------------------------------------------------------
// Pagination controls
// ---------------------------------------------------------------------------

/// Previous / next buttons. Returns the newly requested page, if any.
fn pager(
    ui: &mut Ui,
    id: &str,
    page: usize,
    pages: usize,
    total: usize,
    page_size: usize,
) -> Option<usize> {
    if pages <= 1 {
        return None;
    }
    let mut requested = None;
    ui.push_id(id, |ui: &mut Ui| {
        ui.horizontal(|ui: &mut Ui| {
            let first = (page - 1) * page_size + 1;
            let last = (page * page_size).min(total);
            ui.label(format!("Showing {first}-{last} of {total}"));
            if ui.add_enabled(page > 1, egui::Button::new("Previous")).clicked() {
                requested = Some(page - 1);
            }
            ui.label(format!("Page {page} of {pages}"));
            if ui.add_enabled(page < pages, egui::Button::new("Next")).clicked() {
                requested = Some(page + 1);
            }
        });
    });
    requested
}
