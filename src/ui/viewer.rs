use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use super::Intents;
use crate::color::{confidence_color, density_color};
use crate::error::SurveyError;
use crate::remote::{ImageCache, ImageKey, ImageKind, Lookup};
use crate::state::{Action, SessionState};
use crate::tasks::Tasks;

// ---------------------------------------------------------------------------
// Viewer state
// ---------------------------------------------------------------------------

/// View-local state of the echogram / spectrogram viewer.
///
/// Owns the image cache. Every handle that leaves the cache is forgotten by
/// egui's image loaders so decoded textures do not pile up.
#[derive(Debug, Default)]
pub struct ImageViewer {
    cache: ImageCache,
    /// The image the user asked for most recently.
    current: Option<ImageKey>,
    error: Option<String>,
}

impl ImageViewer {
    /// Show `key`, handing it to `fetch` unless it is cached or already on
    /// its way.
    pub fn request(&mut self, key: ImageKey, fetch: impl FnOnce(ImageKey)) {
        self.error = None;
        match self.cache.lookup(&key) {
            Lookup::Cached(_) => log::debug!("{} for {} served from cache", key.kind, key.filename),
            Lookup::InFlight => log::debug!("{} for {} already requested", key.kind, key.filename),
            Lookup::Miss => fetch(key.clone()),
        }
        self.current = Some(key);
    }

    /// Store a finished fetch. Errors only surface for the image on screen.
    pub fn on_image(
        &mut self,
        ctx: &egui::Context,
        key: ImageKey,
        result: Result<Vec<u8>, SurveyError>,
    ) {
        let is_current = self.current.as_ref() == Some(&key);
        match self.cache.complete(key, result) {
            Ok(handle) => {
                ctx.include_bytes(handle.uri.clone(), handle.bytes.clone());
                if is_current {
                    self.error = None;
                }
            }
            Err(SurveyError::Stale(name)) => {
                log::debug!("Ignoring image for {name}, the viewer no longer waits on it");
            }
            Err(e) => {
                if is_current {
                    self.error = Some(e.to_string());
                }
            }
        }
        self.forget_released(ctx);
    }

    /// Release every cached image. Called when the viewer is left.
    pub fn teardown(&mut self, ctx: &egui::Context) {
        self.cache.clear();
        self.forget_released(ctx);
        self.current = None;
        self.error = None;
    }

    fn forget_released(&mut self, ctx: &egui::Context) {
        for handle in self.cache.take_released() {
            ctx.forget_image(&handle.uri);
        }
    }

    fn is_loading(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|k| self.cache.is_in_flight(k))
    }

    // -----------------------------------------------------------------------
    // Rendering
    // -----------------------------------------------------------------------

    /// Matched-file list on the left, image and details on the right.
    pub fn show(&mut self, ui: &mut Ui, state: &SessionState, intents: &mut Intents, tasks: &Tasks) {
        let matches = state.all_matches();
        if matches.is_empty() {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("No detection data matched to raw files yet. Load detections first.");
            });
            return;
        }

        egui::SidePanel::left("viewer_files")
            .default_width(280.0)
            .resizable(true)
            .show_inside(ui, |ui: &mut Ui| {
                ui.heading("Detected files");
                ui.separator();
                ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui: &mut Ui| {
                        for m in &matches {
                            let selected =
                                state.selected.as_deref() == Some(m.file.filename.as_str());
                            let label = RichText::new(format!(
                                "{}  {:.0}%",
                                m.file.filename,
                                m.detection.sardine_density * 100.0
                            ))
                            .color(density_color(m.detection.sardine_density));
                            if ui.selectable_label(selected, label).clicked() {
                                intents.act(Action::SelectFile(Some(m.file.filename.clone())));
                            }
                        }
                    });
            });

        egui::CentralPanel::default().show_inside(ui, |ui: &mut Ui| {
            let Some(selected) = state.selected_match() else {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.heading("Select a file to visualize");
                });
                return;
            };

            ui.horizontal(|ui: &mut Ui| {
                ui.strong(format!("Analyzing: {}", selected.file.filename));
                ui.separator();
                for kind in ImageKind::ALL {
                    if ui
                        .selectable_label(state.view_kind == kind, kind.to_string())
                        .clicked()
                    {
                        intents.act(Action::SetViewKind(kind));
                    }
                }
                ui.separator();
                let generate = ui.add_enabled(
                    !self.is_loading(),
                    egui::Button::new(format!("Generate {}", state.view_kind)),
                );
                if generate.clicked() {
                    match generate_key(state) {
                        Ok(key) => self.request(key, |k| tasks.fetch_image(k)),
                        Err(e) => self.error = Some(e.to_string()),
                    }
                }
            });

            if let Some(err) = &self.error {
                ui.label(RichText::new(err).color(Color32::RED));
            }

            let wanted = ImageKey::new(
                state.view_kind,
                selected.file.filename.clone(),
                selected.file.cruise.clone(),
            );
            if let Some(handle) = self.cache.get(&wanted) {
                ui.add(
                    egui::Image::from_uri(handle.uri.clone())
                        .max_height(ui.available_height() * 0.7)
                        .shrink_to_fit(),
                );
            } else if self.cache.is_in_flight(&wanted) {
                ui.horizontal(|ui: &mut Ui| {
                    ui.spinner();
                    ui.label(format!("Generating {}…", state.view_kind));
                });
            } else {
                ui.weak(format!("No {} generated yet for this file.", state.view_kind));
            }

            ui.separator();
            let d = selected.detection;
            egui::Grid::new("detection_details")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui: &mut Ui| {
                    ui.label("Detected");
                    ui.label(&d.timestamp);
                    ui.end_row();
                    ui.label("Sardine density");
                    ui.label(
                        RichText::new(format!("{:.0}%", d.sardine_density * 100.0))
                            .color(density_color(d.sardine_density)),
                    );
                    ui.end_row();
                    ui.label("Confidence");
                    ui.label(
                        RichText::new(format!("{:.0}%", d.confidence * 100.0))
                            .color(confidence_color(d.confidence)),
                    );
                    ui.end_row();
                    if let Some((lat, lon)) = d.position() {
                        ui.label("Position");
                        ui.label(format!("{lat:.2}°N, {:.2}°W", lon.abs()));
                        ui.end_row();
                    }
                    if let Some(depth) = d.depth {
                        ui.label("Depth");
                        ui.label(format!("{depth:.0} m"));
                        ui.end_row();
                    }
                    if let Some(notes) = &d.notes {
                        ui.label("Notes");
                        ui.label(notes);
                        ui.end_row();
                    }
                    ui.label("Mode");
                    ui.label(selected.file.transmission_mode.to_string());
                    ui.end_row();
                    ui.label("Size");
                    ui.label(&selected.file.formatted_size);
                    ui.end_row();
                });
            ui.hyperlink_to("Download raw file", &selected.file.source_url);
        });
    }
}

/// Key for the image the Generate button should fetch.
fn generate_key(state: &SessionState) -> Result<ImageKey, SurveyError> {
    let selected = state
        .selected_match()
        .ok_or_else(|| SurveyError::Validation("Please select a file first.".into()))?;
    Ok(ImageKey::new(
        state.view_kind,
        selected.file.filename.clone(),
        selected.file.cruise.clone(),
    ))
}
