use eframe::egui;

use crate::color::ModeColors;
use crate::config::SurveyConfig;
use crate::data::loader::{read_detection_file, synthetic_feed};
use crate::data::model::{DetectionFeed, FeedOrigin};
use crate::state::{reduce, Action, SessionState, Tab};
use crate::tasks::{TaskOutcome, Tasks};
use crate::ui::viewer::ImageViewer;
use crate::ui::{panels, plot, tables, Command, Intents};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct SurveyScopeApp {
    pub state: SessionState,
    config: SurveyConfig,
    tasks: Tasks,
    viewer: ImageViewer,
    colors: ModeColors,
    waker_installed: bool,
}

impl SurveyScopeApp {
    /// Build the app and start loading the catalog and detections.
    pub fn new(config: SurveyConfig, tasks: Tasks) -> Self {
        let mut app = Self {
            state: SessionState::new(&config),
            config,
            tasks,
            viewer: ImageViewer::default(),
            colors: ModeColors::default(),
            waker_installed: false,
        };
        app.run(Command::ReloadCatalog);
        app.run(Command::LoadDetectionFeed);
        app
    }

    fn dispatch(&mut self, action: Action) {
        let state = std::mem::replace(&mut self.state, SessionState::new(&self.config));
        self.state = reduce(state, action);
    }

    fn run(&mut self, command: Command) {
        match command {
            Command::ReloadCatalog => {
                self.dispatch(Action::CatalogRequested);
                self.tasks.fetch_catalog(self.state.cruise.clone());
            }
            Command::LoadDetectionFeed => match self.config.detection_feed_url.clone() {
                Some(url) => {
                    self.dispatch(Action::DetectionsRequested);
                    self.tasks.fetch_detections(url);
                }
                None => self.dispatch(Action::DetectionsLoaded(synthetic_feed(
                    "no detection feed configured",
                ))),
            },
            Command::OpenDetectionFile => {
                let Some(path) = rfd::FileDialog::new()
                    .add_filter("CSV", &["csv"])
                    .pick_file()
                else {
                    return;
                };
                match read_detection_file(&path) {
                    Ok(records) => {
                        log::info!("Loaded {} detections from {}", records.len(), path.display());
                        self.dispatch(Action::DetectionsLoaded(DetectionFeed {
                            records,
                            origin: FeedOrigin::Live {
                                source: path.display().to_string(),
                            },
                        }));
                    }
                    Err(e) => {
                        log::error!("Failed to load detections: {e:#}");
                        self.dispatch(Action::DetectionsFailed(format!("{e:#}")));
                    }
                }
            }
            Command::UseSyntheticDetections => {
                self.dispatch(Action::DetectionsLoaded(synthetic_feed("selected by user")))
            }
        }
    }

    fn absorb(&mut self, ctx: &egui::Context, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Catalog { cruise, result } => match result {
                Ok(files) => {
                    log::info!("Catalog for {cruise}: {} files", files.len());
                    self.dispatch(Action::CatalogLoaded(files));
                }
                Err(e) => {
                    log::error!("Catalog for {cruise} failed: {e}");
                    self.dispatch(Action::CatalogFailed(e.to_string()));
                }
            },
            TaskOutcome::Detections(feed) => self.dispatch(Action::DetectionsLoaded(feed)),
            TaskOutcome::Image { key, result } => self.viewer.on_image(ctx, key, result),
        }
    }
}

impl eframe::App for SurveyScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.waker_installed {
            let repaint = ctx.clone();
            self.tasks.set_waker(move || repaint.request_repaint());
            self.waker_installed = true;
        }

        for outcome in self.tasks.drain() {
            self.absorb(ctx, outcome);
        }

        let mut intents = Intents::default();

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &self.state, &mut intents);
        });

        // ---- Left side panel: analyzer filters ----
        if self.state.tab == Tab::Analyzer {
            egui::SidePanel::left("filter_panel")
                .default_width(220.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::side_panel(ui, &self.state, &mut intents, &self.colors);
                });
        }

        // ---- Central panel: active tab ----
        egui::CentralPanel::default().show(ctx, |ui| match self.state.tab {
            Tab::Browser => {
                if !panels::catalog_error(ui, &self.state, &mut intents) {
                    panels::catalog_summary(ui, &self.state);
                }
                ui.separator();
                tables::browser_table(ui, &self.state, &mut intents, &self.colors);
            }
            Tab::Analyzer => {
                plot::density_plot(ui, &self.state, &self.colors);
                ui.separator();
                tables::detection_table(ui, &self.state, &mut intents);
            }
            Tab::Viewer => {
                self.viewer.show(ui, &self.state, &mut intents, &self.tasks);
            }
        });

        let was_viewing = self.state.tab == Tab::Viewer;
        for action in intents.actions {
            self.dispatch(action);
        }
        if was_viewing && self.state.tab != Tab::Viewer {
            self.viewer.teardown(ctx);
        }
        for command in intents.commands {
            self.run(command);
        }
    }
}
