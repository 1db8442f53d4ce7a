use eframe::egui;
use survey_scope::app::SurveyScopeApp;
use survey_scope::config::SurveyConfig;
use survey_scope::tasks::Tasks;

fn main() -> eframe::Result {
    env_logger::init();

    let config = SurveyConfig::discover();
    log::info!("Listing endpoint: {}", config.listing_url);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([720.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Survey Scope – NOAA Acoustic Dashboard",
        options,
        Box::new(move |cc| {
            // Generated images are registered as bytes and decoded by these loaders.
            egui_extras::install_image_loaders(&cc.egui_ctx);
            let tasks = Tasks::new(&config).map_err(|e| format!("{e:#}"))?;
            Ok(Box::new(SurveyScopeApp::new(config, tasks)))
        }),
    )
}
