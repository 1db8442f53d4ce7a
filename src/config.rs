use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// File looked up in the working directory by [`SurveyConfig::discover`].
pub const CONFIG_FILE_NAME: &str = "survey-scope.json";

/// Cruise shown when nothing else is known.
pub const DEFAULT_CRUISE: &str = "RL2107";

// ---------------------------------------------------------------------------
// Endpoint configuration
// ---------------------------------------------------------------------------

/// Backend endpoints and display defaults.
///
/// Every field has a default so a partial JSON file only overrides what it
/// names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurveyConfig {
    /// `GET {listing_url}?cruise={id}` returns the file catalog.
    pub listing_url: String,
    /// `GET {generation_url}?filename=..&cruise=..` returns an echogram.
    pub generation_url: String,
    /// `POST {extraction_url}` with `{ "file_path": .. }` returns a spectrogram.
    pub extraction_url: String,
    /// Public object store holding the raw files.
    pub object_store_base: String,
    /// Ship directory under `data/raw/` in the object store.
    pub ship_name: String,
    pub default_cruise: String,
    /// Optional CSV feed of detections. Synthetic data is used without one.
    pub detection_feed_url: Option<String>,
    /// Rows per page in the browser and analyzer tables.
    pub page_size: usize,
    pub request_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for SurveyConfig {
    fn default() -> Self {
        Self {
            listing_url: "https://noaa-s3-backend.fly.dev/list-all-files".into(),
            generation_url: "https://noaa-echogram.fly.dev/generate-echogram".into(),
            extraction_url: "https://noaa-echogram.fly.dev/extract-spectrogram".into(),
            object_store_base: "https://noaa-wcsd-pds.s3.amazonaws.com".into(),
            ship_name: "Reuben_Lasker".into(),
            default_cruise: DEFAULT_CRUISE.into(),
            detection_feed_url: None,
            page_size: 20,
            request_timeout_secs: 60,
            user_agent: concat!("survey-scope/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl SurveyConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: SurveyConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config.sanitized())
    }

    /// Load [`CONFIG_FILE_NAME`] from the working directory if it exists.
    ///
    /// A missing file is normal. A broken one is logged and ignored.
    pub fn discover() -> Self {
        let path = Path::new(CONFIG_FILE_NAME);
        if !path.exists() {
            log::debug!("No {CONFIG_FILE_NAME} found, using built-in endpoints");
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => {
                log::info!("Loaded configuration from {}", path.display());
                config
            }
            Err(e) => {
                log::error!("Ignoring configuration file: {e:#}");
                Self::default()
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Build the shared HTTP client used by every backend client.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(self.user_agent.clone())
            .timeout(self.request_timeout())
            .build()
            .context("building HTTP client")
    }

    fn sanitized(mut self) -> Self {
        if self.page_size == 0 {
            self.page_size = Self::default().page_size;
        }
        let trimmed = self.object_store_base.trim_end_matches('/').len();
        self.object_store_base.truncate(trimmed);
        self
    }
}
