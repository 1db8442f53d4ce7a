use std::fmt;
use std::future::Future;

use reqwest::header::CACHE_CONTROL;
use serde::Serialize;

use super::cache::{ImageCache, ImageHandle, Lookup};
use crate::config::SurveyConfig;
use crate::data::filename::extract_cruise;
use crate::error::SurveyError;

// ---------------------------------------------------------------------------
// Image identity
// ---------------------------------------------------------------------------

/// Which rendering of a raw file to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ImageKind {
    #[default]
    Echogram,
    Spectrogram,
}

impl ImageKind {
    pub const ALL: [ImageKind; 2] = [ImageKind::Echogram, ImageKind::Spectrogram];

    fn slug(self) -> &'static str {
        match self {
            ImageKind::Echogram => "echogram",
            ImageKind::Spectrogram => "spectrogram",
        }
    }
}

impl fmt::Display for ImageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageKind::Echogram => write!(f, "Echogram"),
            ImageKind::Spectrogram => write!(f, "Spectrogram"),
        }
    }
}

/// Cache key: one image per kind and raw file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageKey {
    pub kind: ImageKind,
    pub filename: String,
    /// Cruise the file belongs to, as listed in the catalog.
    pub cruise: String,
}

impl ImageKey {
    pub fn new(kind: ImageKind, filename: impl Into<String>, cruise: impl Into<String>) -> Self {
        Self {
            kind,
            filename: filename.into(),
            cruise: cruise.into(),
        }
    }

    /// Session-local URI for the `serial`-th image stored under this key.
    ///
    /// Image loaders pick a decoder by extension, so the URI always ends in
    /// `.png`; the actual format is sniffed from the bytes.
    pub fn uri(&self, serial: u64) -> String {
        format!("bytes://{}/{serial}/{}.png", self.kind.slug(), self.filename)
    }

    /// The catalog's cruise, or one guessed from the filename when unknown.
    fn cruise_or_guess(&self) -> String {
        if self.cruise.trim().is_empty() {
            extract_cruise(&self.filename)
        } else {
            self.cruise.clone()
        }
    }
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Something that can produce image bytes for a key.
pub trait ImageTransport {
    fn fetch(&self, key: &ImageKey) -> impl Future<Output = Result<Vec<u8>, SurveyError>> + Send;
}

#[derive(Debug, Serialize)]
struct ExtractRequest<'a> {
    file_path: &'a str,
}

/// HTTP client for the echogram and spectrogram backends.
#[derive(Debug, Clone)]
pub struct ImageryClient {
    http: reqwest::Client,
    config: SurveyConfig,
}

impl ImageryClient {
    pub fn new(http: reqwest::Client, config: SurveyConfig) -> Self {
        Self { http, config }
    }

    async fn request(&self, key: &ImageKey) -> Result<reqwest::Response, reqwest::Error> {
        match key.kind {
            ImageKind::Echogram => {
                let cruise = key.cruise_or_guess();
                self.http
                    .get(&self.config.generation_url)
                    .query(&[("filename", key.filename.as_str()), ("cruise", cruise.as_str())])
                    .header(CACHE_CONTROL, "no-cache")
                    .send()
                    .await
            }
            ImageKind::Spectrogram => {
                let file_path = format!("data/{}", key.filename);
                self.http
                    .post(&self.config.extraction_url)
                    .header(CACHE_CONTROL, "no-cache")
                    .json(&ExtractRequest {
                        file_path: &file_path,
                    })
                    .send()
                    .await
            }
        }
    }
}

impl ImageTransport for ImageryClient {
    async fn fetch(&self, key: &ImageKey) -> Result<Vec<u8>, SurveyError> {
        log::debug!("Requesting {} for {}", key.kind, key.filename);

        let response = self
            .request(key)
            .await
            .map_err(|e| SurveyError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| SurveyError::Network(e.to_string()))?;

        if !status.is_success() {
            let err = SurveyError::from_response_body(
                status.as_u16(),
                &body,
                format!(
                    "Failed to generate {} (Status: {})",
                    key.kind.slug(),
                    status.as_u16()
                ),
            );
            log::error!("{} for {} failed: {err}", key.kind, key.filename);
            return Err(err);
        }

        log::info!(
            "Received {} for {} ({} bytes)",
            key.kind,
            key.filename,
            body.len()
        );
        Ok(body.to_vec())
    }
}

// ---------------------------------------------------------------------------
// Cached request
// ---------------------------------------------------------------------------

/// Return the cached image for `key`, fetching it once on a miss.
///
/// A key that is already being fetched elsewhere is refused with
/// [`SurveyError::InFlight`] rather than requested twice.
pub async fn request_image<T: ImageTransport>(
    cache: &mut ImageCache,
    transport: &T,
    key: &ImageKey,
) -> Result<ImageHandle, SurveyError> {
    match cache.lookup(key) {
        Lookup::Cached(handle) => Ok(handle),
        Lookup::InFlight => Err(SurveyError::InFlight(key.filename.clone())),
        Lookup::Miss => {
            let result = transport.fetch(key).await;
            cache.complete(key.clone(), result)
        }
    }
}
