use crate::data::loader::{parse_detections, with_fallback};
use crate::data::model::{DetectionFeed, DetectionRecord};
use crate::error::SurveyError;

/// Download and parse a detection CSV feed.
pub async fn fetch_feed(
    http: &reqwest::Client,
    url: &str,
) -> Result<Vec<DetectionRecord>, SurveyError> {
    log::debug!("Requesting detection feed {url}");

    let response = http
        .get(url)
        .send()
        .await
        .map_err(|e| SurveyError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SurveyError::Backend {
            status: status.as_u16(),
            message: format!("HTTP error! status: {}", status.as_u16()),
        });
    }

    let text = response
        .text()
        .await
        .map_err(|e| SurveyError::Network(e.to_string()))?;
    parse_detections(&text)
}

/// Fetch a feed, falling back to synthetic detections on any failure.
///
/// The returned [`DetectionFeed::origin`] says which path was taken.
pub async fn load_detection_feed(http: &reqwest::Client, url: &str) -> DetectionFeed {
    with_fallback(url, fetch_feed(http, url).await)
}
