use thiserror::Error;

/// Errors surfaced by the survey clients and loaders.
///
/// The `Display` text is what ends up in the UI, so every variant renders as
/// a complete, human-readable sentence.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SurveyError {
    /// The request could not be sent or the connection dropped.
    #[error("Network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// A feed or listing body could not be understood.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Missing user input, e.g. no file selected.
    #[error("{0}")]
    Validation(String),

    /// A request for the same image is still outstanding.
    #[error("Request already in flight for {0}")]
    InFlight(String),

    /// A response arrived for a request its view no longer waits on.
    #[error("Discarded late response for {0}")]
    Stale(String),
}

impl SurveyError {
    /// Build a [`SurveyError::Backend`] from an error response body.
    ///
    /// Backends answer with JSON carrying either `message` or FastAPI's
    /// `detail`. Anything else falls back to `fallback`.
    pub fn from_response_body(status: u16, body: &[u8], fallback: String) -> Self {
        SurveyError::Backend {
            status,
            message: extract_message(body).unwrap_or(fallback),
        }
    }
}

fn extract_message(body: &[u8]) -> Option<String> {
    let value: serde_json::Value = serde_json::from_slice(body).ok()?;
    let field = value.get("message").or_else(|| value.get("detail"))?;
    match field {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        serde_json::Value::Null | serde_json::Value::String(_) => None,
        other => Some(other.to_string()),
    }
}

impl From<reqwest::Error> for SurveyError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SurveyError::Parse(err.to_string())
        } else {
            SurveyError::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_field_wins() {
        let err = SurveyError::from_response_body(
            500,
            br#"{"message": "bucket unavailable"}"#,
            "fallback".into(),
        );
        assert_eq!(err.to_string(), "bucket unavailable");
    }

    #[test]
    fn detail_field_is_used_when_message_missing() {
        let err = SurveyError::from_response_body(
            404,
            br#"{"detail": "File not found"}"#,
            "fallback".into(),
        );
        assert_eq!(
            err,
            SurveyError::Backend {
                status: 404,
                message: "File not found".into()
            }
        );
    }

    #[test]
    fn structured_detail_is_rendered_as_json() {
        let err = SurveyError::from_response_body(
            422,
            br#"{"detail": [{"loc": ["query", "filename"]}]}"#,
            "fallback".into(),
        );
        assert!(err.to_string().contains("filename"));
    }

    #[test]
    fn non_json_body_falls_back() {
        let err = SurveyError::from_response_body(
            502,
            b"<html>Bad Gateway</html>",
            "Failed to generate echogram (Status: 502)".into(),
        );
        assert_eq!(err.to_string(), "Failed to generate echogram (Status: 502)");
    }
}
