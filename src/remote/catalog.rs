//! File catalog client.
//!
//! The canonical listing contract is
//!
//! ```json
//! { "files": [ { "filename": "...", "size": 123, "url": "...",
//!                "datetime": "2021-08-13 08:45:12", "cruise": "RL2107" } ] }
//! ```
//!
//! Older listing services return S3 object summaries instead
//! (`{ "key", "size", "last_modified" }`, bare or under `files`). Those go
//! through their own adapter and then share one normalization step.

use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use crate::config::SurveyConfig;
use crate::data::filename::parse_filename;
use crate::data::format::format_file_size;
use crate::data::model::RawFileRecord;
use crate::error::SurveyError;

// ---------------------------------------------------------------------------
// Listing schemas
// ---------------------------------------------------------------------------

/// Which response shape a listing body used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingSchema {
    /// `{ files: [{ filename, size, url, datetime, cruise? }] }`
    Canonical,
    /// `[{ key, size, last_modified }]`, bare or under `files`.
    S3Objects,
}

/// A listing entry after schema adaptation, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub filename: String,
    pub size: u64,
    pub url: Option<String>,
    /// Combined `"<date> <time>"` string.
    pub datetime: Option<String>,
    pub cruise: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CanonicalFile {
    filename: String,
    #[serde(default)]
    size: u64,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    datetime: Option<String>,
    #[serde(default)]
    cruise: Option<String>,
}

#[derive(Debug, Deserialize)]
struct S3Object {
    #[serde(alias = "Key")]
    key: String,
    #[serde(default, alias = "Size")]
    size: u64,
    #[serde(default, alias = "LastModified")]
    last_modified: Option<String>,
}

/// Detect the schema of a listing body and adapt its entries.
pub fn decode_listing(body: &JsonValue) -> Result<(ListingSchema, Vec<ListingEntry>), SurveyError> {
    let items = body
        .get("files")
        .and_then(JsonValue::as_array)
        .or_else(|| body.as_array())
        .ok_or_else(|| SurveyError::Parse("listing response has no files array".into()))?;

    let schema = match items.first() {
        None => ListingSchema::Canonical,
        Some(first) if first.get("filename").is_some() => ListingSchema::Canonical,
        Some(first) if first.get("key").is_some() || first.get("Key").is_some() => {
            ListingSchema::S3Objects
        }
        Some(_) => {
            return Err(SurveyError::Parse(
                "listing entries have neither 'filename' nor 'key'".into(),
            ))
        }
    };

    let entries = match schema {
        ListingSchema::Canonical => adapt_canonical(items)?,
        ListingSchema::S3Objects => adapt_s3_objects(items)?,
    };
    Ok((schema, entries))
}

fn adapt_canonical(items: &[JsonValue]) -> Result<Vec<ListingEntry>, SurveyError> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let file = CanonicalFile::deserialize(item)
                .map_err(|e| SurveyError::Parse(format!("listing entry {i}: {e}")))?;
            Ok(ListingEntry {
                filename: file.filename,
                size: file.size,
                url: file.url.filter(|u| !u.is_empty()),
                datetime: file.datetime,
                cruise: file.cruise.filter(|c| !c.is_empty()),
            })
        })
        .collect()
}

fn adapt_s3_objects(items: &[JsonValue]) -> Result<Vec<ListingEntry>, SurveyError> {
    let mut entries = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        let object = S3Object::deserialize(item)
            .map_err(|e| SurveyError::Parse(format!("listing entry {i}: {e}")))?;
        // Directory placeholders end with '/'.
        let Some(filename) = object.key.rsplit('/').next().filter(|n| !n.is_empty()) else {
            continue;
        };
        entries.push(ListingEntry {
            filename: filename.to_string(),
            size: object.size,
            url: None,
            datetime: object.last_modified.map(|lm| space_separated(&lm)),
            cruise: None,
        });
    }
    Ok(entries)
}

/// RFC 3339 timestamps become `YYYY-MM-DD HH:MM:SS`; anything else is kept.
fn space_separated(timestamp: &str) -> String {
    match DateTime::parse_from_rfc3339(timestamp) {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => timestamp.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Turn adapted entries into catalog records sorted by filename.
///
/// `cruise` is used for entries that do not name their own.
pub fn normalize_entries(
    entries: Vec<ListingEntry>,
    cruise: &str,
    config: &SurveyConfig,
) -> Vec<RawFileRecord> {
    let mut records: Vec<RawFileRecord> = entries
        .into_iter()
        .map(|entry| {
            let cruise = entry.cruise.unwrap_or_else(|| cruise.to_string());
            let last_modified = entry.datetime.unwrap_or_default();
            let (parsed_date, parsed_time) = match last_modified.split_once(' ') {
                Some((date, time)) => (date.to_string(), time.to_string()),
                None => (last_modified.clone(), String::new()),
            };
            let acquisition = parse_filename(&entry.filename);
            let source_url = entry
                .url
                .unwrap_or_else(|| object_url(config, &cruise, &entry.filename));

            RawFileRecord {
                transmission_mode: acquisition.mode,
                formatted_size: format_file_size(entry.size),
                size: entry.size,
                last_modified,
                source_url,
                parsed_date,
                parsed_time,
                acquisition,
                cruise,
                filename: entry.filename,
            }
        })
        .collect();

    records.sort_by(|a, b| a.filename.cmp(&b.filename));
    records
}

/// Direct object-store URL for a raw file.
pub fn object_url(config: &SurveyConfig, cruise: &str, filename: &str) -> String {
    format!(
        "{}/data/raw/{}/{}/EK80/{}",
        config.object_store_base, config.ship_name, cruise, filename
    )
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Fetches the file catalog of a cruise from the listing backend.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: reqwest::Client,
    config: SurveyConfig,
}

impl CatalogClient {
    pub fn new(http: reqwest::Client, config: SurveyConfig) -> Self {
        Self { http, config }
    }

    /// One request, no retry. Records come back sorted by filename.
    pub async fn fetch_catalog(&self, cruise: &str) -> Result<Vec<RawFileRecord>, SurveyError> {
        log::debug!("Requesting file list for {cruise} from {}", self.config.listing_url);

        let response = self
            .http
            .get(&self.config.listing_url)
            .query(&[("cruise", cruise)])
            .send()
            .await
            .map_err(|e| SurveyError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| SurveyError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(SurveyError::from_response_body(
                status.as_u16(),
                &body,
                format!("Failed to fetch file list (status {})", status.as_u16()),
            ));
        }

        let value: JsonValue = serde_json::from_slice(&body)
            .map_err(|e| SurveyError::Parse(format!("listing body is not JSON: {e}")))?;
        let (schema, entries) = decode_listing(&value)?;
        let records = normalize_entries(entries, cruise, &self.config);

        log::info!(
            "Listed {} files for {cruise} ({schema:?} schema)",
            records.len()
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::TransmissionMode;
    use serde_json::json;

    #[test]
    fn canonical_listing_is_normalized_and_sorted() {
        let body = json!({
            "files": [
                {
                    "filename": "2107RL_FM-D20210814-T100000.raw",
                    "size": 1536,
                    "url": "https://bucket/b.raw",
                    "datetime": "2021-08-14 10:05:00"
                },
                {
                    "filename": "2107RL_CW-D20210813-T084512.raw",
                    "size": 0,
                    "url": "https://bucket/a.raw",
                    "datetime": "2021-08-13 08:50:00",
                    "cruise": "RL2107"
                }
            ]
        });
        let (schema, entries) = decode_listing(&body).unwrap();
        assert_eq!(schema, ListingSchema::Canonical);

        let records = normalize_entries(entries, "RL9999", &SurveyConfig::default());
        assert_eq!(records[0].filename, "2107RL_CW-D20210813-T084512.raw");
        assert_eq!(records[0].parsed_date, "2021-08-13");
        assert_eq!(records[0].parsed_time, "08:50:00");
        assert_eq!(records[0].formatted_size, "0 Bytes");
        assert_eq!(records[0].transmission_mode, TransmissionMode::Cw);
        assert_eq!(records[0].cruise, "RL2107");
        assert_eq!(records[0].acquisition.time.as_deref(), Some("08:45:12"));

        assert_eq!(records[1].formatted_size, "1.5 KB");
        assert_eq!(records[1].transmission_mode, TransmissionMode::Fm);
        assert_eq!(records[1].cruise, "RL9999");
        assert_eq!(records[1].source_url, "https://bucket/b.raw");
    }

    #[test]
    fn missing_datetime_yields_empty_parts() {
        let body = json!({ "files": [ { "filename": "x.raw", "size": 10 } ] });
        let (_, entries) = decode_listing(&body).unwrap();
        let records = normalize_entries(entries, "RL2107", &SurveyConfig::default());
        assert_eq!(records[0].parsed_date, "");
        assert_eq!(records[0].parsed_time, "");
        assert_eq!(records[0].transmission_mode, TransmissionMode::Unknown);
        assert_eq!(
            records[0].source_url,
            "https://noaa-wcsd-pds.s3.amazonaws.com/data/raw/Reuben_Lasker/RL2107/EK80/x.raw"
        );
    }

    #[test]
    fn datetime_splits_on_first_space_only() {
        let body = json!({ "files": [ { "filename": "x.raw", "datetime": "2021-08-13 08:00:00 UTC" } ] });
        let (_, entries) = decode_listing(&body).unwrap();
        let records = normalize_entries(entries, "RL2107", &SurveyConfig::default());
        assert_eq!(records[0].parsed_date, "2021-08-13");
        assert_eq!(records[0].parsed_time, "08:00:00 UTC");
    }

    #[test]
    fn s3_objects_adapter() {
        let body = json!([
            { "key": "data/raw/Reuben_Lasker/RL2107/EK80/", "size": 0 },
            {
                "key": "data/raw/Reuben_Lasker/RL2107/EK80/2107RL_CW-D20210813-T084512.raw",
                "size": 1048576,
                "last_modified": "2021-09-01T12:30:00+00:00"
            },
            { "key": "loose.raw", "size": 5, "last_modified": "yesterday" }
        ]);
        let (schema, entries) = decode_listing(&body).unwrap();
        assert_eq!(schema, ListingSchema::S3Objects);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].filename, "2107RL_CW-D20210813-T084512.raw");
        assert_eq!(entries[0].datetime.as_deref(), Some("2021-09-01 12:30:00"));
        assert_eq!(entries[1].datetime.as_deref(), Some("yesterday"));

        let records = normalize_entries(entries, "RL2107", &SurveyConfig::default());
        assert_eq!(records[0].formatted_size, "1 MB");
        assert!(records[0].source_url.ends_with("/RL2107/EK80/2107RL_CW-D20210813-T084512.raw"));
        assert_eq!(records[1].parsed_date, "yesterday");
    }

    #[test]
    fn s3_objects_under_files_key() {
        let body = json!({ "files": [ { "Key": "a/b.raw", "Size": 3, "LastModified": "2021-09-01T00:00:00Z" } ] });
        let (schema, entries) = decode_listing(&body).unwrap();
        assert_eq!(schema, ListingSchema::S3Objects);
        assert_eq!(entries[0].filename, "b.raw");
        assert_eq!(entries[0].size, 3);
    }

    #[test]
    fn unknown_shapes_are_parse_errors() {
        assert!(matches!(
            decode_listing(&json!({ "items": [] })),
            Err(SurveyError::Parse(_))
        ));
        assert!(matches!(
            decode_listing(&json!({ "files": [ { "name": "x" } ] })),
            Err(SurveyError::Parse(_))
        ));
        assert!(matches!(
            decode_listing(&json!({ "files": [ { "filename": 7 } ] })),
            Err(SurveyError::Parse(_))
        ));
    }

    #[test]
    fn empty_listing_is_fine() {
        let (schema, entries) = decode_listing(&json!({ "files": [] })).unwrap();
        assert_eq!(schema, ListingSchema::Canonical);
        assert!(entries.is_empty());
    }

    #[test]
    fn sort_is_case_sensitive_bytewise() {
        let entries = ["b.raw", "B.raw", "a.raw"]
            .iter()
            .map(|n| ListingEntry {
                filename: n.to_string(),
                size: 1,
                url: None,
                datetime: None,
                cruise: None,
            })
            .collect();
        let names: Vec<String> = normalize_entries(entries, "RL2107", &SurveyConfig::default())
            .into_iter()
            .map(|r| r.filename)
            .collect();
        assert_eq!(names, ["B.raw", "a.raw", "b.raw"]);
    }
}
