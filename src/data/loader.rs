use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};

use super::model::{DetectionFeed, DetectionRecord, FeedOrigin};
use crate::error::SurveyError;

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read a detection CSV from disk.
pub fn read_detection_file(path: &Path) -> Result<Vec<DetectionRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading detection CSV {}", path.display()))?;
    let records = parse_detections(&text)
        .with_context(|| format!("parsing detection CSV {}", path.display()))?;
    Ok(records)
}

/// Tag a live load result, replacing failures with synthetic detections.
///
/// An empty live feed counts as a failure: there is nothing to overlay.
pub fn with_fallback(
    source: &str,
    live: std::result::Result<Vec<DetectionRecord>, SurveyError>,
) -> DetectionFeed {
    match live {
        Ok(records) if !records.is_empty() => {
            log::info!("Loaded {} detections from {source}", records.len());
            DetectionFeed {
                records,
                origin: FeedOrigin::Live {
                    source: source.to_string(),
                },
            }
        }
        Ok(_) => synthetic_feed(format!("{source} contained no valid detections")),
        Err(e) => {
            log::warn!("Detection feed {source} unavailable, using synthetic data: {e}");
            synthetic_feed(e.to_string())
        }
    }
}

/// Synthetic detections tagged with the reason they were used.
pub fn synthetic_feed(reason: impl Into<String>) -> DetectionFeed {
    DetectionFeed {
        records: synthetic_detections(),
        origin: FeedOrigin::Synthetic {
            reason: reason.into(),
        },
    }
}

// ---------------------------------------------------------------------------
// CSV feed
// ---------------------------------------------------------------------------

/// Column aliases in priority order. Per row, the first non-empty cell wins.
const FILENAME_COLUMNS: &[&str] = &["filename", "file_name"];
const TIMESTAMP_COLUMNS: &[&str] = &["timestamp", "time"];
const DENSITY_COLUMNS: &[&str] = &["sardine_density", "density"];

/// CSV layout: header row, one detection per row.
///
/// Headers are matched after trimming and lower-casing. Recognised columns:
/// `filename`/`file_name`, `timestamp`/`time`, `sardine_density`/`density`,
/// `confidence`, `latitude`, `longitude`, `depth`, `notes`. Unknown columns
/// are ignored.
///
/// Rows without a filename or with a non-positive density are dropped.
/// Rows the CSV reader cannot split are skipped with a warning.
pub fn parse_detections(text: &str) -> std::result::Result<Vec<DetectionRecord>, SurveyError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: HashMap<String, usize> = reader
        .headers()
        .map_err(|e| SurveyError::Parse(format!("reading CSV headers: {e}")))?
        .iter()
        .enumerate()
        .map(|(i, h)| (h.trim().to_lowercase(), i))
        .collect();

    // Every present column for a field, in alias order.
    let columns = |aliases: &[&str]| -> Vec<usize> {
        aliases.iter().filter_map(|a| headers.get(*a).copied()).collect()
    };

    let filename_cols = columns(FILENAME_COLUMNS);
    if filename_cols.is_empty() {
        return Err(SurveyError::Parse("CSV has no filename column".into()));
    }
    let timestamp_cols = columns(TIMESTAMP_COLUMNS);
    let density_cols = columns(DENSITY_COLUMNS);
    let confidence_cols = columns(&["confidence"]);
    let latitude_cols = columns(&["latitude"]);
    let longitude_cols = columns(&["longitude"]);
    let depth_cols = columns(&["depth"]);
    let notes_cols = columns(&["notes"]);

    let loaded_at = chrono::Utc::now().to_rfc3339();
    let mut detections = Vec::new();
    let mut dropped = 0usize;

    for (row_no, result) in reader.records().enumerate() {
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                log::warn!("Skipping CSV row {row_no}: {e}");
                dropped += 1;
                continue;
            }
        };
        // First non-empty cell among the field's columns.
        let cell = |cols: &[usize]| {
            cols.iter()
                .filter_map(|&i| record.get(i))
                .find(|s| !s.is_empty())
        };

        let detection = DetectionRecord {
            filename: cell(&filename_cols).unwrap_or_default().to_string(),
            timestamp: cell(&timestamp_cols)
                .map(str::to_string)
                .unwrap_or_else(|| loaded_at.clone()),
            sardine_density: cell(&density_cols).and_then(parse_float).unwrap_or(0.0),
            confidence: cell(&confidence_cols).and_then(parse_float).unwrap_or(0.0),
            latitude: cell(&latitude_cols).and_then(parse_float),
            longitude: cell(&longitude_cols).and_then(parse_float),
            depth: cell(&depth_cols).and_then(parse_float),
            notes: cell(&notes_cols).map(str::to_string),
        };

        if detection.filename.is_empty() || !(detection.sardine_density > 0.0) {
            dropped += 1;
            continue;
        }
        detections.push(detection);
    }

    if dropped > 0 {
        log::debug!("Dropped {dropped} CSV rows without a filename or positive density");
    }
    Ok(detections)
}

/// Permissive float parse: leading/trailing junk such as `%` or units is
/// cut off at the first character that cannot belong to a number.
fn parse_float(s: &str) -> Option<f64> {
    if let Ok(v) = s.parse::<f64>() {
        return v.is_finite().then_some(v);
    }
    let end = s
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || c == '.' || ((c == '-' || c == '+') && i == 0)))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

// ---------------------------------------------------------------------------
// Synthetic detections
// ---------------------------------------------------------------------------

/// (density, confidence, latitude, longitude) for each synthetic school.
const SYNTHETIC_PATTERNS: [(f64, f64, f64, f64); 10] = [
    (0.85, 0.92, 32.8, -117.2),
    (0.73, 0.88, 32.7, -117.3),
    (0.91, 0.95, 32.6, -117.4),
    (0.67, 0.79, 32.5, -117.5),
    (0.82, 0.87, 32.4, -117.6),
    (0.76, 0.83, 32.3, -117.7),
    (0.89, 0.91, 32.2, -117.8),
    (0.71, 0.85, 32.1, -117.9),
    (0.94, 0.97, 32.0, -118.0),
    (0.68, 0.81, 31.9, -118.1),
];

/// Deterministic demo detections along a southbound track off San Diego.
///
/// Two records per day starting 2021-08-13, named like the RL2107 FM files.
pub fn synthetic_detections() -> Vec<DetectionRecord> {
    let base = NaiveDate::from_ymd_opt(2021, 8, 13).unwrap_or_default();

    SYNTHETIC_PATTERNS
        .iter()
        .enumerate()
        .map(|(i, &(density, confidence, lat, lon))| {
            let date = base + Duration::days((i / 2) as i64);
            let hour = 8 + (i % 12) as u32;
            let minute = ((i * 17) % 60) as u32;
            let second = ((i * 7) % 60) as u32;
            let at = date.and_hms_opt(hour, minute, second).unwrap_or_default();

            DetectionRecord {
                filename: format!(
                    "2107RL_FM-D{}-T{}.raw",
                    at.format("%Y%m%d"),
                    at.format("%H%M%S")
                ),
                timestamp: at.format("%Y-%m-%dT%H:%M:%SZ").to_string(),
                sardine_density: density,
                confidence,
                latitude: Some(lat),
                longitude: Some(lon),
                depth: Some(50.0 + ((i * 37) % 100) as f64),
                notes: Some(format!(
                    "Sardine school detected with {:.0}% density",
                    density * 100.0
                )),
            }
        })
        .collect()
}
