use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TransmissionMode – pulse type encoded in the filename
// ---------------------------------------------------------------------------

/// Acoustic pulse type used while recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum TransmissionMode {
    /// Continuous wave.
    #[serde(rename = "CW")]
    Cw,
    /// Frequency modulated.
    #[serde(rename = "FM")]
    Fm,
    #[default]
    Unknown,
}

impl TransmissionMode {
    pub const ALL: [TransmissionMode; 3] =
        [TransmissionMode::Cw, TransmissionMode::Fm, TransmissionMode::Unknown];

    /// Normalize a raw two-letter token. Anything but `CW`/`FM` is `Unknown`.
    pub fn from_token(token: &str) -> Self {
        match token {
            "CW" => TransmissionMode::Cw,
            "FM" => TransmissionMode::Fm,
            _ => TransmissionMode::Unknown,
        }
    }
}

impl fmt::Display for TransmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransmissionMode::Cw => write!(f, "CW"),
            TransmissionMode::Fm => write!(f, "FM"),
            TransmissionMode::Unknown => write!(f, "Unknown"),
        }
    }
}

// ---------------------------------------------------------------------------
// FilenameInfo – metadata recovered from a structured filename
// ---------------------------------------------------------------------------

/// Acquisition metadata parsed out of names like
/// `2107RL_CW-D20210813-T084512.raw`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilenameInfo {
    /// `YYYY-MM-DD`, absent when the name carries no `D########` token.
    pub date: Option<String>,
    /// `HH:MM:SS`, absent when the name carries no `T######` token.
    pub time: Option<String>,
    pub mode: TransmissionMode,
}

// ---------------------------------------------------------------------------
// RawFileRecord – one entry of the remote catalog
// ---------------------------------------------------------------------------

/// A remote acoustic file as listed by the catalog backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFileRecord {
    /// Unique within a loaded catalog.
    pub filename: String,
    /// Size in bytes.
    pub size: u64,
    /// Combined date-time string exactly as the backend sent it.
    pub last_modified: String,
    /// Direct download URL.
    pub source_url: String,
    /// Date half of `last_modified` (empty when absent).
    pub parsed_date: String,
    /// Time half of `last_modified` (empty when absent).
    pub parsed_time: String,
    pub acquisition: FilenameInfo,
    pub transmission_mode: TransmissionMode,
    /// Human-readable size, e.g. `"1.5 MB"`.
    pub formatted_size: String,
    pub cruise: String,
}

// ---------------------------------------------------------------------------
// DetectionRecord – one species detection
// ---------------------------------------------------------------------------

/// A sardine detection tied to a raw file by exact filename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub filename: String,
    pub timestamp: String,
    /// In `[0, 1]`.
    pub sardine_density: f64,
    /// In `[0, 1]`.
    pub confidence: f64,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Metres.
    pub depth: Option<f64>,
    pub notes: Option<String>,
}

impl DetectionRecord {
    /// Position when both coordinates are known.
    pub fn position(&self) -> Option<(f64, f64)> {
        Some((self.latitude?, self.longitude?))
    }
}

// ---------------------------------------------------------------------------
// MatchedFile – borrowed join of a file and its detection
// ---------------------------------------------------------------------------

/// A catalog entry together with the detection recorded for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchedFile<'a> {
    pub file: &'a RawFileRecord,
    pub detection: &'a DetectionRecord,
}

/// Index form of [`MatchedFile`], cheap to cache next to the source lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchRef {
    pub file: usize,
    pub detection: usize,
}

impl MatchRef {
    /// Resolve against the lists the indices were computed from.
    pub fn resolve<'a>(
        &self,
        files: &'a [RawFileRecord],
        detections: &'a [DetectionRecord],
    ) -> Option<MatchedFile<'a>> {
        Some(MatchedFile {
            file: files.get(self.file)?,
            detection: detections.get(self.detection)?,
        })
    }
}

// ---------------------------------------------------------------------------
// FilterState – analyzer thresholds and ordering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Density,
    Confidence,
    Timestamp,
    Filename,
}

impl SortBy {
    pub const ALL: [SortBy; 4] = [
        SortBy::Density,
        SortBy::Confidence,
        SortBy::Timestamp,
        SortBy::Filename,
    ];
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SortBy::Density => "Density",
            SortBy::Confidence => "Confidence",
            SortBy::Timestamp => "Timestamp",
            SortBy::Filename => "Filename",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => write!(f, "Ascending"),
            SortOrder::Desc => write!(f, "Descending"),
        }
    }
}

/// Thresholds and ordering applied to the matched view.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FilterState {
    pub min_density: f64,
    pub min_confidence: f64,
    pub sort_by: SortBy,
    pub sort_order: SortOrder,
}

// ---------------------------------------------------------------------------
// Detection feeds – records plus where they came from
// ---------------------------------------------------------------------------

/// Where a set of detections came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedOrigin {
    /// Parsed from a real feed (URL or local file).
    Live { source: String },
    /// Generated demo data, used because the live path failed or was absent.
    Synthetic { reason: String },
}

impl FeedOrigin {
    pub fn is_synthetic(&self) -> bool {
        matches!(self, FeedOrigin::Synthetic { .. })
    }
}

impl fmt::Display for FeedOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedOrigin::Live { source } => write!(f, "live feed ({source})"),
            FeedOrigin::Synthetic { reason } => write!(f, "synthetic demo data ({reason})"),
        }
    }
}

/// A loaded detection list tagged with its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionFeed {
    pub records: Vec<DetectionRecord>,
    pub origin: FeedOrigin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_tokens_normalize() {
        assert_eq!(TransmissionMode::from_token("CW"), TransmissionMode::Cw);
        assert_eq!(TransmissionMode::from_token("FM"), TransmissionMode::Fm);
        assert_eq!(TransmissionMode::from_token("cw"), TransmissionMode::Unknown);
        assert_eq!(TransmissionMode::from_token("XX"), TransmissionMode::Unknown);
        assert_eq!(TransmissionMode::Fm.to_string(), "FM");
    }

    #[test]
    fn default_filters_show_everything_by_density_desc() {
        let f = FilterState::default();
        assert_eq!(f.min_density, 0.0);
        assert_eq!(f.min_confidence, 0.0);
        assert_eq!(f.sort_by, SortBy::Density);
        assert_eq!(f.sort_order, SortOrder::Desc);
    }

    #[test]
    fn match_ref_out_of_range_resolves_to_none() {
        let r = MatchRef { file: 3, detection: 0 };
        assert!(r.resolve(&[], &[]).is_none());
    }
}
