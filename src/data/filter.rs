use std::cmp::Ordering;
use std::collections::HashMap;

use super::model::{
    DetectionRecord, FilterState, MatchRef, MatchedFile, RawFileRecord, SortBy, SortOrder,
};

// ---------------------------------------------------------------------------
// Join: catalog entries ↔ detections by exact filename
// ---------------------------------------------------------------------------

/// Pair every file with the detection carrying the same filename.
///
/// Files without a detection and detections without a file are left out.
/// When several detections share a filename the first one is used.
/// Output follows catalog order.
pub fn match_indices(files: &[RawFileRecord], detections: &[DetectionRecord]) -> Vec<MatchRef> {
    let mut by_name: HashMap<&str, usize> = HashMap::with_capacity(detections.len());
    for (i, d) in detections.iter().enumerate() {
        by_name.entry(d.filename.as_str()).or_insert(i);
    }

    files
        .iter()
        .enumerate()
        .filter_map(|(file, f)| {
            by_name
                .get(f.filename.as_str())
                .map(|&detection| MatchRef { file, detection })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Threshold filter + sort
// ---------------------------------------------------------------------------

/// Keep matches meeting both thresholds, ordered per `filters`.
///
/// The sort is stable, so ties keep catalog order.
pub fn filter_and_sort(
    files: &[RawFileRecord],
    detections: &[DetectionRecord],
    matches: &[MatchRef],
    filters: &FilterState,
) -> Vec<MatchRef> {
    let mut kept: Vec<MatchRef> = matches
        .iter()
        .copied()
        .filter(|m| {
            detections.get(m.detection).is_some_and(|d| {
                d.sardine_density >= filters.min_density && d.confidence >= filters.min_confidence
            })
        })
        .collect();

    kept.sort_by(|a, b| {
        let ord = match (a.resolve(files, detections), b.resolve(files, detections)) {
            (Some(a), Some(b)) => compare(&a, &b, filters.sort_by),
            _ => Ordering::Equal,
        };
        match filters.sort_order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
    kept
}

fn compare(a: &MatchedFile<'_>, b: &MatchedFile<'_>, by: SortBy) -> Ordering {
    match by {
        SortBy::Density => a
            .detection
            .sardine_density
            .total_cmp(&b.detection.sardine_density),
        SortBy::Confidence => a.detection.confidence.total_cmp(&b.detection.confidence),
        SortBy::Timestamp => a.detection.timestamp.cmp(&b.detection.timestamp),
        SortBy::Filename => a.file.filename.cmp(&b.file.filename),
    }
}

/// Join, filter and sort in one go, resolved to borrowed records.
pub fn matched_view<'a>(
    files: &'a [RawFileRecord],
    detections: &'a [DetectionRecord],
    filters: &FilterState,
) -> Vec<MatchedFile<'a>> {
    let matches = match_indices(files, detections);
    filter_and_sort(files, detections, &matches, filters)
        .iter()
        .filter_map(|m| m.resolve(files, detections))
        .collect()
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Number of pages needed for `total` items. Zero page size means no pages.
pub fn page_count(total: usize, page_size: usize) -> usize {
    if page_size == 0 {
        0
    } else {
        total.div_ceil(page_size)
    }
}

/// Items on 1-based `page`. Pages outside `1..=page_count` are empty.
pub fn paginate<T>(items: &[T], page_size: usize, page: usize) -> &[T] {
    if page == 0 || page_size == 0 {
        return &[];
    }
    let start = (page - 1).saturating_mul(page_size);
    if start >= items.len() {
        return &[];
    }
    let end = start.saturating_add(page_size).min(items.len());
    &items[start..end]
}

/// Clamp a requested page into `1..=page_count` (1 when there are no pages).
pub fn clamp_page(page: usize, page_count: usize) -> usize {
    page.clamp(1, page_count.max(1))
}

// ---------------------------------------------------------------------------
// Catalog browsing
// ---------------------------------------------------------------------------

/// Dataset browser search: filename substring plus optional acquisition day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogQuery {
    /// Case-insensitive filename substring.
    pub search: String,
    /// `YYYY-MM-DD` or `YYYYMMDD`; empty means any day.
    pub date: String,
}

impl CatalogQuery {
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty() && self.date.trim().is_empty()
    }

    pub fn matches(&self, file: &RawFileRecord) -> bool {
        let search = self.search.trim().to_lowercase();
        let matches_search = search.is_empty() || file.filename.to_lowercase().contains(&search);
        let day: String = self.date.trim().chars().filter(|c| *c != '-').collect();
        let matches_date = day.is_empty() || file.filename.contains(&day);
        matches_search && matches_date
    }
}

/// Indices of catalog entries passing `query`, in catalog order.
pub fn catalog_indices(files: &[RawFileRecord], query: &CatalogQuery) -> Vec<usize> {
    files
        .iter()
        .enumerate()
        .filter(|(_, f)| query.matches(f))
        .map(|(i, _)| i)
        .collect()
}

/// Sum of file sizes in bytes.
pub fn total_size(files: &[RawFileRecord]) -> u64 {
    files.iter().map(|f| f.size).sum()
}

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

/// Confidence above which a detection counts as high confidence.
pub const HIGH_CONFIDENCE: f64 = 0.8;

/// Headline numbers for the analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DetectionStats {
    pub total_files: usize,
    pub detected_files: usize,
    pub high_confidence: usize,
    /// Mean density over matched files, 0 when nothing matched.
    pub mean_density: f64,
}

impl DetectionStats {
    pub fn compute(total_files: usize, matches: &[MatchedFile<'_>]) -> Self {
        let detected_files = matches.len();
        let high_confidence = matches
            .iter()
            .filter(|m| m.detection.confidence > HIGH_CONFIDENCE)
            .count();
        let mean_density = if detected_files == 0 {
            0.0
        } else {
            matches.iter().map(|m| m.detection.sardine_density).sum::<f64>() / detected_files as f64
        };
        DetectionStats {
            total_files,
            detected_files,
            high_confidence,
            mean_density,
        }
    }

    /// Share of catalog files with a detection, in percent.
    pub fn match_rate(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            self.detected_files as f64 * 100.0 / self.total_files as f64
        }
    }
}
