use std::sync::Arc;

use crate::config::SurveyConfig;
use crate::data::filter::{
    catalog_indices, clamp_page, filter_and_sort, match_indices, page_count, CatalogQuery,
    DetectionStats,
};
use crate::data::model::{
    DetectionFeed, DetectionRecord, FeedOrigin, FilterState, MatchRef, MatchedFile, RawFileRecord,
    SortBy, SortOrder,
};
use crate::remote::ImageKind;

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

/// Progress of one feature area's load.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LoadStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl LoadStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, LoadStatus::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadStatus::Failed(msg) => Some(msg),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Browser,
    Analyzer,
    Viewer,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Browser, Tab::Analyzer, Tab::Viewer];

    pub fn label(self) -> &'static str {
        match self {
            Tab::Browser => "Dataset Browser",
            Tab::Analyzer => "Detection Analyzer",
            Tab::Viewer => "Echogram Viewer",
        }
    }
}

/// Everything the dashboard shows, independent of rendering.
///
/// Only [`reduce`] produces new states. The lists are shared behind `Arc`,
/// so cloning a state is cheap.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub cruise: String,
    pub page_size: usize,

    pub catalog: Arc<[RawFileRecord]>,
    pub catalog_status: LoadStatus,

    pub detections: Arc<[DetectionRecord]>,
    pub detection_origin: Option<FeedOrigin>,
    pub detection_status: LoadStatus,

    pub filters: FilterState,
    pub query: CatalogQuery,
    pub browser_page: usize,
    pub analyzer_page: usize,

    pub tab: Tab,
    pub selected: Option<String>,
    pub view_kind: ImageKind,

    /// Joined, unfiltered.
    matches: Arc<[MatchRef]>,
    /// Joined, filtered and sorted.
    visible: Arc<[MatchRef]>,
    /// Catalog indices passing `query`.
    browsed: Arc<[usize]>,
}

impl SessionState {
    pub fn new(config: &SurveyConfig) -> Self {
        Self {
            cruise: config.default_cruise.clone(),
            page_size: config.page_size.max(1),
            catalog: Arc::from(Vec::new()),
            catalog_status: LoadStatus::Idle,
            detections: Arc::from(Vec::new()),
            detection_origin: None,
            detection_status: LoadStatus::Idle,
            filters: FilterState::default(),
            query: CatalogQuery::default(),
            browser_page: 1,
            analyzer_page: 1,
            tab: Tab::default(),
            selected: None,
            view_kind: ImageKind::default(),
            matches: Arc::from(Vec::new()),
            visible: Arc::from(Vec::new()),
            browsed: Arc::from(Vec::new()),
        }
    }

    /// Matches passing the current filters, in display order.
    pub fn visible_matches(&self) -> Vec<MatchedFile<'_>> {
        self.resolve(&self.visible)
    }

    /// Every joined file regardless of filters.
    pub fn all_matches(&self) -> Vec<MatchedFile<'_>> {
        self.resolve(&self.matches)
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }

    pub fn analyzer_page_count(&self) -> usize {
        page_count(self.visible.len(), self.page_size)
    }

    /// Catalog entries passing the browser query.
    pub fn browsed_files(&self) -> impl Iterator<Item = &RawFileRecord> + '_ {
        self.browsed.iter().filter_map(|&i| self.catalog.get(i))
    }

    pub fn browsed_count(&self) -> usize {
        self.browsed.len()
    }

    pub fn browser_page_count(&self) -> usize {
        page_count(self.browsed.len(), self.page_size)
    }

    pub fn stats(&self) -> DetectionStats {
        DetectionStats::compute(self.catalog.len(), &self.all_matches())
    }

    /// The selected file joined with its detection, if both exist.
    pub fn selected_match(&self) -> Option<MatchedFile<'_>> {
        let name = self.selected.as_deref()?;
        self.all_matches()
            .into_iter()
            .find(|m| m.file.filename == name)
    }

    fn resolve(&self, refs: &[MatchRef]) -> Vec<MatchedFile<'_>> {
        refs.iter()
            .filter_map(|m| m.resolve(&self.catalog, &self.detections))
            .collect()
    }

    fn rejoin(mut self) -> Self {
        self.matches = Arc::from(match_indices(&self.catalog, &self.detections));
        self.refilter()
    }

    fn refilter(mut self) -> Self {
        self.visible = Arc::from(filter_and_sort(
            &self.catalog,
            &self.detections,
            &self.matches,
            &self.filters,
        ));
        self.analyzer_page = clamp_page(self.analyzer_page, self.analyzer_page_count());
        self
    }

    fn rebrowse(mut self) -> Self {
        self.browsed = Arc::from(catalog_indices(&self.catalog, &self.query));
        self.browser_page = clamp_page(self.browser_page, self.browser_page_count());
        self
    }
}

// ---------------------------------------------------------------------------
// Actions + reducer
// ---------------------------------------------------------------------------

/// Every way the session can change.
#[derive(Debug, Clone)]
pub enum Action {
    SetCruise(String),
    CatalogRequested,
    CatalogLoaded(Vec<RawFileRecord>),
    CatalogFailed(String),
    DetectionsRequested,
    DetectionsLoaded(DetectionFeed),
    DetectionsFailed(String),
    SetMinDensity(f64),
    SetMinConfidence(f64),
    SetSortBy(SortBy),
    SetSortOrder(SortOrder),
    SetSearch(String),
    SetDate(String),
    SetBrowserPage(usize),
    SetAnalyzerPage(usize),
    SelectTab(Tab),
    SelectFile(Option<String>),
    SetViewKind(ImageKind),
}

/// Apply one action, returning the next state.
pub fn reduce(state: SessionState, action: Action) -> SessionState {
    let mut next = state;
    match action {
        Action::SetCruise(cruise) => {
            next.cruise = cruise.trim().to_uppercase();
            next
        }
        Action::CatalogRequested => {
            next.catalog_status = LoadStatus::Loading;
            next
        }
        Action::CatalogLoaded(files) => {
            next.catalog = Arc::from(files);
            next.catalog_status = LoadStatus::Ready;
            next.rejoin().rebrowse()
        }
        Action::CatalogFailed(message) => {
            next.catalog_status = LoadStatus::Failed(message);
            next
        }
        Action::DetectionsRequested => {
            next.detection_status = LoadStatus::Loading;
            next
        }
        Action::DetectionsLoaded(feed) => {
            next.detections = Arc::from(feed.records);
            next.detection_origin = Some(feed.origin);
            next.detection_status = LoadStatus::Ready;
            next.rejoin()
        }
        Action::DetectionsFailed(message) => {
            next.detection_status = LoadStatus::Failed(message);
            next
        }
        Action::SetMinDensity(v) => {
            next.filters.min_density = unit_interval(v);
            next.refilter()
        }
        Action::SetMinConfidence(v) => {
            next.filters.min_confidence = unit_interval(v);
            next.refilter()
        }
        Action::SetSortBy(by) => {
            next.filters.sort_by = by;
            next.refilter()
        }
        Action::SetSortOrder(order) => {
            next.filters.sort_order = order;
            next.refilter()
        }
        Action::SetSearch(search) => {
            next.query.search = search;
            next.browser_page = 1;
            next.rebrowse()
        }
        Action::SetDate(date) => {
            next.query.date = date;
            next.browser_page = 1;
            next.rebrowse()
        }
        Action::SetBrowserPage(page) => {
            next.browser_page = clamp_page(page, next.browser_page_count());
            next
        }
        Action::SetAnalyzerPage(page) => {
            next.analyzer_page = clamp_page(page, next.analyzer_page_count());
            next
        }
        Action::SelectTab(tab) => {
            next.tab = tab;
            next
        }
        Action::SelectFile(selected) => {
            next.selected = selected;
            next
        }
        Action::SetViewKind(kind) => {
            next.view_kind = kind;
            next
        }
    }
}

fn unit_interval(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::{synthetic_detections, synthetic_feed};
    use crate::remote::catalog::{normalize_entries, ListingEntry};

    fn catalog_for(names: &[String]) -> Vec<RawFileRecord> {
        let entries = names
            .iter()
            .map(|n| ListingEntry {
                filename: n.clone(),
                size: 2048,
                url: None,
                datetime: Some("2021-09-01 00:00:00".into()),
                cruise: None,
            })
            .collect();
        normalize_entries(entries, "RL2107", &SurveyConfig::default())
    }

    fn loaded_state() -> SessionState {
        let mut names: Vec<String> = synthetic_detections()
            .into_iter()
            .map(|d| d.filename)
            .collect();
        names.extend((0..35).map(|i| format!("2107RL_CW-D20210901-T{:06}.raw", i)));

        let state = SessionState::new(&SurveyConfig::default());
        let state = reduce(state, Action::CatalogLoaded(catalog_for(&names)));
        reduce(state, Action::DetectionsLoaded(synthetic_feed("test")))
    }

    #[test]
    fn loading_both_sources_joins_them() {
        let state = loaded_state();
        assert_eq!(state.catalog.len(), 45);
        assert_eq!(state.all_matches().len(), 10);
        assert_eq!(state.visible_count(), 10);
        assert!(state.detection_origin.as_ref().unwrap().is_synthetic());

        let stats = state.stats();
        assert_eq!(stats.total_files, 45);
        assert_eq!(stats.detected_files, 10);
    }

    #[test]
    fn order_of_arrival_does_not_matter() {
        let a = loaded_state();
        let names: Vec<String> = a.catalog.iter().map(|f| f.filename.clone()).collect();

        let b = SessionState::new(&SurveyConfig::default());
        let b = reduce(b, Action::DetectionsLoaded(synthetic_feed("test")));
        let b = reduce(b, Action::CatalogLoaded(catalog_for(&names)));

        let names_a: Vec<&str> = a.visible_matches().iter().map(|m| m.file.filename.as_str()).collect();
        let names_b: Vec<&str> = b.visible_matches().iter().map(|m| m.file.filename.as_str()).collect();
        assert_eq!(names_a, names_b);
    }

    #[test]
    fn filters_are_clamped_and_applied() {
        let state = reduce(loaded_state(), Action::SetMinDensity(0.8));
        assert!(state
            .visible_matches()
            .iter()
            .all(|m| m.detection.sardine_density >= 0.8));
        assert_eq!(state.visible_count(), 5);

        let state = reduce(state, Action::SetMinConfidence(7.0));
        assert_eq!(state.filters.min_confidence, 1.0);
        assert_eq!(state.visible_count(), 0);
        assert_eq!(state.analyzer_page, 1);

        let state = reduce(state, Action::SetMinConfidence(f64::NAN));
        assert_eq!(state.filters.min_confidence, 0.0);
    }

    #[test]
    fn sort_actions_reorder_view() {
        let state = reduce(loaded_state(), Action::SetSortOrder(SortOrder::Asc));
        let densities: Vec<f64> = state
            .visible_matches()
            .iter()
            .map(|m| m.detection.sardine_density)
            .collect();
        assert!(densities.windows(2).all(|w| w[0] <= w[1]));

        let state = reduce(state, Action::SetSortBy(SortBy::Timestamp));
        let stamps: Vec<String> = state
            .visible_matches()
            .iter()
            .map(|m| m.detection.timestamp.clone())
            .collect();
        assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn browser_pages_are_clamped() {
        let state = loaded_state();
        assert_eq!(state.browser_page_count(), 3);

        let state = reduce(state, Action::SetBrowserPage(9));
        assert_eq!(state.browser_page, 3);
        let state = reduce(state, Action::SetBrowserPage(0));
        assert_eq!(state.browser_page, 1);

        let state = reduce(state, Action::SetBrowserPage(3));
        let state = reduce(state, Action::SetSearch("_fm-".into()));
        assert_eq!(state.browser_page, 1);
        assert_eq!(state.browsed_count(), 10);
        assert!(state.browsed_files().all(|f| f.filename.contains("_FM-")));

        let state = reduce(state, Action::SetDate("2021-08-13".into()));
        assert_eq!(state.browsed_count(), 2);
    }

    #[test]
    fn failures_are_kept_per_area() {
        let state = loaded_state();
        let state = reduce(state, Action::CatalogRequested);
        assert!(state.catalog_status.is_loading());
        let state = reduce(state, Action::CatalogFailed("listing down".into()));
        assert_eq!(state.catalog_status.error(), Some("listing down"));
        assert_eq!(state.detection_status, LoadStatus::Ready);
        // The previous catalog stays visible until a reload succeeds.
        assert_eq!(state.catalog.len(), 45);
    }

    #[test]
    fn selection_resolves_to_match() {
        let state = loaded_state();
        let name = synthetic_detections()[2].filename.clone();
        let state = reduce(state, Action::SelectFile(Some(name.clone())));
        let selected = state.selected_match().unwrap();
        assert_eq!(selected.detection.filename, name);

        let state = reduce(state, Action::SelectFile(Some("nope.raw".into())));
        assert!(state.selected_match().is_none());
    }

    #[test]
    fn cruise_is_normalized() {
        let state = reduce(
            SessionState::new(&SurveyConfig::default()),
            Action::SetCruise(" rl1907 ".into()),
        );
        assert_eq!(state.cruise, "RL1907");
    }
}
