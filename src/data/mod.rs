/// Data layer: core types, parsing, loading, and filtering.
///
/// Architecture:
/// ```text
///  listing JSON          detection CSV / synthetic
///        │                        │
///        ▼                        ▼
///   ┌──────────┐            ┌──────────┐
///   │ filename  │ + format  │  loader   │  parse rows → DetectionFeed
///   └──────────┘            └──────────┘
///        │  RawFileRecord         │  DetectionRecord
///        └──────────┬─────────────┘
///                   ▼
///             ┌──────────┐
///             │  filter   │  join by filename, thresholds, sort, pages
///             └──────────┘
///                   │
///                   ▼
///            Vec<MatchedFile>
/// ```

pub mod filename;
pub mod filter;
pub mod format;
pub mod loader;
pub mod model;
