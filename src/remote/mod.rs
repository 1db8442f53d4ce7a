//! HTTP clients for the survey backends.
//!
//! * [`catalog`] – file listing per cruise
//! * [`feed`] – detection CSV feeds
//! * [`imagery`] – echogram / spectrogram rendering
//! * [`cache`] – per-view image cache with in-flight tracking

pub mod cache;
pub mod catalog;
pub mod feed;
pub mod imagery;

pub use cache::{ImageCache, ImageHandle, Lookup};
pub use catalog::{object_url, CatalogClient};
pub use imagery::{request_image, ImageKey, ImageKind, ImageTransport, ImageryClient};
