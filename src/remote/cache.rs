use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use super::imagery::ImageKey;
use crate::error::SurveyError;

// ---------------------------------------------------------------------------
// ImageHandle – a session-local address for fetched image bytes
// ---------------------------------------------------------------------------

/// Image bytes plus the `bytes://` URI they are registered under.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageHandle {
    pub uri: String,
    pub bytes: Arc<[u8]>,
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("uri", &self.uri)
            .field("len", &self.bytes.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// ImageCache
// ---------------------------------------------------------------------------

/// Result of asking the cache for an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Cached(ImageHandle),
    /// Someone already asked for this key and the response is outstanding.
    InFlight,
    /// Not cached. The key is now marked in flight; the caller must fetch
    /// and report back through [`ImageCache::complete`].
    Miss,
}

/// Per-view cache of generated images with in-flight tracking.
///
/// Handles that leave the cache (released or cleared) are queued
/// until the owner drains them with [`ImageCache::take_released`] and frees
/// whatever the URI was registered with. Every stored handle gets its own
/// URI, so forgetting an old one never touches its replacement.
#[derive(Debug, Default)]
pub struct ImageCache {
    entries: HashMap<ImageKey, ImageHandle>,
    in_flight: HashSet<ImageKey>,
    released: Vec<ImageHandle>,
    /// Bumped for every stored handle so no two handles share a URI.
    serial: u64,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&mut self, key: &ImageKey) -> Lookup {
        if let Some(handle) = self.entries.get(key) {
            return Lookup::Cached(handle.clone());
        }
        if self.in_flight.contains(key) {
            return Lookup::InFlight;
        }
        self.in_flight.insert(key.clone());
        Lookup::Miss
    }

    pub fn get(&self, key: &ImageKey) -> Option<&ImageHandle> {
        self.entries.get(key)
    }

    pub fn is_in_flight(&self, key: &ImageKey) -> bool {
        self.in_flight.contains(key)
    }

    /// Record the outcome of a fetch started after a [`Lookup::Miss`].
    ///
    /// A key is only in flight while it is not cached, so a stored handle
    /// never replaces another. A response whose key is no longer in flight
    /// (the cache was cleared meanwhile) is dropped as [`SurveyError::Stale`].
    pub fn complete(
        &mut self,
        key: ImageKey,
        result: Result<Vec<u8>, SurveyError>,
    ) -> Result<ImageHandle, SurveyError> {
        if !self.in_flight.remove(&key) {
            return Err(SurveyError::Stale(key.filename));
        }
        let bytes = result?;
        self.serial += 1;
        let handle = ImageHandle {
            uri: key.uri(self.serial),
            bytes: Arc::from(bytes),
        };
        self.entries.insert(key, handle.clone());
        Ok(handle)
    }

    /// Drop one entry. Returns whether anything was cached.
    pub fn release(&mut self, key: &ImageKey) -> bool {
        match self.entries.remove(key) {
            Some(handle) => {
                self.released.push(handle);
                true
            }
            None => false,
        }
    }

    /// Drop every entry and forget in-flight marks.
    pub fn clear(&mut self) {
        self.released.extend(self.entries.drain().map(|(_, h)| h));
        self.in_flight.clear();
    }

    /// Handles that left the cache since the last call.
    pub fn take_released(&mut self) -> Vec<ImageHandle> {
        std::mem::take(&mut self.released)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
