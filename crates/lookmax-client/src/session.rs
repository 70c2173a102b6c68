//! # Session Storage
//!
//! Per-tab key/value storage shared by the wizard screens.
//!
//! Values are plain strings, as in browser session storage. Two keys carry
//! the wizard's state between screens:
//! - `capturedImage`: the frozen frame or uploaded photo, as a data URI
//! - `analysisData`: the [`AnalysisPayload`] of the last analysis, as JSON

use lookmax_core::AnalysisPayload;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Key of the last captured image.
pub const CAPTURED_IMAGE_KEY: &str = "capturedImage";

/// Key of the last analysis payload.
pub const ANALYSIS_DATA_KEY: &str = "analysisData";

/// Clonable handle to one session's storage. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    inner: Arc<Mutex<BTreeMap<String, String>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        // A panic while holding the lock cannot leave a string map half
        // written, so a poisoned lock is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.map().get(key).cloned()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.map().insert(key.into(), value.into());
    }

    pub fn remove(&self, key: &str) -> Option<String> {
        self.map().remove(key)
    }

    pub fn clear(&self) {
        self.map().clear();
    }

    pub fn len(&self) -> usize {
        self.map().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    // -------------------------------------------------------------------------
    // Typed accessors
    // -------------------------------------------------------------------------

    pub fn captured_image(&self) -> Option<String> {
        self.get(CAPTURED_IMAGE_KEY)
    }

    pub fn set_captured_image(&self, data_uri: &str) {
        self.set(CAPTURED_IMAGE_KEY, data_uri);
    }

    /// The stored analysis. `None` when absent, `Some(Err)` when the stored
    /// string is not a valid payload.
    pub fn analysis_data(&self) -> Option<Result<AnalysisPayload, serde_json::Error>> {
        self.get(ANALYSIS_DATA_KEY)
            .map(|raw| serde_json::from_str(&raw))
    }

    pub fn set_analysis_data(&self, payload: &AnalysisPayload) -> Result<(), serde_json::Error> {
        let raw = serde_json::to_string(payload)?;
        self.set(ANALYSIS_DATA_KEY, raw);
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_storage() {
        let a = SessionStore::new();
        let b = a.clone();
        a.set("k", "v");
        assert_eq!(b.get("k").as_deref(), Some("v"));
        b.clear();
        assert!(a.is_empty());
    }

    #[test]
    fn captured_image_roundtrip() {
        let store = SessionStore::new();
        assert!(store.captured_image().is_none());
        store.set_captured_image("data:image/jpeg;base64,AAAA");
        assert_eq!(
            store.captured_image().as_deref(),
            Some("data:image/jpeg;base64,AAAA")
        );
    }

    #[test]
    fn analysis_data_absent_or_invalid() {
        let store = SessionStore::new();
        assert!(store.analysis_data().is_none());

        store.set(ANALYSIS_DATA_KEY, "{not json");
        assert!(matches!(store.analysis_data(), Some(Err(_))));
    }

    #[test]
    fn analysis_data_stored_as_json() {
        let store = SessionStore::new();
        let payload = AnalysisPayload::canned();
        assert!(store.set_analysis_data(&payload).is_ok());

        let raw = store.get(ANALYSIS_DATA_KEY).unwrap_or_default();
        assert!(raw.starts_with('{'));
        assert!(matches!(store.analysis_data(), Some(Ok(p)) if p == payload));
    }

    #[test]
    fn remove_returns_previous() {
        let store = SessionStore::new();
        store.set("k", "v");
        assert_eq!(store.remove("k").as_deref(), Some("v"));
        assert_eq!(store.remove("k"), None);
        assert_eq!(store.len(), 0);
    }
}
