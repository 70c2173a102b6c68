//! In-memory analysis store.

use super::AnalysisStore;
use crate::Result;
use crate::record::{AnalysisId, FaceAnalysisRecord, NewFaceAnalysis, UserId};
use std::collections::BTreeMap;

/// Records kept in a `BTreeMap` so iteration follows id order.
#[derive(Debug, Clone)]
pub struct MemStore {
    records: BTreeMap<AnalysisId, FaceAnalysisRecord>,
    next_id: u64,
}

impl Default for MemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl AnalysisStore for MemStore {
    fn create(&mut self, new: NewFaceAnalysis, created_at: &str) -> Result<FaceAnalysisRecord> {
        let id = AnalysisId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);

        let record = FaceAnalysisRecord::from_new(id, new, created_at);
        self.records.insert(id, record.clone());
        Ok(record)
    }

    fn get(&self, id: AnalysisId) -> Result<Option<FaceAnalysisRecord>> {
        Ok(self.records.get(&id).cloned())
    }

    fn list_by_user(&self, user: UserId) -> Result<Vec<FaceAnalysisRecord>> {
        Ok(self
            .records
            .values()
            .filter(|r| r.user_id == user)
            .cloned()
            .collect())
    }

    fn delete(&mut self, id: AnalysisId) -> Result<bool> {
        Ok(self.records.remove(&id).is_some())
    }

    fn len(&self) -> Result<usize> {
        Ok(self.records.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================
