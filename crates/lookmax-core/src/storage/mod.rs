//! # Storage Module
//!
//! Repository for face analysis records.
//!
//! Two backends implement [`AnalysisStore`]:
//! - [`MemStore`]: ordered in-memory map, lost on restart
//! - [`RedbStore`]: redb embedded database (ACID, crash safe), records
//!   encoded with postcard
//!
//! [`Storage`] picks one of them at runtime from a backend name.

mod memory;
mod redb_store;

pub use memory::MemStore;
pub use redb_store::RedbStore;

use crate::record::{AnalysisId, FaceAnalysisRecord, NewFaceAnalysis, UserId};
use crate::{LookmaxError, Result};
use std::path::Path;

// =============================================================================
// ANALYSISSTORE TRAIT
// =============================================================================

/// Persistence operations over face analysis records.
///
/// Ids are assigned by the store, start at 1 and are never reused, even
/// after the record holding them is deleted.
pub trait AnalysisStore {
    /// Persist a new record stamped with `created_at`.
    fn create(&mut self, new: NewFaceAnalysis, created_at: &str) -> Result<FaceAnalysisRecord>;

    /// Fetch one record.
    fn get(&self, id: AnalysisId) -> Result<Option<FaceAnalysisRecord>>;

    /// All records owned by `user`, in ascending id order.
    fn list_by_user(&self, user: UserId) -> Result<Vec<FaceAnalysisRecord>>;

    /// Remove a record. Returns `false` when the id is unknown.
    fn delete(&mut self, id: AnalysisId) -> Result<bool>;

    /// Number of stored records.
    fn len(&self) -> Result<usize>;

    /// Check if the store holds no records.
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

// =============================================================================
// RUNTIME BACKEND SELECTION
// =============================================================================

/// A store selected at runtime.
#[derive(Debug)]
pub enum Storage {
    Memory(MemStore),
    Redb(RedbStore),
}

impl Storage {
    /// Open a backend by name: `"memory"` ignores `path`, `"redb"` opens or
    /// creates the database file at `path`.
    pub fn open(backend: &str, path: &Path) -> Result<Self> {
        match backend {
            "memory" => Ok(Self::Memory(MemStore::new())),
            "redb" => Ok(Self::Redb(RedbStore::open(path)?)),
            other => Err(LookmaxError::InvalidBackend(other.to_string())),
        }
    }

    /// Name of the active backend.
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Redb(_) => "redb",
        }
    }
}

impl AnalysisStore for Storage {
    fn create(&mut self, new: NewFaceAnalysis, created_at: &str) -> Result<FaceAnalysisRecord> {
        match self {
            Self::Memory(store) => store.create(new, created_at),
            Self::Redb(store) => store.create(new, created_at),
        }
    }

    fn get(&self, id: AnalysisId) -> Result<Option<FaceAnalysisRecord>> {
        match self {
            Self::Memory(store) => store.get(id),
            Self::Redb(store) => store.get(id),
        }
    }

    fn list_by_user(&self, user: UserId) -> Result<Vec<FaceAnalysisRecord>> {
        match self {
            Self::Memory(store) => store.list_by_user(user),
            Self::Redb(store) => store.list_by_user(user),
        }
    }

    fn delete(&mut self, id: AnalysisId) -> Result<bool> {
        match self {
            Self::Memory(store) => store.delete(id),
            Self::Redb(store) => store.delete(id),
        }
    }

    fn len(&self) -> Result<usize> {
        match self {
            Self::Memory(store) => store.len(),
            Self::Redb(store) => store.len(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
