//! # Redb Store
//!
//! Disk-backed analysis store on the redb embedded database.
//!
//! Layout:
//! - `analyses`: id -> postcard-encoded [`FaceAnalysisRecord`]
//! - `meta`: `"next_analysis_id"` -> next id to hand out
//!
//! The id counter is persisted in the same write transaction as the record,
//! so ids stay unique across restarts and crashes.

use super::AnalysisStore;
use crate::record::{AnalysisId, FaceAnalysisRecord, NewFaceAnalysis, UserId};
use crate::{LookmaxError, Result};
use redb::{
    Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition,
};
use std::fmt;
use std::path::{Path, PathBuf};

const ANALYSES: TableDefinition<u64, &[u8]> = TableDefinition::new("analyses");
const META: TableDefinition<&str, u64> = TableDefinition::new("meta");

const NEXT_ID_KEY: &str = "next_analysis_id";

/// Analysis store persisted in a redb file.
pub struct RedbStore {
    db: Database,
    path: PathBuf,
}

impl fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedbStore").field("path", &self.path).finish()
    }
}

impl RedbStore {
    /// Open the database at `path`, creating it and its tables if needed.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path).map_err(LookmaxError::storage)?;

        // Create both tables up front so read transactions never see a
        // missing table.
        let txn = db.begin_write().map_err(LookmaxError::storage)?;
        {
            txn.open_table(ANALYSES).map_err(LookmaxError::storage)?;
            txn.open_table(META).map_err(LookmaxError::storage)?;
        }
        txn.commit().map_err(LookmaxError::storage)?;

        Ok(Self {
            db,
            path: path.to_path_buf(),
        })
    }

    /// Location of the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn decode(bytes: &[u8]) -> Result<FaceAnalysisRecord> {
        Ok(postcard::from_bytes(bytes)?)
    }
}

impl AnalysisStore for RedbStore {
    fn create(&mut self, new: NewFaceAnalysis, created_at: &str) -> Result<FaceAnalysisRecord> {
        let txn = self.db.begin_write().map_err(LookmaxError::storage)?;
        let record = {
            let mut meta = txn.open_table(META).map_err(LookmaxError::storage)?;
            let next = meta
                .get(NEXT_ID_KEY)
                .map_err(LookmaxError::storage)?
                .map(|guard| guard.value())
                .unwrap_or(1);

            let record = FaceAnalysisRecord::from_new(AnalysisId(next), new, created_at);
            let bytes = postcard::to_allocvec(&record)?;

            let mut analyses = txn.open_table(ANALYSES).map_err(LookmaxError::storage)?;
            analyses
                .insert(next, bytes.as_slice())
                .map_err(LookmaxError::storage)?;
            meta.insert(NEXT_ID_KEY, next.saturating_add(1))
                .map_err(LookmaxError::storage)?;
            record
        };
        txn.commit().map_err(LookmaxError::storage)?;
        Ok(record)
    }

    fn get(&self, id: AnalysisId) -> Result<Option<FaceAnalysisRecord>> {
        let txn = self.db.begin_read().map_err(LookmaxError::storage)?;
        let table = txn.open_table(ANALYSES).map_err(LookmaxError::storage)?;
        match table.get(id.0).map_err(LookmaxError::storage)? {
            Some(guard) => Ok(Some(Self::decode(guard.value())?)),
            None => Ok(None),
        }
    }

    fn list_by_user(&self, user: UserId) -> Result<Vec<FaceAnalysisRecord>> {
        let txn = self.db.begin_read().map_err(LookmaxError::storage)?;
        let table = txn.open_table(ANALYSES).map_err(LookmaxError::storage)?;

        let mut records = Vec::new();
        for entry in table.iter().map_err(LookmaxError::storage)? {
            let (_, value) = entry.map_err(LookmaxError::storage)?;
            let record = Self::decode(value.value())?;
            if record.user_id == user {
                records.push(record);
            }
        }
        Ok(records)
    }

    fn delete(&mut self, id: AnalysisId) -> Result<bool> {
        let txn = self.db.begin_write().map_err(LookmaxError::storage)?;
        let removed = {
            let mut table = txn.open_table(ANALYSES).map_err(LookmaxError::storage)?;
            let removed = table.remove(id.0).map_err(LookmaxError::storage)?;
            removed.is_some()
        };
        txn.commit().map_err(LookmaxError::storage)?;
        Ok(removed)
    }

    fn len(&self) -> Result<usize> {
        let txn = self.db.begin_read().map_err(LookmaxError::storage)?;
        let table = txn.open_table(ANALYSES).map_err(LookmaxError::storage)?;
        let len = table.len().map_err(LookmaxError::storage)?;
        Ok(len as usize)
    }
}

// =============================================================================
// TESTS
// =============================================================================
