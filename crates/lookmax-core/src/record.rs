//! # Record Module
//!
//! The persisted face analysis record and its identifiers.
//!
//! Records are created once, never mutated, and deleted by id. Ids are
//! assigned by the repository and are never reused within one store.

use crate::analysis::AnalysisPayload;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The user every API operation runs as. There are no accounts.
pub const DEFAULT_USER_ID: UserId = UserId(1);

/// Unique identifier of a stored analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisId(pub u64);

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for AnalysisId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(AnalysisId)
    }
}

/// Identifier of the owning user. Not validated against anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Input for creating a record. The repository assigns `id` and `createdAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFaceAnalysis {
    pub user_id: UserId,
    pub image_url: String,
    pub analysis_data: AnalysisPayload,
}

impl NewFaceAnalysis {
    #[must_use]
    pub fn new(user_id: UserId, image_url: impl Into<String>, analysis_data: AnalysisPayload) -> Self {
        Self {
            user_id,
            image_url: image_url.into(),
            analysis_data,
        }
    }
}

/// A stored face analysis.
///
/// `created_at` is an ISO-8601 UTC timestamp supplied by the caller at
/// creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaceAnalysisRecord {
    pub id: AnalysisId,
    pub user_id: UserId,
    pub image_url: String,
    pub analysis_data: AnalysisPayload,
    pub created_at: String,
}

impl FaceAnalysisRecord {
    /// Materialize a record from its creation input.
    #[must_use]
    pub fn from_new(id: AnalysisId, new: NewFaceAnalysis, created_at: impl Into<String>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            image_url: new.image_url,
            analysis_data: new.analysis_data,
            created_at: created_at.into(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
