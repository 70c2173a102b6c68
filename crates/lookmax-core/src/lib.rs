//! # LookMax Core
//!
//! The synchronous engine behind the LookMax face analysis wizard.
//!
//! This crate contains:
//! - The record and payload types shared by server and client
//! - The canned analysis tables returned for every scan
//! - The analysis repository (in-memory and redb backends)
//! - The capture readiness gate used by the scan screen
//! - Upload validation and data-URI encoding
//! - The interface of the external face detection primitive
//!
//! Nothing in here performs I/O on its own except the redb backend, and no
//! function reads the wall clock. Callers pass timestamps in.

pub mod analysis;
pub mod capture;
pub mod detect;
pub mod notice;
pub mod record;
pub mod storage;
pub mod upload;

pub use analysis::{AnalysisPayload, FaceFeature, FaceRating, FaceRecommendation};
pub use capture::{CaptureGate, GateEffect, GateError, GateSnapshot, Mode, ProbeOutcome};
pub use detect::{BoundingBox, DetectError, Detection, FaceDetector, Frame, Point};
pub use notice::{Notice, Severity};
pub use record::{AnalysisId, DEFAULT_USER_ID, FaceAnalysisRecord, NewFaceAnalysis, UserId};
pub use storage::{AnalysisStore, MemStore, RedbStore, Storage};
pub use upload::{DataUri, MAX_UPLOAD_BYTES, UploadError, check_upload_size};

use thiserror::Error;

// =============================================================================
// ERROR TYPE
// =============================================================================

/// Errors raised by the core repository layer.
#[derive(Debug, Error)]
pub enum LookmaxError {
    /// The storage backend failed (I/O, transaction, table access).
    #[error("storage error: {0}")]
    Storage(String),

    /// A stored record could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] postcard::Error),

    /// An unknown storage backend name was requested.
    #[error("unknown storage backend '{0}' (expected 'memory' or 'redb')")]
    InvalidBackend(String),
}

impl LookmaxError {
    /// Wrap any backend error as a storage error.
    pub(crate) fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, LookmaxError>;
