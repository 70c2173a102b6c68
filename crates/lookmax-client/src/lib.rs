//! # LookMax Client
//!
//! The user-facing side of the LookMax wizard.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lookmax_client::{LookmaxClient, SessionStore, Wizard};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), lookmax_client::ClientError> {
//!     let client = LookmaxClient::new("http://localhost:5000");
//!     let session = SessionStore::new();
//!     session.set_captured_image("data:image/jpeg;base64,...");
//!
//!     let mut wizard = Wizard::new(client, session);
//!     if let Ok(payload) = wizard.enter_analysis(None).await {
//!         println!("{} features", payload.features.len());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Flow
//!
//! ```text
//! ┌──────────┐ capture/upload ┌──────────┐ POST /api/analyze ┌──────────┐
//! │   Scan   │ ─────────────► │ Analysis │ ────────────────► │  Server  │
//! │ (scan.rs)│  capturedImage │(wizard.rs│ ◄──────────────── │          │
//! └──────────┘                └──────────┘   analysisData    └──────────┘
//!                                  │
//!                                  ▼
//!                        Ratings → Recommendations → Home
//! ```

pub mod client;
pub mod models;
pub mod scan;
pub mod session;
pub mod wizard;

pub use client::{HealthResponse, LookmaxClient, MessageResponse};
pub use models::{ModelError, ModelGatedDetector, ModelNet, ModelSet};
pub use scan::{Camera, CameraError, ScanCommand, ScanHandle, ScanOutcome, ScanSession, UploadedFile};
pub use session::SessionStore;
pub use wizard::{Analyzer, Redirect, Screen, Wizard};

use lookmax_core::UploadError;
use thiserror::Error;

// =============================================================================
// ERROR TYPE
// =============================================================================

/// Errors from the LookMax client.
#[derive(Debug, Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error response.
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The API key cannot be sent as an `Authorization` header.
    #[error("Invalid API key: {0}")]
    InvalidApiKey(#[from] reqwest::header::InvalidHeaderValue),

    /// The image was rejected before it was sent.
    #[error("Upload rejected: {0}")]
    Upload(#[from] UploadError),

    /// Reading a local file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
