//! # Notice Module
//!
//! Dismissible notifications raised when the wizard falls back to a safe
//! path. Only the content lives here; how a notice is shown is up to the
//! front end.

use serde::{Deserialize, Serialize};

/// How prominently a notice should be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Destructive,
}

/// A user-visible notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notice {
    #[must_use]
    pub fn info(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Info,
        }
    }

    #[must_use]
    pub fn destructive(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: Severity::Destructive,
        }
    }

    // -------------------------------------------------------------------------
    // Scan screen
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn camera_unavailable() -> Self {
        Self::info(
            "Camera Unavailable",
            "Switched to image upload mode as camera access failed.",
        )
    }

    #[must_use]
    pub fn capture_failed() -> Self {
        Self::destructive("Capture Failed", "Failed to capture image. Please try again.")
    }

    #[must_use]
    pub fn file_too_large() -> Self {
        Self::destructive("File Too Large", "Please select an image under 3MB")
    }

    #[must_use]
    pub fn no_face_detected() -> Self {
        Self::destructive("No Face Detected", "Please upload an image with a clear face")
    }

    #[must_use]
    pub fn upload_failed() -> Self {
        Self::destructive("Upload Failed", "There was an error processing your image")
    }

    // -------------------------------------------------------------------------
    // Result screens
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn image_not_found() -> Self {
        Self::destructive(
            "Image Not Found",
            "No face image found. Please try scanning again.",
        )
    }

    #[must_use]
    pub fn analysis_failed() -> Self {
        Self::destructive(
            "Analysis Failed",
            "There was an error analyzing your face. Please try again.",
        )
    }

    #[must_use]
    pub fn missing_analysis() -> Self {
        Self::destructive("Error", "No analysis data found. Please try scanning again.")
    }

    #[must_use]
    pub fn invalid_analysis() -> Self {
        Self::destructive("Error", "Invalid analysis data. Please try scanning again.")
    }

    #[must_use]
    pub fn analysis_complete() -> Self {
        Self::info("Analysis Complete", "Thank you for using LookMax AI!")
    }
}
