//! API error responses.
//!
//! Every failure is answered with a `{"message": ...}` body. Storage errors
//! are logged here and reduced to the generic message of the operation.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lookmax_client::MessageResponse;
use lookmax_core::LookmaxError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No image data provided")]
    NoImageData,

    #[error("Analysis not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Too many requests")]
    RateLimited,

    /// `context` is the message the client sees.
    #[error("{context}")]
    Internal {
        context: &'static str,
        #[source]
        source: LookmaxError,
    },
}

impl ApiError {
    /// Map a storage error to a 500 with the given client message.
    pub fn internal(context: &'static str) -> impl FnOnce(LookmaxError) -> Self {
        move |source| Self::Internal { context, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NoImageData => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal { context, source } = &self {
            error!(error = %source, "{}", context);
        }
        let body = MessageResponse {
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
