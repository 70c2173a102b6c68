//! HTTP client for the LookMax API.

use crate::ClientError;
use lookmax_core::{AnalysisId, DataUri, FaceAnalysisRecord, check_upload_size};
use reqwest::{Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::path::Path;

// =============================================================================
// WIRE TYPES
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// `{ "message": ... }` body used for confirmations and errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    image_data: &'a str,
}

// =============================================================================
// CLIENT
// =============================================================================

/// HTTP client for the LookMax server.
#[derive(Debug, Clone)]
pub struct LookmaxClient {
    base_url: String,
    client: reqwest::Client,
}

impl LookmaxClient {
    /// Create a new client for the given base URL.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let client = LookmaxClient::new("http://localhost:5000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: trim_base(base_url.into()),
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Create a client that sends `Authorization: Bearer <api_key>` with
    /// every request.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidApiKey`] if the key is not a valid header
    /// value.
    pub fn with_api_key(base_url: impl Into<String>, api_key: &str) -> Result<Self, ClientError> {
        use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {}", api_key))?;
        headers.insert(AUTHORIZATION, value);
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .default_headers(headers)
            .build()?;
        Ok(Self {
            base_url: trim_base(base_url.into()),
            client,
        })
    }

    /// Base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Health check.
    pub async fn health(&self) -> Result<HealthResponse, ClientError> {
        let url = format!("{}/health", self.base_url);
        let resp = self.client.get(&url).send().await?;
        Ok(expect_success(resp).await?.json().await?)
    }

    /// Submit an image (as a data URI) for analysis.
    pub async fn analyze(&self, image_data: &str) -> Result<FaceAnalysisRecord, ClientError> {
        let url = format!("{}/api/analyze", self.base_url);
        let resp = self
            .client
            .post(&url)
            .json(&AnalyzeRequest { image_data })
            .send()
            .await?;
        Ok(expect_success(resp).await?.json().await?)
    }

    /// Read an image file, enforce the upload size limit and submit it.
    pub async fn analyze_file(&self, path: &Path) -> Result<FaceAnalysisRecord, ClientError> {
        let bytes = tokio::fs::read(path).await?;
        check_upload_size(bytes.len())?;

        let mime = mime_guess::from_path(path).first_or_octet_stream();
        let uri = DataUri::new(mime.essence_str(), bytes).encode();
        self.analyze(&uri).await
    }

    /// Submit an existing data URI after checking its decoded size.
    pub async fn analyze_data_uri(&self, uri: &str) -> Result<FaceAnalysisRecord, ClientError> {
        let decoded = DataUri::parse(uri)?;
        check_upload_size(decoded.len())?;
        self.analyze(uri).await
    }

    /// List every analysis of the current user.
    pub async fn analyses(&self) -> Result<Vec<FaceAnalysisRecord>, ClientError> {
        let url = format!("{}/api/analyses", self.base_url);
        let resp = self.client.get(&url).send().await?;
        Ok(expect_success(resp).await?.json().await?)
    }

    /// Fetch one analysis. `None` when the server answers 404.
    pub async fn analysis(&self, id: AnalysisId) -> Result<Option<FaceAnalysisRecord>, ClientError> {
        let url = format!("{}/api/analyses/{}", self.base_url, id);
        let resp = self.client.get(&url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Ok(Some(expect_success(resp).await?.json().await?))
    }

    /// Delete one analysis. `false` when the server answers 404.
    pub async fn delete(&self, id: AnalysisId) -> Result<bool, ClientError> {
        let url = format!("{}/api/analyses/{}", self.base_url, id);
        let resp = self.client.delete(&url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        expect_success(resp).await?;
        Ok(true)
    }
}

fn trim_base(mut url: String) -> String {
    while url.ends_with('/') {
        url.pop();
    }
    url
}

/// Turn a non-2xx response into [`ClientError::Server`], using the
/// `message` field of the body when there is one.
async fn expect_success(resp: Response) -> Result<Response, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = serde_json::from_str::<MessageResponse>(&body)
        .map(|m| m.message)
        .unwrap_or_else(|_| {
            status
                .canonical_reason()
                .unwrap_or("unexpected status")
                .to_string()
        });
    Err(ClientError::Server {
        status: status.as_u16(),
        message,
    })
}

// =============================================================================
// TESTS
// =============================================================================
