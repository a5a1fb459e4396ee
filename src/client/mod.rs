//! Analysis backend client.
//!
//! The dashboard talks to four backend endpoints:
//!
//! - `GET  /api/data/{resourceType}[?source=json]`: the analysis payload
//! - `POST /upload/{resourceType}`: multipart CSV upload
//! - `POST /delete-uploads/{resourceType}`: clear uploaded files
//! - `GET  /api/export/recommendations`: recommendations export
//!
//! [`Backend`] is the seam the controller depends on; [`BackendClient`] is
//! the synchronous `ureq` implementation.

pub mod multipart;

use std::fmt;
use std::io::Read;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::config::PlansightConfig;
use crate::payload::AnalysisPayload;

pub use multipart::{PreparedUpload, UploadField, UploadForm, UploadPart};

// ---------------------------------------------------------------------------
// Data source
// ---------------------------------------------------------------------------

/// Where the backend reads the analysis inputs from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    /// Uploaded CSV files.
    #[default]
    Csv,
    /// A prior environment scan saved as JSON.
    Json,
}

impl DataSource {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "csv" => Some(Self::Csv),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path of the payload endpoint for a resource type and source.
pub fn data_path(resource_type: &str, source: DataSource) -> String {
    match source {
        DataSource::Csv => format!("/api/data/{resource_type}"),
        DataSource::Json => format!("/api/data/{resource_type}?source=json"),
    }
}

/// Resource type named in a page path: the segment after a literal
/// `analyze` segment, e.g. `app-service` in `/analyze/app-service`.
pub fn resource_type_from_path(path: &str) -> Option<String> {
    let path = path.split(['?', '#']).next().unwrap_or_default();
    let mut segments = path.split('/').filter(|s| !s.is_empty());
    segments.find(|s| *s == "analyze")?;
    segments.next().map(str::to_string)
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a payload fetch produced no dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// 404 `no_data`: nothing uploaded or scanned yet.
    #[error("no data available: {message}")]
    NoData { message: String },
    /// 400 `missing_plans_file`: uploads present but the required one is missing.
    #[error("missing required file: {message}")]
    MissingRequiredFile { message: String },
    #[error("HTTP {status}: {status_text} ({url})")]
    UnexpectedStatus {
        status: u16,
        status_text: String,
        url: String,
    },
    #[error("request to {url} failed: {detail}")]
    Transport { url: String, detail: String },
    #[error("invalid response from {url}: {detail}")]
    Decode { url: String, detail: String },
}

/// Why an upload or delete action failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// Rejected locally before any request was sent.
    #[error("{0}")]
    Invalid(String),
    /// The backend answered `success: false`.
    #[error("{0}")]
    Rejected(String),
    #[error("request to {url} failed: {detail}")]
    Transport { url: String, detail: String },
    #[error("invalid response from {url}: {detail}")]
    Decode { url: String, detail: String },
}

/// Body of `{error, message}` responses.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ErrorBody {
    error: String,
    message: String,
}

/// Map a non-OK payload response to the error taxonomy.
pub fn classify_status(status: u16, status_text: &str, body: &str, url: &str) -> FetchError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    match (status, parsed.error.as_str()) {
        (404, "no_data") => FetchError::NoData {
            message: parsed.message,
        },
        (400, "missing_plans_file") => FetchError::MissingRequiredFile {
            message: parsed.message,
        },
        _ => FetchError::UnexpectedStatus {
            status,
            status_text: status_text.to_string(),
            url: url.to_string(),
        },
    }
}

// ---------------------------------------------------------------------------
// Action replies
// ---------------------------------------------------------------------------

/// Reply to an upload or delete request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionReply {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filenames: Option<Vec<String>>,
}

impl ActionReply {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Turn `success: false` into [`ActionError::Rejected`].
    pub fn into_result(self, fallback: &str) -> Result<Self, ActionError> {
        if self.success {
            Ok(self)
        } else {
            Err(ActionError::Rejected(
                self.error.unwrap_or_else(|| fallback.to_string()),
            ))
        }
    }
}

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// Operations the dashboard performs against the analysis backend.
pub trait Backend {
    /// Fetch the analysis payload for a resource type.
    fn fetch_payload(
        &self,
        resource_type: &str,
        source: DataSource,
    ) -> Result<AnalysisPayload, FetchError>;

    /// Upload validated files. The reply may still be `success: false`.
    fn upload(&self, resource_type: &str, upload: &PreparedUpload)
    -> Result<ActionReply, ActionError>;

    /// Delete every uploaded file for a resource type.
    fn delete_uploads(&self, resource_type: &str) -> Result<ActionReply, ActionError>;

    /// Fetch the recommendations export document.
    fn export_recommendations(&self) -> Result<Value, FetchError>;
}

/// Synchronous HTTP client for the analysis backend.
#[derive(Debug, Clone)]
pub struct BackendClient {
    base_url: String,
    timeout: Duration,
}

/// A backend response forwarded verbatim.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        // "localhost" may resolve to ::1 first while the backend only binds
        // IPv4.
        let base_url = base_url
            .trim_end_matches('/')
            .replace("://localhost", "://127.0.0.1");
        Self { base_url, timeout }
    }

    pub fn from_config(config: &PlansightConfig) -> Self {
        Self::new(
            &config.backend.base_url,
            Duration::from_millis(config.backend.timeout_ms),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a backend path.
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Whether the backend answers at all. Any HTTP status counts.
    pub fn is_reachable(&self) -> bool {
        match ureq::get(&self.url("/"))
            .timeout(Duration::from_secs(5))
            .call()
        {
            Ok(_) | Err(ureq::Error::Status(..)) => true,
            Err(ureq::Error::Transport(_)) => false,
        }
    }

    /// Send a request body to the backend and return whatever it answers,
    /// status and all. Used by the web server to proxy mutations.
    pub fn forward(
        &self,
        method: &str,
        path: &str,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<RawResponse, ActionError> {
        let url = self.url(path);
        let mut request = ureq::request(method, &url).timeout(self.timeout);
        if let Some(ct) = content_type {
            request = request.set("Content-Type", ct);
        }
        let response = match request.send_bytes(body) {
            Ok(resp) | Err(ureq::Error::Status(_, resp)) => resp,
            Err(ureq::Error::Transport(t)) => {
                return Err(ActionError::Transport {
                    url,
                    detail: t.to_string(),
                });
            }
        };
        let status = response.status();
        let content_type = response.content_type().to_string();
        let mut bytes = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut bytes)
            .map_err(|e| ActionError::Transport {
                url: url.clone(),
                detail: e.to_string(),
            })?;
        Ok(RawResponse {
            status,
            content_type,
            body: bytes,
        })
    }

    fn post_action(
        &self,
        path: &str,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<ActionReply, ActionError> {
        let url = self.url(path);
        let raw = self.forward("POST", path, content_type, body)?;
        serde_json::from_slice(&raw.body).map_err(|e| ActionError::Decode {
            url,
            detail: format!("HTTP {}: {e}", raw.status),
        })
    }

    fn get_json(&self, path: &str) -> Result<(String, String), FetchError> {
        let url = self.url(path);
        match ureq::get(&url).timeout(self.timeout).call() {
            Ok(resp) => {
                let text = resp.into_string().map_err(|e| FetchError::Decode {
                    url: url.clone(),
                    detail: e.to_string(),
                })?;
                Ok((url, text))
            }
            Err(ureq::Error::Status(status, resp)) => {
                let status_text = resp.status_text().to_string();
                let body = resp.into_string().unwrap_or_default();
                Err(classify_status(status, &status_text, &body, &url))
            }
            Err(ureq::Error::Transport(t)) => Err(FetchError::Transport {
                url,
                detail: t.to_string(),
            }),
        }
    }
}

impl Backend for BackendClient {
    fn fetch_payload(
        &self,
        resource_type: &str,
        source: DataSource,
    ) -> Result<AnalysisPayload, FetchError> {
        let (url, text) = self.get_json(&data_path(resource_type, source))?;
        AnalysisPayload::from_json(&text).map_err(|e| FetchError::Decode {
            url,
            detail: e.to_string(),
        })
    }

    fn upload(
        &self,
        resource_type: &str,
        upload: &PreparedUpload,
    ) -> Result<ActionReply, ActionError> {
        let (content_type, body) = upload.encode();
        self.post_action(
            &format!("/upload/{resource_type}"),
            Some(&content_type),
            &body,
        )
    }

    fn delete_uploads(&self, resource_type: &str) -> Result<ActionReply, ActionError> {
        self.post_action(&format!("/delete-uploads/{resource_type}"), None, &[])
    }

    fn export_recommendations(&self) -> Result<Value, FetchError> {
        let (url, text) = self.get_json("/api/export/recommendations")?;
        serde_json::from_str(&text).map_err(|e| FetchError::Decode {
            url,
            detail: e.to_string(),
        })
    }
}
