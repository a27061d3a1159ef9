
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Longest slice of an error body kept in a [`ServiceError::Status`]
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Failure of a single call to an external collaborator
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("refusing to send empty input")]
    EmptyInput,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("service responded with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("response is missing {0}")]
    MissingField(&'static str),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("timed out: {0}")]
    Timeout(String),

    #[error("background task failed: {0}")]
    Task(String),
}

impl ServiceError {
    /// Whether the remote side reported the resource as missing
    #[inline]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Status { status: 404, .. })
    }
}

/// Blocking JSON-over-HTTP client shared by the OpenAI and Pinecone clients
#[derive(Debug, Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
}

impl Default for HttpClient {
    #[inline]
    fn default() -> Self {
        Self::new(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
    }
}

impl HttpClient {
    #[inline]
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .user_agent(concat!("smart-shopper/", env!("CARGO_PKG_VERSION")))
            .build()
            .into();

        Self { agent }
    }

    #[inline]
    pub fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<T, ServiceError> {
        debug!("GET {}", url);

        let mut request = self.agent.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .call()
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        decode_response(url, response)
    }

    #[inline]
    pub fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&str, &str)],
        body: &B,
    ) -> Result<T, ServiceError> {
        debug!("POST {}", url);

        let payload = serde_json::to_string(body)
            .map_err(|e| ServiceError::Decode(format!("failed to serialize request: {}", e)))?;

        let mut request = self
            .agent
            .post(url)
            .header("Content-Type", "application/json");
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request
            .send(&payload)
            .map_err(|e| ServiceError::Transport(e.to_string()))?;
        decode_response(url, response)
    }
}

fn decode_response<T: DeserializeOwned>(
    url: &str,
    mut response: ureq::http::Response<ureq::Body>,
) -> Result<T, ServiceError> {
    let status = response.status();
    let text = response
        .body_mut()
        .read_to_string()
        .map_err(|e| ServiceError::Transport(e.to_string()))?;

    if !status.is_success() {
        warn!("{} responded with HTTP {}", url, status.as_u16());
        return Err(ServiceError::Status {
            status: status.as_u16(),
            body: truncate_body(&text),
        });
    }

    // Empty 2xx bodies decode as JSON null so that unit responses work
    let text = if text.trim().is_empty() { "null" } else { &text };
    serde_json::from_str(text).map_err(|e| ServiceError::Decode(e.to_string()))
}

fn truncate_body(body: &str) -> String {
    if body.chars().count() <= MAX_ERROR_BODY_CHARS {
        body.to_string()
    } else {
        let mut truncated: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        truncated.push('…');
        truncated
    }
}
