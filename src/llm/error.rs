//! LLM error types

use thiserror::Error;

/// LLM error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct LlmError {
    pub kind: LlmErrorKind,
    pub message: String,
}

impl LlmError {
    pub fn new(kind: LlmErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Network, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::Auth, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(LlmErrorKind::MalformedResponse, message)
    }

    /// Error for a non-success HTTP status
    pub fn from_status(status: u16, body: &str) -> Self {
        let kind = LlmErrorKind::from_status(status);
        let label = match kind {
            LlmErrorKind::Auth => "Authentication failed",
            LlmErrorKind::RateLimit => "Rate limited",
            LlmErrorKind::ServerError => "Inference server error",
            _ => "Request rejected",
        };
        Self::new(kind, format!("{label} ({status}): {body}"))
    }
}

/// Error classification, used for logging only; nothing is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Connection failures and timeouts
    Network,
    /// Rate limited (429)
    RateLimit,
    /// Upstream failure (5xx, including a model that is still loading)
    ServerError,
    /// Missing or rejected token (401, 403)
    Auth,
    /// Other 4xx
    InvalidRequest,
    /// 2xx with a body we can't use
    MalformedResponse,
}

impl LlmErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::RateLimit => "rate_limit",
            Self::ServerError => "server_error",
            Self::Auth => "auth",
            Self::InvalidRequest => "invalid_request",
            Self::MalformedResponse => "malformed_response",
        }
    }

    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Auth,
            429 => Self::RateLimit,
            500..=599 => Self::ServerError,
            _ => Self::InvalidRequest,
        }
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            LlmError::malformed(format!("Could not decode response: {e}"))
        } else if e.is_timeout() {
            LlmError::network(format!("Request timed out: {e}"))
        } else {
            LlmError::network(e.to_string())
        }
    }
}
