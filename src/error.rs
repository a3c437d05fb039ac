//! Error types for the chatflow service.

use thiserror::Error;

/// Storage tier errors.
///
/// Absence of a record is not an error: `get`/`fetch` return `Ok(None)` for a
/// miss. `Unavailable` means the tier could not answer at all, which callers
/// must never treat as a miss.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("stored document corrupted: {0}")]
    Corrupted(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Corrupted(err.to_string())
    }
}

/// Errors from external providers: LLM vendors and search backends.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("{provider} returned HTTP {status}: {message}")]
    Http {
        provider: String,
        status: u16,
        message: String,
        retry_after_secs: Option<u64>,
    },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("malformed provider response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

impl ProviderError {
    /// Whether a retry could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http { status, .. } => matches!(*status, 408 | 429) || *status >= 500,
            Self::Network(err) => err.is_timeout() || err.is_connect(),
            Self::Other(message) => {
                let message = message.to_lowercase();
                message.contains("rate limit")
                    || message.contains("timeout")
                    || message.contains("overloaded")
            }
            Self::Json(_) => false,
        }
    }

    /// Provider-requested retry delay, if it sent one.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::Http {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }
}

/// Turn-level errors surfaced by the chat service.
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no prior conversation for this user; chatInterest opt-in is required")]
    OptInRequired,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("assistant response failed: {0}")]
    Llm(#[from] ProviderError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_retryability_by_status() {
        let retryable = ProviderError::Http {
            provider: "openai".to_string(),
            status: 429,
            message: "rate limit".to_string(),
            retry_after_secs: None,
        };
        let non_retryable = ProviderError::Http {
            provider: "openai".to_string(),
            status: 401,
            message: "unauthorized".to_string(),
            retry_after_secs: None,
        };
        assert!(retryable.is_retryable());
        assert!(!non_retryable.is_retryable());
    }

    #[test]
    fn test_other_message_fallback() {
        assert!(ProviderError::Other("rate limit exceeded".to_string()).is_retryable());
        assert!(!ProviderError::Other("bad request".to_string()).is_retryable());
    }

    #[test]
    fn test_miss_is_not_conflated_with_unavailability() {
        let err = StoreError::Unavailable("connection refused".to_string());
        assert!(err.to_string().contains("unavailable"));
    }
}
