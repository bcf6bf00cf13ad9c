use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Token missing, expired or rejected. Callers send the user back to login.
    #[error("not authorized: {message}")]
    Unauthorized { message: String },

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("backend returned {status}: {message}")]
    Status {
        status: u16,
        message: String,
        retryable: bool,
    },

    #[error("failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }

    /// Failures worth another attempt on the next natural trigger.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Timeout | ApiError::Network(_) => true,
            ApiError::Status { retryable, .. } => *retryable,
            ApiError::Unauthorized { .. } | ApiError::Decode { .. } => false,
        }
    }

    /// Human-readable message as the backend phrased it, when it sent one.
    pub fn message(&self) -> String {
        match self {
            ApiError::Unauthorized { message } | ApiError::Status { message, .. } => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Network(err.to_string())
        }
    }
}
