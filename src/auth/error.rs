use thiserror::Error;

use crate::api::ApiError;
use crate::sync::SyncError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("please enter both email and password")]
    MissingCredentials,

    #[error("step target must be greater than zero")]
    InvalidStepTarget,

    /// The backend answered but did not hand out a session.
    #[error("{message}")]
    Rejected { message: String },

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("local store failure: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl AuthError {
    pub fn is_unauthorized(&self) -> bool {
        match self {
            AuthError::Api(err) => err.is_unauthorized(),
            AuthError::Sync(err) => err.is_unauthorized(),
            _ => false,
        }
    }

    /// Text suitable for showing to the user.
    pub fn message(&self) -> String {
        match self {
            AuthError::Api(err) => err.message(),
            other => other.to_string(),
        }
    }
}
