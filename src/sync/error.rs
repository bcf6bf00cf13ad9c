use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Error)]
pub enum SyncError {
    /// The backend rejected the stored token; the user must sign in again.
    #[error("session expired: {message}")]
    Unauthorized { message: String },

    #[error("local store failure: {0:#}")]
    Store(#[from] anyhow::Error),
}

impl SyncError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SyncError::Unauthorized { .. })
    }
}

impl SyncError {
    /// Only authentication failures escape a pull; everything else is logged.
    pub(crate) fn from_api(err: ApiError) -> Option<Self> {
        match err {
            ApiError::Unauthorized { message } => Some(SyncError::Unauthorized { message }),
            _ => None,
        }
    }
}
