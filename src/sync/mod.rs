//! Local/remote step reconciliation.

mod error;
mod reconciler;

pub use error::SyncError;
pub use reconciler::{
    PullOutcome, PullReport, PushOutcome, SyncReconciler, SyncReport, SyncTrigger,
};
