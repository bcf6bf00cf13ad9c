//! Sign-in, sign-up, sign-out and profile edits.

mod error;
mod session;

pub use error::AuthError;
pub use session::{AuthSession, LoginOutcome};
