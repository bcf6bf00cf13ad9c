//! Typed client for the fitness backend REST API.

mod client;
mod error;
pub mod models;

pub use client::{ApiClient, ApiConfig, DEFAULT_REQUEST_TIMEOUT};
pub use error::ApiError;
