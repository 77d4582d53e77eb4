//! Shared types for the agency directory
//!
//! Error system, response envelope, domain models and the pure helpers
//! used by `agency-cloud` and its clients.

pub mod completion;
pub mod compliance;
pub mod email_domain;
pub mod error;
pub mod models;
pub mod privacy;
pub mod util;

// Re-exports
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use serde::{Deserialize, Serialize};
