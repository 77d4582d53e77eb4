//! Unified error system for the agency directory
//!
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ApiResponse`] / [`ErrorEnvelope`]: the `{ data }` / `{ error }` wire envelopes
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Agency errors
//! - 4xxx: Claim errors
//! - 5xxx: Compliance errors
//! - 6xxx: Messaging errors
//! - 7xxx: Upload / import errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorCode, ErrorEnvelope};
//!
//! let err = AppError::with_message(ErrorCode::ValidationFailed, "Invalid email format")
//!     .with_detail("field", "email");
//!
//! let body = ErrorEnvelope::from(&err);
//! assert_eq!(body.error.code, ErrorCode::ValidationFailed);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::ErrorCode;
pub use types::{ApiResponse, AppError, AppResult, ErrorBody, ErrorEnvelope};
