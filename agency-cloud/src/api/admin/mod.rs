//! Admin endpoints, split into sub-modules by domain
//!
//! Mounted behind `user_auth_middleware` + `require_admin`. Every state change
//! writes an `audit_logs` row.

mod agencies;
mod audit;
mod claims;
mod imports;
mod stats;
mod users;

// Re-export all handlers for route registration
pub use agencies::{list_agencies, moderate_agency};
pub use audit::audit_log;
pub use claims::{approve_claim, list_claims, reject_claim};
pub use imports::{import_agencies, list_imports};
pub use stats::get_stats;
pub use users::{list_users, update_user};
