//! Multi-step operations shared by handlers and background tasks

pub mod access;
pub mod compliance_alerts;
pub mod import;
pub mod profile_links;
