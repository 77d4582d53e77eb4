//! Authentication: user JWT middleware, OAuth/PKCE helpers, rate limiting

pub mod oauth;
pub mod rate_limit;
pub mod user_auth;

pub use rate_limit::ClientIp;
pub use user_auth::{MaybeIdentity, UserIdentity};
