//! Service configuration

/// Startup configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} must be set in {environment} environment")]
    MissingSecret { name: String, environment: String },

    #[error("{name} must not be empty in {environment} environment")]
    EmptySecret { name: String, environment: String },
}

/// OAuth provider settings; present only when every variable is set
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub authorize_url: String,
    pub token_url: String,
    pub userinfo_url: String,
    pub redirect_url: String,
    pub scope: String,
}

impl OAuthConfig {
    fn from_env() -> Option<Self> {
        let get = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Some(Self {
            client_id: get("OAUTH_CLIENT_ID")?,
            client_secret: get("OAUTH_CLIENT_SECRET")?,
            authorize_url: get("OAUTH_AUTHORIZE_URL")?,
            token_url: get("OAUTH_TOKEN_URL")?,
            userinfo_url: get("OAUTH_USERINFO_URL")?,
            redirect_url: get("OAUTH_REDIRECT_URL")?,
            scope: get("OAUTH_SCOPE").unwrap_or_else(|| "openid email profile".into()),
        })
    }
}

/// Service configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT secret for user sessions
    pub jwt_secret: String,
    /// SES sender email address
    pub ses_from_email: String,
    /// Frontend base URL (email links, OAuth completion redirect)
    pub app_base_url: String,
    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,
    /// S3 bucket for agency logos
    pub logo_s3_bucket: String,
    /// Public base URL the logo bucket is served from
    pub logo_public_base_url: String,
    /// Rate limiting switch
    pub rate_limit_enabled: bool,
    /// Seconds between compliance expiry sweeps
    pub compliance_sweep_interval_secs: u64,
    pub oauth: Option<OAuthConfig>,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, ConfigError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(ConfigError::MissingSecret {
                        name: name.to_string(),
                        environment: environment.to_string(),
                    });
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(ConfigError::EmptySecret {
                name: name.to_string(),
                environment: environment.to_string(),
            });
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let is_dev = environment == "development";

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            ses_from_email: std::env::var("SES_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@agencydirectory.app".into()),
            app_base_url: std::env::var("APP_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
            logo_s3_bucket: std::env::var("LOGO_S3_BUCKET")
                .unwrap_or_else(|_| "agency-directory-logos".into()),
            logo_public_base_url: std::env::var("LOGO_PUBLIC_BASE_URL")
                .map(|u| u.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "https://logos.agencydirectory.app".into()),
            rate_limit_enabled: std::env::var("RATE_LIMIT_ENABLED")
                .ok()
                .and_then(|v| parse_bool(&v))
                .unwrap_or(!is_dev),
            compliance_sweep_interval_secs: std::env::var("COMPLIANCE_SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|&secs: &u64| secs > 0)
                .unwrap_or(6 * 60 * 60),
            oauth: OAuthConfig::from_env(),
            environment,
        })
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
