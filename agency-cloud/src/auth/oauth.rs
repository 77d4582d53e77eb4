//! OAuth 2.0 authorization-code flow with PKCE (RFC 7636, S256)

use base64::Engine;
use sha2::{Digest, Sha256};
use url::Url;

use crate::config::OAuthConfig;

/// Where users land after login when no usable `next` is given
pub const DEFAULT_NEXT: &str = "/dashboard";
/// Lifetime of a stored state/verifier pair
pub const STATE_TTL_MS: i64 = 10 * 60 * 1000;

const MAX_NEXT_LEN: usize = 512;

/// S256 code challenge for a verifier
pub fn code_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
}

/// Restrict a post-login redirect to a same-site relative path
pub fn sanitize_next(next: Option<&str>) -> String {
    let Some(next) = next.map(str::trim) else {
        return DEFAULT_NEXT.to_string();
    };
    let safe = next.starts_with('/')
        && !next.starts_with("//")
        && !next.starts_with("/\\")
        && next.len() <= MAX_NEXT_LEN
        && !next.chars().any(|c| c.is_control() || c == '\\');
    if safe {
        next.to_string()
    } else {
        DEFAULT_NEXT.to_string()
    }
}

/// Provider authorization URL
pub fn authorize_url(
    config: &OAuthConfig,
    state: &str,
    challenge: &str,
) -> Result<Url, url::ParseError> {
    Url::parse_with_params(
        &config.authorize_url,
        &[
            ("response_type", "code"),
            ("client_id", config.client_id.as_str()),
            ("redirect_uri", config.redirect_url.as_str()),
            ("scope", config.scope.as_str()),
            ("state", state),
            ("code_challenge", challenge),
            ("code_challenge_method", "S256"),
        ],
    )
}

/// Frontend completion URL; the token travels in the fragment
pub fn completion_url(app_base_url: &str, token: &str, next: &str) -> String {
    let fragment = encode_pairs(&[("token", token), ("next", next)]);
    format!("{app_base_url}/auth/complete#{fragment}")
}

/// Frontend error URL for failed logins
pub fn failure_url(app_base_url: &str, code: &str) -> String {
    let query = encode_pairs(&[("error", code)]);
    format!("{app_base_url}/login?{query}")
}

fn encode_pairs(pairs: &[(&str, &str)]) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

/// Token endpoint response
#[derive(Debug, serde::Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// Userinfo fields the service needs
#[derive(Debug, serde::Deserialize)]
pub struct UserInfo {
    pub email: Option<String>,
    #[serde(default)]
    pub email_verified: Option<bool>,
    pub name: Option<String>,
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Exchange the authorization code (with its verifier) and fetch userinfo
pub async fn exchange_code(
    http: &reqwest::Client,
    config: &OAuthConfig,
    code: &str,
    verifier: &str,
) -> Result<UserInfo, BoxError> {
    let token: TokenResponse = http
        .post(&config.token_url)
        .form(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", config.redirect_url.as_str()),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("code_verifier", verifier),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let info = http
        .get(&config.userinfo_url)
        .bearer_auth(&token.access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(info)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> OAuthConfig {
        OAuthConfig {
            client_id: "client-1".into(),
            client_secret: "secret".into(),
            authorize_url: "https://id.example.com/authorize".into(),
            token_url: "https://id.example.com/token".into(),
            userinfo_url: "https://id.example.com/userinfo".into(),
            redirect_url: "https://api.example.com/api/auth/oauth/callback".into(),
            scope: "openid email".into(),
        }
    }

    #[test]
    fn test_code_challenge_rfc7636_vector() {
        assert_eq!(
            code_challenge("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk"),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_sanitize_next() {
        assert_eq!(sanitize_next(None), "/dashboard");
        assert_eq!(sanitize_next(Some("/agencies/acme")), "/agencies/acme");
        assert_eq!(sanitize_next(Some("/inbox?c=4")), "/inbox?c=4");
        assert_eq!(sanitize_next(Some("https://evil.com")), "/dashboard");
        assert_eq!(sanitize_next(Some("//evil.com")), "/dashboard");
        assert_eq!(sanitize_next(Some("/\\evil.com")), "/dashboard");
        assert_eq!(sanitize_next(Some("/ok\r\nSet-Cookie: x")), "/dashboard");
        assert_eq!(sanitize_next(Some("dashboard")), "/dashboard");
    }

    #[test]
    fn test_authorize_url_carries_pkce() {
        let url = authorize_url(&config(), "st4te", "ch4llenge").unwrap();
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["state"], "st4te");
        assert_eq!(pairs["code_challenge"], "ch4llenge");
        assert_eq!(pairs["code_challenge_method"], "S256");
        assert_eq!(pairs["client_id"], "client-1");
        assert_eq!(pairs["response_type"], "code");
    }

    #[test]
    fn test_completion_url_encodes_fragment() {
        let url = completion_url("https://app.example.com", "a.b.c", "/inbox?c=4");
        assert_eq!(
            url,
            "https://app.example.com/auth/complete#token=a.b.c&next=%2Finbox%3Fc%3D4"
        );
    }
}
