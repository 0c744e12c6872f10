//! Client configuration.

use crate::error::ConfigError;
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

pub const CS50_AUTHORIZATION_ENDPOINT: &str = "https://id.cs50.net/authorize";
pub const CS50_TOKEN_ENDPOINT: &str = "https://id.cs50.net/token";
pub const CS50_USERINFO_ENDPOINT: &str = "https://id.cs50.net/userinfo";

/// Provider URLs used during the handshake
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderEndpoints {
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
}

impl ProviderEndpoints {
    pub fn cs50() -> Self {
        Self {
            authorization_endpoint: CS50_AUTHORIZATION_ENDPOINT.to_string(),
            token_endpoint: CS50_TOKEN_ENDPOINT.to_string(),
            userinfo_endpoint: CS50_USERINFO_ENDPOINT.to_string(),
        }
    }

    /// Endpoints rooted at `base`, using the CS50 ID path layout
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            authorization_endpoint: format!("{base}/authorize"),
            token_endpoint: format!("{base}/token"),
            userinfo_endpoint: format!("{base}/userinfo"),
        }
    }
}

impl Default for ProviderEndpoints {
    fn default() -> Self {
        Self::cs50()
    }
}

/// How requested profile fields are advertised on the authorization URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldRequestStyle {
    /// Fields only select claims from the user-info response
    #[default]
    ClaimsOnly,
    /// Also send OpenID Simple Registration `openid.sreg.optional`
    SimpleRegistration,
}

/// Relying-party configuration for one deployment.
#[derive(Clone, Serialize, Deserialize, Builder)]
pub struct ClientConfig {
    #[builder(into)]
    pub client_id: String,

    #[builder(into)]
    pub client_secret: String,

    /// Must match the redirect URI registered with the provider
    #[builder(into)]
    pub redirect_uri: String,

    #[builder(default = default_scopes())]
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,

    /// Optional profile claims to hand back alongside `identity`
    #[builder(default = default_profile_fields())]
    #[serde(default = "default_profile_fields")]
    pub profile_fields: Vec<String>,

    #[builder(default)]
    #[serde(default)]
    pub field_request_style: FieldRequestStyle,

    #[builder(default)]
    #[serde(default)]
    pub endpoints: ProviderEndpoints,

    /// User-info member holding the subject
    #[builder(into, default = default_identity_claim())]
    #[serde(default = "default_identity_claim")]
    pub identity_claim: String,

    #[builder(default = default_http_timeout_seconds())]
    #[serde(default = "default_http_timeout_seconds")]
    pub http_timeout_seconds: u64,
}

fn default_scopes() -> Vec<String> {
    vec!["openid".to_string(), "profile".to_string()]
}

fn default_profile_fields() -> Vec<String> {
    vec!["email".to_string(), "fullname".to_string()]
}

fn default_identity_claim() -> String {
    "sub".to_string()
}

fn default_http_timeout_seconds() -> u64 {
    30
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("profile_fields", &self.profile_fields)
            .field("field_request_style", &self.field_request_style)
            .field("endpoints", &self.endpoints)
            .field("identity_claim", &self.identity_claim)
            .field("http_timeout_seconds", &self.http_timeout_seconds)
            .finish()
    }
}

impl ClientConfig {
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::MissingClientId);
        }
        if self.client_secret.is_empty() {
            return Err(ConfigError::MissingClientSecret);
        }

        parse_url("redirect", &self.redirect_uri)?;
        parse_url("authorization", &self.endpoints.authorization_endpoint)?;
        parse_url("token", &self.endpoints.token_endpoint)?;
        parse_url("userinfo", &self.endpoints.userinfo_endpoint)?;

        if self.scopes.is_empty() {
            return Err(ConfigError::EmptyScope);
        }
        if let Some(bad) = self.scopes.iter().find(|s| !is_valid_scope_token(s)) {
            return Err(ConfigError::InvalidScope(bad.clone()));
        }

        Ok(())
    }
}

pub(crate) fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl { name, source })
}

/// RFC 6749 appendix A.4: `scope-token = 1*( %x21 / %x23-5B / %x5D-7E )`
fn is_valid_scope_token(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| b == 0x21 || (0x23..=0x5B).contains(&b) || (0x5D..=0x7E).contains(&b))
}
