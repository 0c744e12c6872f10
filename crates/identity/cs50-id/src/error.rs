//! CS50 ID client error types.

use cs50_id_core::SessionError;
use thiserror::Error;

pub type AuthResult<T> = Result<T, AuthError>;

/// Failure of one login attempt. The host restarts with `initiate`.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No `code` on the callback. `provider_error` carries the provider's
    /// `error` (and `error_description`) when it sent one instead.
    #[error("Missing authorization code{}", describe_provider_error(.provider_error))]
    MissingCode { provider_error: Option<String> },

    #[error("Missing state parameter")]
    MissingState,

    #[error("State parameter does not match this session")]
    StateMismatch,

    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    #[error("Claims fetch failed: {0}")]
    ClaimsFetchFailed(String),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl AuthError {
    /// The callback itself was malformed, forged or refused by the user.
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            AuthError::MissingCode { .. }
                | AuthError::MissingState
                | AuthError::StateMismatch
        )
    }

    /// Possible cross-site request forgery.
    pub fn is_forgery(&self) -> bool {
        matches!(self, AuthError::StateMismatch)
    }

    /// The provider or the network failed after the callback was accepted.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            AuthError::TokenExchangeFailed(_) | AuthError::ClaimsFetchFailed(_)
        )
    }
}

fn describe_provider_error(provider_error: &Option<String>) -> String {
    provider_error
        .as_deref()
        .map(|e| format!(" (provider error: {e})"))
        .unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Client id must not be empty")]
    MissingClientId,

    #[error("Client secret must not be empty")]
    MissingClientSecret,

    #[error("At least one scope is required")]
    EmptyScope,

    #[error("Invalid scope token: {0:?}")]
    InvalidScope(String),

    #[error("Invalid {name} URL: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_code_display() {
        let plain = AuthError::MissingCode {
            provider_error: None,
        };
        assert_eq!(plain.to_string(), "Missing authorization code");

        let denied = AuthError::MissingCode {
            provider_error: Some("access_denied: User declined".to_string()),
        };
        assert_eq!(
            denied.to_string(),
            "Missing authorization code (provider error: access_denied: User declined)"
        );
        assert!(denied.is_invalid_request());
        assert!(!denied.is_forgery());
    }
}
