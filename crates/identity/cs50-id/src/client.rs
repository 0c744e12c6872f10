//! Redirect/callback handshake against CS50 ID.

use crate::claims::merge_claims;
use crate::config::{ClientConfig, FieldRequestStyle, parse_url};
use crate::error::{AuthError, AuthResult, ConfigError};
use crate::http::ProviderClient;
use crate::state::AntiForgeryToken;
use crate::types::{AuthOutcome, CallbackParams, RedirectInstruction};
use cs50_id_core::{Claims, SessionStore};
use tracing::{debug, info, warn};

const SREG_NAMESPACE: &str = "http://openid.net/extensions/sreg/1.1";

/// Relying-party client for one provider configuration.
///
/// Holds no per-user state; the caller passes the current user's session
/// into every operation.
#[derive(Clone)]
pub struct IdentityClient {
    config: ClientConfig,
    http: ProviderClient,
}

impl IdentityClient {
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let http = ProviderClient::new(config.http_timeout())?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start a login attempt.
    ///
    /// Stores a fresh anti-forgery token in `session`, replacing any earlier
    /// one, and returns the provider URL carrying it as `state`.
    pub async fn initiate(&self, session: &dyn SessionStore) -> AuthResult<RedirectInstruction> {
        let token = AntiForgeryToken::generate();
        let url = self.authorization_url(&token)?;

        session.set(token.as_str().to_string()).await?;

        debug!(
            "Generated authorization URL for client {}",
            self.config.client_id
        );

        Ok(RedirectInstruction {
            url,
            state: token.into_inner(),
        })
    }

    /// Finish a login attempt from the provider's callback.
    pub async fn complete(
        &self,
        session: &dyn SessionStore,
        callback: &CallbackParams,
    ) -> AuthResult<Claims> {
        let Some(code) = callback.code.as_deref() else {
            let provider_error = callback.provider_error();
            if let Some(error) = &provider_error {
                warn!("Provider returned error on callback: {}", error);
            }
            return Err(AuthError::MissingCode { provider_error });
        };
        let state = callback.state.as_deref().ok_or(AuthError::MissingState)?;

        // The stored token is single use, whatever the comparison says.
        let stored = session.take().await?;
        match stored {
            Some(stored) if AntiForgeryToken::matches(&stored, state) => {}
            Some(_) => {
                warn!("Rejected callback: state does not match the session token");
                return Err(AuthError::StateMismatch);
            }
            None => {
                warn!("Rejected callback: no login attempt pending for this session");
                return Err(AuthError::StateMismatch);
            }
        }

        let token = self.http.exchange_code(&self.config, code).await?;
        let user_info = self
            .http
            .fetch_user_info(&self.config, &token.access_token)
            .await?;

        let claims = merge_claims(
            &user_info,
            &self.config.identity_claim,
            &self.config.profile_fields,
        )
        .ok_or_else(|| {
            AuthError::ClaimsFetchFailed(format!(
                "user info response has no '{}' member",
                self.config.identity_claim
            ))
        })?;

        info!("Authenticated subject {}", claims.identity());
        Ok(claims)
    }

    /// Complete the attempt when the request carries both `code` and
    /// `state`, otherwise start a new one.
    pub async fn authenticate(
        &self,
        session: &dyn SessionStore,
        callback: &CallbackParams,
    ) -> AuthResult<AuthOutcome> {
        if callback.is_callback() {
            self.complete(session, callback)
                .await
                .map(AuthOutcome::Authenticated)
        } else {
            self.initiate(session).await.map(AuthOutcome::Redirect)
        }
    }

    fn authorization_url(&self, state: &AntiForgeryToken) -> Result<String, ConfigError> {
        let mut url = parse_url("authorization", &self.config.endpoints.authorization_endpoint)?;

        let mut params = url.query_pairs_mut();
        params.append_pair("response_type", "code");
        params.append_pair("client_id", &self.config.client_id);
        params.append_pair("redirect_uri", &self.config.redirect_uri);
        params.append_pair("scope", &self.config.scopes.join(" "));
        params.append_pair("state", state.as_str());

        if self.config.field_request_style == FieldRequestStyle::SimpleRegistration
            && !self.config.profile_fields.is_empty()
        {
            params.append_pair("openid.ns.sreg", SREG_NAMESPACE);
            params.append_pair("openid.sreg.optional", &self.config.profile_fields.join(","));
        }

        drop(params);
        Ok(url.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cs50_id_core::MemorySession;
    use std::collections::HashMap;
    use url::Url;

    fn client(style: FieldRequestStyle) -> IdentityClient {
        let config = ClientConfig::builder()
            .client_id("test_client_id")
            .client_secret("test_secret")
            .redirect_uri("http://localhost:5000/")
            .field_request_style(style)
            .build();
        IdentityClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_authorization_url_generation() {
        let client = client(FieldRequestStyle::ClaimsOnly);
        let session = MemorySession::new();

        let redirect = client.initiate(&session).await.unwrap();

        let url = Url::parse(&redirect.url).unwrap();
        assert_eq!(url.host_str(), Some("id.cs50.net"));
        assert_eq!(url.path(), "/authorize");

        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params.get("response_type").map(String::as_str), Some("code"));
        assert_eq!(params.get("client_id").map(String::as_str), Some("test_client_id"));
        assert_eq!(
            params.get("redirect_uri").map(String::as_str),
            Some("http://localhost:5000/")
        );
        assert_eq!(params.get("scope").map(String::as_str), Some("openid profile"));
        assert_eq!(params.get("state"), Some(&redirect.state));
        assert!(!redirect.state.is_empty());
        assert!(!params.contains_key("openid.sreg.optional"));
        assert!(!params.contains_key("client_secret"));

        assert_eq!(session.get().await.unwrap(), Some(redirect.state));
    }

    #[tokio::test]
    async fn test_simple_registration_fields() {
        let client = client(FieldRequestStyle::SimpleRegistration);
        let session = MemorySession::new();

        let redirect = client.initiate(&session).await.unwrap();
        let url = Url::parse(&redirect.url).unwrap();
        let params: HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(
            params.get("openid.ns.sreg").map(String::as_str),
            Some(SREG_NAMESPACE)
        );
        assert_eq!(
            params.get("openid.sreg.optional").map(String::as_str),
            Some("email,fullname")
        );
    }

    #[tokio::test]
    async fn test_initiate_never_reuses_token() {
        let client = client(FieldRequestStyle::ClaimsOnly);
        let session = MemorySession::new();

        let first = client.initiate(&session).await.unwrap();
        let second = client.initiate(&session).await.unwrap();

        assert_ne!(first.state, second.state);
        assert_eq!(session.get().await.unwrap(), Some(second.state));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ClientConfig::builder()
            .client_id("id")
            .client_secret("secret")
            .redirect_uri("http://localhost:5000/")
            .scopes(vec!["openid profile".to_string()])
            .build();

        assert!(matches!(
            IdentityClient::new(config),
            Err(ConfigError::InvalidScope(_))
        ));
    }
}
