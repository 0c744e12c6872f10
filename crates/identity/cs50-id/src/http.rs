//! Outbound calls to the provider's token and user-info endpoints.

use crate::config::ClientConfig;
use crate::error::{AuthError, AuthResult, ConfigError};
use crate::types::TokenResponse;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error};

/// HTTP client bound by a hard timeout on every provider call
#[derive(Clone)]
pub(crate) struct ProviderClient {
    http_client: Client,
}

impl ProviderClient {
    pub(crate) fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self { http_client })
    }

    /// Exchange an authorization code for tokens
    pub(crate) async fn exchange_code(
        &self,
        config: &ClientConfig,
        code: &str,
    ) -> AuthResult<TokenResponse> {
        let params = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("client_id", config.client_id.as_str()),
            ("client_secret", config.client_secret.as_str()),
            ("redirect_uri", config.redirect_uri.as_str()),
        ];

        let response = self
            .http_client
            .post(&config.endpoints.token_endpoint)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&params)
            .send()
            .await
            .map_err(|e| {
                error!("Token endpoint unreachable: {}", e);
                AuthError::TokenExchangeFailed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Token exchange failed with status {}: {}", status, error_text);
            return Err(AuthError::TokenExchangeFailed(format!(
                "{}: {}",
                status, error_text
            )));
        }

        let token_response: TokenResponse = response.json().await.map_err(|e| {
            error!("Invalid token response: {}", e);
            AuthError::TokenExchangeFailed(format!("invalid token response: {}", e))
        })?;

        debug!("Exchanged authorization code for an access token");
        Ok(token_response)
    }

    /// Fetch the user-info document with a bearer token
    pub(crate) async fn fetch_user_info(
        &self,
        config: &ClientConfig,
        access_token: &str,
    ) -> AuthResult<serde_json::Map<String, serde_json::Value>> {
        let response = self
            .http_client
            .get(&config.endpoints.userinfo_endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                error!("User info endpoint unreachable: {}", e);
                AuthError::ClaimsFetchFailed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("User info request failed with status {}: {}", status, error_text);
            return Err(AuthError::ClaimsFetchFailed(format!(
                "{}: {}",
                status, error_text
            )));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| {
            error!("Invalid user info response: {}", e);
            AuthError::ClaimsFetchFailed(format!("invalid user info response: {}", e))
        })?;

        match body {
            serde_json::Value::Object(user_info) => Ok(user_info),
            other => Err(AuthError::ClaimsFetchFailed(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
