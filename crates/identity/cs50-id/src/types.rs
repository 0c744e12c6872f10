//! OAuth2 protocol types.

use cs50_id_core::Claims;
use serde::{Deserialize, Deserializer, Serialize};
use url::form_urlencoded;

/// Parameters the provider sends back to the redirect URI.
///
/// Empty values are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackParams {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub error: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub error_description: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()))
}

impl CallbackParams {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        params.extend(pairs);
        params
    }

    pub fn from_query(query: &str) -> Self {
        Self::from_pairs(form_urlencoded::parse(query.as_bytes()).map(|(k, v)| (k, v.into_owned())))
    }

    /// Query string parameters overlaid with a form-encoded POST body
    pub fn from_request(query: Option<&str>, form_body: Option<&[u8]>) -> Self {
        let mut params = query.map(Self::from_query).unwrap_or_default();
        if let Some(body) = form_body {
            params.extend(form_urlencoded::parse(body).map(|(k, v)| (k, v.into_owned())));
        }
        params
    }

    fn extend<K, V>(&mut self, pairs: impl IntoIterator<Item = (K, V)>)
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in pairs {
            let value: String = value.into();
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "code" => &mut self.code,
                "state" => &mut self.state,
                "error" => &mut self.error,
                "error_description" => &mut self.error_description,
                _ => continue,
            };
            *slot = Some(value);
        }
    }

    /// The request carries what `complete` needs to finish a login
    pub fn is_callback(&self) -> bool {
        self.code.is_some() && self.state.is_some()
    }

    /// `error` joined with `error_description`, when the provider sent one
    pub fn provider_error(&self) -> Option<String> {
        let error = self.error.as_deref()?;
        Some(match self.error_description.as_deref() {
            Some(description) => format!("{error}: {description}"),
            None => error.to_string(),
        })
    }
}

/// Where to send the browser to start a login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectInstruction {
    pub url: String,
    pub state: String,
}

/// Result of [`crate::IdentityClient::authenticate`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AuthOutcome {
    Redirect(RedirectInstruction),
    Authenticated(Claims),
}

/// OAuth2 token response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: Option<String>,
    pub expires_in: Option<u64>,
    pub refresh_token: Option<String>,
    pub scope: Option<String>,
    pub id_token: Option<String>,
}
