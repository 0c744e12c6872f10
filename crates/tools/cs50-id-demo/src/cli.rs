use anyhow::{Context, Result};
use clap::Parser;
use cs50_id::{ClientConfig, FieldRequestStyle, ProviderEndpoints};
use std::net::SocketAddr;
use std::time::Duration;

/// Log users in through CS50 ID
#[derive(Parser, Debug, Clone)]
#[command(name = "cs50-id-demo")]
#[command(about = "Minimal web application authenticating users with CS50 ID")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:5000")]
    pub bind: SocketAddr,

    /// OAuth2 client identifier
    #[arg(long, env = "CS50_CLIENT_ID")]
    pub client_id: String,

    /// OAuth2 client secret
    #[arg(long, env = "CS50_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,

    /// Redirect URI registered with CS50 ID
    #[arg(long, env = "CS50_REDIRECT_URI", default_value = "http://127.0.0.1:5000/")]
    pub redirect_uri: String,

    /// Scopes to request
    #[arg(long, env = "CS50_SCOPE", value_delimiter = ' ', default_values_t = ["openid".to_string(), "profile".to_string()])]
    pub scope: Vec<String>,

    /// Optional profile fields to hand back
    #[arg(long, env = "CS50_FIELDS", value_delimiter = ',', default_values_t = ["email".to_string(), "fullname".to_string()])]
    pub fields: Vec<String>,

    /// Also advertise fields with OpenID Simple Registration parameters
    #[arg(long)]
    pub sreg: bool,

    /// Provider base URL, e.g. a local mock; defaults to CS50 ID
    #[arg(long, env = "CS50_PROVIDER_URL")]
    pub provider_url: Option<String>,

    /// Timeout in seconds for calls to the provider
    #[arg(long, default_value_t = 30)]
    pub http_timeout: u64,

    /// Seconds a browser has to come back from the provider
    #[arg(long, default_value_t = 600)]
    pub login_ttl: u64,

    /// Most logins kept pending at once; the oldest is dropped first
    #[arg(long, default_value_t = 10_000)]
    pub max_pending_logins: usize,
}

impl Args {
    pub fn client_config(&self) -> Result<ClientConfig> {
        let endpoints = self
            .provider_url
            .as_deref()
            .map(ProviderEndpoints::with_base)
            .unwrap_or_default();

        let field_request_style = if self.sreg {
            FieldRequestStyle::SimpleRegistration
        } else {
            FieldRequestStyle::ClaimsOnly
        };

        let config = ClientConfig::builder()
            .client_id(self.client_id.clone())
            .client_secret(self.client_secret.clone())
            .redirect_uri(self.redirect_uri.clone())
            .scopes(self.scope.clone())
            .profile_fields(self.fields.clone())
            .field_request_style(field_request_style)
            .endpoints(endpoints)
            .http_timeout_seconds(self.http_timeout)
            .build();

        config.validate().context("Invalid CS50 ID configuration")?;
        Ok(config)
    }

    pub fn login_ttl(&self) -> Duration {
        Duration::from_secs(self.login_ttl)
    }
}
