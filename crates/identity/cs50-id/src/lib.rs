//! Relying-party client for CS50 ID.
//!
//! Drives the OAuth2 authorization-code handshake: redirect the browser to
//! the provider with an anti-forgery `state`, then on callback check the
//! state, exchange the code for an access token and fetch the user's claims.
//! Token and signature verification stay with the provider.
//!
//! ```no_run
//! use cs50_id::{AuthOutcome, CallbackParams, ClientConfig, IdentityClient, MemorySession};
//!
//! # async fn handler(query: &str) -> Result<(), Box<dyn std::error::Error>> {
//! let client = IdentityClient::new(
//!     ClientConfig::builder()
//!         .client_id("my-app")
//!         .client_secret("my-secret")
//!         .redirect_uri("https://app.example.com/")
//!         .build(),
//! )?;
//!
//! let session = MemorySession::new();
//! match client.authenticate(&session, &CallbackParams::from_query(query)).await? {
//!     AuthOutcome::Redirect(redirect) => println!("redirect to {}", redirect.url),
//!     AuthOutcome::Authenticated(claims) => println!("hello {}", claims.identity()),
//! }
//! # Ok(())
//! # }
//! ```

mod claims;
mod client;
mod config;
mod error;
mod http;
mod state;
mod types;


pub use client::IdentityClient;
pub use config::{
    CS50_AUTHORIZATION_ENDPOINT, CS50_TOKEN_ENDPOINT, CS50_USERINFO_ENDPOINT, ClientConfig,
    FieldRequestStyle, ProviderEndpoints,
};
pub use error::{AuthError, AuthResult, ConfigError};
pub use state::AntiForgeryToken;
pub use types::{AuthOutcome, CallbackParams, RedirectInstruction, TokenResponse};

// Re-export common types for convenience
pub use cs50_id_core::{Claims, IDENTITY_CLAIM, MemorySession, SessionError, SessionStore};
