//! Core types shared by the CS50 ID client and its hosts.
//!
//! The client never owns session storage. Hosts hand it a [`SessionStore`]
//! scoped to the current user's session, and receive [`Claims`] back once a
//! login attempt succeeds.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tokio::sync::RwLock;

/// Claim key that always carries the provider-assigned subject.
pub const IDENTITY_CLAIM: &str = "identity";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session backend error: {0}")]
    Backend(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

/// Capability over the single anti-forgery value held in one user session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read the stored token, if any
    async fn get(&self) -> SessionResult<Option<String>>;

    /// Replace the stored token
    async fn set(&self, token: String) -> SessionResult<()>;

    /// Forget the stored token
    async fn clear(&self) -> SessionResult<()>;

    /// Read and forget the stored token.
    ///
    /// Backends with an atomic swap should override this.
    async fn take(&self) -> SessionResult<Option<String>> {
        let token = self.get().await?;
        self.clear().await?;
        Ok(token)
    }
}

/// In-memory session holding one token
#[derive(Debug, Default)]
pub struct MemorySession {
    token: RwLock<Option<String>>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySession {
    async fn get(&self) -> SessionResult<Option<String>> {
        Ok(self.token.read().await.clone())
    }

    async fn set(&self, token: String) -> SessionResult<()> {
        *self.token.write().await = Some(token);
        Ok(())
    }

    async fn clear(&self) -> SessionResult<()> {
        *self.token.write().await = None;
        Ok(())
    }

    async fn take(&self) -> SessionResult<Option<String>> {
        Ok(self.token.write().await.take())
    }
}

/// Attributes about an authenticated user.
///
/// Always holds [`IDENTITY_CLAIM`]; every other key is present only when the
/// provider returned a value for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(BTreeMap<String, serde_json::Value>);

impl Claims {
    pub fn new(identity: impl Into<String>) -> Self {
        let mut claims = BTreeMap::new();
        claims.insert(
            IDENTITY_CLAIM.to_string(),
            serde_json::Value::String(identity.into()),
        );
        Self(claims)
    }

    pub fn identity(&self) -> &str {
        self.get_str(IDENTITY_CLAIM).unwrap_or_default()
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.0.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Overlay a claim. The identity claim cannot be replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) -> bool {
        let key = key.into();
        if key == IDENTITY_CLAIM {
            return false;
        }
        self.0.insert(key, value);
        true
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &serde_json::Value)> {
        self.0.iter()
    }

    pub fn into_inner(self) -> BTreeMap<String, serde_json::Value> {
        self.0
    }
}
