//! Routes and per-browser session handling for the demo host.

use axum::{
    Json, Router,
    extract::{RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cs50_id::{AuthError, AuthOutcome, CallbackParams, IdentityClient, MemorySession};
use dashmap::DashMap;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "cs50_id_session";

struct PendingLogin {
    session: Arc<MemorySession>,
    started: Instant,
}

/// Sessions of browsers that were sent to the provider and have not come
/// back yet.
///
/// Entries expire after `ttl`, and at most `capacity` are kept; inserting
/// into a full registry evicts the oldest entry.
pub struct SessionRegistry {
    entries: DashMap<String, PendingLogin>,
    ttl: Duration,
    capacity: usize,
}

impl SessionRegistry {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            capacity: capacity.max(1),
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<MemorySession>> {
        self.entries
            .remove_if(id, |_, login| login.started.elapsed() >= self.ttl);
        self.entries.get(id).map(|login| login.session.clone())
    }

    /// Register a new session and return its id
    pub fn insert(&self) -> (String, Arc<MemorySession>) {
        let ttl = self.ttl;
        self.entries.retain(|_, login| login.started.elapsed() < ttl);

        while self.entries.len() >= self.capacity {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|login| login.started)
                .map(|login| login.key().clone());
            match oldest {
                Some(id) => {
                    debug!("Evicting pending login {}", id);
                    self.entries.remove(&id);
                }
                None => break,
            }
        }

        let id = Uuid::new_v4().to_string();
        let session = Arc::new(MemorySession::new());
        self.entries.insert(
            id.clone(),
            PendingLogin {
                session: session.clone(),
                started: Instant::now(),
            },
        );
        (id, session)
    }

    pub fn remove(&self, id: &str) {
        self.entries.remove(id);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<IdentityClient>,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new(client: IdentityClient, sessions: SessionRegistry) -> Self {
        Self {
            client: Arc::new(client),
            sessions: Arc::new(sessions),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(login_handler).post(login_form_handler))
        .with_state(state)
}

async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    RawQuery(query): RawQuery,
) -> Response {
    let callback = CallbackParams::from_query(query.as_deref().unwrap_or_default());
    authenticate(state, jar, callback).await
}

async fn login_form_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    RawQuery(query): RawQuery,
    body: axum::body::Bytes,
) -> Response {
    let callback = CallbackParams::from_request(query.as_deref(), Some(&body[..]));
    authenticate(state, jar, callback).await
}

async fn authenticate(state: AppState, jar: CookieJar, callback: CallbackParams) -> Response {
    let known = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .and_then(|id| state.sessions.get(&id).map(|session| (id, session)));

    // Only a browser about to be sent to the provider gets a registry entry.
    let (jar, id, session) = match known {
        Some((id, session)) => (jar, Some(id), session),
        None if callback.is_callback() => (jar, None, Arc::new(MemorySession::new())),
        None => {
            let (id, session) = state.sessions.insert();
            let cookie = Cookie::build((SESSION_COOKIE, id.clone()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build();
            (jar.add(cookie), Some(id), session)
        }
    };

    match state.client.authenticate(&*session, &callback).await {
        Ok(AuthOutcome::Redirect(redirect)) => {
            info!("Redirecting browser to CS50 ID");
            debug!("{} logins pending", state.sessions.len());
            (jar, Redirect::to(&redirect.url)).into_response()
        }
        Ok(AuthOutcome::Authenticated(claims)) => {
            let jar = end_session(&state, jar, id);
            (jar, Json(claims)).into_response()
        }
        Err(e) => {
            let jar = end_session(&state, jar, id);
            (jar, AuthErrorResponse(e)).into_response()
        }
    }
}

fn end_session(state: &AppState, jar: CookieJar, id: Option<String>) -> CookieJar {
    if let Some(id) = id {
        state.sessions.remove(&id);
    }
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Maps handshake failures onto HTTP responses
pub struct AuthErrorResponse(pub AuthError);

impl IntoResponse for AuthErrorResponse {
    fn into_response(self) -> Response {
        let err = self.0;
        let status = if err.is_invalid_request() {
            StatusCode::BAD_REQUEST
        } else if err.is_provider_failure() {
            StatusCode::BAD_GATEWAY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        if err.is_forgery() {
            warn!("Possible CSRF attempt rejected");
        } else if status.is_server_error() {
            error!("Login failed: {}", err);
        }

        (status, Json(json!({ "error": err.to_string() }))).into_response()
    }
}
