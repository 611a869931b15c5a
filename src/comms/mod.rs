//! Axum HTTP channel: serves the mentor page under `/` and `/s/*`, and a
//! JSON API under `/api/`.
//!
//! The page routes are plain HTML forms. Every post mutates the session
//! and redirects back (303) so the browser re-renders the whole page; a
//! failed post re-renders directly with a notice instead.
//!
//! ## URL layout
//!
//! ```text
//! GET    /                              → new session, 303 /s/{id}
//! GET    /s/{id}                        → page
//! POST   /s/{id}/initialize             → form: module, experience
//! POST   /s/{id}/reset
//! POST   /s/{id}/message                → form: message
//! GET    /favicon.ico                   → 204
//!
//! GET    /api/health
//! GET    /api/options
//! POST   /api/sessions
//! GET    /api/session/{id}
//! DELETE /api/session/{id}
//! POST   /api/session/{id}/initialize
//! POST   /api/session/{id}/reset
//! POST   /api/session/{id}/message
//! ```

mod api;
mod page;

use std::sync::Arc;

use axum::{
    Router,
    http::StatusCode,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::MentorConfig;
use crate::error::AppError;
use crate::llm::LlmProvider;
use crate::session::{SessionError, SessionRegistry};

// ── Shared request state ──────────────────────────────────────────────────────

/// Router state injected into every handler via [`axum::extract::State`].
///
/// Cheap to clone; the registry and config are reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<SessionRegistry>,
    pub provider: LlmProvider,
    pub mentor: Arc<MentorConfig>,
}

impl AppState {
    pub fn new(provider: LlmProvider, mentor: MentorConfig) -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new(mentor.system_template.as_str())),
            provider,
            mentor: Arc::new(mentor),
        }
    }
}

/// HTTP status for a rejected session operation.
pub(crate) fn status_for(e: &SessionError) -> StatusCode {
    match e {
        SessionError::IncompleteSelection { .. }
        | SessionError::UnknownChoice { .. }
        | SessionError::EmptyMessage => StatusCode::UNPROCESSABLE_ENTITY,
        SessionError::AlreadyStarted
        | SessionError::NotStarted
        | SessionError::TurnInFlight
        | SessionError::NoPendingTurn => StatusCode::CONFLICT,
        SessionError::Provider(_) => StatusCode::BAD_GATEWAY,
    }
}

// ── Server loop ───────────────────────────────────────────────────────────────

/// Bind `bind_addr` and serve until `shutdown` is cancelled.
pub async fn serve(
    bind_addr: &str,
    state: AppState,
    shutdown: CancellationToken,
) -> Result<(), AppError> {
    let provider = state.provider.name();
    let router = build_router(state);

    let listener = TcpListener::bind(bind_addr)
        .await
        .map_err(|e| AppError::Comms(format!("bind failed on {bind_addr}: {e}")))?;

    info!(%bind_addr, provider, "mentor chat listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .map_err(|e| AppError::Comms(format!("server error: {e}")))?;

    info!("mentor chat shut down");
    Ok(())
}

// ── Router ────────────────────────────────────────────────────────────────────

pub fn build_router(state: AppState) -> Router {
    Router::new()
        // API routes
        .route("/api/health",                           get(api::health))
        .route("/api/options",                          get(api::options))
        .route("/api/sessions",                         post(api::create_session))
        .route("/api/session/{session_id}",             get(api::session_detail).delete(api::end_session))
        .route("/api/session/{session_id}/initialize",  post(api::initialize))
        .route("/api/session/{session_id}/reset",       post(api::reset))
        .route("/api/session/{session_id}/message",     post(api::message))
        // Page routes
        .route("/favicon.ico",                 get(|| async { StatusCode::NO_CONTENT }))
        .route("/",                            get(page::root))
        .route("/s/{session_id}",              get(page::show))
        .route("/s/{session_id}/initialize",   post(page::initialize))
        .route("/s/{session_id}/reset",        post(page::reset))
        .route("/s/{session_id}/message",      post(page::message))
        .with_state(state)
}
