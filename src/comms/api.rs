//! Axum handlers for `/api/*` routes.
//!
//! Each handler receives [`AppState`] via [`axum::extract::State`] and
//! returns an axum [`Response`]. Session-scoped handlers hold the session
//! lock for their whole body.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::debug;

use super::AppState;
use crate::session::{
    Experience, History, Module, PLACEHOLDER, Session, SessionError, SessionEvent, SessionId,
};

// ── Request / response types ──────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct InitializeRequest {
    module: Option<String>,
    experience: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct MessageRequest {
    message: String,
}

/// JSON shape of one session.
#[derive(Serialize)]
pub(super) struct SessionView<'a> {
    session_id: SessionId,
    started: bool,
    module: Option<Module>,
    experience: Option<Experience>,
    history: &'a History,
    events: &'a [SessionEvent],
}

impl<'a> SessionView<'a> {
    fn new(session_id: SessionId, session: &'a Session) -> Self {
        Self {
            session_id,
            started: session.is_started(),
            module: session.module(),
            experience: session.experience(),
            history: session.history(),
            events: session.events(),
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Build a JSON error response body.
fn json_error(code: &str, msg: impl std::fmt::Display) -> Json<serde_json::Value> {
    Json(json!({ "error": code, "message": format!("{msg}") }))
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, json_error("not_found", "unknown session")).into_response()
}

fn session_error(e: &SessionError) -> Response {
    let status = super::status_for(e);
    match e {
        SessionError::IncompleteSelection { missing } => (
            status,
            Json(json!({
                "error": "incomplete_selection",
                "message": e.to_string(),
                "fields": missing,
            })),
        )
            .into_response(),
        SessionError::UnknownChoice { field, .. } => (
            status,
            Json(json!({
                "error": "unknown_choice",
                "message": e.to_string(),
                "fields": [field],
            })),
        )
            .into_response(),
        SessionError::AlreadyStarted => (status, json_error("already_started", e)).into_response(),
        SessionError::NotStarted => (status, json_error("not_started", e)).into_response(),
        SessionError::EmptyMessage => (status, json_error("empty_message", e)).into_response(),
        SessionError::TurnInFlight | SessionError::NoPendingTurn => {
            (status, json_error("conflict", e)).into_response()
        }
        SessionError::Provider(_) => (status, json_error("provider_error", e)).into_response(),
    }
}

fn view(id: SessionId, session: &Session) -> Response {
    (StatusCode::OK, Json(SessionView::new(id, session))).into_response()
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /api/health
pub(super) async fn health(State(state): State<AppState>) -> Response {
    Json(json!({
        "status": "ok",
        "provider": state.provider.name(),
        "model": state.provider.model(),
        "sessions": state.registry.len(),
    }))
    .into_response()
}

/// GET /api/options: the choices offered by the two selectors.
pub(super) async fn options() -> Response {
    Json(json!({
        "placeholder": PLACEHOLDER,
        "modules": Module::ALL,
        "experience_levels": Experience::ALL,
    }))
    .into_response()
}

/// POST /api/sessions
pub(super) async fn create_session(State(state): State<AppState>) -> Response {
    let id = state.registry.create();
    (StatusCode::CREATED, Json(json!({ "session_id": id }))).into_response()
}

/// GET /api/session/{session_id}
pub(super) async fn session_detail(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let Some((id, session)) = state.registry.get_str(&session_id) else {
        return not_found();
    };
    let session = session.lock().await;
    view(id, &session)
}

/// DELETE /api/session/{session_id}
pub(super) async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    match session_id.parse::<SessionId>() {
        Ok(id) if state.registry.remove(&id) => StatusCode::NO_CONTENT.into_response(),
        _ => not_found(),
    }
}

/// POST /api/session/{session_id}/initialize
pub(super) async fn initialize(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<InitializeRequest>,
) -> Response {
    let Some((id, session)) = state.registry.get_str(&session_id) else {
        return not_found();
    };
    let mut session = session.lock().await;
    match session.initialize(req.module.as_deref(), req.experience.as_deref()) {
        Ok(()) => view(id, &session),
        Err(e) => {
            debug!(session_id = %id, error = %e, "initialize rejected");
            session_error(&e)
        }
    }
}

/// POST /api/session/{session_id}/reset
pub(super) async fn reset(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let Some((id, session)) = state.registry.get_str(&session_id) else {
        return not_found();
    };
    let mut session = session.lock().await;
    session.reset();
    view(id, &session)
}

/// POST /api/session/{session_id}/message
///
/// One full turn. Responds with the reply text and the updated session.
pub(super) async fn message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(req): Json<MessageRequest>,
) -> Response {
    let Some((id, session)) = state.registry.get_str(&session_id) else {
        return not_found();
    };
    let mut session = session.lock().await;

    let reply = match session.submit(&state.provider, &req.message).await {
        Ok(turn) => turn.text().to_string(),
        Err(e) => {
            debug!(session_id = %id, error = %e, "message rejected");
            return session_error(&e);
        }
    };

    debug!(session_id = %id, turns = session.history().len(), "turn complete");
    Json(json!({
        "reply": reply,
        "session": SessionView::new(id, &session),
    }))
    .into_response()
}
