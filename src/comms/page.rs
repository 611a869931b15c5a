//! Handlers for the HTML page and its form posts.
//!
//! Successful posts answer `303 See Other` back to `/s/{id}`; the
//! browser then re-fetches and the whole page is redrawn from session
//! state. Unknown session ids are sent to `/` for a fresh session.

use axum::{
    Form,
    extract::{Path, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tracing::debug;

use super::AppState;
use crate::render::{self, Notice, PageContext};
use crate::session::{Session, SessionError, SessionId};

#[derive(Deserialize)]
pub(super) struct InitializeForm {
    module: Option<String>,
    experience: Option<String>,
}

#[derive(Deserialize)]
pub(super) struct MessageForm {
    #[serde(default)]
    message: String,
}

fn page_url(id: SessionId) -> String {
    format!("/s/{id}")
}

fn html_page(
    state: &AppState,
    id: SessionId,
    session: &Session,
    notice: Option<Notice>,
    selection: (Option<&str>, Option<&str>),
) -> Html<String> {
    Html(render::render_page(&PageContext {
        title: &state.mentor.page_title,
        session_id: id,
        session,
        notice,
        selected_module: selection.0,
        selected_experience: selection.1,
    }))
}

/// GET /
pub(super) async fn root(State(state): State<AppState>) -> Response {
    let id = state.registry.create();
    Redirect::to(&page_url(id)).into_response()
}

/// GET /s/{session_id}
pub(super) async fn show(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let Some((id, session)) = state.registry.get_str(&session_id) else {
        return Redirect::to("/").into_response();
    };
    let session = session.lock().await;
    html_page(&state, id, &session, None, (None, None)).into_response()
}

/// POST /s/{session_id}/initialize
pub(super) async fn initialize(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Form(form): Form<InitializeForm>,
) -> Response {
    let Some((id, session)) = state.registry.get_str(&session_id) else {
        return Redirect::to("/").into_response();
    };
    let mut session = session.lock().await;

    match session.initialize(form.module.as_deref(), form.experience.as_deref()) {
        // selectors are hidden once started; a stale form just reloads
        Ok(()) | Err(SessionError::AlreadyStarted) => Redirect::to(&page_url(id)).into_response(),
        Err(e) => {
            debug!(session_id = %id, error = %e, "initialize rejected");
            let status = super::status_for(&e);
            let page = html_page(
                &state,
                id,
                &session,
                Some(Notice::Validation(e.to_string())),
                (form.module.as_deref(), form.experience.as_deref()),
            );
            (status, page).into_response()
        }
    }
}

/// POST /s/{session_id}/reset
pub(super) async fn reset(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Response {
    let Some((id, session)) = state.registry.get_str(&session_id) else {
        return Redirect::to("/").into_response();
    };
    session.lock().await.reset();
    Redirect::to(&page_url(id)).into_response()
}

/// POST /s/{session_id}/message
///
/// Empty input is ignored, like the chat box ignoring an empty submit.
/// Any other rejection (model failure, a post before initialize, a turn
/// still pending) re-renders the page with the error above the transcript.
pub(super) async fn message(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Form(form): Form<MessageForm>,
) -> Response {
    let Some((id, session)) = state.registry.get_str(&session_id) else {
        return Redirect::to("/").into_response();
    };
    let mut session = session.lock().await;

    let failure = match session.submit(&state.provider, &form.message).await {
        Ok(_) => None,
        Err(SessionError::EmptyMessage) => {
            debug!(session_id = %id, "empty message ignored");
            None
        }
        Err(e) => Some(e),
    };

    match failure {
        None => Redirect::to(&page_url(id)).into_response(),
        Some(e) => {
            let status = super::status_for(&e);
            let page = html_page(&state, id, &session, Some(Notice::Failure(e.to_string())), (None, None));
            (status, page).into_response()
        }
    }
}
