//! JSON API tests: drive the router in-process with the dummy provider.

use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::Response;
use serde_json::{Value, json};
use tower::ServiceExt;

use mentor_chat::comms::{AppState, build_router};
use mentor_chat::config::Config;
use mentor_chat::llm::providers;

fn offline_app() -> axum::Router {
    let config = Config::offline_default();
    let provider = providers::build(&config.llm, None).unwrap();
    build_router(AppState::new(provider, config.mentor))
}

/// OpenAI-compatible provider aimed at a closed local port.
fn unreachable_app() -> axum::Router {
    let mut config = Config::offline_default();
    config.llm.provider = "openai".into();
    config.llm.openai.api_base_url = "http://127.0.0.1:9/v1/chat/completions".into();
    config.llm.openai.timeout_seconds = 2;
    let provider = providers::build(&config.llm, Some("test-key".into())).unwrap();
    build_router(AppState::new(provider, config.mentor))
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> Response {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn new_session(app: &axum::Router) -> String {
    let response = send(app, "POST", "/api/sessions", None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await["session_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_reports_provider_and_session_count() {
    let app = offline_app();
    new_session(&app).await;

    let response = send(&app, "GET", "/api/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let v = json_body(response).await;
    assert_eq!(v["status"], "ok");
    assert_eq!(v["provider"], "dummy");
    assert_eq!(v["model"], "none");
    assert_eq!(v["sessions"], 1);
}

#[tokio::test]
async fn options_list_both_selectors() {
    let app = offline_app();
    let v = json_body(send(&app, "GET", "/api/options", None).await).await;
    assert_eq!(v["placeholder"], "-- Select --");
    assert_eq!(v["modules"].as_array().unwrap().len(), 8);
    assert_eq!(v["modules"][1], "SQL");
    assert_eq!(v["experience_levels"], json!(["1", "2", "3", "4", "5", "7", "9", "11", "14", "15"]));
}

#[tokio::test]
async fn new_session_starts_unconfigured() {
    let app = offline_app();
    let id = new_session(&app).await;

    let response = send(&app, "GET", &format!("/api/session/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let v = json_body(response).await;
    assert_eq!(v["session_id"], id.as_str());
    assert_eq!(v["started"], false);
    assert!(v["module"].is_null());
    assert!(v["experience"].is_null());
    assert_eq!(v["history"], json!([]));
}

#[tokio::test]
async fn placeholder_selection_is_rejected_without_changes() {
    let app = offline_app();
    let id = new_session(&app).await;

    let response = send(
        &app,
        "POST",
        &format!("/api/session/{id}/initialize"),
        Some(json!({ "module": "-- Select --", "experience": "3" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let v = json_body(response).await;
    assert_eq!(v["error"], "incomplete_selection");
    assert_eq!(v["message"], "Please select all fields.");
    assert_eq!(v["fields"], json!(["module"]));

    let v = json_body(send(&app, "GET", &format!("/api/session/{id}"), None).await).await;
    assert_eq!(v["started"], false);
    assert!(v["module"].is_null());
}

#[tokio::test]
async fn missing_fields_are_all_reported() {
    let app = offline_app();
    let id = new_session(&app).await;

    let response = send(&app, "POST", &format!("/api/session/{id}/initialize"), Some(json!({}))).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["fields"], json!(["module", "experience"]));
}

#[tokio::test]
async fn unknown_choice_is_rejected() {
    let app = offline_app();
    let id = new_session(&app).await;

    let response = send(
        &app,
        "POST",
        &format!("/api/session/{id}/initialize"),
        Some(json!({ "module": "Cobol", "experience": "3" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let v = json_body(response).await;
    assert_eq!(v["error"], "unknown_choice");
    assert_eq!(v["fields"], json!(["module"]));
}

#[tokio::test]
async fn full_turn_appends_user_then_assistant() {
    let app = offline_app();
    let id = new_session(&app).await;

    let response = send(
        &app,
        "POST",
        &format!("/api/session/{id}/initialize"),
        Some(json!({ "module": "SQL", "experience": "3" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let v = json_body(response).await;
    assert_eq!(v["started"], true);
    assert_eq!(v["module"], "SQL");
    assert_eq!(v["experience"], "3");

    let response = send(
        &app,
        "POST",
        &format!("/api/session/{id}/message"),
        Some(json!({ "message": "What is a primary key?" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let v = json_body(response).await;
    assert_eq!(v["reply"], "[echo] What is a primary key?");

    let history = v["session"]["history"].as_array().unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0]["role"], "user");
    assert_eq!(history[0]["text"], "What is a primary key?");
    assert_eq!(history[1]["role"], "assistant");
    assert_eq!(history[1]["text"], "[echo] What is a primary key?");
}

#[tokio::test]
async fn second_initialize_conflicts() {
    let app = offline_app();
    let id = new_session(&app).await;
    let uri = format!("/api/session/{id}/initialize");

    send(&app, "POST", &uri, Some(json!({ "module": "SQL", "experience": "3" }))).await;
    let response = send(&app, "POST", &uri, Some(json!({ "module": "EDA", "experience": "1" }))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"], "already_started");

    let v = json_body(send(&app, "GET", &format!("/api/session/{id}"), None).await).await;
    assert_eq!(v["module"], "SQL");
}

#[tokio::test]
async fn message_before_initialize_conflicts() {
    let app = offline_app();
    let id = new_session(&app).await;

    let response = send(
        &app,
        "POST",
        &format!("/api/session/{id}/message"),
        Some(json!({ "message": "hello" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["error"], "not_started");
}

#[tokio::test]
async fn blank_message_is_rejected() {
    let app = offline_app();
    let id = new_session(&app).await;
    send(
        &app,
        "POST",
        &format!("/api/session/{id}/initialize"),
        Some(json!({ "module": "Python", "experience": "1" })),
    )
    .await;

    let response = send(
        &app,
        "POST",
        &format!("/api/session/{id}/message"),
        Some(json!({ "message": "   " })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(json_body(response).await["error"], "empty_message");
}

#[tokio::test]
async fn reset_clears_settings_and_history() {
    let app = offline_app();
    let id = new_session(&app).await;
    send(
        &app,
        "POST",
        &format!("/api/session/{id}/initialize"),
        Some(json!({ "module": "Agentic AI", "experience": "15" })),
    )
    .await;
    send(&app, "POST", &format!("/api/session/{id}/message"), Some(json!({ "message": "hi" }))).await;

    let response = send(&app, "POST", &format!("/api/session/{id}/reset"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let v = json_body(response).await;
    assert_eq!(v["started"], false);
    assert!(v["module"].is_null());
    assert!(v["experience"].is_null());
    assert_eq!(v["history"], json!([]));
    assert_eq!(v["events"].as_array().unwrap().last().unwrap()["event"], "reset");
}

#[tokio::test]
async fn provider_failure_keeps_user_turn() {
    let app = unreachable_app();
    let id = new_session(&app).await;
    send(
        &app,
        "POST",
        &format!("/api/session/{id}/initialize"),
        Some(json!({ "module": "SQL", "experience": "3" })),
    )
    .await;

    let response = send(
        &app,
        "POST",
        &format!("/api/session/{id}/message"),
        Some(json!({ "message": "What is a join?" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(json_body(response).await["error"], "provider_error");

    let v = json_body(send(&app, "GET", &format!("/api/session/{id}"), None).await).await;
    let history = v["history"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["role"], "user");
}

#[tokio::test]
async fn delete_ends_session() {
    let app = offline_app();
    let id = new_session(&app).await;

    let response = send(&app, "DELETE", &format!("/api/session/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "GET", &format!("/api/session/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&app, "DELETE", &format!("/api/session/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = offline_app();
    for uri in [
        "/api/session/not-a-uuid",
        "/api/session/00000000-0000-4000-8000-000000000000",
    ] {
        let response = send(&app, "GET", uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await["error"], "not_found");
    }

    let response = send(
        &app,
        "POST",
        "/api/session/00000000-0000-4000-8000-000000000000/message",
        Some(json!({ "message": "hi" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn swept_session_is_not_found() {
    let config = Config::offline_default();
    let provider = providers::build(&config.llm, None).unwrap();
    let state = AppState::new(provider, config.mentor);
    let app = build_router(state.clone());
    let id = new_session(&app).await;

    assert_eq!(state.registry.sweep_idle(Duration::ZERO), 1);
    let response = send(&app, "GET", &format!("/api/session/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
