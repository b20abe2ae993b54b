#![cfg(feature = "api")]

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{GatedProvider, ScriptedProvider, StubVoice};
use persona_chat::api::{ChatReply, ErrorBody, Server};
use persona_chat::chat::ChatProvider;
use persona_chat::{ChatError, Persona, Session};
use serde_json::json;
use tower::ServiceExt;

fn router(provider: Arc<dyn ChatProvider>) -> Router {
    Server::new(Session::new(Persona::new("P").unwrap(), provider)).router()
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn index_serves_the_chat_page() {
    let app = router(Arc::new(ScriptedProvider::default()));
    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let html = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(html.contains("/api/chat"));
}

#[tokio::test]
async fn chat_records_turns_and_history_lists_them() {
    let provider = Arc::new(ScriptedProvider::default().reply("hello").reply("meh"));
    let app = router(provider.clone());

    let response = app
        .clone()
        .oneshot(post_json("/api/chat", json!({"message": "hi"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let reply: ChatReply = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(reply.reply, "hello");
    assert_eq!(reply.turns, 1);

    let response = app
        .clone()
        .oneshot(post_json("/api/chat", json!({"message": "how are you"})))
        .await
        .unwrap();
    let reply: ChatReply = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(reply.turns, 2);
    assert_eq!(provider.requests()[1].len(), 4);

    let response = app
        .oneshot(Request::get("/api/history").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let turns: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(
        turns,
        json!([
            {"user": "hi", "assistant": "hello"},
            {"user": "how are you", "assistant": "meh"}
        ])
    );
}

#[tokio::test]
async fn provider_failure_is_a_bad_gateway_and_keeps_history() {
    let provider = Arc::new(
        ScriptedProvider::default()
            .reply("hello")
            .fail(ChatError::AuthError("Missing OpenAI API key".into())),
    );
    let app = router(provider);

    app.clone()
        .oneshot(post_json("/api/chat", json!({"message": "hi"})))
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(post_json("/api/chat", json!({"message": "again"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body: ErrorBody = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(body.error.contains("API key"));

    let response = app
        .oneshot(Request::get("/api/history").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let turns: Vec<serde_json::Value> =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(turns.len(), 1);
}

#[tokio::test]
async fn concurrent_submission_is_rejected() {
    let provider = Arc::new(GatedProvider::default());
    let app = router(provider.clone());

    let first = tokio::spawn(
        app.clone()
            .oneshot(post_json("/api/chat", json!({"message": "first"}))),
    );
    provider.entered.notified().await;

    let second = app
        .clone()
        .oneshot(post_json("/api/chat", json!({"message": "second"})))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);

    provider.release.notify_one();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first.status(), StatusCode::OK);
}

#[tokio::test]
async fn clear_discards_the_conversation() {
    let provider = Arc::new(ScriptedProvider::default().reply("hello").reply("who?"));
    let app = router(provider.clone());

    app.clone()
        .oneshot(post_json("/api/chat", json!({"message": "hi"})))
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(Request::post("/api/clear").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    app.oneshot(post_json("/api/chat", json!({"message": "remember me?"})))
        .await
        .unwrap();
    assert_eq!(provider.requests()[1].len(), 2);
}

#[tokio::test]
async fn tts_returns_mp3_when_a_voice_is_configured() {
    let session = Session::new(
        Persona::new("P").unwrap(),
        Arc::new(ScriptedProvider::default()),
    );
    let app = Server::new(session)
        .with_voice(Arc::new(StubVoice { fail: false }))
        .router();

    let response = app
        .oneshot(post_json("/api/tts", json!({"text": "hello"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    assert_eq!(body_bytes(response).await, b"ID3mp3".to_vec());
}

#[tokio::test]
async fn tts_failures_do_not_touch_the_conversation() {
    let provider = Arc::new(ScriptedProvider::default().reply("hello"));
    let session = Session::new(Persona::new("P").unwrap(), provider);
    let app = Server::new(session)
        .with_voice(Arc::new(StubVoice { fail: true }))
        .router();

    app.clone()
        .oneshot(post_json("/api/chat", json!({"message": "hi"})))
        .await
        .unwrap();
    let response = app
        .clone()
        .oneshot(post_json("/api/tts", json!({"text": "hello"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let response = app
        .oneshot(Request::get("/api/history").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let turns: Vec<serde_json::Value> =
        serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert_eq!(turns.len(), 1);
}

#[tokio::test]
async fn tts_without_voice_is_not_found() {
    let app = router(Arc::new(ScriptedProvider::default()));
    let response = app
        .oneshot(post_json("/api/tts", json!({"text": "hello"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
