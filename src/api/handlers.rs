use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};

use super::types::{ChatReply, ChatRequest, ErrorBody, SpeechRequest};
use super::ServerState;
use crate::chat::Turn;
use crate::error::ChatError;

const INDEX_HTML: &str = include_str!("index.html");

type ApiError = (StatusCode, Json<ErrorBody>);

fn api_error(status: StatusCode, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: error.to_string(),
        }),
    )
}

fn busy() -> ApiError {
    api_error(StatusCode::CONFLICT, ChatError::SessionBusy)
}

/// Serves the chat page
pub(super) async fn handle_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// Handles one user submission
///
/// Only one submission may be in flight: while the session is awaiting a
/// reply, further submissions are rejected with `409 Conflict` instead of
/// being queued. A provider failure is reported as `502 Bad Gateway` and
/// leaves the conversation untouched.
pub(super) async fn handle_chat(
    State(state): State<ServerState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    let mut session = state.session.try_lock().map_err(|_| busy())?;

    match session.submit(&req.message).await {
        Ok(reply) => Ok(Json(ChatReply {
            reply,
            turns: session.history().len(),
        })),
        Err(e) => {
            log::warn!("chat turn failed: {e}");
            Err(api_error(StatusCode::BAD_GATEWAY, e))
        }
    }
}

/// Returns the completed turns of the current conversation
pub(super) async fn handle_history(
    State(state): State<ServerState>,
) -> Result<Json<Vec<Turn>>, ApiError> {
    let session = state.session.try_lock().map_err(|_| busy())?;
    Ok(Json(session.history().turns().to_vec()))
}

/// Discards the current conversation
pub(super) async fn handle_clear(State(state): State<ServerState>) -> Result<StatusCode, ApiError> {
    let mut session = state.session.try_lock().map_err(|_| busy())?;
    session.reset();
    Ok(StatusCode::NO_CONTENT)
}

/// Synthesizes speech for a reply and returns it as MP3
///
/// Independent of the conversation: a failure here never affects history.
pub(super) async fn handle_tts(
    State(state): State<ServerState>,
    Json(req): Json<SpeechRequest>,
) -> Result<Response, ApiError> {
    let voice = state
        .voice
        .as_ref()
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "voice output is not configured"))?;

    let audio = voice.speech(&req.text).await.map_err(|e| {
        log::warn!("speech synthesis failed: {e}");
        api_error(StatusCode::BAD_GATEWAY, e)
    })?;

    Ok(([(header::CONTENT_TYPE, "audio/mpeg")], audio).into_response())
}
