//! Browser chat UI
//!
//! Serves a single-page chat client and the JSON endpoints it talks to.
//! The conversation lives on the server, in one [`Session`] shared by every
//! browser tab.

mod handlers;
mod types;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::error::ChatError;
use crate::session::Session;
use crate::tts::TextToSpeechProvider;

pub use types::{ChatReply, ChatRequest, ErrorBody, SpeechRequest};

/// Web front end for one persona session
pub struct Server {
    /// The conversation every request operates on
    session: Session,
    /// Speech provider, when replies should be voiced
    voice: Option<Arc<dyn TextToSpeechProvider>>,
}

/// Internal server state shared between request handlers
#[derive(Clone)]
struct ServerState {
    session: Arc<Mutex<Session>>,
    voice: Option<Arc<dyn TextToSpeechProvider>>,
}

impl Server {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            voice: None,
        }
    }

    /// Enables `POST /api/tts` with the given speech provider
    pub fn with_voice(mut self, voice: Arc<dyn TextToSpeechProvider>) -> Self {
        self.voice = Some(voice);
        self
    }

    /// Builds the router without binding a socket
    pub fn router(self) -> Router {
        Router::new()
            .route("/", get(handlers::handle_index))
            .route("/api/chat", post(handlers::handle_chat))
            .route("/api/history", get(handlers::handle_history))
            .route("/api/clear", post(handlers::handle_clear))
            .route("/api/tts", post(handlers::handle_tts))
            .layer(CorsLayer::permissive())
            .with_state(ServerState {
                session: Arc::new(Mutex::new(self.session)),
                voice: self.voice,
            })
    }

    /// Starts the server and listens for requests on the specified address
    ///
    /// # Arguments
    /// * `addr` - Address to bind to (e.g. "127.0.0.1:3000")
    pub async fn run(self, addr: &str) -> Result<(), ChatError> {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ChatError::ConfigError(format!("cannot bind {addr}: {e}")))?;
        log::info!("chat UI listening on http://{addr}");

        axum::serve(listener, app)
            .await
            .map_err(|e| ChatError::ProviderError(e.to_string()))?;

        Ok(())
    }
}
