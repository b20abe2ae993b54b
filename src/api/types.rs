use serde::{Deserialize, Serialize};

/// Request payload for `POST /api/chat`
#[derive(Deserialize, Serialize)]
pub struct ChatRequest {
    /// The new user input, forwarded verbatim
    pub message: String,
}

/// Response payload for `POST /api/chat`
#[derive(Deserialize, Serialize)]
pub struct ChatReply {
    /// What the persona answered
    pub reply: String,
    /// Number of completed turns after this one was recorded
    pub turns: usize,
}

/// Request payload for `POST /api/tts`
#[derive(Deserialize, Serialize)]
pub struct SpeechRequest {
    /// Text to synthesize, normally the last reply
    pub text: String,
}

/// Body of every non-2xx response
#[derive(Deserialize, Serialize)]
pub struct ErrorBody {
    pub error: String,
}
