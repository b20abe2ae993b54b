use httpmock::Method::POST;
use httpmock::MockServer;
use persona_chat::backends::elevenlabs::ElevenLabs;
use persona_chat::backends::fish_audio::FishAudio;
use persona_chat::backends::openai::OpenAI;
use persona_chat::chat::{ChatMessage, ChatProvider};
use persona_chat::tts::TextToSpeechProvider;
use persona_chat::{assemble, ChatError, History, Persona, Turn};
use serde_json::json;

fn conversation() -> Vec<ChatMessage> {
    let history: History = [Turn::new("hi", "hello")].into_iter().collect();
    assemble(&Persona::new("P").unwrap(), &history, "how are you")
}

#[tokio::test]
async fn openai_sends_the_assembled_conversation() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .header("authorization", "Bearer sk-test")
                .json_body(json!({
                    "model": "gpt-4o-mini",
                    "messages": [
                        {"role": "system", "content": "P"},
                        {"role": "user", "content": "hi"},
                        {"role": "assistant", "content": "hello"},
                        {"role": "user", "content": "how are you"}
                    ],
                    "stream": false
                }));
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "choices": [{"message": {"role": "assistant", "content": "Stuck in a poster, Morty."}}],
                    "usage": {"prompt_tokens": 20, "completion_tokens": 7, "total_tokens": 27}
                }));
        })
        .await;

    let llm = OpenAI::new("sk-test", Some(server.url("/v1")), None, Some(5)).unwrap();
    let response = llm.chat(&conversation()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.text().as_deref(), Some("Stuck in a poster, Morty."));
    assert_eq!(response.usage().unwrap().total_tokens, 27);
}

#[tokio::test]
async fn openai_error_status_is_reported_with_the_body() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(401)
                .body(r#"{"error": {"message": "Incorrect API key provided"}}"#);
        })
        .await;

    let llm = OpenAI::new("sk-wrong", Some(server.url("/v1/")), None, None).unwrap();
    let err = llm.chat(&conversation()).await.unwrap_err();

    match err {
        ChatError::ResponseFormatError {
            message,
            raw_response,
        } => {
            assert!(message.contains("401"));
            assert!(raw_response.contains("Incorrect API key"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn openai_garbage_body_is_a_format_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/chat/completions");
            then.status(200).body("<html>proxy error</html>");
        })
        .await;

    let llm = OpenAI::new("sk-test", Some(server.url("/v1/")), None, None).unwrap();
    let err = llm.chat(&conversation()).await.unwrap_err();

    assert!(matches!(
        err,
        ChatError::ResponseFormatError { ref raw_response, .. } if raw_response.contains("proxy error")
    ));
}

#[tokio::test]
async fn openai_sampling_settings_are_sent_when_set() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/chat/completions")
                .json_body_partial(r#"{"temperature": 0.5, "max_tokens": 150}"#);
            then.status(200).json_body(json!({
                "choices": [{"message": {"role": "assistant", "content": "Fine."}}]
            }));
        })
        .await;

    let llm = OpenAI::new("sk-test", Some(server.url("/v1")), None, None)
        .unwrap()
        .with_temperature(0.5)
        .with_max_tokens(150);
    let response = llm.chat(&conversation()).await.unwrap();

    mock.assert_async().await;
    assert_eq!(response.text().as_deref(), Some("Fine."));
}

#[tokio::test]
async fn fish_audio_streams_mp3_for_the_reference_voice() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/tts")
                .header("authorization", "Bearer fish-key")
                .json_body(json!({
                    "text": "Wubba lubba dub dub",
                    "reference_id": "rick-voice",
                    "format": "mp3",
                    "latency": "balanced"
                }));
            then.status(200)
                .header("content-type", "audio/mpeg")
                .body("ID3-fake-mp3");
        })
        .await;

    let tts = FishAudio::new("fish-key", "rick-voice", Some(server.base_url()), None).unwrap();
    let audio = tts.speech("Wubba lubba dub dub").await.unwrap();

    mock.assert_async().await;
    assert_eq!(audio, b"ID3-fake-mp3".to_vec());
    assert_eq!(tts.voice(), "rick-voice");
}

#[tokio::test]
async fn fish_audio_rejection_is_an_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/tts");
            then.status(402).body("insufficient credit");
        })
        .await;

    let tts = FishAudio::new("fish-key", "rick-voice", Some(server.base_url()), None).unwrap();
    let err = tts.speech("hi").await.unwrap_err();

    assert!(matches!(err, ChatError::ResponseFormatError { .. }));
}

#[tokio::test]
async fn elevenlabs_posts_to_the_voice_endpoint() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/text-to-speech/JBFqnCBsd6RMkjVDRZzb")
                .query_param("output_format", "mp3_44100_128")
                .header("xi-api-key", "xi-key")
                .json_body(json!({
                    "text": "Hello",
                    "model_id": "eleven_multilingual_v2"
                }));
            then.status(200).body("ID3-eleven");
        })
        .await;

    let tts = ElevenLabs::new(
        "xi-key",
        "JBFqnCBsd6RMkjVDRZzb",
        None,
        Some(server.url("/v1/")),
        None,
    )
    .unwrap();
    let audio = tts.speech("Hello").await.unwrap();

    mock.assert_async().await;
    assert_eq!(audio, b"ID3-eleven".to_vec());
}

#[tokio::test]
async fn missing_speech_key_fails_without_a_request() {
    let tts = FishAudio::new("", "rick-voice", Some("http://127.0.0.1:9".into()), None).unwrap();
    assert!(matches!(
        tts.speech("hi").await,
        Err(ChatError::AuthError(_))
    ));
}
