use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{Stream, StreamExt, TryStreamExt};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::ChatError;
use crate::playback::AudioPlayer;

/// Encoded audio delivered chunk by chunk as the provider produces it.
pub type AudioStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, ChatError>> + Send>>;

/// Trait implemented by all text to speech backends
///
/// Implementors turn reply text into encoded audio (MP3 for every backend
/// shipped with this crate).
#[async_trait]
pub trait TextToSpeechProvider: Send + Sync {
    /// Start synthesizing `text` and return the audio as a byte stream
    ///
    /// # Arguments
    ///
    /// * `text` - The text to speak with the configured voice
    async fn speech_stream(&self, text: &str) -> Result<AudioStream, ChatError>;

    /// Convert the given text into speech audio
    ///
    /// # Returns
    ///
    /// * `Result<Vec<u8>, ChatError>` - On success, the complete audio data.
    async fn speech(&self, text: &str) -> Result<Vec<u8>, ChatError> {
        let chunks: Vec<Vec<u8>> = self.speech_stream(text).await?.try_collect().await?;
        Ok(chunks.concat())
    }

    /// Voice or reference identifier used for synthesis
    fn voice(&self) -> &str;
}

/// Wraps a successful HTTP response body into an [`AudioStream`].
pub(crate) fn create_audio_stream(response: reqwest::Response) -> AudioStream {
    let stream = response.bytes_stream().map(|chunk| match chunk {
        Ok(bytes) => Ok(bytes.to_vec()),
        Err(e) => Err(ChatError::HttpError(e.to_string())),
    });
    Box::pin(stream)
}

/// Speaks replies: synthesizes, saves each one to its own MP3 file and hands
/// the file to an [`AudioPlayer`].
pub struct Speaker {
    provider: Arc<dyn TextToSpeechProvider>,
    player: Arc<dyn AudioPlayer>,
    output_dir: PathBuf,
    prefix: String,
}

impl Speaker {
    pub const DEFAULT_PREFIX: &'static str = "persona_output";

    pub fn new(
        provider: Arc<dyn TextToSpeechProvider>,
        player: Arc<dyn AudioPlayer>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            provider,
            player,
            output_dir: output_dir.into(),
            prefix: Self::DEFAULT_PREFIX.to_string(),
        }
    }

    /// File name prefix for saved artifacts.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Synthesizes `text` into a new artifact without playing it.
    pub async fn synthesize(&self, text: &str) -> Result<PathBuf, ChatError> {
        let mut stream = self.provider.speech_stream(text).await?;
        let (path, mut file) = create_artifact(&self.output_dir, &self.prefix).await?;

        let mut written = 0usize;
        let copied: Result<(), ChatError> = async {
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await?;
                written += chunk.len();
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = copied {
            drop(file);
            if let Err(rm) = tokio::fs::remove_file(&path).await {
                log::warn!("could not remove partial artifact {}: {rm}", path.display());
            }
            return Err(e);
        }

        log::info!("saved {written} bytes of speech to {}", path.display());
        Ok(path)
    }

    /// Synthesizes `text`, saves it and plays it back.
    pub async fn speak(&self, text: &str) -> Result<PathBuf, ChatError> {
        let path = self.synthesize(text).await?;
        self.player.play(&path).await?;
        Ok(path)
    }
}

/// Creates `<dir>/<prefix>_<unix millis>.mp3`, adding `_<n>` when a file of
/// that name already exists. Existing files are never opened for writing.
async fn create_artifact(dir: &Path, prefix: &str) -> Result<(PathBuf, File), ChatError> {
    let stamp = chrono::Utc::now().timestamp_millis();
    let mut attempt = 0u32;
    loop {
        let name = if attempt == 0 {
            format!("{prefix}_{stamp}.mp3")
        } else {
            format!("{prefix}_{stamp}_{attempt}.mp3")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path).await {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => {
                return Err(ChatError::AudioError(format!(
                    "cannot create {}: {e}",
                    path.display()
                )))
            }
        }
    }
}
