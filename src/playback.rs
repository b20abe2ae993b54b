//! Local playback of synthesized speech.

use std::path::Path;

use async_trait::async_trait;

use crate::error::ChatError;

/// Something that can play a saved audio artifact.
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    /// Plays the file at `path`, returning once playback has finished.
    async fn play(&self, path: &Path) -> Result<(), ChatError>;
}

/// Player that only reports where the audio was saved.
///
/// Used when playback is turned off, when the crate is built without the
/// `playback` feature, and by the web UI where the browser plays the audio.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentPlayer;

#[async_trait]
impl AudioPlayer for SilentPlayer {
    async fn play(&self, path: &Path) -> Result<(), ChatError> {
        log::info!("playback disabled, audio left at {}", path.display());
        Ok(())
    }
}

/// Plays MP3 artifacts on the default output device through rodio.
#[cfg(feature = "playback")]
#[derive(Debug, Default, Clone, Copy)]
pub struct RodioPlayer;

#[cfg(feature = "playback")]
#[async_trait]
impl AudioPlayer for RodioPlayer {
    async fn play(&self, path: &Path) -> Result<(), ChatError> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || play_blocking(&path))
            .await
            .map_err(|e| ChatError::AudioError(format!("playback task failed: {e}")))?
    }
}

#[cfg(feature = "playback")]
fn play_blocking(path: &Path) -> Result<(), ChatError> {
    use rodio::{Decoder, OutputStream, Sink};
    use std::{fs::File, io::BufReader};

    let (_stream, stream_handle) = OutputStream::try_default()
        .map_err(|e| ChatError::AudioError(format!("no audio output device: {e}")))?;
    let sink = Sink::try_new(&stream_handle)
        .map_err(|e| ChatError::AudioError(e.to_string()))?;

    let file = File::open(path)?;
    let source = Decoder::new(BufReader::new(file))
        .map_err(|e| ChatError::AudioError(format!("cannot decode {}: {e}", path.display())))?;

    sink.append(source);
    sink.sleep_until_end();
    Ok(())
}

/// The best player this build supports: rodio when the `playback` feature is
/// enabled and `enabled` is true, the silent player otherwise.
pub fn default_player(enabled: bool) -> std::sync::Arc<dyn AudioPlayer> {
    #[cfg(feature = "playback")]
    {
        if enabled {
            return std::sync::Arc::new(RodioPlayer);
        }
    }
    #[cfg(not(feature = "playback"))]
    {
        if enabled {
            log::warn!("built without the `playback` feature, speech will only be saved");
        }
    }
    std::sync::Arc::new(SilentPlayer)
}
