mod backend;
mod music;
#[cfg(feature = "rodio")]
mod rodio_backend;
mod sound;

pub use backend::{AudioBackend, AudioError, SilentAudio, VoiceId, VoiceRequest};
pub use music::{MusicPlayer, TrackState, MAX_PITCH, MIN_PITCH};
#[cfg(feature = "rodio")]
pub use rodio_backend::RodioAudio;
pub use sound::SoundBoard;

/// Rodio output when a device opens, otherwise the silent backend.
#[cfg(feature = "rodio")]
pub fn default_backend() -> Box<dyn AudioBackend> {
    match RodioAudio::new() {
        Ok(audio) => Box::new(audio),
        Err(error) => {
            tracing::warn!(error = %error, "audio_output_unavailable");
            Box::new(SilentAudio::new())
        }
    }
}

#[cfg(not(feature = "rodio"))]
pub fn default_backend() -> Box<dyn AudioBackend> {
    Box::new(SilentAudio::new())
}
