use std::collections::HashMap;

use thiserror::Error;

use crate::content::{AudioClip, LoopRegion};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AudioError {
    #[error("unknown music track `{0}`")]
    UnknownTrack(String),
    #[error("unknown sound `{0}`")]
    UnknownSound(String),
    #[error("audio output unavailable: {0}")]
    Output(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VoiceId(pub u64);

/// Everything needed to start one playing voice.
#[derive(Debug, Clone, Copy)]
pub struct VoiceRequest<'a> {
    pub clip: &'a AudioClip,
    pub start_seconds: f64,
    pub looping: Option<LoopRegion>,
    pub gain: f32,
    pub pitch: f32,
}

/// Output device seam. Playback logic (fades, track states) lives in the
/// engine; backends only start, steer and report on voices.
pub trait AudioBackend {
    fn start(&mut self, request: VoiceRequest<'_>) -> Result<VoiceId, AudioError>;
    fn stop(&mut self, voice: VoiceId);
    /// Halts the voice and returns its playback position in seconds.
    fn pause(&mut self, voice: VoiceId) -> f64;
    fn set_gain(&mut self, voice: VoiceId, gain: f32);
    fn set_pitch(&mut self, voice: VoiceId, pitch: f32);
    /// True once a non-looping voice reached its end, or for unknown voices.
    fn is_finished(&self, voice: VoiceId) -> bool;
    fn position(&self, voice: VoiceId) -> f64;
    /// Silences all output without losing voice state.
    fn suspend(&mut self);
    fn resume(&mut self);
    /// Called once per update tick with the fixed tick length.
    fn advance(&mut self, _seconds: f64) {}
}

#[derive(Debug, Clone, PartialEq)]
struct SilentVoice {
    position: f64,
    duration: f64,
    looping: Option<LoopRegion>,
    gain: f32,
    pitch: f32,
    finished: bool,
}

/// Backend without an output device. Voice positions advance with the tick
/// clock, so track ends and loops behave as they would on a device.
#[derive(Debug, Default)]
pub struct SilentAudio {
    voices: HashMap<VoiceId, SilentVoice>,
    next_voice: u64,
    suspended: bool,
}

impl SilentAudio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn gain(&self, voice: VoiceId) -> Option<f32> {
        self.voices.get(&voice).map(|voice| voice.gain)
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }
}

impl AudioBackend for SilentAudio {
    fn start(&mut self, request: VoiceRequest<'_>) -> Result<VoiceId, AudioError> {
        let id = VoiceId(self.next_voice);
        self.next_voice += 1;
        self.voices.insert(
            id,
            SilentVoice {
                position: request.start_seconds.max(0.0),
                duration: request.clip.duration_seconds(),
                looping: request.looping,
                gain: request.gain,
                pitch: request.pitch,
                finished: false,
            },
        );
        Ok(id)
    }

    fn stop(&mut self, voice: VoiceId) {
        self.voices.remove(&voice);
    }

    fn pause(&mut self, voice: VoiceId) -> f64 {
        self.voices
            .remove(&voice)
            .map_or(0.0, |voice| voice.position)
    }

    fn set_gain(&mut self, voice: VoiceId, gain: f32) {
        if let Some(voice) = self.voices.get_mut(&voice) {
            voice.gain = gain;
        }
    }

    fn set_pitch(&mut self, voice: VoiceId, pitch: f32) {
        if let Some(voice) = self.voices.get_mut(&voice) {
            voice.pitch = pitch;
        }
    }

    fn is_finished(&self, voice: VoiceId) -> bool {
        self.voices.get(&voice).map_or(true, |voice| voice.finished)
    }

    fn position(&self, voice: VoiceId) -> f64 {
        self.voices.get(&voice).map_or(0.0, |voice| voice.position)
    }

    fn suspend(&mut self) {
        self.suspended = true;
    }

    fn resume(&mut self) {
        self.suspended = false;
    }

    fn advance(&mut self, seconds: f64) {
        if self.suspended {
            return;
        }
        for voice in self.voices.values_mut() {
            if voice.finished {
                continue;
            }
            voice.position += seconds * f64::from(voice.pitch);
            match voice.looping {
                Some(region) => voice.position = region.wrap(voice.position),
                None if voice.position >= voice.duration => {
                    voice.position = voice.duration;
                    voice.finished = true;
                }
                None => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(clip: &AudioClip, looping: Option<LoopRegion>) -> VoiceRequest<'_> {
        VoiceRequest {
            clip,
            start_seconds: 0.0,
            looping,
            gain: 1.0,
            pitch: 1.0,
        }
    }

    #[test]
    fn silent_voice_finishes_at_clip_end() {
        let clip = AudioClip::silent(1.0, 1, 100);
        let mut audio = SilentAudio::new();
        let voice = audio.start(request(&clip, None)).expect("start");
        audio.advance(0.6);
        assert!(!audio.is_finished(voice));
        audio.advance(0.6);
        assert!(audio.is_finished(voice));
        assert_eq!(audio.position(voice), 1.0);
    }

    #[test]
    fn silent_voice_wraps_inside_loop_region() {
        let clip = AudioClip::silent(2.0, 1, 100);
        let region = LoopRegion {
            start_seconds: 0.5,
            end_seconds: 1.5,
        };
        let mut audio = SilentAudio::new();
        let voice = audio.start(request(&clip, Some(region))).expect("start");
        audio.advance(1.75);
        assert!(!audio.is_finished(voice));
        assert!((audio.position(voice) - 0.75).abs() < 1e-9);
    }

    #[test]
    fn suspended_output_freezes_positions() {
        let clip = AudioClip::silent(1.0, 1, 100);
        let mut audio = SilentAudio::new();
        let voice = audio.start(request(&clip, None)).expect("start");
        audio.suspend();
        audio.advance(0.5);
        assert_eq!(audio.position(voice), 0.0);
        audio.resume();
        audio.advance(0.5);
        assert_eq!(audio.position(voice), 0.5);
    }

    #[test]
    fn pause_reports_position_and_releases_voice() {
        let clip = AudioClip::silent(1.0, 1, 100);
        let mut audio = SilentAudio::new();
        let voice = audio.start(request(&clip, None)).expect("start");
        audio.advance(0.25);
        assert_eq!(audio.pause(voice), 0.25);
        assert_eq!(audio.voice_count(), 0);
        assert!(audio.is_finished(voice));
    }
}
