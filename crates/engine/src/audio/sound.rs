use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use super::backend::{AudioBackend, AudioError, VoiceId, VoiceRequest};
use super::music::{MAX_PITCH, MIN_PITCH};
use crate::content::{AssetDatabase, SoundDef};

/// Fire-and-forget sound effects sharing one master volume.
#[derive(Debug)]
pub struct SoundBoard {
    sounds: HashMap<String, Arc<SoundDef>>,
    voices: Vec<VoiceId>,
    master_volume: f32,
}

impl Default for SoundBoard {
    fn default() -> Self {
        Self {
            sounds: HashMap::new(),
            voices: Vec::new(),
            master_volume: 1.0,
        }
    }
}

impl SoundBoard {
    pub fn new(assets: &AssetDatabase) -> Self {
        Self {
            sounds: assets
                .sound_defs()
                .map(|def| (def.name.clone(), Arc::clone(def)))
                .collect(),
            ..Self::default()
        }
    }

    pub fn play(
        &mut self,
        backend: &mut dyn AudioBackend,
        name: &str,
        volume: f32,
        pitch: f32,
    ) -> Result<VoiceId, AudioError> {
        let def = self
            .sounds
            .get(name)
            .ok_or_else(|| AudioError::UnknownSound(name.to_string()))?;
        let voice = backend.start(VoiceRequest {
            clip: &def.clip,
            start_seconds: 0.0,
            looping: None,
            gain: volume.clamp(0.0, 1.0) * self.master_volume,
            pitch: pitch.clamp(MIN_PITCH, MAX_PITCH),
        })?;
        trace!(sound = name, "sound_started");
        self.voices.push(voice);
        Ok(voice)
    }

    pub fn stop_all(&mut self, backend: &mut dyn AudioBackend) {
        for voice in self.voices.drain(..) {
            backend.stop(voice);
        }
    }

    /// Forgets voices that finished on their own.
    pub fn prune(&mut self, backend: &mut dyn AudioBackend) {
        self.voices.retain(|voice| {
            let finished = backend.is_finished(*voice);
            if finished {
                backend.stop(*voice);
            }
            !finished
        });
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    /// Applies to sounds started afterwards.
    pub fn set_master_volume(&mut self, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
    }

    pub fn playing(&self) -> usize {
        self.voices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SilentAudio;
    use crate::content::AudioClip;

    fn board() -> SoundBoard {
        let mut assets = AssetDatabase::new();
        assets
            .register_sound(SoundDef {
                name: "click".to_string(),
                clip: AudioClip::silent(0.1, 1, 100),
            })
            .expect("click");
        SoundBoard::new(&assets)
    }

    #[test]
    fn play_applies_master_volume_and_clamps() {
        let mut audio = SilentAudio::new();
        let mut board = board();
        board.set_master_volume(0.5);
        let voice = board.play(&mut audio, "click", 2.0, 1.0).expect("play");
        assert_eq!(audio.gain(voice), Some(0.5));
        assert_eq!(
            board.play(&mut audio, "boom", 1.0, 1.0),
            Err(AudioError::UnknownSound("boom".to_string()))
        );
    }

    #[test]
    fn finished_voices_are_pruned_and_stop_all_clears() {
        let mut audio = SilentAudio::new();
        let mut board = board();
        board.play(&mut audio, "click", 1.0, 1.0).expect("play");
        board.play(&mut audio, "click", 1.0, 1.0).expect("play");
        assert_eq!(board.playing(), 2);
        audio.advance(0.2);
        board.prune(&mut audio);
        assert_eq!(board.playing(), 0);

        board.play(&mut audio, "click", 1.0, 1.0).expect("play");
        board.stop_all(&mut audio);
        assert_eq!(board.playing(), 0);
        assert_eq!(audio.voice_count(), 0);
    }
}
