//! Background music tracks with frame-counted volume fades.
//!
//! At most one track is current. Switching tracks fades the previous one out
//! while the new one fades in; deferred pause/stop actions run exactly once,
//! when their fade-out completes.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info};

use super::backend::{AudioBackend, AudioError, VoiceId, VoiceRequest};
use crate::content::{AssetDatabase, MusicDef};

pub const MIN_PITCH: f32 = 0.1;
pub const MAX_PITCH: f32 = 30.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    Stopped,
    Playing,
    Pausing,
    Paused,
    Stopping,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FadeDirection {
    In,
    Out,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct VolumeFade {
    direction: FadeDirection,
    frames_remaining: u32,
    step: f32,
}

#[derive(Debug)]
struct Track {
    def: Arc<MusicDef>,
    state: TrackState,
    volume: f32,
    fade: Option<VolumeFade>,
    voice: Option<VoiceId>,
    paused_at: f64,
}

impl Track {
    fn new(def: Arc<MusicDef>) -> Self {
        Self {
            def,
            state: TrackState::Stopped,
            volume: 0.0,
            fade: None,
            voice: None,
            paused_at: 0.0,
        }
    }

    fn fade_out(&mut self, frames: u32) {
        self.fade = Some(VolumeFade {
            direction: FadeDirection::Out,
            frames_remaining: frames,
            step: self.volume / frames as f32,
        });
    }

    fn fade_in(&mut self, frames: u32) {
        self.fade = Some(VolumeFade {
            direction: FadeDirection::In,
            frames_remaining: frames,
            step: (1.0 - self.volume) / frames as f32,
        });
    }
}

#[derive(Debug)]
pub struct MusicPlayer {
    tracks: HashMap<String, Track>,
    current: Option<String>,
    master_volume: f32,
    master_pitch: f32,
}

impl Default for MusicPlayer {
    fn default() -> Self {
        Self {
            tracks: HashMap::new(),
            current: None,
            master_volume: 1.0,
            master_pitch: 1.0,
        }
    }
}

impl MusicPlayer {
    /// One stopped track per music definition.
    pub fn new(assets: &AssetDatabase) -> Self {
        let tracks = assets
            .music_defs()
            .map(|def| (def.name.clone(), Track::new(Arc::clone(def))))
            .collect();
        Self {
            tracks,
            ..Self::default()
        }
    }

    pub fn current_track(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn track_state(&self, name: &str) -> Option<TrackState> {
        self.tracks.get(name).map(|track| track.state)
    }

    /// Fade-relative volume in `[0, 1]`, before the master volume.
    pub fn track_volume(&self, name: &str) -> Option<f32> {
        self.tracks.get(name).map(|track| track.volume)
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn master_pitch(&self) -> f32 {
        self.master_pitch
    }

    pub fn set_master_volume(&mut self, backend: &mut dyn AudioBackend, volume: f32) {
        self.master_volume = volume.clamp(0.0, 1.0);
        for track in self.tracks.values() {
            if let Some(voice) = track.voice {
                backend.set_gain(voice, track.volume * self.master_volume);
            }
        }
    }

    pub fn set_master_pitch(&mut self, backend: &mut dyn AudioBackend, pitch: f32) {
        self.master_pitch = pitch.clamp(MIN_PITCH, MAX_PITCH);
        for track in self.tracks.values() {
            if let Some(voice) = track.voice {
                backend.set_pitch(voice, self.master_pitch);
            }
        }
    }

    /// Starts `name` from the beginning. Replaying the current track restarts
    /// it; any other current track fades out over the same frame count.
    pub fn play(
        &mut self,
        backend: &mut dyn AudioBackend,
        name: &str,
        fade_frames: u32,
    ) -> Result<(), AudioError> {
        if !self.tracks.contains_key(name) {
            return Err(AudioError::UnknownTrack(name.to_string()));
        }
        if let Some(current) = self.current.clone() {
            if current == name {
                self.hard_stop(backend, &current);
            } else {
                self.begin_stop(backend, &current, fade_frames);
            }
        }
        self.start_voice(backend, name, fade_frames, 0.0)?;
        self.current = Some(name.to_string());
        info!(track = name, fade_frames, "music_started");
        Ok(())
    }

    pub fn stop(&mut self, backend: &mut dyn AudioBackend, fade_frames: u32) {
        if let Some(current) = self.current.clone() {
            self.begin_stop(backend, &current, fade_frames);
        }
    }

    /// Returns `false` when there is nothing playing to pause.
    pub fn pause(&mut self, backend: &mut dyn AudioBackend, fade_frames: u32) -> bool {
        let Some(current) = self.current.clone() else {
            return false;
        };
        let Some(track) = self.tracks.get_mut(&current) else {
            return false;
        };
        match track.state {
            TrackState::Playing if fade_frames > 0 => {
                track.state = TrackState::Pausing;
                track.fade_out(fade_frames);
                true
            }
            TrackState::Playing | TrackState::Pausing if fade_frames == 0 => {
                self.finish_pause(backend, &current);
                true
            }
            _ => false,
        }
    }

    /// Returns `Ok(false)` when the current track is neither paused nor
    /// pausing.
    pub fn resume(
        &mut self,
        backend: &mut dyn AudioBackend,
        fade_frames: u32,
    ) -> Result<bool, AudioError> {
        let Some(current) = self.current.clone() else {
            return Ok(false);
        };
        let Some(track) = self.tracks.get_mut(&current) else {
            return Ok(false);
        };
        match track.state {
            TrackState::Pausing => {
                track.state = TrackState::Playing;
                if fade_frames > 0 {
                    track.fade_in(fade_frames);
                } else {
                    track.fade = None;
                    track.volume = 1.0;
                    if let Some(voice) = track.voice {
                        backend.set_gain(voice, self.master_volume);
                    }
                }
                Ok(true)
            }
            TrackState::Paused => {
                let offset = track.paused_at;
                self.start_voice(backend, &current, fade_frames, offset)?;
                debug!(track = %current, offset, "music_resumed");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Hard-stops every track, used when a room swap drops audio.
    pub fn stop_all(&mut self, backend: &mut dyn AudioBackend) {
        let names: Vec<String> = self
            .tracks
            .iter()
            .filter(|(_, track)| track.state != TrackState::Stopped)
            .map(|(name, _)| name.clone())
            .collect();
        for name in names {
            self.hard_stop(backend, &name);
        }
        self.current = None;
    }

    /// Per-tick step: detect natural track ends, then advance fades.
    pub fn update(&mut self, backend: &mut dyn AudioBackend) {
        self.poll_track_ends(backend);

        let master_volume = self.master_volume;
        let mut completed_fade_outs = Vec::new();
        for (name, track) in &mut self.tracks {
            let Some(mut fade) = track.fade else {
                continue;
            };
            track.volume = match fade.direction {
                FadeDirection::In => (track.volume + fade.step).min(1.0),
                FadeDirection::Out => (track.volume - fade.step).max(0.0),
            };
            fade.frames_remaining = fade.frames_remaining.saturating_sub(1);
            let reached = match fade.direction {
                FadeDirection::In => track.volume >= 1.0,
                FadeDirection::Out => track.volume <= 0.0,
            };
            if reached || fade.frames_remaining == 0 {
                track.fade = None;
                track.volume = match fade.direction {
                    FadeDirection::In => 1.0,
                    FadeDirection::Out => 0.0,
                };
                if fade.direction == FadeDirection::Out {
                    completed_fade_outs.push(name.clone());
                }
            } else {
                track.fade = Some(fade);
            }
            if let Some(voice) = track.voice {
                backend.set_gain(voice, track.volume * master_volume);
            }
        }

        for name in completed_fade_outs {
            match self.track_state(&name) {
                Some(TrackState::Pausing) => self.finish_pause(backend, &name),
                Some(TrackState::Stopping) => self.hard_stop(backend, &name),
                _ => {}
            }
        }
    }

    fn poll_track_ends(&mut self, backend: &mut dyn AudioBackend) {
        let mut ended = Vec::new();
        for (name, track) in &mut self.tracks {
            let Some(voice) = track.voice else {
                continue;
            };
            if backend.is_finished(voice) {
                backend.stop(voice);
                track.voice = None;
                track.state = TrackState::Stopped;
                track.fade = None;
                ended.push(name.clone());
            }
        }
        for name in ended {
            if self.current.as_deref() == Some(name.as_str()) {
                self.current = None;
            }
            info!(track = %name, "music_track_ended");
        }
    }

    fn begin_stop(&mut self, backend: &mut dyn AudioBackend, name: &str, fade_frames: u32) {
        let Some(track) = self.tracks.get_mut(name) else {
            return;
        };
        match track.state {
            TrackState::Stopped => {}
            TrackState::Playing | TrackState::Pausing if fade_frames > 0 => {
                track.state = TrackState::Stopping;
                track.fade_out(fade_frames);
                debug!(track = name, fade_frames, "music_stopping");
            }
            TrackState::Stopping if fade_frames > 0 => {}
            _ => self.hard_stop(backend, name),
        }
    }

    fn finish_pause(&mut self, backend: &mut dyn AudioBackend, name: &str) {
        let Some(track) = self.tracks.get_mut(name) else {
            return;
        };
        if let Some(voice) = track.voice.take() {
            track.paused_at = backend.pause(voice);
        }
        track.state = TrackState::Paused;
        track.fade = None;
        track.volume = 0.0;
        debug!(track = name, position = track.paused_at, "music_paused");
    }

    fn hard_stop(&mut self, backend: &mut dyn AudioBackend, name: &str) {
        if let Some(track) = self.tracks.get_mut(name) {
            if let Some(voice) = track.voice.take() {
                backend.stop(voice);
            }
            track.state = TrackState::Stopped;
            track.fade = None;
            track.volume = 0.0;
            track.paused_at = 0.0;
        }
        if self.current.as_deref() == Some(name) {
            self.current = None;
        }
    }

    fn start_voice(
        &mut self,
        backend: &mut dyn AudioBackend,
        name: &str,
        fade_frames: u32,
        offset_seconds: f64,
    ) -> Result<(), AudioError> {
        let (master_volume, master_pitch) = (self.master_volume, self.master_pitch);
        let track = self
            .tracks
            .get_mut(name)
            .ok_or_else(|| AudioError::UnknownTrack(name.to_string()))?;
        if let Some(voice) = track.voice.take() {
            backend.stop(voice);
        }
        track.state = TrackState::Stopped;
        track.fade = None;
        track.volume = if fade_frames > 0 { 0.0 } else { 1.0 };

        let voice = backend.start(VoiceRequest {
            clip: &track.def.clip,
            start_seconds: offset_seconds,
            looping: track.def.looping,
            gain: track.volume * master_volume,
            pitch: master_pitch,
        })?;
        track.voice = Some(voice);
        track.state = TrackState::Playing;
        if fade_frames > 0 {
            track.fade_in(fade_frames);
        }
        Ok(())
    }
}
