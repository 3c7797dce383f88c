use std::collections::HashMap;
use std::time::Duration;

use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink, Source};
use tracing::info;

use super::backend::{AudioBackend, AudioError, VoiceId, VoiceRequest};
use crate::content::LoopRegion;

struct RodioVoice {
    sink: Sink,
    start_seconds: f64,
    looping: Option<LoopRegion>,
}

/// Default output device through rodio; one sink per voice.
pub struct RodioAudio {
    _stream: OutputStream,
    handle: OutputStreamHandle,
    voices: HashMap<VoiceId, RodioVoice>,
    next_voice: u64,
    suspended: bool,
}

impl RodioAudio {
    pub fn new() -> Result<Self, AudioError> {
        let (stream, handle) =
            OutputStream::try_default().map_err(|error| AudioError::Output(error.to_string()))?;
        info!("audio_output_opened");
        Ok(Self {
            _stream: stream,
            handle,
            voices: HashMap::new(),
            next_voice: 0,
            suspended: false,
        })
    }
}

impl AudioBackend for RodioAudio {
    fn start(&mut self, request: VoiceRequest<'_>) -> Result<VoiceId, AudioError> {
        let sink =
            Sink::try_new(&self.handle).map_err(|error| AudioError::Output(error.to_string()))?;
        let clip = request.clip;
        let buffer = || SamplesBuffer::new(clip.channels(), clip.sample_rate(), clip.samples().to_vec());
        let mut start_seconds = request.start_seconds.max(0.0);
        let start = Duration::from_secs_f64(start_seconds);

        match request.looping {
            Some(region) => {
                let loop_start = Duration::from_secs_f64(region.start_seconds);
                let loop_end = Duration::from_secs_f64(region.end_seconds);
                if start >= loop_end {
                    start_seconds = region.start_seconds;
                } else {
                    sink.append(
                        buffer()
                            .skip_duration(start)
                            .take_duration(loop_end - start),
                    );
                }
                sink.append(
                    buffer()
                        .skip_duration(loop_start)
                        .take_duration(loop_end.saturating_sub(loop_start))
                        .repeat_infinite(),
                );
            }
            None => sink.append(buffer().skip_duration(start)),
        }

        sink.set_volume(request.gain);
        sink.set_speed(request.pitch);
        if self.suspended {
            sink.pause();
        }

        let id = VoiceId(self.next_voice);
        self.next_voice += 1;
        self.voices.insert(
            id,
            RodioVoice {
                sink,
                start_seconds,
                looping: request.looping,
            },
        );
        Ok(id)
    }

    fn stop(&mut self, voice: VoiceId) {
        if let Some(voice) = self.voices.remove(&voice) {
            voice.sink.stop();
        }
    }

    fn pause(&mut self, voice: VoiceId) -> f64 {
        let position = self.position(voice);
        self.stop(voice);
        position
    }

    fn set_gain(&mut self, voice: VoiceId, gain: f32) {
        if let Some(voice) = self.voices.get(&voice) {
            voice.sink.set_volume(gain);
        }
    }

    fn set_pitch(&mut self, voice: VoiceId, pitch: f32) {
        if let Some(voice) = self.voices.get(&voice) {
            voice.sink.set_speed(pitch);
        }
    }

    fn is_finished(&self, voice: VoiceId) -> bool {
        self.voices.get(&voice).map_or(true, |voice| voice.sink.empty())
    }

    fn position(&self, voice: VoiceId) -> f64 {
        self.voices.get(&voice).map_or(0.0, |voice| {
            let position = voice.start_seconds + voice.sink.get_pos().as_secs_f64();
            voice
                .looping
                .map_or(position, |region| region.wrap(position))
        })
    }

    fn suspend(&mut self) {
        self.suspended = true;
        for voice in self.voices.values() {
            voice.sink.pause();
        }
    }

    fn resume(&mut self) {
        self.suspended = false;
        for voice in self.voices.values() {
            voice.sink.play();
        }
    }
}
