use std::cell::RefCell;
use std::rc::Rc;

use room_engine::audio::{VoiceId, VoiceRequest};
use room_engine::content::{AudioClip, MusicDef};
use room_engine::{
    AssetDatabase, AudioBackend, AudioError, ChangeRoomOptions, Engine, InputSnapshot,
    LoopConfig, Rgb, Room, SilentAudio, TaskId, TrackState,
};

type Fired = Rc<RefCell<Vec<(&'static str, u64)>>>;

fn record(fired: &Fired, label: &'static str) -> impl FnMut(&mut Engine) + 'static {
    let fired = Rc::clone(fired);
    move |engine: &mut Engine| fired.borrow_mut().push((label, engine.tick_count()))
}

fn ticks(engine: &mut Engine, count: u32) {
    for _ in 0..count {
        engine.tick(&InputSnapshot::empty());
    }
}

#[test]
fn delayed_task_fires_exactly_once_on_its_frame() {
    let mut engine = Engine::headless(16, 16);
    let fired: Fired = Rc::default();
    engine.delay(record(&fired, "late"), 5);
    ticks(&mut engine, 12);
    assert_eq!(*fired.borrow(), [("late", 5)]);
}

#[test]
fn repeating_task_fires_every_interval_until_cancelled() {
    let mut engine = Engine::headless(16, 16);
    let fired: Fired = Rc::default();
    let id = engine.repeat(record(&fired, "pulse"), 3, false);
    ticks(&mut engine, 10);
    engine.cancel(id).expect("cancel");
    ticks(&mut engine, 10);
    assert_eq!(*fired.borrow(), [("pulse", 3), ("pulse", 6), ("pulse", 9)]);
}

#[test]
fn repeat_can_fire_before_returning() {
    let mut engine = Engine::headless(16, 16);
    let fired: Fired = Rc::default();
    engine.repeat(record(&fired, "now"), 4, true);
    assert_eq!(*fired.borrow(), [("now", 0)]);
    ticks(&mut engine, 4);
    assert_eq!(*fired.borrow(), [("now", 0), ("now", 4)]);
}

#[test]
fn cancelling_inside_a_tick_stops_the_task_that_tick() {
    let mut engine = Engine::headless(16, 16);
    let fired: Fired = Rc::default();
    let victim = engine.repeat(record(&fired, "victim"), 2, false);
    let killer_fired = Rc::clone(&fired);
    // Registered after the victim, so it runs first within a pass.
    engine.delay(
        move |engine: &mut Engine| {
            killer_fired.borrow_mut().push(("killer", engine.tick_count()));
            engine.cancel(victim).expect("cancel victim");
        },
        4,
    );
    ticks(&mut engine, 10);
    assert_eq!(*fired.borrow(), [("victim", 2), ("killer", 4)]);
    assert!(!engine.scheduler().is_pending(victim));
}

#[test]
fn cancelling_an_unknown_task_is_reported() {
    let mut engine = Engine::headless(16, 16);
    let fired: Fired = Rc::default();
    let id: TaskId = engine.delay(record(&fired, "once"), 1);
    ticks(&mut engine, 1);
    assert!(engine.cancel(id).is_err());
}

/// Silent backend that remembers where every voice was started.
struct Recording {
    inner: SilentAudio,
    starts: Rc<RefCell<Vec<f64>>>,
}

impl AudioBackend for Recording {
    fn start(&mut self, request: VoiceRequest<'_>) -> Result<VoiceId, AudioError> {
        self.starts.borrow_mut().push(request.start_seconds);
        self.inner.start(request)
    }

    fn stop(&mut self, voice: VoiceId) {
        self.inner.stop(voice);
    }

    fn pause(&mut self, voice: VoiceId) -> f64 {
        self.inner.pause(voice)
    }

    fn set_gain(&mut self, voice: VoiceId, gain: f32) {
        self.inner.set_gain(voice, gain);
    }

    fn set_pitch(&mut self, voice: VoiceId, pitch: f32) {
        self.inner.set_pitch(voice, pitch);
    }

    fn is_finished(&self, voice: VoiceId) -> bool {
        self.inner.is_finished(voice)
    }

    fn position(&self, voice: VoiceId) -> f64 {
        self.inner.position(voice)
    }

    fn suspend(&mut self) {
        self.inner.suspend();
    }

    fn resume(&mut self) {
        self.inner.resume();
    }

    fn advance(&mut self, seconds: f64) {
        self.inner.advance(seconds);
    }
}

fn music_engine() -> (Engine, Rc<RefCell<Vec<f64>>>) {
    let mut assets = AssetDatabase::new();
    assets
        .register_music(MusicDef {
            name: "theme".to_string(),
            clip: AudioClip::silent(10.0, 1, 8_000),
            looping: None,
        })
        .expect("register theme");
    let starts = Rc::new(RefCell::new(Vec::new()));
    let backend = Recording {
        inner: SilentAudio::new(),
        starts: Rc::clone(&starts),
    };
    let engine = Engine::new(&LoopConfig::default(), assets, Box::new(backend));
    (engine, starts)
}

#[test]
fn replaying_the_current_track_restarts_from_the_beginning() {
    let (mut engine, starts) = music_engine();
    engine.play_music("theme", 0).expect("play");
    ticks(&mut engine, 90);
    assert_eq!(engine.music_state("theme"), Some(TrackState::Playing));

    engine.play_music("theme", 0).expect("replay");
    assert_eq!(*starts.borrow(), [0.0, 0.0]);
    assert_eq!(engine.current_music(), Some("theme"));
    assert_eq!(engine.music_state("theme"), Some(TrackState::Playing));
}

#[test]
fn paused_track_resumes_where_it_stopped() {
    let (mut engine, starts) = music_engine();
    engine.play_music("theme", 0).expect("play");
    ticks(&mut engine, 60);
    assert!(engine.pause_music(0));
    assert_eq!(engine.music_state("theme"), Some(TrackState::Paused));

    assert!(engine.resume_music(0).expect("resume"));
    let starts = starts.borrow();
    assert_eq!(starts.len(), 2);
    assert!((starts[1] - 1.0).abs() < 0.05, "resumed at {}", starts[1]);
}

#[test]
fn unknown_track_is_an_error() {
    let (mut engine, starts) = music_engine();
    assert!(matches!(
        engine.play_music("missing", 0),
        Err(AudioError::UnknownTrack(name)) if name == "missing"
    ));
    assert!(starts.borrow().is_empty());
}

/// Starts the theme on load and fades out over ten frames when left.
struct Stage;

impl Room for Stage {
    fn name(&self) -> &str {
        "stage"
    }

    fn load(&mut self, engine: &mut Engine) {
        engine.configure_room_fade_out(10, 0, Rgb::BLACK);
        engine.play_music("theme", 0).expect("play theme");
    }
}

struct Quiet;

impl Room for Quiet {
    fn name(&self) -> &str {
        "quiet"
    }

    fn load(&mut self, _engine: &mut Engine) {}
}

#[test]
fn fade_music_option_fades_the_track_with_the_room() {
    let (mut engine, _) = music_engine();
    engine.change_room(|| Stage, ChangeRoomOptions::default());
    ticks(&mut engine, 5);
    assert_eq!(engine.music_state("theme"), Some(TrackState::Playing));

    let options = ChangeRoomOptions {
        fade_music: true,
        ..ChangeRoomOptions::default()
    };
    assert!(engine.change_room(|| Quiet, options));
    assert_eq!(engine.music_state("theme"), Some(TrackState::Stopping));

    ticks(&mut engine, 10);
    assert_eq!(engine.room_name(), Some("quiet"));
    assert_eq!(engine.music_state("theme"), Some(TrackState::Stopped));
    assert_eq!(engine.current_music(), None);
}

#[test]
fn music_keeps_playing_through_the_fade_without_fade_music() {
    let (mut engine, _) = music_engine();
    engine.change_room(|| Stage, ChangeRoomOptions::default());
    engine.change_room(|| Quiet, ChangeRoomOptions::default());
    ticks(&mut engine, 9);
    assert_eq!(engine.music_state("theme"), Some(TrackState::Playing));

    ticks(&mut engine, 1);
    assert_eq!(engine.room_name(), Some("quiet"));
    assert_eq!(engine.music_state("theme"), Some(TrackState::Stopped));
}

#[test]
fn persist_audio_option_keeps_music_across_the_swap() {
    let (mut engine, starts) = music_engine();
    engine.change_room(|| Stage, ChangeRoomOptions::default());
    let options = ChangeRoomOptions {
        persist_audio: true,
        ..ChangeRoomOptions::default()
    };
    assert!(engine.change_room(|| Quiet, options));
    ticks(&mut engine, 10);

    assert_eq!(engine.room_name(), Some("quiet"));
    assert_eq!(engine.music_state("theme"), Some(TrackState::Playing));
    assert_eq!(engine.current_music(), Some("theme"));
    assert_eq!(starts.borrow().len(), 1);
}
