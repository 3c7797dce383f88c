use room_engine::app::ButtonState;
use room_engine::{
    ChangeRoomOptions, Engine, Entity, InputSnapshot, KeyCode, LoopConfig, MouseButton, SilentAudio,
    TrackState, TransitionPhase,
};

use super::splash::SPLASH_FRAMES;
use super::title::{ORB_COUNT, ROOM_WIDTH, THEME};
use super::{Splash, Title};
use crate::app::bootstrap::build_assets;

fn engine() -> Engine {
    let config = LoopConfig {
        base_width: 320,
        base_height: 240,
        ..LoopConfig::default()
    };
    let assets = build_assets().expect("builtin assets");
    Engine::new(&config, assets, Box::new(SilentAudio::new()))
}

fn run(engine: &mut Engine, ticks: u32) {
    for _ in 0..ticks {
        engine.tick(&InputSnapshot::empty());
    }
}

fn click_at(x: f32, y: f32) -> InputSnapshot {
    let click = ButtonState {
        pressed: true,
        held: true,
        released: false,
    };
    InputSnapshot::empty()
        .with_cursor(Some((x, y)))
        .with_mouse_button(MouseButton::Left, click)
}

fn settle(engine: &mut Engine) {
    for _ in 0..400 {
        if engine.transition_phase() == TransitionPhase::Idle {
            return;
        }
        engine.tick(&InputSnapshot::empty());
    }
    panic!("transition never settled");
}

#[test]
fn splash_moves_on_to_title_by_itself() {
    let mut engine = engine();
    engine.change_room(|| Splash, ChangeRoomOptions::default());
    assert_eq!(engine.room_name(), Some("splash"));
    assert_eq!(engine.transition_phase(), TransitionPhase::FadingIn);
    assert_eq!(engine.instances().len(), 1);

    run(&mut engine, SPLASH_FRAMES + 80);
    assert_eq!(engine.room_name(), Some("title"));
}

#[test]
fn splash_can_be_skipped_once_faded_in() {
    let mut engine = engine();
    engine.change_room(|| Splash, ChangeRoomOptions::default());
    settle(&mut engine);
    engine.tick(&InputSnapshot::empty().with_key_pressed(KeyCode::Space));
    assert_eq!(engine.transition_phase(), TransitionPhase::FadingOut);
    settle(&mut engine);
    assert_eq!(engine.room_name(), Some("title"));
}

#[test]
fn title_spawns_orbs_and_starts_the_theme() {
    let mut engine = engine();
    engine.change_room(Title::new, ChangeRoomOptions::default());
    assert_eq!(engine.room().width, ROOM_WIDTH);
    assert_eq!(engine.instances().actives().len(), ORB_COUNT);
    assert_eq!(engine.instances().backdrops().len(), 1);
    assert_eq!(engine.current_music(), Some(THEME));
}

#[test]
fn title_scrolls_and_bobs() {
    let mut engine = engine();
    engine.change_room(Title::new, ChangeRoomOptions::default());
    let orb = engine.instances().actives()[0];
    let rest_y = engine.active(orb).expect("orb").y();
    run(&mut engine, 30);
    assert!(engine.camera().x() > 0.0);
    assert!((engine.active(orb).expect("orb").y() - rest_y).abs() > 0.5);
}

#[test]
fn clicking_empty_space_toggles_music_pause() {
    let mut engine = engine();
    engine.change_room(Title::new, ChangeRoomOptions::default());
    settle(&mut engine);
    run(&mut engine, 40);
    assert_eq!(engine.music_state(THEME), Some(TrackState::Playing));

    engine.tick(&click_at(5.0, 5.0));
    run(&mut engine, 30);
    assert_eq!(engine.music_state(THEME), Some(TrackState::Paused));

    engine.tick(&click_at(5.0, 5.0));
    run(&mut engine, 30);
    assert_eq!(engine.music_state(THEME), Some(TrackState::Playing));
}

#[test]
fn enter_returns_to_splash() {
    let mut engine = engine();
    engine.change_room(Title::new, ChangeRoomOptions::default());
    settle(&mut engine);
    engine.tick(&InputSnapshot::empty().with_key_pressed(KeyCode::Enter));
    settle(&mut engine);
    assert_eq!(engine.room_name(), Some("splash"));
    assert_eq!(engine.current_music(), None);
}
