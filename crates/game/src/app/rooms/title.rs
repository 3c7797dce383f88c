use room_engine::entity::BackdropOptions;
use room_engine::{
    ChangeRoomOptions, Engine, Entity, EntityId, KeyCode, Layer, MouseButton, Rgb, Room,
    TrackState,
};
use tracing::{info, warn};

use super::Splash;

pub(crate) const ROOM_WIDTH: u32 = 640;
pub(crate) const ORB_COUNT: usize = 5;
const ORB_SPACING: f32 = 120.0;
const BOB_AMPLITUDE: f32 = 6.0;
const BOB_SPEED: f32 = 0.06;
const SCROLL_SPEED: f32 = 0.75;
const MUSIC_FADE_FRAMES: u32 = 20;
pub(crate) const THEME: &str = "theme";

struct Orb {
    id: EntityId,
    rest_y: f32,
    phase: f32,
}

pub(crate) struct Title {
    orbs: Vec<Orb>,
    ticks: u32,
    scroll_direction: f32,
}

impl Title {
    pub(crate) fn new() -> Self {
        Self {
            orbs: Vec::new(),
            ticks: 0,
            scroll_direction: 1.0,
        }
    }

    fn scroll(&mut self, engine: &mut Engine) {
        let max_x = ROOM_WIDTH.saturating_sub(engine.base_width()) as f32;
        let mut x = engine.camera().x() + SCROLL_SPEED * self.scroll_direction;
        if x <= 0.0 || x >= max_x {
            x = x.clamp(0.0, max_x);
            self.scroll_direction = -self.scroll_direction;
        }
        engine.set_camera(x, 0.0);
    }

    fn bob(&self, engine: &mut Engine) -> bool {
        let mut hovered = false;
        for orb in &self.orbs {
            let over = engine.hover_test(orb.id).unwrap_or(false);
            hovered |= over;
            let Ok(active) = engine.active_mut(orb.id) else {
                continue;
            };
            let wave = (self.ticks as f32 * BOB_SPEED + orb.phase).sin();
            active.set_y(orb.rest_y + wave * BOB_AMPLITUDE);
            active.play_animation(if over { "lit" } else { "default" }, false);
        }
        hovered
    }

    fn toggle_music(engine: &mut Engine) {
        match engine.music_state(THEME) {
            Some(TrackState::Playing) => {
                engine.pause_music(MUSIC_FADE_FRAMES);
            }
            Some(TrackState::Paused | TrackState::Pausing) => {
                if let Err(error) = engine.resume_music(MUSIC_FADE_FRAMES) {
                    warn!(error = %error, "music_resume_failed");
                }
            }
            _ => Self::start_theme(engine, MUSIC_FADE_FRAMES),
        }
    }

    fn start_theme(engine: &mut Engine, fade_frames: u32) {
        if let Err(error) = engine.play_music(THEME, fade_frames) {
            warn!(error = %error, "music_start_failed");
        }
    }
}

impl Room for Title {
    fn name(&self) -> &str {
        "title"
    }

    fn load(&mut self, engine: &mut Engine) {
        let height = engine.base_height();
        engine.set_room_size(ROOM_WIDTH, height);
        engine.set_room_background_color(20, 24, 36);
        engine.configure_room_fade_in(20, 0, Rgb::BLACK);
        engine.configure_room_fade_out(20, 0, Rgb::BLACK);
        engine.bind_camera_to_room();

        let options = BackdropOptions {
            width: Some(ROOM_WIDTH as f32),
            height: Some(height as f32),
        };
        if let Err(error) = engine.add_backdrop(Layer::Background, "checker", 0.0, 0.0, options) {
            warn!(error = %error, "title_backdrop_missing");
        }

        let rest_y = height as f32 / 2.0 - 8.0;
        self.orbs.clear();
        for index in 0..ORB_COUNT {
            let x = 52.0 + index as f32 * ORB_SPACING;
            match engine.add_active(Layer::Foreground, "orb", x, rest_y) {
                Ok(id) => self.orbs.push(Orb {
                    id,
                    rest_y,
                    phase: index as f32 * 0.9,
                }),
                Err(error) => warn!(error = %error, "title_orb_missing"),
            }
        }

        Self::start_theme(engine, 30);
        info!(orbs = self.orbs.len(), "title_ready");
    }

    fn update(&mut self, engine: &mut Engine) {
        self.ticks = self.ticks.wrapping_add(1);
        self.scroll(engine);
        let hovered = self.bob(engine);

        if engine.mouse_pressed(MouseButton::Left) {
            if hovered {
                if let Err(error) = engine.play_sound("blip") {
                    warn!(error = %error, "sound_failed");
                }
            } else {
                Self::toggle_music(engine);
            }
        }
        if engine.key_pressed(KeyCode::KeyR) {
            Self::start_theme(engine, 0);
        }
        if engine.key_pressed(KeyCode::Enter) {
            let options = ChangeRoomOptions {
                fade_music: true,
                ..ChangeRoomOptions::default()
            };
            engine.change_room(|| Splash, options);
        }
    }
}
