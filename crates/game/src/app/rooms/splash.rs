use room_engine::entity::BackdropOptions;
use room_engine::{ChangeRoomOptions, Engine, KeyCode, Layer, MouseButton, Rgb, Room};
use tracing::warn;

use super::Title;

/// Frames the logo stays up before moving on by itself.
pub(crate) const SPLASH_FRAMES: u32 = 150;
const LOGO_WIDTH: f32 = 96.0;
const LOGO_HEIGHT: f32 = 24.0;

pub(crate) struct Splash;

impl Splash {
    fn advance(engine: &mut Engine) {
        engine.change_room(Title::new, ChangeRoomOptions::default());
    }
}

impl Room for Splash {
    fn name(&self) -> &str {
        "splash"
    }

    fn load(&mut self, engine: &mut Engine) {
        engine.set_room_background_color(12, 12, 20);
        engine.configure_room_fade_in(40, 10, Rgb::WHITE);
        engine.configure_room_fade_out(30, 0, Rgb::WHITE);

        let x = (engine.base_width() as f32 - LOGO_WIDTH) / 2.0;
        let y = (engine.base_height() as f32 - LOGO_HEIGHT) / 2.0;
        if let Err(error) =
            engine.add_backdrop(Layer::Foreground, "logo", x, y, BackdropOptions::default())
        {
            warn!(error = %error, "splash_logo_missing");
        }
        engine.delay(Self::advance, SPLASH_FRAMES);
    }

    fn update(&mut self, engine: &mut Engine) {
        let skip = engine.mouse_pressed(MouseButton::Left)
            || engine.key_pressed(KeyCode::Space)
            || engine.key_pressed(KeyCode::Enter);
        if skip {
            Self::advance(engine);
        }
    }
}
