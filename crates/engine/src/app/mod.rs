mod camera;
mod engine;
mod fade;
mod game_loop;
mod input;
mod loop_runner;
mod metrics;
mod rendering;
mod room;

pub use camera::{Camera, CameraBounds};
pub use engine::Engine;
pub use fade::{overlay_alpha, FadeDirection, FadeRamp, FADE_VISIBLE};
pub use game_loop::{FrameOutcome, FrameThrottle, GameLoop};
pub use input::{ButtonState, InputCollector, InputHandler, InputSnapshot, KeyCode, MouseButton};
pub use loop_runner::{run_app, AppError, LoopConfig, RUN_UNFOCUSED_ENV_VAR};
pub use metrics::LoopMetricsSnapshot;
pub use rendering::{
    screen_to_world, world_to_screen, Canvas, DebugOverlays, Renderer, SourceRect,
    SpriteTransform, Viewport,
};
pub use room::{
    ChangeRoomOptions, FadeConfig, Rgb, Room, RoomFactory, RoomSettings, TransitionPhase,
};
