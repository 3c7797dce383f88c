//! Fixed-step 2D room runtime: rooms with fade transitions, animated and
//! collidable entities, frame-counted scheduling, music and sound playback,
//! and a winit/pixels host loop.

pub mod app;
pub mod audio;
pub mod content;
pub mod entity;
pub mod schedule;

pub use app::{
    run_app, AppError, Camera, CameraBounds, Canvas, ChangeRoomOptions, DebugOverlays, Engine,
    FrameOutcome, GameLoop, InputHandler, InputSnapshot, KeyCode, LoopConfig, MouseButton, Rgb,
    Room, TransitionPhase,
};
pub use audio::{AudioBackend, AudioError, SilentAudio, TrackState};
pub use content::{AssetDatabase, AssetManifest, ContentError, MediaSet};
pub use entity::{Entity, EntityId, Layer, RegistryError};
pub use schedule::{ScheduleError, ScheduledTask, TaskId};
