use tracing::{debug, info, warn};

use super::engine::Engine;
use super::fade::{FadeDirection, FadeRamp, FadeTask, FADE_VISIBLE};
use crate::schedule::TaskId;

/// A screen of the game. The engine owns the current room and hands itself
/// to the hooks, so rooms create entities, schedule tasks and request room
/// changes through it.
pub trait Room {
    fn name(&self) -> &str;
    /// Runs once right after construction, with a freshly cleared engine.
    fn load(&mut self, engine: &mut Engine);
    fn update(&mut self, _engine: &mut Engine) {}
}

pub type RoomFactory = Box<dyn FnOnce() -> Box<dyn Room>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Out-of-range channels are clamped to 0..=255.
    pub fn clamped(r: i32, g: i32, b: i32) -> Self {
        let channel = |value: i32| value.clamp(0, 255) as u8;
        Self::new(channel(r), channel(g), channel(b))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FadeConfig {
    pub length_frames: u32,
    pub pause_frames: u32,
    pub color: Rgb,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoomSettings {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub background: Rgb,
    pub fade_in: Option<FadeConfig>,
    pub fade_out: Option<FadeConfig>,
}

impl RoomSettings {
    pub(crate) fn for_view(width: u32, height: u32) -> Self {
        Self {
            name: String::new(),
            width,
            height,
            background: Rgb::BLACK,
            fade_in: None,
            fade_out: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeRoomOptions {
    /// Fade the current music track out over the fade-out length.
    pub fade_music: bool,
    /// Keep music and sounds playing across the swap.
    pub persist_audio: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransitionPhase {
    #[default]
    Idle,
    FadingOut,
    Loading,
    FadingIn,
}

pub(crate) struct PendingRoom {
    factory: RoomFactory,
    options: ChangeRoomOptions,
}

pub(crate) struct Transition {
    pub(crate) phase: TransitionPhase,
    pub(crate) pending: Option<PendingRoom>,
    pub(crate) fade_task: Option<TaskId>,
    pub(crate) fade_level: f32,
    pub(crate) fade_color: Rgb,
}

impl Default for Transition {
    fn default() -> Self {
        Self {
            phase: TransitionPhase::Idle,
            pending: None,
            fade_task: None,
            fade_level: FADE_VISIBLE,
            fade_color: Rgb::BLACK,
        }
    }
}

impl std::fmt::Debug for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("phase", &self.phase)
            .field("pending", &self.pending.is_some())
            .field("fade_task", &self.fade_task)
            .field("fade_level", &self.fade_level)
            .finish()
    }
}

impl Engine {
    /// Requests a switch to the room built by `factory`.
    ///
    /// Accepted while idle (fading out first when the current room has a
    /// fade-out configured) and while another room is loading, in which case
    /// the newest request replaces the room being loaded. Requests made
    /// during a fade are ignored and return `false`.
    pub fn change_room<R, F>(&mut self, factory: F, options: ChangeRoomOptions) -> bool
    where
        R: Room + 'static,
        F: FnOnce() -> R + 'static,
    {
        let pending = PendingRoom {
            factory: Box::new(move || Box::new(factory()) as Box<dyn Room>),
            options,
        };
        match self.transition.phase {
            TransitionPhase::FadingOut | TransitionPhase::FadingIn => {
                debug!(phase = ?self.transition.phase, "room_change_ignored");
                false
            }
            TransitionPhase::Loading => {
                if self.transition.pending.replace(pending).is_some() {
                    debug!("room_change_replaced_pending");
                }
                true
            }
            TransitionPhase::Idle => {
                match self.room_settings.fade_out.filter(|fade| fade.length_frames > 0) {
                    Some(fade) => self.begin_fade_out(fade, pending),
                    None => self.swap_room(pending),
                }
                true
            }
        }
    }

    pub fn transition_phase(&self) -> TransitionPhase {
        self.transition.phase
    }

    pub fn is_changing_rooms(&self) -> bool {
        self.transition.phase != TransitionPhase::Idle
    }

    /// 100 is fully visible, 0 or below fully covered by the fade colour.
    pub fn fade_level(&self) -> f32 {
        self.transition.fade_level
    }

    pub fn fade_color(&self) -> Rgb {
        self.transition.fade_color
    }

    pub fn room(&self) -> &RoomSettings {
        &self.room_settings
    }

    pub fn set_room_background_color(&mut self, r: i32, g: i32, b: i32) {
        self.room_settings.background = Rgb::clamped(r, g, b);
    }

    pub fn set_room_size(&mut self, width: u32, height: u32) {
        self.room_settings.width = width;
        self.room_settings.height = height;
    }

    /// A zero length disables the fade.
    pub fn configure_room_fade_in(&mut self, length_frames: u32, pause_frames: u32, color: Rgb) {
        self.room_settings.fade_in = (length_frames > 0).then_some(FadeConfig {
            length_frames,
            pause_frames,
            color,
        });
    }

    pub fn configure_room_fade_out(&mut self, length_frames: u32, pause_frames: u32, color: Rgb) {
        self.room_settings.fade_out = (length_frames > 0).then_some(FadeConfig {
            length_frames,
            pause_frames,
            color,
        });
    }

    fn begin_fade_out(&mut self, fade: FadeConfig, pending: PendingRoom) {
        if pending.options.fade_music {
            self.stop_music(fade.length_frames);
        }
        self.transition.phase = TransitionPhase::FadingOut;
        self.transition.pending = Some(pending);
        self.transition.fade_level = FADE_VISIBLE;
        self.transition.fade_color = fade.color;
        let task = FadeTask::new(FadeRamp::new(&fade), FadeDirection::Out);
        self.transition.fade_task = Some(self.repeat(task, 1, false));
        debug!(
            from = %self.room_settings.name,
            length = fade.length_frames,
            pause = fade.pause_frames,
            "room_fade_out_started"
        );
    }

    pub(crate) fn finish_fade(&mut self, direction: FadeDirection) {
        if let Some(task) = self.transition.fade_task.take() {
            // Already purged when a swap cancelled everything.
            let _ = self.scheduler.cancel(task);
        }
        match direction {
            FadeDirection::Out => match self.transition.pending.take() {
                Some(pending) => self.swap_room(pending),
                None => {
                    warn!("fade_out_finished_without_pending_room");
                    self.transition.phase = TransitionPhase::Idle;
                }
            },
            FadeDirection::In => {
                self.transition.phase = TransitionPhase::Idle;
                self.transition.fade_level = FADE_VISIBLE;
            }
        }
    }

    /// Tears down everything the current room created, then builds and
    /// loads the next one. A change requested from inside `load` is queued;
    /// once that load returns, the loaded room is dropped uninstalled and the
    /// queued room goes through a full swap of its own.
    fn swap_room(&mut self, pending: PendingRoom) {
        let mut next = Some(pending);
        while let Some(pending) = next.take() {
            self.transition.phase = TransitionPhase::Loading;
            self.transition.pending = None;
            self.transition.fade_task = None;

            self.registry.clear();
            if !pending.options.persist_audio {
                self.music.stop_all(self.audio.as_mut());
                self.sounds.stop_all(self.audio.as_mut());
            }
            self.camera.reset();
            self.collision_map = None;
            self.scheduler.cancel_all();
            self.room_settings = RoomSettings::for_view(self.base_width, self.base_height);
            self.room = None;
            self.room_generation = self.room_generation.wrapping_add(1);

            let mut room = (pending.factory)();
            self.room_settings.name = room.name().to_string();
            room.load(self);

            next = self.transition.pending.take();
            if next.is_some() {
                debug!(room = room.name(), "room_superseded_during_load");
                continue;
            }

            info!(
                room = %self.room_settings.name,
                entity_count = self.registry.len(),
                "room_loaded"
            );
            self.room = Some(room);
        }

        match self.room_settings.fade_in {
            Some(fade) => {
                let ramp = FadeRamp::new(&fade);
                self.transition.phase = TransitionPhase::FadingIn;
                self.transition.fade_level = ramp.floor();
                self.transition.fade_color = fade.color;
                let task = FadeTask::new(ramp, FadeDirection::In);
                self.transition.fade_task = Some(self.repeat(task, 1, false));
            }
            None => {
                self.transition.phase = TransitionPhase::Idle;
                self.transition.fade_level = FADE_VISIBLE;
            }
        }
    }

    /// Per-tick room hook. The room is lent out while it runs; if it changed
    /// rooms during the call the replacement stays installed.
    pub(crate) fn update_room(&mut self) {
        let Some(mut room) = self.room.take() else {
            return;
        };
        let generation = self.room_generation;
        room.update(self);
        if self.room_generation == generation && self.room.is_none() {
            self.room = Some(room);
        }
    }

    pub fn room_name(&self) -> Option<&str> {
        self.room.as_ref().map(|room| room.name())
    }
}
