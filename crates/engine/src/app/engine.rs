use std::collections::HashSet;
use std::fmt;

use tracing::{debug, warn};

use super::camera::{Camera, CameraBounds};
use super::input::{InputHandler, InputSnapshot, KeyCode, MouseButton};
use super::loop_runner::LoopConfig;
use super::rendering::{draw_frame, screen_to_world, Canvas, DebugOverlays};
use super::room::{Room, RoomSettings, Transition};
use crate::audio::{AudioBackend, AudioError, MusicPlayer, SilentAudio, SoundBoard, TrackState, VoiceId};
use crate::content::AssetDatabase;
use crate::entity::{
    Active, BackdropOptions, CollisionMap, EntityId, EntityKind, InstanceRegistry, Layer, MaskTest,
    ParagraphOptions, RegistryError,
};
use crate::schedule::Scheduler;

/// Runtime context shared by rooms and scheduled tasks: entities, audio,
/// camera, input and the room transition state all live here.
pub struct Engine {
    pub(crate) assets: AssetDatabase,
    pub(crate) registry: InstanceRegistry,
    pub(crate) scheduler: Scheduler,
    pub(crate) audio: Box<dyn AudioBackend>,
    pub(crate) music: MusicPlayer,
    pub(crate) sounds: SoundBoard,
    pub(crate) camera: Camera,
    pub(crate) collision_map: Option<CollisionMap>,
    pub(crate) input: InputSnapshot,
    pub(crate) input_handlers: Vec<InputHandler>,
    pub(crate) mouse_local: (f32, f32),
    pub(crate) mouse_world: (f32, f32),
    pub(crate) room: Option<Box<dyn Room>>,
    pub(crate) room_generation: u64,
    pub(crate) room_settings: RoomSettings,
    pub(crate) transition: Transition,
    pub(crate) debug: DebugOverlays,
    pub(crate) base_width: u32,
    pub(crate) base_height: u32,
    tick_seconds: f64,
    tick_count: u64,
    ticking: bool,
    fps: f32,
    audio_suspended: bool,
    draw_warnings: HashSet<String>,
}

impl Engine {
    pub fn new(config: &LoopConfig, assets: AssetDatabase, audio: Box<dyn AudioBackend>) -> Self {
        let base_width = config.base_width.max(1);
        let base_height = config.base_height.max(1);
        Self {
            registry: InstanceRegistry::new(),
            scheduler: Scheduler::new(),
            music: MusicPlayer::new(&assets),
            sounds: SoundBoard::new(&assets),
            assets,
            audio,
            camera: Camera::new(base_width, base_height),
            collision_map: None,
            input: InputSnapshot::empty(),
            input_handlers: Vec::new(),
            mouse_local: (0.0, 0.0),
            mouse_world: (0.0, 0.0),
            room: None,
            room_generation: 0,
            room_settings: RoomSettings::for_view(base_width, base_height),
            transition: Transition::default(),
            debug: config.debug,
            base_width,
            base_height,
            tick_seconds: 1.0 / f64::from(config.target_tps.max(1)),
            tick_count: 0,
            ticking: false,
            fps: 0.0,
            audio_suspended: false,
            draw_warnings: HashSet::new(),
        }
    }

    /// Engine without assets or an output device, at the default tick rate.
    pub fn headless(base_width: u32, base_height: u32) -> Self {
        let config = LoopConfig {
            base_width,
            base_height,
            ..LoopConfig::default()
        };
        Self::new(&config, AssetDatabase::new(), Box::new(SilentAudio::new()))
    }

    /// One update tick. Order: collision flags reset, input, audio clock,
    /// music, scheduler, room update, animations.
    pub fn tick(&mut self, input: &InputSnapshot) {
        if self.ticking {
            warn!(tick = self.tick_count, "nested_tick_ignored");
            return;
        }
        self.ticking = true;
        self.tick_count += 1;

        self.registry.reset_collision_flags();
        self.apply_input(input);
        self.audio.advance(self.tick_seconds);
        self.music.update(self.audio.as_mut());
        self.sounds.prune(self.audio.as_mut());
        self.run_scheduler();
        self.update_room();
        self.registry.advance_animations();

        self.ticking = false;
    }

    /// Draw phase. Runs every accepted frame, paused or not.
    pub fn draw(&mut self, canvas: &mut Canvas, paused: bool) {
        let mut warnings = std::mem::take(&mut self.draw_warnings);
        draw_frame(self, canvas, paused, &mut warnings);
        self.draw_warnings = warnings;
    }

    fn apply_input(&mut self, input: &InputSnapshot) {
        for handler in &mut self.input_handlers {
            handler.update(input);
        }
        if let Some(cursor) = input.cursor() {
            self.mouse_local = cursor;
        }
        self.mouse_world = screen_to_world(self.mouse_local.0, self.mouse_local.1, &self.camera);
        self.input = input.clone();
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn base_width(&self) -> u32 {
        self.base_width
    }

    pub fn base_height(&self) -> u32 {
        self.base_height
    }

    pub fn fps(&self) -> f32 {
        self.fps
    }

    pub(crate) fn set_fps(&mut self, fps: f32) {
        self.fps = fps;
    }

    pub fn assets(&self) -> &AssetDatabase {
        &self.assets
    }

    pub fn debug(&self) -> &DebugOverlays {
        &self.debug
    }

    pub fn debug_mut(&mut self) -> &mut DebugOverlays {
        &mut self.debug
    }

    // Entities

    pub fn add_active(&mut self, layer: Layer, name: &str, x: f32, y: f32) -> Result<EntityId, RegistryError> {
        let def = self.assets.active(name).ok_or_else(|| RegistryError::UnknownDefinition {
            kind: EntityKind::Active,
            name: name.to_string(),
        })?;
        Ok(self.registry.add_active(def, layer, x, y))
    }

    pub fn add_backdrop(
        &mut self,
        layer: Layer,
        name: &str,
        x: f32,
        y: f32,
        options: BackdropOptions,
    ) -> Result<EntityId, RegistryError> {
        let def = self.assets.backdrop(name).ok_or_else(|| RegistryError::UnknownDefinition {
            kind: EntityKind::Backdrop,
            name: name.to_string(),
        })?;
        Ok(self.registry.add_backdrop(def, layer, x, y, options))
    }

    pub fn add_paragraph(
        &mut self,
        layer: Layer,
        font: &str,
        x: f32,
        y: f32,
        text: &str,
        options: ParagraphOptions,
    ) -> Result<EntityId, RegistryError> {
        let font = self.assets.font(font).ok_or_else(|| RegistryError::UnknownDefinition {
            kind: EntityKind::Paragraph,
            name: font.to_string(),
        })?;
        Ok(self.registry.add_paragraph(font, layer, x, y, text, options))
    }

    pub fn destroy(&mut self, id: EntityId) -> Result<(), RegistryError> {
        self.registry.destroy(id)
    }

    pub fn instances(&self) -> &InstanceRegistry {
        &self.registry
    }

    pub fn instances_mut(&mut self) -> &mut InstanceRegistry {
        &mut self.registry
    }

    pub fn active(&self, id: EntityId) -> Result<&Active, RegistryError> {
        self.registry.active(id)
    }

    pub fn active_mut(&mut self, id: EntityId) -> Result<&mut Active, RegistryError> {
        self.registry.active_mut(id)
    }

    // Collision

    pub fn test_collision(&mut self, a: EntityId, b: EntityId) -> Result<bool, RegistryError> {
        self.registry.test_collision(a, b)
    }

    /// Tests an active against one category of the room's collision map.
    pub fn test_against_masks(&mut self, id: EntityId, category: &str) -> Result<MaskTest, RegistryError> {
        self.registry
            .test_against_masks(id, self.collision_map.as_ref(), category)
    }

    /// Whether the world-space mouse is inside the active's collider.
    pub fn hover_test(&mut self, id: EntityId) -> Result<bool, RegistryError> {
        let (x, y) = self.mouse_world;
        self.registry.hover_test(id, x, y)
    }

    pub fn set_collision_map(&mut self, map: CollisionMap) {
        debug!(categories = map.categories().count(), "collision_map_bound");
        self.collision_map = Some(map);
    }

    pub fn clear_collision_map(&mut self) {
        self.collision_map = None;
    }

    pub fn collision_map(&self) -> Option<&CollisionMap> {
        self.collision_map.as_ref()
    }

    // Camera

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_camera(&mut self, x: f32, y: f32) {
        self.camera.set_position(x, y);
    }

    pub fn center_camera_on(&mut self, x: f32, y: f32) {
        self.camera.center_on(x, y);
    }

    pub fn bind_camera(&mut self, bounds: CameraBounds) {
        self.camera.bind(bounds);
    }

    /// Keeps the view inside the room's logical size.
    pub fn bind_camera_to_room(&mut self) {
        self.camera.bind(CameraBounds {
            left: 0.0,
            right: self.room_settings.width as f32,
            top: 0.0,
            bottom: self.room_settings.height as f32,
        });
    }

    pub fn unbind_camera(&mut self) {
        self.camera.unbind();
    }

    // Input

    /// Registers a handler refreshed every tick; returns its index.
    pub fn add_input_handler(&mut self, handler: InputHandler) -> usize {
        self.input_handlers.push(handler);
        self.input_handlers.len() - 1
    }

    pub fn input(&self, index: usize) -> Option<&InputHandler> {
        self.input_handlers.get(index)
    }

    pub fn input_mut(&mut self, index: usize) -> Option<&mut InputHandler> {
        self.input_handlers.get_mut(index)
    }

    pub fn key_pressed(&self, key: KeyCode) -> bool {
        self.input.key(key).pressed
    }

    pub fn key_held(&self, key: KeyCode) -> bool {
        self.input.key(key).held
    }

    pub fn key_released(&self, key: KeyCode) -> bool {
        self.input.key(key).released
    }

    pub fn mouse_pressed(&self, button: MouseButton) -> bool {
        self.input.mouse(button).pressed
    }

    pub fn mouse_held(&self, button: MouseButton) -> bool {
        self.input.mouse(button).held
    }

    pub fn mouse_released(&self, button: MouseButton) -> bool {
        self.input.mouse(button).released
    }

    /// Cursor in base-resolution screen pixels.
    pub fn mouse_x(&self) -> f32 {
        self.mouse_local.0
    }

    pub fn mouse_y(&self) -> f32 {
        self.mouse_local.1
    }

    /// Cursor in world space, as of the start of the current tick.
    pub fn mouse_world_x(&self) -> f32 {
        self.mouse_world.0
    }

    pub fn mouse_world_y(&self) -> f32 {
        self.mouse_world.1
    }

    pub fn mouse_over_region(&self, x: f32, y: f32, width: f32, height: f32) -> bool {
        let (mx, my) = self.mouse_world;
        mx >= x && mx < x + width && my >= y && my < y + height
    }

    // Music

    pub fn play_music(&mut self, name: &str, fade_frames: u32) -> Result<(), AudioError> {
        self.music.play(self.audio.as_mut(), name, fade_frames)
    }

    pub fn stop_music(&mut self, fade_frames: u32) {
        self.music.stop(self.audio.as_mut(), fade_frames);
    }

    pub fn pause_music(&mut self, fade_frames: u32) -> bool {
        self.music.pause(self.audio.as_mut(), fade_frames)
    }

    pub fn resume_music(&mut self, fade_frames: u32) -> Result<bool, AudioError> {
        self.music.resume(self.audio.as_mut(), fade_frames)
    }

    pub fn current_music(&self) -> Option<&str> {
        self.music.current_track()
    }

    pub fn music_state(&self, name: &str) -> Option<TrackState> {
        self.music.track_state(name)
    }

    pub fn music_volume(&self) -> f32 {
        self.music.master_volume()
    }

    pub fn set_music_volume(&mut self, volume: f32) {
        self.music.set_master_volume(self.audio.as_mut(), volume);
    }

    pub fn music_pitch(&self) -> f32 {
        self.music.master_pitch()
    }

    pub fn set_music_pitch(&mut self, pitch: f32) {
        self.music.set_master_pitch(self.audio.as_mut(), pitch);
    }

    // Sound effects

    pub fn play_sound(&mut self, name: &str) -> Result<VoiceId, AudioError> {
        self.play_sound_with(name, 1.0, 1.0)
    }

    pub fn play_sound_with(&mut self, name: &str, volume: f32, pitch: f32) -> Result<VoiceId, AudioError> {
        self.sounds.play(self.audio.as_mut(), name, volume, pitch)
    }

    pub fn stop_all_sounds(&mut self) {
        self.sounds.stop_all(self.audio.as_mut());
    }

    pub fn sound_volume(&self) -> f32 {
        self.sounds.master_volume()
    }

    pub fn set_sound_volume(&mut self, volume: f32) {
        self.sounds.set_master_volume(volume);
    }

    /// Silences the output device; repeated calls are no-ops.
    pub fn suspend_audio(&mut self) {
        if !self.audio_suspended {
            self.audio_suspended = true;
            self.audio.suspend();
            debug!("audio_suspended");
        }
    }

    pub fn resume_audio(&mut self) {
        if self.audio_suspended {
            self.audio_suspended = false;
            self.audio.resume();
            debug!("audio_resumed");
        }
    }

    pub fn is_audio_suspended(&self) -> bool {
        self.audio_suspended
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("room", &self.room_settings.name)
            .field("tick_count", &self.tick_count)
            .field("entities", &self.registry.len())
            .field("scheduler", &self.scheduler)
            .field("transition", &self.transition)
            .field("camera", &self.camera)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::app::{ChangeRoomOptions, MouseButton};
    use crate::entity::Entity;

    struct Recorder {
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Room for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn load(&mut self, _engine: &mut Engine) {}

        fn update(&mut self, engine: &mut Engine) {
            self.log
                .borrow_mut()
                .push(format!("update {}", engine.tick_count()));
            engine.tick(&InputSnapshot::empty());
        }
    }

    #[test]
    fn nested_tick_from_room_update_is_ignored() {
        let mut engine = Engine::headless(16, 16);
        let log = Rc::new(RefCell::new(Vec::new()));
        let room_log = Rc::clone(&log);
        engine.change_room(move || Recorder { log: room_log }, ChangeRoomOptions::default());
        engine.tick(&InputSnapshot::empty());
        engine.tick(&InputSnapshot::empty());
        assert_eq!(engine.tick_count(), 2);
        assert_eq!(*log.borrow(), ["update 1", "update 2"]);
    }

    #[test]
    fn world_mouse_follows_camera_offset() {
        let mut engine = Engine::headless(100, 100);
        engine.set_camera(40.0, 10.0);
        let input = InputSnapshot::empty().with_cursor(Some((5.0, 6.0)));
        engine.tick(&input);
        assert_eq!((engine.mouse_x(), engine.mouse_y()), (5.0, 6.0));
        assert_eq!((engine.mouse_world_x(), engine.mouse_world_y()), (45.0, 16.0));
        assert!(engine.mouse_over_region(40.0, 10.0, 10.0, 10.0));
        assert!(!engine.mouse_over_region(0.0, 0.0, 10.0, 10.0));

        engine.tick(&InputSnapshot::empty());
        assert_eq!(engine.mouse_world_x(), 45.0);
    }

    #[test]
    fn mouse_edges_come_from_the_tick_snapshot() {
        let mut engine = Engine::headless(10, 10);
        let press = crate::app::ButtonState {
            pressed: true,
            held: true,
            released: false,
        };
        engine.tick(&InputSnapshot::empty().with_mouse_button(MouseButton::Left, press));
        assert!(engine.mouse_pressed(MouseButton::Left));
        assert!(!engine.mouse_pressed(MouseButton::Right));
        engine.tick(&InputSnapshot::empty());
        assert!(!engine.mouse_held(MouseButton::Left));
    }

    #[test]
    fn unknown_definitions_are_reported() {
        let mut engine = Engine::headless(10, 10);
        let error = engine
            .add_active(Layer::Foreground, "ghost", 0.0, 0.0)
            .expect_err("missing definition");
        assert_eq!(
            error,
            RegistryError::UnknownDefinition {
                kind: EntityKind::Active,
                name: "ghost".to_string()
            }
        );
        assert!(engine.play_music("missing", 0).is_err());
        assert!(engine.play_sound("missing").is_err());
    }

    #[test]
    fn suspend_audio_is_idempotent() {
        let mut engine = Engine::headless(10, 10);
        engine.suspend_audio();
        engine.suspend_audio();
        assert!(engine.is_audio_suspended());
        engine.resume_audio();
        assert!(!engine.is_audio_suspended());
    }

    #[test]
    fn entities_created_by_handlers_are_registered() {
        use crate::content::{ActiveDef, AnimationDef, ImageData};

        let mut assets = AssetDatabase::new();
        assets
            .register_active(ActiveDef::new("coin").with_animation(
                "default",
                AnimationDef::from_strip(ImageData::solid(8, 4, [255, 255, 0, 255]), 2, 1),
            ))
            .expect("register");
        let mut engine = Engine::new(&LoopConfig::default(), assets, Box::new(SilentAudio::new()));
        let id = engine
            .add_active(Layer::Foreground, "coin", 3.0, 4.0)
            .expect("spawn");
        engine.active_mut(id).expect("active").move_by(1.0, 1.0);
        assert_eq!(engine.active(id).expect("active").x(), 4.0);
        engine.destroy(id).expect("destroy");
        assert!(engine.active(id).is_err());
    }
}
