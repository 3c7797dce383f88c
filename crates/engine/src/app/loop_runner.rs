use std::env;
use std::sync::Arc;
use std::time::Instant;

use pixels::Error as PixelsError;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use winit::dpi::PhysicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use super::engine::Engine;
use super::game_loop::GameLoop;
use super::input::InputCollector;
use super::rendering::{Canvas, DebugOverlays, Renderer};
use super::room::{ChangeRoomOptions, Room};
use crate::audio::default_backend;
use crate::content::{AssetDatabase, ContentError};

pub const RUN_UNFOCUSED_ENV_VAR: &str = "ROOM_ENGINE_RUN_UNFOCUSED";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct LoopConfig {
    pub window_title: String,
    /// Logical resolution every room is drawn at.
    pub base_width: u32,
    pub base_height: u32,
    /// Integer window scale over the base resolution.
    pub screen_scale: u32,
    pub target_tps: u32,
    /// Keep updating while the window is unfocused.
    pub run_unfocused: bool,
    pub debug: DebugOverlays,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Room Engine".to_string(),
            base_width: 320,
            base_height: 240,
            screen_scale: 3,
            target_tps: 60,
            run_unfocused: false,
            debug: DebugOverlays::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("content failed validation, refusing to start: {0}")]
    Content(#[from] ContentError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Opens the window and runs `starting_room` until the window closes.
/// A failed asset database stops startup before any window exists.
pub fn run_app<R, F>(
    config: LoopConfig,
    assets: Result<AssetDatabase, ContentError>,
    starting_room: F,
) -> Result<(), AppError>
where
    R: Room + 'static,
    F: FnOnce() -> R + 'static,
{
    let assets = assets.map_err(|error| {
        error!(error = %error, "initialization_failed");
        AppError::Content(error)
    })?;
    let run_unfocused = resolve_run_unfocused(config.run_unfocused);
    let base_width = config.base_width.max(1);
    let base_height = config.base_height.max(1);
    let scale = config.screen_scale.max(1);

    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(PhysicalSize::new(base_width * scale, base_height * scale))
            .with_min_inner_size(PhysicalSize::new(base_width, base_height))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );
    let mut renderer = Renderer::new(Arc::clone(&window), base_width, base_height)
        .map_err(AppError::CreateRenderer)?;

    let mut engine = Engine::new(&config, assets, default_backend());
    engine.change_room(starting_room, ChangeRoomOptions::default());

    info!(
        base_width,
        base_height,
        scale,
        target_tps = config.target_tps,
        run_unfocused,
        "loop_config"
    );

    let mut game_loop = GameLoop::new(engine, config.target_tps, run_unfocused, Instant::now());
    let mut input = InputCollector::new();
    let mut canvas = Canvas::new(base_width, base_height);
    let mut focused = true;

    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(size) => {
                    if let Err(error) = renderer.resize(size.width, size.height) {
                        warn!(error = %error, "renderer_resize_failed");
                        window_target.exit();
                        return;
                    }
                    debug!(
                        base = ?renderer.base_viewport(),
                        surface = ?renderer.surface_viewport(),
                        "renderer_resized"
                    );
                }
                WindowEvent::Focused(now_focused) => {
                    focused = now_focused;
                    if !now_focused {
                        input.release_all();
                    }
                    info!(focused, "focus_changed");
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    let PhysicalKey::Code(code) = event.physical_key else {
                        return;
                    };
                    if event.repeat {
                        return;
                    }
                    match (code, event.state) {
                        (KeyCode::Escape, ElementState::Pressed) => {
                            info!(reason = "escape_key", "shutdown_requested");
                            window_target.exit();
                        }
                        (KeyCode::F3, ElementState::Pressed) => {
                            let debug = game_loop.engine_mut().debug_mut();
                            let visible = !debug.fps;
                            debug.fps = visible;
                            debug.room_info = visible;
                            debug.collision_masks = visible;
                            info!(visible, "debug_overlay_toggled");
                        }
                        _ => input.handle_key(code, event.state),
                    }
                }
                WindowEvent::CursorMoved { position, .. } => {
                    input.set_cursor(renderer.window_to_base(position.x as f32, position.y as f32));
                }
                WindowEvent::CursorLeft { .. } => input.set_cursor(None),
                WindowEvent::MouseInput { state, button, .. } => {
                    input.handle_mouse_button(button, state);
                }
                WindowEvent::RedrawRequested => {
                    let now = Instant::now();
                    game_loop.frame(now, focused, &mut input, &mut canvas);
                    if let Err(error) = renderer.present(&canvas) {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }
                    if let Some(metrics) = game_loop.take_metrics() {
                        let engine = game_loop.engine();
                        info!(
                            fps = metrics.fps,
                            frame_time_ms = metrics.frame_time_ms,
                            callbacks_per_second = metrics.callbacks_per_second,
                            entity_count = engine.instances().len(),
                            room = %engine.room().name,
                            "loop_metrics"
                        );
                    }
                }
                _ => {}
            },
            Event::AboutToWait => window.request_redraw(),
            Event::LoopExiting => info!("shutdown"),
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn resolve_run_unfocused(config_value: bool) -> bool {
    match env::var(RUN_UNFOCUSED_ENV_VAR) {
        Ok(value) => parse_flag(&value).unwrap_or_else(|| {
            warn!(
                env_var = RUN_UNFOCUSED_ENV_VAR,
                value = value.as_str(),
                "invalid run-unfocused env var value; falling back to config"
            );
            config_value
        }),
        Err(env::VarError::NotPresent) => config_value,
        Err(err) => {
            warn!(
                env_var = RUN_UNFOCUSED_ENV_VAR,
                error = %err,
                "unable to read run-unfocused env var; falling back to config"
            );
            config_value
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
