use std::collections::HashSet;

use tracing::warn;

use super::canvas::{Canvas, SourceRect};
use super::transform::{world_to_screen, SpriteTransform};
use super::overlay::{
    draw_panel, draw_text, text_width, ACTION_POINT_COLOR, MAP_MASK_COLOR, MASK_COLOR,
    MASK_HIT_COLOR, MASK_HOVER_COLOR, ORIGIN_COLOR, TEXT_COLOR,
};
use crate::app::overlay_alpha;
use crate::app::{Camera, Engine};
use crate::entity::{Active, Backdrop, ColliderShape, Entity, Instance, Layer, Paragraph};

const PAUSED_LABEL: &str = "PAUSED";

/// Draws one frame of the engine state into `canvas`: room background,
/// layers in draw order, debug overlays, fade overlay, paused overlay.
pub(crate) fn draw_frame(
    engine: &Engine,
    canvas: &mut Canvas,
    paused: bool,
    warned: &mut HashSet<String>,
) {
    canvas.clear(engine.room_settings.background);
    let camera = &engine.camera;

    for layer in Layer::ALL {
        for &id in engine.registry.draw_order(layer) {
            let Some(instance) = engine.registry.get(id) else {
                continue;
            };
            let entity = instance.as_entity();
            if !entity.is_visible() || entity.opacity() <= 0.0 {
                continue;
            }
            match instance {
                Instance::Active(active) => draw_active(canvas, active, camera, warned),
                Instance::Backdrop(backdrop) => draw_backdrop(canvas, backdrop, camera),
                Instance::Paragraph(paragraph) => draw_paragraph(canvas, paragraph, camera),
            }
        }
    }

    draw_debug(canvas, engine);

    let alpha = overlay_alpha(engine.transition.fade_level);
    if alpha > 0.0 {
        let color = engine.transition.fade_color;
        canvas.fill_rect(
            0,
            0,
            canvas.width() as i32,
            canvas.height() as i32,
            [color.r, color.g, color.b, 255],
            alpha,
        );
    }

    if paused {
        draw_paused(canvas);
    }
}

fn draw_active(canvas: &mut Canvas, active: &Active, camera: &Camera, warned: &mut HashSet<String>) {
    let Some(animation) = active.current_animation() else {
        warn_once(warned, format!("{}:no_animation", active.name()), || {
            warn!(active = active.name(), "active_without_animation");
        });
        return;
    };
    let Some(image) = animation.image.as_ref() else {
        let animation_name = active.animation_name().unwrap_or_default();
        warn_once(warned, format!("{}:{}", active.name(), animation_name), || {
            warn!(active = active.name(), animation = animation_name, "animation_image_missing");
        });
        return;
    };

    let source = SourceRect {
        x: (active.animation_frame().saturating_sub(1)) * animation.frame_width,
        y: 0,
        width: animation.frame_width,
        height: animation.frame_height,
    };
    let mut transform = active.sprite_transform();
    transform.origin_x -= camera.x();
    transform.origin_y -= camera.y();
    canvas.draw_image(image, source, &transform, active.opacity());
}

fn draw_backdrop(canvas: &mut Canvas, backdrop: &Backdrop, camera: &Camera) {
    canvas.draw_backdrop(
        backdrop.image(),
        (
            backdrop.x() - camera.x(),
            backdrop.y() - camera.y(),
            backdrop.width(),
            backdrop.height(),
        ),
        backdrop.is_mosaic(),
        backdrop.opacity(),
    );
}

fn draw_paragraph(canvas: &mut Canvas, paragraph: &Paragraph, camera: &Camera) {
    let font = paragraph.font();
    let mut line_y = paragraph.y() - camera.y();
    for line in paragraph.lines() {
        let mut glyph_x = paragraph.line_start_x(line) - camera.x();
        for ch in line.chars() {
            if let Some((glyph_left, glyph_top)) = font.glyph_origin(ch) {
                let source = SourceRect {
                    x: glyph_left,
                    y: glyph_top,
                    width: font.char_width,
                    height: font.char_height,
                };
                let transform = SpriteTransform::at(glyph_x, line_y);
                canvas.draw_image(&font.image, source, &transform, paragraph.opacity());
            }
            glyph_x += font.char_width as f32;
        }
        line_y += paragraph.line_height();
    }
}

fn draw_debug(canvas: &mut Canvas, engine: &Engine) {
    let debug = engine.debug;
    let camera = &engine.camera;

    if debug.collision_masks {
        if let Some(map) = engine.collision_map.as_ref() {
            for (_, rects) in map.categories() {
                for rect in rects {
                    canvas.outline_rect(
                        (rect.x - camera.x()).floor() as i32,
                        (rect.y - camera.y()).floor() as i32,
                        rect.width.round() as i32,
                        rect.height.round() as i32,
                        MAP_MASK_COLOR,
                    );
                }
            }
        }
    }

    for &id in engine.registry.actives() {
        let Ok(active) = engine.registry.active(id) else {
            continue;
        };
        if debug.collision_masks {
            let collider = active.collider();
            let color = if collider.collided() {
                MASK_HIT_COLOR
            } else if collider.mouse_over() {
                MASK_HOVER_COLOR
            } else {
                MASK_COLOR
            };
            let (x, y) = world_to_screen(collider.x(), collider.y(), camera);
            match collider.shape() {
                ColliderShape::Rectangle => canvas.outline_rect(
                    x.floor() as i32,
                    y.floor() as i32,
                    collider.width().round() as i32,
                    collider.height().round() as i32,
                    color,
                ),
                ColliderShape::Circle => canvas.outline_circle(
                    x.round() as i32,
                    y.round() as i32,
                    collider.radius().round() as i32,
                    color,
                ),
                ColliderShape::None => {}
            }
        }
        if debug.origin_points {
            let (x, y) = world_to_screen(active.x(), active.y(), camera);
            canvas.cross(x.round() as i32, y.round() as i32, 2, ORIGIN_COLOR);
        }
        if debug.action_points {
            let (x, y) = active.action_point();
            let (x, y) = world_to_screen(x, y, camera);
            canvas.cross(x.round() as i32, y.round() as i32, 1, ACTION_POINT_COLOR);
        }
    }

    let mut lines = Vec::new();
    if debug.fps {
        lines.push(format!("FPS {:.0}", engine.fps()));
    }
    if debug.room_info {
        let room = &engine.room_settings;
        lines.push(format!("ROOM {} {}x{}", room.name, room.width, room.height));
        lines.push(format!("CAM {:.0},{:.0}", camera.x(), camera.y()));
        lines.push(format!(
            "MOUSE {:.0},{:.0}",
            engine.mouse_world_x(),
            engine.mouse_world_y()
        ));
        lines.push(format!(
            "ENT {} TASKS {}",
            engine.registry.len(),
            engine.scheduler.pending()
        ));
    }
    draw_panel(canvas, &lines);
}

fn draw_paused(canvas: &mut Canvas) {
    let (width, height) = (canvas.width() as i32, canvas.height() as i32);
    canvas.fill_rect(0, 0, width, height, [0, 0, 0, 255], 0.5);
    let x = (width - text_width(PAUSED_LABEL)) / 2;
    let y = height / 2 - 2;
    draw_text(canvas, x, y, PAUSED_LABEL, TEXT_COLOR);
}

fn warn_once(warned: &mut HashSet<String>, key: String, log: impl FnOnce()) {
    if warned.insert(key) {
        log();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{ChangeRoomOptions, LoopConfig, Rgb, Room};
    use crate::audio::SilentAudio;
    use crate::content::{ActiveDef, AnimationDef, AssetDatabase, ImageData};

    struct Plain;

    impl Room for Plain {
        fn name(&self) -> &str {
            "plain"
        }

        fn load(&mut self, engine: &mut Engine) {
            engine.set_room_background_color(0, 0, 255);
        }
    }

    fn engine_with_block() -> Engine {
        let mut assets = AssetDatabase::new();
        assets
            .register_active(ActiveDef::new("block").with_animation(
                "default",
                AnimationDef::from_strip(ImageData::solid(4, 4, [255, 0, 0, 255]), 1, 1),
            ))
            .expect("register");
        let config = LoopConfig {
            base_width: 16,
            base_height: 16,
            ..LoopConfig::default()
        };
        let mut engine = Engine::new(&config, assets, Box::new(SilentAudio::new()));
        engine.change_room(|| Plain, ChangeRoomOptions::default());
        engine
    }

    #[test]
    fn background_and_active_are_drawn_relative_to_camera() {
        let mut engine = engine_with_block();
        engine
            .add_active(Layer::Foreground, "block", 10.0, 10.0)
            .expect("spawn");
        engine.set_camera(8.0, 8.0);
        let mut canvas = Canvas::new(16, 16);
        engine.draw(&mut canvas, false);
        assert_eq!(canvas.pixel(0, 0), Some([0, 0, 255, 255]));
        assert_eq!(canvas.pixel(2, 2), Some([255, 0, 0, 255]));
        assert_eq!(canvas.pixel(6, 6), Some([0, 0, 255, 255]));
    }

    #[test]
    fn hidden_entities_are_skipped() {
        let mut engine = engine_with_block();
        let id = engine
            .add_active(Layer::Foreground, "block", 0.0, 0.0)
            .expect("spawn");
        engine.active_mut(id).expect("active").set_visible(false);
        let mut canvas = Canvas::new(16, 16);
        engine.draw(&mut canvas, false);
        assert_eq!(canvas.pixel(1, 1), Some([0, 0, 255, 255]));
    }

    #[test]
    fn fade_overlay_covers_frame_at_zero_level() {
        let mut engine = engine_with_block();
        engine.transition.fade_level = 0.0;
        engine.transition.fade_color = Rgb::WHITE;
        let mut canvas = Canvas::new(16, 16);
        engine.draw(&mut canvas, false);
        assert_eq!(canvas.pixel(8, 8), Some([255, 255, 255, 255]));
    }

    #[test]
    fn paused_overlay_darkens_frame() {
        let mut engine = engine_with_block();
        engine.set_room_background_color(200, 200, 200);
        let mut canvas = Canvas::new(16, 16);
        engine.draw(&mut canvas, true);
        assert_eq!(canvas.pixel(0, 0), Some([100, 100, 100, 255]));
    }
}
