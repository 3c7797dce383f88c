use std::sync::Arc;

use super::collision::{Collider, ColliderShape};
use super::{Entity, EntityBase, Layer};
use crate::app::SpriteTransform;
use crate::content::{ActiveDef, AnimationDef};

/// Animated, collidable entity instantiated from an [`ActiveDef`].
#[derive(Debug, Clone)]
pub struct Active {
    base: EntityBase,
    def: Arc<ActiveDef>,
    angle: f32,
    scale_x: f32,
    scale_y: f32,
    flipped_horizontally: bool,
    flipped_vertically: bool,
    collider: Collider,
    animation: Option<String>,
    frame: u32,
    frame_timer: u32,
}

impl Active {
    pub fn new(def: Arc<ActiveDef>, layer: Layer, x: f32, y: f32) -> Self {
        let collider = Collider::from_def(def.collider(), x, y);
        let animation = def.initial_animation().map(str::to_string);
        Self {
            base: EntityBase::new(def.name(), layer, x, y),
            def,
            angle: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            flipped_horizontally: false,
            flipped_vertically: false,
            collider,
            animation,
            frame: 1,
            frame_timer: 0,
        }
    }

    pub fn def(&self) -> &ActiveDef {
        &self.def
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn set_angle(&mut self, degrees: f32) {
        self.angle = degrees;
    }

    pub fn rotate(&mut self, degrees: f32) {
        self.angle += degrees;
    }

    /// Points the active at a world position.
    pub fn look_at(&mut self, x: f32, y: f32) {
        let dx = x - self.x();
        let dy = y - self.y();
        self.angle = dy.atan2(dx).to_degrees();
    }

    pub fn scale_x(&self) -> f32 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f32 {
        self.scale_y
    }

    pub fn set_scale_x(&mut self, scale: f32) {
        self.scale_x = scale;
    }

    pub fn set_scale_y(&mut self, scale: f32) {
        self.scale_y = scale;
    }

    pub fn scale_by(&mut self, dx: f32, dy: f32) {
        self.scale_x += dx;
        self.scale_y += dy;
    }

    pub fn is_flipped_horizontally(&self) -> bool {
        self.flipped_horizontally
    }

    pub fn is_flipped_vertically(&self) -> bool {
        self.flipped_vertically
    }

    /// `None` toggles the current state.
    pub fn flip_horizontally(&mut self, flipped: Option<bool>) {
        self.flipped_horizontally = flipped.unwrap_or(!self.flipped_horizontally);
    }

    pub fn flip_vertically(&mut self, flipped: Option<bool>) {
        self.flipped_vertically = flipped.unwrap_or(!self.flipped_vertically);
    }

    pub fn animation_name(&self) -> Option<&str> {
        self.animation.as_deref()
    }

    pub fn animation_frame(&self) -> u32 {
        self.frame
    }

    pub fn current_animation(&self) -> Option<&AnimationDef> {
        self.animation
            .as_deref()
            .and_then(|name| self.def.animation(name))
    }

    /// Switches animation. Names this active does not define are rejected
    /// and leave the current animation untouched. Replaying the current
    /// animation only restarts it when `force_restart` is set.
    pub fn play_animation(&mut self, name: &str, force_restart: bool) -> bool {
        if !self.def.has_animation(name) {
            return false;
        }
        let changed = self.animation.as_deref() != Some(name);
        if changed {
            self.animation = Some(name.to_string());
        }
        if changed || force_restart {
            self.frame = 1;
            self.frame_timer = 0;
        }
        true
    }

    /// One tick of frame advance; no-op without a current animation.
    pub fn advance_animation(&mut self) {
        let Some((frame_count, frame_duration)) = self
            .current_animation()
            .map(|animation| (animation.frame_count, animation.frame_duration))
        else {
            return;
        };
        self.frame_timer += 1;
        if self.frame_timer > frame_duration {
            self.frame += 1;
            self.frame_timer = 0;
        }
        if self.frame > frame_count {
            self.frame = 1;
        }
    }

    pub fn sprite_width(&self) -> u32 {
        self.current_animation().map_or(0, |animation| animation.frame_width)
    }

    pub fn sprite_height(&self) -> u32 {
        self.current_animation().map_or(0, |animation| animation.frame_height)
    }

    /// Width of the axis-aligned box around the scaled, rotated frame.
    pub fn transformed_sprite_width(&self) -> f32 {
        let (width, height, sin, cos) = self.transformed_terms();
        (width * cos + height * sin).round()
    }

    pub fn transformed_sprite_height(&self) -> f32 {
        let (width, height, sin, cos) = self.transformed_terms();
        (width * sin + height * cos).round()
    }

    fn transformed_terms(&self) -> (f32, f32, f32, f32) {
        let width = self.sprite_width() as f32 * self.scale_x.abs();
        let height = self.sprite_height() as f32 * self.scale_y.abs();
        let (sin, cos) = self.angle.to_radians().sin_cos();
        (width, height, sin.abs(), cos.abs())
    }

    /// Sprite placement around the entity origin, flips folded into scale.
    pub fn sprite_transform(&self) -> SpriteTransform {
        let (offset_x, offset_y) = self
            .current_animation()
            .map_or((0.0, 0.0), |animation| {
                (animation.offset_x as f32, animation.offset_y as f32)
            });
        SpriteTransform {
            origin_x: self.x(),
            origin_y: self.y(),
            offset_x,
            offset_y,
            scale_x: if self.flipped_horizontally { -self.scale_x } else { self.scale_x },
            scale_y: if self.flipped_vertically { -self.scale_y } else { self.scale_y },
            angle_degrees: self.angle,
        }
    }

    /// Action point of the current frame in world space.
    pub fn action_point(&self) -> (f32, f32) {
        match self.current_animation() {
            Some(animation) => {
                let (x, y) = animation.action_point(self.frame);
                self.sprite_transform().forward(x as f32, y as f32)
            }
            None => (self.x(), self.y()),
        }
    }

    pub fn collider(&self) -> &Collider {
        &self.collider
    }

    pub(crate) fn collider_mut(&mut self) -> &mut Collider {
        &mut self.collider
    }

    pub fn is_colliding(&self) -> bool {
        self.collider.collided()
    }

    pub fn is_mouse_over(&self) -> bool {
        self.collider.mouse_over()
    }

    pub fn left_edge(&self) -> f32 {
        self.edges().0
    }

    pub fn top_edge(&self) -> f32 {
        self.edges().1
    }

    pub fn right_edge(&self) -> f32 {
        self.edges().2
    }

    pub fn bottom_edge(&self) -> f32 {
        self.edges().3
    }

    fn edges(&self) -> (f32, f32, f32, f32) {
        match self.collider.shape() {
            ColliderShape::None => (self.x(), self.y(), self.x(), self.y()),
            _ => self.collider.bounds(),
        }
    }
}

impl Entity for Active {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }

    fn set_position(&mut self, x: f32, y: f32) {
        self.base.x = x;
        self.base.y = y;
        self.collider.sync_to(x, y);
    }
}
