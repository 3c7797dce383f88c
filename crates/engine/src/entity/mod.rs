mod active;
mod backdrop;
mod collision;
mod paragraph;
mod registry;

pub use active::Active;
pub use backdrop::{Backdrop, BackdropOptions};
pub use collision::{
    contains_point, hover_test, shapes_overlap, test_against_masks, test_shapes, Collider,
    ColliderShape, CollisionMap, HitRecord, MaskRect, MaskTest,
};
pub use paragraph::{Paragraph, ParagraphOptions, TextAlign};
pub use registry::{EntityId, EntityKind, Instance, InstanceRegistry, Layer, RegistryError};

/// State shared by every drawable entity kind.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityBase {
    name: String,
    x: f32,
    y: f32,
    visible: bool,
    opacity: f32,
    layer: Layer,
}

impl EntityBase {
    pub fn new(name: impl Into<String>, layer: Layer, x: f32, y: f32) -> Self {
        Self {
            name: name.into(),
            x,
            y,
            visible: true,
            opacity: 1.0,
            layer,
        }
    }
}

pub trait Entity {
    fn base(&self) -> &EntityBase;
    fn base_mut(&mut self) -> &mut EntityBase;

    fn name(&self) -> &str {
        &self.base().name
    }

    fn layer(&self) -> Layer {
        self.base().layer
    }

    fn x(&self) -> f32 {
        self.base().x
    }

    fn y(&self) -> f32 {
        self.base().y
    }

    fn set_position(&mut self, x: f32, y: f32) {
        let base = self.base_mut();
        base.x = x;
        base.y = y;
    }

    fn set_x(&mut self, x: f32) {
        let y = self.y();
        self.set_position(x, y);
    }

    fn set_y(&mut self, y: f32) {
        let x = self.x();
        self.set_position(x, y);
    }

    fn move_by(&mut self, dx: f32, dy: f32) {
        let (x, y) = (self.x(), self.y());
        self.set_position(x + dx, y + dy);
    }

    fn is_visible(&self) -> bool {
        self.base().visible
    }

    fn set_visible(&mut self, visible: bool) {
        self.base_mut().visible = visible;
    }

    fn opacity(&self) -> f32 {
        self.base().opacity
    }

    /// Clamped to `[0, 1]`; NaN is ignored.
    fn set_opacity(&mut self, opacity: f32) {
        if opacity.is_nan() {
            return;
        }
        self.base_mut().opacity = opacity.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Marker(EntityBase);

    impl Entity for Marker {
        fn base(&self) -> &EntityBase {
            &self.0
        }

        fn base_mut(&mut self) -> &mut EntityBase {
            &mut self.0
        }
    }

    #[test]
    fn opacity_is_clamped_and_nan_ignored() {
        let mut marker = Marker(EntityBase::new("m", Layer::Foreground, 0.0, 0.0));
        marker.set_opacity(1.5);
        assert_eq!(marker.opacity(), 1.0);
        marker.set_opacity(-0.5);
        assert_eq!(marker.opacity(), 0.0);
        marker.set_opacity(f32::NAN);
        assert_eq!(marker.opacity(), 0.0);
    }

    #[test]
    fn move_by_goes_through_set_position() {
        let mut marker = Marker(EntityBase::new("m", Layer::Background, 1.0, 2.0));
        marker.move_by(3.0, -1.0);
        assert_eq!((marker.x(), marker.y()), (4.0, 1.0));
        marker.set_x(0.0);
        assert_eq!((marker.x(), marker.y()), (0.0, 1.0));
        assert_eq!(marker.layer(), Layer::Background);
    }
}
