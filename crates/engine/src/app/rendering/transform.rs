use crate::app::Camera;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Camera position is the top-left corner of the view, so screen pixels are
/// plain world offsets from it.
pub fn world_to_screen(world_x: f32, world_y: f32, camera: &Camera) -> (f32, f32) {
    (world_x - camera.x(), world_y - camera.y())
}

pub fn screen_to_world(screen_x: f32, screen_y: f32, camera: &Camera) -> (f32, f32) {
    (screen_x + camera.x(), screen_y + camera.y())
}

/// Maps sprite-local pixel coordinates to positions around an origin:
/// offset first, then scale (negative for flips), then rotation about the
/// origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpriteTransform {
    pub origin_x: f32,
    pub origin_y: f32,
    pub offset_x: f32,
    pub offset_y: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub angle_degrees: f32,
}

impl Default for SpriteTransform {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            offset_x: 0.0,
            offset_y: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            angle_degrees: 0.0,
        }
    }
}

impl SpriteTransform {
    pub fn at(origin_x: f32, origin_y: f32) -> Self {
        Self {
            origin_x,
            origin_y,
            ..Self::default()
        }
    }

    pub fn forward(&self, local_x: f32, local_y: f32) -> (f32, f32) {
        let x = (local_x + self.offset_x) * self.scale_x;
        let y = (local_y + self.offset_y) * self.scale_y;
        let (sin, cos) = self.angle_degrees.to_radians().sin_cos();
        (
            self.origin_x + x * cos - y * sin,
            self.origin_y + x * sin + y * cos,
        )
    }

    /// Inverse of [`forward`](Self::forward); `None` when a scale axis is zero.
    pub fn inverse(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        if self.scale_x == 0.0 || self.scale_y == 0.0 {
            return None;
        }
        let dx = x - self.origin_x;
        let dy = y - self.origin_y;
        let (sin, cos) = self.angle_degrees.to_radians().sin_cos();
        let rx = dx * cos + dy * sin;
        let ry = -dx * sin + dy * cos;
        Some((rx / self.scale_x - self.offset_x, ry / self.scale_y - self.offset_y))
    }

    /// Axis-aligned `(min_x, min_y, max_x, max_y)` of a `width` x `height` sprite.
    pub fn bounds(&self, width: f32, height: f32) -> (f32, f32, f32, f32) {
        let corners = [
            self.forward(0.0, 0.0),
            self.forward(width, 0.0),
            self.forward(0.0, height),
            self.forward(width, height),
        ];
        corners.iter().fold(
            (f32::MAX, f32::MAX, f32::MIN, f32::MIN),
            |(min_x, min_y, max_x, max_y), &(x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: (f32, f32), b: (f32, f32)) -> bool {
        (a.0 - b.0).abs() < 1e-4 && (a.1 - b.1).abs() < 1e-4
    }

    #[test]
    fn camera_offset_shifts_screen_position() {
        let mut camera = Camera::new(100, 100);
        camera.set_position(10.0, -5.0);
        assert_eq!(world_to_screen(12.0, -4.0, &camera), (2.0, 1.0));
        assert_eq!(screen_to_world(2.0, 1.0, &camera), (12.0, -4.0));
    }

    #[test]
    fn offset_and_scale_apply_before_rotation() {
        let transform = SpriteTransform {
            origin_x: 10.0,
            origin_y: 10.0,
            offset_x: -2.0,
            offset_y: 0.0,
            scale_x: 2.0,
            scale_y: 1.0,
            angle_degrees: 90.0,
        };
        assert!(close(transform.forward(3.0, 0.0), (10.0, 12.0)));
    }

    #[test]
    fn negative_scale_mirrors_about_origin() {
        let mut transform = SpriteTransform::at(5.0, 5.0);
        transform.scale_x = -1.0;
        assert!(close(transform.forward(2.0, 1.0), (3.0, 6.0)));
    }

    #[test]
    fn inverse_round_trips_forward() {
        let transform = SpriteTransform {
            origin_x: 3.0,
            origin_y: -7.0,
            offset_x: -4.0,
            offset_y: -4.0,
            scale_x: -1.5,
            scale_y: 0.5,
            angle_degrees: 33.0,
        };
        let screen = transform.forward(6.0, 2.0);
        let local = transform.inverse(screen.0, screen.1).expect("invertible");
        assert!(close(local, (6.0, 2.0)));

        let degenerate = SpriteTransform {
            scale_x: 0.0,
            ..transform
        };
        assert!(degenerate.inverse(0.0, 0.0).is_none());
    }

    #[test]
    fn bounds_cover_rotated_sprite() {
        let transform = SpriteTransform {
            angle_degrees: 90.0,
            ..SpriteTransform::at(0.0, 0.0)
        };
        let (min_x, min_y, max_x, max_y) = transform.bounds(4.0, 2.0);
        assert!((min_x + 2.0).abs() < 1e-4);
        assert!(min_y.abs() < 1e-4);
        assert!(max_x.abs() < 1e-4);
        assert!((max_y - 4.0).abs() < 1e-4);
    }
}
