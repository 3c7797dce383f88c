#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraBounds {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

/// Top-left corner of the view in world space, optionally kept inside a
/// region of the room.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    x: f32,
    y: f32,
    view_width: f32,
    view_height: f32,
    bounds: Option<CameraBounds>,
}

impl Camera {
    pub fn new(view_width: u32, view_height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            view_width: view_width as f32,
            view_height: view_height as f32,
            bounds: None,
        }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn bounds(&self) -> Option<CameraBounds> {
        self.bounds
    }

    pub fn set_position(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
        self.clamp_to_bounds();
    }

    /// Centres the view on a world point, then applies bounds.
    pub fn center_on(&mut self, x: f32, y: f32) {
        self.set_position(
            x - (self.view_width / 2.0).floor(),
            y - (self.view_height / 2.0).floor(),
        );
    }

    pub fn bind(&mut self, bounds: CameraBounds) {
        self.bounds = Some(bounds);
        self.clamp_to_bounds();
    }

    pub fn unbind(&mut self) {
        self.bounds = None;
    }

    pub fn reset(&mut self) {
        self.x = 0.0;
        self.y = 0.0;
        self.bounds = None;
    }

    fn clamp_to_bounds(&mut self) {
        let Some(bounds) = self.bounds else {
            return;
        };
        self.x = clamp_axis(self.x, bounds.left, bounds.right - self.view_width);
        self.y = clamp_axis(self.y, bounds.top, bounds.bottom - self.view_height);
    }
}

/// Regions smaller than the view pin the camera to their start.
fn clamp_axis(value: f32, min: f32, max: f32) -> f32 {
    if max < min {
        min
    } else {
        value.clamp(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_keep_view_inside_region() {
        let mut camera = Camera::new(100, 50);
        camera.bind(CameraBounds {
            left: 0.0,
            right: 400.0,
            top: 0.0,
            bottom: 200.0,
        });
        camera.set_position(-20.0, 500.0);
        assert_eq!((camera.x(), camera.y()), (0.0, 150.0));
        camera.center_on(390.0, 10.0);
        assert_eq!((camera.x(), camera.y()), (300.0, 0.0));
    }

    #[test]
    fn small_region_pins_to_start() {
        let mut camera = Camera::new(100, 100);
        camera.bind(CameraBounds {
            left: 10.0,
            right: 50.0,
            top: 0.0,
            bottom: 500.0,
        });
        camera.set_position(30.0, 30.0);
        assert_eq!((camera.x(), camera.y()), (10.0, 30.0));
    }

    #[test]
    fn reset_returns_to_origin_and_unbinds() {
        let mut camera = Camera::new(10, 10);
        camera.bind(CameraBounds {
            left: 5.0,
            right: 100.0,
            top: 5.0,
            bottom: 100.0,
        });
        camera.reset();
        assert_eq!((camera.x(), camera.y()), (0.0, 0.0));
        assert!(camera.bounds().is_none());
        camera.set_position(-3.0, -3.0);
        assert_eq!(camera.x(), -3.0);
    }
}
