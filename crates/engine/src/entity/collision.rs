use std::collections::HashMap;

use serde::Deserialize;

use crate::content::ColliderDef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum ColliderShape {
    #[default]
    None,
    Rectangle,
    Circle,
}

/// World-space collision volume of an active. Rectangle position is the
/// top-left corner, circle position is the centre.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Collider {
    shape: ColliderShape,
    x: f32,
    y: f32,
    offset_x: f32,
    offset_y: f32,
    width: f32,
    height: f32,
    radius: f32,
    collided: bool,
    mouse_over: bool,
}

impl Collider {
    pub fn from_def(def: &ColliderDef, origin_x: f32, origin_y: f32) -> Self {
        let mut collider = Self {
            shape: def.shape,
            offset_x: def.offset_x,
            offset_y: def.offset_y,
            width: def.width,
            height: def.height,
            radius: def.radius,
            ..Self::default()
        };
        collider.sync_to(origin_x, origin_y);
        collider
    }

    pub fn rectangle(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::from_def(&ColliderDef::rectangle(0.0, 0.0, width, height), x, y)
    }

    pub fn circle(x: f32, y: f32, radius: f32) -> Self {
        Self::from_def(&ColliderDef::circle(0.0, 0.0, radius), x, y)
    }

    pub fn shape(&self) -> ColliderShape {
        self.shape
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn collided(&self) -> bool {
        self.collided
    }

    pub fn mouse_over(&self) -> bool {
        self.mouse_over
    }

    /// `(left, top, right, bottom)`; `None` shapes collapse to their anchor.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        match self.shape {
            ColliderShape::Rectangle => (self.x, self.y, self.x + self.width, self.y + self.height),
            ColliderShape::Circle => (
                self.x - self.radius,
                self.y - self.radius,
                self.x + self.radius,
                self.y + self.radius,
            ),
            ColliderShape::None => (self.x, self.y, self.x, self.y),
        }
    }

    pub(crate) fn sync_to(&mut self, origin_x: f32, origin_y: f32) {
        self.x = origin_x + self.offset_x;
        self.y = origin_y + self.offset_y;
    }

    pub(crate) fn reset_flags(&mut self) {
        self.collided = false;
        self.mouse_over = false;
    }

    pub(crate) fn mark_collided(&mut self) {
        self.collided = true;
    }
}

/// Pure overlap test, no flags touched.
pub fn shapes_overlap(a: &Collider, b: &Collider) -> bool {
    match (a.shape, b.shape) {
        (ColliderShape::None, _) | (_, ColliderShape::None) => false,
        (ColliderShape::Rectangle, ColliderShape::Rectangle) => {
            a.x < b.x + b.width
                && b.x < a.x + a.width
                && a.y < b.y + b.height
                && b.y < a.y + a.height
        }
        (ColliderShape::Circle, ColliderShape::Circle) => {
            let dx = a.x - b.x;
            let dy = a.y - b.y;
            let reach = a.radius + b.radius;
            dx * dx + dy * dy < reach * reach
        }
        (ColliderShape::Rectangle, ColliderShape::Circle) => rect_circle_overlap(a, b),
        (ColliderShape::Circle, ColliderShape::Rectangle) => rect_circle_overlap(b, a),
    }
}

fn rect_circle_overlap(rect: &Collider, circle: &Collider) -> bool {
    let closest_x = circle.x.clamp(rect.x, rect.x + rect.width);
    let closest_y = circle.y.clamp(rect.y, rect.y + rect.height);
    let dx = circle.x - closest_x;
    let dy = circle.y - closest_y;
    dx * dx + dy * dy <= circle.radius * circle.radius
}

/// Overlap test that marks both colliders on a hit.
pub fn test_shapes(a: &mut Collider, b: &mut Collider) -> bool {
    let hit = shapes_overlap(a, b);
    if hit {
        a.collided = true;
        b.collided = true;
    }
    hit
}

pub fn contains_point(collider: &Collider, x: f32, y: f32) -> bool {
    match collider.shape {
        ColliderShape::None => false,
        ColliderShape::Rectangle => {
            x >= collider.x
                && x < collider.x + collider.width
                && y >= collider.y
                && y < collider.y + collider.height
        }
        ColliderShape::Circle => {
            let dx = x - collider.x;
            let dy = y - collider.y;
            dx * dx + dy * dy < collider.radius * collider.radius
        }
    }
}

/// Point test that marks the collider as hovered on a hit.
pub fn hover_test(collider: &mut Collider, x: f32, y: f32) -> bool {
    let hit = contains_point(collider, x, y);
    if hit {
        collider.mouse_over = true;
    }
    hit
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MaskRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl MaskRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    fn as_collider(&self) -> Collider {
        Collider::rectangle(self.x, self.y, self.width, self.height)
    }
}

/// Static collision rectangles grouped by category, bound per room.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct CollisionMap {
    categories: HashMap<String, Vec<MaskRect>>,
}

impl CollisionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_category(mut self, name: impl Into<String>, rects: Vec<MaskRect>) -> Self {
        self.insert(name, rects);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, rects: Vec<MaskRect>) {
        self.categories.insert(name.into(), rects);
    }

    pub fn category(&self, name: &str) -> Option<&[MaskRect]> {
        self.categories.get(name).map(Vec::as_slice)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &[MaskRect])> {
        self.categories
            .iter()
            .map(|(name, rects)| (name.as_str(), rects.as_slice()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    pub index: usize,
    pub rect: MaskRect,
}

/// Result of testing against a collision map category.
#[derive(Debug, Clone, PartialEq)]
pub enum MaskTest {
    /// No map bound, or the category does not exist.
    Unavailable,
    Clear,
    Hits(Vec<HitRecord>),
}

impl MaskTest {
    pub fn is_hit(&self) -> bool {
        matches!(self, MaskTest::Hits(_))
    }

    pub fn hits(&self) -> &[HitRecord] {
        match self {
            MaskTest::Hits(hits) => hits,
            _ => &[],
        }
    }
}

pub fn test_against_masks(
    collider: &mut Collider,
    map: Option<&CollisionMap>,
    category: &str,
) -> MaskTest {
    let Some(rects) = map.and_then(|map| map.category(category)) else {
        return MaskTest::Unavailable;
    };

    let hits: Vec<HitRecord> = rects
        .iter()
        .enumerate()
        .filter(|(_, rect)| shapes_overlap(collider, &rect.as_collider()))
        .map(|(index, rect)| HitRecord { index, rect: *rect })
        .collect();

    if hits.is_empty() {
        MaskTest::Clear
    } else {
        collider.collided = true;
        MaskTest::Hits(hits)
    }
}
