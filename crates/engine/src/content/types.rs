use std::sync::Arc;

use thiserror::Error;

use crate::entity::ColliderShape;

/// Pre-decoded RGBA8 image handed over by the resource layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    width: u32,
    height: u32,
    rgba: Arc<[u8]>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self, ContentError> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(ContentError::ImageSize {
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba: rgba.into(),
        })
    }

    pub fn solid(width: u32, height: u32, color: [u8; 4]) -> Self {
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            rgba.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            rgba: rgba.into(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn rgba(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 4;
        let bytes = self.rgba.get(offset..offset + 4)?;
        Some([bytes[0], bytes[1], bytes[2], bytes[3]])
    }
}

/// Collision volume attached to every instance of an active definition.
/// Offsets are relative to the entity origin; for rectangles the offset
/// locates the top-left corner, for circles the centre.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ColliderDef {
    pub shape: ColliderShape,
    pub offset_x: f32,
    pub offset_y: f32,
    pub width: f32,
    pub height: f32,
    pub radius: f32,
}

impl ColliderDef {
    pub fn rectangle(offset_x: f32, offset_y: f32, width: f32, height: f32) -> Self {
        Self {
            shape: ColliderShape::Rectangle,
            offset_x,
            offset_y,
            width,
            height,
            radius: 0.0,
        }
    }

    pub fn circle(offset_x: f32, offset_y: f32, radius: f32) -> Self {
        Self {
            shape: ColliderShape::Circle,
            offset_x,
            offset_y,
            width: 0.0,
            height: 0.0,
            radius,
        }
    }
}

/// One animation strip: frames laid out left to right in `image`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationDef {
    pub frame_count: u32,
    pub frame_duration: u32,
    pub frame_width: u32,
    pub frame_height: u32,
    pub offset_x: i32,
    pub offset_y: i32,
    pub action_points: Vec<(i32, i32)>,
    pub image: Option<ImageData>,
}

impl AnimationDef {
    pub fn from_strip(image: ImageData, frame_count: u32, frame_duration: u32) -> Self {
        let frame_count = frame_count.max(1);
        Self {
            frame_count,
            frame_duration,
            frame_width: image.width() / frame_count,
            frame_height: image.height(),
            offset_x: 0,
            offset_y: 0,
            action_points: vec![(0, 0); frame_count as usize],
            image: Some(image),
        }
    }

    pub fn with_offset(mut self, offset_x: i32, offset_y: i32) -> Self {
        self.offset_x = offset_x;
        self.offset_y = offset_y;
        self
    }

    pub fn with_action_points(mut self, action_points: Vec<(i32, i32)>) -> Self {
        self.action_points = action_points;
        self
    }

    /// Action point of a 1-based frame, `(0, 0)` when out of range.
    pub fn action_point(&self, frame: u32) -> (i32, i32) {
        frame
            .checked_sub(1)
            .and_then(|index| self.action_points.get(index as usize))
            .copied()
            .unwrap_or((0, 0))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActiveDef {
    name: String,
    animations: Vec<(String, AnimationDef)>,
    initial_animation: Option<String>,
    collider: ColliderDef,
}

impl ActiveDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            animations: Vec::new(),
            initial_animation: None,
            collider: ColliderDef::default(),
        }
    }

    pub fn with_animation(mut self, name: impl Into<String>, animation: AnimationDef) -> Self {
        self.animations.push((name.into(), animation));
        self
    }

    pub fn with_initial_animation(mut self, name: impl Into<String>) -> Self {
        self.initial_animation = Some(name.into());
        self
    }

    pub fn with_collider(mut self, collider: ColliderDef) -> Self {
        self.collider = collider;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn animation(&self, name: &str) -> Option<&AnimationDef> {
        self.animations
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, animation)| animation)
    }

    pub fn has_animation(&self, name: &str) -> bool {
        self.animation(name).is_some()
    }

    pub fn animation_names(&self) -> impl Iterator<Item = &str> {
        self.animations.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn animations(&self) -> &[(String, AnimationDef)] {
        &self.animations
    }

    /// Explicit initial animation, else `default`, else the first one listed.
    pub fn initial_animation(&self) -> Option<&str> {
        if let Some(name) = self.initial_animation.as_deref() {
            return Some(name);
        }
        if self.has_animation("default") {
            return Some("default");
        }
        self.animations.first().map(|(name, _)| name.as_str())
    }

    pub(crate) fn explicit_initial_animation(&self) -> Option<&str> {
        self.initial_animation.as_deref()
    }

    pub fn collider(&self) -> &ColliderDef {
        &self.collider
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackdropDef {
    pub name: String,
    pub image: ImageData,
    pub mosaic: bool,
}

/// Bitmap font: glyphs for ASCII 32..=126 in a grid of `columns` cells.
#[derive(Debug, Clone, PartialEq)]
pub struct FontDef {
    pub name: String,
    pub char_width: u32,
    pub char_height: u32,
    pub columns: u32,
    pub image: ImageData,
}

impl FontDef {
    pub const DEFAULT_COLUMNS: u32 = 16;

    pub fn glyph_origin(&self, ch: char) -> Option<(u32, u32)> {
        let code = ch as u32;
        if !(32..=126).contains(&code) || self.columns == 0 {
            return None;
        }
        let index = code - 32;
        Some((
            (index % self.columns) * self.char_width,
            (index / self.columns) * self.char_height,
        ))
    }
}

/// Decoded PCM samples, interleaved.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    samples: Arc<[f32]>,
    channels: u16,
    sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples: samples.into(),
            channels,
            sample_rate,
        }
    }

    /// Clip of silence, used where only the duration matters.
    pub fn silent(duration_seconds: f64, channels: u16, sample_rate: u32) -> Self {
        let frames = (duration_seconds.max(0.0) * sample_rate as f64).round() as usize;
        Self::new(vec![0.0; frames * channels as usize], channels, sample_rate)
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration_seconds(&self) -> f64 {
        if self.channels == 0 || self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / (self.channels as f64 * self.sample_rate as f64)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopRegion {
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl LoopRegion {
    /// Maps a playback position that has run past the loop end back into
    /// the region. Positions before the end are returned unchanged.
    pub fn wrap(&self, position: f64) -> f64 {
        if position < self.end_seconds {
            return position;
        }
        let span = self.end_seconds - self.start_seconds;
        if span > 0.0 {
            self.start_seconds + (position - self.end_seconds) % span
        } else {
            self.start_seconds
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MusicDef {
    pub name: String,
    pub clip: AudioClip,
    pub looping: Option<LoopRegion>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SoundDef {
    pub name: String,
    pub clip: AudioClip,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContentError {
    #[error("definition name must not be empty")]
    EmptyName,
    #[error("{kind} `{name}` is already registered")]
    Duplicate { kind: &'static str, name: String },
    #[error("image data length mismatch: expected {expected} bytes, got {actual}")]
    ImageSize { expected: usize, actual: usize },
    #[error("animation `{animation}` of active `{active}` is invalid: {reason}")]
    InvalidAnimation {
        active: String,
        animation: String,
        reason: String,
    },
    #[error("active `{active}` starts with unknown animation `{animation}`")]
    UnknownInitialAnimation { active: String, animation: String },
    #[error("active `{active}` has an invalid collider: {reason}")]
    InvalidCollider { active: String, reason: String },
    #[error("font `{font}` has invalid glyph size {width}x{height}")]
    InvalidFont { font: String, width: u32, height: u32 },
    #[error("music `{track}` has an invalid loop region {start}..{end}")]
    InvalidLoop { track: String, start: f64, end: f64 },
    #[error("audio clip for `{name}` is invalid: {reason}")]
    InvalidClip { name: String, reason: String },
    #[error("missing {kind} media `{key}`")]
    MissingMedia { kind: &'static str, key: String },
    #[error("failed to read asset manifest {path}: {message}")]
    ManifestRead { path: String, message: String },
    #[error("failed to parse asset manifest {source_name} at `{path}`: {message}")]
    ManifestParse {
        source_name: String,
        path: String,
        message: String,
    },
    #[error("{count} asset definition(s) failed validation; first: {first}")]
    Aggregate {
        count: usize,
        first: Box<ContentError>,
    },
}
