use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use super::types::{
    ActiveDef, AnimationDef, BackdropDef, ContentError, FontDef, MusicDef, SoundDef,
};
use crate::entity::ColliderShape;

/// Validated definitions, looked up by name when instances are created.
#[derive(Debug, Default, Clone)]
pub struct AssetDatabase {
    actives: HashMap<String, Arc<ActiveDef>>,
    backdrops: HashMap<String, Arc<BackdropDef>>,
    fonts: HashMap<String, Arc<FontDef>>,
    music: HashMap<String, Arc<MusicDef>>,
    sounds: HashMap<String, Arc<SoundDef>>,
}

impl AssetDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_active(&mut self, def: ActiveDef) -> Result<(), ContentError> {
        validate_name(def.name(), "active", self.actives.contains_key(def.name()))?;
        validate_active(&def)?;
        debug!(
            active = def.name(),
            animation_count = def.animations().len(),
            "active_registered"
        );
        self.actives.insert(def.name().to_string(), Arc::new(def));
        Ok(())
    }

    pub fn register_backdrop(&mut self, def: BackdropDef) -> Result<(), ContentError> {
        validate_name(&def.name, "backdrop", self.backdrops.contains_key(&def.name))?;
        self.backdrops.insert(def.name.clone(), Arc::new(def));
        Ok(())
    }

    pub fn register_font(&mut self, def: FontDef) -> Result<(), ContentError> {
        validate_name(&def.name, "font", self.fonts.contains_key(&def.name))?;
        let fits = def.char_width > 0
            && def.char_height > 0
            && def.columns > 0
            && def
                .columns
                .checked_mul(def.char_width)
                .is_some_and(|grid_width| grid_width <= def.image.width())
            && def.char_height <= def.image.height();
        if !fits {
            return Err(ContentError::InvalidFont {
                font: def.name.clone(),
                width: def.char_width,
                height: def.char_height,
            });
        }
        self.fonts.insert(def.name.clone(), Arc::new(def));
        Ok(())
    }

    pub fn register_music(&mut self, def: MusicDef) -> Result<(), ContentError> {
        validate_name(&def.name, "music", self.music.contains_key(&def.name))?;
        validate_clip(&def.name, def.clip.channels(), def.clip.sample_rate())?;
        if let Some(region) = def.looping {
            let duration = def.clip.duration_seconds();
            let ordered = region.start_seconds >= 0.0
                && region.start_seconds < region.end_seconds
                && region.end_seconds <= duration + f64::EPSILON;
            if !ordered {
                return Err(ContentError::InvalidLoop {
                    track: def.name.clone(),
                    start: region.start_seconds,
                    end: region.end_seconds,
                });
            }
        }
        self.music.insert(def.name.clone(), Arc::new(def));
        Ok(())
    }

    pub fn register_sound(&mut self, def: SoundDef) -> Result<(), ContentError> {
        validate_name(&def.name, "sound", self.sounds.contains_key(&def.name))?;
        validate_clip(&def.name, def.clip.channels(), def.clip.sample_rate())?;
        self.sounds.insert(def.name.clone(), Arc::new(def));
        Ok(())
    }

    pub fn active(&self, name: &str) -> Option<Arc<ActiveDef>> {
        self.actives.get(name).cloned()
    }

    pub fn backdrop(&self, name: &str) -> Option<Arc<BackdropDef>> {
        self.backdrops.get(name).cloned()
    }

    pub fn font(&self, name: &str) -> Option<Arc<FontDef>> {
        self.fonts.get(name).cloned()
    }

    pub fn music(&self, name: &str) -> Option<Arc<MusicDef>> {
        self.music.get(name).cloned()
    }

    pub fn sound(&self, name: &str) -> Option<Arc<SoundDef>> {
        self.sounds.get(name).cloned()
    }

    pub fn music_defs(&self) -> impl Iterator<Item = &Arc<MusicDef>> {
        self.music.values()
    }

    pub fn sound_defs(&self) -> impl Iterator<Item = &Arc<SoundDef>> {
        self.sounds.values()
    }

    pub fn active_count(&self) -> usize {
        self.actives.len()
    }
}

fn validate_name(name: &str, kind: &'static str, taken: bool) -> Result<(), ContentError> {
    if name.trim().is_empty() {
        return Err(ContentError::EmptyName);
    }
    if taken {
        return Err(ContentError::Duplicate {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

fn validate_clip(name: &str, channels: u16, sample_rate: u32) -> Result<(), ContentError> {
    if channels == 0 || sample_rate == 0 {
        return Err(ContentError::InvalidClip {
            name: name.to_string(),
            reason: format!("channels={channels} sample_rate={sample_rate}"),
        });
    }
    Ok(())
}

fn validate_active(def: &ActiveDef) -> Result<(), ContentError> {
    for (name, animation) in def.animations() {
        validate_animation(animation).map_err(|reason| ContentError::InvalidAnimation {
            active: def.name().to_string(),
            animation: name.clone(),
            reason,
        })?;
    }

    if let Some(initial) = def.explicit_initial_animation() {
        if !def.has_animation(initial) {
            return Err(ContentError::UnknownInitialAnimation {
                active: def.name().to_string(),
                animation: initial.to_string(),
            });
        }
    }

    let collider = def.collider();
    let invalid_collider = match collider.shape {
        ColliderShape::None => None,
        ColliderShape::Rectangle if collider.width <= 0.0 || collider.height <= 0.0 => Some(
            format!("rectangle {}x{} must be positive", collider.width, collider.height),
        ),
        ColliderShape::Circle if collider.radius <= 0.0 => {
            Some(format!("radius {} must be positive", collider.radius))
        }
        _ => None,
    };
    if let Some(reason) = invalid_collider {
        return Err(ContentError::InvalidCollider {
            active: def.name().to_string(),
            reason,
        });
    }
    Ok(())
}

fn validate_animation(animation: &AnimationDef) -> Result<(), String> {
    if animation.frame_count == 0 {
        return Err("frame count must be at least 1".to_string());
    }
    if animation.action_points.len() != animation.frame_count as usize {
        return Err(format!(
            "{} action points for {} frames",
            animation.action_points.len(),
            animation.frame_count
        ));
    }
    if let Some(image) = &animation.image {
        let Some(strip_width) = animation.frame_width.checked_mul(animation.frame_count) else {
            return Err(format!(
                "frame strip of {} frames {} wide overflows",
                animation.frame_count, animation.frame_width
            ));
        };
        if strip_width > image.width() || animation.frame_height > image.height() {
            return Err(format!(
                "frame strip {}x{} exceeds image {}x{}",
                strip_width,
                animation.frame_height,
                image.width(),
                image.height()
            ));
        }
    }
    Ok(())
}
