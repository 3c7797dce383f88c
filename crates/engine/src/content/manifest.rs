use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};

use super::database::AssetDatabase;
use super::types::{
    ActiveDef, AnimationDef, AudioClip, BackdropDef, ColliderDef, ContentError, FontDef,
    ImageData, LoopRegion, MusicDef, SoundDef,
};

const COLLIDER_SUFFIX: &str = "collider";

/// Declarative asset list. Actives follow the naming convention
/// `name` (declares the active), `name_collider` and `name_<animation>`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AssetManifest {
    #[serde(default)]
    pub actives: Vec<ActiveEntry>,
    #[serde(default)]
    pub backdrops: Vec<BackdropEntry>,
    #[serde(default)]
    pub fonts: Vec<FontEntry>,
    #[serde(default)]
    pub music: Vec<MusicEntry>,
    #[serde(default)]
    pub sounds: Vec<SoundEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ActiveEntry {
    pub name: String,
    pub frame_count: Option<u32>,
    pub frame_duration: Option<u32>,
    pub offset: Option<[i32; 2]>,
    pub action_points: Option<Vec<[i32; 2]>>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub radius: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BackdropEntry {
    pub name: String,
    #[serde(default)]
    pub mosaic: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FontEntry {
    pub name: String,
    pub char_width: Option<u32>,
    pub char_height: Option<u32>,
    pub columns: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MusicEntry {
    pub name: String,
    #[serde(default, rename = "loop")]
    pub looping: bool,
    pub loop_start: Option<f64>,
    pub loop_end: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SoundEntry {
    pub name: String,
}

/// Decoded media keyed by manifest entry name.
#[derive(Debug, Clone, Default)]
pub struct MediaSet {
    images: HashMap<String, ImageData>,
    clips: HashMap<String, AudioClip>,
}

impl MediaSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_image(&mut self, key: impl Into<String>, image: ImageData) {
        self.images.insert(key.into(), image);
    }

    pub fn insert_clip(&mut self, key: impl Into<String>, clip: AudioClip) {
        self.clips.insert(key.into(), clip);
    }

    pub fn image(&self, key: &str) -> Option<&ImageData> {
        self.images.get(key)
    }

    pub fn clip(&self, key: &str) -> Option<&AudioClip> {
        self.clips.get(key)
    }
}

impl AssetManifest {
    pub fn from_json_str(raw: &str, source_name: &str) -> Result<Self, ContentError> {
        let mut deserializer = serde_json::Deserializer::from_str(raw);
        serde_path_to_error::deserialize::<_, AssetManifest>(&mut deserializer).map_err(|error| {
            let path = error.path().to_string();
            ContentError::ManifestParse {
                source_name: source_name.to_string(),
                path,
                message: error.into_inner().to_string(),
            }
        })
    }

    pub fn load(path: &Path) -> Result<Self, ContentError> {
        let raw = fs::read_to_string(path).map_err(|error| ContentError::ManifestRead {
            path: path.display().to_string(),
            message: error.to_string(),
        })?;
        Self::from_json_str(&raw, &path.display().to_string())
    }
}

impl AssetDatabase {
    /// Builds every definition in one pass. All failures are logged and the
    /// first one is returned wrapped in [`ContentError::Aggregate`].
    pub fn from_manifest(manifest: &AssetManifest, media: &MediaSet) -> Result<Self, ContentError> {
        let mut db = AssetDatabase::new();
        let mut errors = Vec::new();

        for def in build_active_defs(&manifest.actives, media, &mut errors) {
            if let Err(error) = db.register_active(def) {
                errors.push(error);
            }
        }

        for entry in &manifest.backdrops {
            let result = require_image(media, &entry.name).and_then(|image| {
                db.register_backdrop(BackdropDef {
                    name: entry.name.clone(),
                    image: image.clone(),
                    mosaic: entry.mosaic,
                })
            });
            if let Err(error) = result {
                errors.push(error);
            }
        }

        for entry in &manifest.fonts {
            let result = require_image(media, &entry.name).and_then(|image| {
                let columns = entry.columns.unwrap_or(FontDef::DEFAULT_COLUMNS);
                let rows = 95u32.div_ceil(columns.max(1));
                db.register_font(FontDef {
                    name: entry.name.clone(),
                    char_width: entry
                        .char_width
                        .unwrap_or(image.width() / columns.max(1)),
                    char_height: entry.char_height.unwrap_or(image.height() / rows),
                    columns,
                    image: image.clone(),
                })
            });
            if let Err(error) = result {
                errors.push(error);
            }
        }

        for entry in &manifest.music {
            let result = require_clip(media, &entry.name).and_then(|clip| {
                let looping = entry.looping.then(|| LoopRegion {
                    start_seconds: entry.loop_start.unwrap_or(0.0),
                    end_seconds: entry.loop_end.unwrap_or_else(|| clip.duration_seconds()),
                });
                db.register_music(MusicDef {
                    name: entry.name.clone(),
                    clip: clip.clone(),
                    looping,
                })
            });
            if let Err(error) = result {
                errors.push(error);
            }
        }

        for entry in &manifest.sounds {
            let result = require_clip(media, &entry.name).and_then(|clip| {
                db.register_sound(SoundDef {
                    name: entry.name.clone(),
                    clip: clip.clone(),
                })
            });
            if let Err(error) = result {
                errors.push(error);
            }
        }

        if errors.is_empty() {
            info!(
                actives = manifest.actives.len(),
                backdrops = manifest.backdrops.len(),
                fonts = manifest.fonts.len(),
                music = manifest.music.len(),
                sounds = manifest.sounds.len(),
                "asset_database_built"
            );
            return Ok(db);
        }

        for error in &errors {
            warn!(error = %error, "asset_definition_invalid");
        }
        let count = errors.len();
        let first = errors.swap_remove(0);
        Err(ContentError::Aggregate {
            count,
            first: Box::new(first),
        })
    }
}

fn require_image<'a>(media: &'a MediaSet, key: &str) -> Result<&'a ImageData, ContentError> {
    media.image(key).ok_or_else(|| ContentError::MissingMedia {
        kind: "image",
        key: key.to_string(),
    })
}

fn require_clip<'a>(media: &'a MediaSet, key: &str) -> Result<&'a AudioClip, ContentError> {
    media.clip(key).ok_or_else(|| ContentError::MissingMedia {
        kind: "audio",
        key: key.to_string(),
    })
}

/// Groups `name`, `name_collider` and `name_<animation>` entries. An entry is
/// attached to the longest previously declared active whose name it extends
/// with an underscore; otherwise it declares a new active.
fn build_active_defs(
    entries: &[ActiveEntry],
    media: &MediaSet,
    errors: &mut Vec<ContentError>,
) -> Vec<ActiveDef> {
    let mut defs: Vec<ActiveDef> = Vec::new();

    for entry in entries {
        let owner = defs
            .iter()
            .enumerate()
            .filter(|(_, def)| {
                entry
                    .name
                    .strip_prefix(def.name())
                    .and_then(|rest| rest.strip_prefix('_'))
                    .is_some_and(|suffix| !suffix.is_empty())
            })
            .max_by_key(|(_, def)| def.name().len())
            .map(|(index, _)| index);

        let Some(index) = owner else {
            defs.push(ActiveDef::new(entry.name.clone()));
            continue;
        };

        let suffix = entry.name[defs[index].name().len() + 1..].to_string();
        let def = std::mem::replace(&mut defs[index], ActiveDef::new(String::new()));
        defs[index] = if suffix == COLLIDER_SUFFIX {
            def.with_collider(collider_from_entry(entry))
        } else {
            match animation_from_entry(entry, media) {
                Ok(animation) => def.with_animation(suffix, animation),
                Err(error) => {
                    errors.push(error);
                    def
                }
            }
        };
    }

    defs
}

fn collider_from_entry(entry: &ActiveEntry) -> ColliderDef {
    let [offset_x, offset_y] = entry.offset.unwrap_or([0, 0]);
    match (entry.radius, entry.width, entry.height) {
        (Some(radius), _, _) => ColliderDef::circle(offset_x as f32, offset_y as f32, radius),
        (None, width, height) => ColliderDef::rectangle(
            offset_x as f32,
            offset_y as f32,
            width.unwrap_or(0.0),
            height.unwrap_or(0.0),
        ),
    }
}

fn animation_from_entry(entry: &ActiveEntry, media: &MediaSet) -> Result<AnimationDef, ContentError> {
    let image = require_image(media, &entry.name)?;
    let frame_count = entry.frame_count.unwrap_or(1);
    let [offset_x, offset_y] = entry.offset.unwrap_or([0, 0]);
    let mut animation =
        AnimationDef::from_strip(image.clone(), frame_count, entry.frame_duration.unwrap_or(1))
            .with_offset(offset_x, offset_y);
    if let Some(points) = &entry.action_points {
        animation = animation.with_action_points(points.iter().map(|[x, y]| (*x, *y)).collect());
    }
    Ok(animation)
}
