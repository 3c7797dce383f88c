mod database;
mod manifest;
mod types;

pub use database::AssetDatabase;
pub use manifest::{
    ActiveEntry, AssetManifest, BackdropEntry, FontEntry, MediaSet, MusicEntry, SoundEntry,
};
pub use types::{
    ActiveDef, AnimationDef, AudioClip, BackdropDef, ColliderDef, ContentError, FontDef,
    ImageData, LoopRegion, MusicDef, SoundDef,
};
