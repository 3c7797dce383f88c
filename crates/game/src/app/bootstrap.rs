use std::fs;
use std::path::Path;

use room_engine::{AssetDatabase, AssetManifest, ContentError, LoopConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use super::media;

const CONFIG_PATH: &str = "room_game.json";

const MANIFEST: &str = r#"{
    "actives": [
        { "name": "orb" },
        { "name": "orb_collider", "radius": 7, "offset": [8, 8] },
        { "name": "orb_default", "frameCount": 4, "frameDuration": 6, "actionPoints": [[8, 0], [8, 0], [8, 0], [8, 0]] },
        { "name": "orb_lit", "frameCount": 4, "frameDuration": 2 }
    ],
    "backdrops": [
        { "name": "checker", "mosaic": true },
        { "name": "logo" }
    ],
    "music": [
        { "name": "theme", "loop": true }
    ],
    "sounds": [
        { "name": "blip" }
    ]
}"#;

pub(crate) struct AppWiring {
    pub(crate) config: LoopConfig,
    pub(crate) assets: Result<AssetDatabase, ContentError>,
}

pub(crate) fn build_app() -> AppWiring {
    init_tracing();
    info!("=== Room Game Startup ===");

    AppWiring {
        config: load_config(Path::new(CONFIG_PATH)),
        assets: build_assets(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn default_config() -> LoopConfig {
    LoopConfig {
        window_title: "Room Game".to_string(),
        ..LoopConfig::default()
    }
}

/// Reads the optional JSON config next to the binary. A missing file means
/// defaults; a malformed one is reported with its field path and ignored.
fn load_config(path: &Path) -> LoopConfig {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => return default_config(),
        Err(error) => {
            warn!(path = %path.display(), error = %error, "config_read_failed");
            return default_config();
        }
    };
    let mut deserializer = serde_json::Deserializer::from_str(&raw);
    match serde_path_to_error::deserialize::<_, LoopConfig>(&mut deserializer) {
        Ok(config) => {
            info!(path = %path.display(), "config_loaded");
            config
        }
        Err(error) => {
            warn!(
                path = %path.display(),
                field = %error.path(),
                error = %error.inner(),
                "config_invalid; using defaults"
            );
            default_config()
        }
    }
}

pub(crate) fn build_assets() -> Result<AssetDatabase, ContentError> {
    let manifest = AssetManifest::from_json_str(MANIFEST, "builtin_manifest")?;
    let media = media::generate()?;
    AssetDatabase::from_manifest(&manifest, &media)
}
