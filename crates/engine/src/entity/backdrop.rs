use std::sync::Arc;

use super::{Entity, EntityBase, Layer};
use crate::content::{BackdropDef, ImageData};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BackdropOptions {
    /// Display size; defaults to the image size.
    pub width: Option<f32>,
    pub height: Option<f32>,
}

/// Static image, stretched to its display size or tiled when the definition
/// is a mosaic.
#[derive(Debug, Clone)]
pub struct Backdrop {
    base: EntityBase,
    def: Arc<BackdropDef>,
    width: f32,
    height: f32,
}

impl Backdrop {
    pub fn new(def: Arc<BackdropDef>, layer: Layer, x: f32, y: f32, options: BackdropOptions) -> Self {
        let width = options.width.unwrap_or(def.image.width() as f32).max(0.0);
        let height = options.height.unwrap_or(def.image.height() as f32).max(0.0);
        Self {
            base: EntityBase::new(def.name.clone(), layer, x, y),
            def,
            width,
            height,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn set_size(&mut self, width: f32, height: f32) {
        self.width = width.max(0.0);
        self.height = height.max(0.0);
    }

    pub fn is_mosaic(&self) -> bool {
        self.def.mosaic
    }

    pub fn image(&self) -> &ImageData {
        &self.def.image
    }
}

impl Entity for Backdrop {
    fn base(&self) -> &EntityBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut EntityBase {
        &mut self.base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sky(mosaic: bool) -> Arc<BackdropDef> {
        Arc::new(BackdropDef {
            name: "sky".to_string(),
            image: ImageData::solid(16, 8, [0, 0, 255, 255]),
            mosaic,
        })
    }

    #[test]
    fn size_defaults_to_image() {
        let backdrop = Backdrop::new(sky(false), Layer::Background, 0.0, 0.0, BackdropOptions::default());
        assert_eq!((backdrop.width(), backdrop.height()), (16.0, 8.0));
        assert!(!backdrop.is_mosaic());
    }

    #[test]
    fn explicit_size_is_kept_and_never_negative() {
        let options = BackdropOptions {
            width: Some(320.0),
            height: None,
        };
        let mut backdrop = Backdrop::new(sky(true), Layer::Background, 0.0, 0.0, options);
        assert_eq!((backdrop.width(), backdrop.height()), (320.0, 8.0));
        backdrop.set_size(-1.0, 4.0);
        assert_eq!((backdrop.width(), backdrop.height()), (0.0, 4.0));
        assert!(backdrop.is_mosaic());
    }
}
