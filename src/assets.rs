//! Decoded-image asset registry.
//!
//! Images are decoded once at load time and handed out by name. Optional
//! lookups go through [`Assets::get`]; resources the engine cannot run
//! without use [`Assets::require`], which turns absence into a hard
//! [`AssetError::Missing`].

use std::collections::HashMap;
use std::path::Path;

use crate::error::AssetError;

/// Name-keyed registry of decoded RGBA images.
#[derive(Default)]
pub struct Assets {
    images: HashMap<String, image::RgbaImage>,
}

impl Assets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode an image file and register it under `name`.
    pub fn load_file(&mut self, name: &str, path: impl AsRef<Path>) -> Result<(), AssetError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| AssetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.insert_bytes(name, &bytes)
    }

    /// Decode an in-memory image and register it under `name`.
    pub fn insert_bytes(&mut self, name: &str, bytes: &[u8]) -> Result<(), AssetError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        self.insert_image(name, img);
        Ok(())
    }

    /// Register an already decoded image under `name`.
    pub fn insert_image(&mut self, name: &str, img: image::RgbaImage) {
        self.images.insert(name.to_string(), img);
    }

    /// Look up an optional asset. Absence is fine; callers fall back and
    /// should log what they did.
    pub fn get(&self, name: &str) -> Option<&image::RgbaImage> {
        self.images.get(name)
    }

    /// Look up a load-bearing asset. Absence is fatal.
    pub fn require(&self, name: &str) -> Result<&image::RgbaImage, AssetError> {
        self.images
            .get(name)
            .ok_or_else(|| AssetError::Missing(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_required_asset_names_the_asset() {
        let assets = Assets::new();
        let err = assets.require("water_normal").unwrap_err();
        assert!(err.to_string().contains("water_normal"));
    }

    #[test]
    fn registered_images_are_found() {
        let mut assets = Assets::new();
        assets.insert_image("noise", image::RgbaImage::new(4, 4));
        assert!(assets.get("noise").is_some());
        assert!(assets.require("noise").is_ok());
    }

    #[test]
    fn optional_lookup_is_quiet_about_absence() {
        let assets = Assets::new();
        assert!(assets.get("environment").is_none());
    }
}
