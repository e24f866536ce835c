//! Configuration for the product image store
//!
//! The config is serialized to JSON so deployments can override the
//! defaults without recompiling. Sizes are square bounding boxes in
//! pixels; size 0 is implicitly reserved for the unscaled original and
//! must not appear in the configured list.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Settings controlling where variants are written and which sizes exist
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImagesConfig {
    /// Directory where variant files are written
    pub images_dir: PathBuf,

    /// Public route prefix the images directory is served under
    pub route: String,

    /// Square bounding-box sizes to generate, in pixels
    /// (the original is always stored in addition, under size 0)
    pub sizes: Vec<u32>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("images"),
            route: "/images".to_string(),
            sizes: vec![200, 800],
        }
    }
}

impl ImagesConfig {
    /// Convert to JSON string for storage
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Ensure the images directory exists, creating it if necessary
    pub fn ensure_images_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.images_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_sizes() {
        let config = ImagesConfig::default();
        assert_eq!(config.sizes, vec![200, 800]);
        assert_eq!(config.route, "/images");
    }

    #[test]
    fn test_json_round_trip() {
        let mut config = ImagesConfig::default();
        config.images_dir = PathBuf::from("/var/nuvora/images");
        config.sizes = vec![120, 480, 1600];

        let json = config.to_json().unwrap();
        let restored = ImagesConfig::from_json(&json).unwrap();

        assert_eq!(config, restored);
    }
}
