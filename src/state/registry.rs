//! The fixed list of cameras the dashboard knows about.
//!
//! The list is loaded once at startup and never changes afterwards. A user
//! supplied `cameras.json` replaces the built-in defaults when it validates.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

pub type CameraId = u64;

/// One camera as configured at startup. Never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraDescriptor {
    pub id: CameraId,
    pub title: String,
    pub location: String,
    pub stream_url: String,
}

/// Ordered, immutable set of cameras with unique ids.
#[derive(Debug, Clone)]
pub struct Registry {
    cameras: Vec<CameraDescriptor>,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("camera list is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("camera list is empty")]
    Empty,

    #[error("camera id {0} is used more than once")]
    DuplicateId(CameraId),

    #[error("camera {id} has a malformed stream URL: {reason}")]
    InvalidUrl { id: CameraId, reason: String },
}

impl Registry {
    /// Load the camera list from the user's config file, falling back to
    /// the built-in defaults when the file is absent or rejected.
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::builtin();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(registry) => {
                    info!("Loaded {} cameras from {}", registry.len(), path.display());
                    registry
                }
                Err(error) => {
                    warn!("Ignoring {}: {error}", path.display());
                    Self::builtin()
                }
            },
            Err(_) => Self::builtin(),
        }
    }

    /// Where the optional camera list lives:
    /// - Linux: ~/.config/barbud/cameras.json
    /// - macOS: ~/Library/Application Support/barbud/cameras.json
    /// - Windows: %APPDATA%\barbud\cameras.json
    fn config_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("barbud");
        path.push("cameras.json");
        Some(path)
    }

    /// The cameras the dashboard ships with.
    pub fn builtin() -> Self {
        Registry {
            cameras: vec![
                CameraDescriptor {
                    id: 1,
                    title: "Stages & Ale Line".to_string(),
                    location: "Princess St. Main Entrance".to_string(),
                    stream_url: "https://letsgetsendy.bouncedat.tech/ale/index.m3u8".to_string(),
                },
                CameraDescriptor {
                    id: 2,
                    title: "Trin Line".to_string(),
                    location: "Division St. Main Entrance".to_string(),
                    stream_url: "https://letsgetsendy.bouncedat.tech/trin/index.m3u8".to_string(),
                },
            ],
        }
    }

    /// Parse and validate a camera list.
    pub fn from_json(contents: &str) -> Result<Self, RegistryError> {
        let cameras: Vec<CameraDescriptor> = serde_json::from_str(contents)?;
        Self::validated(cameras)
    }

    fn validated(cameras: Vec<CameraDescriptor>) -> Result<Self, RegistryError> {
        if cameras.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut seen = HashSet::new();
        for camera in &cameras {
            if !seen.insert(camera.id) {
                return Err(RegistryError::DuplicateId(camera.id));
            }
            if let Err(e) = Url::parse(&camera.stream_url) {
                return Err(RegistryError::InvalidUrl {
                    id: camera.id,
                    reason: e.to_string(),
                });
            }
        }

        Ok(Registry { cameras })
    }

    /// All cameras in configured order.
    pub fn cameras(&self) -> &[CameraDescriptor] {
        &self.cameras
    }

    pub fn len(&self) -> usize {
        self.cameras.len()
    }

    pub fn get(&self, id: CameraId) -> Option<&CameraDescriptor> {
        self.cameras.iter().find(|camera| camera.id == id)
    }

    /// First camera in configured order; validation guarantees the registry
    /// is never empty.
    pub fn first(&self) -> &CameraDescriptor {
        &self.cameras[0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_cameras_are_valid() {
        let registry = Registry::builtin();
        assert!(registry.len() >= 1);
        assert!(Registry::validated(registry.cameras().to_vec()).is_ok());
    }

    #[test]
    fn test_from_json_accepts_the_original_config_shape() {
        let registry = Registry::from_json(
            r#"[{
                "id": 7,
                "title": "Patio",
                "location": "Back Entrance",
                "streamUrl": "https://cams.example/patio/index.m3u8"
            }]"#,
        )
        .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.first().id, 7);
        assert_eq!(registry.get(7).unwrap().title, "Patio");
        assert!(registry.get(8).is_none());
    }

    #[test]
    fn test_order_is_preserved() {
        let registry = Registry::from_json(
            r#"[
                {"id": 2, "title": "B", "location": "-", "streamUrl": "https://cams.example/b.m3u8"},
                {"id": 1, "title": "A", "location": "-", "streamUrl": "https://cams.example/a.m3u8"}
            ]"#,
        )
        .unwrap();

        assert_eq!(registry.first().id, 2);
        assert_eq!(registry.cameras()[1].id, 1);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let result = Registry::from_json(
            r#"[
                {"id": 1, "title": "A", "location": "-", "streamUrl": "https://cams.example/a.m3u8"},
                {"id": 1, "title": "B", "location": "-", "streamUrl": "https://cams.example/b.m3u8"}
            ]"#,
        );

        assert!(matches!(result, Err(RegistryError::DuplicateId(1))));
    }

    #[test]
    fn test_malformed_stream_url_is_rejected() {
        let result = Registry::from_json(
            r#"[{"id": 1, "title": "A", "location": "-", "streamUrl": "not a url"}]"#,
        );

        assert!(matches!(result, Err(RegistryError::InvalidUrl { id: 1, .. })));
    }

    #[test]
    fn test_empty_list_is_rejected() {
        assert!(matches!(Registry::from_json("[]"), Err(RegistryError::Empty)));
    }
}
