//! Last known status per camera, as shown in the sidebar.

use std::collections::HashMap;

use super::registry::{CameraId, Registry};

/// Resolution string used before a camera has ever reported one.
pub const UNKNOWN_RESOLUTION: &str = "unknown";

/// What the page knows about one camera.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraStatus {
    pub online: bool,
    pub resolution: String,
}

impl Default for CameraStatus {
    fn default() -> Self {
        CameraStatus {
            online: false,
            resolution: UNKNOWN_RESOLUTION.to_string(),
        }
    }
}

/// A status observation produced by the feed player. Fields left `None`
/// did not change.
#[derive(Debug, Clone, Default)]
pub struct StatusChange {
    pub online: Option<bool>,
    pub resolution: Option<String>,
}

impl StatusChange {
    pub fn offline() -> Self {
        StatusChange {
            online: Some(false),
            resolution: None,
        }
    }
}

/// Per-camera status map owned by the page.
///
/// Only the active camera's player writes to it; entries for the other
/// cameras keep their last observed values until those cameras are selected
/// and reattached.
#[derive(Debug)]
pub struct StatusMap {
    inner: HashMap<CameraId, CameraStatus>,
}

impl StatusMap {
    /// Seed every registered camera as offline with an unknown resolution.
    pub fn new(registry: &Registry) -> Self {
        let inner = registry
            .cameras()
            .iter()
            .map(|camera| (camera.id, CameraStatus::default()))
            .collect();
        StatusMap { inner }
    }

    /// Last known status for `id`. Cameras never observed report the
    /// default.
    pub fn get(&self, id: CameraId) -> CameraStatus {
        self.inner.get(&id).cloned().unwrap_or_default()
    }

    /// Fold a player observation into the map.
    pub fn apply(&mut self, id: CameraId, change: &StatusChange) {
        let status = self.inner.entry(id).or_default();
        if let Some(online) = change.online {
            status.online = online;
        }
        if let Some(resolution) = &change.resolution {
            status.resolution = resolution.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_camera_starts_offline_and_unknown() {
        let registry = Registry::builtin();
        let statuses = StatusMap::new(&registry);

        for camera in registry.cameras() {
            let status = statuses.get(camera.id);
            assert!(!status.online);
            assert_eq!(status.resolution, UNKNOWN_RESOLUTION);
        }
    }

    #[test]
    fn test_partial_changes_leave_other_fields_alone() {
        let registry = Registry::builtin();
        let mut statuses = StatusMap::new(&registry);

        statuses.apply(
            1,
            &StatusChange {
                online: Some(true),
                resolution: Some("1280x720".to_string()),
            },
        );
        statuses.apply(1, &StatusChange::offline());

        let status = statuses.get(1);
        assert!(!status.online);
        assert_eq!(status.resolution, "1280x720");
    }

    #[test]
    fn test_inactive_cameras_keep_stale_values() {
        let registry = Registry::builtin();
        let mut statuses = StatusMap::new(&registry);

        // Camera 1 comes online, then the page switches to camera 2 and
        // only camera 2's player reports from here on.
        statuses.apply(
            1,
            &StatusChange {
                online: Some(true),
                resolution: Some("1920x1080".to_string()),
            },
        );
        statuses.apply(2, &StatusChange::offline());

        let stale = statuses.get(1);
        assert!(stale.online);
        assert_eq!(stale.resolution, "1920x1080");
        assert!(!statuses.get(2).online);
    }
}
