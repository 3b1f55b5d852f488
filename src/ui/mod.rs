//! View helpers for the dashboard: the camera selector and the feed card.

pub mod feed;
pub mod sidebar;
