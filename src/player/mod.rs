//! Feed player: binds one stream URL to the playback surface and turns the
//! attach session's events into liveness and resolution observations.

pub mod error;
pub mod session;

use iced::widget::image;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, info, warn};
use url::Url;

use crate::state::registry::CameraDescriptor;
use crate::state::status::StatusChange;
use error::PlayerError;
use session::{SessionEvent, StreamSession, VideoFrame};

/// Playback lifecycle of the mounted camera.
///
/// `Offline` is only left by a fresh attach cycle; the player never retries
/// on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Loading,
    Online,
    Offline,
}

/// One mounted camera feed.
///
/// Owns at most one attach session. Events arrive from the session over a
/// channel and are folded in with [`FeedPlayer::apply`], which reports what
/// changed so the page can update its status map.
pub struct FeedPlayer {
    camera: CameraDescriptor,
    generation: u64,
    state: PlaybackState,
    resolution: Option<(u32, u32)>,
    frame: Option<image::Handle>,
    session: Option<StreamSession>,
    /// Set when the stream format has no playable path; such a session must
    /// never report itself online.
    unsupported: bool,
}

impl FeedPlayer {
    fn new(camera: CameraDescriptor, generation: u64) -> Self {
        FeedPlayer {
            camera,
            generation,
            state: PlaybackState::Loading,
            resolution: None,
            frame: None,
            session: None,
            unsupported: false,
        }
    }

    /// Start an attach cycle for `camera`.
    ///
    /// Returns the player plus the receiver for its session events, or
    /// `None` when the attach failed outright and the player starts out
    /// offline.
    pub fn mount(
        camera: CameraDescriptor,
        generation: u64,
    ) -> (Self, Option<UnboundedReceiver<SessionEvent>>) {
        let mut player = FeedPlayer::new(camera, generation);

        let attach = Url::parse(&player.camera.stream_url)
            .map_err(|e| PlayerError::UnsupportedFormat(format!("bad stream URL: {e}")))
            .and_then(|url| StreamSession::attach(&url));

        match attach {
            Ok((session, events)) => {
                debug!(
                    camera = player.camera.id,
                    url = %player.camera.stream_url,
                    "attach session started"
                );
                player.session = Some(session);
                (player, Some(events))
            }
            Err(error) => {
                warn!(camera = player.camera.id, %error, "attach failed");
                player.unsupported = matches!(error, PlayerError::UnsupportedFormat(_));
                player.state = PlaybackState::Offline;
                (player, None)
            }
        }
    }

    /// Fold one session event into the player and report what changed.
    pub fn apply(&mut self, event: SessionEvent) -> StatusChange {
        match event {
            SessionEvent::Frame(frame) => self.on_frame(frame),
            SessionEvent::Error {
                unsupported,
                message,
            } => {
                self.unsupported |= unsupported;
                let error = if self.unsupported {
                    PlayerError::UnsupportedFormat(message)
                } else if self.state == PlaybackState::Loading {
                    PlayerError::AttachFailure(message)
                } else {
                    PlayerError::PlaybackFailure(message)
                };
                self.on_fatal(error)
            }
            SessionEvent::EndOfStream => {
                self.on_fatal(PlayerError::PlaybackFailure("stream ended".into()))
            }
        }
    }

    fn on_frame(&mut self, frame: VideoFrame) -> StatusChange {
        // A fatal error ends the session; frames still queued after it are
        // stale and must not resurrect the feed.
        if self.unsupported || self.state == PlaybackState::Offline {
            return StatusChange::default();
        }

        let mut change = StatusChange::default();

        if self.state != PlaybackState::Online {
            info!(
                camera = self.camera.id,
                "feed online ({}x{})", frame.width, frame.height
            );
            self.state = PlaybackState::Online;
            change.online = Some(true);
        }

        if self.resolution != Some((frame.width, frame.height)) {
            self.resolution = Some((frame.width, frame.height));
            change.resolution = Some(format!("{}x{}", frame.width, frame.height));
        }

        self.frame = Some(image::Handle::from_rgba(
            frame.width,
            frame.height,
            frame.pixels,
        ));
        change
    }

    fn on_fatal(&mut self, error: PlayerError) -> StatusChange {
        warn!(camera = self.camera.id, %error, "feed offline");
        self.release();
        self.frame = None;

        if self.state == PlaybackState::Offline {
            return StatusChange::default();
        }
        self.state = PlaybackState::Offline;
        StatusChange::offline()
    }

    /// Tear down the current attach session, if any. Idempotent.
    pub fn release(&mut self) {
        if let Some(session) = self.session.take() {
            drop(session);
            debug!(camera = self.camera.id, "attach session released");
        }
    }

    pub fn camera(&self) -> &CameraDescriptor {
        &self.camera
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Latest decoded frame, ready for the image widget.
    pub fn frame(&self) -> Option<&image::Handle> {
        self.frame.as_ref()
    }

    pub fn resolution(&self) -> Option<(u32, u32)> {
        self.resolution
    }

    pub fn is_offline(&self) -> bool {
        self.state == PlaybackState::Offline
    }

    /// Whether an event tagged with `generation` belongs to this attach
    /// cycle. Older tags mean the event outlived its session.
    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera() -> CameraDescriptor {
        CameraDescriptor {
            id: 1,
            title: "Stages & Ale Line".to_string(),
            location: "Princess St. Main Entrance".to_string(),
            stream_url: "https://cams.example/ale/index.m3u8".to_string(),
        }
    }

    fn frame(width: u32, height: u32) -> SessionEvent {
        SessionEvent::Frame(VideoFrame {
            width,
            height,
            pixels: vec![0; (width * height * 4) as usize],
        })
    }

    #[test]
    fn test_first_frame_brings_feed_online() {
        let mut player = FeedPlayer::new(test_camera(), 1);
        assert_eq!(player.state(), PlaybackState::Loading);

        let change = player.apply(frame(1280, 720));

        assert_eq!(player.state(), PlaybackState::Online);
        assert_eq!(change.online, Some(true));
        assert_eq!(change.resolution.as_deref(), Some("1280x720"));
    }

    #[test]
    fn test_resolution_only_reported_when_it_changes() {
        let mut player = FeedPlayer::new(test_camera(), 1);
        player.apply(frame(1280, 720));

        let same = player.apply(frame(1280, 720));
        assert_eq!(same.online, None);
        assert_eq!(same.resolution, None);

        let changed = player.apply(frame(1920, 1080));
        assert_eq!(changed.online, None);
        assert_eq!(changed.resolution.as_deref(), Some("1920x1080"));
    }

    #[test]
    fn test_fatal_error_goes_offline_and_ignores_late_frames() {
        let mut player = FeedPlayer::new(test_camera(), 1);
        player.apply(frame(1280, 720));

        let change = player.apply(SessionEvent::Error {
            unsupported: false,
            message: "connection reset".to_string(),
        });
        assert_eq!(player.state(), PlaybackState::Offline);
        assert_eq!(change.online, Some(false));
        assert!(player.frame().is_none());

        // Frames decoded before the error may still be queued; they must
        // not bring the feed back online or report a resolution.
        let late = player.apply(frame(1280, 720));
        assert_eq!(player.state(), PlaybackState::Offline);
        assert_eq!(late.online, None);
        assert_eq!(late.resolution, None);
    }

    #[test]
    fn test_repeated_errors_report_offline_once() {
        let mut player = FeedPlayer::new(test_camera(), 1);

        let first = player.apply(SessionEvent::Error {
            unsupported: false,
            message: "host unreachable".to_string(),
        });
        assert_eq!(first.online, Some(false));

        let second = player.apply(SessionEvent::Error {
            unsupported: false,
            message: "host unreachable".to_string(),
        });
        assert_eq!(second.online, None);
    }

    #[test]
    fn test_unsupported_format_never_reaches_online() {
        let mut player = FeedPlayer::new(test_camera(), 1);

        player.apply(SessionEvent::Error {
            unsupported: true,
            message: "no decoder available".to_string(),
        });
        assert_eq!(player.state(), PlaybackState::Offline);

        player.apply(frame(640, 480));
        assert_eq!(player.state(), PlaybackState::Offline);
        assert_eq!(player.resolution(), None);
    }

    #[test]
    fn test_end_of_stream_is_fatal() {
        let mut player = FeedPlayer::new(test_camera(), 1);
        player.apply(frame(1280, 720));

        let change = player.apply(SessionEvent::EndOfStream);
        assert_eq!(player.state(), PlaybackState::Offline);
        assert_eq!(change.online, Some(false));
    }

    #[test]
    fn test_generation_tags_attach_cycles() {
        let player = FeedPlayer::new(test_camera(), 3);
        assert!(player.is_current(3));
        assert!(!player.is_current(2));
    }
}
