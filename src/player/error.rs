use thiserror::Error;

/// Why a feed went offline.
///
/// These never propagate to the page; they are folded into the player's
/// offline state and logged.
#[derive(Debug, Clone, Error)]
pub enum PlayerError {
    /// The stream could not be opened.
    #[error("could not open stream: {0}")]
    AttachFailure(String),

    /// Fatal decode or transport error after a successful attach.
    #[error("playback failed: {0}")]
    PlaybackFailure(String),

    /// No playable path exists for this stream.
    #[error("unsupported stream format: {0}")]
    UnsupportedFormat(String),
}
