//! GStreamer-backed attach sessions.
//!
//! A session is the lifetime-bound binding between one stream URL and the
//! playback surface. It owns a playbin pipeline whose video sink is an RGBA
//! appsink, and forwards decoded frames and fatal errors over a channel.
//! Everything else about demuxing, adaptive bitrate and decoding stays
//! inside GStreamer.

use gstreamer as gst;
use gstreamer::prelude::*;
use gstreamer_app as gst_app;
use gstreamer_video as gst_video;
use gstreamer_video::prelude::*;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;
use url::Url;

use super::error::PlayerError;

/// One decoded frame, tightly packed RGBA.
#[derive(Clone)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl std::fmt::Debug for VideoFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoFrame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

/// What a session reports while it is attached.
///
/// Events are delivered in the order the pipeline produced them.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// A decoded frame is ready for the surface.
    Frame(VideoFrame),
    /// The pipeline hit a fatal error; the session is dead.
    Error { unsupported: bool, message: String },
    /// The source ended the stream.
    EndOfStream,
}

/// A live binding between a stream URL and the playback surface.
pub struct StreamSession {
    playbin: gst::Element,
    bus: gst::Bus,
}

impl StreamSession {
    /// Open `url` and start buffering.
    ///
    /// Frames and errors arrive on the returned receiver until the session
    /// is released or dies. The receiver ends once every sender inside the
    /// pipeline is gone, so the listening task cannot outlive the session.
    pub fn attach(url: &Url) -> Result<(Self, UnboundedReceiver<SessionEvent>), PlayerError> {
        // Probe for a source implementation first so an unplayable scheme is
        // reported as unsupported rather than as a generic attach failure.
        gst::Element::make_from_uri(gst::URIType::Src, url.as_str(), None).map_err(|_| {
            PlayerError::UnsupportedFormat(format!("no stream source for \"{}\" URLs", url.scheme()))
        })?;

        let playbin = gst::ElementFactory::make("playbin")
            .property("uri", url.as_str())
            .build()
            .map_err(|e| PlayerError::AttachFailure(format!("playback pipeline unavailable: {e}")))?;

        let (events, receiver) = mpsc::unbounded_channel();

        let appsink = build_surface_sink(events.clone());
        let video_sink = wrap_in_bin(&appsink)?;
        playbin.set_property("video-sink", &video_sink);
        // Video only; bar feeds carry no audio worth playing.
        playbin.set_property_from_str("flags", "video");

        let bus = playbin
            .bus()
            .ok_or_else(|| PlayerError::AttachFailure("pipeline has no message bus".to_string()))?;
        forward_bus_messages(&bus, events);

        if playbin.set_state(gst::State::Playing).is_err() {
            bus.unset_sync_handler();
            let _ = playbin.set_state(gst::State::Null);
            return Err(PlayerError::AttachFailure(format!(
                "stream refused to start: {url}"
            )));
        }
        debug!(%url, "pipeline playing");

        Ok((StreamSession { playbin, bus }, receiver))
    }

    /// Release every resource tied to this session: drop the bus handler,
    /// stop the pipeline. Idempotent, and also runs on drop so a replaced
    /// session can never outlive its player.
    pub fn release(&self) {
        self.bus.unset_sync_handler();
        let _ = self.playbin.set_state(gst::State::Null);
    }
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.release();
    }
}

/// Appsink that hands every decoded frame to the player as tightly packed
/// RGBA.
fn build_surface_sink(events: UnboundedSender<SessionEvent>) -> gst_app::AppSink {
    let caps = gst_video::VideoCapsBuilder::new()
        .format(gst_video::VideoFormat::Rgba)
        .pixel_aspect_ratio(gst::Fraction::new(1, 1))
        .build();

    let appsink = gst_app::AppSink::builder()
        .caps(&caps)
        .max_buffers(2)
        .drop(true)
        .build();

    appsink.set_callbacks(
        gst_app::AppSinkCallbacks::builder()
            .new_sample(move |sink| {
                let sample = sink.pull_sample().map_err(|_| gst::FlowError::Flushing)?;
                if let Some(frame) = VideoFrame::from_sample(&sample) {
                    // A closed receiver means the session was superseded;
                    // shut the streaming thread down right here.
                    if events.send(SessionEvent::Frame(frame)).is_err() {
                        return Err(gst::FlowError::Flushing);
                    }
                }
                Ok(gst::FlowSuccess::Ok)
            })
            .build(),
    );

    appsink
}

/// Playbin expects a single element as its video sink; wrap
/// `videoconvert ! appsink` into a bin with a ghost pad so any decoded
/// format reaches the RGBA caps.
fn wrap_in_bin(appsink: &gst_app::AppSink) -> Result<gst::Bin, PlayerError> {
    fn setup_err(e: impl std::fmt::Display) -> PlayerError {
        PlayerError::AttachFailure(format!("video sink setup failed: {e}"))
    }

    let bin = gst::Bin::new();
    let convert = gst::ElementFactory::make("videoconvert")
        .build()
        .map_err(setup_err)?;

    bin.add_many([&convert, appsink.upcast_ref()])
        .map_err(setup_err)?;
    gst::Element::link_many([&convert, appsink.upcast_ref()]).map_err(setup_err)?;

    let pad = convert
        .static_pad("sink")
        .ok_or_else(|| setup_err("videoconvert has no sink pad"))?;
    let ghost = gst::GhostPad::with_target(&pad).map_err(setup_err)?;
    bin.add_pad(&ghost).map_err(setup_err)?;

    Ok(bin)
}

/// Forward fatal bus messages to the session channel.
///
/// Runs as a sync handler on GStreamer's posting thread, so it only
/// classifies the message and hands it off.
fn forward_bus_messages(bus: &gst::Bus, events: UnboundedSender<SessionEvent>) {
    bus.set_sync_handler(move |_bus, message| {
        match message.view() {
            gst::MessageView::Error(err) => {
                let error = err.error();
                let _ = events.send(SessionEvent::Error {
                    unsupported: is_unsupported(&error),
                    message: error.to_string(),
                });
            }
            gst::MessageView::Eos(_) => {
                let _ = events.send(SessionEvent::EndOfStream);
            }
            _ => {}
        }
        gst::BusSyncReply::Drop
    });
}

/// Whether a pipeline error means the format has no playable path here, as
/// opposed to an unreachable or broken stream.
fn is_unsupported(error: &gst::glib::Error) -> bool {
    matches!(
        error.kind::<gst::CoreError>(),
        Some(gst::CoreError::MissingPlugin)
    ) || matches!(
        error.kind::<gst::StreamError>(),
        Some(
            gst::StreamError::CodecNotFound
                | gst::StreamError::TypeNotFound
                | gst::StreamError::Format
        )
    )
}

impl VideoFrame {
    /// Copy a sample out of the pipeline, flattening any row padding the
    /// decoder added.
    fn from_sample(sample: &gst::Sample) -> Option<Self> {
        let caps = sample.caps()?;
        let info = gst_video::VideoInfo::from_caps(caps).ok()?;
        let buffer = sample.buffer()?;
        let frame = gst_video::VideoFrameRef::from_buffer_ref_readable(buffer, &info).ok()?;

        let width = info.width();
        let height = info.height();
        let stride = frame.plane_stride()[0] as usize;
        let data = frame.plane_data(0).ok()?;

        Some(VideoFrame {
            width,
            height,
            pixels: repack_rgba(data, stride, width as usize, height as usize),
        })
    }
}

/// Drop per-row padding so the buffer is exactly `width * height * 4` bytes.
fn repack_rgba(data: &[u8], stride: usize, width: usize, height: usize) -> Vec<u8> {
    let row = width * 4;
    if stride == row && data.len() == row * height {
        return data.to_vec();
    }

    let mut pixels = Vec::with_capacity(row * height);
    for line in data.chunks(stride).take(height) {
        pixels.extend_from_slice(&line[..row]);
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repack_passes_tight_buffers_through() {
        // 2x4 RGBA, stride equal to the row size
        let data: Vec<u8> = (0u8..32).collect();
        assert_eq!(repack_rgba(&data, 8, 2, 4), data);
    }

    #[test]
    fn test_repack_strips_row_padding() {
        // Two 1-pixel rows, each padded to an 8-byte stride
        let mut data = vec![0u8; 16];
        data[0..4].copy_from_slice(&[1, 2, 3, 4]);
        data[8..12].copy_from_slice(&[5, 6, 7, 8]);

        assert_eq!(repack_rgba(&data, 8, 1, 2), vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
