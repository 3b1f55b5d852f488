use iced::widget::{button, column, container, horizontal_space, row, text};
use iced::{Alignment, Element, Length, Task, Theme};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod player;
mod state;
mod ui;

use player::session::SessionEvent;
use player::FeedPlayer;
use state::registry::{CameraDescriptor, CameraId, Registry};
use state::status::{StatusChange, StatusMap};

/// Main application state
struct BarBud {
    /// The fixed list of known cameras
    registry: Registry,
    /// Last observed status per camera, stale entries included
    statuses: StatusMap,
    /// Camera currently shown in the main panel
    selected: CameraId,
    /// Player bound to the selected camera's stream
    feed: FeedPlayer,
    /// Attach-cycle counter; session events carry it so events from a
    /// superseded session can be told apart and dropped
    generation: u64,
    /// Dark mode flag (not persisted)
    dark: bool,
}

/// Application messages (events)
#[derive(Debug, Clone)]
enum Message {
    /// User picked a camera in the sidebar
    CameraSelected(CameraId),
    /// An attach session reported something, tagged with its generation
    Feed(u64, SessionEvent),
    /// User toggled between dark and light mode
    ThemeToggled,
}

impl BarBud {
    /// Create a new instance of the application and attach the first camera
    fn new() -> (Self, Task<Message>) {
        let registry = Registry::load();
        let mut statuses = StatusMap::new(&registry);
        let first = registry.first().clone();

        info!(
            "🎥 {} cameras registered, starting with \"{}\"",
            registry.len(),
            first.title
        );

        let generation = 1;
        let (feed, task) = mount_feed(first, generation, &mut statuses);

        (
            BarBud {
                selected: feed.camera().id,
                registry,
                statuses,
                feed,
                generation,
                dark: true,
            },
            task,
        )
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::CameraSelected(id) => {
                // Re-selecting the active camera is a no-op unless it went
                // offline, in which case it starts a fresh attach cycle.
                if id == self.selected && !self.feed.is_offline() {
                    return Task::none();
                }
                let Some(camera) = self.registry.get(id).cloned() else {
                    return Task::none();
                };

                self.selected = id;
                self.generation += 1;

                // The previous session must be gone before the new one takes
                // over the playback surface.
                self.feed.release();

                let (feed, task) = mount_feed(camera, self.generation, &mut self.statuses);
                self.feed = feed;
                task
            }
            Message::Feed(generation, event) => {
                // Events from a superseded session carry an older generation
                // and must not touch current state.
                if !self.feed.is_current(generation) {
                    return Task::none();
                }
                let change = self.feed.apply(event);
                self.statuses.apply(self.feed.camera().id, &change);
                Task::none()
            }
            Message::ThemeToggled => {
                self.dark = !self.dark;
                Task::none()
            }
        }
    }

    /// Build the user interface
    fn view(&self) -> Element<Message> {
        let header = row![
            column![
                text("BarBud").size(28),
                text("Live camera feeds showing current line status")
                    .size(14)
                    .style(text::secondary),
            ]
            .spacing(4),
            horizontal_space(),
            button(text(if self.dark { "Light mode" } else { "Dark mode" }).size(14))
                .on_press(Message::ThemeToggled)
                .style(button::text),
        ]
        .align_y(Alignment::Center);

        let body = row![
            ui::sidebar::sidebar(&self.registry, &self.statuses, self.selected),
            ui::feed::feed_card(&self.feed),
        ]
        .spacing(24);

        let footer = container(
            text("© 2025 Gooners LTD. All rights reserved.")
                .size(12)
                .style(text::secondary),
        )
        .center_x(Length::Fill);

        container(column![header, body, footer].spacing(24))
            .padding(24)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        if self.dark {
            Theme::Dark
        } else {
            Theme::Light
        }
    }
}

/// Attach a fresh session for `camera` and hand its event stream to the
/// runtime. When the attach fails outright the camera is recorded offline
/// right away and there is nothing to listen to.
fn mount_feed(
    camera: CameraDescriptor,
    generation: u64,
    statuses: &mut StatusMap,
) -> (FeedPlayer, Task<Message>) {
    let id = camera.id;
    let (feed, events) = FeedPlayer::mount(camera, generation);
    match events {
        Some(receiver) => {
            let task = Task::run(UnboundedReceiverStream::new(receiver), move |event| {
                Message::Feed(generation, event)
            });
            (feed, task)
        }
        None => {
            statuses.apply(id, &StatusChange::offline());
            (feed, Task::none())
        }
    }
}

fn main() -> iced::Result {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("barbud=info")),
        )
        .init();

    // The streaming client is process-global; every attach session shares it.
    gstreamer::init().expect("Failed to initialize GStreamer. Check that the runtime is installed.");

    iced::application("BarBud", BarBud::update, BarBud::view)
        .theme(BarBud::theme)
        .centered()
        .run_with(BarBud::new)
}
