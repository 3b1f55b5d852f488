//! Camera selector with one entry per registered camera.

use iced::widget::{button, column, container, horizontal_space, row, text, Column, Row, Space};
use iced::{border, Alignment, Element, Length, Theme};

use crate::state::registry::{CameraDescriptor, CameraId, Registry};
use crate::state::status::{CameraStatus, StatusMap};
use crate::Message;

/// Build the sidebar.
///
/// Every entry shows the camera's last known status, even while another
/// camera owns the playback surface.
pub fn sidebar<'a>(
    registry: &'a Registry,
    statuses: &'a StatusMap,
    selected: CameraId,
) -> Element<'a, Message> {
    let mut entries = Column::new().spacing(12);
    for camera in registry.cameras() {
        let status = statuses.get(camera.id);
        entries = entries.push(camera_entry(camera, status, camera.id == selected));
    }

    container(column![text("Select Camera").size(18), entries].spacing(16))
        .width(Length::Fixed(280.0))
        .into()
}

fn camera_entry(
    camera: &CameraDescriptor,
    status: CameraStatus,
    selected: bool,
) -> Element<'_, Message> {
    let labels = column![
        text(&camera.title).size(16),
        text(&camera.location).size(13).style(text::secondary),
    ]
    .spacing(2);

    let indicator = column![
        signal_bars(status.online),
        text(if status.online { "Online" } else { "Offline" })
            .size(12)
            .style(if status.online {
                text::success
            } else {
                text::secondary
            }),
        text(status.resolution).size(12).style(text::secondary),
    ]
    .spacing(2)
    .align_x(Alignment::Center);

    button(
        row![labels, horizontal_space(), indicator]
            .spacing(8)
            .align_y(Alignment::Center),
    )
    .on_press(Message::CameraSelected(camera.id))
    .padding(12)
    .width(Length::Fill)
    .style(move |theme: &Theme, _status| entry_style(theme, selected))
    .into()
}

/// The four-bar indicator: all green when the camera is online, all muted
/// when it is not.
fn signal_bars<'a>(online: bool) -> Element<'a, Message> {
    let mut bars = Row::new().spacing(2).align_y(Alignment::End);
    for step in 1..=4u16 {
        bars = bars.push(
            container(Space::new(
                Length::Fixed(4.0),
                Length::Fixed(4.0 * f32::from(step)),
            ))
            .style(move |theme: &Theme| {
                let palette = theme.extended_palette();
                let color = if online {
                    palette.success.strong.color
                } else {
                    palette.background.strong.color
                };
                container::Style {
                    background: Some(color.into()),
                    border: border::rounded(1.0),
                    ..container::Style::default()
                }
            }),
        );
    }
    bars.into()
}

fn entry_style(theme: &Theme, selected: bool) -> button::Style {
    let palette = theme.extended_palette();
    let mut style = button::Style {
        background: Some(palette.background.weak.color.into()),
        text_color: palette.background.base.text,
        border: border::rounded(10.0),
        ..button::Style::default()
    };
    if selected {
        style.border = style.border.color(palette.primary.strong.color).width(1.0);
    }
    style
}
