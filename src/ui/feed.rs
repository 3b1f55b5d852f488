//! The feed card: header, playback surface and status bar for the selected
//! camera.

use iced::widget::{column, container, horizontal_space, image, row, text, Space};
use iced::{border, Alignment, ContentFit, Element, Length, Theme};

use crate::player::{FeedPlayer, PlaybackState};
use crate::Message;

pub fn feed_card(player: &FeedPlayer) -> Element<'_, Message> {
    let camera = player.camera();

    let header = row![
        column![
            text(&camera.title).size(18),
            text(&camera.location).size(13).style(text::secondary),
        ]
        .spacing(2),
        horizontal_space(),
        live_indicator(player.state()),
    ]
    .padding(16)
    .align_y(Alignment::Center);

    let surface: Element<'_, Message> = match player.state() {
        PlaybackState::Online => match player.frame() {
            Some(handle) => image(handle.clone())
                .width(Length::Fill)
                .content_fit(ContentFit::Contain)
                .into(),
            None => placeholder("Waiting for first frame…", None),
        },
        PlaybackState::Loading => placeholder("Loading feed…", None),
        PlaybackState::Offline => placeholder(
            "Camera offline",
            Some("Select the camera again to retry"),
        ),
    };

    let (status_label, status_style): (&str, fn(&Theme) -> text::Style) = match player.state() {
        PlaybackState::Online => ("Active", text::success),
        PlaybackState::Loading => ("Connecting", text::secondary),
        PlaybackState::Offline => ("Offline", text::danger),
    };

    let status_bar = row![
        text("Status:").size(12).style(text::secondary),
        text(status_label).size(12).style(status_style),
        horizontal_space(),
        text("Quality:").size(12).style(text::secondary),
        text(quality_label(player.resolution())).size(12),
    ]
    .padding(12)
    .spacing(8)
    .align_y(Alignment::Center);

    container(column![header, surface, status_bar])
        .width(Length::Fill)
        .style(card_style)
        .into()
}

fn live_indicator<'a>(state: PlaybackState) -> Element<'a, Message> {
    match state {
        PlaybackState::Online => row![
            container(Space::new(Length::Fixed(8.0), Length::Fixed(8.0))).style(
                |theme: &Theme| {
                    let palette = theme.extended_palette();
                    container::Style {
                        background: Some(palette.success.strong.color.into()),
                        border: border::rounded(4.0),
                        ..container::Style::default()
                    }
                }
            ),
            text("LIVE").size(11).style(text::secondary),
        ]
        .spacing(6)
        .align_y(Alignment::Center)
        .into(),
        _ => Space::new(Length::Shrink, Length::Shrink).into(),
    }
}

fn placeholder<'a>(label: &'a str, hint: Option<&'a str>) -> Element<'a, Message> {
    let mut lines = column![text(label).size(14).style(text::secondary)]
        .spacing(6)
        .align_x(Alignment::Center);
    if let Some(hint) = hint {
        lines = lines.push(text(hint).size(12).style(text::secondary));
    }

    container(lines)
        .height(Length::Fixed(420.0))
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}

/// Collapse the decoded height into the coarse quality tag shown on the
/// card.
fn quality_label(resolution: Option<(u32, u32)>) -> &'static str {
    match resolution {
        Some((_, h)) if h >= 2160 => "4K",
        Some((_, h)) if h >= 1080 => "Full HD",
        Some((_, h)) if h >= 720 => "HD",
        Some(_) => "SD",
        None => "N/A",
    }
}

fn card_style(theme: &Theme) -> container::Style {
    let palette = theme.extended_palette();
    container::Style {
        background: Some(palette.background.weak.color.into()),
        border: border::rounded(12.0),
        ..container::Style::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_label_tracks_height() {
        assert_eq!(quality_label(Some((3840, 2160))), "4K");
        assert_eq!(quality_label(Some((1920, 1080))), "Full HD");
        assert_eq!(quality_label(Some((1280, 720))), "HD");
        assert_eq!(quality_label(Some((640, 480))), "SD");
        assert_eq!(quality_label(None), "N/A");
    }
}
