use anyhow::Error;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::Song;

/// ASCII textures standing in for video thumbnails. A terminal cannot show
/// the real `mqdefault.jpg`, so each card gets a motif picked deterministically
/// from its video id instead.
const CARD_ART: &[&[&str]] = &[
    &["/\\/\\", "\\/\\/"],
    &["*+*+", "+*+*"],
    &["=--=", "--=="],
    &["oOo ", " OoO"],
    &["::''", "''::"],
    &["|..|", ".||."],
    &["~~  ", "  ~~"],
    &["<><>", "><><"],
];

/// Pick the thumbnail motif for a song. Stable for a given video id so cards
/// keep their texture across redraws and re-sorts.
pub(crate) fn thumbnail_motif(video_id: &str) -> &'static [&'static str] {
    let seed: usize = video_id.bytes().map(usize::from).sum();
    CARD_ART[seed % CARD_ART.len()]
}

/// Repeat a short ASCII motif row until it fills the requested width.
pub(crate) fn repeat_pattern_row(row: &str, width: usize) -> String {
    if row.is_empty() {
        return " ".repeat(width);
    }
    row.chars().cycle().take(width).collect()
}

/// Render a rating as a ten-cell bar, e.g. `#######...` for 7/10. Legacy
/// records without a rating show an empty bar.
pub(crate) fn rating_bar(rating: Option<u8>) -> String {
    let filled = usize::from(rating.unwrap_or(0).min(10));
    format!("{}{}", "#".repeat(filled), ".".repeat(10 - filled))
}

/// Build the textual payload for a song card: a thumbnail-stand-in band on
/// top, then the title and rating bar.
pub(crate) fn build_song_card_lines(
    song: &Song,
    inner_width: u16,
    inner_height: u16,
    selected: bool,
) -> Vec<Line<'static>> {
    let width = inner_width as usize;
    let height = inner_height as usize;
    if width == 0 || height == 0 {
        return vec![Line::from("")];
    }

    let pattern_style = if selected {
        Style::default().fg(Color::Gray)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let text_lines = height.min(2);
    let band_height = height.saturating_sub(text_lines);

    let mut lines = Vec::with_capacity(height);
    match &song.video_id {
        Some(video_id) => {
            let motif = thumbnail_motif(video_id);
            for row_idx in 0..band_height {
                let row = repeat_pattern_row(motif[row_idx % motif.len()], width);
                lines.push(Line::from(Span::styled(row, pattern_style)));
            }
        }
        None => {
            for _ in 0..band_height {
                lines.push(Line::from(Span::styled(" ".repeat(width), pattern_style)));
            }
        }
    }

    let title_style = if selected {
        Style::default().add_modifier(Modifier::BOLD).fg(Color::Yellow)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };
    lines.push(Line::from(Span::styled(song.title.clone(), title_style)));

    if text_lines >= 2 {
        lines.push(Line::from(vec![
            Span::styled(rating_bar(song.rating), Style::default().fg(Color::Cyan)),
            Span::raw(format!(" {}", song.rating_badge())),
        ]));
    }

    lines
}

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [_, middle, _] = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .areas(area);

    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .areas(middle);

    center
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn rating_bar_clamps_and_fills() {
        assert_eq!(rating_bar(Some(7)), "#######...");
        assert_eq!(rating_bar(Some(10)), "##########");
        assert_eq!(rating_bar(Some(42)), "##########");
        assert_eq!(rating_bar(None), "..........");
    }

    #[test]
    fn pattern_rows_fill_the_requested_width() {
        assert_eq!(repeat_pattern_row("ab", 5), "ababa");
        assert_eq!(repeat_pattern_row("", 3), "   ");
        assert_eq!(repeat_pattern_row("xyz", 0), "");
    }

    #[test]
    fn motif_is_stable_per_video_id() {
        assert_eq!(thumbnail_motif("abc123"), thumbnail_motif("abc123"));
    }
}
