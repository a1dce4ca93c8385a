use anyhow::{anyhow, Context, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::models::{Song, DEFAULT_RATING};

/// Form state for adding or editing a song.
#[derive(Default, Clone)]
pub(crate) struct SongForm {
    pub(crate) title: String,
    pub(crate) url: String,
    pub(crate) rating: String,
    pub(crate) active: SongField,
    pub(crate) error: Option<String>,
}

/// Enumerates the fields within the song form to drive focus management.
#[derive(Copy, Clone, PartialEq, Eq)]
pub(crate) enum SongField {
    Title,
    Url,
    Rating,
}

impl Default for SongField {
    fn default() -> Self {
        SongField::Title
    }
}

impl SongForm {
    /// Populate the form from an existing song when entering edit mode.
    pub(crate) fn from_song(song: &Song) -> Self {
        Self {
            title: song.title.clone(),
            url: song.url.clone(),
            rating: song.rating.map(|r| r.to_string()).unwrap_or_default(),
            active: SongField::Title,
            error: None,
        }
    }

    /// Advance focus to the next field, wrapping around. Bound to Tab.
    pub(crate) fn next_field(&mut self) {
        self.active = match self.active {
            SongField::Title => SongField::Url,
            SongField::Url => SongField::Rating,
            SongField::Rating => SongField::Title,
        };
    }

    /// Append a character to the active field, validating allowed input. The
    /// rating field only accepts up to two digits; everything printable goes
    /// into the text fields.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        match self.active {
            SongField::Title => {
                if !ch.is_control() {
                    self.title.push(ch);
                    true
                } else {
                    false
                }
            }
            SongField::Url => {
                if !ch.is_control() && !ch.is_whitespace() {
                    self.url.push(ch);
                    true
                } else {
                    false
                }
            }
            SongField::Rating => {
                if ch.is_ascii_digit() && self.rating.len() < 2 {
                    self.rating.push(ch);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Remove the last character from the active field.
    pub(crate) fn backspace(&mut self) {
        match self.active {
            SongField::Title => {
                self.title.pop();
            }
            SongField::Url => {
                self.url.pop();
            }
            SongField::Rating => {
                self.rating.pop();
            }
        }
    }

    /// Validate the inputs and return typed values ready for the catalog. The
    /// URL's shape is the catalog's concern; here we only require presence.
    /// A blank rating falls back to the default of 5.
    pub(crate) fn parse_inputs(&self) -> Result<(String, String, u8)> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(anyhow!("Title is required."));
        }

        let url = self.url.trim();
        if url.is_empty() {
            return Err(anyhow!("YouTube URL is required."));
        }

        let rating_raw = self.rating.trim();
        let rating = if rating_raw.is_empty() {
            DEFAULT_RATING
        } else {
            let rating = rating_raw
                .parse::<u8>()
                .context("Rating must be a number.")?;
            if !(1..=10).contains(&rating) {
                return Err(anyhow!("Rating must be between 1 and 10."));
            }
            rating
        };

        Ok((title.to_string(), url.to_string(), rating))
    }

    /// Render a single line for the form widget.
    pub(crate) fn build_line(&self, field_name: &str, field: SongField) -> Line<'static> {
        let (value, is_active) = match field {
            SongField::Title => (&self.title, self.active == SongField::Title),
            SongField::Url => (&self.url, self.active == SongField::Url),
            SongField::Rating => (&self.rating, self.active == SongField::Rating),
        };

        let display = if value.is_empty() {
            match field {
                SongField::Rating => format!("<blank = {DEFAULT_RATING}>"),
                _ => "<required>".to_string(),
            }
        } else {
            value.clone()
        };

        let style = if is_active {
            Style::default().fg(Color::Yellow)
        } else if value.is_empty() {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default()
        };

        Line::from(vec![
            Span::raw(format!("{field_name}: ")),
            Span::styled(display, style),
        ])
    }

    /// Return the character count for the requested field, for cursor math.
    pub(crate) fn value_len(&self, field: SongField) -> usize {
        match field {
            SongField::Title => self.title.chars().count(),
            SongField::Url => self.url.chars().count(),
            SongField::Rating => self.rating.chars().count(),
        }
    }
}

/// Confirmation state for the delete modal. Carries just enough of the song
/// to render the prompt after the list selection moves on.
#[derive(Clone)]
pub(crate) struct ConfirmSongDelete {
    pub(crate) id: i64,
    pub(crate) title: String,
}

impl ConfirmSongDelete {
    pub(crate) fn from(song: &Song) -> Self {
        Self {
            id: song.id,
            title: song.title.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn filled_form() -> SongForm {
        SongForm {
            title: "Song A".to_string(),
            url: "https://youtu.be/abc123".to_string(),
            rating: "8".to_string(),
            ..SongForm::default()
        }
    }

    #[test]
    fn parse_inputs_accepts_a_complete_form() {
        let (title, url, rating) = filled_form().parse_inputs().unwrap();
        assert_eq!(title, "Song A");
        assert_eq!(url, "https://youtu.be/abc123");
        assert_eq!(rating, 8);
    }

    #[test]
    fn parse_inputs_requires_title_and_url() {
        let mut form = filled_form();
        form.title = "   ".to_string();
        assert!(form.parse_inputs().is_err());

        let mut form = filled_form();
        form.url.clear();
        assert!(form.parse_inputs().is_err());
    }

    #[test]
    fn blank_rating_defaults_to_five() {
        let mut form = filled_form();
        form.rating.clear();
        let (_, _, rating) = form.parse_inputs().unwrap();
        assert_eq!(rating, DEFAULT_RATING);
    }

    #[test]
    fn out_of_range_ratings_are_rejected() {
        let mut form = filled_form();
        form.rating = "0".to_string();
        assert!(form.parse_inputs().is_err());
        form.rating = "11".to_string();
        assert!(form.parse_inputs().is_err());
        form.rating = "10".to_string();
        assert_eq!(form.parse_inputs().unwrap().2, 10);
    }

    #[test]
    fn rating_field_only_accepts_two_digits() {
        let mut form = SongForm::default();
        form.active = SongField::Rating;
        assert!(form.push_char('1'));
        assert!(form.push_char('0'));
        assert!(!form.push_char('0'));
        assert!(!form.push_char('x'));
        assert_eq!(form.rating, "10");
    }

    #[test]
    fn url_field_rejects_whitespace() {
        let mut form = SongForm::default();
        form.active = SongField::Url;
        assert!(form.push_char('h'));
        assert!(!form.push_char(' '));
        assert_eq!(form.url, "h");
    }
}
