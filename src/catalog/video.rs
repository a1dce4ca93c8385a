//! YouTube link handling: extracting the canonical video id from the URL
//! shapes users actually paste, and building the two derived URLs (thumbnail
//! and autoplay embed) from it. The derived formats are stable contracts; the
//! thumbnail string ends up persisted in every record.

/// Recognized link shapes, tried in order; the first one that yields a
/// non-empty identifier wins.
const ID_MARKERS: &[&str] = &["youtube.com/watch?v=", "youtu.be/", "youtube.com/embed/"];

/// Extract the canonical video id from a YouTube URL.
///
/// Accepts the standard long form (`youtube.com/watch?v=ID`), the short form
/// (`youtu.be/ID`), and the embed form (`youtube.com/embed/ID`). The id runs
/// until the first `&`, newline, `?`, or `#`, so trailing query parameters
/// such as `?t=5` or `&list=...` are stripped. Any other shape returns `None`.
pub fn parse_video_id(url: &str) -> Option<String> {
    for marker in ID_MARKERS {
        if let Some(start) = url.find(marker) {
            let rest = &url[start + marker.len()..];
            let id: String = rest
                .chars()
                .take_while(|ch| !matches!(ch, '&' | '\n' | '?' | '#'))
                .collect();
            if !id.is_empty() {
                return Some(id);
            }
        }
    }
    None
}

/// Medium-quality thumbnail URL for a video id.
pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{video_id}/mqdefault.jpg")
}

/// Embed URL that starts playback immediately. Handed to the system browser
/// as the popup-player equivalent.
pub fn embed_url(video_id: &str) -> String {
    format!("https://www.youtube.com/embed/{video_id}?autoplay=1")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn parses_long_form_urls() {
        assert_eq!(
            parse_video_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
        assert_eq!(
            parse_video_id("http://youtube.com/watch?v=abc123&list=PL99"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn parses_short_form_urls() {
        assert_eq!(
            parse_video_id("https://youtu.be/abc123"),
            Some("abc123".to_string())
        );
        // Timestamps after `?` are not part of the id.
        assert_eq!(
            parse_video_id("https://youtu.be/abc123?t=5"),
            Some("abc123".to_string())
        );
    }

    #[test]
    fn parses_embed_form_urls() {
        assert_eq!(
            parse_video_id("https://www.youtube.com/embed/xyz789"),
            Some("xyz789".to_string())
        );
        assert_eq!(
            parse_video_id("https://www.youtube.com/embed/xyz789#t=30"),
            Some("xyz789".to_string())
        );
    }

    #[test]
    fn rejects_unrecognized_shapes() {
        assert_eq!(parse_video_id(""), None);
        assert_eq!(parse_video_id("https://example.com/watch?v=abc"), None);
        assert_eq!(parse_video_id("https://vimeo.com/12345"), None);
        assert_eq!(parse_video_id("not a url at all"), None);
        // Marker present but the id is empty.
        assert_eq!(parse_video_id("https://www.youtube.com/watch?v="), None);
        assert_eq!(parse_video_id("https://youtu.be/?t=5"), None);
    }

    #[test]
    fn derived_urls_match_the_stable_formats() {
        assert_eq!(
            thumbnail_url("abc123"),
            "https://img.youtube.com/vi/abc123/mqdefault.jpg"
        );
        assert_eq!(
            embed_url("abc123"),
            "https://www.youtube.com/embed/abc123?autoplay=1"
        );
    }
}
