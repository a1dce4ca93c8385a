//! Domain model shared by the catalog core and the TUI. The struct mirrors the
//! JSON document on disk element-for-element, so the serde attributes here are
//! the single source of truth for the persisted layout. Keeping the commentary
//! here means later refactors can reconstruct the assumptions even if other
//! context is lost.

use serde::{Deserialize, Serialize};

/// Fallback rating applied to legacy records that predate the rating field.
pub const DEFAULT_RATING: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One bookmarked song. Serialized with camelCase keys so documents written by
/// earlier versions of the app load unchanged; the optional fields model that
/// same legacy drift and are omitted from the JSON when absent.
pub struct Song {
    /// Unique id, assigned once at creation. Derived from the creation time in
    /// Unix milliseconds, bumped on collision so it stays monotonic.
    pub id: i64,
    /// Title displayed in lists and matched by the search filter.
    pub title: String,
    /// The YouTube link exactly as the user entered it. The canonical video id
    /// is derived from this, never the other way around.
    pub url: String,
    /// Canonical video identifier extracted from `url`. `None` only for legacy
    /// records whose stored URL no longer parses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_id: Option<String>,
    /// Thumbnail URL derived from `video_id`. Backfilled on load for records
    /// written before thumbnails existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    /// Rating from 1 to 10. Records missing it are backfilled to
    /// [`DEFAULT_RATING`] on load.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    /// Creation timestamp in Unix milliseconds. Set once, never updated.
    pub date_added: i64,
}

impl Song {
    /// Format the rating for display, e.g. `8/10`, falling back to `N/A` for
    /// legacy records that slipped through without one.
    pub fn rating_badge(&self) -> String {
        match self.rating {
            Some(rating) => format!("{rating}/10"),
            None => "N/A".to_string(),
        }
    }

    /// The video id or a placeholder, for views that always render the column.
    pub fn video_id_label(&self) -> &str {
        self.video_id.as_deref().unwrap_or("(no video)")
    }
}
