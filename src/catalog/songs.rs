use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

use crate::models::{Song, DEFAULT_RATING};

use super::store::SongStore;
use super::video::{parse_video_id, thumbnail_url};

/// Everything a catalog operation can fail with. `InvalidUrl` and `NotFound`
/// are user-facing and recoverable; `Store` wraps persistence failures from
/// the file layer.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Invalid YouTube URL. Please enter a valid YouTube link.")]
    InvalidUrl,
    #[error("Song not found.")]
    NotFound,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// The orderings `query` can project the catalog into.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub enum SortKey {
    /// Most recently added first.
    #[default]
    Newest,
    /// Title ascending, case-insensitive.
    TitleAz,
    /// Highest rating first; records without one sort as 0.
    Rating,
}

impl SortKey {
    /// Short label shown in the UI header.
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Newest => "Newest",
            SortKey::TitleAz => "A-Z",
            SortKey::Rating => "Rating",
        }
    }

    /// Step to the next ordering, wrapping around. Drives the sort hotkey.
    pub fn cycle(&self) -> Self {
        match self {
            SortKey::Newest => SortKey::TitleAz,
            SortKey::TitleAz => SortKey::Rating,
            SortKey::Rating => SortKey::Newest,
        }
    }
}

/// The authoritative in-memory copy of the song collection, mirrored to its
/// [`SongStore`] on every mutation. Storage order is insertion order; display
/// order is always a [`SongCatalog::query`] projection and never written back.
pub struct SongCatalog {
    store: SongStore,
    songs: Vec<Song>,
}

impl SongCatalog {
    /// Read the persisted collection and repair legacy records in place:
    /// missing `video_id`/`thumbnail` are re-derived from the stored URL and a
    /// missing rating defaults to [`DEFAULT_RATING`]. The repaired collection
    /// is re-persisted only when something actually changed, which keeps the
    /// load idempotent.
    pub fn load(store: SongStore) -> Result<Self, CatalogError> {
        let mut songs = store.load()?;
        let changed = backfill_legacy_fields(&mut songs);
        let catalog = Self { store, songs };
        if changed {
            catalog.persist()?;
        }
        Ok(catalog)
    }

    /// Validate the URL, construct a record with a fresh id and creation
    /// timestamp, append it, and persist. The hydrated record is echoed back
    /// so the caller can update UI state without re-querying.
    pub fn add(&mut self, title: &str, url: &str, rating: u8) -> Result<Song, CatalogError> {
        let video_id = parse_video_id(url).ok_or(CatalogError::InvalidUrl)?;
        // Id and creation stamp are the same clock read; the bump keeps both
        // strictly increasing when two songs land in the same millisecond.
        let id = self.next_id(now_millis());
        let song = Song {
            id,
            title: title.to_string(),
            url: url.to_string(),
            thumbnail: Some(thumbnail_url(&video_id)),
            video_id: Some(video_id),
            rating: Some(rating),
            date_added: id,
        };
        self.songs.push(song.clone());
        self.persist()?;
        Ok(song)
    }

    /// Rewrite the editable fields of an existing record, re-deriving
    /// `video_id` and `thumbnail` from the possibly-changed URL. The id and
    /// creation timestamp are preserved. The URL is validated before any state
    /// changes, so a rejected edit leaves the catalog untouched.
    pub fn update(
        &mut self,
        id: i64,
        title: &str,
        url: &str,
        rating: u8,
    ) -> Result<Song, CatalogError> {
        let video_id = parse_video_id(url).ok_or(CatalogError::InvalidUrl)?;
        let song = self
            .songs
            .iter_mut()
            .find(|song| song.id == id)
            .ok_or(CatalogError::NotFound)?;

        song.title = title.to_string();
        song.url = url.to_string();
        song.rating = Some(rating);
        song.thumbnail = Some(thumbnail_url(&video_id));
        song.video_id = Some(video_id);
        let updated = song.clone();

        self.persist()?;
        Ok(updated)
    }

    /// Drop the record with the given id, persisting only when something was
    /// actually removed. Returns whether a record was removed, so removing a
    /// missing id is a no-op rather than an error.
    pub fn remove(&mut self, id: i64) -> Result<bool, CatalogError> {
        let before = self.songs.len();
        self.songs.retain(|song| song.id != id);
        if self.songs.len() == before {
            return Ok(false);
        }
        self.persist()?;
        Ok(true)
    }

    /// Project the catalog into a display order: case-insensitive substring
    /// filter on the title, then a stable sort by the requested key. Returns
    /// owned copies; the underlying collection and its stored order are never
    /// touched.
    pub fn query(&self, search_term: &str, sort: SortKey) -> Vec<Song> {
        let needle = search_term.to_lowercase();
        let mut view: Vec<Song> = self
            .songs
            .iter()
            .filter(|song| song.title.to_lowercase().contains(&needle))
            .cloned()
            .collect();

        match sort {
            SortKey::Newest => view.sort_by(|a, b| b.date_added.cmp(&a.date_added)),
            SortKey::TitleAz => {
                view.sort_by(|a, b| a.title.to_lowercase().cmp(&b.title.to_lowercase()))
            }
            SortKey::Rating => {
                view.sort_by(|a, b| b.rating.unwrap_or(0).cmp(&a.rating.unwrap_or(0)))
            }
        }

        view
    }

    /// Look up a record by id without copying.
    pub fn get(&self, id: i64) -> Option<&Song> {
        self.songs.iter().find(|song| song.id == id)
    }

    pub fn len(&self) -> usize {
        self.songs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.songs.is_empty()
    }

    fn persist(&self) -> Result<(), CatalogError> {
        self.store.save(&self.songs)?;
        Ok(())
    }

    /// Ids come from the creation timestamp; when two songs land in the same
    /// millisecond the later one is bumped past the current maximum so ids
    /// stay unique and monotonic.
    fn next_id(&self, stamp: i64) -> i64 {
        let max_id = self.songs.iter().map(|song| song.id).max().unwrap_or(0);
        stamp.max(max_id + 1)
    }
}

/// Repair records written by earlier versions of the app. Returns whether
/// anything changed so the caller knows to re-persist.
fn backfill_legacy_fields(songs: &mut [Song]) -> bool {
    let mut changed = false;
    for song in songs.iter_mut() {
        if song.video_id.is_none() || song.thumbnail.is_none() {
            let video_id = song
                .video_id
                .clone()
                .or_else(|| parse_video_id(&song.url));
            if let Some(video_id) = video_id {
                song.thumbnail = Some(thumbnail_url(&video_id));
                song.video_id = Some(video_id);
                changed = true;
            }
        }
        if song.rating.is_none() {
            song.rating = Some(DEFAULT_RATING);
            changed = true;
        }
    }
    changed
}

/// Current Unix time in milliseconds. A clock before the epoch degrades to 0
/// instead of panicking.
fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn empty_catalog(dir: &TempDir) -> SongCatalog {
        let store = SongStore::at_path(dir.path().join("songs.json"));
        SongCatalog::load(store).unwrap()
    }

    #[test]
    fn add_rejects_invalid_urls_without_state_change() {
        let dir = TempDir::new().unwrap();
        let mut catalog = empty_catalog(&dir);

        let err = catalog.add("Song A", "https://example.com/nope", 7).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidUrl));
        assert!(catalog.is_empty());
        // Nothing was persisted either.
        assert!(!dir.path().join("songs.json").exists());
    }

    #[test]
    fn add_derives_video_id_and_thumbnail() {
        let dir = TempDir::new().unwrap();
        let mut catalog = empty_catalog(&dir);

        let song = catalog.add("Song A", "https://youtu.be/abc123", 8).unwrap();
        assert_eq!(song.video_id.as_deref(), Some("abc123"));
        assert_eq!(
            song.thumbnail.as_deref(),
            Some("https://img.youtube.com/vi/abc123/mqdefault.jpg")
        );
        assert_eq!(song.rating, Some(8));
        assert_eq!(song.id, song.date_added);

        let view = catalog.query("", SortKey::Newest);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0], song);
    }

    #[test]
    fn ids_stay_unique_within_one_millisecond() {
        let dir = TempDir::new().unwrap();
        let mut catalog = empty_catalog(&dir);

        let first = catalog.add("A", "https://youtu.be/a", 5).unwrap();
        let second = catalog.add("B", "https://youtu.be/b", 5).unwrap();
        let third = catalog.add("C", "https://youtu.be/c", 5).unwrap();
        assert!(first.id < second.id);
        assert!(second.id < third.id);
    }

    #[test]
    fn update_preserves_id_and_date_added() {
        let dir = TempDir::new().unwrap();
        let mut catalog = empty_catalog(&dir);

        let song = catalog.add("Song A", "https://youtu.be/abc123", 8).unwrap();
        let updated = catalog
            .update(song.id, "Song B", "https://www.youtube.com/watch?v=xyz789", 3)
            .unwrap();

        assert_eq!(updated.id, song.id);
        assert_eq!(updated.date_added, song.date_added);
        assert_eq!(updated.title, "Song B");
        assert_eq!(updated.video_id.as_deref(), Some("xyz789"));
        assert_eq!(
            updated.thumbnail.as_deref(),
            Some("https://img.youtube.com/vi/xyz789/mqdefault.jpg")
        );
        assert_eq!(updated.rating, Some(3));
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn update_surfaces_invalid_url_and_not_found() {
        let dir = TempDir::new().unwrap();
        let mut catalog = empty_catalog(&dir);
        let song = catalog.add("Song A", "https://youtu.be/abc123", 8).unwrap();

        let err = catalog
            .update(song.id, "Song A", "https://example.com/nope", 8)
            .unwrap_err();
        assert!(matches!(err, CatalogError::InvalidUrl));
        assert_eq!(catalog.get(song.id).unwrap().url, "https://youtu.be/abc123");

        let err = catalog
            .update(999, "Song A", "https://youtu.be/abc123", 8)
            .unwrap_err();
        assert!(matches!(err, CatalogError::NotFound));
    }

    #[test]
    fn remove_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut catalog = empty_catalog(&dir);
        let song = catalog.add("Song A", "https://youtu.be/abc123", 8).unwrap();

        assert!(catalog.remove(song.id).unwrap());
        assert!(catalog.is_empty());
        assert!(!catalog.remove(song.id).unwrap());
        assert!(catalog.is_empty());
    }

    #[test]
    fn query_filters_titles_case_insensitively() {
        let dir = TempDir::new().unwrap();
        let mut catalog = empty_catalog(&dir);
        catalog.add("Bohemian Rhapsody", "https://youtu.be/a", 9).unwrap();
        catalog.add("Stairway to Heaven", "https://youtu.be/b", 8).unwrap();

        let view = catalog.query("RHAPSODY", SortKey::Newest);
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].title, "Bohemian Rhapsody");
        assert!(catalog.query("zzz", SortKey::Newest).is_empty());
    }

    #[test]
    fn query_sorts_newest_first_by_default_key() {
        let dir = TempDir::new().unwrap();
        let mut catalog = empty_catalog(&dir);
        catalog.add("First", "https://youtu.be/a", 5).unwrap();
        catalog.add("Second", "https://youtu.be/b", 5).unwrap();

        let titles: Vec<_> = catalog
            .query("", SortKey::Newest)
            .into_iter()
            .map(|song| song.title)
            .collect();
        assert_eq!(titles, vec!["Second", "First"]);
    }

    #[test]
    fn query_sorts_titles_case_insensitively_and_stably() {
        let dir = TempDir::new().unwrap();
        let mut catalog = empty_catalog(&dir);
        catalog.add("banana", "https://youtu.be/a", 5).unwrap();
        catalog.add("Apple", "https://youtu.be/b", 5).unwrap();
        catalog.add("BANANA", "https://youtu.be/c", 5).unwrap();

        let titles: Vec<_> = catalog
            .query("", SortKey::TitleAz)
            .into_iter()
            .map(|song| song.title)
            .collect();
        // Equal keys keep insertion order: lowercase banana was added first.
        assert_eq!(titles, vec!["Apple", "banana", "BANANA"]);
    }

    #[test]
    fn query_sorts_by_rating_descending() {
        let dir = TempDir::new().unwrap();
        let mut catalog = empty_catalog(&dir);
        catalog.add("Mid", "https://youtu.be/a", 5).unwrap();
        catalog.add("High", "https://youtu.be/b", 9).unwrap();
        catalog.add("Low", "https://youtu.be/c", 2).unwrap();

        let titles: Vec<_> = catalog
            .query("", SortKey::Rating)
            .into_iter()
            .map(|song| song.title)
            .collect();
        assert_eq!(titles, vec!["High", "Mid", "Low"]);
    }

    #[test]
    fn query_treats_missing_rating_as_zero() {
        // Load backfills ratings, so a record without one has to be built
        // directly to exercise the comparator's fallback.
        let dir = TempDir::new().unwrap();
        let store = SongStore::at_path(dir.path().join("songs.json"));
        let unrated = Song {
            id: 1,
            title: "Unrated".to_string(),
            url: "https://youtu.be/a".to_string(),
            video_id: Some("a".to_string()),
            thumbnail: Some(thumbnail_url("a")),
            rating: None,
            date_added: 1,
        };
        let rated = Song {
            id: 2,
            title: "Rated".to_string(),
            url: "https://youtu.be/b".to_string(),
            video_id: Some("b".to_string()),
            thumbnail: Some(thumbnail_url("b")),
            rating: Some(1),
            date_added: 2,
        };
        let catalog = SongCatalog {
            store,
            songs: vec![unrated, rated],
        };

        let view = catalog.query("", SortKey::Rating);
        assert_eq!(view[0].title, "Rated");
        assert_eq!(view[1].title, "Unrated");
    }

    #[test]
    fn query_does_not_mutate_stored_order() {
        let dir = TempDir::new().unwrap();
        let mut catalog = empty_catalog(&dir);
        catalog.add("Zebra", "https://youtu.be/a", 1).unwrap();
        catalog.add("Apple", "https://youtu.be/b", 9).unwrap();

        let _sorted = catalog.query("", SortKey::TitleAz);

        // Reload from disk: insertion order survives.
        let reloaded =
            SongCatalog::load(SongStore::at_path(dir.path().join("songs.json"))).unwrap();
        let titles: Vec<_> = reloaded
            .query("", SortKey::Newest)
            .into_iter()
            .map(|song| song.title)
            .collect();
        assert_eq!(titles, vec!["Apple", "Zebra"]);
        // And the raw file still lists Zebra first.
        let raw = fs::read_to_string(dir.path().join("songs.json")).unwrap();
        assert!(raw.find("Zebra").unwrap() < raw.find("Apple").unwrap());
    }

    #[test]
    fn load_backfills_legacy_records_and_repersists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("songs.json");
        let legacy = r#"[{"id":42,"title":"Old","url":"https://youtu.be/old123","dateAdded":42}]"#;
        fs::write(&path, legacy).unwrap();

        let catalog = SongCatalog::load(SongStore::at_path(path.clone())).unwrap();
        let song = catalog.get(42).unwrap();
        assert_eq!(song.video_id.as_deref(), Some("old123"));
        assert_eq!(
            song.thumbnail.as_deref(),
            Some("https://img.youtube.com/vi/old123/mqdefault.jpg")
        );
        assert_eq!(song.rating, Some(DEFAULT_RATING));

        // The repaired record reached the disk too.
        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"videoId\":\"old123\""));
        assert!(raw.contains("\"rating\":5"));
    }

    #[test]
    fn load_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("songs.json");
        let legacy = r#"[{"id":42,"title":"Old","url":"https://youtu.be/old123","dateAdded":42}]"#;
        fs::write(&path, legacy).unwrap();

        let _first = SongCatalog::load(SongStore::at_path(path.clone())).unwrap();
        let after_first = fs::read_to_string(&path).unwrap();
        let _second = SongCatalog::load(SongStore::at_path(path.clone())).unwrap();
        let after_second = fs::read_to_string(&path).unwrap();
        assert_eq!(after_first, after_second);
    }

    #[test]
    fn mutations_round_trip_through_the_store() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("songs.json");
        let mut catalog = SongCatalog::load(SongStore::at_path(path.clone())).unwrap();
        let a = catalog.add("Song A", "https://youtu.be/abc123", 8).unwrap();
        let b = catalog.add("Song B", "https://youtu.be/def456", 6).unwrap();
        catalog.remove(a.id).unwrap();

        let reloaded = SongCatalog::load(SongStore::at_path(path)).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get(b.id), Some(&b));
    }
}
