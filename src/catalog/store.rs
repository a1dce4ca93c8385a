use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use directories::BaseDirs;

use crate::models::Song;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".song-shelf";
/// JSON document holding the whole catalog, stored inside the data directory.
const STORE_FILE_NAME: &str = "songs.json";

/// Handle to the single on-disk document the catalog mirrors itself into. The
/// whole collection is written on every save; there is no partial update.
pub struct SongStore {
    path: PathBuf,
}

impl SongStore {
    /// Resolve the default store location inside the user's home directory and
    /// make sure the data directory exists.
    pub fn open() -> Result<Self> {
        let path = store_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("failed to create data directory")?;
        }
        Ok(Self { path })
    }

    /// Build a store over an explicit file path. Used by tests to point the
    /// catalog at a throwaway location.
    pub fn at_path(path: PathBuf) -> Self {
        Self { path }
    }

    /// Read the persisted collection. A missing file means the app has never
    /// saved anything and yields an empty collection; an unparsable file is
    /// treated the same way so a corrupt document never takes the app down.
    /// Other I/O failures (permissions, hardware) still propagate.
    pub fn load(&self) -> Result<Vec<Song>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(err)
                    .with_context(|| format!("failed to read {}", self.path.display()))
            }
        };

        Ok(serde_json::from_str(&raw).unwrap_or_default())
    }

    /// Serialize the full collection and write it out synchronously.
    pub fn save(&self, songs: &[Song]) -> Result<()> {
        let raw = serde_json::to_string(songs).context("failed to serialize song catalog")?;
        fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

/// Resolve the absolute path to the catalog document inside the user's home.
fn store_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs
        .home_dir()
        .join(DATA_DIR_NAME)
        .join(STORE_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn sample_song() -> Song {
        Song {
            id: 1700000000000,
            title: "Song A".to_string(),
            url: "https://youtu.be/abc123".to_string(),
            video_id: Some("abc123".to_string()),
            thumbnail: Some("https://img.youtube.com/vi/abc123/mqdefault.jpg".to_string()),
            rating: Some(8),
            date_added: 1700000000000,
        }
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = SongStore::at_path(dir.path().join("songs.json"));
        assert_eq!(store.load().unwrap(), Vec::new());
    }

    #[test]
    fn corrupt_file_loads_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("songs.json");
        fs::write(&path, "{not json!").unwrap();
        let store = SongStore::at_path(path);
        assert_eq!(store.load().unwrap(), Vec::new());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let store = SongStore::at_path(dir.path().join("songs.json"));
        let songs = vec![sample_song()];
        store.save(&songs).unwrap();
        assert_eq!(store.load().unwrap(), songs);
    }

    #[test]
    fn persisted_layout_uses_camel_case_keys() {
        let raw = serde_json::to_string(&vec![sample_song()]).unwrap();
        assert!(raw.contains("\"videoId\":\"abc123\""));
        assert!(raw.contains("\"dateAdded\":1700000000000"));
        assert!(!raw.contains("video_id"));
    }

    #[test]
    fn legacy_records_deserialize_without_optional_fields() {
        let raw = r#"[{"id":1,"title":"Old","url":"https://youtu.be/x","dateAdded":1}]"#;
        let songs: Vec<Song> = serde_json::from_str(raw).unwrap();
        assert_eq!(songs[0].video_id, None);
        assert_eq!(songs[0].thumbnail, None);
        assert_eq!(songs[0].rating, None);
    }
}
