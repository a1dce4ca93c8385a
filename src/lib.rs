//! Core library surface for the Song Shelf TUI application.
//!
//! The public modules exposed here provide an intentionally small API so the
//! `bin` target as well as potential external tooling can reuse the same
//! pieces: the catalog core (JSON-backed song collection plus the YouTube URL
//! helpers) and the interactive front-end.
pub mod catalog;
pub mod models;
pub mod ui;

/// Convenience re-exports for the catalog core. These are what `main.rs` uses
/// to open the persisted store and hydrate the in-memory collection.
pub use catalog::{parse_video_id, CatalogError, SongCatalog, SongStore, SortKey};

/// The domain type every layer manipulates.
pub use models::Song;

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
