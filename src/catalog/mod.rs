//! Catalog core split across logical submodules.

mod songs;
mod store;
mod video;

pub use songs::{CatalogError, SongCatalog, SortKey};
pub use store::SongStore;
pub use video::{embed_url, parse_video_id, thumbnail_url};
