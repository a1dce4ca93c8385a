//! Binary entry point that glues the JSON-backed catalog to the TUI: open the
//! store, hydrate (and lazily repair) the song collection, then drive the
//! Ratatui event loop until the user exits.
use song_shelf::{run_app, App, SongCatalog, SongStore};

/// Initialize persistence, load the catalog, and launch the event loop.
///
/// Returning a `Result` bubbles up fatal initialization problems (for example
/// an unwritable home directory) to the terminal instead of crashing silently.
fn main() -> anyhow::Result<()> {
    let store = SongStore::open()?;
    let catalog = SongCatalog::load(store)?;

    let mut app = App::new(catalog);
    run_app(&mut app)
}
