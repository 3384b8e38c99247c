pub mod config;
pub mod preset;
pub mod session;
pub mod stats;
pub mod technique;

use breathwork_core::{Catalog, Config};

/// Config from disk plus the catalog it describes.
pub(crate) fn load() -> Result<(Config, Catalog), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let catalog = config.catalog()?;
    Ok((config, catalog))
}
