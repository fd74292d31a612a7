//! App icon collaborators
//!
//! - `catalog` - finds the icon files to decorate (asset catalog or loose PNGs)
//! - `decorator` - draws the version band onto an icon

pub mod catalog;
pub mod decorator;

pub use catalog::{CatalogImage, CatalogManifest, IconSource, MANIFEST_FILE};
pub use decorator::{BandGeometry, DecorationStyle, IconDecorator, MagickDecorator};
