mod album;
mod artist;
mod catalog;
mod image;
mod load;
mod track;

pub use album::{Album, AlbumType, Disc};
pub use artist::{ActivityPeriod, Artist};
pub use catalog::{Catalog, Problem as LoadCatalogProblem};
pub use image::{Image, ImageSize};
#[allow(unused_imports)] // Used by main.rs and catalog-import
pub use load::load_catalog;
pub use track::{ArtistRole, ArtistWithRole, Format, Track};
