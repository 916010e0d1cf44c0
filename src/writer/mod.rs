pub mod bin;
pub mod constants;
pub mod container;

pub use constants::Constants;
pub use container::{DfsImage, FileEntry, ImagePackager, RomImage, write_image};
