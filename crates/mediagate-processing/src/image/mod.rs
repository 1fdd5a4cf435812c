//! Image processing module

pub mod thumbnail;

pub use thumbnail::{render_thumbnails, resize_to_height, THUMBNAIL_SIZES};
