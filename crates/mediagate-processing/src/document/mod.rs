//! Document processing module

pub mod rasterizer;

pub use rasterizer::{PdfRasterizer, PopplerRasterizer};
