//! Video thumbnail resizing
//!
//! A user-supplied thumbnail is published once per player height, each
//! rendition keeping the source aspect ratio.

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;

/// Output heights, matching the video encoding ladder
pub const THUMBNAIL_SIZES: [u32; 5] = [144, 240, 480, 720, 1080];

/// Pick a resampling filter from the downscale ratio
fn select_filter(orig_height: u32, new_height: u32) -> FilterType {
    let ratio = orig_height as f32 / new_height as f32;

    if ratio > 2.0 {
        FilterType::Triangle
    } else if ratio > 1.5 {
        FilterType::CatmullRom
    } else {
        FilterType::Lanczos3
    }
}

/// Width that keeps the aspect ratio at `height`, never below one pixel
fn scaled_width(orig_width: u32, orig_height: u32, height: u32) -> u32 {
    let width = (orig_width as f64 * height as f64 / orig_height as f64).round();
    (width as u32).max(1)
}

fn decode(data: &[u8]) -> Result<DynamicImage> {
    let img = image::load_from_memory(data).context("Failed to decode thumbnail image")?;
    if img.height() == 0 {
        return Err(anyhow!("Thumbnail image has no height"));
    }
    Ok(img)
}

/// Resize an already decoded image to `height` and encode it as JPEG.
fn encode_at_height(img: &DynamicImage, height: u32) -> Result<Vec<u8>> {
    if height == 0 {
        return Err(anyhow!("Thumbnail height must be positive"));
    }

    let (orig_width, orig_height) = img.dimensions();
    let width = scaled_width(orig_width, orig_height, height);
    let resized = img.resize_exact(width, height, select_filter(orig_height, height));

    // JPEG has no alpha channel
    let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, ImageFormat::Jpeg)
        .context("Failed to encode thumbnail as JPEG")?;

    Ok(buffer.into_inner())
}

/// Decode `data`, resize it to `height` and encode the result as JPEG.
pub fn resize_to_height(data: &[u8], height: u32) -> Result<Vec<u8>> {
    encode_at_height(&decode(data)?, height)
}

/// Decode `data` once and produce one JPEG per requested height, in order.
pub fn render_thumbnails(data: &[u8], heights: &[u32]) -> Result<Vec<(u32, Vec<u8>)>> {
    let img = decode(data)?;
    heights
        .iter()
        .map(|&height| encode_at_height(&img, height).map(|jpeg| (height, jpeg)))
        .collect()
}
