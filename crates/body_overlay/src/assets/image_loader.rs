//! Image loading utilities for background frames
//!
//! Backgrounds are 8-bit RGB; anything the `image` crate can decode is
//! converted on load.

use std::path::Path;

use image::{Rgb, RgbImage};

use crate::error::Result;

/// Load a background frame from disk as RGB8
pub fn load_background<P: AsRef<Path>>(path: P) -> Result<RgbImage> {
    let path_ref = path.as_ref();

    log::debug!("Loading background from: {:?}", path_ref);

    let rgb = image::open(path_ref)?.to_rgb8();
    let (width, height) = rgb.dimensions();

    log::info!("Loaded background {}x{} from {:?}", width, height, path_ref);

    Ok(rgb)
}

/// Save a composited frame; the format follows the file extension
pub fn save_frame<P: AsRef<Path>>(frame: &RgbImage, path: P) -> Result<()> {
    let path_ref = path.as_ref();
    frame.save(path_ref)?;
    log::info!("Wrote {}x{} frame to {:?}", frame.width(), frame.height(), path_ref);
    Ok(())
}

/// Create a solid color canvas (white backgrounds, test frames)
pub fn solid_canvas(width: u32, height: u32, color: [u8; 3]) -> RgbImage {
    RgbImage::from_pixel(width, height, Rgb(color))
}
