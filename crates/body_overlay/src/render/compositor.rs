//! Raster-over-background compositing
//!
//! Rendered pixels replace the background wherever their alpha is non-zero.
//! The threshold is hard: an alpha of 1 replaces the background as fully as
//! an alpha of 255, so silhouettes keep crisp edges.

use std::time::Instant;

use image::{Rgb, RgbImage, RgbaImage};

use crate::error::{OverlayError, Result};
use crate::render::rasterizer::{RenderFlags, Rasterizer};
use crate::scene::SceneGraph;

/// Composite `raster` over `background` with a hard alpha threshold
pub fn composite(raster: &RgbaImage, background: &RgbImage) -> Result<RgbImage> {
    if raster.dimensions() != background.dimensions() {
        return Err(OverlayError::DimensionMismatch {
            expected: raster.dimensions(),
            actual: background.dimensions(),
        });
    }

    let (width, height) = raster.dimensions();
    Ok(RgbImage::from_fn(width, height, |x, y| {
        let [r, g, b, a] = raster.get_pixel(x, y).0;
        if a > 0 {
            Rgb([r, g, b])
        } else {
            *background.get_pixel(x, y)
        }
    }))
}

/// One offscreen pass plus compositing, with fixed flags
#[derive(Debug)]
pub struct Compositor<R: Rasterizer> {
    rasterizer: R,
    flags: RenderFlags,
}

impl<R: Rasterizer> Compositor<R> {
    /// Wrap a rasterizer with the flags of every pass
    pub fn new(rasterizer: R, flags: RenderFlags) -> Self {
        Self { rasterizer, flags }
    }

    /// Flags used for every pass
    pub fn flags(&self) -> RenderFlags {
        self.flags
    }

    /// `(width, height)` of the rendered raster
    pub fn viewport(&self) -> (u32, u32) {
        self.rasterizer.viewport()
    }

    /// The wrapped rasterizer
    pub fn rasterizer(&self) -> &R {
        &self.rasterizer
    }

    /// Render `scene` and composite it over `background`
    pub fn render_over(&mut self, scene: &dyn SceneGraph, background: &RgbImage) -> Result<RgbImage> {
        let viewport = self.rasterizer.viewport();
        if background.dimensions() != viewport {
            return Err(OverlayError::DimensionMismatch {
                expected: viewport,
                actual: background.dimensions(),
            });
        }

        let started = Instant::now();
        let output = self.rasterizer.render(scene, self.flags)?;
        let frame = composite(&output.color, background)?;

        log::debug!(
            "Rendered {} nodes ({} meshes) at {}x{}: {} pixels covered in {:.2?}",
            scene.node_count(),
            scene.mesh_count(),
            viewport.0,
            viewport.1,
            output.covered_pixels(),
            started.elapsed()
        );
        Ok(frame)
    }
}
