//! Offscreen rasterizer interface
//!
//! A rasterizer turns the current contents of a [`SceneGraph`] into an RGBA
//! raster plus a depth buffer. Sessions never look inside it; the CPU
//! [`SoftwareRasterizer`](crate::render::software::SoftwareRasterizer) is the
//! bundled implementation and tests plug in deterministic fakes.

use bitflags::bitflags;
use image::{ImageBuffer, Luma, RgbaImage};

use crate::error::Result;
use crate::scene::SceneGraph;

bitflags! {
    /// Options of a single render pass
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderFlags: u32 {
        /// Produce an alpha channel (uncovered pixels get alpha 0)
        const RGBA = 1 << 0;
        /// Draw triangle edges only
        const ALL_WIREFRAME = 1 << 1;
    }
}

impl RenderFlags {
    /// Flags for a session rendering solid or wireframe geometry
    pub fn for_mode(wireframe: bool) -> Self {
        if wireframe {
            Self::RGBA | Self::ALL_WIREFRAME
        } else {
            Self::RGBA
        }
    }
}

/// Single-channel float depth image
pub type DepthImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Result of one render pass
#[derive(Debug, Clone)]
pub struct RasterOutput {
    /// Color with alpha; alpha 0 marks pixels no geometry touched
    pub color: RgbaImage,
    /// Depth per pixel; 0 where nothing was drawn
    pub depth: DepthImage,
}

impl RasterOutput {
    /// `(width, height)` of the raster
    pub fn dimensions(&self) -> (u32, u32) {
        self.color.dimensions()
    }

    /// Number of pixels with non-zero alpha
    pub fn covered_pixels(&self) -> usize {
        self.color.pixels().filter(|p| p.0[3] > 0).count()
    }
}

/// Offscreen renderer service
///
/// Owns a scarce context (a bound graphics context for GPU backends), so it
/// is driven from one thread at a time through `&mut self`.
pub trait Rasterizer: Send {
    /// `(width, height)` of the rasters this rasterizer produces
    fn viewport(&self) -> (u32, u32);

    /// Render the scene as seen by its main camera
    fn render(&mut self, scene: &dyn SceneGraph, flags: RenderFlags) -> Result<RasterOutput>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_for_mode() {
        assert_eq!(RenderFlags::for_mode(false), RenderFlags::RGBA);
        let wire = RenderFlags::for_mode(true);
        assert!(wire.contains(RenderFlags::RGBA));
        assert!(wire.contains(RenderFlags::ALL_WIREFRAME));
    }

    #[test]
    fn test_covered_pixels() {
        let mut color = RgbaImage::new(3, 2);
        color.put_pixel(1, 1, image::Rgba([9, 9, 9, 1]));
        let output = RasterOutput {
            color,
            depth: DepthImage::new(3, 2),
        };
        assert_eq!(output.dimensions(), (3, 2));
        assert_eq!(output.covered_pixels(), 1);
    }
}
