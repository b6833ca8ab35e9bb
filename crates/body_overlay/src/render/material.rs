//! Material system for rendering

use crate::core::MaterialConfig;

/// How the rasterizer treats the alpha channel of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlphaMode {
    /// Alpha is ignored; the surface is fully opaque
    #[default]
    Opaque,
}

/// Flat metallic/roughness material
///
/// One base color for the whole mesh, no textures.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Base color (RGBA); alpha stays 1.0 for opaque meshes
    pub base_color: [f32; 4],

    /// Metallic factor (0.0 = dielectric, 1.0 = metallic)
    pub metallic: f32,

    /// Roughness factor (0.0 = mirror, 1.0 = completely rough)
    pub roughness: f32,

    /// Alpha handling
    pub alpha_mode: AlphaMode,
}

impl Material {
    /// Opaque material of the given RGB color with the configured constants
    pub fn opaque(color: [f32; 3], constants: &MaterialConfig) -> Self {
        Self::new()
            .with_color(color[0], color[1], color[2])
            .with_metallic(constants.metallic)
            .with_roughness(constants.roughness)
    }

    /// Create a new material with default properties
    pub fn new() -> Self {
        Self {
            base_color: [1.0, 1.0, 1.0, 1.0],
            metallic: 0.5,
            roughness: 1.0,
            alpha_mode: AlphaMode::Opaque,
        }
    }

    /// Set the base color, keeping full opacity
    pub fn with_color(mut self, r: f32, g: f32, b: f32) -> Self {
        self.base_color = [r, g, b, 1.0];
        self
    }

    /// Set the metallic factor
    pub fn with_metallic(mut self, metallic: f32) -> Self {
        self.metallic = metallic.clamp(0.0, 1.0);
        self
    }

    /// Set the roughness factor
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    /// RGB part of the base color
    pub fn rgb(&self) -> [f32; 3] {
        [self.base_color[0], self.base_color[1], self.base_color[2]]
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_material_uses_config_constants() {
        let constants = MaterialConfig { metallic: 0.25, roughness: 0.75 };
        let material = Material::opaque([0.3, 1.0, 0.3], &constants);

        assert_eq!(material.base_color, [0.3, 1.0, 0.3, 1.0]);
        assert_eq!(material.metallic, 0.25);
        assert_eq!(material.roughness, 0.75);
        assert_eq!(material.alpha_mode, AlphaMode::Opaque);
    }

    #[test]
    fn test_factors_are_clamped() {
        let material = Material::new().with_metallic(3.0).with_roughness(-1.0);
        assert_eq!(material.metallic, 1.0);
        assert_eq!(material.roughness, 0.0);
    }
}
