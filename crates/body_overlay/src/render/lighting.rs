//! Lighting system
//!
//! Sessions light every pass with a fixed rig of point lights plus the
//! scene's ambient term. Light positions come from the node pose, so the
//! light itself only carries color and intensity.

use crate::core::LightConfig;
use crate::foundation::math::{Mat4, Vec3};

/// Point light (like a lightbulb)
#[derive(Debug, Clone, PartialEq)]
pub struct PointLight {
    /// Light color
    pub color: Vec3,
    /// Light intensity
    pub intensity: f32,
}

impl PointLight {
    /// Create a point light
    pub fn new(color: Vec3, intensity: f32) -> Self {
        Self { color, intensity }
    }

    /// White light with intensity 1
    pub fn white() -> Self {
        Self::new(Vec3::new(1.0, 1.0, 1.0), 1.0)
    }

    /// Radiance reaching a surface with normal `normal` at `surface`
    /// from a light sitting at `light_position`
    pub fn irradiance(&self, light_position: &Vec3, surface: &Vec3, normal: &Vec3) -> Vec3 {
        let to_light = light_position - surface;
        let distance = to_light.norm();
        if distance <= f32::EPSILON {
            return Vec3::zeros();
        }
        let lambert = normal.dot(&(to_light / distance)).max(0.0);
        self.color * (self.intensity * lambert)
    }
}

/// A light together with the pose it is inserted with
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLight {
    /// The light
    pub light: PointLight,
    /// Node pose carrying the light position
    pub pose: Mat4,
}

impl From<&LightConfig> for PlacedLight {
    fn from(config: &LightConfig) -> Self {
        let [x, y, z] = config.position;
        let [r, g, b] = config.color;
        Self {
            light: PointLight::new(Vec3::new(r, g, b), config.intensity),
            pose: Mat4::new_translation(&Vec3::new(x, y, z)),
        }
    }
}

/// Light rig built from configuration
pub fn light_rig(lights: &[LightConfig]) -> Vec<PlacedLight> {
    lights.iter().map(PlacedLight::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RendererConfig;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_rig_positions() {
        let rig = light_rig(&RendererConfig::default().lights);
        let positions: Vec<Vec3> = rig
            .iter()
            .map(|l| Vec3::new(l.pose[(0, 3)], l.pose[(1, 3)], l.pose[(2, 3)]))
            .collect();

        assert_eq!(positions, vec![
            Vec3::new(0.0, -1.0, 1.0),
            Vec3::new(0.0, 1.0, 1.0),
            Vec3::new(1.0, 1.0, 2.0),
        ]);
        assert!(rig.iter().all(|l| l.light == PointLight::white()));
    }

    #[test]
    fn test_irradiance_facing_and_behind() {
        let light = PointLight::white();
        let up = Vec3::new(0.0, 0.0, 1.0);

        let facing = light.irradiance(&Vec3::new(0.0, 0.0, 2.0), &Vec3::zeros(), &up);
        assert_relative_eq!(facing, Vec3::new(1.0, 1.0, 1.0), epsilon = 1e-6);

        let behind = light.irradiance(&Vec3::new(0.0, 0.0, -2.0), &Vec3::zeros(), &up);
        assert_eq!(behind, Vec3::zeros());
    }
}
