//! Math utilities and types
//!
//! Thin aliases over nalgebra plus the handful of matrix constructors the
//! mesh and camera code needs.

pub use nalgebra::{
    Vector2, Vector3, Vector4,
    Matrix3, Matrix4,
    Rotation3,
    Unit,
};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Smallest axis length accepted when building a rotation
    pub const AXIS_EPSILON: f32 = 1.0e-8;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Create a rotation matrix around the X axis
    fn rotation_x(angle: f32) -> Mat4;

    /// Rotation of `angle` radians about an arbitrary axis.
    ///
    /// Returns `None` when the axis is too short (or not finite) to normalize.
    fn rotation_about(angle: f32, axis: &Vec3) -> Option<Mat4>;

    /// Scale by `factor` along a single `direction`, anchored at the origin.
    ///
    /// Builds `I - (1 - factor) * d * dᵀ` for the normalized direction `d`;
    /// components orthogonal to `d` are left untouched.
    fn scale_along(factor: f32, direction: &Vec3) -> Mat4;

    /// Apply the matrix to a point with a homogeneous multiply followed by
    /// the divide by `w`.
    fn apply_to_point(&self, point: &Vec3) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn rotation_x(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::x_axis(), angle)
    }

    fn rotation_about(angle: f32, axis: &Vec3) -> Option<Mat4> {
        if !axis.iter().all(|c| c.is_finite()) {
            return None;
        }
        let axis = Unit::try_new(*axis, constants::AXIS_EPSILON)?;
        Some(Rotation3::from_axis_angle(&axis, angle).to_homogeneous())
    }

    fn scale_along(factor: f32, direction: &Vec3) -> Mat4 {
        let d = direction.normalize();
        let linear = Mat3::identity() - (d * d.transpose()) * (1.0 - factor);
        linear.to_homogeneous()
    }

    fn apply_to_point(&self, point: &Vec3) -> Vec3 {
        let h = self * Vec4::new(point.x, point.y, point.z, 1.0);
        if h.w == 0.0 || h.w == 1.0 {
            h.xyz()
        } else {
            h.xyz() / h.w
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn test_rotation_about_rejects_zero_axis() {
        assert!(Mat4::rotation_about(1.0, &Vec3::zeros()).is_none());
        assert!(Mat4::rotation_about(1.0, &Vec3::new(f32::NAN, 0.0, 0.0)).is_none());
    }

    #[test]
    fn test_rotation_about_normalizes_axis() {
        let long_axis = Mat4::rotation_about(0.7, &Vec3::new(0.0, 5.0, 0.0)).unwrap();
        let unit_axis = Mat4::rotation_about(0.7, &Vec3::y()).unwrap();
        assert_relative_eq!(long_axis, unit_axis, epsilon = EPSILON);
    }

    #[test]
    fn test_scale_along_single_axis() {
        let sy = Mat4::scale_along(3.0, &Vec3::y());
        let p = sy.apply_to_point(&Vec3::new(1.0, 2.0, -1.0));
        assert_relative_eq!(p, Vec3::new(1.0, 6.0, -1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_three_axis_scales_compose_to_diagonal() {
        let s = Mat4::scale_along(4.0, &Vec3::z())
            * Mat4::scale_along(3.0, &Vec3::y())
            * Mat4::scale_along(2.0, &Vec3::x());
        let diagonal = Mat4::new_nonuniform_scaling(&Vec3::new(2.0, 3.0, 4.0));
        assert_relative_eq!(s, diagonal, epsilon = EPSILON);
    }

    #[test]
    fn test_apply_to_point_dehomogenizes() {
        let mut m = Mat4::identity();
        m[(3, 3)] = 2.0;
        let p = m.apply_to_point(&Vec3::new(2.0, 4.0, 6.0));
        assert_relative_eq!(p, Vec3::new(1.0, 2.0, 3.0), epsilon = EPSILON);
    }

    #[test]
    fn test_deg_to_rad() {
        assert_relative_eq!(utils::deg_to_rad(180.0), constants::PI, epsilon = 1e-6);
        assert_relative_eq!(utils::deg_to_rad(-90.0), -constants::PI / 2.0, epsilon = 1e-6);
    }
}
