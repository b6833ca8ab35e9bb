//! Mesh placement transforms
//!
//! Meshes arrive in the body-model convention (y down, z into the image) and
//! are flipped into the scene convention with a 180° turn about +X. Object
//! meshes get their own scale/rotation/translation first.
//!
//! Steps are applied in the order they are added: each new step multiplies
//! the accumulated matrix from the left.

use serde::{Serialize, Deserialize};

use crate::error::{OverlayError, Result};
use crate::foundation::math::{constants::PI, utils, Mat4, Mat4Ext, Vec3};

/// Rotation by an angle in degrees about an axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRotation {
    /// Angle in degrees
    pub angle_degrees: f32,
    /// Rotation axis (right-handed: X right, Y up, Z out of the screen)
    pub axis: [f32; 3],
}

impl AxisRotation {
    /// Rotation of `angle_degrees` about `axis`
    pub fn new(angle_degrees: f32, axis: [f32; 3]) -> Self {
        Self { angle_degrees, axis }
    }

    /// Matrix of this rotation; see [`axis_rotation`]
    pub fn matrix(&self) -> Result<Mat4> {
        axis_rotation(self.angle_degrees, self.axis)
    }
}

/// Fixed 180° rotation about +X between body-model and scene conventions
pub fn coordinate_correction() -> Mat4 {
    Mat4::rotation_x(PI)
}

/// Rotation matrix for `angle_degrees` about `axis`
///
/// A zero angle returns the identity without touching the axis, so a zero
/// axis is fine there. Any other angle needs a finite, non-zero axis.
pub fn axis_rotation(angle_degrees: f32, axis: [f32; 3]) -> Result<Mat4> {
    if angle_degrees == 0.0 {
        return Ok(Mat4::identity());
    }
    if !angle_degrees.is_finite() {
        return Err(OverlayError::InvalidParameter(format!(
            "rotation angle must be finite, got {angle_degrees}"
        )));
    }

    let axis = Vec3::from(axis);
    Mat4::rotation_about(utils::deg_to_rad(angle_degrees), &axis).ok_or_else(|| {
        OverlayError::InvalidParameter(format!(
            "rotation axis {:?} cannot be normalized",
            axis.as_slice()
        ))
    })
}

/// Placement of an auxiliary object mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjectPlacement {
    /// Translation applied after scale and rotation
    pub translation: [f32; 3],
    /// Rotation angle in degrees; 0 disables the rotation
    pub angle: f32,
    /// Rotation axis
    pub axis: [f32; 3],
    /// Per-axis scale factors
    pub scale: [f32; 3],
    /// Base color; `None` uses the session default
    pub color: Option<[f32; 3]>,
}

impl Default for ObjectPlacement {
    fn default() -> Self {
        Self {
            translation: [0.0, 0.0, 0.0],
            angle: 0.0,
            axis: [1.0, 0.0, 0.0],
            scale: [1.0, 1.0, 1.0],
            color: None,
        }
    }
}

impl ObjectPlacement {
    /// Placement with a translation
    pub fn at(translation: [f32; 3]) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    /// Set the rotation
    pub fn with_rotation(mut self, angle: f32, axis: [f32; 3]) -> Self {
        self.angle = angle;
        self.axis = axis;
        self
    }

    /// Set the per-axis scale
    pub fn with_scale(mut self, scale: [f32; 3]) -> Self {
        self.scale = scale;
        self
    }

    /// Set the base color
    pub fn with_color(mut self, color: [f32; 3]) -> Self {
        self.color = Some(color);
        self
    }
}

/// Accumulates placement steps into a single model matrix
#[derive(Debug, Clone, PartialEq)]
pub struct MeshTransformBuilder {
    matrix: Mat4,
}

impl MeshTransformBuilder {
    /// Start from the identity
    pub fn new() -> Self {
        Self {
            matrix: Mat4::identity(),
        }
    }

    /// Append an arbitrary step
    pub fn then(mut self, step: &Mat4) -> Self {
        self.matrix = step * self.matrix;
        self
    }

    /// Append scale along x, then y, then z, each anchored at the origin
    pub fn scale(self, factors: [f32; 3]) -> Result<Self> {
        if factors.iter().any(|f| !f.is_finite()) {
            return Err(OverlayError::InvalidParameter(format!(
                "scale factors must be finite, got {factors:?}"
            )));
        }
        Ok(self
            .then(&Mat4::scale_along(factors[0], &Vec3::x()))
            .then(&Mat4::scale_along(factors[1], &Vec3::y()))
            .then(&Mat4::scale_along(factors[2], &Vec3::z())))
    }

    /// Append a rotation; a zero angle appends the identity
    pub fn rotate(self, angle_degrees: f32, axis: [f32; 3]) -> Result<Self> {
        let rotation = axis_rotation(angle_degrees, axis)?;
        Ok(self.then(&rotation))
    }

    /// Append a translation
    pub fn translate(self, offset: [f32; 3]) -> Result<Self> {
        if offset.iter().any(|t| !t.is_finite()) {
            return Err(OverlayError::InvalidParameter(format!(
                "translation must be finite, got {offset:?}"
            )));
        }
        Ok(self.then(&Mat4::new_translation(&Vec3::from(offset))))
    }

    /// Append the body-model to scene correction
    pub fn correct_coordinates(self) -> Self {
        self.then(&coordinate_correction())
    }

    /// Finished model matrix
    pub fn build(self) -> Mat4 {
        self.matrix
    }

    /// Body path: correction, then the optional extra rotation
    pub fn body(rotation: Option<AxisRotation>) -> Result<Mat4> {
        let builder = Self::new().correct_coordinates();
        let builder = match rotation {
            Some(r) => builder.rotate(r.angle_degrees, r.axis)?,
            None => builder,
        };
        Ok(builder.build())
    }

    /// Object path: scale x/y/z, rotation, translation, then correction
    pub fn object(placement: &ObjectPlacement) -> Result<Mat4> {
        Ok(Self::new()
            .scale(placement.scale)?
            .rotate(placement.angle, placement.axis)?
            .translate(placement.translation)?
            .correct_coordinates()
            .build())
    }
}

impl Default for MeshTransformBuilder {
    fn default() -> Self {
        Self::new()
    }
}
