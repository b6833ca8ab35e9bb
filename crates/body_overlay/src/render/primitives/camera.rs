//! # Camera Models
//!
//! Two cameras can be armed in a session:
//!
//! - [`WeakPerspectiveCamera`]: the one that matters. Body-fitting pipelines
//!   estimate a per-frame `(sx, sy, tx, ty)` that maps model space straight
//!   onto the image. Its "projection" matrix is an affine scale and shift in
//!   x/y with a z sign flip; there is no perspective divide.
//! - [`PerspectiveCamera`]: an ordinary OpenGL-style pinhole used by the
//!   default-camera path.
//!
//! Both live in a scene node with an identity pose, so view space equals
//! world space and the camera looks down -Z.

use serde::{Serialize, Deserialize};

use crate::error::{OverlayError, Result};
use crate::foundation::math::{Mat4, Vec2};

/// Near plane used when none is given
pub const DEFAULT_Z_NEAR: f32 = 0.05;

/// Validated weak-perspective parameters `(sx, sy, tx, ty)`
///
/// Both scales must be finite and nonzero; they land on the diagonal of the
/// projection matrix and a zero there makes it singular.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f32; 4]", into = "[f32; 4]")]
pub struct CameraParams {
    scale_x: f32,
    scale_y: f32,
    trans_x: f32,
    trans_y: f32,
}

impl CameraParams {
    /// Create camera parameters, rejecting zero or non-finite values
    pub fn new(scale_x: f32, scale_y: f32, trans_x: f32, trans_y: f32) -> Result<Self> {
        if !(scale_x.is_finite() && scale_y.is_finite()) || scale_x == 0.0 || scale_y == 0.0 {
            return Err(OverlayError::InvalidParameter(format!(
                "camera scale must be finite and nonzero, got ({scale_x}, {scale_y})"
            )));
        }
        if !(trans_x.is_finite() && trans_y.is_finite()) {
            return Err(OverlayError::InvalidParameter(format!(
                "camera translation must be finite, got ({trans_x}, {trans_y})"
            )));
        }

        Ok(Self {
            scale_x,
            scale_y,
            trans_x,
            trans_y,
        })
    }

    /// Scale along x
    pub fn scale_x(&self) -> f32 {
        self.scale_x
    }

    /// Scale along y
    pub fn scale_y(&self) -> f32 {
        self.scale_y
    }

    /// Translation along x, in pre-scale units
    pub fn trans_x(&self) -> f32 {
        self.trans_x
    }

    /// Translation along y, in pre-scale units, mathematical y-up
    pub fn trans_y(&self) -> f32 {
        self.trans_y
    }

    /// Build the camera these parameters describe
    pub fn to_camera(self, zfar: Option<f32>) -> WeakPerspectiveCamera {
        WeakPerspectiveCamera {
            scale: Vec2::new(self.scale_x, self.scale_y),
            translation: Vec2::new(self.trans_x, self.trans_y),
            znear: DEFAULT_Z_NEAR,
            zfar,
        }
    }
}

impl TryFrom<[f32; 4]> for CameraParams {
    type Error = OverlayError;

    fn try_from(value: [f32; 4]) -> Result<Self> {
        let [sx, sy, tx, ty] = value;
        Self::new(sx, sy, tx, ty)
    }
}

impl From<CameraParams> for [f32; 4] {
    fn from(params: CameraParams) -> Self {
        [params.scale_x, params.scale_y, params.trans_x, params.trans_y]
    }
}

/// Weak-perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct WeakPerspectiveCamera {
    /// `(sx, sy)` scale
    pub scale: Vec2,
    /// `(tx, ty)` translation
    pub translation: Vec2,
    /// Near plane; kept for the scene but unused by the matrix
    pub znear: f32,
    /// Far plane; kept for the scene but unused by the matrix
    pub zfar: Option<f32>,
}

impl WeakPerspectiveCamera {
    /// Projection matrix of this camera
    ///
    /// Identity except `P[0][0]=sx`, `P[1][1]=sy`, `P[0][3]=tx*sx`,
    /// `P[1][3]=-ty*sy` and `P[2][2]=-1`. `znear`/`zfar` do not enter the
    /// matrix; consumers rely on this staying affine.
    pub fn projection_matrix(&self) -> Mat4 {
        let mut p = Mat4::identity();
        p[(0, 0)] = self.scale.x;
        p[(1, 1)] = self.scale.y;
        p[(0, 3)] = self.translation.x * self.scale.x;
        p[(1, 3)] = -self.translation.y * self.scale.y;
        p[(2, 2)] = -1.0;
        p
    }
}

/// Pinhole perspective camera
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in radians
    pub yfov: f32,
    /// Width over height; `None` follows the viewport
    pub aspect_ratio: Option<f32>,
    /// Near plane
    pub znear: f32,
    /// Far plane; `None` gives an infinite projection
    pub zfar: Option<f32>,
}

impl PerspectiveCamera {
    /// Camera with the given vertical field of view and default planes
    pub fn new(yfov: f32) -> Self {
        Self {
            yfov,
            aspect_ratio: None,
            znear: DEFAULT_Z_NEAR,
            zfar: None,
        }
    }

    /// OpenGL-style projection for a `width` x `height` viewport
    pub fn projection_matrix(&self, width: u32, height: u32) -> Mat4 {
        let aspect = self
            .aspect_ratio
            .unwrap_or_else(|| width as f32 / height.max(1) as f32);
        let t = (self.yfov / 2.0).tan();
        let n = self.znear;

        let mut p = Mat4::zeros();
        p[(0, 0)] = 1.0 / (aspect * t);
        p[(1, 1)] = 1.0 / t;
        p[(3, 2)] = -1.0;

        match self.zfar {
            Some(f) => {
                p[(2, 2)] = (f + n) / (n - f);
                p[(2, 3)] = 2.0 * f * n / (n - f);
            }
            None => {
                p[(2, 2)] = -1.0;
                p[(2, 3)] = -2.0 * n;
            }
        }

        p
    }
}

/// Any camera that can be armed in a scene
#[derive(Debug, Clone, PartialEq)]
pub enum SceneCamera {
    /// Weak-perspective camera
    WeakPerspective(WeakPerspectiveCamera),
    /// Perspective camera
    Perspective(PerspectiveCamera),
}

impl SceneCamera {
    /// Projection matrix for a `width` x `height` viewport
    pub fn projection_matrix(&self, width: u32, height: u32) -> Mat4 {
        match self {
            Self::WeakPerspective(camera) => camera.projection_matrix(),
            Self::Perspective(camera) => camera.projection_matrix(width, height),
        }
    }

    /// Whether the projection keeps `w = 1` (no perspective divide)
    pub fn is_orthographic(&self) -> bool {
        matches!(self, Self::WeakPerspective(_))
    }

    /// Near plane distance
    pub fn znear(&self) -> f32 {
        match self {
            Self::WeakPerspective(camera) => camera.znear,
            Self::Perspective(camera) => camera.znear,
        }
    }
}

impl From<WeakPerspectiveCamera> for SceneCamera {
    fn from(camera: WeakPerspectiveCamera) -> Self {
        Self::WeakPerspective(camera)
    }
}

impl From<PerspectiveCamera> for SceneCamera {
    fn from(camera: PerspectiveCamera) -> Self {
        Self::Perspective(camera)
    }
}
