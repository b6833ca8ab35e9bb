//! Core primitive types for rendering
//!
//! Geometry and camera models shared by the transform, scene and
//! rasterization code.

pub mod mesh;
pub mod camera;

// Re-export commonly used types
pub use mesh::{FaceTable, TriMesh};
pub use camera::{
    CameraParams, PerspectiveCamera, SceneCamera, WeakPerspectiveCamera,
    DEFAULT_Z_NEAR,
};
