//! # Rendering System
//!
//! Everything between a placed mesh and a composited frame:
//! - **Primitives**: triangle meshes and the two camera models
//! - **Transform**: placement of body and object meshes in the scene
//! - **Rasterizer**: the offscreen pass interface plus a CPU implementation
//! - **Compositor**: hard-threshold compositing over the background frame

// Core primitives
pub mod primitives;

// Surface description
pub mod material;
pub mod lighting;

pub mod transform;

// Offscreen passes
pub mod rasterizer;
pub mod software;
pub mod compositor;

pub use primitives::{CameraParams, PerspectiveCamera, SceneCamera, TriMesh, WeakPerspectiveCamera};
pub use material::{AlphaMode, Material};
pub use lighting::{light_rig, PlacedLight, PointLight};
pub use transform::{AxisRotation, MeshTransformBuilder, ObjectPlacement};
pub use rasterizer::{DepthImage, RasterOutput, RenderFlags, Rasterizer};
pub use software::SoftwareRasterizer;
pub use compositor::{composite, Compositor};
