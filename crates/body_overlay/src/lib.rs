//! # Body Overlay
//!
//! Composites a 3D human-body mesh, and optionally auxiliary object meshes,
//! over a 2D background frame. Body-fitting pipelines estimate mesh vertices
//! together with a per-frame weak-perspective camera `(sx, sy, tx, ty)`; this
//! crate renders the mesh with that camera so it lines up with the photo.
//!
//! ## Features
//!
//! - **Weak-Perspective Camera**: affine projection matching body-fitting output
//! - **Two Render Paths**: single-shot calls and push/pop accumulation
//! - **Hard-Threshold Compositing**: rendered pixels fully replace the background
//! - **Pluggable Rasterizer**: CPU rasterizer included, any backend can plug in
//! - **Config Files**: renderer settings in TOML or RON
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use body_overlay::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let body = BodyTopology::from_obj("template.obj")?;
//!     let mut session = RenderSession::with_software(RendererConfig::default(), body)?;
//!
//!     let background = load_background("frame.png")?;
//!     let vertices: Vec<[f32; 3]> = Vec::new(); // from the fitting pipeline
//!     let camera = CameraParams::new(0.9, 0.9, 0.0, 0.1)?;
//!
//!     let frame = session.render(&background, &vertices, camera, None, None, None)?;
//!     save_frame(&frame, "overlay.png")?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Configuration
pub mod config;
pub mod core;

pub mod foundation;
pub mod assets;
pub mod render;
pub mod scene;

mod error;
mod session;

pub use error::{OverlayError, Result};
pub use session::RenderSession;

/// Common imports for library users
pub mod prelude {
    pub use crate::{
        OverlayError, RenderSession,
        assets::{load_background, save_frame, solid_canvas, BodyTopology, MeshIo, ObjLoader},
        core::config::{RendererConfig, LightConfig, MaterialConfig, Config},
        foundation::math::{Vec3, Vec4, Mat4},
        render::{
            AxisRotation, CameraParams, ObjectPlacement, Rasterizer, RenderFlags,
            SoftwareRasterizer, TriMesh,
        },
        scene::{NodeHandle, SceneGraph, SlotMapGraph},
    };
}
