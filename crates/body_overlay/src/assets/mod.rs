//! Asset loading
//!
//! Mesh files, background frames and the body face table.

pub mod obj_loader;
pub mod image_loader;
pub mod body_faces;

pub use obj_loader::{MeshIo, MeshIoError, ObjLoader};
pub use image_loader::{load_background, save_frame, solid_canvas};
pub use body_faces::BodyTopology;
