//! Error Types
//!
//! [`OverlayError`] covers every failure a render session reports. Subsystem
//! errors ([`MeshIoError`], [`ConfigError`], image I/O) are wrapped unchanged.

use thiserror::Error;

use crate::assets::MeshIoError;
use crate::config::ConfigError;
use crate::scene::NodeHandle;

/// The main error type of the crate.
#[derive(Error, Debug)]
pub enum OverlayError {
    /// Raster output and background image differ in size.
    #[error("Dimension mismatch: raster is {expected:?}, background is {actual:?}")]
    DimensionMismatch {
        /// `(width, height)` of the rendered raster
        expected: (u32, u32),
        /// `(width, height)` of the supplied background
        actual: (u32, u32),
    },

    /// An operation needed an armed camera and none was pushed.
    #[error("No camera is armed in the scene")]
    NoCamera,

    /// A camera is already armed; pop it before pushing another.
    #[error("A camera is already pushed; call pop_and_render before pushing another")]
    CameraAlreadyPushed,

    /// A single-shot render was requested while pushed nodes are pending.
    #[error("Session is armed ({humans} humans, {objects} objects, camera: {camera}); pop it first")]
    SessionArmed {
        /// Pending body meshes
        humans: usize,
        /// Pending object meshes
        objects: usize,
        /// Whether a camera is pending
        camera: bool,
    },

    /// A matrix that had to be inverted is singular.
    #[error("Matrix is not invertible: {0}")]
    SingularMatrix(&'static str),

    /// Mesh loading or export failed.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(#[from] MeshIoError),

    /// A caller-supplied parameter cannot be used.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A node handle no longer refers to a live scene node.
    #[error("Unknown scene node {0:?}")]
    UnknownNode(NodeHandle),

    /// Background image I/O failed.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Configuration could not be loaded or validated.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, OverlayError>;
