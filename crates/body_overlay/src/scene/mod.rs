//! Scene management
//!
//! The scene graph is the one piece of shared state between a render session
//! and the rasterizer: the session inserts and removes nodes, the rasterizer
//! only reads them.

pub mod scene_graph;

pub use scene_graph::{MeshEntity, NodeHandle, SceneEntity, SceneGraph, SceneNode, SlotMapGraph};
