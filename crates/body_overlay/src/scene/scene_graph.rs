//! Scene graph trait and implementations
//!
//! A flat scene: every node is an entity (camera, light or mesh) with a world
//! pose. Whoever inserts a node owns its handle and must remove it; nothing
//! is collected automatically.

use slotmap::SlotMap;

use crate::error::{OverlayError, Result};
use crate::foundation::math::{Mat4, Vec3};
use crate::render::lighting::PointLight;
use crate::render::material::Material;
use crate::render::primitives::{SceneCamera, TriMesh};

slotmap::new_key_type! {
    /// Opaque, generation-checked handle to a scene node
    pub struct NodeHandle;
}

/// A mesh ready to be drawn
#[derive(Debug, Clone, PartialEq)]
pub struct MeshEntity {
    /// World-space geometry
    pub mesh: TriMesh,
    /// Surface material
    pub material: Material,
    /// Optional debug name
    pub name: Option<String>,
}

impl MeshEntity {
    /// Unnamed mesh entity
    pub fn new(mesh: TriMesh, material: Material) -> Self {
        Self {
            mesh,
            material,
            name: None,
        }
    }

    /// Attach a debug name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Anything that can live in the scene
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEntity {
    /// A camera
    Camera(SceneCamera),
    /// A point light
    Light(PointLight),
    /// A mesh
    Mesh(MeshEntity),
}

impl SceneEntity {
    /// Short kind label used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Camera(_) => "camera",
            Self::Light(_) => "light",
            Self::Mesh(_) => "mesh",
        }
    }
}

/// Entity plus world pose
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    /// The entity
    pub entity: SceneEntity,
    /// Node-to-world transform
    pub pose: Mat4,
}

impl SceneNode {
    /// World-space position of the node origin
    pub fn position(&self) -> Vec3 {
        Vec3::new(self.pose[(0, 3)], self.pose[(1, 3)], self.pose[(2, 3)])
    }

    /// The camera, if this is a camera node
    pub fn camera(&self) -> Option<&SceneCamera> {
        match &self.entity {
            SceneEntity::Camera(camera) => Some(camera),
            _ => None,
        }
    }
}

/// Trait for scene storage used by sessions and rasterizers
pub trait SceneGraph: Send {
    /// Insert an entity with the given pose
    fn add_node(&mut self, entity: SceneEntity, pose: Mat4) -> NodeHandle;

    /// Remove a node, returning it; stale handles are an error
    fn remove_node(&mut self, handle: NodeHandle) -> Result<SceneNode>;

    /// Look up a live node
    fn node(&self, handle: NodeHandle) -> Option<&SceneNode>;

    /// Iterate over all live nodes
    fn nodes(&self) -> Box<dyn Iterator<Item = (NodeHandle, &SceneNode)> + '_>;

    /// Camera node used for rendering, if any
    fn main_camera(&self) -> Option<NodeHandle>;

    /// Get the total number of nodes in the scene graph
    fn node_count(&self) -> usize;

    /// Ambient light color applied to every mesh
    fn ambient_light(&self) -> Vec3;

    /// Clear color of a render pass
    fn bg_color(&self) -> [f32; 4];

    /// Number of live mesh nodes
    fn mesh_count(&self) -> usize {
        self.nodes()
            .filter(|(_, node)| matches!(node.entity, SceneEntity::Mesh(_)))
            .count()
    }
}

/// Arena-backed scene graph
///
/// Nodes live in a slot map, so a removed handle can never alias a node
/// inserted later.
#[derive(Debug)]
pub struct SlotMapGraph {
    nodes: SlotMap<NodeHandle, SceneNode>,
    main_camera: Option<NodeHandle>,
    ambient_light: Vec3,
    bg_color: [f32; 4],
}

impl SlotMapGraph {
    /// Create a new empty scene graph
    pub fn new(ambient_light: Vec3, bg_color: [f32; 4]) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            main_camera: None,
            ambient_light,
            bg_color,
        }
    }

    fn next_camera(&self) -> Option<NodeHandle> {
        self.nodes
            .iter()
            .find(|(_, node)| node.camera().is_some())
            .map(|(handle, _)| handle)
    }
}

impl Default for SlotMapGraph {
    fn default() -> Self {
        Self::new(Vec3::zeros(), [0.0, 0.0, 0.0, 0.0])
    }
}

impl SceneGraph for SlotMapGraph {
    fn add_node(&mut self, entity: SceneEntity, pose: Mat4) -> NodeHandle {
        let is_camera = matches!(entity, SceneEntity::Camera(_));
        let kind = entity.kind();
        let handle = self.nodes.insert(SceneNode { entity, pose });

        if is_camera && self.main_camera.is_none() {
            self.main_camera = Some(handle);
        }

        log::trace!("Added {} node {:?} ({} live)", kind, handle, self.nodes.len());
        handle
    }

    fn remove_node(&mut self, handle: NodeHandle) -> Result<SceneNode> {
        let node = self
            .nodes
            .remove(handle)
            .ok_or(OverlayError::UnknownNode(handle))?;

        if self.main_camera == Some(handle) {
            self.main_camera = self.next_camera();
        }

        log::trace!("Removed {} node {:?} ({} live)", node.entity.kind(), handle, self.nodes.len());
        Ok(node)
    }

    fn node(&self, handle: NodeHandle) -> Option<&SceneNode> {
        self.nodes.get(handle)
    }

    fn nodes(&self) -> Box<dyn Iterator<Item = (NodeHandle, &SceneNode)> + '_> {
        Box::new(self.nodes.iter())
    }

    fn main_camera(&self) -> Option<NodeHandle> {
        self.main_camera
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn ambient_light(&self) -> Vec3 {
        self.ambient_light
    }

    fn bg_color(&self) -> [f32; 4] {
        self.bg_color
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::primitives::PerspectiveCamera;

    fn camera() -> SceneEntity {
        SceneEntity::Camera(PerspectiveCamera::new(1.0).into())
    }

    fn cube() -> SceneEntity {
        SceneEntity::Mesh(MeshEntity::new(TriMesh::cube(1.0), Material::default()))
    }

    #[test]
    fn test_add_remove() {
        let mut graph = SlotMapGraph::default();
        let a = graph.add_node(cube(), Mat4::identity());
        let b = graph.add_node(cube(), Mat4::identity());
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.mesh_count(), 2);

        let removed = graph.remove_node(a).unwrap();
        assert!(matches!(removed.entity, SceneEntity::Mesh(_)));
        assert_eq!(graph.node_count(), 1);
        assert!(graph.node(a).is_none());
        assert!(graph.node(b).is_some());
    }

    #[test]
    fn test_stale_handle_is_rejected() {
        let mut graph = SlotMapGraph::default();
        let handle = graph.add_node(cube(), Mat4::identity());
        graph.remove_node(handle).unwrap();

        assert!(matches!(graph.remove_node(handle), Err(OverlayError::UnknownNode(h)) if h == handle));

        let reused = graph.add_node(cube(), Mat4::identity());
        assert_ne!(reused, handle);
        assert!(graph.node(handle).is_none());
    }

    #[test]
    fn test_main_camera_tracking() {
        let mut graph = SlotMapGraph::default();
        assert!(graph.main_camera().is_none());

        let first = graph.add_node(camera(), Mat4::identity());
        let second = graph.add_node(camera(), Mat4::identity());
        assert_eq!(graph.main_camera(), Some(first));

        graph.remove_node(first).unwrap();
        assert_eq!(graph.main_camera(), Some(second));

        graph.remove_node(second).unwrap();
        assert!(graph.main_camera().is_none());
    }

    #[test]
    fn test_node_position_from_pose() {
        let mut graph = SlotMapGraph::default();
        let pose = Mat4::new_translation(&Vec3::new(1.0, 2.0, 3.0));
        let handle = graph.add_node(SceneEntity::Light(PointLight::white()), pose);
        assert_eq!(graph.node(handle).unwrap().position(), Vec3::new(1.0, 2.0, 3.0));
    }
}
