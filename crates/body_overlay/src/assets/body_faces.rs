//! Body topology
//!
//! Body models share one fixed triangle table across every frame. The table
//! is handed to the session explicitly so tests can substitute a cube.

use std::path::Path;
use std::sync::Arc;

use crate::assets::obj_loader::{MeshIoError, ObjLoader};
use crate::error::{OverlayError, Result};
use crate::render::primitives::{FaceTable, TriMesh};

/// Read-only face table of the body model
#[derive(Debug, Clone)]
pub struct BodyTopology {
    faces: FaceTable,
    required_vertices: usize,
    template_vertices: Option<usize>,
}

impl BodyTopology {
    /// Topology from a triangle list
    pub fn from_triangles(faces: impl Into<FaceTable>) -> Self {
        let faces = faces.into();
        let required_vertices = faces
            .iter()
            .flat_map(|f| f.iter())
            .max()
            .map_or(0, |&i| i as usize + 1);

        Self {
            faces,
            required_vertices,
            template_vertices: None,
        }
    }

    /// Topology taken from a template mesh; its vertex count becomes mandatory
    pub fn from_template(template: &TriMesh) -> Result<Self> {
        template.validate()?;
        let mut topology = Self::from_triangles(Arc::clone(&template.faces));
        topology.template_vertices = Some(template.vertex_count());
        Ok(topology)
    }

    /// Topology read from the faces of an OBJ template
    pub fn from_obj<P: AsRef<Path>>(path: P) -> Result<Self> {
        let template = ObjLoader::load_obj(path)?;
        Self::from_template(&template)
    }

    /// Shared face table
    pub fn faces(&self) -> &FaceTable {
        &self.faces
    }

    /// Number of triangles
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Build a body mesh from per-frame vertex rows
    ///
    /// The vertex buffer is copied; the face table is shared.
    pub fn build_mesh(&self, vertices: &[[f32; 3]]) -> Result<TriMesh> {
        if let Some(expected) = self.template_vertices {
            if vertices.len() != expected {
                return Err(OverlayError::InvalidParameter(format!(
                    "body mesh needs {expected} vertices, got {}",
                    vertices.len()
                )));
            }
        }
        if vertices.len() < self.required_vertices {
            return Err(OverlayError::InvalidParameter(format!(
                "face table indexes {} vertices, got {}",
                self.required_vertices,
                vertices.len()
            )));
        }

        let mesh = TriMesh::from_rows(vertices, &self.faces);
        mesh.validate().map_err(|e| match e {
            MeshIoError::InvalidFormat(message) => OverlayError::InvalidParameter(message),
            other => OverlayError::InvalidMesh(other),
        })?;
        Ok(mesh)
    }
}
