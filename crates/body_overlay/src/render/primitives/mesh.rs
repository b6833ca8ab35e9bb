//! Triangle mesh geometry
//!
//! A [`TriMesh`] is a position buffer plus a triangle index table. The index
//! table sits behind an `Arc` so every body mesh of a process can share the
//! same topology while each render call owns its own transformed positions.

use std::sync::Arc;

use crate::assets::MeshIoError;
use crate::foundation::math::{Mat4, Mat4Ext, Vec3};

/// Triangle index table shared between meshes
pub type FaceTable = Arc<[[u32; 3]]>;

/// Indexed triangle mesh
#[derive(Debug, Clone, PartialEq)]
pub struct TriMesh {
    /// Vertex positions
    pub positions: Vec<Vec3>,

    /// Triangles as indices into `positions`
    pub faces: FaceTable,
}

impl TriMesh {
    /// Create a new mesh
    pub fn new(positions: Vec<Vec3>, faces: impl Into<FaceTable>) -> Self {
        Self {
            positions,
            faces: faces.into(),
        }
    }

    /// Build a mesh from raw `[x, y, z]` rows, sharing an existing face table
    pub fn from_rows(rows: &[[f32; 3]], faces: &FaceTable) -> Self {
        Self {
            positions: rows.iter().map(|r| Vec3::new(r[0], r[1], r[2])).collect(),
            faces: Arc::clone(faces),
        }
    }

    /// Axis-aligned cube of half-extent `half` centered at the origin
    ///
    /// Eight shared corners and twelve outward-wound triangles.
    pub fn cube(half: f32) -> Self {
        let h = half;
        let positions = vec![
            Vec3::new(-h, -h, -h),
            Vec3::new(h, -h, -h),
            Vec3::new(h, h, -h),
            Vec3::new(-h, h, -h),
            Vec3::new(-h, -h, h),
            Vec3::new(h, -h, h),
            Vec3::new(h, h, h),
            Vec3::new(-h, h, h),
        ];
        let faces: Vec<[u32; 3]> = vec![
            [0, 2, 1], [0, 3, 2], // back (-Z)
            [4, 5, 6], [4, 6, 7], // front (+Z)
            [0, 1, 5], [0, 5, 4], // bottom (-Y)
            [3, 7, 6], [3, 6, 2], // top (+Y)
            [0, 4, 7], [0, 7, 3], // left (-X)
            [1, 2, 6], [1, 6, 5], // right (+X)
        ];
        Self::new(positions, faces)
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of triangles
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Whether the mesh has no triangles to draw
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty() || self.faces.is_empty()
    }

    /// Return a transformed copy; the face table is shared, positions are new
    pub fn transformed(&self, transform: &Mat4) -> Self {
        Self {
            positions: self.positions.iter().map(|p| transform.apply_to_point(p)).collect(),
            faces: Arc::clone(&self.faces),
        }
    }

    /// Check that every face indexes an existing, finite vertex
    pub fn validate(&self) -> Result<(), MeshIoError> {
        if let Some(bad) = self.positions.iter().position(|p| !p.iter().all(|c| c.is_finite())) {
            return Err(MeshIoError::InvalidFormat(format!("vertex {bad} is not finite")));
        }

        let count = self.positions.len();
        if let Some(face) = self.faces.iter().find(|f| f.iter().any(|&i| i as usize >= count)) {
            return Err(MeshIoError::InvalidFormat(format!(
                "face {face:?} indexes past {count} vertices"
            )));
        }

        Ok(())
    }
}
