//! OBJ file loader and writer for triangle meshes
//!
//! Only geometry is read: `v` positions and `f` faces. Texture coordinates,
//! normals, groups and materials are skipped. Polygons are fan-triangulated.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

use crate::foundation::math::Vec3;
use crate::render::primitives::TriMesh;

/// Mesh loading and export errors
#[derive(Error, Debug)]
pub enum MeshIoError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A line could not be parsed
    #[error("Parse error on line {line}: {message}")]
    ParseError {
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },
    /// The file parsed but does not describe a usable mesh
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    /// No loader is available for this file type
    #[error("Unsupported mesh format: {0}")]
    UnsupportedFormat(String),
}

/// Mesh file access used by render sessions
///
/// Implemented by [`ObjLoader`]; tests and embedders can supply their own.
pub trait MeshIo: Send {
    /// Load a mesh from disk
    fn load_mesh(&self, path: &Path) -> Result<TriMesh, MeshIoError>;

    /// Write a mesh to disk
    fn export_mesh(&self, mesh: &TriMesh, path: &Path) -> Result<(), MeshIoError>;
}

/// Wavefront OBJ reader/writer
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjLoader;

impl ObjLoader {
    /// Load an OBJ file and return a mesh
    pub fn load_obj<P: AsRef<Path>>(path: P) -> Result<TriMesh, MeshIoError> {
        let path = path.as_ref();
        log::debug!("Loading OBJ mesh from {:?}", path);

        let file = File::open(path)?;
        let mesh = Self::parse(BufReader::new(file))?;

        log::debug!(
            "Loaded {} vertices / {} faces from {:?}",
            mesh.vertex_count(),
            mesh.face_count(),
            path
        );
        Ok(mesh)
    }

    /// Parse OBJ text from any reader
    pub fn parse<R: BufRead>(reader: R) -> Result<TriMesh, MeshIoError> {
        let mut positions = Vec::new();
        let mut faces: Vec<[u32; 3]> = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line?;
            let line = line.trim();

            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let mut parts = line.split_whitespace();
            match parts.next() {
                Some("v") => {
                    let mut coord = || -> Result<f32, MeshIoError> {
                        parts
                            .next()
                            .and_then(|s| s.parse().ok())
                            .ok_or_else(|| MeshIoError::ParseError {
                                line: line_no,
                                message: "vertex needs three numeric coordinates".to_string(),
                            })
                    };
                    let (x, y, z) = (coord()?, coord()?, coord()?);
                    positions.push(Vec3::new(x, y, z));
                }
                Some("f") => {
                    let corners = parts
                        .map(|corner| Self::resolve_index(corner, positions.len(), line_no))
                        .collect::<Result<Vec<u32>, _>>()?;

                    if corners.len() < 3 {
                        return Err(MeshIoError::ParseError {
                            line: line_no,
                            message: format!("face has {} corners", corners.len()),
                        });
                    }

                    // Triangulate face (simple fan triangulation)
                    for i in 1..(corners.len() - 1) {
                        faces.push([corners[0], corners[i], corners[i + 1]]);
                    }
                }
                _ => {
                    // Ignore other commands
                }
            }
        }

        if positions.is_empty() {
            return Err(MeshIoError::InvalidFormat("No vertices found in OBJ file".to_string()));
        }

        Ok(TriMesh::new(positions, faces))
    }

    /// Turn a `v`, `v/vt` or `v/vt/vn` corner into a 0-based position index.
    /// Negative indices count back from the most recent vertex.
    fn resolve_index(corner: &str, vertex_count: usize, line: usize) -> Result<u32, MeshIoError> {
        let raw = corner.split('/').next().unwrap_or_default();
        let parsed: i64 = raw.parse().map_err(|_| MeshIoError::ParseError {
            line,
            message: format!("invalid position index '{raw}'"),
        })?;

        let resolved = match parsed {
            0 => None,
            p if p > 0 => Some(p - 1),
            n => Some(vertex_count as i64 + n),
        };

        resolved
            .filter(|&i| i >= 0 && (i as usize) < vertex_count)
            .map(|i| i as u32)
            .ok_or_else(|| MeshIoError::ParseError {
                line,
                message: format!("position index {parsed} out of range ({vertex_count} vertices)"),
            })
    }

    /// Write a mesh as OBJ (positions and 1-based triangle faces)
    pub fn write_obj<P: AsRef<Path>>(mesh: &TriMesh, path: P) -> Result<(), MeshIoError> {
        let path = path.as_ref();
        let mut out = BufWriter::new(File::create(path)?);

        for p in &mesh.positions {
            writeln!(out, "v {} {} {}", p.x, p.y, p.z)?;
        }
        for [a, b, c] in mesh.faces.iter() {
            writeln!(out, "f {} {} {}", a + 1, b + 1, c + 1)?;
        }
        out.flush()?;

        log::debug!("Exported {} vertices / {} faces to {:?}", mesh.vertex_count(), mesh.face_count(), path);
        Ok(())
    }
}

impl MeshIo for ObjLoader {
    fn load_mesh(&self, path: &Path) -> Result<TriMesh, MeshIoError> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("obj") => Self::load_obj(path),
            _ => Err(MeshIoError::UnsupportedFormat(path.display().to_string())),
        }
    }

    fn export_mesh(&self, mesh: &TriMesh, path: &Path) -> Result<(), MeshIoError> {
        Self::write_obj(mesh, path)
    }
}
