//! Scene descriptions for the `scene` subcommand
//!
//! A scene file lists everything pushed before a single `pop_and_render`:
//!
//! ```ron
//! (
//!     template: Some("smpl_template.obj"),
//!     camera: Some((0.9, 0.9, 0.0, 0.1)),
//!     background: Some("frame.png"),
//!     humans: [(vertices: "frame_0001.obj", color: None)],
//!     objects: [(mesh: "ball.obj", placement: (translation: (0.2, 0.0, 0.0)))],
//! )
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use body_overlay::config::Config;
use body_overlay::prelude::*;
use image::RgbImage;
use serde::{Deserialize, Serialize};

/// A body mesh to push
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HumanEntry {
    /// OBJ whose vertex positions are the body vertices
    pub vertices: PathBuf,
    /// Override of the configured body color
    #[serde(default)]
    pub color: Option<[f32; 3]>,
}

/// An object mesh to push
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectEntry {
    /// OBJ mesh file
    pub mesh: PathBuf,
    /// Placement of the mesh
    #[serde(default)]
    pub placement: ObjectPlacement,
}

/// Everything rendered in one push/pop cycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    /// OBJ providing the body face table
    pub template: Option<PathBuf>,
    /// Weak-perspective camera; `None` arms the default perspective camera
    pub camera: Option<CameraParams>,
    /// Background frame; `None` renders on white
    pub background: Option<PathBuf>,
    /// Body meshes
    pub humans: Vec<HumanEntry>,
    /// Object meshes
    pub objects: Vec<ObjectEntry>,
}

impl Config for SceneDescription {}

impl SceneDescription {
    /// Resolve relative paths against the directory of the scene file
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        if let Some(template) = self.template.as_mut() {
            resolve(template);
        }
        if let Some(background) = self.background.as_mut() {
            resolve(background);
        }
        self.humans.iter_mut().for_each(|h| resolve(&mut h.vertices));
        self.objects.iter_mut().for_each(|o| resolve(&mut o.mesh));
    }

    /// Body topology for the humans of this scene
    pub fn topology(&self) -> Result<BodyTopology> {
        match &self.template {
            Some(path) => BodyTopology::from_obj(path)
                .with_context(|| format!("Failed to load body template {}", path.display())),
            None if self.humans.is_empty() => Ok(BodyTopology::from_triangles(Vec::<[u32; 3]>::new())),
            None => anyhow::bail!("Scene has humans but no body template"),
        }
    }

    /// Push everything and render it
    ///
    /// Files are read before anything is pushed. If a push fails the nodes
    /// pushed so far are discarded, leaving the session idle.
    pub fn render<R: Rasterizer>(&self, session: &mut RenderSession<R>) -> Result<RgbImage> {
        let background = self
            .background
            .as_ref()
            .map(|path| {
                load_background(path).with_context(|| format!("Failed to load background {}", path.display()))
            })
            .transpose()?;
        let humans = self
            .humans
            .iter()
            .map(|human| Ok((read_vertices(&human.vertices)?, human.color)))
            .collect::<Result<Vec<_>>>()?;

        if let Err(e) = self.push_all(session, &humans) {
            session
                .discard_pushed()
                .context("Failed to discard a partially pushed scene")?;
            return Err(e);
        }
        log::info!(
            "Pushed {} humans and {} objects",
            session.pushed_humans(),
            session.pushed_objects()
        );

        Ok(session.pop_and_render(background.as_ref())?)
    }

    fn push_all<R: Rasterizer>(
        &self,
        session: &mut RenderSession<R>,
        humans: &[(Vec<[f32; 3]>, Option<[f32; 3]>)],
    ) -> Result<()> {
        match self.camera {
            Some(params) => session.push_cam(params)?,
            None => session.push_default_cam()?,
        }
        for (rows, color) in humans {
            session.push_human(rows, *color)?;
        }
        for object in &self.objects {
            session
                .push_obj(&object.mesh, &object.placement)
                .with_context(|| format!("Failed to push object {}", object.mesh.display()))?;
        }
        Ok(())
    }
}

/// Vertex rows of an OBJ file
pub fn read_vertices(path: &Path) -> Result<Vec<[f32; 3]>> {
    let mesh = ObjLoader::load_obj(path).with_context(|| format!("Failed to read vertices from {}", path.display()))?;
    Ok(mesh.positions.iter().map(|p| [p.x, p.y, p.z]).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("overlay_app_{}_{name}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    const SCENE: &str = r#"
template = "cube.obj"
camera = [1.0, 1.0, 0.0, 0.0]

[[humans]]
vertices = "cube.obj"
color = [0.2, 0.2, 0.2]

[[objects]]
mesh = "cube.obj"

[objects.placement]
translation = [0.2, 0.0, 0.0]
scale = [0.5, 0.5, 0.5]
"#;

    #[test]
    fn test_load_and_resolve() {
        let dir = temp_dir("resolve");
        let path = dir.join("scene.toml");
        std::fs::write(&path, SCENE).unwrap();

        let mut scene = SceneDescription::load_from_file(&path).unwrap();
        scene.resolve_paths(&dir);

        assert_eq!(scene.template, Some(dir.join("cube.obj")));
        assert_eq!(scene.humans[0].vertices, dir.join("cube.obj"));
        assert_eq!(scene.humans[0].color, Some([0.2, 0.2, 0.2]));
        assert_eq!(scene.objects[0].placement.translation, [0.2, 0.0, 0.0]);
        assert_eq!(scene.objects[0].placement.axis, [1.0, 0.0, 0.0]);
        assert!(scene.background.is_none());
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_humans_need_template() {
        let scene = SceneDescription {
            humans: vec![HumanEntry {
                vertices: PathBuf::from("a.obj"),
                color: None,
            }],
            ..SceneDescription::default()
        };
        assert!(scene.topology().is_err());
        assert!(SceneDescription::default().topology().is_ok());
    }

    #[test]
    fn test_render_scene_on_white() {
        let dir = temp_dir("render");
        ObjLoader::write_obj(&TriMesh::cube(0.5), dir.join("cube.obj")).unwrap();
        let path = dir.join("scene.toml");
        std::fs::write(&path, SCENE).unwrap();

        let mut scene = SceneDescription::load_from_file(&path).unwrap();
        scene.resolve_paths(&dir);

        let config = RendererConfig::new(64, 64);
        let mut session = RenderSession::with_software(config, scene.topology().unwrap()).unwrap();
        let frame = scene.render(&mut session).unwrap();

        assert_eq!(frame.dimensions(), (64, 64));
        assert_eq!(frame.get_pixel(0, 0).0, [255, 255, 255]);
        assert_ne!(frame.get_pixel(32, 32).0, [255, 255, 255]);
        assert!(session.is_idle());
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_failed_push_leaves_session_idle() {
        let dir = temp_dir("rollback");
        ObjLoader::write_obj(&TriMesh::cube(0.5), dir.join("cube.obj")).unwrap();
        let scene = SceneDescription {
            template: Some(dir.join("cube.obj")),
            camera: Some(CameraParams::new(1.0, 1.0, 0.0, 0.0).unwrap()),
            humans: vec![HumanEntry {
                vertices: dir.join("cube.obj"),
                color: None,
            }],
            objects: vec![ObjectEntry {
                mesh: dir.join("missing.obj"),
                placement: ObjectPlacement::default(),
            }],
            ..SceneDescription::default()
        };

        let mut session = RenderSession::with_software(RendererConfig::new(32, 32), scene.topology().unwrap()).unwrap();
        assert!(scene.render(&mut session).is_err());
        assert!(session.is_idle());
        assert_eq!(session.graph().node_count(), RendererConfig::LIGHT_COUNT);
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_unreadable_human_pushes_nothing() {
        let dir = temp_dir("unreadable");
        ObjLoader::write_obj(&TriMesh::cube(0.5), dir.join("cube.obj")).unwrap();
        let entry = |name: &str| HumanEntry {
            vertices: dir.join(name),
            color: None,
        };
        let scene = SceneDescription {
            template: Some(dir.join("cube.obj")),
            humans: vec![entry("cube.obj"), entry("missing.obj")],
            ..SceneDescription::default()
        };

        let mut session = RenderSession::with_software(RendererConfig::new(32, 32), scene.topology().unwrap()).unwrap();
        assert!(scene.render(&mut session).is_err());
        assert!(session.is_idle());
        assert_eq!(session.graph().node_count(), RendererConfig::LIGHT_COUNT);
        std::fs::remove_dir_all(dir).ok();
    }
}
