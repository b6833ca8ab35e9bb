//! # Render Session
//!
//! [`RenderSession`] is the public renderer. It owns a scene graph with three
//! fixed point lights and offers two ways of getting meshes on screen:
//!
//! - **Single shot**: [`render`](RenderSession::render) and
//!   [`render_obj`](RenderSession::render_obj) insert one mesh and one camera,
//!   render, composite and remove both before returning.
//! - **Push / pop**: [`push_cam`](RenderSession::push_cam),
//!   [`push_human`](RenderSession::push_human) and
//!   [`push_obj`](RenderSession::push_obj) accumulate nodes across calls;
//!   [`pop_and_render`](RenderSession::pop_and_render) renders them all in one
//!   pass and clears them.
//!
//! ```text
//!          push_cam / push_human / push_obj
//!   Idle ───────────────────────────────────▶ Armed
//!    ▲                                          │
//!    └──────────── pop_and_render ──────────────┘
//! ```
//!
//! A session is single-threaded: every operation takes `&mut self` and the
//! rasterizer behind it is never shared.

use std::path::Path;

use image::RgbImage;

use crate::assets::{solid_canvas, BodyTopology, MeshIo, ObjLoader};
use crate::core::RendererConfig;
use crate::error::{OverlayError, Result};
use crate::foundation::math::{Mat4, Point3, Vec3, Vec4};
use crate::render::compositor::Compositor;
use crate::render::lighting::light_rig;
use crate::render::material::Material;
use crate::render::primitives::{CameraParams, PerspectiveCamera, SceneCamera, TriMesh};
use crate::render::rasterizer::{RenderFlags, Rasterizer};
use crate::render::software::SoftwareRasterizer;
use crate::render::transform::{coordinate_correction, AxisRotation, MeshTransformBuilder, ObjectPlacement};
use crate::scene::{MeshEntity, NodeHandle, SceneEntity, SceneGraph, SlotMapGraph};

const WHITE: [u8; 3] = [255, 255, 255];

/// Body-mesh compositing renderer with a fixed resolution
pub struct RenderSession<R: Rasterizer> {
    config: RendererConfig,
    graph: SlotMapGraph,
    compositor: Compositor<R>,
    mesh_io: Box<dyn MeshIo>,
    body: BodyTopology,
    lights: Vec<NodeHandle>,
    camera: Option<NodeHandle>,
    human_nodes: Vec<NodeHandle>,
    object_nodes: Vec<NodeHandle>,
    white_canvas: Option<RgbImage>,
}

impl RenderSession<SoftwareRasterizer> {
    /// Session backed by the CPU rasterizer and OBJ mesh files
    pub fn with_software(config: RendererConfig, body: BodyTopology) -> Result<Self> {
        let rasterizer = SoftwareRasterizer::new(config.width(), config.height());
        Self::new(config, body, rasterizer, Box::new(ObjLoader))
    }
}

impl<R: Rasterizer> RenderSession<R> {
    /// Create a session and insert its light rig
    ///
    /// The rasterizer viewport must equal the configured resolution.
    pub fn new(config: RendererConfig, body: BodyTopology, rasterizer: R, mesh_io: Box<dyn MeshIo>) -> Result<Self> {
        config.validate()?;
        if rasterizer.viewport() != config.resolution {
            return Err(OverlayError::InvalidParameter(format!(
                "rasterizer viewport {:?} does not match resolution {:?}",
                rasterizer.viewport(),
                config.resolution
            )));
        }

        let mut graph = SlotMapGraph::new(Vec3::from(config.ambient_light), config.bg_color);
        let lights = light_rig(&config.lights)
            .into_iter()
            .map(|placed| graph.add_node(SceneEntity::Light(placed.light), placed.pose))
            .collect();

        let white_canvas = config
            .render_on_white
            .then(|| solid_canvas(config.width(), config.height(), WHITE));
        let compositor = Compositor::new(rasterizer, RenderFlags::for_mode(config.wireframe));

        log::info!(
            "Render session created at {}x{} (wireframe: {}, {} body faces)",
            config.width(),
            config.height(),
            config.wireframe,
            body.face_count()
        );

        Ok(Self {
            config,
            graph,
            compositor,
            mesh_io,
            body,
            lights,
            camera: None,
            human_nodes: Vec::new(),
            object_nodes: Vec::new(),
            white_canvas,
        })
    }

    // ---- state ----------------------------------------------------------

    /// Output `(width, height)`
    pub fn resolution(&self) -> (u32, u32) {
        self.config.resolution
    }

    /// Configuration the session was created with
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Scene graph as the rasterizer sees it
    pub fn graph(&self) -> &SlotMapGraph {
        &self.graph
    }

    /// The rasterizer behind the compositor
    pub fn rasterizer(&self) -> &R {
        self.compositor.rasterizer()
    }

    /// No camera and no pushed geometry
    pub fn is_idle(&self) -> bool {
        self.camera.is_none() && self.human_nodes.is_empty() && self.object_nodes.is_empty()
    }

    /// Whether a camera is armed
    pub fn has_camera(&self) -> bool {
        self.camera.is_some()
    }

    /// Number of pushed body meshes
    pub fn pushed_humans(&self) -> usize {
        self.human_nodes.len()
    }

    /// Number of pushed object meshes
    pub fn pushed_objects(&self) -> usize {
        self.object_nodes.len()
    }

    // ---- single shot ----------------------------------------------------

    /// Render one body mesh over `image`
    ///
    /// `rotation` is applied after the coordinate correction. With
    /// `export_path` set the corrected mesh is written out before the
    /// extra rotation. `color` defaults to the configured body color.
    pub fn render(
        &mut self,
        image: &RgbImage,
        vertices: &[[f32; 3]],
        camera: CameraParams,
        rotation: Option<AxisRotation>,
        export_path: Option<&Path>,
        color: Option<[f32; 3]>,
    ) -> Result<RgbImage> {
        self.ensure_idle()?;

        let model = MeshTransformBuilder::body(rotation)?;
        let mesh = self.body.build_mesh(vertices)?;
        if let Some(path) = export_path {
            self.mesh_io.export_mesh(&mesh.transformed(&coordinate_correction()), path)?;
            log::debug!("Exported corrected body mesh to {}", path.display());
        }

        let entity = self.human_entity(&mesh.transformed(&model), color);
        let camera = self.weak_camera(camera);
        self.render_transient(image, entity, camera)
    }

    /// Render one object mesh loaded from `mesh_path` over `image`
    pub fn render_obj(
        &mut self,
        image: &RgbImage,
        mesh_path: &Path,
        camera: CameraParams,
        placement: &ObjectPlacement,
    ) -> Result<RgbImage> {
        self.ensure_idle()?;

        let entity = self.object_entity(mesh_path, placement)?;
        let camera = self.weak_camera(camera);
        self.render_transient(image, entity, camera)
    }

    // ---- push / pop -----------------------------------------------------

    /// Arm a weak-perspective camera
    pub fn push_cam(&mut self, params: CameraParams) -> Result<()> {
        let camera = self.weak_camera(params);
        self.arm_camera(camera)
    }

    /// Arm the default perspective camera
    pub fn push_default_cam(&mut self) -> Result<()> {
        let camera = PerspectiveCamera::new(self.config.default_camera_yfov).into();
        self.arm_camera(camera)
    }

    /// Queue a body mesh for the next [`pop_and_render`](Self::pop_and_render)
    pub fn push_human(&mut self, vertices: &[[f32; 3]], color: Option<[f32; 3]>) -> Result<NodeHandle> {
        let model = MeshTransformBuilder::body(None)?;
        let mesh = self.body.build_mesh(vertices)?.transformed(&model);
        let entity = self.human_entity(&mesh, color);

        let handle = self.graph.add_node(SceneEntity::Mesh(entity), Mat4::identity());
        self.human_nodes.push(handle);
        Ok(handle)
    }

    /// Queue an object mesh for the next [`pop_and_render`](Self::pop_and_render)
    pub fn push_obj(&mut self, mesh_path: &Path, placement: &ObjectPlacement) -> Result<NodeHandle> {
        let entity = self.object_entity(mesh_path, placement)?;

        let handle = self.graph.add_node(SceneEntity::Mesh(entity), Mat4::identity());
        self.object_nodes.push(handle);
        Ok(handle)
    }

    /// Render everything pushed since the last pop and clear it
    ///
    /// Without a background the frame is composited over opaque white.
    /// Fails with [`OverlayError::NoCamera`] when no camera is armed; the
    /// pushed meshes then stay queued. Once a pass has been attempted the
    /// session is idle again whether or not it succeeded.
    pub fn pop_and_render(&mut self, background: Option<&RgbImage>) -> Result<RgbImage> {
        if self.camera.is_none() {
            return Err(OverlayError::NoCamera);
        }

        let frame = {
            let white;
            let background = match (background, &self.white_canvas) {
                (Some(image), _) => image,
                (None, Some(canvas)) => canvas,
                (None, None) => {
                    white = solid_canvas(self.config.width(), self.config.height(), WHITE);
                    &white
                }
            };
            self.compositor.render_over(&self.graph, background)
        };

        let cleared = self.clear_pushed();
        let frame = frame?;
        cleared?;
        Ok(frame)
    }

    /// Unproject a pixel through the armed camera
    ///
    /// The pixel maps to NDC as `(2x/W - 1, 2y/H - 1, 0, 1)` and is multiplied
    /// by the inverse projection. The y axis is not flipped, so row 0 lands
    /// at NDC y = -1. The camera pose is identity and is not applied.
    pub fn screenspace_to_worldspace(&self, x: f32, y: f32) -> Result<Vec4> {
        let handle = self.camera.ok_or(OverlayError::NoCamera)?;
        let camera = self
            .graph
            .node(handle)
            .and_then(|node| node.camera())
            .ok_or(OverlayError::UnknownNode(handle))?;

        let (width, height) = self.config.resolution;
        let inverse = camera
            .projection_matrix(width, height)
            .try_inverse()
            .ok_or(OverlayError::SingularMatrix("camera projection"))?;

        let ndc = Vec4::new(
            x / width as f32 * 2.0 - 1.0,
            y / height as f32 * 2.0 - 1.0,
            0.0,
            1.0,
        );
        Ok(inverse * ndc)
    }

    /// [`screenspace_to_worldspace`](Self::screenspace_to_worldspace) divided through by `w`
    pub fn screenspace_to_point(&self, x: f32, y: f32) -> Result<Point3> {
        let v = self.screenspace_to_worldspace(x, y)?;
        if v.w.abs() <= f32::EPSILON {
            return Err(OverlayError::SingularMatrix("unprojected point at infinity"));
        }
        Ok(Point3::from(v.xyz() / v.w))
    }

    /// Drop the armed camera and every pushed mesh without rendering
    ///
    /// Rolls back a partially built push sequence. A no-op on an idle session.
    pub fn discard_pushed(&mut self) -> Result<()> {
        if !self.is_idle() {
            log::debug!(
                "Discarding {} humans and {} objects (camera: {})",
                self.human_nodes.len(),
                self.object_nodes.len(),
                self.camera.is_some()
            );
        }
        self.clear_pushed()
    }

    /// Remove every node the session inserted and hand back the empty graph
    ///
    /// Every node is removed even when one removal fails; the first failure
    /// is returned.
    pub fn teardown(mut self) -> Result<SlotMapGraph> {
        let cleared = self.clear_pushed();
        let lights = std::mem::take(&mut self.lights);
        let removed = self.remove_all(lights);
        cleared?;
        removed?;

        log::info!("Render session torn down ({} nodes left)", self.graph.node_count());
        Ok(self.graph)
    }

    // ---- internals ------------------------------------------------------

    fn ensure_idle(&self) -> Result<()> {
        if self.is_idle() {
            Ok(())
        } else {
            Err(OverlayError::SessionArmed {
                humans: self.human_nodes.len(),
                objects: self.object_nodes.len(),
                camera: self.camera.is_some(),
            })
        }
    }

    fn weak_camera(&self, params: CameraParams) -> SceneCamera {
        params.to_camera(Some(self.config.weak_perspective_zfar)).into()
    }

    fn arm_camera(&mut self, camera: SceneCamera) -> Result<()> {
        if self.camera.is_some() {
            return Err(OverlayError::CameraAlreadyPushed);
        }
        self.camera = Some(self.graph.add_node(SceneEntity::Camera(camera), Mat4::identity()));
        Ok(())
    }

    fn human_entity(&self, mesh: &TriMesh, color: Option<[f32; 3]>) -> MeshEntity {
        let color = color.unwrap_or(self.config.human_color);
        MeshEntity::new(mesh.clone(), Material::opaque(color, &self.config.material)).with_name("human")
    }

    fn object_entity(&self, mesh_path: &Path, placement: &ObjectPlacement) -> Result<MeshEntity> {
        let model = MeshTransformBuilder::object(placement)?;
        let mesh = self.mesh_io.load_mesh(mesh_path)?;
        mesh.validate()?;
        if mesh.is_empty() {
            log::warn!("Object mesh {} has no faces", mesh_path.display());
        }

        let color = placement.color.unwrap_or(self.config.object_color);
        Ok(MeshEntity::new(mesh.transformed(&model), Material::opaque(color, &self.config.material))
            .with_name(mesh_path.display().to_string()))
    }

    /// Insert a mesh and its camera, render, and remove both again
    fn render_transient(&mut self, background: &RgbImage, entity: MeshEntity, camera: SceneCamera) -> Result<RgbImage> {
        let mesh_node = self.graph.add_node(SceneEntity::Mesh(entity), Mat4::identity());
        let camera_node = self.graph.add_node(SceneEntity::Camera(camera), Mat4::identity());

        let frame = self.compositor.render_over(&self.graph, background);

        self.graph.remove_node(camera_node)?;
        self.graph.remove_node(mesh_node)?;
        frame
    }

    /// Remove the camera and every pushed mesh, reporting the first failure
    fn clear_pushed(&mut self) -> Result<()> {
        let handles: Vec<NodeHandle> = self
            .camera
            .take()
            .into_iter()
            .chain(self.human_nodes.drain(..))
            .chain(self.object_nodes.drain(..))
            .collect();
        self.remove_all(handles)
    }

    fn remove_all(&mut self, handles: Vec<NodeHandle>) -> Result<()> {
        let mut first_error = None;
        for handle in handles {
            if let Err(e) = self.graph.remove_node(handle) {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl<R: Rasterizer + std::fmt::Debug> std::fmt::Debug for RenderSession<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderSession")
            .field("resolution", &self.config.resolution)
            .field("wireframe", &self.config.wireframe)
            .field("camera", &self.camera)
            .field("human_nodes", &self.human_nodes)
            .field("object_nodes", &self.object_nodes)
            .field("rasterizer", self.compositor.rasterizer())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::rasterizer::{DepthImage, RasterOutput};
    use approx::assert_relative_eq;
    use image::{Rgb, Rgba, RgbaImage};
    use std::sync::Arc;

    const FAKE_RGB: [u8; 3] = [10, 20, 30];

    /// Scene counts seen by one pass
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Pass {
        nodes: usize,
        meshes: usize,
        has_camera: bool,
    }

    /// Covers the whole viewport whenever the scene holds a mesh
    #[derive(Debug)]
    struct FakeRasterizer {
        viewport: (u32, u32),
        fail: bool,
        passes: Vec<Pass>,
    }

    impl FakeRasterizer {
        fn new(viewport: (u32, u32)) -> Self {
            Self {
                viewport,
                fail: false,
                passes: Vec::new(),
            }
        }

        fn failing(viewport: (u32, u32)) -> Self {
            Self {
                fail: true,
                ..Self::new(viewport)
            }
        }
    }

    impl Rasterizer for FakeRasterizer {
        fn viewport(&self) -> (u32, u32) {
            self.viewport
        }

        fn render(&mut self, scene: &dyn SceneGraph, _flags: RenderFlags) -> Result<RasterOutput> {
            self.passes.push(Pass {
                nodes: scene.node_count(),
                meshes: scene.mesh_count(),
                has_camera: scene.main_camera().is_some(),
            });
            if self.fail {
                return Err(OverlayError::InvalidParameter("rasterizer failure".to_string()));
            }

            let (width, height) = self.viewport;
            let alpha = if scene.mesh_count() > 0 { 255 } else { 0 };
            let [r, g, b] = FAKE_RGB;
            Ok(RasterOutput {
                color: RgbaImage::from_pixel(width, height, Rgba([r, g, b, alpha])),
                depth: DepthImage::new(width, height),
            })
        }
    }

    fn cube_topology() -> BodyTopology {
        BodyTopology::from_triangles(Arc::clone(&TriMesh::cube(0.5).faces))
    }

    fn cube_rows() -> Vec<[f32; 3]> {
        TriMesh::cube(0.5).positions.iter().map(|p| [p.x, p.y, p.z]).collect()
    }

    fn fake_session(width: u32, height: u32) -> RenderSession<FakeRasterizer> {
        RenderSession::new(
            RendererConfig::new(width, height),
            cube_topology(),
            FakeRasterizer::new((width, height)),
            Box::new(ObjLoader),
        )
        .unwrap()
    }

    fn identity_cam() -> CameraParams {
        CameraParams::new(1.0, 1.0, 0.0, 0.0).unwrap()
    }

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("body_overlay_session_{}_{name}", std::process::id()))
    }

    fn write_cube_obj(name: &str) -> std::path::PathBuf {
        let path = temp_path(name);
        ObjLoader::write_obj(&TriMesh::cube(0.25), &path).unwrap();
        path
    }

    #[test]
    fn test_new_inserts_lights_only() {
        let session = fake_session(8, 6);
        assert_eq!(session.graph().node_count(), RendererConfig::LIGHT_COUNT);
        assert!(session.is_idle());
        assert_eq!(session.resolution(), (8, 6));
    }

    #[test]
    fn test_viewport_mismatch_rejected() {
        let result = RenderSession::new(
            RendererConfig::new(8, 6),
            cube_topology(),
            FakeRasterizer::new((6, 8)),
            Box::new(ObjLoader),
        );
        assert!(matches!(result, Err(OverlayError::InvalidParameter(_))));
    }

    #[test]
    fn test_push_pop_returns_to_fresh_state() {
        let mut session = fake_session(8, 6);
        let obj = write_cube_obj("push_pop.obj");

        session.push_cam(identity_cam()).unwrap();
        session.push_human(&cube_rows(), None).unwrap();
        session.push_human(&cube_rows(), Some([1.0, 0.0, 0.0])).unwrap();
        session.push_obj(&obj, &ObjectPlacement::default()).unwrap();
        assert_eq!(session.pushed_humans(), 2);
        assert_eq!(session.pushed_objects(), 1);
        assert!(!session.is_idle());

        let frame = session.pop_and_render(None).unwrap();
        assert_eq!(frame.dimensions(), (8, 6));
        assert_eq!(frame.get_pixel(3, 3).0, FAKE_RGB);

        let pass = session.rasterizer().passes[0];
        assert_eq!(pass, Pass { nodes: 7, meshes: 3, has_camera: true });

        assert!(session.is_idle());
        assert_eq!(session.graph().node_count(), RendererConfig::LIGHT_COUNT);
        std::fs::remove_file(obj).ok();
    }

    #[test]
    fn test_pop_without_camera_keeps_geometry() {
        let mut session = fake_session(8, 6);
        session.push_human(&cube_rows(), None).unwrap();

        assert!(matches!(session.pop_and_render(None), Err(OverlayError::NoCamera)));
        assert_eq!(session.pushed_humans(), 1);
        assert!(session.rasterizer().passes.is_empty());

        session.push_cam(identity_cam()).unwrap();
        session.pop_and_render(None).unwrap();
        assert!(session.is_idle());
    }

    #[test]
    fn test_pop_on_fresh_session_fails() {
        let mut session = fake_session(8, 6);
        assert!(matches!(session.pop_and_render(None), Err(OverlayError::NoCamera)));
        assert_eq!(session.graph().node_count(), RendererConfig::LIGHT_COUNT);
    }

    #[test]
    fn test_second_camera_rejected() {
        let mut session = fake_session(8, 6);
        session.push_cam(identity_cam()).unwrap();
        assert!(matches!(session.push_default_cam(), Err(OverlayError::CameraAlreadyPushed)));
        assert!(matches!(session.push_cam(identity_cam()), Err(OverlayError::CameraAlreadyPushed)));
        assert_eq!(session.graph().node_count(), RendererConfig::LIGHT_COUNT + 1);
    }

    #[test]
    fn test_default_background_is_white() {
        let mut session = fake_session(8, 6);
        session.push_default_cam().unwrap();
        let frame = session.pop_and_render(None).unwrap();
        assert!(frame.pixels().all(|p| p.0 == WHITE));
    }

    #[test]
    fn test_render_on_white_canvas_is_cached() {
        let config = RendererConfig::new(8, 6).with_render_on_white(true);
        let mut session =
            RenderSession::new(config, cube_topology(), FakeRasterizer::new((8, 6)), Box::new(ObjLoader)).unwrap();
        session.push_cam(identity_cam()).unwrap();
        let frame = session.pop_and_render(None).unwrap();
        assert!(frame.pixels().all(|p| p.0 == WHITE));
    }

    #[test]
    fn test_failed_pass_still_clears() {
        let mut session = RenderSession::new(
            RendererConfig::new(8, 6),
            cube_topology(),
            FakeRasterizer::failing((8, 6)),
            Box::new(ObjLoader),
        )
        .unwrap();
        session.push_cam(identity_cam()).unwrap();
        session.push_human(&cube_rows(), None).unwrap();

        assert!(session.pop_and_render(None).is_err());
        assert!(session.is_idle());
        assert_eq!(session.graph().node_count(), RendererConfig::LIGHT_COUNT);
    }

    #[test]
    fn test_wrong_background_size_still_clears() {
        let mut session = fake_session(8, 6);
        session.push_cam(identity_cam()).unwrap();
        let background = RgbImage::new(6, 8);
        assert!(matches!(
            session.pop_and_render(Some(&background)),
            Err(OverlayError::DimensionMismatch { .. })
        ));
        assert!(session.is_idle());
    }

    #[test]
    fn test_single_shot_leaves_only_lights() {
        let mut session = fake_session(8, 6);
        let background = RgbImage::from_pixel(8, 6, Rgb([1, 2, 3]));

        let frame = session
            .render(&background, &cube_rows(), identity_cam(), None, None, None)
            .unwrap();
        assert_eq!(frame.get_pixel(0, 0).0, FAKE_RGB);

        assert_eq!(session.rasterizer().passes[0], Pass { nodes: 5, meshes: 1, has_camera: true });
        assert_eq!(session.graph().node_count(), RendererConfig::LIGHT_COUNT);
        assert!(session.is_idle());
    }

    #[test]
    fn test_single_shot_failure_removes_nodes() {
        let mut session = fake_session(8, 6);
        let background = RgbImage::new(4, 4);
        assert!(matches!(
            session.render(&background, &cube_rows(), identity_cam(), None, None, None),
            Err(OverlayError::DimensionMismatch { .. })
        ));
        assert_eq!(session.graph().node_count(), RendererConfig::LIGHT_COUNT);

        let too_few = &cube_rows()[..4];
        let background = RgbImage::new(8, 6);
        assert!(session.render(&background, too_few, identity_cam(), None, None, None).is_err());
        assert_eq!(session.graph().node_count(), RendererConfig::LIGHT_COUNT);
    }

    #[test]
    fn test_single_shot_rejected_while_armed() {
        let mut session = fake_session(8, 6);
        session.push_human(&cube_rows(), None).unwrap();
        let background = RgbImage::new(8, 6);

        match session.render(&background, &cube_rows(), identity_cam(), None, None, None) {
            Err(OverlayError::SessionArmed { humans, objects, camera }) => {
                assert_eq!((humans, objects, camera), (1, 0, false));
            }
            other => panic!("expected SessionArmed, got {other:?}"),
        }
        assert_eq!(session.pushed_humans(), 1);
    }

    #[test]
    fn test_render_obj_loads_and_cleans_up() {
        let mut session = fake_session(8, 6);
        let obj = write_cube_obj("render_obj.obj");
        let background = RgbImage::new(8, 6);
        let placement = ObjectPlacement::at([0.1, 0.0, 0.0]).with_rotation(30.0, [0.0, 1.0, 0.0]);

        session.render_obj(&background, &obj, identity_cam(), &placement).unwrap();
        assert_eq!(session.rasterizer().passes[0].meshes, 1);
        assert_eq!(session.graph().node_count(), RendererConfig::LIGHT_COUNT);
        std::fs::remove_file(obj).ok();
    }

    #[test]
    fn test_render_obj_missing_file() {
        let mut session = fake_session(8, 6);
        let background = RgbImage::new(8, 6);
        let result = session.render_obj(
            &background,
            &temp_path("does_not_exist.obj"),
            identity_cam(),
            &ObjectPlacement::default(),
        );
        assert!(matches!(result, Err(OverlayError::InvalidMesh(_))));
        assert_eq!(session.graph().node_count(), RendererConfig::LIGHT_COUNT);
    }

    #[test]
    fn test_export_sees_corrected_mesh_before_rotation() {
        let mut session = fake_session(8, 6);
        let path = temp_path("export.obj");
        let background = RgbImage::new(8, 6);
        let rows = cube_rows();

        session
            .render(
                &background,
                &rows,
                identity_cam(),
                Some(AxisRotation::new(90.0, [0.0, 0.0, 1.0])),
                Some(&path),
                None,
            )
            .unwrap();

        let exported = ObjLoader::load_obj(&path).unwrap();
        assert_eq!(exported.vertex_count(), rows.len());
        for (p, [x, y, z]) in exported.positions.iter().zip(&rows) {
            assert_relative_eq!(*p, Vec3::new(*x, -*y, -*z), epsilon = 1e-5);
        }
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_screenspace_round_trip() {
        let mut session = fake_session(224, 224);
        session.push_cam(CameraParams::new(2.0, 3.0, 0.1, -0.2).unwrap()).unwrap();

        let (x, y) = (50.0, 100.0);
        let world = session.screenspace_to_worldspace(x, y).unwrap();
        let handle = session.camera.unwrap();
        let projection = session.graph().node(handle).unwrap().camera().unwrap().projection_matrix(224, 224);

        let ndc = projection * world;
        assert_relative_eq!(
            ndc,
            Vec4::new(x / 224.0 * 2.0 - 1.0, y / 224.0 * 2.0 - 1.0, 0.0, 1.0),
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_screenspace_does_not_flip_y() {
        let mut session = fake_session(224, 224);
        session.push_cam(identity_cam()).unwrap();
        let top = session.screenspace_to_point(112.0, 0.0).unwrap();
        assert_relative_eq!(top, Point3::new(0.0, -1.0, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_screenspace_without_camera() {
        let session = fake_session(8, 6);
        assert!(matches!(session.screenspace_to_worldspace(1.0, 1.0), Err(OverlayError::NoCamera)));
    }

    #[test]
    fn test_teardown_empties_graph() {
        let mut session = fake_session(8, 6);
        session.push_cam(identity_cam()).unwrap();
        session.push_human(&cube_rows(), None).unwrap();

        let graph = session.teardown().unwrap();
        assert_eq!(graph.node_count(), 0);
    }

    #[test]
    fn test_teardown_reports_stale_handle() {
        let mut session = fake_session(8, 6);
        let human = session.push_human(&cube_rows(), None).unwrap();
        session.graph.remove_node(human).unwrap();

        match session.teardown() {
            Err(OverlayError::UnknownNode(handle)) => assert_eq!(handle, human),
            other => panic!("expected UnknownNode, got {other:?}"),
        }
    }

    #[test]
    fn test_discard_pushed_rolls_back() {
        let mut session = fake_session(8, 6);
        let obj = write_cube_obj("discard.obj");
        session.push_cam(identity_cam()).unwrap();
        session.push_human(&cube_rows(), None).unwrap();
        session.push_obj(&obj, &ObjectPlacement::default()).unwrap();

        session.discard_pushed().unwrap();
        assert!(session.is_idle());
        assert_eq!(session.graph().node_count(), RendererConfig::LIGHT_COUNT);
        assert!(session.rasterizer().passes.is_empty());

        // idle again, so single shots work and discarding twice is harmless
        session.discard_pushed().unwrap();
        let background = RgbImage::new(8, 6);
        session.render(&background, &cube_rows(), identity_cam(), None, None, None).unwrap();
        std::fs::remove_file(obj).ok();
    }

    #[test]
    fn test_discard_without_camera_drops_queued_humans() {
        let mut session = fake_session(8, 6);
        session.push_human(&cube_rows(), None).unwrap();
        assert!(matches!(session.pop_and_render(None), Err(OverlayError::NoCamera)));

        session.discard_pushed().unwrap();
        assert_eq!(session.pushed_humans(), 0);
        assert_eq!(session.graph().node_count(), RendererConfig::LIGHT_COUNT);
    }

    #[test]
    fn test_software_cube_end_to_end() {
        let mut session = RenderSession::with_software(RendererConfig::default(), cube_topology()).unwrap();
        let background = RgbImage::new(224, 224);

        let frame = session
            .render(&background, &cube_rows(), identity_cam(), None, None, None)
            .unwrap();

        assert_ne!(frame.get_pixel(112, 112).0, [0, 0, 0]);
        for (x, y, pixel) in frame.enumerate_pixels() {
            if pixel.0 != [0, 0, 0] {
                assert!((55..=168).contains(&x), "pixel ({x}, {y}) outside the cube");
                assert!((55..=168).contains(&y), "pixel ({x}, {y}) outside the cube");
            }
        }
        assert_eq!(session.graph().node_count(), RendererConfig::LIGHT_COUNT);
    }
}
