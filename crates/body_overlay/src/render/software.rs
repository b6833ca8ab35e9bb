//! CPU reference rasterizer
//!
//! Depth-tested triangle fill (or edge drawing in wireframe mode) with
//! flat per-face Lambert shading from the scene's point lights and ambient
//! term. Good enough to preview overlays without a GPU; not a PBR renderer.

use image::{Rgba, RgbaImage};

use crate::error::{OverlayError, Result};
use crate::foundation::math::{Mat4, Mat4Ext, Vec3, Vec4};
use crate::render::lighting::PointLight;
use crate::render::material::Material;
use crate::render::rasterizer::{DepthImage, RasterOutput, RenderFlags, Rasterizer};
use crate::scene::{SceneEntity, SceneGraph, SceneNode};

/// A vertex after projection: pixel coordinates plus NDC depth
#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    z: f32,
}

/// What every face of a pass needs to know about the camera and lights
struct PassContext<'a> {
    view_projection: Mat4,
    eye: Vec3,
    view_axis: Vec3,
    orthographic: bool,
    ambient: Vec3,
    lights: Vec<(Vec3, &'a PointLight)>,
}

impl PassContext<'_> {
    /// Flat shade of one face
    fn shade(&self, material: &Material, corners: &[Vec3; 3]) -> Option<[u8; 4]> {
        let [a, b, c] = corners;
        let normal = (b - a).cross(&(c - a));
        let length = normal.norm();
        if length <= f32::EPSILON || !length.is_finite() {
            return None;
        }
        let centroid = (a + b + c) / 3.0;
        let to_eye = if self.orthographic { self.view_axis } else { self.eye - centroid };

        // Two-sided: light the side facing the camera
        let mut normal = normal / length;
        if normal.dot(&to_eye) < 0.0 {
            normal = -normal;
        }

        let irradiance = self
            .lights
            .iter()
            .fold(Vec3::zeros(), |acc, (position, light)| acc + light.irradiance(position, &centroid, &normal));
        let diffuse_scale = 1.0 - 0.5 * material.metallic;
        let light = self.ambient + irradiance * diffuse_scale;

        let [r, g, b] = material.rgb();
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Some([to_u8(r * light.x), to_u8(g * light.y), to_u8(b * light.z), 255])
    }
}

/// Color and depth targets of one pass
struct Framebuffer {
    width: u32,
    height: u32,
    color: RgbaImage,
    depth: Vec<f32>,
}

impl Framebuffer {
    fn new(width: u32, height: u32, clear: [f32; 4]) -> Self {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let clear = Rgba([to_u8(clear[0]), to_u8(clear[1]), to_u8(clear[2]), to_u8(clear[3])]);
        Self {
            width,
            height,
            color: RgbaImage::from_pixel(width, height, clear),
            depth: vec![f32::INFINITY; (width as usize) * (height as usize)],
        }
    }

    /// Depth-tested write; depth outside the clip range is dropped
    fn plot(&mut self, x: u32, y: u32, z: f32, rgba: [u8; 4]) {
        if !(-1.0..=1.0).contains(&z) {
            return;
        }
        let index = (y as usize) * (self.width as usize) + x as usize;
        if z < self.depth[index] {
            self.depth[index] = z;
            self.color.put_pixel(x, y, Rgba(rgba));
        }
    }

    fn fill_triangle(&mut self, v: &[ScreenVertex; 3], rgba: [u8; 4]) {
        let area = edge(&v[0], &v[1], v[2].x, v[2].y);
        if area == 0.0 || !area.is_finite() {
            return;
        }

        let min_x = v.iter().map(|p| p.x).fold(f32::INFINITY, f32::min).floor().max(0.0);
        let max_x = v.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max).ceil().min(self.width as f32 - 1.0);
        let min_y = v.iter().map(|p| p.y).fold(f32::INFINITY, f32::min).floor().max(0.0);
        let max_y = v.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max).ceil().min(self.height as f32 - 1.0);
        if min_x > max_x || min_y > max_y {
            return;
        }

        for py in (min_y as u32)..=(max_y as u32) {
            for px in (min_x as u32)..=(max_x as u32) {
                let (cx, cy) = (px as f32 + 0.5, py as f32 + 0.5);
                let w0 = edge(&v[1], &v[2], cx, cy) / area;
                let w1 = edge(&v[2], &v[0], cx, cy) / area;
                let w2 = edge(&v[0], &v[1], cx, cy) / area;
                if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                    continue;
                }
                let z = w0 * v[0].z + w1 * v[1].z + w2 * v[2].z;
                self.plot(px, py, z, rgba);
            }
        }
    }

    /// DDA line, stepped only across the part inside the viewport
    fn draw_line(&mut self, a: &ScreenVertex, b: &ScreenVertex, rgba: [u8; 4]) {
        let Some((t0, t1)) = clip_segment(a, b, self.width as f32, self.height as f32) else {
            return;
        };
        let (dx, dy) = (b.x - a.x, b.y - a.y);
        let span = t1 - t0;
        let steps = (dx.abs().max(dy.abs()) * span).ceil().max(1.0) as u32;

        for i in 0..=steps {
            let t = t0 + span * (i as f32 / steps as f32);
            let (x, y) = (a.x + dx * t, a.y + dy * t);
            if x < 0.0 || y < 0.0 || x >= self.width as f32 || y >= self.height as f32 {
                continue;
            }
            let z = a.z + (b.z - a.z) * t;
            self.plot(x as u32, y as u32, z, rgba);
        }
    }

    fn finish(self, flags: RenderFlags) -> RasterOutput {
        let Self { width, height, mut color, depth } = self;

        if !flags.contains(RenderFlags::RGBA) {
            color.pixels_mut().for_each(|p| p.0[3] = 255);
        }

        let depth = DepthImage::from_fn(width, height, |x, y| {
            let z = depth[(y as usize) * (width as usize) + x as usize];
            image::Luma([if z.is_finite() { (z + 1.0) * 0.5 } else { 0.0 }])
        });

        RasterOutput { color, depth }
    }
}

/// Parameter range `[t0, t1]` of `a + t (b - a)` lying in `[0, width] x [0, height]`
///
/// Liang-Barsky clipping; `None` when the segment misses the viewport or has
/// a non-finite end point.
fn clip_segment(a: &ScreenVertex, b: &ScreenVertex, width: f32, height: f32) -> Option<(f32, f32)> {
    if ![a.x, a.y, b.x, b.y].iter().all(|v| v.is_finite()) {
        return None;
    }
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    let (mut t0, mut t1) = (0.0_f32, 1.0_f32);

    for (p, q) in [(-dx, a.x), (dx, width - a.x), (-dy, a.y), (dy, height - a.y)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
        }
    }

    (t0 <= t1).then_some((t0, t1))
}

/// Signed doubled area of the triangle `(a, b, p)`
fn edge(a: &ScreenVertex, b: &ScreenVertex, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

/// CPU rasterizer with a fixed viewport
#[derive(Debug, Clone)]
pub struct SoftwareRasterizer {
    width: u32,
    height: u32,
}

impl SoftwareRasterizer {
    /// Create a rasterizer producing `width` x `height` rasters
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn project(&self, clip: &Vec4) -> Option<ScreenVertex> {
        if clip.w <= 0.0 || !clip.w.is_finite() {
            return None;
        }
        let ndc = clip.xyz() / clip.w;
        Some(ScreenVertex {
            x: (ndc.x + 1.0) * 0.5 * self.width as f32,
            y: (1.0 - ndc.y) * 0.5 * self.height as f32,
            z: ndc.z,
        })
    }

    fn context<'a>(&self, scene: &'a dyn SceneGraph) -> Result<PassContext<'a>> {
        let handle = scene.main_camera().ok_or(OverlayError::NoCamera)?;
        let node = scene.node(handle).ok_or(OverlayError::UnknownNode(handle))?;
        let camera = node.camera().ok_or(OverlayError::NoCamera)?;

        let view = node
            .pose
            .try_inverse()
            .ok_or(OverlayError::SingularMatrix("camera pose"))?;
        let projection = camera.projection_matrix(self.width, self.height);

        let lights = scene
            .nodes()
            .filter_map(|(_, n)| match &n.entity {
                SceneEntity::Light(light) => Some((n.position(), light)),
                _ => None,
            })
            .collect();

        Ok(PassContext {
            view_projection: projection * view,
            eye: node.position(),
            view_axis: Vec3::new(node.pose[(0, 2)], node.pose[(1, 2)], node.pose[(2, 2)]),
            orthographic: camera.is_orthographic(),
            ambient: scene.ambient_light(),
            lights,
        })
    }

    fn draw_node(&self, frame: &mut Framebuffer, context: &PassContext<'_>, node: &SceneNode, wireframe: bool) {
        let SceneEntity::Mesh(entity) = &node.entity else {
            return;
        };
        if entity.mesh.is_empty() {
            log::warn!("Skipping empty mesh {:?}", entity.name);
            return;
        }

        let world: Vec<Vec3> = entity.mesh.positions.iter().map(|p| node.pose.apply_to_point(p)).collect();
        let screen: Vec<Option<ScreenVertex>> = world
            .iter()
            .map(|p| self.project(&(context.view_projection * Vec4::new(p.x, p.y, p.z, 1.0))))
            .collect();

        for face in entity.mesh.faces.iter() {
            let [i0, i1, i2] = (*face).map(|i| i as usize);
            let (Some(Some(a)), Some(Some(b)), Some(Some(c))) = (screen.get(i0), screen.get(i1), screen.get(i2)) else {
                continue;
            };
            let Some(rgba) = context.shade(&entity.material, &[world[i0], world[i1], world[i2]]) else {
                continue;
            };

            if wireframe {
                frame.draw_line(a, b, rgba);
                frame.draw_line(b, c, rgba);
                frame.draw_line(c, a, rgba);
            } else {
                frame.fill_triangle(&[*a, *b, *c], rgba);
            }
        }
    }
}

impl Rasterizer for SoftwareRasterizer {
    fn viewport(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn render(&mut self, scene: &dyn SceneGraph, flags: RenderFlags) -> Result<RasterOutput> {
        let context = self.context(scene)?;
        let wireframe = flags.contains(RenderFlags::ALL_WIREFRAME);
        let mut frame = Framebuffer::new(self.width, self.height, scene.bg_color());

        for (_, node) in scene.nodes() {
            self.draw_node(&mut frame, &context, node, wireframe);
        }

        Ok(frame.finish(flags))
    }
}
