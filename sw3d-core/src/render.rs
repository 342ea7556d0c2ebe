//! Per-frame render pipeline
//!
//! Every frame clears the target, projects each vertex once through
//! `projection * view * model`, then draws the mesh as a wireframe or as
//! depth-tested filled triangles with an optional wireframe overlay.
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::geometry::{Mesh, Polygon};
use crate::math::{Matrix4, Vector2, Vector3};
use crate::processing::face_normal;
use crate::projection::{project_vertex, ScreenVertex};
use crate::raster::{
    draw_line, rasterize_triangle, Color, Fragment, FrameBuffer, RasterVertex, Texture,
};
use crate::transform::Transform;

/// Overlay lines are drawn where they are at most this far behind the surface
pub const WIREFRAME_DEPTH_BIAS: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RenderMode {
    Wireframe,
    #[default]
    Filled,
}

/// Where diffuse light comes from
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum LightSource {
    /// Light sits at the camera position
    #[default]
    Camera,
    /// Fixed world-space point light
    Point(Vector3),
}

/// How a frame is drawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub mode: RenderMode,
    /// Draw depth-tested edges on top of filled polygons
    pub wireframe_overlay: bool,
    pub lighting: bool,
    /// Sample the bound texture for polygons with texture coordinates
    pub textured: bool,
    pub flat_color: Color,
    pub wireframe_color: Color,
    pub background: Color,
    /// Fraction of the base colour kept on unlit surfaces, in `[0, 1]`
    pub ambient: f64,
    pub light: LightSource,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            mode: RenderMode::Filled,
            wireframe_overlay: false,
            lighting: true,
            textured: true,
            flat_color: Color::new(200, 200, 200),
            wireframe_color: Color::WHITE,
            background: Color::BLACK,
            ambient: 0.2,
            light: LightSource::Camera,
        }
    }
}

/// Counters for a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderStats {
    pub triangles_drawn: usize,
    pub triangles_skipped: usize,
    pub vertices_skipped: usize,
    pub edges_drawn: usize,
    pub fragments_written: usize,
}

/// Software renderer holding the draw options and an optional texture
#[derive(Debug, Clone, Default)]
pub struct Renderer {
    pub options: RenderOptions,
    texture: Option<Texture>,
}

/// Per-frame values shared by every triangle
struct FrameContext<'a> {
    world: Vec<Vector3>,
    projected: Vec<Option<ScreenVertex>>,
    normal_matrix: Matrix4,
    light: Vector3,
    mesh: &'a Mesh,
}

impl Renderer {
    pub fn new(options: RenderOptions) -> Self {
        Self {
            options,
            texture: None,
        }
    }

    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn set_texture(&mut self, texture: Option<Texture>) {
        self.texture = texture;
    }

    pub fn texture(&self) -> Option<&Texture> {
        self.texture.as_ref()
    }

    /// Draws `mesh` placed by `transform` as seen from `camera`.
    ///
    /// The colour and depth buffers of `target` are reset first. Vertices
    /// on or behind the eye plane are skipped along with every edge and
    /// triangle that uses them; degenerate triangles are skipped too. A camera
    /// with an empty frustum leaves only the background. Nothing here fails:
    /// skipped elements are only counted in the returned stats.
    pub fn render(
        &self,
        target: &mut FrameBuffer,
        camera: &Camera,
        mesh: &Mesh,
        transform: &Transform,
    ) -> RenderStats {
        target.clear(self.options.background);
        let mut stats = RenderStats::default();

        let Some(projection) = camera.projection_matrix() else {
            warn!(
                "camera has no valid projection (aspect {}, near {}, far {}), drawing background only",
                camera.aspect, camera.near, camera.far
            );
            return stats;
        };
        let model = transform.model_matrix();
        let mvp = Transform::mvp_matrix(&model, &camera.view_matrix(), &projection);
        let (width, height) = (target.width(), target.height());

        let projected: Vec<_> = mesh
            .vertices
            .iter()
            .map(|&v| project_vertex(&mvp, v, width, height))
            .collect();
        stats.vertices_skipped = projected.iter().filter(|p| p.is_none()).count();

        let frame = FrameContext {
            world: mesh
                .vertices
                .iter()
                .map(|&v| model.transform_point(v).xyz())
                .collect(),
            projected,
            normal_matrix: transform.normal_matrix(),
            light: match self.options.light {
                LightSource::Camera => camera.position.to_vector(),
                LightSource::Point(position) => position,
            },
            mesh,
        };

        match self.options.mode {
            RenderMode::Wireframe => self.draw_edges(target, &frame, None, &mut stats),
            RenderMode::Filled => {
                for polygon in &mesh.polygons {
                    self.fill_polygon(target, &frame, polygon, &mut stats);
                }
                if self.options.wireframe_overlay {
                    self.draw_edges(target, &frame, Some(WIREFRAME_DEPTH_BIAS), &mut stats);
                }
            }
        }

        debug!(
            "rendered {}x{} frame: {} triangles, {} skipped, {} vertices behind the eye, {} edges, {} fragments",
            width,
            height,
            stats.triangles_drawn,
            stats.triangles_skipped,
            stats.vertices_skipped,
            stats.edges_drawn,
            stats.fragments_written
        );
        stats
    }

    fn draw_edges(
        &self,
        target: &mut FrameBuffer,
        frame: &FrameContext<'_>,
        depth_bias: Option<f64>,
        stats: &mut RenderStats,
    ) {
        for polygon in &frame.mesh.polygons {
            for (a, b) in polygon.edges() {
                let ends = (
                    frame.projected.get(a).copied().flatten(),
                    frame.projected.get(b).copied().flatten(),
                );
                if let (Some(a), Some(b)) = ends {
                    draw_line(target, &a, &b, self.options.wireframe_color, depth_bias);
                    stats.edges_drawn += 1;
                }
            }
        }
    }

    fn fill_polygon(
        &self,
        target: &mut FrameBuffer,
        frame: &FrameContext<'_>,
        polygon: &Polygon,
        stats: &mut RenderStats,
    ) {
        let texture = self.texture.as_ref().filter(|_| self.options.textured);
        let lighting = self.options.lighting;
        let face = if lighting {
            face_normal(&frame.world, polygon)
        } else {
            None
        };

        for triangle in polygon.triangulate() {
            let Some(corners) = self.raster_vertices(frame, &triangle, texture.is_some()) else {
                trace!("triangle {:?} has a vertex behind the eye", triangle.vertex_indices());
                stats.triangles_skipped += 1;
                continue;
            };

            let shade = |fragment: &Fragment| {
                let base = match (texture, fragment.uv) {
                    (Some(texture), Some(uv)) => texture.sample(uv),
                    _ => self.options.flat_color,
                };
                if !lighting {
                    return base;
                }
                let normal = fragment.normal.or(face).and_then(|n| n.normalize().ok());
                let to_light = (frame.light - fragment.world).normalize().ok();
                let diffuse = match (normal, to_light) {
                    (Some(n), Some(l)) => n.dot(l).max(0.0),
                    _ => 0.0,
                };
                let ambient = self.options.ambient;
                base.scale(ambient + (1.0 - ambient) * diffuse)
            };

            match rasterize_triangle(target, &corners, shade) {
                Some(fragments) => {
                    stats.triangles_drawn += 1;
                    stats.fragments_written += fragments;
                }
                None => {
                    trace!("degenerate triangle {:?}", triangle.vertex_indices());
                    stats.triangles_skipped += 1;
                }
            }
        }
    }

    /// Gathers screen positions and attributes for a triangle, `None` if a
    /// corner was not projected
    fn raster_vertices(
        &self,
        frame: &FrameContext<'_>,
        triangle: &Polygon,
        with_uv: bool,
    ) -> Option<[RasterVertex; 3]> {
        let mesh = frame.mesh;
        let vertices = triangle.vertex_indices();
        let uv_at = |i: usize| -> Option<Vector2> {
            let index = triangle.texture_indices()?[i];
            let last = mesh.texture_coords.len().checked_sub(1)?;
            Some(mesh.texture_coords[index.min(last)])
        };
        let normal_at = |i: usize| -> Option<Vector3> {
            let index = triangle.normal_indices()?[i];
            let normal = *mesh.normals.get(index)?;
            Some(frame.normal_matrix.transform_vector(normal))
        };

        let mut corners = [RasterVertex {
            screen: ScreenVertex {
                x: 0.0,
                y: 0.0,
                depth: 0.0,
                inv_w: 0.0,
            },
            world: Vector3::ZERO,
            uv: None,
            normal: None,
        }; 3];
        for (i, corner) in corners.iter_mut().enumerate() {
            let vertex = vertices[i];
            corner.screen = frame.projected.get(vertex).copied().flatten()?;
            corner.world = frame.world[vertex];
            corner.uv = if with_uv { uv_at(i) } else { None };
            corner.normal = if self.options.lighting { normal_at(i) } else { None };
        }
        Some(corners)
    }
}

/// Transformed copy of `mesh`; the source is left untouched
pub fn apply_transform(mesh: &Mesh, transform: &Transform) -> Mesh {
    transform.apply_to_mesh(mesh)
}
