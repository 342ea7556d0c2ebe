//! Clip space to screen space mapping
//!
//! Screen coordinates put row 0 at the top: NDC `y = 1` maps to `y = 0`.
//! Wireframe and filled rendering both go through [`project_vertex`].
use crate::camera::Camera;
use crate::math::{Matrix4, Vector3};
use crate::transform::Transform;

/// Vertices whose clip-space `w` is at or below this are not projected
pub const W_EPSILON: f64 = 1e-6;

/// A projected vertex: pixel position, NDC depth and `1 / w` for
/// perspective-correct interpolation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenVertex {
    pub x: f64,
    pub y: f64,
    pub depth: f64,
    pub inv_w: f64,
}

/// Maps NDC `[-1, 1]` to pixel coordinates
pub fn ndc_to_screen(ndc_x: f64, ndc_y: f64, width: usize, height: usize) -> (f64, f64) {
    (
        (ndc_x + 1.0) * 0.5 * width as f64,
        (1.0 - ndc_y) * 0.5 * height as f64,
    )
}

/// Projects a model-space position through `mvp`.
///
/// Returns `None` when `w` is near zero or negative (the point is on or behind
/// the eye plane) or the result is not finite.
pub fn project_vertex(
    mvp: &Matrix4,
    position: Vector3,
    width: usize,
    height: usize,
) -> Option<ScreenVertex> {
    let clip = mvp.transform_point(position);
    if !(clip.w > W_EPSILON) || !clip.is_finite() {
        return None;
    }

    let inv_w = 1.0 / clip.w;
    let (x, y) = ndc_to_screen(clip.x * inv_w, clip.y * inv_w, width, height);
    Some(ScreenVertex {
        x,
        y,
        depth: clip.z * inv_w,
        inv_w,
    })
}

impl Camera {
    /// Project a 3D point to 2D screen space; `None` also covers a camera
    /// without a valid projection
    pub fn project_to_screen(
        &self,
        point: Vector3,
        model_matrix: &Matrix4,
        width: usize,
        height: usize,
    ) -> Option<ScreenVertex> {
        let mvp = Transform::mvp_matrix(
            model_matrix,
            &self.view_matrix(),
            &self.projection_matrix()?,
        );
        project_vertex(&mvp, point, width, height)
    }
}
