//! Virtual camera: pose, view/projection matrices and motion
use log::warn;
use serde::{Deserialize, Serialize};

use crate::math::{Matrix4, Point3, Vector3, EPSILON};

/// Motions whose view direction gets closer to straight up/down than this are rejected
pub const POLE_LIMIT: f64 = 0.95;

/// Zoom never brings the camera closer to its target than this
pub const MIN_ZOOM_DISTANCE: f64 = 0.1;

const WORLD_UP: Vector3 = Vector3::Y;

/// Projection mode for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProjectionMode {
    Orthographic,
    #[default]
    Perspective,
}

/// Camera-local translation axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraAxis {
    Forward,
    Right,
    Up,
}

/// Camera configuration for 3D rendering
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3,
    pub target: Point3,
    pub up: Vector3,
    /// Vertical field of view in radians
    pub fov: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
    pub mode: ProjectionMode,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        let mut camera = Self {
            position: Point3::new(0.0, 0.0, 5.0),
            target: Point3::ORIGIN,
            up: WORLD_UP,
            fov: std::f64::consts::FRAC_PI_4, // 45 degrees
            aspect: 1.0,
            near: 0.1,
            far: 100.0,
            mode: ProjectionMode::Perspective,
        };
        camera.set_viewport(width, height);
        camera
    }

    pub fn looking_at(position: Point3, target: Point3) -> Self {
        Self {
            position,
            target,
            ..Self::default()
        }
    }

    /// Update the aspect ratio; a zero-sized viewport is ignored
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f64 / height as f64;
        }
    }

    /// Create the view matrix (camera transformation)
    pub fn view_matrix(&self) -> Matrix4 {
        Matrix4::look_at(self.position, self.target, self.up)
    }

    /// Create the projection matrix.
    ///
    /// `None` when the frustum is empty: a non-positive or non-finite aspect,
    /// near/far planes out of order, a field of view outside `(0, pi)`, or an
    /// orthographic camera sitting on its target.
    pub fn projection_matrix(&self) -> Option<Matrix4> {
        let depth_ok = self.near > 0.0 && self.far - self.near > EPSILON && self.far.is_finite();
        if !(self.aspect > EPSILON && self.aspect.is_finite() && depth_ok) {
            return None;
        }
        match self.mode {
            ProjectionMode::Perspective => {
                if !(self.fov > EPSILON && self.fov < std::f64::consts::PI - EPSILON) {
                    return None;
                }
                Some(Matrix4::perspective(self.fov, self.aspect, self.near, self.far))
            }
            ProjectionMode::Orthographic => {
                let height = self.distance();
                let width = height * self.aspect;
                if !(width > EPSILON && height > EPSILON && width.is_finite()) {
                    return None;
                }
                Some(Matrix4::orthographic(
                    -width / 2.0,
                    width / 2.0,
                    -height / 2.0,
                    height / 2.0,
                    self.near,
                    self.far,
                ))
            }
        }
    }

    /// `projection * view`, `None` for a degenerate projection
    pub fn view_projection(&self) -> Option<Matrix4> {
        Some(self.projection_matrix()? * self.view_matrix())
    }

    pub fn distance(&self) -> f64 {
        self.position.distance(self.target)
    }

    /// Unit vector from the position towards the target
    pub fn direction(&self) -> Vector3 {
        (self.target - self.position)
            .normalize()
            .unwrap_or(-Vector3::Z)
    }

    /// View direction flattened onto the horizontal plane, so pitch does not
    /// slow down horizontal motion
    pub fn horizontal_forward(&self) -> Vector3 {
        let direction = self.direction();
        Vector3::new(direction.x, 0.0, direction.z)
            .normalize()
            .unwrap_or(-Vector3::Z)
    }

    pub fn horizontal_right(&self) -> Vector3 {
        self.horizontal_forward().cross(WORLD_UP)
    }

    /// Moves position and target together along a camera-local axis
    pub fn translate(&mut self, axis: CameraAxis, distance: f64) {
        let offset = match axis {
            CameraAxis::Forward => self.horizontal_forward(),
            CameraAxis::Right => self.horizontal_right(),
            CameraAxis::Up => WORLD_UP,
        } * distance;
        self.position = self.position + offset;
        self.target = self.target + offset;
    }

    /// Screen-aligned pan: `dx` to the right, `dy` up
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.translate(CameraAxis::Right, dx);
        self.translate(CameraAxis::Up, dy);
    }

    /// Moves the position on a sphere around the target.
    ///
    /// `yaw` turns about the world up axis; a positive `pitch` raises the
    /// camera over the target. A pitch that would bring the view within
    /// [`POLE_LIMIT`] of straight up or down is dropped; the yaw still applies.
    pub fn orbit(&mut self, yaw: f64, pitch: f64) {
        let offset = self.position - self.target;
        let offset = rotate_about(offset, WORLD_UP, yaw);
        let yawed = self.target + offset;

        let pitch_axis = offset.cross(WORLD_UP);
        let pitched = rotate_about(offset, pitch_axis, pitch);
        self.position = if within_pole_limit(-pitched) {
            self.target + pitched
        } else {
            warn!("orbit pitch {pitch:.3} rejected near the pole");
            yawed
        };
    }

    /// Turns the view direction in place; the position stays fixed and a
    /// positive `pitch` looks up. Subject to the same pole limit as
    /// [`Camera::orbit`].
    pub fn rotate(&mut self, yaw: f64, pitch: f64) {
        let look = self.target - self.position;
        let look = rotate_about(look, WORLD_UP, yaw);

        let right = look.cross(WORLD_UP);
        let pitched = rotate_about(look, right, pitch);
        let look = if within_pole_limit(pitched) {
            pitched
        } else {
            warn!("look pitch {pitch:.3} rejected near the pole");
            look
        };
        self.target = self.position + look;
    }

    /// Moves towards (`amount > 0`) or away from the target along the view
    /// direction, never closer than [`MIN_ZOOM_DISTANCE`].
    pub fn zoom(&mut self, amount: f64) {
        let distance = (self.distance() - amount).max(MIN_ZOOM_DISTANCE);
        self.position = self.target - self.direction() * distance;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(800, 600)
    }
}

/// Rotates `v` about `axis`; a degenerate axis leaves `v` unchanged
fn rotate_about(v: Vector3, axis: Vector3, angle: f64) -> Vector3 {
    if angle == 0.0 {
        return v;
    }
    match Matrix4::rotation_axis(axis, angle) {
        Ok(rotation) => rotation.transform_vector(v),
        Err(_) => v,
    }
}

fn within_pole_limit(direction: Vector3) -> bool {
    direction
        .normalize()
        .map(|d| d.dot(WORLD_UP).abs() <= POLE_LIMIT)
        .unwrap_or(false)
}
