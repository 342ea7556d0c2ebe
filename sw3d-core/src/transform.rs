//! Model transforms: scale, rotation and translation
//!
//! Rotation order is X, then Y, then Z (`R = Rz * Ry * Rx`), and the model
//! matrix is `T * R * S`. [`Transform::rotate_vector`] applies the same order
//! directly without building a matrix.
use log::debug;
use serde::{Deserialize, Serialize};

use crate::geometry::Mesh;
use crate::math::{Matrix4, Vector3};

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationState {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RotationState {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f64, dy: f64, dz: f64) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }
}

impl Default for RotationState {
    fn default() -> Self {
        Self::zero()
    }
}

/// Nine-parameter affine transform applied to a mesh before viewing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub scale: Vector3,
    pub rotation: RotationState,
    pub translation: Vector3,
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    pub fn new(scale: Vector3, rotation: RotationState, translation: Vector3) -> Self {
        Self {
            scale,
            rotation,
            translation,
        }
    }

    pub fn identity() -> Self {
        Self::new(
            Vector3::new(1.0, 1.0, 1.0),
            RotationState::zero(),
            Vector3::ZERO,
        )
    }

    /// Create a rotation matrix from a rotation state
    pub fn rotation_matrix(rotation: &RotationState) -> Matrix4 {
        let rx = Matrix4::rotation_x(rotation.x);
        let ry = Matrix4::rotation_y(rotation.y);
        let rz = Matrix4::rotation_z(rotation.z);

        // Column vectors: X is applied first, Z last
        rz * ry * rx
    }

    /// Create a translation matrix
    pub fn translation_matrix(x: f64, y: f64, z: f64) -> Matrix4 {
        Matrix4::translation(Vector3::new(x, y, z))
    }

    /// Create a scale matrix
    pub fn scale_matrix(sx: f64, sy: f64, sz: f64) -> Matrix4 {
        Matrix4::scaling(Vector3::new(sx, sy, sz))
    }

    /// `T * R * S`
    pub fn model_matrix(&self) -> Matrix4 {
        let t = self.translation;
        let s = self.scale;
        Self::translation_matrix(t.x, t.y, t.z)
            * Self::rotation_matrix(&self.rotation)
            * Self::scale_matrix(s.x, s.y, s.z)
    }

    /// Create a model-view-projection matrix
    pub fn mvp_matrix(model: &Matrix4, view: &Matrix4, projection: &Matrix4) -> Matrix4 {
        *projection * *view * *model
    }

    /// Rotates `v` about X, then Y, then Z
    pub fn rotate_vector(&self, v: Vector3) -> Vector3 {
        let (sx, cx) = self.rotation.x.sin_cos();
        let (sy, cy) = self.rotation.y.sin_cos();
        let (sz, cz) = self.rotation.z.sin_cos();

        let v = Vector3::new(v.x, v.y * cx - v.z * sx, v.y * sx + v.z * cx);
        let v = Vector3::new(v.x * cy + v.z * sy, v.y, -v.x * sy + v.z * cy);
        Vector3::new(v.x * cz - v.y * sz, v.x * sz + v.y * cz, v.z)
    }

    /// Scale, rotate, then translate a single position
    pub fn transform_point(&self, p: Vector3) -> Vector3 {
        self.rotate_vector(p.component_mul(self.scale)) + self.translation
    }

    /// Inverse-transpose of the model matrix, used for normals. Falls back to
    /// the pure rotation when a scale component is zero.
    pub fn normal_matrix(&self) -> Matrix4 {
        self.model_matrix()
            .inverse()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(|_| Self::rotation_matrix(&self.rotation))
    }

    /// Transformed copy of `mesh`; the source is left untouched.
    ///
    /// Normals that collapse to zero length (zero scale along them) become
    /// the zero vector.
    pub fn apply_to_mesh(&self, mesh: &Mesh) -> Mesh {
        let model = self.model_matrix();
        let normal_matrix = self.normal_matrix();

        let mut out = mesh.clone();
        for v in &mut out.vertices {
            *v = model.transform_point(*v).xyz();
        }
        for n in &mut out.normals {
            *n = normal_matrix
                .transform_vector(*n)
                .normalize()
                .unwrap_or(Vector3::ZERO);
        }

        debug!(
            "applied transform to {} vertices and {} normals",
            out.vertices.len(),
            out.normals.len()
        );
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;

    fn sample() -> Transform {
        Transform::new(
            Vector3::new(2.0, 0.5, -1.5),
            RotationState::new(0.3, -1.1, 2.4),
            Vector3::new(4.0, -2.0, 7.0),
        )
    }

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::zero();
        assert_eq!(state.x, 0.0);
        assert_eq!(state.y, 0.0);
        assert_eq!(state.z, 0.0);

        state.rotate(0.1, 0.2, 0.3);
        assert!((state.x - 0.1).abs() < 1e-6);
        assert!((state.y - 0.2).abs() < 1e-6);
        assert!((state.z - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_identity_rotation() {
        let rotation = RotationState::zero();
        let matrix = Transform::rotation_matrix(&rotation);
        assert!(matrix.approx_eq(&Matrix4::identity(), 1e-12));
    }

    #[test]
    fn test_matrix_and_direct_paths_agree() {
        let transform = sample();
        let model = transform.model_matrix();
        for p in [
            Vector3::X,
            Vector3::new(-3.0, 0.25, 9.0),
            Vector3::new(0.5, -0.5, 0.5),
        ] {
            let via_matrix = model.transform_point(p).xyz();
            assert!(via_matrix.approx_eq(transform.transform_point(p), 1e-9));
        }
    }

    #[test]
    fn test_rotation_order_is_x_then_y() {
        // X then Y maps +Y to +Z (about X), then +Z to +X (about Y)
        let transform = Transform::new(
            Vector3::new(1.0, 1.0, 1.0),
            RotationState::new(FRAC_PI_2, FRAC_PI_2, 0.0),
            Vector3::ZERO,
        );
        assert!(transform.rotate_vector(Vector3::Y).approx_eq(Vector3::X, 1e-12));
    }

    #[test]
    fn test_apply_to_mesh_returns_a_copy() {
        let mut mesh = Mesh::cube(2.0);
        mesh.compute_normals();
        let transform = Transform {
            translation: Vector3::new(10.0, 0.0, 0.0),
            scale: Vector3::new(3.0, 1.0, 1.0),
            ..Transform::identity()
        };

        let moved = transform.apply_to_mesh(&mesh);

        assert_eq!(mesh.vertices[6], Vector3::new(1.0, 1.0, 1.0));
        assert_eq!(moved.vertices[6], Vector3::new(13.0, 1.0, 1.0));
        assert_eq!(moved.polygons, mesh.polygons);
        for n in &moved.normals {
            assert!((n.length() - 1.0).abs() < 1e-9);
        }
        // Stretching along X flattens the corner normals towards the YZ plane
        assert!(moved.normals[6].x < mesh.normals[6].x);
    }

    #[test]
    fn test_zero_scale_keeps_normals_finite() {
        let mut mesh = Mesh::cube(2.0);
        mesh.compute_normals();
        let transform = Transform {
            scale: Vector3::new(0.0, 1.0, 1.0),
            ..Transform::identity()
        };
        let flat = transform.apply_to_mesh(&mesh);
        assert!(flat.vertices.iter().all(|v| v.x == 0.0));
        assert!(flat.normals.iter().all(|n| n.is_finite()));
    }
}
