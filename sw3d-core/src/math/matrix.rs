//! Row-major 4x4 matrix backed by nalgebra
//!
//! Column-vector convention: `m * v` transforms `v`, and `a * b` applies `b`
//! first. A model-view-projection matrix is therefore `projection * view * model`.
use std::ops::{Add, Mul, Sub};

use nalgebra as na;

use super::point::Point3;
use super::vector::{Vector3, Vector4};
use super::EPSILON;
use crate::error::MathError;

/// Determinants smaller than this are treated as singular
pub const SINGULAR_EPSILON: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
pub struct Matrix4(na::Matrix4<f64>);

impl Matrix4 {
    pub fn identity() -> Self {
        Self(na::Matrix4::identity())
    }

    pub fn zero() -> Self {
        Self(na::Matrix4::zeros())
    }

    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        Self(na::Matrix4::from_fn(|r, c| rows[r][c]))
    }

    pub fn to_rows(&self) -> [[f64; 4]; 4] {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, value) in row.iter_mut().enumerate() {
                *value = self.0[(r, c)];
            }
        }
        rows
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.0[(row, col)]
    }

    pub fn row(&self, row: usize) -> Vector4 {
        Vector4::new(
            self.0[(row, 0)],
            self.0[(row, 1)],
            self.0[(row, 2)],
            self.0[(row, 3)],
        )
    }

    pub fn translation(offset: Vector3) -> Self {
        Self(na::Matrix4::new_translation(&offset.into()))
    }

    pub fn scaling(factors: Vector3) -> Self {
        Self(na::Matrix4::new_nonuniform_scaling(&factors.into()))
    }

    pub fn rotation_x(angle: f64) -> Self {
        Self(na::Matrix4::from_axis_angle(&na::Vector3::x_axis(), angle))
    }

    pub fn rotation_y(angle: f64) -> Self {
        Self(na::Matrix4::from_axis_angle(&na::Vector3::y_axis(), angle))
    }

    pub fn rotation_z(angle: f64) -> Self {
        Self(na::Matrix4::from_axis_angle(&na::Vector3::z_axis(), angle))
    }

    /// Right-handed rotation of `angle` radians about `axis`
    pub fn rotation_axis(axis: Vector3, angle: f64) -> Result<Self, MathError> {
        let axis = na::Unit::new_unchecked(axis.normalize()?.into());
        Ok(Self(na::Matrix4::from_axis_angle(&axis, angle)))
    }

    /// Right-handed view matrix looking from `eye` towards `target`
    pub fn look_at(eye: Point3, target: Point3, up: Vector3) -> Self {
        Self(na::Matrix4::look_at_rh(&eye.into(), &target.into(), &up.into()))
    }

    /// OpenGL-style perspective projection (NDC depth in [-1, 1])
    ///
    /// # Panics
    /// If `aspect` is zero or `near == far`.
    pub fn perspective(fov_y: f64, aspect: f64, near: f64, far: f64) -> Self {
        Self(na::Matrix4::new_perspective(aspect, fov_y, near, far))
    }

    /// # Panics
    /// If any of the three extents is empty.
    pub fn orthographic(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Self {
        Self(na::Matrix4::new_orthographic(
            left, right, bottom, top, near, far,
        ))
    }

    pub fn transpose(&self) -> Self {
        Self(self.0.transpose())
    }

    /// LU decomposition with partial pivoting
    pub fn determinant(&self) -> f64 {
        self.0.determinant()
    }

    pub fn inverse(&self) -> Result<Self, MathError> {
        self.check_regular()?;
        self.0
            .try_inverse()
            .map(Self)
            .ok_or(MathError::SingularMatrix)
    }

    /// Solves `self * x = rhs` for `x`
    pub fn solve(&self, rhs: Vector4) -> Result<Vector4, MathError> {
        self.check_regular()?;
        self.0
            .lu()
            .solve(&na::Vector4::from(rhs))
            .map(Vector4::from)
            .ok_or(MathError::SingularMatrix)
    }

    fn check_regular(&self) -> Result<(), MathError> {
        let det = self.determinant();
        if det.abs() < SINGULAR_EPSILON || !det.is_finite() {
            return Err(MathError::SingularMatrix);
        }
        Ok(())
    }

    /// `self * (p, 1)`, the homogeneous image of a position
    pub fn transform_point(&self, point: Vector3) -> Vector4 {
        *self * point.extend(1.0)
    }

    /// `self * (v, 0)`, ignores translation
    pub fn transform_vector(&self, v: Vector3) -> Vector3 {
        (*self * v.extend(0.0)).xyz()
    }

    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.0
            .iter()
            .zip(other.0.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl PartialEq for Matrix4 {
    fn eq(&self, other: &Self) -> bool {
        self.approx_eq(other, EPSILON)
    }
}

impl Add for Matrix4 {
    type Output = Matrix4;
    fn add(self, rhs: Matrix4) -> Matrix4 {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Matrix4 {
    type Output = Matrix4;
    fn sub(self, rhs: Matrix4) -> Matrix4 {
        Self(self.0 - rhs.0)
    }
}

impl Mul<f64> for Matrix4 {
    type Output = Matrix4;
    fn mul(self, rhs: f64) -> Matrix4 {
        Self(self.0 * rhs)
    }
}

impl Mul for Matrix4 {
    type Output = Matrix4;
    fn mul(self, rhs: Matrix4) -> Matrix4 {
        Self(self.0 * rhs.0)
    }
}

impl Mul<Vector4> for Matrix4 {
    type Output = Vector4;
    fn mul(self, rhs: Vector4) -> Vector4 {
        (self.0 * na::Vector4::from(rhs)).into()
    }
}
