//! Linear algebra value types
//!
//! Vectors and points are plain `f64` tuples; [`Matrix4`] wraps nalgebra for
//! its decompositions.
pub mod matrix;
pub mod point;
pub mod vector;

pub use matrix::Matrix4;
pub use point::{Point2, Point3};
pub use vector::{Vector2, Vector3, Vector4};

/// Tolerance used by approximate equality and degeneracy checks
pub const EPSILON: f64 = 1e-6;
