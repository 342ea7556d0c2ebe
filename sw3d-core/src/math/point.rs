//! Positions, kept apart from displacement vectors
use std::fmt;
use std::ops::{Add, Sub};

use nalgebra as na;
use serde::{Deserialize, Serialize};

use super::vector::{Vector2, Vector3};

/// A position in the plane
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point2(Vector2);

/// A position in space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point3(Vector3);

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self(Vector2::new(x, y))
    }

    pub fn x(self) -> f64 {
        self.0.x
    }

    pub fn y(self) -> f64 {
        self.0.y
    }

    pub fn translate(self, offset: Vector2) -> Self {
        Self(self.0 + offset)
    }

    /// Displacement from the origin
    pub fn to_vector(self) -> Vector2 {
        self.0
    }
}

impl Point3 {
    pub const ORIGIN: Self = Self(Vector3::ZERO);

    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self(Vector3::new(x, y, z))
    }

    pub fn from_vector(v: Vector3) -> Self {
        Self(v)
    }

    pub fn x(self) -> f64 {
        self.0.x
    }

    pub fn y(self) -> f64 {
        self.0.y
    }

    pub fn z(self) -> f64 {
        self.0.z
    }

    pub fn translate(self, offset: Vector3) -> Self {
        Self(self.0 + offset)
    }

    /// Displacement from the origin
    pub fn to_vector(self) -> Vector3 {
        self.0
    }

    pub fn distance(self, other: Self) -> f64 {
        (self - other).length()
    }

    pub fn approx_eq(self, other: Self, tolerance: f64) -> bool {
        self.0.approx_eq(other.0, tolerance)
    }
}

impl Add<Vector2> for Point2 {
    type Output = Point2;
    fn add(self, rhs: Vector2) -> Point2 {
        self.translate(rhs)
    }
}

impl Sub for Point2 {
    type Output = Vector2;
    fn sub(self, rhs: Point2) -> Vector2 {
        self.0 - rhs.0
    }
}

impl Add<Vector3> for Point3 {
    type Output = Point3;
    fn add(self, rhs: Vector3) -> Point3 {
        self.translate(rhs)
    }
}

impl Sub<Vector3> for Point3 {
    type Output = Point3;
    fn sub(self, rhs: Vector3) -> Point3 {
        self.translate(-rhs)
    }
}

impl Sub for Point3 {
    type Output = Vector3;
    fn sub(self, rhs: Point3) -> Vector3 {
        self.0 - rhs.0
    }
}

impl From<Point3> for na::Point3<f64> {
    fn from(p: Point3) -> Self {
        na::Point3::new(p.x(), p.y(), p.z())
    }
}

impl fmt::Display for Point3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_minus_point_is_vector() {
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(0.0, 2.0, 5.0);
        assert_eq!(a - b, Vector3::new(1.0, 0.0, -2.0));
        assert_eq!(b + (a - b), a);
    }

    #[test]
    fn test_translate() {
        let p = Point2::new(1.0, 1.0).translate(Vector2::new(-1.0, 2.0));
        assert_eq!(p, Point2::new(0.0, 3.0));
        assert_eq!(Point3::ORIGIN - Vector3::X, Point3::new(-1.0, 0.0, 0.0));
    }
}
