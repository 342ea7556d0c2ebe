//! Fixed-size vector types
//!
//! Every operation returns a new value. Equality compares components on an
//! [`EPSILON`] grid so that `==` stays an equivalence relation and `Hash`
//! agrees with it; use [`Vector3::approx_eq`] and friends for an explicit
//! tolerance.
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, Div, Index, Mul, Neg, Sub};

use nalgebra as na;
use serde::{Deserialize, Serialize};

use super::EPSILON;
use crate::error::MathError;

/// Largest grid index that converts to `i64` without saturating
const MAX_BUCKET: f64 = 9.0e18;

/// How one component is compared and hashed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ComponentKey {
    /// Index of the [`EPSILON`] cell holding the value
    Bucket(i64),
    /// Magnitudes past the grid and infinities compare by their exact bits
    Exact(u64),
    /// NaN gets its own key so `Eq` stays reflexive
    NaN,
}

fn component_key(value: f64) -> ComponentKey {
    if value.is_nan() {
        return ComponentKey::NaN;
    }
    let bucket = (value / EPSILON).round();
    if bucket.abs() <= MAX_BUCKET {
        ComponentKey::Bucket(bucket as i64)
    } else {
        ComponentKey::Exact(value.to_bits())
    }
}

macro_rules! impl_vector {
    ($name:ident, $dim:expr, $fmt:literal, $($field:ident : $idx:tt),+) => {
        impl $name {
            pub const ZERO: Self = Self { $($field: 0.0),+ };

            pub const fn new($($field: f64),+) -> Self {
                Self { $($field),+ }
            }

            pub fn dot(self, other: Self) -> f64 {
                0.0 $(+ self.$field * other.$field)+
            }

            pub fn length_squared(self) -> f64 {
                self.dot(self)
            }

            pub fn length(self) -> f64 {
                self.length_squared().sqrt()
            }

            pub fn scale(self, factor: f64) -> Self {
                Self { $($field: self.$field * factor),+ }
            }

            /// Unit vector in the same direction.
            ///
            /// Fails with [`MathError::DegenerateVector`] when the length is
            /// below [`EPSILON`] or not a number.
            pub fn normalize(self) -> Result<Self, MathError> {
                let length = self.length();
                if !(length >= EPSILON) {
                    return Err(MathError::DegenerateVector);
                }
                Ok(self / length)
            }

            pub fn approx_eq(self, other: Self, tolerance: f64) -> bool {
                true $(&& (self.$field - other.$field).abs() <= tolerance)+
            }

            pub fn is_finite(self) -> bool {
                true $(&& self.$field.is_finite())+
            }

            pub fn to_array(self) -> [f64; $dim] {
                [$(self.$field),+]
            }

            fn key(&self) -> [ComponentKey; $dim] {
                [$(component_key(self.$field)),+]
            }
        }

        impl Add for $name {
            type Output = Self;
            fn add(self, rhs: Self) -> Self {
                Self { $($field: self.$field + rhs.$field),+ }
            }
        }

        impl Sub for $name {
            type Output = Self;
            fn sub(self, rhs: Self) -> Self {
                Self { $($field: self.$field - rhs.$field),+ }
            }
        }

        impl Mul<f64> for $name {
            type Output = Self;
            fn mul(self, rhs: f64) -> Self {
                self.scale(rhs)
            }
        }

        impl Mul<$name> for f64 {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                rhs.scale(self)
            }
        }

        impl Div<f64> for $name {
            type Output = Self;
            fn div(self, rhs: f64) -> Self {
                Self { $($field: self.$field / rhs),+ }
            }
        }

        impl Neg for $name {
            type Output = Self;
            fn neg(self) -> Self {
                Self { $($field: -self.$field),+ }
            }
        }

        impl Index<usize> for $name {
            type Output = f64;
            fn index(&self, index: usize) -> &f64 {
                match index {
                    $($idx => &self.$field,)+
                    _ => panic!(concat!(stringify!($name), " index {} out of range"), index),
                }
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                self.key() == other.key()
            }
        }

        impl Eq for $name {}

        impl Hash for $name {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.key().hash(state);
            }
        }

        impl From<[f64; $dim]> for $name {
            fn from(values: [f64; $dim]) -> Self {
                Self { $($field: values[$idx]),+ }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, $fmt, $(self.$field),+)
            }
        }
    };
}

/// 2D vector, used for texture coordinates
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

/// 3D vector
///
/// `==` snaps components to an [`EPSILON`] grid, so two values a hair apart
/// can still land in neighbouring cells; use [`Vector3::approx_eq`] to
/// compare with a tolerance.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Homogeneous 4D vector
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Vector4 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl_vector!(Vector2, 2, "({}, {})", x: 0, y: 1);
impl_vector!(Vector3, 3, "({}, {}, {})", x: 0, y: 1, z: 2);
impl_vector!(Vector4, 4, "({}, {}, {}, {})", x: 0, y: 1, z: 2, w: 3);

impl Vector3 {
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    pub fn cross(self, other: Self) -> Self {
        Self {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Homogeneous extension with the given `w`
    pub fn extend(self, w: f64) -> Vector4 {
        Vector4::new(self.x, self.y, self.z, w)
    }

    pub fn component_mul(self, other: Self) -> Self {
        Self::new(self.x * other.x, self.y * other.y, self.z * other.z)
    }
}

impl Vector4 {
    pub fn xyz(self) -> Vector3 {
        Vector3::new(self.x, self.y, self.z)
    }
}

impl From<Vector3> for na::Vector3<f64> {
    fn from(v: Vector3) -> Self {
        na::Vector3::new(v.x, v.y, v.z)
    }
}

impl From<na::Vector3<f64>> for Vector3 {
    fn from(v: na::Vector3<f64>) -> Self {
        Vector3::new(v.x, v.y, v.z)
    }
}

impl From<Vector4> for na::Vector4<f64> {
    fn from(v: Vector4) -> Self {
        na::Vector4::new(v.x, v.y, v.z, v.w)
    }
}

impl From<na::Vector4<f64>> for Vector4 {
    fn from(v: na::Vector4<f64>) -> Self {
        Vector4::new(v.x, v.y, v.z, v.w)
    }
}
