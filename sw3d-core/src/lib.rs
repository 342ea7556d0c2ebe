//! SW3D Core Library - geometry, OBJ codec and software rendering
//!
//! This library provides the stateless core of the viewer: vector and matrix
//! math, the polygon mesh model with its topology edits, OBJ import/export,
//! the camera, model transforms and a CPU rasterizer with a depth buffer.

pub mod camera;
pub mod error;
pub mod geometry;
pub mod io;
pub mod math;
pub mod obj;
pub mod processing;
pub mod projection;
pub mod raster;
pub mod render;
pub mod topology;
pub mod transform;

// Re-export commonly used types
pub use camera::{Camera, CameraAxis, ProjectionMode};
pub use error::{Error, Result};
pub use geometry::{Mesh, Polygon, PolygonBuilder};
pub use io::{export_mesh, import_mesh, MeshSink, MeshSource};
pub use math::{Matrix4, Point2, Point3, Vector2, Vector3, Vector4};
pub use raster::{Color, FrameBuffer, Texture};
pub use render::{apply_transform, LightSource, RenderMode, RenderOptions, RenderStats, Renderer};
pub use transform::{RotationState, Transform};
