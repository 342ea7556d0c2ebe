//! Polygon mesh data model
use std::collections::HashSet;

use crate::error::PolygonError;
use crate::math::{Vector2, Vector3};

/// An immutable face: ordered vertex indices plus optional parallel
/// texture-coordinate and normal indices (all 0-based).
///
/// Built through [`PolygonBuilder`], which guarantees at least three distinct
/// vertices and auxiliary lists that are either complete or absent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Polygon {
    vertices: Vec<usize>,
    texture_coords: Option<Vec<usize>>,
    normals: Option<Vec<usize>>,
}

impl Polygon {
    pub fn new(vertices: Vec<usize>) -> Result<Self, PolygonError> {
        PolygonBuilder::new().vertices(vertices).build()
    }

    pub fn triangle(a: usize, b: usize, c: usize) -> Result<Self, PolygonError> {
        Self::new(vec![a, b, c])
    }

    pub fn builder() -> PolygonBuilder {
        PolygonBuilder::new()
    }

    pub fn vertex_indices(&self) -> &[usize] {
        &self.vertices
    }

    pub fn texture_indices(&self) -> Option<&[usize]> {
        self.texture_coords.as_deref()
    }

    pub fn normal_indices(&self) -> Option<&[usize]> {
        self.normals.as_deref()
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn is_triangle(&self) -> bool {
        self.vertices.len() == 3
    }

    /// Closed edge loop as pairs of vertex indices
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.vertices.len();
        (0..n).map(move |i| (self.vertices[i], self.vertices[(i + 1) % n]))
    }

    /// Copy of this polygon with a new set of normal indices
    pub fn with_normal_indices(&self, normals: Vec<usize>) -> Result<Self, PolygonError> {
        let mut builder = PolygonBuilder::new()
            .vertices(self.vertices.iter().copied())
            .normals(normals);
        if let Some(texture_coords) = &self.texture_coords {
            builder = builder.texture_coords(texture_coords.iter().copied());
        }
        builder.build()
    }

    /// Rewrites vertex indices through a strictly increasing mapping, which
    /// keeps them distinct.
    pub(crate) fn remap_vertices(&self, map: impl Fn(usize) -> usize) -> Self {
        Self {
            vertices: self.vertices.iter().map(|&v| map(v)).collect(),
            texture_coords: self.texture_coords.clone(),
            normals: self.normals.clone(),
        }
    }

    /// Construction from parts already known to satisfy the invariants
    pub(crate) fn from_parts_unchecked(
        vertices: Vec<usize>,
        texture_coords: Option<Vec<usize>>,
        normals: Option<Vec<usize>>,
    ) -> Self {
        debug_assert!(vertices.len() >= 3);
        Self {
            vertices,
            texture_coords,
            normals,
        }
    }
}

/// Collects indices and validates them into a [`Polygon`]
#[derive(Debug, Clone, Default)]
pub struct PolygonBuilder {
    vertices: Vec<usize>,
    texture_coords: Vec<usize>,
    normals: Vec<usize>,
}

impl PolygonBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex(mut self, index: usize) -> Self {
        self.vertices.push(index);
        self
    }

    pub fn texture_coord(mut self, index: usize) -> Self {
        self.texture_coords.push(index);
        self
    }

    pub fn normal(mut self, index: usize) -> Self {
        self.normals.push(index);
        self
    }

    pub fn vertices(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.vertices.extend(indices);
        self
    }

    pub fn texture_coords(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.texture_coords.extend(indices);
        self
    }

    pub fn normals(mut self, indices: impl IntoIterator<Item = usize>) -> Self {
        self.normals.extend(indices);
        self
    }

    pub fn build(self) -> Result<Polygon, PolygonError> {
        let count = self.vertices.len();
        if count < 3 {
            return Err(PolygonError::TooFewVertices(count));
        }

        let mut seen = HashSet::with_capacity(count);
        for &index in &self.vertices {
            if !seen.insert(index) {
                return Err(PolygonError::DuplicateVertex(index));
            }
        }

        let texture_coords = attribute(self.texture_coords, "texture", count)?;
        let normals = attribute(self.normals, "normal", count)?;

        Ok(Polygon {
            vertices: self.vertices,
            texture_coords,
            normals,
        })
    }
}

fn attribute(
    indices: Vec<usize>,
    name: &'static str,
    expected: usize,
) -> Result<Option<Vec<usize>>, PolygonError> {
    match indices.len() {
        0 => Ok(None),
        n if n == expected => Ok(Some(indices)),
        found => Err(PolygonError::AttributeCountMismatch {
            attribute: name,
            expected,
            found,
        }),
    }
}

/// A polygon mesh: positions, texture coordinates, normals and faces
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub vertices: Vec<Vector3>,
    pub texture_coords: Vec<Vector2>,
    pub normals: Vec<Vector3>,
    pub polygons: Vec<Polygon>,
}

impl Mesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(vertices: usize, polygons: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertices),
            texture_coords: Vec::new(),
            normals: Vec::new(),
            polygons: Vec::with_capacity(polygons),
        }
    }

    pub fn add_vertex(&mut self, position: Vector3) -> usize {
        self.vertices.push(position);
        self.vertices.len() - 1
    }

    pub fn add_texture_coord(&mut self, uv: Vector2) -> usize {
        self.texture_coords.push(uv);
        self.texture_coords.len() - 1
    }

    pub fn add_normal(&mut self, normal: Vector3) -> usize {
        self.normals.push(normal);
        self.normals.len() - 1
    }

    pub fn add_polygon(&mut self, polygon: Polygon) -> usize {
        self.polygons.push(polygon);
        self.polygons.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }

    /// Number of triangles a fan triangulation would produce
    pub fn triangle_count(&self) -> usize {
        self.polygons.iter().map(|p| p.len().saturating_sub(2)).sum()
    }

    /// Axis-aligned bounds of all vertices, `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Vector3, Vector3)> {
        let first = *self.vertices.first()?;
        Some(self.vertices.iter().fold((first, first), |(lo, hi), v| {
            (
                Vector3::new(lo.x.min(v.x), lo.y.min(v.y), lo.z.min(v.z)),
                Vector3::new(hi.x.max(v.x), hi.y.max(v.y), hi.z.max(v.z)),
            )
        }))
    }

    /// Create a cube of quads, centered on the origin, with per-face UVs
    pub fn cube(size: f64) -> Self {
        let half = size / 2.0;
        let mut mesh = Self::with_capacity(8, 6);

        for (x, y, z) in [
            (-half, -half, -half),
            (half, -half, -half),
            (half, half, -half),
            (-half, half, -half),
            (-half, -half, half),
            (half, -half, half),
            (half, half, half),
            (-half, half, half),
        ] {
            mesh.add_vertex(Vector3::new(x, y, z));
        }
        for (u, v) in [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)] {
            mesh.add_texture_coord(Vector2::new(u, v));
        }

        // Counter-clockwise when seen from outside
        let faces = [
            [4, 5, 6, 7], // front
            [1, 0, 3, 2], // back
            [3, 7, 6, 2], // top
            [0, 1, 5, 4], // bottom
            [1, 2, 6, 5], // right
            [0, 4, 7, 3], // left
        ];
        for face in faces {
            mesh.add_polygon(Polygon::from_parts_unchecked(
                face.to_vec(),
                Some(vec![0, 1, 2, 3]),
                None,
            ));
        }

        mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_accepts_complete_attributes() {
        let polygon = Polygon::builder()
            .vertices([0, 1, 2])
            .texture_coords([2, 1, 0])
            .build()
            .unwrap();
        assert_eq!(polygon.vertex_indices(), &[0, 1, 2]);
        assert_eq!(polygon.texture_indices(), Some(&[2, 1, 0][..]));
        assert_eq!(polygon.normal_indices(), None);
    }

    #[test]
    fn test_builder_rejects_invalid_polygons() {
        assert_eq!(
            Polygon::new(vec![0, 1]),
            Err(PolygonError::TooFewVertices(2))
        );
        assert_eq!(
            Polygon::new(vec![0, 1, 0]),
            Err(PolygonError::DuplicateVertex(0))
        );
        assert!(matches!(
            Polygon::builder().vertices([0, 1, 2]).normals([0, 1]).build(),
            Err(PolygonError::AttributeCountMismatch {
                attribute: "normal",
                expected: 3,
                found: 2
            })
        ));
    }

    #[test]
    fn test_edges_close_the_loop() {
        let polygon = Polygon::new(vec![3, 5, 7, 9]).unwrap();
        let edges: Vec<_> = polygon.edges().collect();
        assert_eq!(edges, vec![(3, 5), (5, 7), (7, 9), (9, 3)]);
    }

    #[test]
    fn test_cube() {
        let cube = Mesh::cube(2.0);
        assert_eq!(cube.vertices.len(), 8);
        assert_eq!(cube.polygons.len(), 6);
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(
            cube.bounds(),
            Some((Vector3::new(-1.0, -1.0, -1.0), Vector3::new(1.0, 1.0, 1.0)))
        );
    }

    #[test]
    fn test_cube_faces_point_outwards() {
        let cube = Mesh::cube(2.0);
        for polygon in &cube.polygons {
            let idx = polygon.vertex_indices();
            let (a, b, c) = (cube.vertices[idx[0]], cube.vertices[idx[1]], cube.vertices[idx[2]]);
            let normal = (b - a).cross(c - a);
            let center = idx.iter().fold(Vector3::ZERO, |acc, &i| acc + cube.vertices[i]) / 4.0;
            assert!(normal.dot(center) > 0.0);
        }
    }
}
