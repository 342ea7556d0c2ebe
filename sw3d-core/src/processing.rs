//! Mesh processing: fan triangulation and vertex normal generation
use log::trace;

use crate::geometry::{Mesh, Polygon};
use crate::math::Vector3;

impl Polygon {
    /// Fan triangulation around the first vertex: `(v0, vi, vi+1)`.
    ///
    /// Texture and normal indices follow the same pattern. Triangles come back
    /// unchanged. Non-convex polygons are not special-cased and may produce
    /// overlapping triangles.
    pub fn triangulate(&self) -> Vec<Polygon> {
        if self.is_triangle() {
            return vec![self.clone()];
        }

        let fan = |indices: &[usize], i: usize| vec![indices[0], indices[i], indices[i + 1]];
        let vertices = self.vertex_indices();
        (1..vertices.len() - 1)
            .map(|i| {
                Polygon::from_parts_unchecked(
                    fan(vertices, i),
                    self.texture_indices().map(|t| fan(t, i)),
                    self.normal_indices().map(|n| fan(n, i)),
                )
            })
            .collect()
    }
}

/// Triangulates every polygon, preserving order
pub fn triangulate_polygons(polygons: &[Polygon]) -> Vec<Polygon> {
    polygons.iter().flat_map(Polygon::triangulate).collect()
}

/// Unit face normal from the first three vertices, `None` when degenerate or
/// out of range
pub fn face_normal(vertices: &[Vector3], polygon: &Polygon) -> Option<Vector3> {
    let idx = polygon.vertex_indices();
    let a = *vertices.get(idx[0])?;
    let b = *vertices.get(idx[1])?;
    let c = *vertices.get(idx[2])?;
    (b - a).cross(c - a).normalize().ok()
}

impl Mesh {
    /// Replace every polygon with its fan triangulation
    pub fn triangulate(&mut self) {
        let before = self.polygons.len();
        self.polygons = triangulate_polygons(&self.polygons);
        trace!("triangulated {} polygons into {}", before, self.polygons.len());
    }

    /// Smooth per-vertex normals averaged from adjacent face normals.
    ///
    /// Replaces `normals` with one entry per vertex and points every polygon's
    /// normal indices at its own vertex indices. Vertices no valid face touches
    /// keep a zero normal; so do vertices whose contributions cancel out.
    pub fn compute_normals(&mut self) {
        let mut sums = vec![Vector3::ZERO; self.vertices.len()];
        let mut counts = vec![0u32; self.vertices.len()];

        for polygon in &self.polygons {
            if polygon.vertex_indices().iter().any(|&v| v >= self.vertices.len()) {
                continue;
            }
            let Some(normal) = face_normal(&self.vertices, polygon) else {
                trace!("skipping degenerate face {:?}", polygon.vertex_indices());
                continue;
            };
            for &v in polygon.vertex_indices() {
                sums[v] = sums[v] + normal;
                counts[v] += 1;
            }
        }

        self.normals = sums
            .into_iter()
            .zip(counts)
            .map(|(sum, count)| match count {
                0 => Vector3::ZERO,
                n => (sum / f64::from(n)).normalize().unwrap_or(Vector3::ZERO),
            })
            .collect();

        self.polygons = self
            .polygons
            .iter()
            .map(|polygon| {
                Polygon::from_parts_unchecked(
                    polygon.vertex_indices().to_vec(),
                    polygon.texture_indices().map(<[usize]>::to_vec),
                    Some(polygon.vertex_indices().to_vec()),
                )
            })
            .collect();
    }
}
