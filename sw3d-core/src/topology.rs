//! Topology edits and structural validation
use std::collections::HashSet;

use log::debug;

use crate::error::{ValidationError, ValidationIssue};
use crate::geometry::{Mesh, Polygon};

impl Mesh {
    /// Removes the polygons at `indices`. Remaining polygons keep their order.
    /// Out-of-range and repeated indices are ignored. Returns how many were removed.
    pub fn delete_polygons(&mut self, indices: &[usize]) -> usize {
        let doomed: HashSet<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.polygons.len())
            .collect();
        if doomed.is_empty() {
            return 0;
        }

        let mut position = 0;
        self.polygons.retain(|_| {
            let keep = !doomed.contains(&position);
            position += 1;
            keep
        });
        doomed.len()
    }

    /// Removes the vertices at `indices`, every polygon touching one of them,
    /// and shifts surviving vertex references down by the number of deleted
    /// vertices below them. Returns how many vertices were removed.
    pub fn delete_vertices(&mut self, indices: &[usize]) -> usize {
        let mut doomed: Vec<usize> = indices
            .iter()
            .copied()
            .filter(|&i| i < self.vertices.len())
            .collect();
        doomed.sort_unstable();
        doomed.dedup();
        if doomed.is_empty() {
            return 0;
        }

        let polygons_before = self.polygons.len();
        self.polygons.retain(|polygon| {
            !polygon
                .vertex_indices()
                .iter()
                .any(|v| doomed.binary_search(v).is_ok())
        });

        let mut position = 0;
        self.vertices.retain(|_| {
            let keep = doomed.binary_search(&position).is_err();
            position += 1;
            keep
        });

        let shift = |v: usize| v - doomed.partition_point(|&d| d < v);
        self.polygons = self
            .polygons
            .iter()
            .map(|polygon| polygon.remap_vertices(shift))
            .collect();

        debug!(
            "deleted {} vertices and {} dependent polygons",
            doomed.len(),
            polygons_before - self.polygons.len()
        );
        doomed.len()
    }

    /// Removes vertices no polygon references. Returns how many were removed.
    pub fn delete_unused_vertices(&mut self) -> usize {
        let used: HashSet<usize> = self
            .polygons
            .iter()
            .flat_map(|p| p.vertex_indices().iter().copied())
            .collect();
        let unused: Vec<usize> = (0..self.vertices.len())
            .filter(|i| !used.contains(i))
            .collect();
        self.delete_vertices(&unused)
    }

    /// Whether every polygon index resolves into its array
    pub fn is_valid(&self) -> bool {
        self.polygons
            .iter()
            .enumerate()
            .all(|(i, polygon)| self.polygon_issues(i, polygon).next().is_none())
    }

    /// Full structural check: at least one vertex and one polygon, and no
    /// dangling references. Every problem is reported, not just the first.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        if self.vertices.is_empty() {
            issues.push(ValidationIssue::NoVertices);
        }
        if self.polygons.is_empty() {
            issues.push(ValidationIssue::NoPolygons);
        }
        for (i, polygon) in self.polygons.iter().enumerate() {
            issues.extend(self.polygon_issues(i, polygon));
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Drops only the polygons with out-of-range references. Returns how many
    /// were removed.
    pub fn clean_invalid_polygons(&mut self) -> usize {
        let invalid: Vec<usize> = self
            .polygons
            .iter()
            .enumerate()
            .filter(|(i, polygon)| self.polygon_issues(*i, polygon).next().is_some())
            .map(|(i, _)| i)
            .collect();
        self.delete_polygons(&invalid)
    }

    fn polygon_issues<'a>(
        &'a self,
        polygon_index: usize,
        polygon: &'a Polygon,
    ) -> impl Iterator<Item = ValidationIssue> + 'a {
        let attributes = [
            ("vertex", Some(polygon.vertex_indices()), self.vertices.len()),
            ("texture coordinate", polygon.texture_indices(), self.texture_coords.len()),
            ("normal", polygon.normal_indices(), self.normals.len()),
        ];
        attributes
            .into_iter()
            .filter_map(|(name, indices, len)| indices.map(|indices| (name, indices, len)))
            .flat_map(move |(attribute, indices, len)| {
                indices
                    .iter()
                    .filter(move |&&index| index >= len)
                    .map(move |&index| ValidationIssue::IndexOutOfRange {
                        polygon: polygon_index,
                        attribute,
                        index,
                        len,
                    })
            })
    }
}
