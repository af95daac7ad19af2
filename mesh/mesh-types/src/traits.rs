//! Traits for mesh types.

use crate::{Aabb, Facet};

/// Trait for types that can compute a bounding box.
pub trait MeshBounds {
    /// Compute the axis-aligned bounding box.
    ///
    /// Returns an empty AABB if there are no vertices.
    fn bounds(&self) -> Aabb;

    /// Compute the bounding box, returning `None` if empty.
    fn bounds_opt(&self) -> Option<Aabb> {
        let b = self.bounds();
        if b.is_empty() { None } else { Some(b) }
    }
}

impl MeshBounds for [Facet] {
    fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::empty();
        for facet in self {
            for vertex in &facet.triangle.vertices() {
                aabb.expand_to_include(vertex);
            }
        }
        aabb
    }
}
