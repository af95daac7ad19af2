//! Facets: triangles paired with their unit normal.

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Triangle;

/// Normal used when neither the file nor the geometry provides one.
pub const DEFAULT_NORMAL: [f64; 3] = [0.0, 0.0, 1.0];

/// One record of a triangle soup: a triangle plus its unit normal.
///
/// STL files carry a normal per facet; OBJ and 3MF do not. The normal stored
/// here is always unit length. Use [`Facet::from_file_normal`] to apply the
/// recovery rules for normals read from a file.
///
/// # Example
///
/// ```
/// use mesh_types::{Facet, Triangle, Vector3};
///
/// let tri = Triangle::from_arrays([0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]);
/// let facet = Facet::from_triangle(tri);
/// assert!((facet.normal.z + 1.0).abs() < 1e-10);
///
/// // A zero normal from the file is recomputed from the vertices
/// let facet = Facet::from_file_normal(tri, Vector3::zeros());
/// assert!((facet.normal.z + 1.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Facet {
    /// Vertex positions.
    pub triangle: Triangle,
    /// Unit normal.
    pub normal: Vector3<f64>,
}

impl Facet {
    /// Create a facet with an explicit normal, normalizing it.
    ///
    /// A zero or non-finite normal falls back to [`DEFAULT_NORMAL`].
    #[must_use]
    pub fn new(triangle: Triangle, normal: Vector3<f64>) -> Self {
        Self {
            triangle,
            normal: unit_or_default(normal),
        }
    }

    /// Create a facet whose normal is computed from the winding.
    ///
    /// Degenerate triangles get [`DEFAULT_NORMAL`].
    #[must_use]
    pub fn from_triangle(triangle: Triangle) -> Self {
        Self {
            triangle,
            normal: triangle.normal().unwrap_or_else(default_normal),
        }
    }

    /// Create a facet from a normal read from a file.
    ///
    /// The file normal wins when it is finite and non-zero; otherwise the
    /// normal is recomputed from the vertices.
    #[must_use]
    pub fn from_file_normal(triangle: Triangle, normal: Vector3<f64>) -> Self {
        if is_usable(&normal) {
            Self::new(triangle, normal)
        } else {
            Self::from_triangle(triangle)
        }
    }

    /// Triangle area in square units.
    #[inline]
    #[must_use]
    pub fn area(&self) -> f64 {
        self.triangle.area()
    }

    /// Triangle centroid.
    #[inline]
    #[must_use]
    pub fn centroid(&self) -> Point3<f64> {
        self.triangle.centroid()
    }
}

fn default_normal() -> Vector3<f64> {
    Vector3::new(DEFAULT_NORMAL[0], DEFAULT_NORMAL[1], DEFAULT_NORMAL[2])
}

fn is_usable(normal: &Vector3<f64>) -> bool {
    normal.iter().all(|c| c.is_finite()) && normal.norm_squared() > f64::EPSILON
}

fn unit_or_default(normal: Vector3<f64>) -> Vector3<f64> {
    if is_usable(&normal) {
        normal.normalize()
    } else {
        default_normal()
    }
}
