//! Applying suggested print orientations.
//!
//! The advisor only ranks orientations; these helpers turn a suggestion
//! into a rotated facet list resting on the bed.

use mesh_types::{Facet, MeshBounds, Point3, UnitQuaternion, Vector3};

use crate::advisor::OrientationSuggestion;

/// Rotate facets by a suggestion's rotation.
///
/// Vertices and normals are rotated about the origin.
///
/// # Example
///
/// ```
/// use mesh_printability::{apply_orientation, OrientationSuggestion};
/// use mesh_types::{Facet, Triangle};
///
/// let facet = Facet::from_triangle(Triangle::from_arrays(
///     [0.0, 0.0, 0.0],
///     [1.0, 0.0, 0.0],
///     [0.0, 1.0, 0.0],
/// ));
/// let flip = OrientationSuggestion {
///     rotation_x: 180.0,
///     rotation_y: 0.0,
///     rotation_z: 0.0,
///     benefits: Vec::new(),
///     drawbacks: Vec::new(),
///     support_reduction_percent: 0.0,
///     print_time_change_percent: 0.0,
///     confidence: 1.0,
/// };
///
/// let flipped = apply_orientation(&[facet], &flip);
/// assert!((flipped[0].normal.z + 1.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn apply_orientation(facets: &[Facet], orientation: &OrientationSuggestion) -> Vec<Facet> {
    rotate_facets(facets, &orientation.rotation())
}

/// Rotate facets by an arbitrary rotation.
#[must_use]
pub fn rotate_facets(facets: &[Facet], rotation: &UnitQuaternion<f64>) -> Vec<Facet> {
    facets
        .iter()
        .map(|f| Facet {
            triangle: f.triangle.map_vertices(|v| rotation * v),
            normal: rotation * f.normal,
        })
        .collect()
}

/// Translate facets so the lowest vertex sits at z = 0.
#[must_use]
pub fn place_on_build_plate(facets: &[Facet]) -> Vec<Facet> {
    let Some(bounds) = facets.bounds_opt() else {
        return facets.to_vec();
    };

    let shift = Vector3::new(0.0, 0.0, -bounds.min.z);
    facets
        .iter()
        .map(|f| Facet {
            triangle: f.triangle.map_vertices(|v: Point3<f64>| v + shift),
            normal: f.normal,
        })
        .collect()
}
