//! Fallback test mesh.
//!
//! Substituted for files that yield no triangles when
//! [`LoadOptions::permissive`](crate::LoadOptions::permissive) is set. It is
//! a 10 mm cube (one triangle per face) plus two angled facets:
//!
//! | Facet | Normal | Overhang |
//! |---|---|---|
//! | bottom | `(0, 0, -1)` | 90° (on the bed) |
//! | top, sides | up / horizontal | none |
//! | angled A | `(0.5, 0, -0.866)` | 60° |
//! | angled B | `(0.707, 0, -0.707)` | 45° |
//!
//! Both angled facets have an area of 15 mm² and sit between z = 5 and z = 8.

use mesh_types::{Facet, Triangle, Vector3};

/// Side length of the fallback cube in millimeters.
pub const FALLBACK_CUBE_SIZE: f64 = 10.0;

/// Build the fallback facet list.
///
/// # Example
///
/// ```
/// let facets = mesh_io::fallback_facets();
/// assert_eq!(facets.len(), 8);
/// ```
#[must_use]
pub fn fallback_facets() -> Vec<Facet> {
    let s = FALLBACK_CUBE_SIZE;
    let facet = |a: [f64; 3], b: [f64; 3], c: [f64; 3], n: [f64; 3]| {
        Facet::new(Triangle::from_arrays(a, b, c), Vector3::from(n))
    };

    let (sin60, cos60) = 60_f64.to_radians().sin_cos();
    let half_sqrt2 = std::f64::consts::FRAC_1_SQRT_2;

    vec![
        facet([0.0, 0.0, 0.0], [s, s, 0.0], [s, 0.0, 0.0], [0.0, 0.0, -1.0]),
        facet([0.0, 0.0, s], [s, 0.0, s], [s, s, s], [0.0, 0.0, 1.0]),
        facet([s, 0.0, 0.0], [s, s, 0.0], [s, s, s], [1.0, 0.0, 0.0]),
        facet([0.0, 0.0, 0.0], [0.0, s, s], [0.0, s, 0.0], [-1.0, 0.0, 0.0]),
        facet([0.0, s, 0.0], [s, s, s], [s, s, 0.0], [0.0, 1.0, 0.0]),
        facet([0.0, 0.0, 0.0], [s, 0.0, 0.0], [s, 0.0, s], [0.0, -1.0, 0.0]),
        // 90 - acos(|nz|) = 60
        facet(
            [0.0, 0.0, 5.0],
            [s, 0.0, 5.0],
            [5.0, 0.0, 8.0],
            [cos60, 0.0, -sin60],
        ),
        facet(
            [0.0, 5.0, 5.0],
            [s, 5.0, 5.0],
            [5.0, 5.0, 8.0],
            [half_sqrt2, 0.0, -half_sqrt2],
        ),
    ]
}
