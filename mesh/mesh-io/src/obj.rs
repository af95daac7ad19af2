//! OBJ (Wavefront) file format support.
//!
//! Only geometry is read:
//!
//! ```text
//! v x y z [w]        – vertex position (w ignored)
//! f i j k ...        – polygon, 1-based indices, fan-triangulated
//! f i/t/n j/t/n ...  – texture and normal indices are ignored
//! ```
//!
//! Negative face indices count back from the most recent vertex. Faces that
//! reference missing vertices are skipped. Normals are computed from the
//! vertex winding since OBJ normals are per-vertex, not per-face.

use std::path::Path;

use mesh_types::{Facet, Point3, Triangle};
use tracing::debug;

use crate::error::{IoError, IoResult};

/// Load facets from an OBJ file.
///
/// # Errors
///
/// Returns an error if the file does not exist or cannot be read.
///
/// # Example
///
/// ```no_run
/// use mesh_io::load_obj;
///
/// let facets = load_obj("model.obj").unwrap();
/// ```
pub fn load_obj<P: AsRef<Path>>(path: P) -> IoResult<Vec<Facet>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| IoError::from_open(path, e))?;
    Ok(parse_obj(&String::from_utf8_lossy(&bytes)))
}

/// Parse OBJ text already in memory.
///
/// # Example
///
/// ```
/// use mesh_io::parse_obj;
///
/// let quad = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
/// assert_eq!(parse_obj(quad).len(), 2);
/// ```
#[must_use]
pub fn parse_obj(text: &str) -> Vec<Facet> {
    let mut pool: Vec<Point3<f64>> = Vec::new();
    let mut facets = Vec::new();
    let mut skipped = 0_usize;

    for line in text.lines() {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("v") => {
                let coords: Vec<f64> = parts
                    .take(3)
                    .filter_map(|p| p.parse().ok())
                    .filter(|c: &f64| c.is_finite())
                    .collect();
                if let [x, y, z] = coords[..] {
                    pool.push(Point3::new(x, y, z));
                } else {
                    // keep numbering aligned with the file
                    pool.push(Point3::origin());
                    skipped += 1;
                }
            }
            Some("f") => {
                let indices: Option<Vec<usize>> =
                    parts.map(|p| resolve_index(p, pool.len())).collect();
                match indices {
                    Some(indices) if indices.len() >= 3 => {
                        facets.extend(fan_triangulate(&pool, &indices));
                    }
                    _ => skipped += 1,
                }
            }
            _ => {}
        }
    }

    if skipped > 0 {
        debug!(skipped, "Skipped malformed OBJ vertex/face lines");
    }

    facets
}

/// Turn an OBJ index token into a zero-based pool index.
fn resolve_index(token: &str, pool_len: usize) -> Option<usize> {
    let raw: i64 = token.split('/').next()?.parse().ok()?;
    let len = i64::try_from(pool_len).ok()?;
    let index = match raw {
        0 => return None,
        r if r > 0 => r - 1,
        r => len + r,
    };
    if (0..len).contains(&index) {
        usize::try_from(index).ok()
    } else {
        None
    }
}

/// Fan triangulation from the first index.
fn fan_triangulate<'a>(
    pool: &'a [Point3<f64>],
    indices: &'a [usize],
) -> impl Iterator<Item = Facet> + 'a {
    let first = pool[indices[0]];
    indices.windows(2).skip(1).map(move |pair| {
        Facet::from_triangle(Triangle::new(first, pool[pair[0]], pool[pair[1]]))
    })
}
