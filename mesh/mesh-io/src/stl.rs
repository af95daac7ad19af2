//! STL (Stereolithography) file format support.
//!
//! Supports both ASCII and binary STL formats.
//!
//! # Format Detection
//!
//! The loader automatically detects whether a file is ASCII or binary:
//! - ASCII files start with "solid" (after optional whitespace)
//! - Binary files have an 80-byte header followed by face count
//!
//! Some exporters write binary files whose header starts with "solid"; a
//! NUL byte in the header or a file size that matches the face count exactly
//! marks those as binary. A "solid" file that yields no ASCII facets but is
//! long enough for its face count is retried as binary.
//!
//! # Binary Format
//!
//! ```text
//! UINT8[80]    – Header (ignored, often contains file info)
//! UINT32       – Number of triangles
//! foreach triangle
//!     REAL32[3] – Normal vector
//!     REAL32[3] – Vertex 1
//!     REAL32[3] – Vertex 2
//!     REAL32[3] – Vertex 3
//!     UINT16    – Attribute byte count (ignored)
//! end
//! ```
//!
//! # ASCII Format
//!
//! ```text
//! solid name
//!   facet normal ni nj nk
//!     outer loop
//!       vertex v1x v1y v1z
//!       vertex v2x v2y v2z
//!       vertex v3x v3y v3z
//!     endloop
//!   endfacet
//!   ...
//! endsolid name
//! ```
//!
//! # Lenient Parsing
//!
//! A `facet normal` line that cannot be parsed gets the normal `(0, 0, 1)`
//! instead of failing the whole file. Unparsable or non-finite vertex lines
//! are skipped and facets without exactly three vertices are dropped. Binary
//! records with non-finite vertices are dropped.

use std::path::Path;

use mesh_types::{Facet, Point3, Triangle, Vector3};
use tracing::{debug, warn};

use crate::error::{IoError, IoResult};

/// STL binary header size in bytes.
const HEADER_SIZE: usize = 80;

/// Size of one triangle in binary STL (normal + 3 vertices + attribute).
const TRIANGLE_SIZE: usize = 50;

/// Load facets from an STL file.
///
/// Automatically detects ASCII vs binary format. Returns an empty vector
/// when the file holds no parsable facets; [`crate::load_facets`] turns that
/// into an error.
///
/// # Errors
///
/// Returns an error if the file does not exist or cannot be read.
///
/// # Example
///
/// ```no_run
/// use mesh_io::load_stl;
///
/// let facets = load_stl("model.stl").unwrap();
/// println!("Loaded {} facets", facets.len());
/// ```
pub fn load_stl<P: AsRef<Path>>(path: P) -> IoResult<Vec<Facet>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| IoError::from_open(path, e))?;
    Ok(parse_stl(&bytes))
}

/// Parse STL content already in memory.
#[must_use]
pub fn parse_stl(bytes: &[u8]) -> Vec<Facet> {
    if !is_ascii_stl(bytes) {
        return parse_stl_binary(bytes);
    }

    let facets = parse_stl_ascii(&String::from_utf8_lossy(bytes));
    if facets.is_empty() && binary_size_fits(bytes) {
        debug!("No ASCII facets in \"solid\" STL, retrying as binary");
        return parse_stl_binary(bytes);
    }
    facets
}

fn is_ascii_stl(bytes: &[u8]) -> bool {
    let head = &bytes[..bytes.len().min(HEADER_SIZE)];
    let starts_with_solid = String::from_utf8_lossy(head)
        .trim_start()
        .to_ascii_lowercase()
        .starts_with("solid");

    starts_with_solid && !head.contains(&0) && !binary_size_matches(bytes)
}

/// True when the byte length is exactly header + count + count records.
fn binary_size_matches(bytes: &[u8]) -> bool {
    binary_len(bytes) == Some(bytes.len())
}

/// True when every declared record is present, padding allowed.
fn binary_size_fits(bytes: &[u8]) -> bool {
    binary_len(bytes).is_some_and(|len| len <= bytes.len())
}

/// Byte length implied by the face count.
fn binary_len(bytes: &[u8]) -> Option<usize> {
    let count = read_face_count(bytes)?;
    (count as usize)
        .checked_mul(TRIANGLE_SIZE)?
        .checked_add(HEADER_SIZE + 4)
}

fn read_face_count(bytes: &[u8]) -> Option<u32> {
    let raw = bytes.get(HEADER_SIZE..HEADER_SIZE + 4)?;
    Some(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]))
}

/// Parse a binary STL body.
fn parse_stl_binary(bytes: &[u8]) -> Vec<Facet> {
    let Some(face_count) = read_face_count(bytes) else {
        debug!(len = bytes.len(), "STL shorter than binary header");
        return Vec::new();
    };

    let body = &bytes[HEADER_SIZE + 4..];
    let available = body.len() / TRIANGLE_SIZE;
    if available < face_count as usize {
        warn!(
            expected = face_count,
            found = available,
            "Binary STL is truncated, keeping complete records"
        );
    }

    let mut non_finite = 0_usize;
    let facets = body
        .chunks_exact(TRIANGLE_SIZE)
        .take(face_count as usize)
        .filter_map(|record| {
            let normal = read_vec3(&record[0..12]);
            let v0 = read_vec3(&record[12..24]);
            let v1 = read_vec3(&record[24..36]);
            let v2 = read_vec3(&record[36..48]);
            if ![v0, v1, v2].iter().all(|v| v.iter().all(|c| c.is_finite())) {
                non_finite += 1;
                return None;
            }
            let triangle = Triangle::new(v0.into(), v1.into(), v2.into());
            Some(Facet::from_file_normal(triangle, normal))
        })
        .collect();

    if non_finite > 0 {
        warn!(count = non_finite, "Dropped binary STL records with non-finite vertices");
    }
    facets
}

/// Read three little-endian f32s.
fn read_vec3(buf: &[u8]) -> Vector3<f64> {
    let x = f32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    let y = f32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let z = f32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
    Vector3::new(f64::from(x), f64::from(y), f64::from(z))
}

/// Parse an ASCII STL body.
fn parse_stl_ascii(text: &str) -> Vec<Facet> {
    let mut facets = Vec::new();
    let mut normal: Option<NormalLine> = None;
    let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(3);
    let mut bad_normals = 0_usize;

    for line in text.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(keyword) = parts.first() else {
            continue;
        };

        match keyword.to_ascii_lowercase().as_str() {
            "facet" => {
                let parsed = parse_normal(&parts);
                if matches!(parsed, NormalLine::Malformed) {
                    bad_normals += 1;
                }
                normal = Some(parsed);
                vertices.clear();
            }
            "vertex" => {
                if let Some(p) = parse_point(&parts[1..]) {
                    vertices.push(p);
                }
            }
            "endfacet" => {
                if let (Some(n), [v0, v1, v2]) = (normal.take(), vertices.as_slice()) {
                    let triangle = Triangle::new(*v0, *v1, *v2);
                    facets.push(match n {
                        NormalLine::Parsed(n) => Facet::from_file_normal(triangle, n),
                        NormalLine::Malformed => Facet::new(triangle, Vector3::z()),
                    });
                }
                vertices.clear();
            }
            "endsolid" => break,
            _ => {}
        }
    }

    if bad_normals > 0 {
        warn!(count = bad_normals, "Malformed facet normals defaulted to +Z");
    }

    facets
}

enum NormalLine {
    Parsed(Vector3<f64>),
    Malformed,
}

/// Parse `facet normal nx ny nz`.
fn parse_normal(parts: &[&str]) -> NormalLine {
    let is_normal = parts
        .get(1)
        .is_some_and(|w| w.eq_ignore_ascii_case("normal"));
    match (is_normal, parts.get(2..5).and_then(parse_point)) {
        (true, Some(p)) => NormalLine::Parsed(p.coords),
        _ => NormalLine::Malformed,
    }
}

fn parse_point(parts: &[&str]) -> Option<Point3<f64>> {
    if parts.len() < 3 {
        return None;
    }
    let x: f64 = parts[0].parse().ok()?;
    let y: f64 = parts[1].parse().ok()?;
    let z: f64 = parts[2].parse().ok()?;
    (x.is_finite() && y.is_finite() && z.is_finite()).then_some(Point3::new(x, y, z))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn binary_stl(records: &[([f32; 3], [[f32; 3]; 3])]) -> Vec<u8> {
        let mut out = vec![b' '; HEADER_SIZE];
        #[allow(clippy::cast_possible_truncation)]
        let count = records.len() as u32;
        out.extend_from_slice(&count.to_le_bytes());
        for (normal, verts) in records {
            for c in normal.iter().chain(verts.iter().flatten()) {
                out.extend_from_slice(&c.to_le_bytes());
            }
            out.extend_from_slice(&0u16.to_le_bytes());
        }
        out
    }

    #[test]
    fn ascii_stl_parsing() {
        let ascii_stl = br"solid test
  facet normal 0 0 -1
    outer loop
      vertex 0 0 0
      vertex 1 0 0
      vertex 0 1 0
    endloop
  endfacet
endsolid test";

        let facets = parse_stl(ascii_stl);
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0].normal, Vector3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn malformed_normal_defaults_up() {
        let ascii_stl = b"solid t\nfacet normal a b c\nouter loop\nvertex 0 0 0\nvertex 0 1 0\nvertex 1 0 0\nendloop\nendfacet\nendsolid t\n";
        let facets = parse_stl(ascii_stl);
        assert_eq!(facets.len(), 1);
        assert_eq!(facets[0].normal, Vector3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn zero_normal_is_recomputed() {
        let ascii_stl = b"solid t\nfacet normal 0 0 0\nouter loop\nvertex 0 0 0\nvertex 0 1 0\nvertex 1 0 0\nendloop\nendfacet\nendsolid t\n";
        let facets = parse_stl(ascii_stl);
        assert!((facets[0].normal.z + 1.0).abs() < 1e-12);
    }

    #[test]
    fn incomplete_facet_is_dropped() {
        let ascii_stl = b"SOLID t\nFACET NORMAL 0 0 1\nOUTER LOOP\nVERTEX 0 0 0\nVERTEX 0 1 0\nENDLOOP\nENDFACET\nENDSOLID t\n";
        assert!(parse_stl(ascii_stl).is_empty());
    }

    #[test]
    fn binary_stl_parsing() {
        let bytes = binary_stl(&[(
            [0.5, 0.0, -0.866],
            [[0.0, 0.0, 10.0], [4.0, 0.0, 10.0], [0.0, 4.0, 10.0]],
        )]);
        let facets = parse_stl(&bytes);
        assert_eq!(facets.len(), 1);
        assert!((facets[0].normal.z + 0.866).abs() < 1e-3);
        assert!((facets[0].area() - 8.0).abs() < 1e-6);
    }

    #[test]
    fn binary_with_solid_header_is_detected() {
        let mut bytes = binary_stl(&[(
            [0.0, 0.0, 1.0],
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        )]);
        bytes[..5].copy_from_slice(b"solid");
        assert_eq!(parse_stl(&bytes).len(), 1);
    }

    #[test]
    fn padded_binary_with_solid_header_falls_back() {
        let mut bytes = binary_stl(&[(
            [0.0, 0.0, -1.0],
            [[0.0, 0.0, 5.0], [0.0, 1.0, 5.0], [1.0, 0.0, 5.0]],
        )]);
        bytes[..12].copy_from_slice(b"solid export");
        bytes.extend_from_slice(&[0_u8; 16]);
        assert!(is_ascii_stl(&bytes));

        let facets = parse_stl(&bytes);
        assert_eq!(facets.len(), 1);
        assert!((facets[0].normal.z + 1.0).abs() < 1e-12);
    }

    #[test]
    fn empty_ascii_is_not_read_as_binary() {
        let mut text = b"solid empty\n".to_vec();
        text.extend_from_slice(&[b' '; 200]);
        text.extend_from_slice(b"\nendsolid empty\n");
        assert!(parse_stl(&text).is_empty());
    }

    #[test]
    fn non_finite_ascii_vertices_are_skipped() {
        let ascii_stl = b"solid t\nfacet normal 0 0 -1\nouter loop\nvertex nan 0 0\nvertex 0 1 0\nvertex 1 0 0\nendloop\nendfacet\nfacet normal 0 0 -1\nouter loop\nvertex 0 0 inf\nvertex 0 1 0\nvertex 1 0 0\nendloop\nendfacet\nfacet normal 0 0 -1\nouter loop\nvertex 0 0 0\nvertex 0 1 0\nvertex 1 0 0\nendloop\nendfacet\nendsolid t\n";
        let facets = parse_stl(ascii_stl);
        assert_eq!(facets.len(), 1);
        assert!(facets[0].centroid().coords.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn non_finite_binary_records_are_dropped() {
        let bytes = binary_stl(&[
            ([0.0, 0.0, 1.0], [[f32::NAN, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
            ([0.0, 0.0, 1.0], [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]]),
        ]);
        let facets = parse_stl(&bytes);
        assert_eq!(facets.len(), 1);
        assert!((facets[0].centroid().z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn truncated_binary_keeps_complete_records() {
        let mut bytes = binary_stl(&[
            ([0.0, 0.0, 1.0], [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]),
            ([0.0, 0.0, 1.0], [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [0.0, 1.0, 1.0]]),
        ]);
        bytes.truncate(bytes.len() - 10);
        assert_eq!(parse_stl(&bytes).len(), 1);
    }

    #[test]
    fn load_nonexistent_file() {
        let result = load_stl("nonexistent_file_12345.stl");
        assert!(matches!(result, Err(IoError::FileNotFound { .. })));
    }
}
