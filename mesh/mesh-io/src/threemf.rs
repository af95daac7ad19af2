//! 3MF (3D Manufacturing Format) support.
//!
//! 3MF is a ZIP-based format designed for 3D printing. The geometry lives in
//! an XML model part, normally `3D/3dmodel.model`:
//!
//! ```text
//! <object><mesh>
//!   <vertices><vertex x=".." y=".." z=".."/>...</vertices>
//!   <triangles><triangle v1=".." v2=".." v3=".."/>...</triangles>
//! </mesh></object>
//! ```
//!
//! All mesh objects are flattened into one facet list. Triangle indices are
//! local to their `<mesh>`. Normals come from the vertex winding.
//!
//! # Limitations
//!
//! - Materials, colors, and textures are ignored
//! - Build items (transformations) are ignored
//! - Triangles with out-of-range indices are skipped

use std::io::{Cursor, Read, Seek};
use std::path::Path;

use mesh_types::{Facet, Point3, Triangle};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use tracing::debug;
use zip::ZipArchive;

use crate::error::{IoError, IoResult};

/// Load facets from a 3MF file.
///
/// # Errors
///
/// Returns an error if:
/// - The file cannot be read
/// - The file is not a valid ZIP archive
/// - The archive holds no model part, or the model XML is invalid
///
/// # Example
///
/// ```no_run
/// use mesh_io::load_3mf;
///
/// let facets = load_3mf("model.3mf").unwrap();
/// println!("Loaded {} facets", facets.len());
/// ```
pub fn load_3mf<P: AsRef<Path>>(path: P) -> IoResult<Vec<Facet>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| IoError::from_open(path, e))?;

    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| IoError::malformed(path, format!("invalid ZIP archive: {e}")))?;

    let model = read_model_file(&mut archive)
        .map_err(|reason| IoError::malformed(path, reason))?;

    parse_3mf_model(&model).map_err(|reason| IoError::malformed(path, reason))
}

/// Read the 3D model part from the archive.
fn read_model_file<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<String, String> {
    let model_paths = ["3D/3dmodel.model", "3d/3dmodel.model", "3D/3DModel.model"];

    for model_path in &model_paths {
        if let Ok(mut file) = archive.by_name(model_path) {
            let mut content = String::new();
            file.read_to_string(&mut content)
                .map_err(|e| format!("failed to read {model_path}: {e}"))?;
            return Ok(content);
        }
    }

    // Any other .model part
    let name = archive
        .file_names()
        .find(|name| {
            Path::new(name)
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("model"))
        })
        .map(str::to_owned);

    let Some(name) = name else {
        return Err("3MF archive does not contain a model file".to_string());
    };

    let mut file = archive
        .by_name(&name)
        .map_err(|e| format!("failed to open {name}: {e}"))?;
    let mut content = String::new();
    file.read_to_string(&mut content)
        .map_err(|e| format!("failed to read {name}: {e}"))?;
    Ok(content)
}

/// Parse the model XML into facets.
fn parse_3mf_model(content: &str) -> Result<Vec<Facet>, String> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut facets = Vec::new();
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut in_vertices = false;
    let mut in_triangles = false;
    let mut skipped = 0_usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e) | Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"mesh" => vertices.clear(),
                b"vertices" => in_vertices = true,
                b"triangles" => in_triangles = true,
                b"vertex" if in_vertices => vertices.push(parse_vertex_element(e)?),
                b"triangle" if in_triangles => {
                    let [a, b, c] = parse_triangle_element(e)?;
                    match (vertices.get(a), vertices.get(b), vertices.get(c)) {
                        (Some(&v0), Some(&v1), Some(&v2)) => {
                            facets.push(Facet::from_triangle(Triangle::new(v0, v1, v2)));
                        }
                        _ => skipped += 1,
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"vertices" => in_vertices = false,
                b"triangles" => in_triangles = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML parse error: {e}")),
            _ => {}
        }
    }

    if skipped > 0 {
        debug!(skipped, "Skipped 3MF triangles with out-of-range indices");
    }

    Ok(facets)
}

/// Parse a `<vertex>` element. Missing coordinates default to zero.
fn parse_vertex_element(element: &BytesStart<'_>) -> Result<Point3<f64>, String> {
    let mut coords = [0.0_f64; 3];

    for attr in element.attributes().flatten() {
        let slot = match attr.key.local_name().as_ref() {
            b"x" => 0,
            b"y" => 1,
            b"z" => 2,
            _ => continue,
        };
        let value = std::str::from_utf8(&attr.value)
            .map_err(|e| format!("invalid UTF-8 in attribute: {e}"))?;
        let coord: f64 = value
            .trim()
            .parse()
            .map_err(|e| format!("invalid vertex coordinate {value:?}: {e}"))?;
        if !coord.is_finite() {
            return Err(format!("non-finite vertex coordinate {value:?}"));
        }
        coords[slot] = coord;
    }

    Ok(Point3::from(coords))
}

/// Parse a `<triangle>` element into local vertex indices.
fn parse_triangle_element(element: &BytesStart<'_>) -> Result<[usize; 3], String> {
    let mut indices = [0_usize; 3];

    for attr in element.attributes().flatten() {
        let slot = match attr.key.local_name().as_ref() {
            b"v1" => 0,
            b"v2" => 1,
            b"v3" => 2,
            _ => continue,
        };
        let value = std::str::from_utf8(&attr.value)
            .map_err(|e| format!("invalid UTF-8 in attribute: {e}"))?;
        indices[slot] = value
            .trim()
            .parse()
            .map_err(|e| format!("invalid triangle index {value:?}: {e}"))?;
    }

    Ok(indices)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    const TWO_OBJECTS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<model unit="millimeter" xmlns="http://schemas.microsoft.com/3dmanufacturing/core/2015/02">
  <resources>
    <object id="1" type="model">
      <mesh>
        <vertices>
          <vertex x="0" y="0" z="0"/>
          <vertex x="1" y="0" z="0"/>
          <vertex x="0" y="1" z="0"/>
        </vertices>
        <triangles>
          <triangle v1="0" v2="1" v3="2"/>
        </triangles>
      </mesh>
    </object>
    <object id="2" type="model">
      <mesh>
        <vertices>
          <vertex x="0" y="0" z="5"/>
          <vertex x="0" y="1" z="5"/>
          <vertex x="1" y="0" z="5"/>
        </vertices>
        <triangles>
          <triangle v1="0" v2="1" v3="2"/>
          <triangle v1="0" v2="1" v3="7"/>
        </triangles>
      </mesh>
    </object>
  </resources>
  <build><item objectid="1"/><item objectid="2"/></build>
</model>"#;

    #[test]
    fn model_objects_are_flattened() {
        let facets = parse_3mf_model(TWO_OBJECTS).unwrap();
        assert_eq!(facets.len(), 2);
        assert!((facets[0].normal.z - 1.0).abs() < 1e-12);
        // second object: indices are local and winding faces down
        assert!((facets[1].triangle.v0.z - 5.0).abs() < 1e-12);
        assert!((facets[1].normal.z + 1.0).abs() < 1e-12);
    }

    #[test]
    fn bad_coordinate_is_an_error() {
        let xml = r#"<model><resources><object><mesh><vertices><vertex x="a" y="0" z="0"/></vertices></mesh></object></resources></model>"#;
        assert!(parse_3mf_model(xml).is_err());
    }

    #[test]
    fn non_finite_coordinate_is_an_error() {
        let xml = r#"<model><resources><object><mesh><vertices><vertex x="0" y="NaN" z="0"/></vertices></mesh></object></resources></model>"#;
        assert!(parse_3mf_model(xml).is_err());
    }

    #[test]
    fn not_a_zip_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.3mf");
        std::fs::write(&path, b"definitely not a zip").unwrap();
        assert!(matches!(
            load_3mf(&path),
            Err(IoError::MalformedGeometry { .. })
        ));
    }
}
