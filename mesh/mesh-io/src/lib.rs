//! Mesh file loading for the printability pipeline.
//!
//! This crate turns a mesh file into a triangle soup (`Vec<Facet>`):
//!
//! - **STL** (Stereolithography) - Binary and ASCII
//! - **OBJ** (Wavefront) - ASCII, n-gons fan-triangulated
//! - **3MF** (3D Manufacturing Format) - ZIP-based XML format
//!
//! # Layer 0 Crate
//!
//! This is a Layer 0 crate with **zero Bevy dependencies**. It can be used in:
//! - CLI tools
//! - Web applications (WASM)
//! - Servers
//!
//! # Example
//!
//! ```no_run
//! use mesh_io::load_facets;
//!
//! // Format detected from the .stl extension
//! let facets = load_facets("model.stl").unwrap();
//! println!("{} facets", facets.len());
//! ```
//!
//! # Failure Modes
//!
//! The extension is checked before the file is touched, so an unsupported
//! path fails with [`IoError::UnsupportedFormat`] even when it does not
//! exist. A file that yields no triangles is [`IoError::MalformedGeometry`]
//! unless [`LoadOptions::permissive`] substitutes the [`fallback_facets`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

mod error;
mod fallback;
mod obj;
mod stl;
mod threemf;

pub use error::{IoError, IoResult};
pub use fallback::{FALLBACK_CUBE_SIZE, fallback_facets};
pub use obj::{load_obj, parse_obj};
pub use stl::{load_stl, parse_stl};
pub use threemf::load_3mf;

use std::path::Path;

use mesh_types::Facet;
use tracing::{debug, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MeshFormat {
    /// STL (Stereolithography) format.
    /// Supports binary and ASCII variants.
    Stl,
    /// OBJ (Wavefront) format.
    /// ASCII only, supports vertices and faces.
    Obj,
    /// 3MF (3D Manufacturing Format).
    /// ZIP-based XML format for 3D printing.
    ThreeMf,
}

impl MeshFormat {
    /// Detect format from file extension (case-insensitive).
    ///
    /// Returns `None` if the extension is not recognized.
    #[must_use]
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "stl" => Some(Self::Stl),
            "obj" => Some(Self::Obj),
            "3mf" => Some(Self::ThreeMf),
            _ => None,
        }
    }

    /// Get the canonical file extension for this format.
    #[must_use]
    pub const fn extension(&self) -> &'static str {
        match self {
            Self::Stl => "stl",
            Self::Obj => "obj",
            Self::ThreeMf => "3mf",
        }
    }

    /// Detect the format or fail with [`IoError::UnsupportedFormat`].
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is missing or not recognized.
    pub fn require<P: AsRef<Path>>(path: P) -> IoResult<Self> {
        let path = path.as_ref();
        Self::from_path(path).ok_or_else(|| IoError::UnsupportedFormat {
            extension: path
                .extension()
                .map_or_else(|| "(none)".to_string(), |e| e.to_string_lossy().into_owned()),
        })
    }
}

/// Options controlling how a mesh file is loaded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LoadOptions {
    /// Substitute [`fallback_facets`] for files that yield no triangles
    /// instead of failing with [`IoError::MalformedGeometry`].
    pub permissive: bool,
}

impl LoadOptions {
    /// Strict loading (the default).
    #[must_use]
    pub const fn strict() -> Self {
        Self { permissive: false }
    }

    /// Permissive loading: empty files become the fallback mesh.
    #[must_use]
    pub const fn permissive() -> Self {
        Self { permissive: true }
    }
}

/// Load facets from a file, detecting format from extension.
///
/// Uses strict [`LoadOptions`].
///
/// # Errors
///
/// Returns an error if:
/// - The extension is not `stl`, `obj` or `3mf`
/// - The file does not exist or cannot be read
/// - The file yields no triangles
pub fn load_facets<P: AsRef<Path>>(path: P) -> IoResult<Vec<Facet>> {
    load_facets_with(path, &LoadOptions::default())
}

/// Load facets from a file with explicit options.
///
/// # Errors
///
/// See [`load_facets`]. With `permissive` set, an empty file is not an error.
///
/// # Example
///
/// ```no_run
/// use mesh_io::{load_facets_with, LoadOptions};
///
/// let facets = load_facets_with("scan.stl", &LoadOptions::permissive()).unwrap();
/// assert!(!facets.is_empty());
/// ```
pub fn load_facets_with<P: AsRef<Path>>(path: P, options: &LoadOptions) -> IoResult<Vec<Facet>> {
    let path = path.as_ref();
    let format = MeshFormat::require(path)?;

    let facets = match format {
        MeshFormat::Stl => load_stl(path)?,
        MeshFormat::Obj => load_obj(path)?,
        MeshFormat::ThreeMf => load_3mf(path)?,
    };

    if !facets.is_empty() {
        debug!(path = %path.display(), ?format, facets = facets.len(), "Loaded mesh");
        return Ok(facets);
    }

    if options.permissive {
        warn!(path = %path.display(), "No triangles parsed, substituting fallback mesh");
        Ok(fallback_facets())
    } else {
        Err(IoError::malformed(path, "no triangles could be parsed"))
    }
}
