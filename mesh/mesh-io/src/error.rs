//! Error types for mesh loading.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for mesh I/O operations.
pub type IoResult<T> = Result<T, IoError>;

/// Errors that can occur while loading a mesh file.
///
/// Lenient recovery (bad normals, unparsable vertex lines, truncated binary
/// STL) never produces an error; only the conditions below do.
#[derive(Debug, Error)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was not found.
        path: PathBuf,
    },

    /// Extension outside the accepted set (stl, obj, 3mf).
    #[error("unsupported file format: .{extension}")]
    UnsupportedFormat {
        /// The unrecognized extension, `(none)` when the path has none.
        extension: String,
    },

    /// The file yielded no usable triangles.
    #[error("malformed geometry in {path}: {reason}")]
    MalformedGeometry {
        /// File that was being loaded.
        path: PathBuf,
        /// What went wrong.
        reason: String,
    },

    /// I/O error from the standard library.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl IoError {
    /// Create a `MalformedGeometry` error for `path`.
    #[must_use]
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedGeometry {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Map an open/read error, turning `NotFound` into [`IoError::FileNotFound`].
    pub(crate) fn from_open(path: &std::path::Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_mapped() {
        let err = IoError::from_open(
            std::path::Path::new("missing.stl"),
            std::io::Error::from(std::io::ErrorKind::NotFound),
        );
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }

    #[test]
    fn other_errors_pass_through() {
        let err = IoError::from_open(
            std::path::Path::new("locked.stl"),
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );
        assert!(matches!(err, IoError::Io(_)));
    }

    #[test]
    fn display_messages() {
        let err = IoError::UnsupportedFormat {
            extension: "xyz".to_string(),
        };
        assert_eq!(err.to_string(), "unsupported file format: .xyz");

        let err = IoError::malformed("a.stl", "no triangles");
        assert_eq!(err.to_string(), "malformed geometry in a.stl: no triangles");
    }
}
