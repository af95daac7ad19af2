//! Error types for printability analysis.

use mesh_io::IoError;
use thiserror::Error;

/// Result type for printability operations.
pub type PrintabilityResult<T> = Result<T, PrintabilityError>;

/// Errors that can occur during printability analysis.
///
/// Geometry oddities (bad normals, degenerate triangles, no overhangs) are
/// never errors; only loading failures and rejected configuration are.
#[derive(Debug, Error)]
pub enum PrintabilityError {
    /// The mesh file could not be loaded.
    #[error(transparent)]
    Load(#[from] IoError),

    /// Invalid configuration parameter.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },
}

impl PrintabilityError {
    /// Create an `InvalidConfig` error.
    #[must_use]
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// The mesh file does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Load(IoError::FileNotFound { .. }))
    }

    /// The path extension is not a supported mesh format.
    #[must_use]
    pub fn is_unsupported_format(&self) -> bool {
        matches!(self, Self::Load(IoError::UnsupportedFormat { .. }))
    }

    /// The file yielded no usable geometry.
    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Load(IoError::MalformedGeometry { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_errors_are_transparent() {
        let err = PrintabilityError::from(IoError::UnsupportedFormat {
            extension: "xyz".to_string(),
        });
        assert!(err.is_unsupported_format());
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "unsupported file format: .xyz");
    }

    #[test]
    fn classification_helpers() {
        let err = PrintabilityError::from(IoError::malformed("a.stl", "empty"));
        assert!(err.is_malformed());

        let err = PrintabilityError::invalid_config("min_area must be >= 0");
        assert!(!err.is_malformed());
        assert_eq!(
            err.to_string(),
            "Invalid configuration: min_area must be >= 0"
        );
    }
}
