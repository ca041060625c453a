//! Error types for reference operations
//!
//! Raised by individual dereference, build and translate steps. The
//! augmentation engine absorbs these per candidate path.

use crate::reference_type::{ReferenceType, TypeNameError};

/// Errors from a single reference operation
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    /// Reference type name invalid
    #[error(transparent)]
    InvalidTypeName(#[from] TypeNameError),

    /// IO failure while dereferencing
    #[error("io error dereferencing {reference}: {source}")]
    Io {
        reference: String,
        #[source]
        source: std::io::Error,
    },

    /// Reference handed to a step was not of the type it consumes or produces
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: ReferenceType,
        actual: ReferenceType,
    },

    /// Underlying data could not be interpreted
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Builder failed to construct a reference
    #[error("build failed: {0}")]
    BuildFailed(String),

    /// Translator failed to convert a reference
    #[error("translation failed: {0}")]
    TranslationFailed(String),

    /// Referenced data is not reachable in this context
    #[error("reference unavailable: {0}")]
    Unavailable(String),
}

impl ReferenceError {
    /// Create IO error for a reference description
    pub fn io_error(reference: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            reference: reference.into(),
            source,
        }
    }

    /// Create type mismatch error
    pub fn type_mismatch(expected: ReferenceType, actual: ReferenceType) -> Self {
        Self::TypeMismatch { expected, actual }
    }
}

/// Result type alias for reference operations
pub type ReferenceResult<T> = Result<T, ReferenceError>;
