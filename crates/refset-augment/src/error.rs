//! Error types for reference set augmentation
//!
//! Provides error handling for:
//! - Augmentation exhaustion (no candidate paths, or all of them failed)
//! - Shortest-path solver construction
//! - Asynchronous dispatch
//! - Configuration loading

use std::collections::BTreeSet;
use std::path::PathBuf;

use refset_types::{ReferenceError, ReferenceType};

/// Augmentation could not add a reference of any requested type
#[derive(Debug, thiserror::Error)]
pub enum AugmentationError {
    /// No translation or build path exists from the set to any target
    #[error("no candidate translation paths were found for {}", format_types(.targets))]
    NoCandidatePaths {
        /// Requested target types
        targets: BTreeSet<ReferenceType>,
    },

    /// Every candidate path was attempted and failed
    #[error("all {attempts} candidate paths failed, can't perform augmentation")]
    AllPathsFailed {
        /// Candidates tried
        attempts: usize,
        /// Failure of the last candidate tried
        #[source]
        last_error: StepError,
    },

    /// Augmentation panicked outside any candidate step
    #[error("augmentation panicked: {message}")]
    Panicked {
        /// Panic payload text
        message: String,
    },
}

impl AugmentationError {
    /// Check if failure was due to missing paths rather than failing ones
    #[inline]
    #[must_use]
    pub fn is_no_candidates(&self) -> bool {
        matches!(self, Self::NoCandidatePaths { .. })
    }
}

/// Failure of one candidate path
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// Source reference could not be dereferenced
    #[error("dereferencing {reference} failed: {source}")]
    Dereference {
        /// Description of the source reference
        reference: String,
        /// Underlying failure
        #[source]
        source: ReferenceError,
    },

    /// Builder failed
    #[error("builder '{builder}' failed: {source}")]
    Build {
        /// Builder name
        builder: String,
        /// Underlying failure
        #[source]
        source: ReferenceError,
    },

    /// Translator failed
    #[error("translator '{translator}' failed: {source}")]
    Translate {
        /// Translator name
        translator: String,
        /// Underlying failure
        #[source]
        source: ReferenceError,
    },

    /// Step produced a reference of an unexpected type
    #[error("'{provider}' produced {actual}, expected {expected}")]
    UnexpectedType {
        /// Builder or translator name
        provider: String,
        /// Declared output type
        expected: ReferenceType,
        /// Type actually produced
        actual: ReferenceType,
    },

    /// A builder or translator panicked
    #[error("candidate '{candidate}' panicked: {message}")]
    Panicked {
        /// Description of the candidate being run
        candidate: String,
        /// Panic payload text
        message: String,
    },
}

/// Shortest-path solver could not be constructed for a target
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolverError {
    /// Translator declared a negative or non-finite cost
    #[error("translator '{translator}' declares invalid cost {cost}")]
    InvalidCost {
        /// Translator name
        translator: String,
        /// Declared cost
        cost: f32,
    },
}

/// Asynchronous task could not be dispatched
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// Worker pool has shut down
    #[error("dispatcher is shut down")]
    Shutdown,

    /// Worker thread could not be spawned
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),
}

/// Configuration could not be loaded
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("io error reading {path}: {source}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// TOML parse error
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Value out of range
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Field name
        field: &'static str,
        /// Why the value was rejected
        reason: String,
    },
}

/// Text of a panic payload
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn format_types(types: &BTreeSet<ReferenceType>) -> String {
    let names: Vec<&str> = types.iter().map(ReferenceType::name).collect();
    format!("[{}]", names.join(", "))
}
