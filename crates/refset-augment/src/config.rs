//! Augmentor configuration
//!
//! Loaded from TOML or built in code with `with_*` setters. Every field has a
//! default so partial files are accepted.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Policy for deriving dereference-based candidate paths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewritePolicy {
    /// Rebuild a path's source type from the bytes of other references
    #[default]
    RebuildSource,

    /// Only use paths whose source type is already present
    None,
}

/// Configuration for [`crate::ReferenceSetAugmentor`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentorConfig {
    /// Worker threads serving asynchronous augmentation
    pub worker_threads: usize,
    /// Pending asynchronous requests before submitters block
    pub queue_capacity: usize,
    /// Dereference-based candidate policy
    pub rewrite: RewritePolicy,
    /// Log every ranked candidate at debug level
    pub log_candidates: bool,
}

impl AugmentorConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With worker thread count
    #[inline]
    #[must_use]
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads;
        self
    }

    /// With queue capacity
    #[inline]
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    /// With rewrite policy
    #[inline]
    #[must_use]
    pub fn with_rewrite(mut self, rewrite: RewritePolicy) -> Self {
        self.rewrite = rewrite;
        self
    }

    /// With candidate logging
    #[inline]
    #[must_use]
    pub fn with_log_candidates(mut self, enabled: bool) -> Self {
        self.log_candidates = enabled;
        self
    }

    /// Parse and validate TOML
    ///
    /// # Errors
    /// Returns error on malformed TOML or out-of-range values
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// Returns error if the file cannot be read or is invalid
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// Returns error naming the first invalid field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_threads == 0 {
            return Err(ConfigError::Invalid {
                field: "worker_threads",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "queue_capacity",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for AugmentorConfig {
    fn default() -> Self {
        Self {
            worker_threads: 4,
            queue_capacity: 64,
            rewrite: RewritePolicy::RebuildSource,
            log_candidates: true,
        }
    }
}
