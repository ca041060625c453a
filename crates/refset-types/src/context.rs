//! Reference context
//!
//! Caller-supplied properties that builders and translators consult when
//! deciding whether they are enabled and how to operate.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Key/value properties for one augmentation call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceContext {
    properties: BTreeMap<String, String>,
}

impl ReferenceContext {
    /// Create empty context
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With property
    #[inline]
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Get property value
    #[inline]
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Boolean view of a property (`true`, `yes`, `1`, case-insensitive)
    #[must_use]
    pub fn flag(&self, key: &str) -> bool {
        self.property(key).is_some_and(|v| {
            matches!(v.to_ascii_lowercase().as_str(), "true" | "yes" | "1")
        })
    }

    /// Iterate over properties in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of properties
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Check if context has no properties
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
