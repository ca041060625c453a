//! Provider registry
//!
//! Provides [`ProviderRegistry`], the explicit collection of builders and
//! translators an augmentor works from. The registry itself is plain data;
//! the owning [`crate::ReferenceSetAugmentor`] invalidates its path cache
//! whenever the registry is changed through it.

use std::collections::BTreeSet;
use std::sync::Arc;

use refset_types::{ReferenceBuilder, ReferenceTranslator, ReferenceType};

use crate::builtin::{InlineByteArrayBuilder, InlineStringBuilder, InlineStringToInlineByteTranslator};

/// Registered builders and translators
#[derive(Debug, Default, Clone)]
pub struct ProviderRegistry {
    builders: Vec<Arc<dyn ReferenceBuilder>>,
    translators: Vec<Arc<dyn ReferenceTranslator>>,
}

impl ProviderRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            builders: Vec::new(),
            translators: Vec::new(),
        }
    }

    /// Create registry with the inline reference providers
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_builder(Arc::new(InlineStringBuilder));
        registry.register_builder(Arc::new(InlineByteArrayBuilder));
        registry.register_translator(Arc::new(InlineStringToInlineByteTranslator));
        registry
    }

    /// Register a builder
    pub fn register_builder(&mut self, builder: Arc<dyn ReferenceBuilder>) {
        self.builders.push(builder);
    }

    /// Register a translator
    pub fn register_translator(&mut self, translator: Arc<dyn ReferenceTranslator>) {
        self.translators.push(translator);
    }

    /// Remove every builder with the given name
    pub fn remove_builder(&mut self, name: &str) -> bool {
        let before = self.builders.len();
        self.builders.retain(|b| b.name() != name);
        self.builders.len() != before
    }

    /// Remove every translator with the given name
    pub fn remove_translator(&mut self, name: &str) -> bool {
        let before = self.translators.len();
        self.translators.retain(|t| t.name() != name);
        self.translators.len() != before
    }

    /// Remove all providers
    pub fn clear(&mut self) {
        self.builders.clear();
        self.translators.clear();
    }

    /// Registered builders in registration order
    #[inline]
    #[must_use]
    pub fn builders(&self) -> &[Arc<dyn ReferenceBuilder>] {
        &self.builders
    }

    /// Registered translators in registration order
    #[inline]
    #[must_use]
    pub fn translators(&self) -> &[Arc<dyn ReferenceTranslator>] {
        &self.translators
    }

    /// Every type produced by a builder or touched by a translator
    #[must_use]
    pub fn known_types(&self) -> BTreeSet<ReferenceType> {
        let mut types: BTreeSet<ReferenceType> =
            self.builders.iter().map(|b| b.reference_type()).collect();
        for t in &self.translators {
            types.insert(t.source_type());
            types.insert(t.target_type());
        }
        types
    }

    /// Number of registered providers
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.builders.len() + self.translators.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.builders.is_empty() && self.translators.is_empty()
    }
}
