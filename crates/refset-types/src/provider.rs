//! Provider traits
//!
//! Builders construct references of one type from raw bytes; translators
//! convert a reference of one type into another. Both are registered against
//! [`ReferenceType`] tags and consulted by the augmentation engine.

use std::fmt::Debug;
use std::io::Read;

use crate::context::ReferenceContext;
use crate::error::ReferenceResult;
use crate::reference::ExternalReference;
use crate::reference_type::ReferenceType;

/// Constructs references of one type directly from a byte stream
pub trait ReferenceBuilder: Debug + Send + Sync {
    /// Stable name used for logging and deterministic ordering
    fn name(&self) -> &str;

    /// Type of reference this builder produces
    fn reference_type(&self) -> ReferenceType;

    /// Build a new reference holding the stream's bytes
    ///
    /// # Errors
    /// Returns error if the bytes cannot be read or stored
    fn create_reference(
        &self,
        stream: &mut dyn Read,
        context: &ReferenceContext,
    ) -> ReferenceResult<Box<dyn ExternalReference>>;

    /// Whether this builder may be used in the given context
    fn is_enabled(&self, _context: &ReferenceContext) -> bool {
        true
    }

    /// Estimated cost of one construction, finite and non-negative
    fn construction_cost(&self) -> f32 {
        0.0
    }
}

/// Converts references of a source type into a target type
///
/// # Contract
/// - `translation_cost()` is finite and non-negative
/// - `translate()` returns a reference of `target_type()`
pub trait ReferenceTranslator: Debug + Send + Sync {
    /// Stable name used for logging and tie-breaks between parallel translators
    fn name(&self) -> &str;

    /// Type this translator consumes
    fn source_type(&self) -> ReferenceType;

    /// Type this translator produces
    fn target_type(&self) -> ReferenceType;

    /// Estimated cost of one translation
    fn translation_cost(&self) -> f32;

    /// Whether this translator may be used in the given context
    fn is_enabled(&self, _context: &ReferenceContext) -> bool {
        true
    }

    /// Translate `reference` into a new reference of the target type
    ///
    /// # Errors
    /// Returns error if the source is of the wrong type or conversion fails
    fn translate(
        &self,
        reference: &dyn ExternalReference,
        context: &ReferenceContext,
    ) -> ReferenceResult<Box<dyn ExternalReference>>;
}
