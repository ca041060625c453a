//! Built-in providers for the inline reference types

use std::io::Read;

use refset_types::{
    ExternalReference, InlineByteArrayReference, InlineStringReference, ReferenceBuilder,
    ReferenceContext, ReferenceError, ReferenceResult, ReferenceTranslator, ReferenceType,
};

/// Builds [`InlineStringReference`] from UTF-8 bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineStringBuilder;

impl ReferenceBuilder for InlineStringBuilder {
    fn name(&self) -> &str {
        "inline-string-builder"
    }

    fn reference_type(&self) -> ReferenceType {
        InlineStringReference::type_tag()
    }

    fn create_reference(
        &self,
        stream: &mut dyn Read,
        _context: &ReferenceContext,
    ) -> ReferenceResult<Box<dyn ExternalReference>> {
        let mut bytes = Vec::new();
        stream
            .read_to_end(&mut bytes)
            .map_err(|e| ReferenceError::io_error(self.name(), e))?;
        let value = String::from_utf8(bytes)
            .map_err(|e| ReferenceError::InvalidData(format!("not UTF-8: {e}")))?;
        Ok(Box::new(InlineStringReference::new(value)))
    }
}

/// Builds [`InlineByteArrayReference`] from any bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineByteArrayBuilder;

impl ReferenceBuilder for InlineByteArrayBuilder {
    fn name(&self) -> &str {
        "inline-bytes-builder"
    }

    fn reference_type(&self) -> ReferenceType {
        InlineByteArrayReference::type_tag()
    }

    fn create_reference(
        &self,
        stream: &mut dyn Read,
        _context: &ReferenceContext,
    ) -> ReferenceResult<Box<dyn ExternalReference>> {
        let mut bytes = Vec::new();
        stream
            .read_to_end(&mut bytes)
            .map_err(|e| ReferenceError::io_error(self.name(), e))?;
        Ok(Box::new(InlineByteArrayReference::new(bytes)))
    }
}

/// UTF-8 encodes an inline string into inline bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineStringToInlineByteTranslator;

impl InlineStringToInlineByteTranslator {
    /// Declared cost of one translation
    pub const COST: f32 = 0.001;
}

impl ReferenceTranslator for InlineStringToInlineByteTranslator {
    fn name(&self) -> &str {
        "inline-string-to-inline-bytes"
    }

    fn source_type(&self) -> ReferenceType {
        InlineStringReference::type_tag()
    }

    fn target_type(&self) -> ReferenceType {
        InlineByteArrayReference::type_tag()
    }

    fn translation_cost(&self) -> f32 {
        Self::COST
    }

    fn translate(
        &self,
        reference: &dyn ExternalReference,
        _context: &ReferenceContext,
    ) -> ReferenceResult<Box<dyn ExternalReference>> {
        let source = reference
            .downcast_ref::<InlineStringReference>()
            .ok_or_else(|| {
                ReferenceError::type_mismatch(self.source_type(), reference.reference_type())
            })?;
        Ok(Box::new(InlineByteArrayReference::new(
            source.value().as_bytes().to_vec(),
        )))
    }
}
