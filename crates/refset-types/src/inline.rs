//! Inline reference types
//!
//! References that carry their value directly, as text or as raw bytes.

use std::any::Any;
use std::io::{Cursor, Read};

use crate::context::ReferenceContext;
use crate::error::ReferenceResult;
use crate::reference::ExternalReference;
use crate::reference_type::ReferenceType;

/// Text value held inline (UTF-8)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineStringReference {
    value: String,
}

impl InlineStringReference {
    /// Type name
    pub const TYPE_NAME: &'static str = "inline-string";

    /// Create reference for a text value
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }

    /// Type tag for this representation
    #[inline]
    #[must_use]
    pub fn type_tag() -> ReferenceType {
        ReferenceType::new(Self::TYPE_NAME)
    }

    /// Held value
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl ExternalReference for InlineStringReference {
    fn reference_type(&self) -> ReferenceType {
        Self::type_tag()
    }

    fn open_stream<'a>(
        &'a self,
        _context: &ReferenceContext,
    ) -> ReferenceResult<Box<dyn Read + Send + 'a>> {
        Ok(Box::new(Cursor::new(self.value.as_bytes())))
    }

    fn describe(&self) -> String {
        format!("{}({} chars)", Self::TYPE_NAME, self.value.chars().count())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Byte value held inline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineByteArrayReference {
    value: Vec<u8>,
}

impl InlineByteArrayReference {
    /// Type name
    pub const TYPE_NAME: &'static str = "inline-bytes";

    /// Create reference for a byte value
    #[inline]
    #[must_use]
    pub fn new(value: Vec<u8>) -> Self {
        Self { value }
    }

    /// Type tag for this representation
    #[inline]
    #[must_use]
    pub fn type_tag() -> ReferenceType {
        ReferenceType::new(Self::TYPE_NAME)
    }

    /// Held bytes
    #[inline]
    #[must_use]
    pub fn value(&self) -> &[u8] {
        &self.value
    }
}

impl ExternalReference for InlineByteArrayReference {
    fn reference_type(&self) -> ReferenceType {
        Self::type_tag()
    }

    fn open_stream<'a>(
        &'a self,
        _context: &ReferenceContext,
    ) -> ReferenceResult<Box<dyn Read + Send + 'a>> {
        Ok(Box::new(Cursor::new(self.value.as_slice())))
    }

    fn describe(&self) -> String {
        format!("{}({} bytes)", Self::TYPE_NAME, self.value.len())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_string_streams_utf8() {
        let reference = InlineStringReference::new("héllo");
        let mut buf = Vec::new();
        reference
            .open_stream(&ReferenceContext::new())
            .unwrap()
            .read_to_end(&mut buf)
            .unwrap();
        assert_eq!(buf, "héllo".as_bytes());
    }

    #[test]
    fn inline_bytes_streams_raw() {
        let reference = InlineByteArrayReference::new(vec![0, 159, 146, 150]);
        let mut buf = Vec::new();
        reference
            .open_stream(&ReferenceContext::new())
            .unwrap()
            .read_to_end(&mut buf)
            .unwrap();
        assert_eq!(buf, vec![0, 159, 146, 150]);
    }

    #[test]
    fn type_tags() {
        assert_eq!(
            InlineStringReference::new("x").reference_type().name(),
            "inline-string"
        );
        assert_eq!(
            InlineByteArrayReference::new(Vec::new()).reference_type().name(),
            "inline-bytes"
        );
    }

    #[test]
    fn describe_is_short() {
        assert_eq!(InlineStringReference::new("abc").describe(), "inline-string(3 chars)");
        assert_eq!(
            InlineByteArrayReference::new(vec![1, 2]).describe(),
            "inline-bytes(2 bytes)"
        );
    }
}
