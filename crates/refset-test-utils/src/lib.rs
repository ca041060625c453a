//! Testing utilities for refset workspace
//!
//! Scripted references, builders and translators with call counters and
//! failure/enablement switches.

#![allow(missing_docs)]

use std::any::Any;
use std::collections::BTreeSet;
use std::io::{self, Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use refset_types::{
    ExternalReference, ReferenceBuilder, ReferenceContext, ReferenceError, ReferenceHandle,
    ReferenceResult, ReferenceSet, ReferenceTranslator, ReferenceType,
};

/// Reference of any type holding bytes in memory
#[derive(Debug, Clone)]
pub struct MockReference {
    ty: ReferenceType,
    data: Vec<u8>,
    readable: bool,
    resolution_cost: f32,
}

impl MockReference {
    pub fn new(ty: &str, data: &[u8]) -> Self {
        Self {
            ty: ReferenceType::new(ty),
            data: data.to_vec(),
            readable: true,
            resolution_cost: 0.0,
        }
    }

    /// Opening the stream fails
    #[must_use]
    pub fn unreadable(mut self) -> Self {
        self.readable = false;
        self
    }

    #[must_use]
    pub fn with_resolution_cost(mut self, cost: f32) -> Self {
        self.resolution_cost = cost;
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl ExternalReference for MockReference {
    fn reference_type(&self) -> ReferenceType {
        self.ty.clone()
    }

    fn open_stream<'a>(
        &'a self,
        _context: &ReferenceContext,
    ) -> ReferenceResult<Box<dyn Read + Send + 'a>> {
        if !self.readable {
            return Err(ReferenceError::io_error(
                self.describe(),
                io::Error::new(io::ErrorKind::NotFound, "mock reference is unreadable"),
            ));
        }
        Ok(Box::new(Cursor::new(self.data.as_slice())))
    }

    fn resolution_cost(&self) -> f32 {
        self.resolution_cost
    }

    fn describe(&self) -> String {
        format!("mock:{}({} bytes)", self.ty, self.data.len())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Builder producing [`MockReference`]s of one type
#[derive(Debug)]
pub struct MockBuilder {
    name: String,
    ty: ReferenceType,
    cost: f32,
    fail: bool,
    panic: bool,
    enabled_flag: Option<String>,
    calls: AtomicUsize,
}

impl MockBuilder {
    pub fn new(name: &str, ty: &str) -> Self {
        Self {
            name: name.to_string(),
            ty: ReferenceType::new(ty),
            cost: 0.0,
            fail: false,
            panic: false,
            enabled_flag: None,
            calls: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_cost(mut self, cost: f32) -> Self {
        self.cost = cost;
        self
    }

    /// Every build fails
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Every call panics
    #[must_use]
    pub fn panicking(mut self) -> Self {
        self.panic = true;
        self
    }

    /// Only enabled when the context flag `key` is set
    #[must_use]
    pub fn enabled_when(mut self, key: &str) -> Self {
        self.enabled_flag = Some(key.to_string());
        self
    }

    /// Number of `create_reference` calls
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReferenceBuilder for MockBuilder {
    fn name(&self) -> &str {
        &self.name
    }

    fn reference_type(&self) -> ReferenceType {
        self.ty.clone()
    }

    fn create_reference(
        &self,
        stream: &mut dyn Read,
        _context: &ReferenceContext,
    ) -> ReferenceResult<Box<dyn ExternalReference>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(!self.panic, "{} is scripted to panic", self.name);
        if self.fail {
            return Err(ReferenceError::BuildFailed(format!("{} is scripted to fail", self.name)));
        }
        let mut data = Vec::new();
        stream
            .read_to_end(&mut data)
            .map_err(|e| ReferenceError::io_error(self.name.as_str(), e))?;
        Ok(Box::new(MockReference {
            ty: self.ty.clone(),
            data,
            readable: true,
            resolution_cost: 0.0,
        }))
    }

    fn is_enabled(&self, context: &ReferenceContext) -> bool {
        self.enabled_flag.as_deref().map_or(true, |key| context.flag(key))
    }

    fn construction_cost(&self) -> f32 {
        self.cost
    }
}

/// Translator copying bytes from one type to another
#[derive(Debug)]
pub struct MockTranslator {
    name: String,
    from: ReferenceType,
    to: ReferenceType,
    cost: f32,
    fail: bool,
    panic: bool,
    produces: Option<ReferenceType>,
    enabled_flag: Option<String>,
    calls: AtomicUsize,
}

impl MockTranslator {
    pub fn new(name: &str, from: &str, to: &str, cost: f32) -> Self {
        Self {
            name: name.to_string(),
            from: ReferenceType::new(from),
            to: ReferenceType::new(to),
            cost,
            fail: false,
            panic: false,
            produces: None,
            enabled_flag: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every translation fails
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    /// Output has type `ty` instead of the declared target
    #[must_use]
    pub fn producing(mut self, ty: &str) -> Self {
        self.produces = Some(ReferenceType::new(ty));
        self
    }

    /// Every call panics
    #[must_use]
    pub fn panicking(mut self) -> Self {
        self.panic = true;
        self
    }

    /// Only enabled when the context flag `key` is set
    #[must_use]
    pub fn enabled_when(mut self, key: &str) -> Self {
        self.enabled_flag = Some(key.to_string());
        self
    }

    /// Number of `translate` calls
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ReferenceTranslator for MockTranslator {
    fn name(&self) -> &str {
        &self.name
    }

    fn source_type(&self) -> ReferenceType {
        self.from.clone()
    }

    fn target_type(&self) -> ReferenceType {
        self.to.clone()
    }

    fn translation_cost(&self) -> f32 {
        self.cost
    }

    fn is_enabled(&self, context: &ReferenceContext) -> bool {
        self.enabled_flag.as_deref().map_or(true, |key| context.flag(key))
    }

    fn translate(
        &self,
        reference: &dyn ExternalReference,
        context: &ReferenceContext,
    ) -> ReferenceResult<Box<dyn ExternalReference>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(!self.panic, "{} is scripted to panic", self.name);
        if self.fail {
            return Err(ReferenceError::TranslationFailed(format!(
                "{} is scripted to fail",
                self.name
            )));
        }
        let actual = reference.reference_type();
        if actual != self.from {
            return Err(ReferenceError::type_mismatch(self.from.clone(), actual));
        }
        Ok(Box::new(MockReference {
            ty: self.produces.clone().unwrap_or_else(|| self.to.clone()),
            data: reference.read_all(context)?,
            readable: true,
            resolution_cost: 0.0,
        }))
    }
}

/// Reference set holding one [`MockReference`] per `(type, bytes)` pair
pub fn mock_set(references: &[(&str, &[u8])]) -> ReferenceSet {
    ReferenceSet::with_references(
        references
            .iter()
            .map(|(ty, data)| Arc::new(MockReference::new(ty, data)) as ReferenceHandle),
    )
}

/// Target set from type names
pub fn types(names: &[&str]) -> BTreeSet<ReferenceType> {
    names.iter().map(|n| ReferenceType::new(*n)).collect()
}

/// Type names of the given references, in order
pub fn type_names(references: &[ReferenceHandle]) -> Vec<String> {
    references
        .iter()
        .map(|r| r.reference_type().to_string())
        .collect()
}
