//! External references and reference sets
//!
//! An [`ExternalReference`] is one concrete representation of a data value.
//! A [`ReferenceSet`] groups alternative representations of the same value;
//! augmentation appends to it and never removes.

use std::any::Any;
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::io::Read;
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::context::ReferenceContext;
use crate::error::ReferenceResult;
use crate::reference_type::ReferenceType;

/// One concrete representation of an external data value
///
/// # Contract
/// - `reference_type()` is constant for the lifetime of the instance
/// - `resolution_cost()` is finite and non-negative
pub trait ExternalReference: Debug + Send + Sync + 'static {
    /// Type tag of this representation
    fn reference_type(&self) -> ReferenceType;

    /// Open the referenced bytes
    ///
    /// # Errors
    /// Returns error if the data cannot be reached in this context
    fn open_stream<'a>(
        &'a self,
        context: &ReferenceContext,
    ) -> ReferenceResult<Box<dyn Read + Send + 'a>>;

    /// Estimated cost of dereferencing this reference
    fn resolution_cost(&self) -> f32 {
        0.0
    }

    /// Short human readable description used in logs
    fn describe(&self) -> String {
        format!("{self:?}")
    }

    /// Upcast for downcasting to the concrete type
    fn as_any(&self) -> &dyn Any;
}

impl dyn ExternalReference {
    /// Downcast to a concrete reference type
    #[inline]
    #[must_use]
    pub fn downcast_ref<T: ExternalReference>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Read the whole referenced value into memory
    ///
    /// # Errors
    /// Returns error if the stream cannot be opened or read
    pub fn read_all(&self, context: &ReferenceContext) -> ReferenceResult<Vec<u8>> {
        let mut stream = self.open_stream(context)?;
        let mut buf = Vec::new();
        stream
            .read_to_end(&mut buf)
            .map_err(|e| crate::ReferenceError::io_error(self.describe(), e))?;
        Ok(buf)
    }
}

/// Shared handle to a reference
pub type ReferenceHandle = Arc<dyn ExternalReference>;

/// Alternative representations of one data value
///
/// All access goes through [`ReferenceSet::lock`], so an augmentation
/// attempt that holds the guard excludes every other attempt on the same set.
#[derive(Debug)]
pub struct ReferenceSet {
    id: Uuid,
    references: Mutex<Vec<ReferenceHandle>>,
}

impl ReferenceSet {
    /// Create empty reference set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            references: Mutex::new(Vec::new()),
        }
    }

    /// Create reference set holding the given references
    #[must_use]
    pub fn with_references(references: impl IntoIterator<Item = ReferenceHandle>) -> Self {
        Self {
            id: Uuid::new_v4(),
            references: Mutex::new(references.into_iter().collect()),
        }
    }

    /// Set identifier
    #[inline]
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Acquire exclusive access
    #[inline]
    pub fn lock(&self) -> ReferenceSetGuard<'_> {
        ReferenceSetGuard {
            inner: self.references.lock(),
        }
    }

    /// Copy of the current references
    #[must_use]
    pub fn snapshot(&self) -> Vec<ReferenceHandle> {
        self.references.lock().clone()
    }

    /// Number of references
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.references.lock().len()
    }

    /// Check if set is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.references.lock().is_empty()
    }

    /// Check if any reference has the given type
    #[must_use]
    pub fn contains_type(&self, ty: &ReferenceType) -> bool {
        self.lock().contains_type(ty)
    }
}

impl Default for ReferenceSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive view of a [`ReferenceSet`]
#[derive(Debug)]
pub struct ReferenceSetGuard<'a> {
    inner: MutexGuard<'a, Vec<ReferenceHandle>>,
}

impl ReferenceSetGuard<'_> {
    /// References in insertion order
    #[inline]
    #[must_use]
    pub fn references(&self) -> &[ReferenceHandle] {
        &self.inner
    }

    /// Distinct types present
    #[must_use]
    pub fn types(&self) -> BTreeSet<ReferenceType> {
        self.inner.iter().map(|r| r.reference_type()).collect()
    }

    /// Check if any reference has the given type
    #[must_use]
    pub fn contains_type(&self, ty: &ReferenceType) -> bool {
        self.inner.iter().any(|r| &r.reference_type() == ty)
    }

    /// Append references
    pub fn extend(&mut self, references: impl IntoIterator<Item = ReferenceHandle>) {
        self.inner.extend(references);
    }
}
