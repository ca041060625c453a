//! refset Reference Types
//!
//! External data references and the provider traits that build and
//! translate them.
//!
//! # Core Concepts
//!
//! - [`ReferenceType`]: Identity tag of a representation (inline string, URL, ...)
//! - [`ExternalReference`]: One concrete representation of a data value
//! - [`ReferenceSet`]: Alternative representations of one value
//! - [`ReferenceBuilder`]: Builds a reference of one type from bytes
//! - [`ReferenceTranslator`]: Converts a reference of one type into another
//! - [`ReferenceContext`]: Caller properties consulted by providers
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use refset_types::{InlineStringReference, ReferenceHandle, ReferenceSet};
//!
//! let set = ReferenceSet::with_references([
//!     Arc::new(InlineStringReference::new("hello")) as ReferenceHandle,
//! ]);
//! assert!(set.contains_type(&InlineStringReference::type_tag()));
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

// Core modules
mod context;
mod error;
mod inline;
mod provider;
mod reference;
mod reference_type;

// Re-exports
pub use context::ReferenceContext;
pub use error::{ReferenceError, ReferenceResult};
pub use inline::{InlineByteArrayReference, InlineStringReference};
pub use provider::{ReferenceBuilder, ReferenceTranslator};
pub use reference::{ExternalReference, ReferenceHandle, ReferenceSet, ReferenceSetGuard};
pub use reference_type::{ReferenceType, TypeNameError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
