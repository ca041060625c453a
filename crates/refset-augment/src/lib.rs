//! refset Augmentation Engine
//!
//! Adds a reference of a requested type to a [`refset_types::ReferenceSet`]
//! by the cheapest available route: a translator chain from a reference
//! already in the set, a builder fed with the bytes of an existing reference,
//! or a chain whose source type is first rebuilt that way.
//!
//! # Core Concepts
//!
//! - [`ProviderRegistry`]: Explicit collection of builders and translators
//! - [`TypeGraph`]: Reference types connected by translator edges
//! - [`ShortestPathSolver`]: Cheapest [`TranslationPath`] to one target type
//! - [`Candidate`]: One executable way of producing a target reference
//! - [`PathRewriter`]: Hook deriving dereference-based candidates
//! - [`ReferenceSetAugmentor`]: Cached solvers, ranking and execution
//!
//! # Example
//!
//! ```rust
//! use std::collections::BTreeSet;
//! use refset_augment::{AugmentorConfig, ProviderRegistry, ReferenceSetAugmentor};
//! use refset_types::InlineByteArrayReference;
//!
//! let augmentor = ReferenceSetAugmentor::new(ProviderRegistry::with_defaults(), AugmentorConfig::default());
//! let paths = augmentor.translation_paths(&InlineByteArrayReference::type_tag()).unwrap();
//! assert_eq!(paths.len(), 1);
//! assert_eq!(paths[0].step_names(), vec!["inline-string-to-inline-bytes"]);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
mod augmentor;
mod builtin;
mod candidate;
mod config;
mod dispatch;
mod error;
mod graph;
mod ranker;
mod registry;
mod rewrite;
mod solver;

// Re-exports
pub use augmentor::{AugmentationCallback, ReferenceSetAugmentor};
pub use builtin::{InlineByteArrayBuilder, InlineStringBuilder, InlineStringToInlineByteTranslator};
pub use candidate::Candidate;
pub use config::{AugmentorConfig, RewritePolicy};
pub use error::{AugmentationError, ConfigError, DispatchError, SolverError, StepError};
pub use graph::{InboundEdge, TranslatorEdge, TypeGraph};
pub use registry::ProviderRegistry;
pub use rewrite::{NoRewrite, PathRewriter, RebuildSource};
pub use solver::{ShortestPathSolver, TranslationPath};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
