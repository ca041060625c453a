//! Path rewriting
//!
//! A [`PathRewriter`] derives extra candidates from a translation path whose
//! source type is not directly present in the reference set, typically by
//! dereferencing some other reference and rebuilding the source type from
//! its bytes.

use std::fmt::Debug;
use std::sync::Arc;

use refset_types::{ReferenceBuilder, ReferenceHandle};

use crate::candidate::Candidate;
use crate::config::RewritePolicy;
use crate::solver::TranslationPath;

/// Derives dereference-based candidates from a translation path
pub trait PathRewriter: Debug + Send + Sync {
    /// Candidates for reaching `path`'s target from `references`
    ///
    /// Called once per path the solver knows about, with the set's current
    /// references and the registry's builders.
    fn rewrite(
        &self,
        path: &Arc<TranslationPath>,
        references: &[ReferenceHandle],
        builders: &[Arc<dyn ReferenceBuilder>],
    ) -> Vec<Candidate>;
}

/// Rebuild the path's source type from any other reference in the set
#[derive(Debug, Clone, Copy, Default)]
pub struct RebuildSource;

impl PathRewriter for RebuildSource {
    fn rewrite(
        &self,
        path: &Arc<TranslationPath>,
        references: &[ReferenceHandle],
        builders: &[Arc<dyn ReferenceBuilder>],
    ) -> Vec<Candidate> {
        let source_type = path.source_type();
        let mut candidates = Vec::new();
        for builder in builders
            .iter()
            .filter(|b| &b.reference_type() == source_type)
        {
            for reference in references
                .iter()
                .filter(|r| &r.reference_type() != source_type)
            {
                candidates.push(Candidate::RebuiltChain {
                    builder: Arc::clone(builder),
                    path: Arc::clone(path),
                    source: Arc::clone(reference),
                });
            }
        }
        candidates
    }
}

/// Never derive extra candidates
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRewrite;

impl PathRewriter for NoRewrite {
    fn rewrite(
        &self,
        _path: &Arc<TranslationPath>,
        _references: &[ReferenceHandle],
        _builders: &[Arc<dyn ReferenceBuilder>],
    ) -> Vec<Candidate> {
        Vec::new()
    }
}

impl RewritePolicy {
    /// Rewriter implementing this policy
    #[must_use]
    pub fn rewriter(self) -> Arc<dyn PathRewriter> {
        match self {
            Self::RebuildSource => Arc::new(RebuildSource),
            Self::None => Arc::new(NoRewrite),
        }
    }
}
