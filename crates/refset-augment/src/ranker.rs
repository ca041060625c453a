//! Candidate ranking and execution
//!
//! Collects every enabled way of reaching one of the target types from the
//! references already in a set, orders them cheapest first and runs them
//! until one succeeds.

use std::collections::BTreeSet;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use refset_types::{ReferenceBuilder, ReferenceContext, ReferenceHandle, ReferenceType};

use crate::candidate::Candidate;
use crate::error::{panic_message, AugmentationError, StepError};
use crate::rewrite::PathRewriter;
use crate::solver::ShortestPathSolver;

/// Inputs for candidate collection
#[derive(Debug)]
pub(crate) struct CandidateSources<'a> {
    pub(crate) references: &'a [ReferenceHandle],
    pub(crate) targets: &'a BTreeSet<ReferenceType>,
    pub(crate) solvers: &'a [Arc<ShortestPathSolver>],
    pub(crate) builders: &'a [Arc<dyn ReferenceBuilder>],
    pub(crate) rewriter: &'a dyn PathRewriter,
}

impl CandidateSources<'_> {
    /// Enabled candidates, cheapest first
    pub(crate) fn ranked(&self, context: &ReferenceContext) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        for solver in self.solvers {
            for path in solver.paths() {
                for reference in self
                    .references
                    .iter()
                    .filter(|r| &r.reference_type() == path.source_type())
                {
                    candidates.push(Candidate::Chain {
                        path: Arc::clone(path),
                        source: Arc::clone(reference),
                    });
                }
                candidates.extend(self.rewriter.rewrite(path, self.references, self.builders));
            }
        }

        for builder in self
            .builders
            .iter()
            .filter(|b| self.targets.contains(&b.reference_type()))
        {
            for reference in self.references {
                candidates.push(Candidate::DirectBuild {
                    builder: Arc::clone(builder),
                    source: Arc::clone(reference),
                });
            }
        }

        candidates.retain(|c| c.is_enabled(context));
        candidates.sort_by(Candidate::rank_cmp);
        candidates
    }
}

/// Run candidates in order until one succeeds
///
/// # Errors
/// Returns [`AugmentationError::NoCandidatePaths`] for an empty list and
/// [`AugmentationError::AllPathsFailed`] when every candidate failed
pub(crate) fn execute_ranked(
    candidates: &[Candidate],
    targets: &BTreeSet<ReferenceType>,
    context: &ReferenceContext,
    log_candidates: bool,
) -> Result<Vec<ReferenceHandle>, AugmentationError> {
    if candidates.is_empty() {
        tracing::warn!("No candidate paths found for augmentation");
        return Err(AugmentationError::NoCandidatePaths {
            targets: targets.clone(),
        });
    }

    tracing::debug!(
        "Found {} contextual translation path(s) including builder based",
        candidates.len()
    );
    if log_candidates {
        for (i, candidate) in candidates.iter().enumerate() {
            tracing::debug!("  {}) {}", i + 1, candidate);
        }
    }

    let mut last_error: Option<StepError> = None;
    for (i, candidate) in candidates.iter().enumerate() {
        match run_guarded(candidate, context) {
            Ok(produced) => {
                tracing::debug!(
                    "  Success ({}), created {}",
                    i + 1,
                    describe_all(&produced)
                );
                return Ok(produced);
            }
            Err(e) => {
                tracing::debug!("  Failed ({}): {}", i + 1, e);
                last_error = Some(e);
            }
        }
    }

    tracing::warn!("  No paths succeeded, augmentation failed");
    match last_error {
        Some(last_error) => Err(AugmentationError::AllPathsFailed {
            attempts: candidates.len(),
            last_error,
        }),
        None => Err(AugmentationError::NoCandidatePaths {
            targets: targets.clone(),
        }),
    }
}

/// Run one candidate, turning a provider panic into a step failure
fn run_guarded(
    candidate: &Candidate,
    context: &ReferenceContext,
) -> Result<Vec<ReferenceHandle>, StepError> {
    catch_unwind(AssertUnwindSafe(|| candidate.execute(context))).unwrap_or_else(|payload| {
        Err(StepError::Panicked {
            candidate: candidate.to_string(),
            message: panic_message(payload.as_ref()),
        })
    })
}

fn describe_all(references: &[ReferenceHandle]) -> String {
    let parts: Vec<String> = references.iter().map(|r| r.describe()).collect();
    format!("[{}]", parts.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TypeGraph;
    use crate::registry::ProviderRegistry;
    use crate::rewrite::{NoRewrite, RebuildSource};
    use refset_test_utils::{MockBuilder, MockReference, MockTranslator};

    struct Fixture {
        registry: ProviderRegistry,
        references: Vec<ReferenceHandle>,
        targets: BTreeSet<ReferenceType>,
    }

    impl Fixture {
        fn ranked(&self, rewriter: &dyn PathRewriter) -> Vec<Candidate> {
            let graph = TypeGraph::build(&self.registry);
            let solvers: Vec<Arc<ShortestPathSolver>> = self
                .targets
                .iter()
                .map(|t| Arc::new(ShortestPathSolver::new(t.clone(), &graph).unwrap()))
                .collect();
            CandidateSources {
                references: &self.references,
                targets: &self.targets,
                solvers: &solvers,
                builders: self.registry.builders(),
                rewriter,
            }
            .ranked(&ReferenceContext::new())
        }
    }

    fn fixture() -> Fixture {
        let mut registry = ProviderRegistry::new();
        registry.register_translator(Arc::new(MockTranslator::new("a2b", "a", "b", 2.0)));
        registry.register_builder(Arc::new(MockBuilder::new("b-builder", "b").with_cost(1.0)));
        registry.register_builder(Arc::new(MockBuilder::new("a-builder", "a")));
        Fixture {
            registry,
            references: vec![Arc::new(MockReference::new("a", b"v")) as ReferenceHandle],
            targets: BTreeSet::from(["b".into()]),
        }
    }

    #[test]
    fn candidates_sorted_by_cost() {
        let ranked = fixture().ranked(&NoRewrite);
        assert_eq!(ranked.len(), 2);
        assert!(matches!(ranked[0], Candidate::DirectBuild { .. }));
        assert!(matches!(ranked[1], Candidate::Chain { .. }));
    }

    #[test]
    fn rebuild_candidates_only_from_other_types() {
        let mut fx = fixture();
        fx.references.push(Arc::new(MockReference::new("c", b"w")));
        let ranked = fx.ranked(&RebuildSource);
        let rebuilt = ranked
            .iter()
            .filter(|c| matches!(c, Candidate::RebuiltChain { .. }))
            .count();
        assert_eq!(rebuilt, 1);
        assert_eq!(ranked.len(), 4);
    }

    #[test]
    fn disabled_candidates_are_dropped() {
        let mut fx = fixture();
        fx.registry.clear();
        fx.registry.register_translator(Arc::new(
            MockTranslator::new("a2b", "a", "b", 2.0).enabled_when("online"),
        ));
        assert!(fx.ranked(&NoRewrite).is_empty());
    }

    #[test]
    fn empty_candidates_is_no_paths() {
        let targets = BTreeSet::from(["b".into()]);
        let err = execute_ranked(&[], &targets, &ReferenceContext::new(), true).unwrap_err();
        assert!(err.is_no_candidates());
    }

    #[test]
    fn falls_through_to_next_candidate() {
        let failing = Arc::new(MockBuilder::new("bad", "b").failing());
        let working = Arc::new(MockBuilder::new("good", "b"));
        let source: ReferenceHandle = Arc::new(MockReference::new("a", b"v"));
        let candidates = vec![
            Candidate::DirectBuild {
                builder: failing.clone(),
                source: Arc::clone(&source),
            },
            Candidate::DirectBuild {
                builder: working.clone(),
                source,
            },
        ];
        let targets = BTreeSet::from(["b".into()]);
        let produced = execute_ranked(&candidates, &targets, &ReferenceContext::new(), false).unwrap();

        assert_eq!(produced.len(), 1);
        assert_eq!(failing.calls(), 1);
        assert_eq!(working.calls(), 1);
    }

    #[test]
    fn panicking_candidate_falls_through() {
        let source: ReferenceHandle = Arc::new(MockReference::new("a", b"v"));
        let working = Arc::new(MockBuilder::new("good", "b"));
        let candidates = vec![
            Candidate::DirectBuild {
                builder: Arc::new(MockBuilder::new("explodes", "b").panicking()),
                source: Arc::clone(&source),
            },
            Candidate::DirectBuild {
                builder: working.clone(),
                source,
            },
        ];
        let targets = BTreeSet::from(["b".into()]);
        let produced = execute_ranked(&candidates, &targets, &ReferenceContext::new(), false).unwrap();

        assert_eq!(produced.len(), 1);
        assert_eq!(working.calls(), 1);
    }

    #[test]
    fn panicking_last_candidate_is_reported() {
        let candidates = vec![Candidate::DirectBuild {
            builder: Arc::new(MockBuilder::new("explodes", "b").panicking()),
            source: Arc::new(MockReference::new("a", b"v")),
        }];
        let targets = BTreeSet::from(["b".into()]);
        let err = execute_ranked(&candidates, &targets, &ReferenceContext::new(), false).unwrap_err();
        assert!(matches!(
            err,
            AugmentationError::AllPathsFailed {
                attempts: 1,
                last_error: StepError::Panicked { .. },
            }
        ));
    }

    #[test]
    fn all_failing_reports_attempts() {
        let source: ReferenceHandle = Arc::new(MockReference::new("a", b"v"));
        let candidates = vec![
            Candidate::DirectBuild {
                builder: Arc::new(MockBuilder::new("bad-1", "b").failing()),
                source: Arc::clone(&source),
            },
            Candidate::DirectBuild {
                builder: Arc::new(MockBuilder::new("bad-2", "b").failing()),
                source,
            },
        ];
        let targets = BTreeSet::from(["b".into()]);
        let err = execute_ranked(&candidates, &targets, &ReferenceContext::new(), true).unwrap_err();
        match err {
            AugmentationError::AllPathsFailed {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 2);
                assert!(matches!(last_error, StepError::Build { ref builder, .. } if builder == "bad-2"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
