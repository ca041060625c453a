//! Candidate augmentation paths
//!
//! A [`Candidate`] binds one way of producing a target reference to the
//! concrete existing reference it starts from.

use std::cmp::Ordering;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use refset_types::{
    ExternalReference, ReferenceBuilder, ReferenceContext, ReferenceHandle, ReferenceType,
};

use crate::error::StepError;
use crate::graph::cmp_cost;
use crate::solver::TranslationPath;

/// One way to add a reference of a target type
#[derive(Debug, Clone)]
pub enum Candidate {
    /// Dereference `source` and build the target type from its bytes
    DirectBuild {
        /// Builder of the target type
        builder: Arc<dyn ReferenceBuilder>,
        /// Reference whose bytes are read
        source: ReferenceHandle,
    },

    /// Run a translator chain starting at `source`
    Chain {
        /// Translator chain
        path: Arc<TranslationPath>,
        /// Reference of the chain's source type
        source: ReferenceHandle,
    },

    /// Build the chain's source type from `source`'s bytes, then run the chain
    RebuiltChain {
        /// Builder of the chain's source type
        builder: Arc<dyn ReferenceBuilder>,
        /// Translator chain
        path: Arc<TranslationPath>,
        /// Reference whose bytes are read
        source: ReferenceHandle,
    },
}

impl Candidate {
    /// Existing reference this candidate starts from
    #[inline]
    #[must_use]
    pub fn source(&self) -> &ReferenceHandle {
        match self {
            Self::DirectBuild { source, .. }
            | Self::Chain { source, .. }
            | Self::RebuiltChain { source, .. } => source,
        }
    }

    /// Type of the final reference produced
    #[must_use]
    pub fn produced_type(&self) -> ReferenceType {
        match self {
            Self::DirectBuild { builder, .. } => builder.reference_type(),
            Self::Chain { path, .. } | Self::RebuiltChain { path, .. } => {
                path.target_type().clone()
            }
        }
    }

    /// Estimated total cost
    #[must_use]
    pub fn cost(&self) -> f32 {
        match self {
            Self::DirectBuild { builder, source } => {
                source.resolution_cost() + builder.construction_cost()
            }
            Self::Chain { path, .. } => path.cost(),
            Self::RebuiltChain {
                builder,
                path,
                source,
            } => source.resolution_cost() + builder.construction_cost() + path.cost(),
        }
    }

    /// Whether every provider involved is enabled for `context`
    #[must_use]
    pub fn is_enabled(&self, context: &ReferenceContext) -> bool {
        let steps_enabled = |path: &TranslationPath| {
            path.steps().iter().all(|step| step.is_enabled(context))
        };
        match self {
            Self::DirectBuild { builder, .. } => builder.is_enabled(context),
            Self::Chain { path, .. } => steps_enabled(path),
            Self::RebuiltChain { builder, path, .. } => {
                builder.is_enabled(context) && steps_enabled(path)
            }
        }
    }

    /// Total order used for ranking
    ///
    /// Cost first; ties go to direct builds, then plain chains, then rebuilt
    /// chains, and finally to type and provider names.
    #[must_use]
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        cmp_cost(self.cost(), other.cost())
            .then_with(|| self.kind_rank().cmp(&other.kind_rank()))
            .then_with(|| self.produced_type().cmp(&other.produced_type()))
            .then_with(|| {
                self.source()
                    .reference_type()
                    .cmp(&other.source().reference_type())
            })
            .then_with(|| self.step_names().cmp(&other.step_names()))
            .then_with(|| self.builder_name().cmp(&other.builder_name()))
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Self::DirectBuild { .. } => 0,
            Self::Chain { .. } => 1,
            Self::RebuiltChain { .. } => 2,
        }
    }

    fn step_names(&self) -> Vec<&str> {
        match self {
            Self::DirectBuild { .. } => Vec::new(),
            Self::Chain { path, .. } | Self::RebuiltChain { path, .. } => path.step_names(),
        }
    }

    fn builder_name(&self) -> Option<&str> {
        match self {
            Self::DirectBuild { builder, .. } | Self::RebuiltChain { builder, .. } => {
                Some(builder.name())
            }
            Self::Chain { .. } => None,
        }
    }

    /// Run the candidate
    ///
    /// Returns every reference produced, final one last. Nothing is added to
    /// any reference set here.
    ///
    /// # Errors
    /// Returns the first failing step
    pub fn execute(&self, context: &ReferenceContext) -> Result<Vec<ReferenceHandle>, StepError> {
        match self {
            Self::DirectBuild { builder, source } => {
                Ok(vec![build_from(builder.as_ref(), source.as_ref(), context)?])
            }
            Self::Chain { path, source } => run_steps(path, source.as_ref(), context),
            Self::RebuiltChain {
                builder,
                path,
                source,
            } => {
                let rebuilt = build_from(builder.as_ref(), source.as_ref(), context)?;
                let mut produced = run_steps(path, rebuilt.as_ref(), context)?;
                produced.insert(0, rebuilt);
                Ok(produced)
            }
        }
    }
}

impl Display for Candidate {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectBuild { builder, source } => write!(
                f,
                "build {} from {} via '{}' (cost {})",
                builder.reference_type(),
                source.describe(),
                builder.name(),
                self.cost()
            ),
            Self::Chain { path, source } => {
                write!(f, "translate {}: {}", source.describe(), path)
            }
            Self::RebuiltChain {
                builder,
                path,
                source,
            } => write!(
                f,
                "rebuild {} from {} via '{}', then {} (cost {})",
                path.source_type(),
                source.describe(),
                builder.name(),
                path,
                self.cost()
            ),
        }
    }
}

fn build_from(
    builder: &dyn ReferenceBuilder,
    source: &dyn ExternalReference,
    context: &ReferenceContext,
) -> Result<ReferenceHandle, StepError> {
    let mut stream = source
        .open_stream(context)
        .map_err(|e| StepError::Dereference {
            reference: source.describe(),
            source: e,
        })?;
    let built = builder
        .create_reference(&mut stream, context)
        .map_err(|e| StepError::Build {
            builder: builder.name().to_string(),
            source: e,
        })?;
    let expected = builder.reference_type();
    let actual = built.reference_type();
    if actual != expected {
        return Err(StepError::UnexpectedType {
            provider: builder.name().to_string(),
            expected,
            actual,
        });
    }
    Ok(Arc::from(built))
}

fn run_steps(
    path: &TranslationPath,
    first: &dyn ExternalReference,
    context: &ReferenceContext,
) -> Result<Vec<ReferenceHandle>, StepError> {
    let mut produced: Vec<ReferenceHandle> = Vec::with_capacity(path.len());
    for step in path.steps() {
        let input: &dyn ExternalReference = match produced.last() {
            Some(previous) => previous.as_ref(),
            None => first,
        };
        let output = step
            .translate(input, context)
            .map_err(|e| StepError::Translate {
                translator: step.name().to_string(),
                source: e,
            })?;
        let expected = step.target_type();
        let actual = output.reference_type();
        if actual != expected {
            return Err(StepError::UnexpectedType {
                provider: step.name().to_string(),
                expected,
                actual,
            });
        }
        produced.push(Arc::from(output));
    }
    Ok(produced)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::TypeGraph;
    use crate::registry::ProviderRegistry;
    use crate::solver::ShortestPathSolver;
    use refset_test_utils::{MockBuilder, MockReference, MockTranslator};

    fn path(translators: Vec<MockTranslator>, source: &str, target: &str) -> Arc<TranslationPath> {
        let mut registry = ProviderRegistry::new();
        for t in translators {
            registry.register_translator(Arc::new(t));
        }
        let graph = TypeGraph::build(&registry);
        let solver = ShortestPathSolver::new(target.into(), &graph).unwrap();
        Arc::clone(solver.path_from(&source.into()).unwrap())
    }

    fn reference(ty: &str, data: &[u8]) -> ReferenceHandle {
        Arc::new(MockReference::new(ty, data))
    }

    #[test]
    fn direct_build_produces_builder_type() {
        let candidate = Candidate::DirectBuild {
            builder: Arc::new(MockBuilder::new("b-builder", "b")),
            source: reference("a", b"payload"),
        };
        let produced = candidate.execute(&ReferenceContext::new()).unwrap();

        assert_eq!(produced.len(), 1);
        assert_eq!(produced[0].reference_type().name(), "b");
        let built = produced[0].downcast_ref::<MockReference>().unwrap();
        assert_eq!(built.data(), b"payload");
    }

    #[test]
    fn chain_runs_every_step_in_order() {
        let p = path(
            vec![
                MockTranslator::new("a2b", "a", "b", 1.0),
                MockTranslator::new("b2c", "b", "c", 1.0),
            ],
            "a",
            "c",
        );
        let candidate = Candidate::Chain {
            path: p,
            source: reference("a", b"x"),
        };
        let produced = candidate.execute(&ReferenceContext::new()).unwrap();
        let types: Vec<String> = produced
            .iter()
            .map(|r| r.reference_type().to_string())
            .collect();
        assert_eq!(types, vec!["b", "c"]);
    }

    #[test]
    fn chain_failure_reports_step() {
        let p = path(
            vec![
                MockTranslator::new("a2b", "a", "b", 1.0),
                MockTranslator::new("b2c", "b", "c", 1.0).failing(),
            ],
            "a",
            "c",
        );
        let candidate = Candidate::Chain {
            path: p,
            source: reference("a", b"x"),
        };
        let err = candidate.execute(&ReferenceContext::new()).unwrap_err();
        assert!(matches!(err, StepError::Translate { ref translator, .. } if translator == "b2c"));
    }

    #[test]
    fn wrong_output_type_is_a_failure() {
        let p = path(vec![MockTranslator::new("liar", "a", "b", 1.0).producing("z")], "a", "b");
        let candidate = Candidate::Chain {
            path: p,
            source: reference("a", b"x"),
        };
        let err = candidate.execute(&ReferenceContext::new()).unwrap_err();
        assert!(matches!(err, StepError::UnexpectedType { .. }));
    }

    #[test]
    fn rebuilt_chain_includes_rebuilt_source() {
        let p = path(vec![MockTranslator::new("s2t", "s", "t", 1.0)], "s", "t");
        let candidate = Candidate::RebuiltChain {
            builder: Arc::new(MockBuilder::new("s-builder", "s").with_cost(0.5)),
            path: p,
            source: reference("other", b"bytes"),
        };
        assert!((candidate.cost() - 1.5).abs() < 1e-6);
        assert_eq!(candidate.produced_type().name(), "t");

        let produced = candidate.execute(&ReferenceContext::new()).unwrap();
        assert_eq!(produced.len(), 2);
        assert_eq!(produced[0].reference_type().name(), "s");
        assert_eq!(produced[1].reference_type().name(), "t");
    }

    #[test]
    fn unreadable_source_fails_build() {
        let candidate = Candidate::DirectBuild {
            builder: Arc::new(MockBuilder::new("b-builder", "b")),
            source: Arc::new(MockReference::new("a", b"x").unreadable()),
        };
        let err = candidate.execute(&ReferenceContext::new()).unwrap_err();
        assert!(matches!(err, StepError::Dereference { .. }));
    }

    #[test]
    fn cost_includes_resolution_cost() {
        let candidate = Candidate::DirectBuild {
            builder: Arc::new(MockBuilder::new("b-builder", "b").with_cost(0.25)),
            source: Arc::new(MockReference::new("a", b"x").with_resolution_cost(1.0)),
        };
        assert!((candidate.cost() - 1.25).abs() < 1e-6);
    }

    #[test]
    fn enablement_covers_every_step() {
        let p = path(
            vec![
                MockTranslator::new("a2b", "a", "b", 1.0),
                MockTranslator::new("b2c", "b", "c", 1.0).enabled_when("online"),
            ],
            "a",
            "c",
        );
        let candidate = Candidate::Chain {
            path: p,
            source: reference("a", b"x"),
        };
        assert!(!candidate.is_enabled(&ReferenceContext::new()));
        assert!(candidate.is_enabled(&ReferenceContext::new().with_property("online", "true")));
    }

    #[test]
    fn ties_prefer_direct_builds() {
        let p = path(vec![MockTranslator::new("a2b", "a", "b", 0.0)], "a", "b");
        let chain = Candidate::Chain {
            path: p,
            source: reference("a", b"x"),
        };
        let build = Candidate::DirectBuild {
            builder: Arc::new(MockBuilder::new("b-builder", "b")),
            source: reference("a", b"x"),
        };
        assert_eq!(build.rank_cmp(&chain), Ordering::Less);
        assert_eq!(chain.rank_cmp(&build), Ordering::Greater);
    }

    #[test]
    fn display_describes_candidate() {
        let build = Candidate::DirectBuild {
            builder: Arc::new(MockBuilder::new("b-builder", "b")),
            source: reference("a", b"x"),
        };
        assert!(build.to_string().starts_with("build b from"));
    }
}
