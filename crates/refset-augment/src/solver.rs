//! Shortest translation paths into one target type
//!
//! [`ShortestPathSolver`] runs Dijkstra over the reversed [`TypeGraph`]
//! starting at the target, so one run yields the cheapest translator chain
//! from every reachable type into that target.
//!
//! # Determinism
//! - The frontier is ordered by (distance, type name)
//! - Inbound edges are relaxed in [`TypeGraph::inbound`] order and only
//!   strict improvements are recorded
//!
//! Identical registries therefore always produce identical paths.

use std::cmp::{Ordering, Reverse};
use std::collections::{BTreeMap, BTreeSet, BinaryHeap};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use refset_types::{ReferenceTranslator, ReferenceType};

use crate::error::SolverError;
use crate::graph::{cmp_cost, TypeGraph};

/// Cheapest translator chain from one type into a target
#[derive(Debug, Clone)]
pub struct TranslationPath {
    source: ReferenceType,
    target: ReferenceType,
    steps: Vec<Arc<dyn ReferenceTranslator>>,
    cost: f32,
}

impl TranslationPath {
    /// Type the first step consumes
    #[inline]
    #[must_use]
    pub fn source_type(&self) -> &ReferenceType {
        &self.source
    }

    /// Type the last step produces
    #[inline]
    #[must_use]
    pub fn target_type(&self) -> &ReferenceType {
        &self.target
    }

    /// Steps in data-flow order
    #[inline]
    #[must_use]
    pub fn steps(&self) -> &[Arc<dyn ReferenceTranslator>] {
        &self.steps
    }

    /// Sum of step costs
    #[inline]
    #[must_use]
    pub fn cost(&self) -> f32 {
        self.cost
    }

    /// Number of steps
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Check if path has no steps
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Translator names in step order
    #[must_use]
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Display for TranslationPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.source)?;
        for step in &self.steps {
            write!(f, " -[{}]-> {}", step.name(), step.target_type())?;
        }
        write!(f, " (cost {})", self.cost)
    }
}

/// Frontier entry, ordered by distance then type name
#[derive(Debug, Clone, PartialEq)]
struct Tentative {
    distance: f32,
    node: ReferenceType,
}

impl Eq for Tentative {}

impl PartialOrd for Tentative {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tentative {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_cost(self.distance, other.distance).then_with(|| self.node.cmp(&other.node))
    }
}

/// Shortest paths from every reachable type into one target
#[derive(Debug)]
pub struct ShortestPathSolver {
    target: ReferenceType,
    distances: BTreeMap<ReferenceType, f32>,
    paths: Vec<Arc<TranslationPath>>,
}

impl ShortestPathSolver {
    /// Solve for `target` over `graph`
    ///
    /// A target that is not part of the graph yields a solver with no paths.
    ///
    /// # Errors
    /// Returns [`SolverError::InvalidCost`] if a translator reachable from
    /// the target declares a negative or non-finite cost
    pub fn new(target: ReferenceType, graph: &TypeGraph) -> Result<Self, SolverError> {
        Self::new_filtered(target, graph, |_| true)
    }

    /// Solve for `target` using only translators accepted by `keep`
    ///
    /// Rejected translators are treated as absent, so a more expensive chain
    /// of accepted translators is found when the cheapest one is rejected.
    ///
    /// # Errors
    /// Same as [`Self::new`]; costs are validated before `keep` is consulted
    pub fn new_filtered(
        target: ReferenceType,
        graph: &TypeGraph,
        keep: impl Fn(&dyn ReferenceTranslator) -> bool,
    ) -> Result<Self, SolverError> {
        tracing::debug!("Constructing shortest paths to '{}'", target);

        let mut distances: BTreeMap<ReferenceType, f32> = BTreeMap::new();
        let mut predecessors: BTreeMap<ReferenceType, (ReferenceType, Arc<dyn ReferenceTranslator>)> =
            BTreeMap::new();
        let mut settled: BTreeSet<ReferenceType> = BTreeSet::new();
        let mut frontier = BinaryHeap::new();

        distances.insert(target.clone(), 0.0);
        frontier.push(Reverse(Tentative {
            distance: 0.0,
            node: target.clone(),
        }));

        while let Some(Reverse(Tentative { distance, node })) = frontier.pop() {
            if settled.contains(&node) {
                continue;
            }
            if distances.get(&node).is_some_and(|&best| best < distance) {
                continue;
            }
            settled.insert(node.clone());
            tracing::trace!("Relaxing node {}", node);

            for inbound in graph.inbound(&node) {
                let cost = inbound.edge.cost;
                if !cost.is_finite() || cost < 0.0 {
                    return Err(SolverError::InvalidCost {
                        translator: inbound.edge.translator.name().to_string(),
                        cost,
                    });
                }
                if settled.contains(inbound.source) || !keep(inbound.edge.translator.as_ref()) {
                    continue;
                }
                let candidate = distance + cost;
                let current = distances
                    .get(inbound.source)
                    .copied()
                    .unwrap_or(f32::INFINITY);
                if candidate < current {
                    distances.insert(inbound.source.clone(), candidate);
                    predecessors.insert(
                        inbound.source.clone(),
                        (node.clone(), Arc::clone(&inbound.edge.translator)),
                    );
                    frontier.push(Reverse(Tentative {
                        distance: candidate,
                        node: inbound.source.clone(),
                    }));
                }
            }
        }

        let mut paths = Vec::new();
        for source in settled.iter().filter(|s| **s != target) {
            let Some(&cost) = distances.get(source) else {
                continue;
            };
            let mut steps = Vec::new();
            let mut node = source;
            while let Some((next, translator)) = predecessors.get(node) {
                steps.push(Arc::clone(translator));
                node = next;
            }
            if steps.is_empty() {
                continue;
            }
            paths.push(Arc::new(TranslationPath {
                source: source.clone(),
                target: target.clone(),
                steps,
                cost,
            }));
        }
        paths.sort_by(|a, b| {
            cmp_cost(a.cost, b.cost).then_with(|| a.source.cmp(&b.source))
        });

        if paths.is_empty() {
            tracing::debug!("  no paths discovered, type not reachable through translation");
        } else {
            tracing::debug!("  found {} distinct path(s):", paths.len());
            for (i, path) in paths.iter().enumerate() {
                tracing::debug!("    {}) {}", i + 1, path);
            }
        }

        Ok(Self {
            target,
            distances,
            paths,
        })
    }

    /// Target type
    #[inline]
    #[must_use]
    pub fn target(&self) -> &ReferenceType {
        &self.target
    }

    /// Paths ordered by ascending cost, then source type name
    #[inline]
    #[must_use]
    pub fn paths(&self) -> &[Arc<TranslationPath>] {
        &self.paths
    }

    /// Shortest distance from `source` into the target
    ///
    /// The target itself has distance 0; unreachable types return `None`.
    #[inline]
    #[must_use]
    pub fn distance(&self, source: &ReferenceType) -> Option<f32> {
        self.distances.get(source).copied()
    }

    /// Path starting at `source`, if reachable
    #[must_use]
    pub fn path_from(&self, source: &ReferenceType) -> Option<&Arc<TranslationPath>> {
        self.paths.iter().find(|p| p.source_type() == source)
    }
}
