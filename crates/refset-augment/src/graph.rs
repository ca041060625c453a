//! Reference type graph
//!
//! Nodes are reference types, edges are translators pointing from their
//! source type to their target type. Solvers walk the graph backwards from a
//! target, so the main query is [`TypeGraph::inbound`].

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use refset_types::{ReferenceTranslator, ReferenceType};

use crate::registry::ProviderRegistry;

/// Translator edge with its cost captured at build time
#[derive(Debug, Clone)]
pub struct TranslatorEdge {
    /// The translator
    pub translator: Arc<dyn ReferenceTranslator>,
    /// Declared cost when the graph was built
    pub cost: f32,
}

/// Inbound edge as seen from its target node
#[derive(Debug, Clone, Copy)]
pub struct InboundEdge<'a> {
    /// Type the translator consumes
    pub source: &'a ReferenceType,
    /// Translator and its cost
    pub edge: &'a TranslatorEdge,
}

/// Directed graph of reference types connected by translators
#[derive(Debug, Default)]
pub struct TypeGraph {
    graph: DiGraph<ReferenceType, TranslatorEdge>,
    nodes: BTreeMap<ReferenceType, NodeIndex>,
}

impl TypeGraph {
    /// Create empty graph
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialise the graph for a registry
    ///
    /// Every known type becomes a node (builder-only types included, with no
    /// edges). Node insertion follows type-name order.
    #[must_use]
    pub fn build(registry: &ProviderRegistry) -> Self {
        let mut graph = Self::new();
        for ty in registry.known_types() {
            graph.add_type(ty);
        }
        for translator in registry.translators() {
            let from = graph.add_type(translator.source_type());
            let to = graph.add_type(translator.target_type());
            let edge = TranslatorEdge {
                cost: translator.translation_cost(),
                translator: Arc::clone(translator),
            };
            graph.graph.add_edge(from, to, edge);
        }
        tracing::trace!(
            "Built type graph with {} types and {} translators",
            graph.type_count(),
            graph.translator_count()
        );
        graph
    }

    fn add_type(&mut self, ty: ReferenceType) -> NodeIndex {
        if let Some(idx) = self.nodes.get(&ty) {
            return *idx;
        }
        let idx = self.graph.add_node(ty.clone());
        self.nodes.insert(ty, idx);
        idx
    }

    /// Check if type is a node
    #[inline]
    #[must_use]
    pub fn contains(&self, ty: &ReferenceType) -> bool {
        self.nodes.contains_key(ty)
    }

    /// Types in name order
    pub fn types(&self) -> impl Iterator<Item = &ReferenceType> {
        self.nodes.keys()
    }

    /// Number of type nodes
    #[inline]
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of translator edges
    #[inline]
    #[must_use]
    pub fn translator_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Translators that produce `ty`
    ///
    /// Ordered by source type name, then cost, then translator name, so the
    /// first of several equal-cost parallel translators is always the same.
    #[must_use]
    pub fn inbound(&self, ty: &ReferenceType) -> Vec<InboundEdge<'_>> {
        let Some(&idx) = self.nodes.get(ty) else {
            return Vec::new();
        };
        let mut edges: Vec<InboundEdge<'_>> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| InboundEdge {
                source: &self.graph[e.source()],
                edge: e.weight(),
            })
            .collect();
        edges.sort_by(|a, b| {
            a.source
                .cmp(b.source)
                .then_with(|| a.edge.cost.total_cmp(&b.edge.cost))
                .then_with(|| a.edge.translator.name().cmp(b.edge.translator.name()))
        });
        edges
    }

    /// Translators consuming `ty`
    #[must_use]
    pub fn outbound_count(&self, ty: &ReferenceType) -> usize {
        self.nodes.get(ty).map_or(0, |&idx| {
            self.graph.edges_directed(idx, Direction::Outgoing).count()
        })
    }
}

/// Order two costs, treating them as totally ordered
#[inline]
pub(crate) fn cmp_cost(a: f32, b: f32) -> Ordering {
    a.total_cmp(&b)
}
