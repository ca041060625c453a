//! Reference set augmentor
//!
//! [`ReferenceSetAugmentor`] owns the provider registry, the type graph built
//! from it and one cached shortest-path solver per reference type. The cache
//! is rebuilt lazily on first use after any registry change.
//!
//! # Example
//!
//! ```
//! use std::collections::BTreeSet;
//! use std::sync::Arc;
//! use refset_augment::{AugmentorConfig, ProviderRegistry, ReferenceSetAugmentor};
//! use refset_types::{
//!     InlineByteArrayReference, InlineStringReference, ReferenceContext, ReferenceHandle,
//!     ReferenceSet,
//! };
//!
//! let augmentor = ReferenceSetAugmentor::new(ProviderRegistry::with_defaults(), AugmentorConfig::default());
//! let set = ReferenceSet::with_references([
//!     Arc::new(InlineStringReference::new("hello")) as ReferenceHandle,
//! ]);
//! let targets = BTreeSet::from([InlineByteArrayReference::type_tag()]);
//!
//! let added = augmentor.augment(&set, &targets, &ReferenceContext::new()).unwrap();
//! assert_eq!(added.len(), 1);
//! assert_eq!(set.len(), 2);
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use refset_types::{
    ReferenceBuilder, ReferenceContext, ReferenceHandle, ReferenceSet, ReferenceType,
};

use crate::config::AugmentorConfig;
use crate::dispatch::{Submitter, WorkerPool};
use crate::error::{panic_message, AugmentationError, DispatchError, SolverError};
use crate::graph::TypeGraph;
use crate::ranker::{execute_ranked, CandidateSources};
use crate::registry::ProviderRegistry;
use crate::rewrite::PathRewriter;
use crate::solver::{ShortestPathSolver, TranslationPath};

/// Receives the outcome of [`ReferenceSetAugmentor::augment_async`]
///
/// Exactly one of the two methods is called, on a worker thread.
/// Closures taking a `Result` implement this trait.
pub trait AugmentationCallback: Send + 'static {
    /// Augmentation added `new_references` (empty if a target was already present)
    fn augmentation_completed(self: Box<Self>, new_references: Vec<ReferenceHandle>);

    /// Augmentation failed
    fn augmentation_failed(self: Box<Self>, error: AugmentationError);
}

impl<F> AugmentationCallback for F
where
    F: FnOnce(Result<Vec<ReferenceHandle>, AugmentationError>) + Send + 'static,
{
    fn augmentation_completed(self: Box<Self>, new_references: Vec<ReferenceHandle>) {
        (*self)(Ok(new_references));
    }

    fn augmentation_failed(self: Box<Self>, error: AugmentationError) {
        (*self)(Err(error));
    }
}

#[derive(Debug)]
struct EngineState {
    registry: ProviderRegistry,
    graph: TypeGraph,
    solvers: BTreeMap<ReferenceType, Arc<ShortestPathSolver>>,
    rebuilds: u64,
}

impl EngineState {
    fn rebuild(&mut self) {
        tracing::debug!("Refreshing shortest path cache");
        self.solvers.clear();
        self.graph = TypeGraph::build(&self.registry);

        let types: Vec<ReferenceType> = self.graph.types().cloned().collect();
        for ty in types {
            match ShortestPathSolver::new(ty.clone(), &self.graph) {
                Ok(solver) => {
                    self.solvers.insert(ty, Arc::new(solver));
                }
                Err(e) => {
                    tracing::error!("Cannot construct shortest paths to '{}': {}", ty, e);
                }
            }
        }
        self.rebuilds += 1;
        tracing::debug!(
            "Path cache refresh done, {} solver(s) cached",
            self.solvers.len()
        );
    }

    fn solver_for(&mut self, target: &ReferenceType) -> Result<Arc<ShortestPathSolver>, SolverError> {
        if let Some(solver) = self.solvers.get(target) {
            return Ok(Arc::clone(solver));
        }
        let solver = Arc::new(ShortestPathSolver::new(target.clone(), &self.graph)?);
        self.solvers.insert(target.clone(), Arc::clone(&solver));
        Ok(solver)
    }
}

#[derive(Debug)]
enum PoolState {
    Idle,
    Running(WorkerPool),
    Shutdown,
}

/// Augments reference sets along the cheapest available paths
#[derive(Debug)]
pub struct ReferenceSetAugmentor {
    config: AugmentorConfig,
    rewriter: Arc<dyn PathRewriter>,
    state: Mutex<EngineState>,
    cache_valid: AtomicBool,
    pool: Mutex<PoolState>,
}

impl ReferenceSetAugmentor {
    /// Create augmentor over `registry`
    ///
    /// The path rewriter follows `config.rewrite`. Worker threads are only
    /// started by the first asynchronous request.
    #[must_use]
    pub fn new(registry: ProviderRegistry, config: AugmentorConfig) -> Self {
        tracing::debug!(
            "Augmentor created with {} builder(s) and {} translator(s)",
            registry.builders().len(),
            registry.translators().len()
        );
        Self {
            rewriter: config.rewrite.rewriter(),
            config,
            state: Mutex::new(EngineState {
                registry,
                graph: TypeGraph::new(),
                solvers: BTreeMap::new(),
                rebuilds: 0,
            }),
            cache_valid: AtomicBool::new(false),
            pool: Mutex::new(PoolState::Idle),
        }
    }

    /// Replace the path rewriter
    #[must_use]
    pub fn with_rewriter(mut self, rewriter: Arc<dyn PathRewriter>) -> Self {
        self.rewriter = rewriter;
        self
    }

    /// Active configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &AugmentorConfig {
        &self.config
    }

    /// Mutate the registry and invalidate the path cache
    pub fn update_registry<R>(&self, f: impl FnOnce(&mut ProviderRegistry) -> R) -> R {
        let mut state = self.state.lock();
        let result = f(&mut state.registry);
        self.cache_valid.store(false, Ordering::Release);
        tracing::debug!(
            "Registry updated, now {} builder(s) and {} translator(s)",
            state.registry.builders().len(),
            state.registry.translators().len()
        );
        result
    }

    /// Copy of the current registry
    #[must_use]
    pub fn registry_snapshot(&self) -> ProviderRegistry {
        self.state.lock().registry.clone()
    }

    /// Mark the path cache stale
    ///
    /// Needed only when providers change cost or types outside
    /// [`Self::update_registry`].
    pub fn invalidate(&self) {
        let _state = self.state.lock();
        self.cache_valid.store(false, Ordering::Release);
    }

    /// Number of completed cache rebuilds
    #[must_use]
    pub fn rebuild_count(&self) -> u64 {
        self.state.lock().rebuilds
    }

    fn fresh_state(&self) -> MutexGuard<'_, EngineState> {
        let mut state = self.state.lock();
        if !self.cache_valid.load(Ordering::Acquire) {
            state.rebuild();
            self.cache_valid.store(true, Ordering::Release);
        }
        state
    }

    /// Cheapest translation path from every type that can reach `target`
    ///
    /// # Errors
    /// Returns error if a translator reachable from `target` declares an
    /// invalid cost
    pub fn translation_paths(
        &self,
        target: &ReferenceType,
    ) -> Result<Vec<Arc<TranslationPath>>, SolverError> {
        let solver = self.fresh_state().solver_for(target)?;
        Ok(solver.paths().to_vec())
    }

    /// Solvers for `targets` restricted to translators enabled in `context`
    ///
    /// A cached solver whose paths only use enabled translators is already
    /// optimal over the enabled subgraph. Any other target is solved again
    /// without the disabled translators; that solver is not cached.
    fn plan(
        &self,
        targets: &BTreeSet<ReferenceType>,
        context: &ReferenceContext,
    ) -> (Vec<Arc<ShortestPathSolver>>, Vec<Arc<dyn ReferenceBuilder>>) {
        let mut state = self.fresh_state();
        let mut solvers = Vec::with_capacity(targets.len());
        for target in targets {
            let solver = match state.solver_for(target) {
                Ok(solver) => solver,
                Err(e) => {
                    tracing::error!("Skipping target '{}': {}", target, e);
                    continue;
                }
            };
            let fully_enabled = solver
                .paths()
                .iter()
                .all(|p| p.steps().iter().all(|step| step.is_enabled(context)));
            if fully_enabled {
                solvers.push(solver);
                continue;
            }
            tracing::debug!(
                "Cached paths to '{}' use disabled translators, solving enabled subgraph",
                target
            );
            match ShortestPathSolver::new_filtered(target.clone(), &state.graph, |t| {
                t.is_enabled(context)
            }) {
                Ok(filtered) => solvers.push(Arc::new(filtered)),
                Err(e) => tracing::error!("Skipping target '{}': {}", target, e),
            }
        }
        (solvers, state.registry.builders().to_vec())
    }

    /// Add a reference of one of `targets` to `set`
    ///
    /// Returns the references added (intermediates included, final one last).
    /// If the set already holds a reference of any target type nothing is
    /// added and the result is empty. The set stays locked for the whole
    /// attempt.
    ///
    /// # Errors
    /// Returns [`AugmentationError`] when no path exists or every path failed
    pub fn augment(
        &self,
        set: &ReferenceSet,
        targets: &BTreeSet<ReferenceType>,
        context: &ReferenceContext,
    ) -> Result<Vec<ReferenceHandle>, AugmentationError> {
        let mut guard = set.lock();
        if targets.iter().any(|t| guard.contains_type(t)) {
            tracing::debug!("Reference set {} already holds a target type", set.id());
            return Ok(Vec::new());
        }

        let (solvers, builders) = self.plan(targets, context);
        let candidates = CandidateSources {
            references: guard.references(),
            targets,
            solvers: &solvers,
            builders: &builders,
            rewriter: self.rewriter.as_ref(),
        }
        .ranked(context);

        let produced = execute_ranked(&candidates, targets, context, self.config.log_candidates)?;
        guard.extend(produced.iter().cloned());
        tracing::info!(
            "Augmented reference set {} with {} reference(s)",
            set.id(),
            produced.len()
        );
        Ok(produced)
    }

    fn submitter(&self) -> Result<Submitter, DispatchError> {
        let mut pool = self.pool.lock();
        if matches!(*pool, PoolState::Idle) {
            let workers = WorkerPool::start(
                "refset-augment",
                self.config.worker_threads,
                self.config.queue_capacity,
            )?;
            *pool = PoolState::Running(workers);
        }
        match &*pool {
            PoolState::Running(workers) => workers.submitter().ok_or(DispatchError::Shutdown),
            PoolState::Idle | PoolState::Shutdown => Err(DispatchError::Shutdown),
        }
    }

    /// Run [`Self::augment`] on the worker pool
    ///
    /// Blocks while the request queue is full. The callback receives the
    /// outcome on a worker thread; a panic inside the augmentation is
    /// reported as [`AugmentationError::Panicked`].
    ///
    /// # Errors
    /// Returns [`DispatchError`] if the pool has shut down or cannot start
    pub fn augment_async(
        self: &Arc<Self>,
        set: Arc<ReferenceSet>,
        targets: BTreeSet<ReferenceType>,
        context: ReferenceContext,
        callback: impl AugmentationCallback,
    ) -> Result<(), DispatchError> {
        let submitter = self.submitter()?;
        let engine = Arc::clone(self);
        let callback: Box<dyn AugmentationCallback> = Box::new(callback);
        submitter.submit(Box::new(move || {
            let outcome = catch_unwind(AssertUnwindSafe(|| engine.augment(&set, &targets, &context)))
                .unwrap_or_else(|payload| {
                    let message = panic_message(payload.as_ref());
                    tracing::error!("Augmentation of set {} panicked: {}", set.id(), message);
                    Err(AugmentationError::Panicked { message })
                });
            match outcome {
                Ok(added) => callback.augmentation_completed(added),
                Err(e) => callback.augmentation_failed(e),
            }
        }))
    }

    /// Stop accepting asynchronous requests and drain queued ones
    pub fn shutdown(&self) {
        let previous = std::mem::replace(&mut *self.pool.lock(), PoolState::Shutdown);
        if let PoolState::Running(mut workers) = previous {
            workers.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use crossbeam::channel::bounded;
    use refset_test_utils::{MockBuilder, MockReference, MockTranslator};
    use refset_types::{ExternalReference, ReferenceResult, ReferenceTranslator};

    /// Translator whose first `panics` cost lookups panic
    #[derive(Debug)]
    struct FlakyCost {
        panics: AtomicUsize,
    }

    impl FlakyCost {
        fn new(panics: usize) -> Self {
            Self {
                panics: AtomicUsize::new(panics),
            }
        }
    }

    impl ReferenceTranslator for FlakyCost {
        fn name(&self) -> &str {
            "flaky-cost"
        }

        fn source_type(&self) -> ReferenceType {
            "a".into()
        }

        fn target_type(&self) -> ReferenceType {
            "b".into()
        }

        fn translation_cost(&self) -> f32 {
            let remaining = self.panics.load(Ordering::SeqCst);
            if remaining > 0 {
                self.panics.store(remaining - 1, Ordering::SeqCst);
                panic!("cost lookup failed");
            }
            1.0
        }

        fn translate(
            &self,
            reference: &dyn ExternalReference,
            context: &ReferenceContext,
        ) -> ReferenceResult<Box<dyn ExternalReference>> {
            Ok(Box::new(MockReference::new("b", &reference.read_all(context)?)))
        }
    }

    fn flaky_registry(panics: usize) -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register_translator(Arc::new(FlakyCost::new(panics)));
        registry
    }

    fn chain_registry() -> ProviderRegistry {
        let mut registry = ProviderRegistry::new();
        registry.register_translator(Arc::new(MockTranslator::new("a2b", "a", "b", 1.0)));
        registry.register_translator(Arc::new(MockTranslator::new("b2c", "b", "c", 1.0)));
        registry
    }

    fn set_of(ty: &str) -> ReferenceSet {
        ReferenceSet::with_references([Arc::new(MockReference::new(ty, b"v")) as ReferenceHandle])
    }

    #[test]
    fn cache_built_once() {
        let augmentor = ReferenceSetAugmentor::new(chain_registry(), AugmentorConfig::default());
        assert_eq!(augmentor.rebuild_count(), 0);

        augmentor.translation_paths(&"c".into()).unwrap();
        augmentor.translation_paths(&"b".into()).unwrap();
        assert_eq!(augmentor.rebuild_count(), 1);
    }

    #[test]
    fn update_registry_invalidates() {
        let augmentor = ReferenceSetAugmentor::new(chain_registry(), AugmentorConfig::default());
        assert_eq!(augmentor.translation_paths(&"c".into()).unwrap().len(), 2);

        let removed = augmentor.update_registry(|r| r.remove_translator("a2b"));
        assert!(removed);
        assert_eq!(augmentor.translation_paths(&"c".into()).unwrap().len(), 1);
        assert_eq!(augmentor.rebuild_count(), 2);
    }

    #[test]
    fn invalidate_forces_rebuild() {
        let augmentor = ReferenceSetAugmentor::new(chain_registry(), AugmentorConfig::default());
        augmentor.translation_paths(&"c".into()).unwrap();
        augmentor.invalidate();
        augmentor.translation_paths(&"c".into()).unwrap();
        assert_eq!(augmentor.rebuild_count(), 2);
    }

    #[test]
    fn unknown_target_has_no_paths() {
        let augmentor = ReferenceSetAugmentor::new(chain_registry(), AugmentorConfig::default());
        assert!(augmentor.translation_paths(&"zzz".into()).unwrap().is_empty());
    }

    #[test]
    fn invalid_cost_is_isolated_to_its_target() {
        let mut registry = chain_registry();
        registry.register_translator(Arc::new(MockTranslator::new("bad", "x", "y", -1.0)));
        let augmentor = ReferenceSetAugmentor::new(registry, AugmentorConfig::default());

        assert!(augmentor.translation_paths(&"y".into()).is_err());
        assert_eq!(augmentor.translation_paths(&"c".into()).unwrap().len(), 2);
    }

    #[test]
    fn augment_appends_chain_outputs() {
        let augmentor = ReferenceSetAugmentor::new(chain_registry(), AugmentorConfig::default());
        let set = set_of("a");
        let added = augmentor
            .augment(&set, &BTreeSet::from(["c".into()]), &ReferenceContext::new())
            .unwrap();

        assert_eq!(added.len(), 2);
        assert_eq!(set.len(), 3);
        assert!(set.contains_type(&"c".into()));
    }

    #[test]
    fn augment_fast_exit() {
        let augmentor = ReferenceSetAugmentor::new(chain_registry(), AugmentorConfig::default());
        let set = set_of("c");
        let added = augmentor
            .augment(&set, &BTreeSet::from(["c".into()]), &ReferenceContext::new())
            .unwrap();
        assert!(added.is_empty());
        assert_eq!(set.len(), 1);
        assert_eq!(augmentor.rebuild_count(), 0);
    }

    #[test]
    fn augment_without_paths_fails() {
        let augmentor = ReferenceSetAugmentor::new(ProviderRegistry::new(), AugmentorConfig::default());
        let err = augmentor
            .augment(&set_of("a"), &BTreeSet::from(["c".into()]), &ReferenceContext::new())
            .unwrap_err();
        assert!(err.is_no_candidates());
    }

    #[test]
    fn direct_build_from_registry() {
        let mut registry = ProviderRegistry::new();
        registry.register_builder(Arc::new(MockBuilder::new("c-builder", "c")));
        let augmentor = ReferenceSetAugmentor::new(registry, AugmentorConfig::default());
        let set = set_of("a");
        let added = augmentor
            .augment(&set, &BTreeSet::from(["c".into()]), &ReferenceContext::new())
            .unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(added[0].reference_type().name(), "c");
    }

    #[test]
    fn panicking_rebuild_leaves_cache_stale() {
        let augmentor = ReferenceSetAugmentor::new(flaky_registry(1), AugmentorConfig::default());

        let first = catch_unwind(AssertUnwindSafe(|| augmentor.translation_paths(&"b".into())));
        assert!(first.is_err());
        assert_eq!(augmentor.rebuild_count(), 0);

        let paths = augmentor.translation_paths(&"b".into()).unwrap();
        assert_eq!(augmentor.rebuild_count(), 1);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].step_names(), vec!["flaky-cost"]);
    }

    #[test]
    fn augment_after_panicking_rebuild() {
        let augmentor = ReferenceSetAugmentor::new(flaky_registry(1), AugmentorConfig::default());
        let set = set_of("a");
        let targets = BTreeSet::from(["b".into()]);

        let first = catch_unwind(AssertUnwindSafe(|| {
            augmentor.augment(&set, &targets, &ReferenceContext::new())
        }));
        assert!(first.is_err());
        assert_eq!(set.len(), 1);

        let added = augmentor.augment(&set, &targets, &ReferenceContext::new()).unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(augmentor.rebuild_count(), 1);
    }

    #[test]
    fn async_panic_reaches_callback() {
        let augmentor = Arc::new(ReferenceSetAugmentor::new(
            flaky_registry(1),
            AugmentorConfig::default().with_worker_threads(1),
        ));
        let set = Arc::new(set_of("a"));
        let (tx, rx) = bounded(2);

        for _ in 0..2 {
            let tx = tx.clone();
            augmentor
                .augment_async(
                    Arc::clone(&set),
                    BTreeSet::from(["b".into()]),
                    ReferenceContext::new(),
                    move |outcome: Result<Vec<ReferenceHandle>, AugmentationError>| {
                        let _ = tx.send(outcome.map(|added| added.len()));
                    },
                )
                .unwrap();
        }

        let first = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert!(matches!(
            first,
            Err(AugmentationError::Panicked { ref message }) if message == "cost lookup failed"
        ));
        let second = rx.recv_timeout(Duration::from_secs(10)).unwrap();
        assert_eq!(second.unwrap(), 1);
        augmentor.shutdown();
    }

    #[test]
    fn disabled_cheapest_translator_falls_back_to_enabled_one() {
        let mut registry = ProviderRegistry::new();
        registry.register_translator(Arc::new(
            MockTranslator::new("fast", "a", "b", 1.0).enabled_when("net"),
        ));
        registry.register_translator(Arc::new(MockTranslator::new("slow", "a", "b", 2.0)));
        let augmentor = ReferenceSetAugmentor::new(registry, AugmentorConfig::default());

        let (solvers, _) = augmentor.plan(&BTreeSet::from(["b".into()]), &ReferenceContext::new());
        assert_eq!(solvers[0].paths()[0].step_names(), vec!["slow"]);
        // cached solver is untouched
        assert_eq!(
            augmentor.translation_paths(&"b".into()).unwrap()[0].step_names(),
            vec!["fast"]
        );
    }

    #[test]
    fn async_after_shutdown_is_rejected() {
        let augmentor = Arc::new(ReferenceSetAugmentor::new(
            chain_registry(),
            AugmentorConfig::default().with_worker_threads(1),
        ));
        augmentor.shutdown();
        let result = augmentor.augment_async(
            Arc::new(set_of("a")),
            BTreeSet::from(["c".into()]),
            ReferenceContext::new(),
            |_: Result<Vec<ReferenceHandle>, AugmentationError>| {},
        );
        assert!(matches!(result, Err(DispatchError::Shutdown)));
    }
}
