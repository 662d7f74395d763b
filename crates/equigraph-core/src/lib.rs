//! # Equigraph Core
//!
//! Equivalence-group graph engine for academic credit-transfer backends.
//!
//! Subjects (courses) that are mutually interchangeable for credit transfer
//! at a curriculum stage form a *group*: a simple directed cycle of
//! stage-tagged equivalence edges. Within one stage every subject has at
//! most one outgoing and one incoming edge, so the edge set decomposes into
//! disjoint cycles plus isolated subjects — the engine's central invariant,
//! preserved by every mutation and checked rather than assumed by queries.
//!
//! ## Features
//!
//! - **O(1) mutations**: insertion splices right after the source subject
//!   and removal repairs the cycle locally, regardless of group size
//! - **Merge rejection**: linking a subject that already belongs to a group
//!   is a conflict, never a silent merge of two groups
//! - **Optimistic concurrency**: mutations commit version-checked write
//!   batches and retry with bounded exponential backoff under contention
//! - **Stage partitioning**: edges at different curriculum stages are
//!   structurally independent, even between the same subjects
//!
//! ## Quick Start
//!
//! ```rust
//! use equigraph_core::{EngineConfig, EquivalenceGraph, Subject};
//!
//! fn main() -> equigraph_core::Result<()> {
//!     let graph = EquivalenceGraph::in_memory(&EngineConfig::default());
//!
//!     // Subjects come from the course catalog, never from the engine.
//!     graph.catalog().upsert(Subject::new(1, "Algebra I", 77));
//!     graph.catalog().upsert(Subject::new(2, "Matemática 1", 91));
//!
//!     let outcome = graph.add_equivalence(1, 2, "19")?;
//!     assert!(outcome.pair_created);
//!
//!     assert!(graph.are_equivalent_by_cycle(1, 2, "19")?);
//!     assert_eq!(graph.group_members(1, "19")?.len(), 2);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;

use std::sync::Arc;

pub use catalog::{InMemoryCatalog, SubjectCatalog};
pub use config::{ConfigError, EngineConfig, QueryConfig, RetryConfig};
pub use error::{Error, Result};
pub use graph::{
    AddOutcome, EquivalenceEdge, GraphStore, GroupRemoval, InMemoryGraphStore, Neighborhood,
    QueryEngine, RemovalKind, RetryPolicy, StageView, Subject, SubjectId, TopologyEngine,
    WriteBatch,
};

/// Facade wiring a graph store, a subject catalog, and configuration into
/// the engine's four operations.
pub struct EquivalenceGraph<S = InMemoryGraphStore, C = InMemoryCatalog> {
    store: Arc<S>,
    catalog: Arc<C>,
    topology: TopologyEngine<S, C>,
    query: QueryEngine<S, C>,
}

impl EquivalenceGraph<InMemoryGraphStore, InMemoryCatalog> {
    /// Creates an engine over a fresh in-memory store and catalog.
    #[must_use]
    pub fn in_memory(config: &EngineConfig) -> Self {
        Self::new(
            Arc::new(InMemoryGraphStore::new()),
            Arc::new(InMemoryCatalog::new()),
            config,
        )
    }
}

impl<S: GraphStore, C: SubjectCatalog> EquivalenceGraph<S, C> {
    /// Creates an engine over the given store and catalog.
    pub fn new(store: Arc<S>, catalog: Arc<C>, config: &EngineConfig) -> Self {
        let retry = RetryPolicy::from(&config.retry);
        let topology = TopologyEngine::new(Arc::clone(&store), Arc::clone(&catalog), retry);
        let query = QueryEngine::new(
            Arc::clone(&store),
            Arc::clone(&catalog),
            config.query.max_walk,
        );
        Self {
            store,
            catalog,
            topology,
            query,
        }
    }

    /// Returns the underlying graph store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the underlying subject catalog.
    #[must_use]
    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Declares `to` equivalent to `from` at `stage`.
    ///
    /// See [`TopologyEngine::add_equivalence`].
    pub fn add_equivalence(&self, from: SubjectId, to: SubjectId, stage: &str) -> Result<AddOutcome> {
        self.topology.add_equivalence(from, to, stage)
    }

    /// Detaches `subject` from its group at `stage`.
    ///
    /// See [`TopologyEngine::remove_from_group`].
    pub fn remove_from_group(
        &self,
        subject: SubjectId,
        stage: &str,
    ) -> Result<Option<GroupRemoval>> {
        self.topology.remove_from_group(subject, stage)
    }

    /// True when `a` and `b` lie on the same equivalence cycle at `stage`.
    ///
    /// See [`QueryEngine::are_equivalent_by_cycle`].
    pub fn are_equivalent_by_cycle(&self, a: SubjectId, b: SubjectId, stage: &str) -> Result<bool> {
        self.query.are_equivalent_by_cycle(a, b, stage)
    }

    /// Returns the full membership of `subject`'s group at `stage`.
    ///
    /// See [`QueryEngine::group_members`].
    pub fn group_members(&self, subject: SubjectId, stage: &str) -> Result<Vec<Subject>> {
        self.query.group_members(subject, stage)
    }
}
