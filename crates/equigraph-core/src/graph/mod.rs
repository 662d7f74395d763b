//! Equivalence-group graph engine.
//!
//! Records which subjects are interchangeable for credit transfer at a given
//! curriculum stage. Per stage, equivalence edges form disjoint simple
//! directed cycles (plus isolated subjects); a group is the member set of
//! one cycle. The topology engine inserts and removes subjects while
//! preserving that shape, and the query engine answers equivalence and
//! membership questions over it.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use equigraph_core::graph::{QueryEngine, RetryPolicy, TopologyEngine};
//! use equigraph_core::{InMemoryCatalog, InMemoryGraphStore, Subject};
//!
//! let store = Arc::new(InMemoryGraphStore::new());
//! let catalog = Arc::new(InMemoryCatalog::new());
//! catalog.upsert(Subject::new(1, "Algebra I", 77));
//! catalog.upsert(Subject::new(2, "Matemática 1", 91));
//!
//! let topology =
//!     TopologyEngine::new(Arc::clone(&store), Arc::clone(&catalog), RetryPolicy::default());
//! let outcome = topology.add_equivalence(1, 2, "19").unwrap();
//! assert!(outcome.pair_created);
//!
//! let query = QueryEngine::new(store, catalog, 10_000);
//! assert!(query.are_equivalent_by_cycle(1, 2, "19").unwrap());
//! ```

pub mod query;
pub mod retry;
mod store;
pub mod topology;
mod types;

#[cfg(test)]
mod query_tests;

pub use query::QueryEngine;
pub use retry::RetryPolicy;
pub use store::{GraphStore, InMemoryGraphStore, Neighborhood, StageView, WriteBatch};
pub use topology::TopologyEngine;
pub use types::{
    AddOutcome, EquivalenceEdge, GroupRemoval, RemovalKind, Subject, SubjectId,
};
