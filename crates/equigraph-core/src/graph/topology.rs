//! Group topology engine: cycle-preserving insertion and removal.
//!
//! Insertion always happens immediately after the source subject, so both
//! mutations touch an O(1) neighborhood regardless of group size. The price
//! of that locality is a restricted topology: linking a subject that already
//! belongs to a group would require merging two cycles, which is rejected
//! with a conflict instead of attempted.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::catalog::{ensure_exists, SubjectCatalog};
use crate::error::{Error, Result};

use super::retry::RetryPolicy;
use super::store::{GraphStore, WriteBatch};
use super::types::{
    validate_stage, AddOutcome, EquivalenceEdge, GroupRemoval, RemovalKind, SubjectId,
};

/// Mutating half of the engine: links subjects into per-stage cycles and
/// detaches them again, one optimistic transaction per call.
pub struct TopologyEngine<S, C> {
    store: Arc<S>,
    catalog: Arc<C>,
    retry: RetryPolicy,
}

impl<S: GraphStore, C: SubjectCatalog> TopologyEngine<S, C> {
    /// Creates a topology engine over the given store and catalog.
    pub fn new(store: Arc<S>, catalog: Arc<C>, retry: RetryPolicy) -> Self {
        Self {
            store,
            catalog,
            retry,
        }
    }

    /// Declares `to` equivalent to `from` at `stage`.
    ///
    /// Two isolated subjects become a pair (edges in both directions); when
    /// `from` already belongs to a group, `to` is spliced into the cycle
    /// right after it. `to` must not belong to any group at this stage —
    /// merging two groups is rejected with [`Error::AlreadyGrouped`].
    ///
    /// # Errors
    ///
    /// [`Error::SelfEquivalence`] when `from == to`, [`Error::InvalidStage`]
    /// for an empty stage tag, [`Error::SubjectNotFound`] for unknown
    /// subjects, [`Error::AlreadyGrouped`] when `to` is grouped, and
    /// [`Error::Unavailable`] when the retry budget is exhausted under
    /// contention.
    pub fn add_equivalence(
        &self,
        from: SubjectId,
        to: SubjectId,
        stage: &str,
    ) -> Result<AddOutcome> {
        let stage = validate_stage(stage)?;
        if from == to {
            return Err(Error::SelfEquivalence(from));
        }
        ensure_exists(self.catalog.as_ref(), from)?;
        ensure_exists(self.catalog.as_ref(), to)?;

        self.retry
            .run("add_equivalence", || self.try_add(from, to, stage))
    }

    fn try_add(&self, from: SubjectId, to: SubjectId, stage: &str) -> Result<AddOutcome> {
        let target = self.store.neighborhood(to, stage);
        if target.is_grouped() {
            return Err(Error::AlreadyGrouped {
                subject: to,
                stage: stage.to_string(),
            });
        }

        let origin = self.store.neighborhood(from, stage);
        let origin_out = single_edge(&origin.outgoing, from, stage, "outgoing")?;
        let origin_in = single_edge(&origin.incoming, from, stage, "incoming")?;

        match (origin_out, origin_in) {
            (None, None) => {
                // Base case: two isolated subjects start a new 2-cycle.
                let batch = WriteBatch::for_stage(stage)
                    .expect(&origin)
                    .expect(&target)
                    .create_edge(from, to)
                    .create_edge(to, from);
                self.store.apply(batch)?;
                debug!(from, to, stage, "created equivalence pair");
                Ok(AddOutcome {
                    pair_created: true,
                    spliced: false,
                })
            }
            (Some(out), _) => {
                // Splice `to` in right after `from`; the rest of the cycle
                // is untouched.
                let succ = out.to();
                let succ_neighborhood = self.store.neighborhood(succ, stage);
                let batch = WriteBatch::for_stage(stage)
                    .expect(&origin)
                    .expect(&target)
                    .expect(&succ_neighborhood)
                    .delete_edge(from, succ)
                    .create_edge(from, to)
                    .create_edge(to, succ);
                self.store.apply(batch)?;
                debug!(from, to, succ, stage, "spliced subject into cycle");
                Ok(AddOutcome {
                    pair_created: false,
                    spliced: true,
                })
            }
            (None, Some(_)) => {
                warn!(subject = from, stage, "half-linked subject, aborting splice");
                Err(Error::CorruptTopology(format!(
                    "subject {from} has an incoming edge but no outgoing edge at stage '{stage}'"
                )))
            }
        }
    }

    /// Detaches `subject` from its group at `stage`, repairing the cycle.
    ///
    /// Returns `Ok(None)` when the subject has no equivalence at this stage
    /// — a negative result, not an error. A pair dissolves entirely (both
    /// members end isolated); a larger cycle is closed back up with a direct
    /// predecessor-to-successor edge.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidStage`], [`Error::SubjectNotFound`], and
    /// [`Error::Unavailable`] as for [`add_equivalence`](Self::add_equivalence).
    pub fn remove_from_group(
        &self,
        subject: SubjectId,
        stage: &str,
    ) -> Result<Option<GroupRemoval>> {
        let stage = validate_stage(stage)?;
        ensure_exists(self.catalog.as_ref(), subject)?;

        self.retry
            .run("remove_from_group", || self.try_remove(subject, stage))
    }

    fn try_remove(&self, subject: SubjectId, stage: &str) -> Result<Option<GroupRemoval>> {
        let neighborhood = self.store.neighborhood(subject, stage);
        if neighborhood.is_isolated() {
            return Ok(None);
        }

        let out = single_edge(&neighborhood.outgoing, subject, stage, "outgoing")?;
        let inc = single_edge(&neighborhood.incoming, subject, stage, "incoming")?;
        let (Some(out), Some(inc)) = (out, inc) else {
            warn!(subject, stage, "half-linked subject, aborting removal");
            return Err(Error::CorruptTopology(format!(
                "subject {subject} is half-linked at stage '{stage}'"
            )));
        };
        let pred = inc.from();
        let succ = out.to();

        if pred == succ {
            // Group of two: deleting either side's membership destroys the
            // pair's own edges, so the survivor ends isolated as well.
            let partner = self.store.neighborhood(pred, stage);
            let batch = WriteBatch::for_stage(stage)
                .expect(&neighborhood)
                .expect(&partner)
                .delete_edge(pred, subject)
                .delete_edge(subject, succ);
            self.store.apply(batch)?;
            debug!(subject, partner = pred, stage, "dissolved equivalence pair");
            Ok(Some(GroupRemoval {
                kind: RemovalKind::Pair,
                removed_id: subject,
                predecessor_id: pred,
                successor_id: succ,
            }))
        } else {
            let pred_neighborhood = self.store.neighborhood(pred, stage);
            let succ_neighborhood = self.store.neighborhood(succ, stage);
            let batch = WriteBatch::for_stage(stage)
                .expect(&neighborhood)
                .expect(&pred_neighborhood)
                .expect(&succ_neighborhood)
                .delete_edge(pred, subject)
                .delete_edge(subject, succ)
                .create_edge(pred, succ);
            self.store.apply(batch)?;
            debug!(subject, pred, succ, stage, "repaired cycle after removal");
            Ok(Some(GroupRemoval {
                kind: RemovalKind::Cycle,
                removed_id: subject,
                predecessor_id: pred,
                successor_id: succ,
            }))
        }
    }
}

/// Extracts the at-most-one edge a healthy neighborhood may hold in one
/// direction, failing on a degree-invariant breach.
fn single_edge<'a>(
    edges: &'a [EquivalenceEdge],
    subject: SubjectId,
    stage: &str,
    direction: &str,
) -> Result<Option<&'a EquivalenceEdge>> {
    match edges {
        [] => Ok(None),
        [edge] => Ok(Some(edge)),
        _ => {
            warn!(
                subject,
                stage,
                direction,
                count = edges.len(),
                "degree invariant broken, aborting mutation"
            );
            Err(Error::CorruptTopology(format!(
                "subject {subject} has {} {direction} edges at stage '{stage}'",
                edges.len()
            )))
        }
    }
}
