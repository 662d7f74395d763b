//! Error types for the equivalence-group graph engine.

use thiserror::Error;

use crate::graph::SubjectId;

/// Result type alias using the crate's [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the engine and its graph store adapter.
#[derive(Error, Debug)]
pub enum Error {
    /// A subject cannot be declared equivalent to itself.
    #[error("subject {0} cannot be equivalent to itself")]
    SelfEquivalence(SubjectId),

    /// Stage tags partition the edge space and must be non-empty.
    #[error("stage tag cannot be empty or whitespace-only")]
    InvalidStage,

    /// The subject is unknown to the catalog.
    #[error("subject {0} not found")]
    SubjectNotFound(SubjectId),

    /// The target subject already belongs to a group at this stage.
    ///
    /// Merging two pre-existing groups is unsupported and rejected, never
    /// performed silently.
    #[error("subject {subject} already belongs to an equivalence group at stage '{stage}'")]
    AlreadyGrouped {
        /// The subject that was found grouped.
        subject: SubjectId,
        /// The stage the conflict was detected at.
        stage: String,
    },

    /// A write batch was rejected because a concurrent commit invalidated
    /// the neighborhood it was derived from.
    #[error("transaction conflict: {0}")]
    TxnConflict(String),

    /// The retry budget for a contended mutation is exhausted.
    #[error("operation aborted after {attempts} contended attempts")]
    Unavailable {
        /// Number of optimistic attempts that were made.
        attempts: u32,
    },

    /// The per-stage degree invariant was found broken while reading.
    ///
    /// The mutation that observed this aborts without writing anything.
    #[error("corrupt topology: {0}")]
    CorruptTopology(String),
}

impl Error {
    /// Returns true when the failed operation may be retried on a fresh
    /// snapshot (commit-time conflicts only).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TxnConflict(_))
    }
}
