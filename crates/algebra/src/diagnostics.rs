//! Deferred numeric conditions recorded on a model state.
//!
//! A batch of evaluations (for example one per perturbed parameter vector)
//! keeps running when a single evaluation meets a singular matrix. The
//! condition is recorded here and inspected once the batch is done.

use tracing::warn;

/// A recoverable numeric condition. The value of the node involved is not
/// valid until the condition is cleared by a successful recompute.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeferredError {
    /// General-mode `(I - A)^-1` met an exactly singular `I - A`.
    #[error("(I-A) is exactly singular (zero pivot at {pivot})")]
    SingularIMinusA {
        /// 1-based position of the zero pivot.
        pivot: usize,
    },

    /// An operator needing an inverse met an exactly singular argument.
    #[error("'{node}': {op} of an exactly singular matrix (zero pivot at {pivot})")]
    SingularOperator {
        /// Node being computed.
        node: String,
        /// Operator name.
        op: &'static str,
        /// 1-based position of the zero pivot.
        pivot: usize,
    },

    /// A fit objective met an exactly singular matrix.
    #[error("'{node}': objective '{objective}' met an exactly singular matrix")]
    SingularObjective {
        /// Node being computed.
        node: String,
        /// Objective name.
        objective: String,
    },
}

/// Collection of [`DeferredError`]s, in the order they were recorded.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    deferred: Vec<DeferredError>,
}

impl Diagnostics {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a condition and logs it at `warn` level.
    pub fn record(&mut self, error: DeferredError) {
        warn!(%error, "deferred numeric error");
        self.deferred.push(error);
    }

    /// Returns `true` when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.deferred.is_empty()
    }

    /// Number of recorded conditions.
    pub fn len(&self) -> usize {
        self.deferred.len()
    }

    /// Recorded conditions, oldest first.
    pub fn deferred(&self) -> &[DeferredError] {
        &self.deferred
    }

    /// Removes and returns all recorded conditions.
    pub fn take(&mut self) -> Vec<DeferredError> {
        std::mem::take(&mut self.deferred)
    }
}
