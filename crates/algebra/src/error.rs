//! Error types for the semcore-algebra crate.

use semcore_matrix::MatrixError;

/// Error type for all fallible operations in the semcore-algebra crate.
///
/// These are structural failures: they abort the enclosing recompute.
/// Numeric singularity is not reported here but recorded as a
/// [`DeferredError`](crate::DeferredError) on the model state.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AlgebraError {
    /// Matrix-level failure (index, shape).
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    /// Returned when a node handle does not belong to the state.
    #[error("unknown node handle {id}")]
    UnknownNode {
        /// Raw handle value.
        id: usize,
    },

    /// Returned when a node name is not registered.
    #[error("no node named '{name}'")]
    UnknownName {
        /// Requested name.
        name: String,
    },

    /// Returned when an opcode or operator name has no table entry.
    #[error("unknown operator '{op}'")]
    UnknownOpcode {
        /// Opcode or name as supplied.
        op: String,
    },

    /// Returned when an opcode list refers to a matrix index out of range.
    #[error("opcode references matrix {index}, but only {count} matrices exist")]
    UnknownMatrix {
        /// Referenced index.
        index: usize,
        /// Number of registered matrices.
        count: usize,
    },

    /// Returned when an opcode list refers to an algebra index out of range.
    #[error("opcode references algebra {index}, but only {count} algebras exist")]
    UnknownAlgebra {
        /// Referenced index.
        index: usize,
        /// Number of registered algebras.
        count: usize,
    },

    /// Returned when an opcode list ends before all arguments are read.
    #[error("opcode list for '{name}' ends early at position {position}")]
    TruncatedSpec {
        /// Algebra being built.
        name: String,
        /// Position where another opcode was expected.
        position: usize,
    },

    /// Returned when opcodes remain after the expression is complete.
    #[error("opcode list for '{name}' has {extra} trailing values")]
    TrailingOpcodes {
        /// Algebra being built.
        name: String,
        /// Number of unconsumed values.
        extra: usize,
    },

    /// Returned when an operator receives the wrong number of arguments.
    #[error("operator '{op}' takes {expected} arguments, got {got}")]
    Arity {
        /// Operator name.
        op: &'static str,
        /// Declared arity.
        expected: String,
        /// Supplied argument count.
        got: usize,
    },

    /// Returned when evaluation reaches a node that is already being evaluated.
    #[error("dependency cycle through '{node}'")]
    Cycle {
        /// Node at which the cycle was detected.
        node: String,
    },

    /// Returned when a population edge writes outside its destination.
    #[error(
        "population of '{node}' writes ({row}, {col}) outside its ({rows}, {cols}) shape"
    )]
    PopulateOutOfBounds {
        /// Destination node.
        node: String,
        /// Destination row, 1-based.
        row: usize,
        /// Destination column, 1-based.
        col: usize,
        /// Destination rows.
        rows: usize,
        /// Destination columns.
        cols: usize,
    },

    /// Returned when population edges are attached to a computed node.
    #[error("population edges need a plain matrix, '{node}' is computed")]
    PopulateTarget {
        /// Destination node.
        node: String,
    },

    /// Returned when a parameter vector has the wrong length.
    #[error("expected {expected} free parameter values, got {got}")]
    ParameterCount {
        /// Number of registered free parameters.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },

    /// Returned when a fit objective fails for a non-numeric reason.
    #[error("objective '{name}' failed: {reason}")]
    Objective {
        /// Objective name.
        name: String,
        /// Failure description.
        reason: String,
    },

    /// Returned when a configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
