//! Error types for the semcore-matrix crate.

/// Error type for all fallible operations in the semcore-matrix crate.
///
/// Element coordinates in [`MatrixError::Index`] and
/// [`MatrixError::VectorIndex`] are reported 1-based, matching the way
/// the host environment numbers rows and columns.
#[derive(Debug, Clone, thiserror::Error)]
pub enum MatrixError {
    /// Returned when a (row, col) access falls outside the current shape.
    #[error("requested improper value ({row}, {col}) from ({rows}, {cols}) matrix")]
    Index {
        /// Requested row, 1-based.
        row: usize,
        /// Requested column, 1-based.
        col: usize,
        /// Current number of rows.
        rows: usize,
        /// Current number of columns.
        cols: usize,
    },

    /// Returned when a flat vector access falls outside the buffer.
    #[error("requested improper index ({index}) from vector of length ({len})")]
    VectorIndex {
        /// Requested index, 1-based.
        index: usize,
        /// Number of elements in the vector.
        len: usize,
    },

    /// Returned when operand shapes are incompatible for an operation.
    #[error("non-conformable arguments to {op}: ({}, {}) and ({}, {})", .lhs.0, .lhs.1, .rhs.0, .rhs.1)]
    ShapeMismatch {
        /// Name of the operation.
        op: &'static str,
        /// Shape of the left operand.
        lhs: (usize, usize),
        /// Shape of the right operand.
        rhs: (usize, usize),
    },

    /// Returned when an operation requiring a square matrix gets another shape.
    #[error("{op} requires a square matrix, got ({rows}, {cols})")]
    NotSquare {
        /// Name of the operation.
        op: &'static str,
        /// Number of rows supplied.
        rows: usize,
        /// Number of columns supplied.
        cols: usize,
    },

    /// Returned when LU factorisation meets an exactly zero pivot.
    #[error("matrix is exactly singular: U({pivot}, {pivot}) is zero")]
    Singular {
        /// 1-based position of the zero pivot.
        pivot: usize,
    },

    /// Returned when a matrix that must be positive definite has a
    /// determinant of zero or below.
    #[error("{op} requires a positive definite matrix, determinant is {det}")]
    NotPositiveDefinite {
        /// Name of the operation.
        op: &'static str,
        /// Determinant found.
        det: f64,
    },

    /// Returned when an export target does not match the matrix size.
    #[error("export buffer holds {got} values, matrix has {expected}")]
    ExportSize {
        /// Number of elements in the matrix.
        expected: usize,
        /// Length of the supplied buffer.
        got: usize,
    },

    /// Returned when host data does not match its declared shape.
    #[error("host array holds {got} values, declared shape needs {expected}")]
    HostSize {
        /// Element count implied by the declared shape.
        expected: usize,
        /// Number of values supplied.
        got: usize,
    },

    /// Returned when a buffer cannot be viewed with the requested layout.
    #[error("invalid matrix layout: {0}")]
    Layout(#[from] ndarray::ShapeError),
}
