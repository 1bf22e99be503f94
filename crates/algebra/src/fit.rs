//! Fit-function payloads: scalar objectives computed from argument nodes.

use std::fmt;
use std::sync::Arc;

use semcore_matrix::{Matrix, MatrixError, StorageOrder, Transpose, determinant, gemm, invert};

use crate::node::NodeId;

/// A scalar objective over the current values of its argument nodes.
///
/// Implementations must be pure: the same argument values give the same
/// result, so a fit node can be memoised like an algebra.
pub trait Objective: fmt::Debug + Send + Sync {
    /// Short name used in descriptions and diagnostics.
    fn name(&self) -> &str;

    /// Evaluates the objective.
    ///
    /// # Errors
    ///
    /// [`MatrixError::Singular`] is recorded as a deferred condition by the
    /// caller; any other error aborts the recompute.
    fn evaluate(&self, args: &[&Matrix]) -> Result<f64, MatrixError>;
}

/// Fit-function payload of a node: an objective and its argument nodes.
#[derive(Debug, Clone)]
pub struct FitFunction {
    pub(crate) objective: Arc<dyn Objective>,
    pub(crate) args: Vec<NodeId>,
}

impl FitFunction {
    /// The objective.
    pub fn objective(&self) -> &dyn Objective {
        self.objective.as_ref()
    }

    /// Argument nodes, in order.
    pub fn args(&self) -> &[NodeId] {
        &self.args
    }
}

/// Maximum-likelihood discrepancy between an observed covariance `S` and
/// the expected covariance `Σ` given as the single argument:
///
/// `F = ln|Σ| + tr(S Σ⁻¹) - ln|S| - p`
///
/// A `Σ` with non-positive determinant gives `+inf`.
#[derive(Debug, Clone)]
pub struct MaximumLikelihood {
    observed: Matrix,
    log_det_observed: f64,
}

impl MaximumLikelihood {
    /// Creates the objective for an observed covariance matrix.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::NotSquare`] for a non-square `observed`, or
    /// [`MatrixError::NotPositiveDefinite`] when its determinant is not
    /// positive.
    pub fn new(observed: Matrix) -> Result<Self, MatrixError> {
        let det = determinant(&observed)?;
        if det <= 0.0 {
            return Err(MatrixError::NotPositiveDefinite { op: "ml", det });
        }
        Ok(Self {
            observed,
            log_det_observed: det.ln(),
        })
    }
}

impl Objective for MaximumLikelihood {
    fn name(&self) -> &str {
        "ml"
    }

    fn evaluate(&self, args: &[&Matrix]) -> Result<f64, MatrixError> {
        let Some(&expected) = args.first() else {
            return Err(MatrixError::ShapeMismatch {
                op: "ml",
                lhs: self.observed.shape(),
                rhs: (0, 0),
            });
        };
        if expected.shape() != self.observed.shape() {
            return Err(MatrixError::ShapeMismatch {
                op: "ml",
                lhs: self.observed.shape(),
                rhs: expected.shape(),
            });
        }
        let det = determinant(expected)?;
        if det <= 0.0 {
            return Ok(f64::INFINITY);
        }
        let mut inverse = expected.clone();
        invert(&mut inverse)?;
        let p = expected.rows();
        let mut product = Matrix::zeros(p, p, StorageOrder::ColMajor);
        gemm(Transpose::No, Transpose::No, 1.0, &self.observed, &inverse, 0.0, &mut product)?;
        let trace: f64 = (0..p).map(|i| product.get(i, i)).sum::<Result<f64, _>>()?;
        Ok(det.ln() + trace - self.log_det_observed - p as f64)
    }
}
