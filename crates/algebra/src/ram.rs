//! RAM expectation: `Z = (I - A)^-1` and the expected covariance
//! `F Z S Zᵀ Fᵀ` over nodes of a [`ModelState`].
//!
//! ```text
//! A (path coefficients) ──► shallow inverse ──► Z
//!                                               │
//! S (symmetric paths) ─────────────────────────►├──► F Z S Zᵀ Fᵀ
//! F (filter) ──────────────────────────────────►┘
//! ```

use semcore_matrix::{InverseMode, Matrix, MatrixError, StorageOrder, Transpose, gemm, path_depth};
use tracing::debug;

use crate::diagnostics::{DeferredError, Diagnostics};
use crate::error::AlgebraError;
use crate::node::NodeId;
use crate::state::ModelState;

/// Computes `z = (I - a)^-1`, recording exact singularity as
/// [`DeferredError::SingularIMinusA`] instead of failing. `z` holds no
/// valid result after a recorded singularity.
///
/// # Errors
///
/// Returns [`AlgebraError::Matrix`] when `a` is not square or `identity`
/// does not match it.
pub fn shallow_inverse(
    diagnostics: &mut Diagnostics,
    mode: InverseMode,
    a: &Matrix,
    z: &mut Matrix,
    ax: &mut Matrix,
    identity: &mut Matrix,
) -> Result<(), AlgebraError> {
    match semcore_matrix::shallow_inverse(mode, a, z, ax, identity) {
        Ok(()) => Ok(()),
        Err(MatrixError::Singular { pivot }) => {
            diagnostics.record(DeferredError::SingularIMinusA { pivot });
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// How the series depth of the shallow inverse is chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DepthSelection {
    /// Dense LU inversion.
    #[default]
    General,
    /// Neumann series with a fixed number of steps. Truncates silently when
    /// `A` has longer paths; zero steps give `Z = I`.
    Fixed(usize),
    /// Neumann series with the longest path of `A` as depth, falling back
    /// to [`DepthSelection::General`] when `A` has a cycle.
    Auto,
}

/// Configuration of a [`RamExpectation`].
///
/// # Example
///
/// ```
/// use semcore_algebra::{DepthSelection, RamConfig};
///
/// let config = RamConfig::new().with_series(4);
/// assert_eq!(config.depth(), DepthSelection::Fixed(4));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RamConfig {
    depth: DepthSelection,
}

impl RamConfig {
    /// General inversion.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses a fixed series depth.
    pub fn with_series(mut self, iterations: usize) -> Self {
        self.depth = DepthSelection::Fixed(iterations);
        self
    }

    /// Derives the series depth from the pattern of `A`.
    pub fn with_auto_depth(mut self) -> Self {
        self.depth = DepthSelection::Auto;
        self
    }

    /// Uses general inversion.
    pub fn with_general(mut self) -> Self {
        self.depth = DepthSelection::General;
        self
    }

    /// Depth selection.
    pub fn depth(&self) -> DepthSelection {
        self.depth
    }

    /// Inversion mode for a concrete `a`.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Matrix`] when `a` is not square.
    pub fn mode_for(&self, a: &Matrix) -> Result<InverseMode, AlgebraError> {
        let mode = match self.depth {
            DepthSelection::General => InverseMode::General,
            DepthSelection::Fixed(iterations) => InverseMode::Series { iterations },
            DepthSelection::Auto => match path_depth(a)? {
                Some(iterations) => InverseMode::Series { iterations },
                None => {
                    debug!("path matrix is cyclic, using general inversion");
                    InverseMode::General
                }
            },
        };
        Ok(mode)
    }
}

/// Expected covariance of a RAM model whose `A`, `S` and `F` matrices are
/// nodes of a state.
///
/// Scratch buffers are kept between calls, so repeated evaluation during
/// an optimisation does not reallocate once shapes settle.
#[derive(Debug, Clone)]
pub struct RamExpectation {
    a: NodeId,
    s: NodeId,
    f: NodeId,
    config: RamConfig,
    z: Matrix,
    next: Matrix,
    ax: Matrix,
    identity: Matrix,
}

impl RamExpectation {
    /// Creates the expectation.
    pub fn new(a: NodeId, s: NodeId, f: NodeId, config: RamConfig) -> Self {
        Self {
            a,
            s,
            f,
            config,
            z: Matrix::zero_by_zero().with_name("Z"),
            next: Matrix::zero_by_zero().with_name("Z"),
            ax: Matrix::zero_by_zero(),
            identity: Matrix::zero_by_zero(),
        }
    }

    /// Configuration.
    pub fn config(&self) -> &RamConfig {
        &self.config
    }

    /// `(I - A)^-1` from the last successful [`compute`](RamExpectation::compute).
    /// A singular `I - A` leaves it unchanged.
    pub fn inverse(&self) -> &Matrix {
        &self.z
    }

    /// Recomputes `A`, `S` and `F`, then returns the expected covariance.
    ///
    /// Returns `Ok(None)` when `I - A` is singular; the condition is
    /// recorded in the state's diagnostics.
    ///
    /// # Errors
    ///
    /// Structural failures of the recompute, or
    /// [`AlgebraError::Matrix`] when the shapes of `A`, `S` and `F` do not
    /// fit together.
    #[tracing::instrument(skip(self, state))]
    pub fn compute(&mut self, state: &mut ModelState) -> Result<Option<Matrix>, AlgebraError> {
        state.recompute(self.a)?;
        state.recompute(self.s)?;
        state.recompute(self.f)?;
        let a = state.value(self.a)?.clone();
        let n = a.rows();
        if self.identity.shape() != (n, n) {
            self.identity = Matrix::identity(n);
            self.ax = Matrix::zeros(n, n, StorageOrder::ColMajor);
        }

        let mode = self.config.mode_for(&a)?;
        debug!(?mode, n, "ram inverse");
        let before = state.diagnostics().len();
        shallow_inverse(
            state.diagnostics_mut(),
            mode,
            &a,
            &mut self.next,
            &mut self.ax,
            &mut self.identity,
        )?;
        if state.diagnostics().len() > before {
            return Ok(None);
        }
        std::mem::swap(&mut self.z, &mut self.next);

        let s = state.value(self.s)?;
        let f = state.value(self.f)?;
        let mut zs = Matrix::zeros(n, s.cols(), StorageOrder::ColMajor);
        gemm(Transpose::No, Transpose::No, 1.0, &self.z, s, 0.0, &mut zs)?;
        let mut zszt = Matrix::zeros(n, n, StorageOrder::ColMajor);
        gemm(Transpose::No, Transpose::Yes, 1.0, &zs, &self.z, 0.0, &mut zszt)?;
        let mut fzszt = Matrix::zeros(f.rows(), n, StorageOrder::ColMajor);
        gemm(Transpose::No, Transpose::No, 1.0, f, &zszt, 0.0, &mut fzszt)?;
        let mut cov = Matrix::zeros(f.rows(), f.rows(), StorageOrder::ColMajor);
        gemm(Transpose::No, Transpose::Yes, 1.0, &fzszt, f, 0.0, &mut cov)?;
        Ok(Some(cov.with_name("expected covariance")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn chain() -> Matrix {
        Matrix::from_rows(&[&[0.0, 0.0, 0.0], &[0.5, 0.0, 0.0], &[0.0, 2.0, 0.0]]).unwrap()
    }

    #[test]
    fn config_modes() {
        let a = chain();
        assert_eq!(RamConfig::new().mode_for(&a).unwrap(), InverseMode::General);
        assert_eq!(
            RamConfig::new().with_series(3).mode_for(&a).unwrap(),
            InverseMode::Series { iterations: 3 }
        );
        assert_eq!(
            RamConfig::new().with_auto_depth().mode_for(&a).unwrap(),
            InverseMode::Series { iterations: 2 }
        );
        let cyclic = Matrix::from_rows(&[&[0.0, 0.5], &[0.5, 0.0]]).unwrap();
        assert_eq!(
            RamConfig::new().with_auto_depth().mode_for(&cyclic).unwrap(),
            InverseMode::General
        );
        assert_eq!(RamConfig::new().with_series(2).with_general().depth(), DepthSelection::General);
    }

    #[test]
    fn zero_depth_gives_identity() {
        let mut state = ModelState::new();
        let a = state.add_matrix(chain());
        let s = state.add_matrix(Matrix::identity(3));
        let f = state.add_matrix(Matrix::identity(3));
        let config = RamConfig::new().with_series(0);
        assert_eq!(config.mode_for(&chain()).unwrap(), InverseMode::Series { iterations: 0 });
        let mut ram = RamExpectation::new(a, s, f, config);
        let cov = ram.compute(&mut state).unwrap().unwrap();
        assert_eq!(ram.inverse().max_abs_diff(&Matrix::identity(3)).unwrap(), 0.0);
        assert_eq!(cov.max_abs_diff(&Matrix::identity(3)).unwrap(), 0.0);
    }

    #[test]
    fn wrapper_defers_singularity() {
        let mut diagnostics = Diagnostics::new();
        let a = Matrix::identity(2);
        let mut z = Matrix::zeros(2, 2, StorageOrder::ColMajor);
        let mut ax = Matrix::zeros(2, 2, StorageOrder::ColMajor);
        let mut identity = Matrix::identity(2);
        shallow_inverse(&mut diagnostics, InverseMode::General, &a, &mut z, &mut ax, &mut identity)
            .unwrap();
        assert_eq!(
            diagnostics.deferred(),
            &[DeferredError::SingularIMinusA { pivot: 1 }]
        );
    }

    #[test]
    fn wrapper_propagates_shape_errors() {
        let mut diagnostics = Diagnostics::new();
        let a = Matrix::zeros(2, 3, StorageOrder::ColMajor);
        let mut z = Matrix::zero_by_zero();
        let mut ax = Matrix::zero_by_zero();
        let mut identity = Matrix::identity(2);
        let mode = InverseMode::General;
        let err = shallow_inverse(&mut diagnostics, mode, &a, &mut z, &mut ax, &mut identity)
            .unwrap_err();
        assert!(matches!(err, AlgebraError::Matrix(MatrixError::NotSquare { .. })));
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn expectation_of_single_path() {
        // x1 -> x2 with coefficient b, unit variances
        let b = 0.8;
        let mut state = ModelState::new();
        let a = Matrix::from_rows(&[&[0.0, 0.0], &[b, 0.0]]).unwrap();
        let a = state.add_matrix(a.with_name("A"));
        let s = state.add_matrix(Matrix::identity(2).with_name("S"));
        let f = state.add_matrix(Matrix::identity(2).with_name("F"));
        let mut ram = RamExpectation::new(a, s, f, RamConfig::new().with_auto_depth());
        let cov = ram.compute(&mut state).unwrap().unwrap();
        assert_abs_diff_eq!(cov.get(0, 0).unwrap(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(cov.get(1, 0).unwrap(), b, epsilon = 1e-12);
        assert_abs_diff_eq!(cov.get(1, 1).unwrap(), b * b + 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ram.inverse().get(1, 0).unwrap(), b, epsilon = 1e-12);
    }

    #[test]
    fn filter_selects_observed() {
        let mut state = ModelState::new();
        let a = state.add_matrix(chain());
        let s = state.add_matrix(Matrix::identity(3));
        let f = state.add_matrix(Matrix::from_rows(&[&[0.0, 1.0, 0.0], &[0.0, 0.0, 1.0]]).unwrap());
        let mut ram = RamExpectation::new(a, s, f, RamConfig::new());
        let cov = ram.compute(&mut state).unwrap().unwrap();
        assert_eq!(cov.shape(), (2, 2));
        // var(x2) = 0.25 + 1, cov(x2, x3) = 2 var(x2), var(x3) = 4 var(x2) + 1
        assert_abs_diff_eq!(cov.get(0, 0).unwrap(), 1.25, epsilon = 1e-12);
        assert_abs_diff_eq!(cov.get(0, 1).unwrap(), 2.5, epsilon = 1e-12);
        assert_abs_diff_eq!(cov.get(1, 1).unwrap(), 6.0, epsilon = 1e-12);
    }

    #[test]
    fn singular_returns_none() {
        let mut state = ModelState::new();
        let a = state.add_matrix(Matrix::identity(2));
        let s = state.add_matrix(Matrix::identity(2));
        let f = state.add_matrix(Matrix::identity(2));
        let mut ram = RamExpectation::new(a, s, f, RamConfig::new());
        assert!(ram.compute(&mut state).unwrap().is_none());
        assert_eq!(state.take_deferred().len(), 1);
    }

    #[test]
    fn singular_keeps_previous_inverse() {
        let mut state = ModelState::new();
        let a = Matrix::from_rows(&[&[0.0, 0.0], &[0.5, 0.0]]).unwrap();
        let a = state.add_matrix(a.with_name("A"));
        let s = state.add_matrix(Matrix::identity(2));
        let f = state.add_matrix(Matrix::identity(2));
        let mut ram = RamExpectation::new(a, s, f, RamConfig::new());
        ram.compute(&mut state).unwrap().unwrap();
        let good = ram.inverse().clone();

        state.set_element(a, 0, 0, 1.0).unwrap();
        state.set_element(a, 1, 0, 0.0).unwrap();
        assert!(ram.compute(&mut state).unwrap().is_none());
        assert_eq!(ram.inverse().max_abs_diff(&good).unwrap(), 0.0);
        assert_abs_diff_eq!(ram.inverse().get(1, 0).unwrap(), 0.5, epsilon = 1e-12);
    }
}
