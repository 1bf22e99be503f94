//! The shallow inverse `Z = (I - A)^-1` of a path-coefficient matrix.
//!
//! Two modes:
//!
//! | Mode | Method | Cost |
//! |------|--------|------|
//! | [`InverseMode::General`] | `Z = I·I - A`, LU factorisation, inversion | O(n³), any non-singular `I - A` |
//! | [`InverseMode::Series`] | truncated Neumann series `Σ_{t=0}^{k} Aᵗ` | k matrix products |
//!
//! The series is exact once `A^(k+1)` is the zero matrix, which holds when
//! the directed graph encoded by `A` has no path longer than `k` edges.
//! The series mode never checks this: an iteration count below the true
//! depth silently returns a truncated sum. [`path_depth`] computes the
//! smallest safe count from the non-zero pattern of `A`.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::blas::gemm;
use crate::error::MatrixError;
use crate::lu::{lu_factor, lu_invert};
use crate::matrix::Matrix;
use crate::order::Transpose;

/// How [`shallow_inverse`] computes `(I - A)^-1`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InverseMode {
    /// General dense inversion via LU.
    #[default]
    General,
    /// Truncated Neumann series with `iterations` products.
    Series {
        /// Number of multiply-accumulate steps.
        iterations: usize,
    },
}

/// Computes `z = (I - a)^-1`.
///
/// `identity` must be the `n x n` identity; its storage order may be
/// toggled to match `a` but its values are unchanged on exit. `ax` is
/// scratch space. In series mode the result always ends up in `z`, copied
/// from the scratch matrix when an odd number of role swaps left it there.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`MatrixError::NotSquare`] | `a` is not square |
/// | [`MatrixError::ShapeMismatch`] | `identity` differs in shape from `a` |
/// | [`MatrixError::Singular`] | general mode, `I - A` is exactly singular; `z` holds no valid result |
#[tracing::instrument(skip(a, z, ax, identity), fields(n = a.rows()))]
pub fn shallow_inverse(
    mode: InverseMode,
    a: &Matrix,
    z: &mut Matrix,
    ax: &mut Matrix,
    identity: &mut Matrix,
) -> Result<(), MatrixError> {
    if !a.is_square() {
        return Err(MatrixError::NotSquare {
            op: "shallow_inverse",
            rows: a.rows(),
            cols: a.cols(),
        });
    }
    if identity.shape() != a.shape() {
        return Err(MatrixError::ShapeMismatch {
            op: "shallow_inverse",
            lhs: a.shape(),
            rhs: identity.shape(),
        });
    }
    if identity.order() != a.order() {
        identity.toggle_storage_order();
    }

    match mode {
        InverseMode::General => {
            debug!("(I - A) inversion using general LU inversion");
            z.copy_from(a);
            gemm(Transpose::No, Transpose::No, 1.0, identity, identity, -1.0, z)?;
            let pivots = lu_factor(z)?;
            lu_invert(z, &pivots)?;
        }
        InverseMode::Series { iterations } => {
            debug!(iterations, "(I - A) inversion using truncated series");
            if ax.order() != a.order() {
                ax.toggle_storage_order();
            }
            z.copy_from(identity);
            {
                let mut cur: &mut Matrix = z;
                let mut next: &mut Matrix = ax;
                // (I + A), I + (I + A)A, ... one product per step.
                for i in 1..=iterations {
                    trace!(iteration = i, iterations, "series step");
                    next.copy_from(identity);
                    gemm(Transpose::No, Transpose::No, 1.0, a, cur, 1.0, next)?;
                    std::mem::swap(&mut cur, &mut next);
                }
            }
            if iterations % 2 == 1 {
                z.copy_from(ax);
            }
        }
    }
    Ok(())
}

/// Length of the longest directed path in the non-zero pattern of `a`,
/// where `a[(i, j)] != 0` is an edge `j -> i`.
///
/// Returns `None` when the pattern contains a cycle (including a non-zero
/// diagonal), in which case no finite series is exact. Otherwise
/// `A^(d+1) = 0` for the returned `d`, so `InverseMode::Series { iterations: d }`
/// reproduces the general inverse.
///
/// # Errors
///
/// Returns [`MatrixError::NotSquare`] if `a` is not square.
pub fn path_depth(a: &Matrix) -> Result<Option<usize>, MatrixError> {
    if !a.is_square() {
        return Err(MatrixError::NotSquare {
            op: "path_depth",
            rows: a.rows(),
            cols: a.cols(),
        });
    }
    let n = a.rows();
    let mut edges: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut in_degree = vec![0usize; n];
    for j in 0..n {
        for i in 0..n {
            if a.get(i, j)? != 0.0 {
                edges[j].push(i);
                in_degree[i] += 1;
            }
        }
    }

    let mut depth = vec![0usize; n];
    let mut queue: VecDeque<usize> = (0..n).filter(|&v| in_degree[v] == 0).collect();
    let mut visited = 0;
    while let Some(v) = queue.pop_front() {
        visited += 1;
        for &i in &edges[v] {
            depth[i] = depth[i].max(depth[v] + 1);
            in_degree[i] -= 1;
            if in_degree[i] == 0 {
                queue.push_back(i);
            }
        }
    }

    if visited < n {
        return Ok(None);
    }
    Ok(Some(depth.into_iter().max().unwrap_or(0)))
}
