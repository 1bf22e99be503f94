//! LU factorisation with partial pivoting and inversion from the factors.
//!
//! Works in place on a column-major buffer. `L` (unit diagonal) is stored
//! below the diagonal and `U` on and above it, as `dgetrf` leaves them.

use tracing::trace;

use crate::error::MatrixError;
use crate::matrix::Matrix;

/// Row interchanges recorded by [`lu_factor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LuPivots {
    /// Row `i` was swapped with row `pivots[i]` at step `i`.
    pivots: Vec<usize>,
    /// Number of actual swaps, for the determinant sign.
    swaps: usize,
}

impl LuPivots {
    /// Pivot row chosen at each step.
    pub fn pivots(&self) -> &[usize] {
        &self.pivots
    }

    /// Number of row swaps performed.
    pub fn swaps(&self) -> usize {
        self.swaps
    }
}

fn require_square(m: &Matrix, op: &'static str) -> Result<usize, MatrixError> {
    if !m.is_square() {
        return Err(MatrixError::NotSquare {
            op,
            rows: m.rows(),
            cols: m.cols(),
        });
    }
    Ok(m.rows())
}

/// Factors `m` in place as `P * m = L * U`.
///
/// The matrix is converted to column-major storage first.
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`MatrixError::NotSquare`] | `m` is not square |
/// | [`MatrixError::Singular`] | a pivot is exactly zero |
pub fn lu_factor(m: &mut Matrix) -> Result<LuPivots, MatrixError> {
    let n = require_square(m, "lu_factor")?;
    m.ensure_column_major();
    let a = m.as_mut_slice();
    let mut pivots = vec![0; n];
    let mut swaps = 0;

    for col in 0..n {
        let mut pivot_row = col;
        let mut max_val = a[col * n + col].abs();
        for row in (col + 1)..n {
            let val = a[col * n + row].abs();
            if val > max_val {
                max_val = val;
                pivot_row = row;
            }
        }
        pivots[col] = pivot_row;

        if pivot_row != col {
            for j in 0..n {
                a.swap(j * n + col, j * n + pivot_row);
            }
            swaps += 1;
        }

        let pivot = a[col * n + col];
        if pivot == 0.0 {
            return Err(MatrixError::Singular { pivot: col + 1 });
        }

        for row in (col + 1)..n {
            a[col * n + row] /= pivot;
        }
        for j in (col + 1)..n {
            let u = a[j * n + col];
            if u == 0.0 {
                continue;
            }
            for row in (col + 1)..n {
                let l = a[col * n + row];
                a[j * n + row] -= l * u;
            }
        }
    }

    trace!(n, swaps, "lu factorisation complete");
    Ok(LuPivots { pivots, swaps })
}

/// Replaces the factors left by [`lu_factor`] with the inverse of the
/// original matrix, solving against each unit vector with the two
/// triangular factors.
///
/// # Errors
///
/// Returns [`MatrixError::NotSquare`] if `m` is not square, or
/// [`MatrixError::ShapeMismatch`] if `pivots` belongs to another size.
pub fn lu_invert(m: &mut Matrix, pivots: &LuPivots) -> Result<(), MatrixError> {
    let n = require_square(m, "lu_invert")?;
    if pivots.pivots.len() != n {
        return Err(MatrixError::ShapeMismatch {
            op: "lu_invert",
            lhs: (n, n),
            rhs: (pivots.pivots.len(), pivots.pivots.len()),
        });
    }
    m.ensure_column_major();
    let lu = m.as_slice().to_vec();
    let mut inv = vec![0.0; n * n];
    let mut b = vec![0.0; n];

    for j in 0..n {
        b.iter_mut().for_each(|v| *v = 0.0);
        b[j] = 1.0;
        for (i, &p) in pivots.pivots.iter().enumerate() {
            b.swap(i, p);
        }
        // Forward substitution with unit-diagonal L.
        for i in 0..n {
            let mut sum = b[i];
            for k in 0..i {
                sum -= lu[k * n + i] * b[k];
            }
            b[i] = sum;
        }
        // Back substitution with U.
        for i in (0..n).rev() {
            let mut sum = b[i];
            for k in (i + 1)..n {
                sum -= lu[k * n + i] * b[k];
            }
            b[i] = sum / lu[i * n + i];
        }
        inv[j * n..(j + 1) * n].copy_from_slice(&b);
    }

    m.as_mut_slice().copy_from_slice(&inv);
    Ok(())
}

/// Inverts `m` in place.
///
/// # Errors
///
/// See [`lu_factor`].
pub fn invert(m: &mut Matrix) -> Result<(), MatrixError> {
    let pivots = lu_factor(m)?;
    lu_invert(m, &pivots)
}

/// Determinant via LU. Exactly singular matrices give `0.0`.
///
/// # Errors
///
/// Returns [`MatrixError::NotSquare`] if `m` is not square.
pub fn determinant(m: &Matrix) -> Result<f64, MatrixError> {
    let n = require_square(m, "determinant")?;
    let mut work = m.clone();
    let pivots = match lu_factor(&mut work) {
        Ok(p) => p,
        Err(MatrixError::Singular { .. }) => return Ok(0.0),
        Err(e) => return Err(e),
    };
    let data = work.as_slice();
    let mut det = if pivots.swaps % 2 == 0 { 1.0 } else { -1.0 };
    for i in 0..n {
        det *= data[i * n + i];
    }
    Ok(det)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blas::multiply;
    use approx::assert_abs_diff_eq;

    fn sample() -> Matrix {
        Matrix::from_rows(&[&[0.0, 2.0, 1.0], &[1.0, 1.0, 0.0], &[3.0, 0.0, 1.0]]).unwrap()
    }

    #[test]
    fn inverse_times_original_is_identity() {
        let a = sample();
        let mut inv = a.clone();
        invert(&mut inv).unwrap();
        let product = multiply(&a, &inv).unwrap();
        assert!(product.max_abs_diff(&Matrix::identity(3)).unwrap() < 1e-12);
    }

    #[test]
    fn factor_needs_pivoting() {
        let mut a = sample();
        let pivots = lu_factor(&mut a).unwrap();
        // |3| is the largest entry of the first column.
        assert_eq!(pivots.pivots()[0], 2);
        assert!(pivots.swaps() >= 1);
    }

    #[test]
    fn singular_reports_pivot() {
        let mut a = Matrix::from_rows(&[&[1.0, 2.0], &[2.0, 4.0]]).unwrap();
        let err = lu_factor(&mut a).unwrap_err();
        assert!(matches!(err, MatrixError::Singular { pivot: 2 }), "got {err:?}");
    }

    #[test]
    fn not_square_rejected() {
        let mut a = Matrix::from_rows(&[&[1.0, 2.0, 3.0]]).unwrap();
        assert!(matches!(
            lu_factor(&mut a),
            Err(MatrixError::NotSquare { rows: 1, cols: 3, .. })
        ));
    }

    #[test]
    fn determinant_known_values() {
        // det = 0*(1-0) - 2*(1-0) + 1*(0-3) = -5
        assert_abs_diff_eq!(determinant(&sample()).unwrap(), -5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(determinant(&Matrix::identity(4)).unwrap(), 1.0, epsilon = 1e-12);
        let singular = Matrix::from_rows(&[&[1.0, 2.0], &[2.0, 4.0]]).unwrap();
        assert_eq!(determinant(&singular).unwrap(), 0.0);
    }

    #[test]
    fn empty_matrix_inverts_trivially() {
        let mut m = Matrix::zero_by_zero();
        invert(&mut m).unwrap();
        assert!(m.is_empty());
    }
}
