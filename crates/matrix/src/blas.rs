//! Dense multiply-accumulate kernels.
//!
//! Every matrix is viewed as a strided `ndarray` view in its own storage
//! order, so operands of mixed layout multiply without copying. The
//! transpose flags follow the BLAS `dgemm` / `dgemv` conventions.

use ndarray::linalg::{general_mat_mul, general_mat_vec_mul};
use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, ShapeBuilder};

use crate::error::MatrixError;
use crate::matrix::Matrix;
use crate::order::{StorageOrder, Transpose};

/// Borrows `m` as a logical `rows x cols` view.
pub fn view(m: &Matrix) -> Result<ArrayView2<'_, f64>, MatrixError> {
    let shape = (m.rows(), m.cols());
    let v = match m.order() {
        StorageOrder::ColMajor => ArrayView2::from_shape(shape.f(), m.as_slice())?,
        StorageOrder::RowMajor => ArrayView2::from_shape(shape, m.as_slice())?,
    };
    Ok(v)
}

/// Mutably borrows `m` as a logical `rows x cols` view.
pub fn view_mut(m: &mut Matrix) -> Result<ArrayViewMut2<'_, f64>, MatrixError> {
    let shape = (m.rows(), m.cols());
    let order = m.order();
    let v = match order {
        StorageOrder::ColMajor => ArrayViewMut2::from_shape(shape.f(), m.as_mut_slice())?,
        StorageOrder::RowMajor => ArrayViewMut2::from_shape(shape, m.as_mut_slice())?,
    };
    Ok(v)
}

fn op(v: ArrayView2<'_, f64>, trans: Transpose) -> ArrayView2<'_, f64> {
    match trans {
        Transpose::No => v,
        Transpose::Yes => v.reversed_axes(),
    }
}

/// `c = alpha * op(a) * op(b) + beta * c`.
///
/// # Errors
///
/// Returns [`MatrixError::ShapeMismatch`] when the inner dimensions differ
/// or `c` does not have the shape of the product.
pub fn gemm(
    trans_a: Transpose,
    trans_b: Transpose,
    alpha: f64,
    a: &Matrix,
    b: &Matrix,
    beta: f64,
    c: &mut Matrix,
) -> Result<(), MatrixError> {
    let av = op(view(a)?, trans_a);
    let bv = op(view(b)?, trans_b);
    let (m, k) = av.dim();
    let (k2, n) = bv.dim();
    if k != k2 {
        return Err(MatrixError::ShapeMismatch {
            op: "gemm",
            lhs: (m, k),
            rhs: (k2, n),
        });
    }
    if c.shape() != (m, n) {
        return Err(MatrixError::ShapeMismatch {
            op: "gemm",
            lhs: (m, n),
            rhs: c.shape(),
        });
    }
    let mut cv = view_mut(c)?;
    general_mat_mul(alpha, &av, &bv, beta, &mut cv);
    Ok(())
}

/// `result = alpha * op(mat) * vec + beta * result`, with `vec` and
/// `result` read as flat vectors.
///
/// # Errors
///
/// Returns [`MatrixError::ShapeMismatch`] when the vector lengths do not
/// conform to `op(mat)`.
pub fn gemv(
    trans: Transpose,
    alpha: f64,
    mat: &Matrix,
    vec: &Matrix,
    beta: f64,
    result: &mut Matrix,
) -> Result<(), MatrixError> {
    let mv = op(view(mat)?, trans);
    let (m, n) = mv.dim();
    if vec.len() != n || result.len() != m {
        return Err(MatrixError::ShapeMismatch {
            op: "gemv",
            lhs: (m, n),
            rhs: (vec.len(), result.len()),
        });
    }
    let x = ArrayView1::from(vec.as_slice());
    let mut y = ArrayViewMut1::from(result.as_mut_slice());
    general_mat_vec_mul(alpha, &mv, &x, beta, &mut y);
    Ok(())
}

/// Returns the product `a * b` as a new column-major matrix.
///
/// # Errors
///
/// Returns [`MatrixError::ShapeMismatch`] for non-conformable operands.
pub fn multiply(a: &Matrix, b: &Matrix) -> Result<Matrix, MatrixError> {
    if a.cols() != b.rows() {
        return Err(MatrixError::ShapeMismatch {
            op: "multiply",
            lhs: a.shape(),
            rhs: b.shape(),
        });
    }
    let mut out = Matrix::zeros(a.rows(), b.cols(), StorageOrder::ColMajor);
    gemm(Transpose::No, Transpose::No, 1.0, a, b, 0.0, &mut out)?;
    Ok(out)
}
