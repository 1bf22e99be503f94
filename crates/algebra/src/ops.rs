//! Operator implementations.
//!
//! Every function reads its arguments and returns a freshly allocated
//! result; arguments are never modified.

use semcore_matrix::{
    InverseMode, Matrix, MatrixError, StorageOrder, Transpose, determinant, gemm, invert,
    multiply as mat_mul, shallow_inverse,
};

fn shape_error(op: &'static str, a: &Matrix, b: &Matrix) -> MatrixError {
    MatrixError::ShapeMismatch {
        op,
        lhs: a.shape(),
        rhs: b.shape(),
    }
}

fn require_square(op: &'static str, m: &Matrix) -> Result<usize, MatrixError> {
    if !m.is_square() {
        return Err(MatrixError::NotSquare {
            op,
            rows: m.rows(),
            cols: m.cols(),
        });
    }
    Ok(m.rows())
}

fn scalar(value: f64) -> Matrix {
    let mut out = Matrix::zeros(1, 1, StorageOrder::ColMajor);
    out.as_mut_slice()[0] = value;
    out
}

/// Element-wise combination. A `1 x 1` operand is broadcast.
fn zip_with(
    op: &'static str,
    a: &Matrix,
    b: &Matrix,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Matrix, MatrixError> {
    let av = a.to_col_major_vec();
    let bv = b.to_col_major_vec();
    let (shape, data) = if a.shape() == b.shape() {
        (a.shape(), av.iter().zip(&bv).map(|(&x, &y)| f(x, y)).collect())
    } else if a.len() == 1 {
        (b.shape(), bv.iter().map(|&y| f(av[0], y)).collect())
    } else if b.len() == 1 {
        (a.shape(), av.iter().map(|&x| f(x, bv[0])).collect())
    } else {
        return Err(shape_error(op, a, b));
    };
    Matrix::from_vec(shape.0, shape.1, StorageOrder::ColMajor, data)
}

/// `t(a)`.
pub fn transpose(a: &Matrix) -> Result<Matrix, MatrixError> {
    let mut out = a.clone();
    out.transpose();
    Ok(out)
}

/// `solve(a)`: the inverse of a square matrix.
pub fn solve(a: &Matrix) -> Result<Matrix, MatrixError> {
    require_square("solve", a)?;
    let mut out = a.clone();
    invert(&mut out)?;
    Ok(out)
}

/// `a %*% b`.
pub fn multiply(a: &Matrix, b: &Matrix) -> Result<Matrix, MatrixError> {
    mat_mul(a, b)
}

/// `a * b`, element-wise.
pub fn elem_multiply(a: &Matrix, b: &Matrix) -> Result<Matrix, MatrixError> {
    zip_with("elem_multiply", a, b, |x, y| x * y)
}

/// `a / b`, element-wise.
pub fn elem_divide(a: &Matrix, b: &Matrix) -> Result<Matrix, MatrixError> {
    zip_with("elem_divide", a, b, |x, y| x / y)
}

/// `a + b`.
pub fn add(a: &Matrix, b: &Matrix) -> Result<Matrix, MatrixError> {
    zip_with("add", a, b, |x, y| x + y)
}

/// `a - b`.
pub fn subtract(a: &Matrix, b: &Matrix) -> Result<Matrix, MatrixError> {
    zip_with("subtract", a, b, |x, y| x - y)
}

/// `-a`.
pub fn negate(a: &Matrix) -> Result<Matrix, MatrixError> {
    let data = a.to_col_major_vec().into_iter().map(|x| -x).collect();
    Matrix::from_vec(a.rows(), a.cols(), StorageOrder::ColMajor, data)
}

/// Kronecker product `a %x% b`.
pub fn kronecker(a: &Matrix, b: &Matrix) -> Result<Matrix, MatrixError> {
    let (ra, ca) = a.shape();
    let (rb, cb) = b.shape();
    let mut out = Matrix::zeros(ra * rb, ca * cb, StorageOrder::ColMajor);
    for i in 0..ra {
        for j in 0..ca {
            let aij = a.get(i, j)?;
            for k in 0..rb {
                for l in 0..cb {
                    out.set(i * rb + k, j * cb + l, aij * b.get(k, l)?)?;
                }
            }
        }
    }
    Ok(out)
}

/// Quadratic product `a %&% b = a b a'`.
pub fn quadratic(a: &Matrix, b: &Matrix) -> Result<Matrix, MatrixError> {
    if a.cols() != b.rows() || !b.is_square() {
        return Err(shape_error("quadratic", a, b));
    }
    let ab = mat_mul(a, b)?;
    let mut out = Matrix::zeros(a.rows(), a.rows(), StorageOrder::ColMajor);
    gemm(Transpose::No, Transpose::Yes, 1.0, &ab, a, 0.0, &mut out)?;
    Ok(out)
}

/// Horizontal concatenation.
pub fn cbind(args: &[&Matrix]) -> Result<Matrix, MatrixError> {
    let Some(first) = args.first() else {
        return Ok(Matrix::zero_by_zero());
    };
    let rows = first.rows();
    let mut data = Vec::new();
    for m in args {
        if m.rows() != rows {
            return Err(shape_error("cbind", first, m));
        }
        data.extend(m.to_col_major_vec());
    }
    let cols = args.iter().map(|m| m.cols()).sum();
    Matrix::from_vec(rows, cols, StorageOrder::ColMajor, data)
}

/// Vertical concatenation.
pub fn rbind(args: &[&Matrix]) -> Result<Matrix, MatrixError> {
    let Some(first) = args.first() else {
        return Ok(Matrix::zero_by_zero());
    };
    let cols = first.cols();
    let rows: usize = args.iter().map(|m| m.rows()).sum();
    let mut out = Matrix::zeros(rows, cols, StorageOrder::ColMajor);
    let mut offset = 0;
    for m in args {
        if m.cols() != cols {
            return Err(shape_error("rbind", first, m));
        }
        for r in 0..m.rows() {
            for c in 0..cols {
                out.set(offset + r, c, m.get(r, c)?)?;
            }
        }
        offset += m.rows();
    }
    Ok(out)
}

/// `det(a)` as a `1 x 1` matrix.
pub fn det(a: &Matrix) -> Result<Matrix, MatrixError> {
    Ok(scalar(determinant(a)?))
}

/// `tr(a)` as a `1 x 1` matrix.
pub fn trace(a: &Matrix) -> Result<Matrix, MatrixError> {
    let n = require_square("trace", a)?;
    let mut total = 0.0;
    for i in 0..n {
        total += a.get(i, i)?;
    }
    Ok(scalar(total))
}

/// Sum of every element of every argument, as a `1 x 1` matrix.
pub fn sum(args: &[&Matrix]) -> Result<Matrix, MatrixError> {
    let total = args
        .iter()
        .map(|m| m.as_slice().iter().sum::<f64>())
        .sum();
    Ok(scalar(total))
}

/// `(I - a)^-1` by general inversion.
pub fn i_minus_a_inverse(a: &Matrix) -> Result<Matrix, MatrixError> {
    let n = require_square("i_minus_a_inverse", a)?;
    let mut z = Matrix::zeros(n, n, StorageOrder::ColMajor);
    let mut ax = Matrix::zeros(n, n, StorageOrder::ColMajor);
    let mut identity = Matrix::identity(n);
    shallow_inverse(InverseMode::General, a, &mut z, &mut ax, &mut identity)?;
    Ok(z)
}

/// `vec(a)`: columns stacked into one column.
pub fn vec(a: &Matrix) -> Result<Matrix, MatrixError> {
    Matrix::from_vec(a.len(), 1, StorageOrder::ColMajor, a.to_col_major_vec())
}

/// Diagonal of a square matrix as a column.
pub fn diag(a: &Matrix) -> Result<Matrix, MatrixError> {
    let n = require_square("diag", a)?;
    let data = (0..n).map(|i| a.get(i, i)).collect::<Result<Vec<_>, _>>()?;
    Matrix::from_vec(n, 1, StorageOrder::ColMajor, data)
}

/// Identity of the node's own row count.
pub fn identity(own: &Matrix) -> Result<Matrix, MatrixError> {
    let n = require_square("identity", own)?;
    Ok(Matrix::identity(n))
}
