//! Shallow inverse integration tests for semcore-matrix.

use proptest::prelude::*;
use rand::{Rng, SeedableRng};
use semcore_matrix::{
    InverseMode, Matrix, MatrixError, StorageOrder, multiply, path_depth, shallow_inverse,
};

/// Strictly lower-triangular `n x n` path matrix: an acyclic model.
fn strictly_lower(n: usize, values: &[f64], keep: &[bool]) -> Matrix {
    let mut data = vec![0.0; n * n];
    for i in 0..n {
        for j in 0..i {
            if keep[i * n + j] {
                data[i * n + j] = values[i * n + j];
            }
        }
    }
    Matrix::from_vec(n, n, StorageOrder::RowMajor, data).unwrap()
}

fn arb_acyclic() -> impl Strategy<Value = Matrix> {
    (1usize..7).prop_flat_map(|n| {
        (
            prop::collection::vec(-0.9f64..0.9, n * n),
            prop::collection::vec(any::<bool>(), n * n),
        )
            .prop_map(move |(values, keep)| strictly_lower(n, &values, &keep))
    })
}

fn invert(mode: InverseMode, a: &Matrix) -> Result<Matrix, MatrixError> {
    let n = a.rows();
    let mut z = Matrix::zeros(n, n, StorageOrder::ColMajor);
    let mut ax = Matrix::zeros(n, n, StorageOrder::ColMajor);
    let mut identity = Matrix::identity(n);
    shallow_inverse(mode, a, &mut z, &mut ax, &mut identity)?;
    Ok(z)
}

proptest! {
    /// Series with at least n - 1 steps equals the general inverse on acyclic models.
    #[test]
    fn series_matches_general_when_deep_enough(a in arb_acyclic(), extra in 0usize..3) {
        let n = a.rows();
        let general = invert(InverseMode::General, &a).unwrap();
        let series = invert(InverseMode::Series { iterations: n - 1 + extra }, &a).unwrap();
        let diff = general.max_abs_diff(&series).unwrap();
        prop_assert!(diff < 1e-9, "n = {}, diff = {}", n, diff);
    }

    /// The path depth is always a sufficient iteration count.
    #[test]
    fn path_depth_is_sufficient(a in arb_acyclic()) {
        let depth = path_depth(&a).unwrap();
        prop_assert!(depth.is_some());
        let depth = depth.unwrap();
        prop_assert!(depth < a.rows());
        let general = invert(InverseMode::General, &a).unwrap();
        let series = invert(InverseMode::Series { iterations: depth }, &a).unwrap();
        prop_assert!(general.max_abs_diff(&series).unwrap() < 1e-9);
    }

    /// Repeated calls with unchanged inputs give bit-identical results.
    #[test]
    fn inversion_is_pure(a in arb_acyclic(), iterations in 0usize..6) {
        for mode in [InverseMode::General, InverseMode::Series { iterations }] {
            let first = invert(mode, &a).unwrap();
            let second = invert(mode, &a).unwrap();
            prop_assert_eq!(first.to_col_major_vec(), second.to_col_major_vec());
        }
    }

    /// (I - A) Z = I for the general result.
    #[test]
    fn general_result_is_an_inverse(a in arb_acyclic()) {
        let n = a.rows();
        let z = invert(InverseMode::General, &a).unwrap();
        let mut i_minus_a = Matrix::identity(n);
        for r in 0..n {
            for c in 0..n {
                i_minus_a.accumulate(r, c, -a.get(r, c).unwrap()).unwrap();
            }
        }
        let product = multiply(&i_minus_a, &z).unwrap();
        prop_assert!(product.max_abs_diff(&Matrix::identity(n)).unwrap() < 1e-9);
    }
}

#[test]
fn reused_buffers_give_same_result() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(42);
    let n = 12;
    let values: Vec<f64> = (0..n * n).map(|_| rng.random_range(-0.5..0.5)).collect();
    let keep: Vec<bool> = (0..n * n).map(|_| rng.random_bool(0.4)).collect();
    let a = strictly_lower(n, &values, &keep);

    let mut z = Matrix::zeros(n, n, StorageOrder::ColMajor);
    let mut ax = Matrix::zeros(n, n, StorageOrder::ColMajor);
    let mut identity = Matrix::identity(n);
    for iterations in [n - 1, n, n + 1] {
        shallow_inverse(
            InverseMode::Series { iterations },
            &a,
            &mut z,
            &mut ax,
            &mut identity,
        )
        .unwrap();
        let fresh = invert(InverseMode::General, &a).unwrap();
        assert!(z.max_abs_diff(&fresh).unwrap() < 1e-9, "iterations = {iterations}");
    }
}

#[test]
fn cyclic_model_has_no_depth_but_inverts() {
    // x1 <-> x2 feedback loop with |gain| < 1.
    let a = Matrix::from_rows(&[&[0.0, 0.5], &[0.4, 0.0]]).unwrap();
    assert_eq!(path_depth(&a).unwrap(), None);
    let z = invert(InverseMode::General, &a).unwrap();
    // (I - A)^-1 = 1 / (1 - 0.2) * [[1, 0.5], [0.4, 1]]
    assert!((z.get(0, 1).unwrap() - 0.625).abs() < 1e-12);
    assert!((z.get(1, 1).unwrap() - 1.25).abs() < 1e-12);
}

#[test]
fn singular_general_mode() {
    let a = Matrix::from_rows(&[&[0.0, 1.0], &[1.0, 0.0]]).unwrap();
    let err = invert(InverseMode::General, &a).unwrap_err();
    assert!(matches!(err, MatrixError::Singular { .. }));
}
