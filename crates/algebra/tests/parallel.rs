//! Per-worker replica integration tests for semcore-algebra.

use std::sync::Arc;

use rayon::prelude::*;
use semcore_algebra::{
    FreeParameter, MaximumLikelihood, ModelState, NodeId, RamConfig, RamExpectation,
};
use semcore_matrix::{Matrix, StorageOrder};

/// Path chain x1 -> x2 -> x3 with free coefficients and residual variances
/// fixed at one; the expected covariance feeds an ML fit node.
fn model() -> (ModelState, RamExpectation, NodeId) {
    let mut state = ModelState::new();
    let a = state.add_matrix(Matrix::zeros(3, 3, StorageOrder::ColMajor).with_name("A"));
    let s = state.add_matrix(Matrix::identity(3).with_name("S"));
    let f = state.add_matrix(Matrix::identity(3).with_name("F"));
    state
        .add_free_parameter(FreeParameter::new("b21").with_location(a, 1, 0))
        .unwrap();
    state
        .add_free_parameter(FreeParameter::new("b32").with_location(a, 2, 1))
        .unwrap();
    let ram = RamExpectation::new(a, s, f, RamConfig::new().with_auto_depth());
    let sigma = state.add_matrix(Matrix::identity(3).with_name("Sigma"));
    let observed = Matrix::from_rows(&[
        &[1.0, 0.5, 0.25],
        &[0.5, 1.25, 0.625],
        &[0.25, 0.625, 1.3125],
    ])
    .unwrap();
    let fit = state
        .add_fit("fit", Arc::new(MaximumLikelihood::new(observed).unwrap()), vec![sigma])
        .unwrap();
    (state, ram, fit)
}

fn objective(state: &mut ModelState, ram: &mut RamExpectation, fit: NodeId, params: &[f64]) -> f64 {
    state.set_free_parameters(params).unwrap();
    let cov = ram.compute(state).unwrap().unwrap();
    let sigma = state.lookup("Sigma").unwrap();
    for r in 0..3 {
        for c in 0..3 {
            state.set_element(sigma, r, c, cov.get(r, c).unwrap()).unwrap();
        }
    }
    state.evaluate(fit).unwrap().get(0, 0).unwrap()
}

fn grid() -> Vec<[f64; 2]> {
    (0..16)
        .map(|i| [0.1 * f64::from(i % 4), 0.2 * f64::from(i / 4)])
        .collect()
}

#[test]
fn replicas_match_sequential_evaluation() {
    let (state, ram, fit) = model();

    let sequential: Vec<f64> = {
        let (mut state, mut ram) = (state.clone(), ram.clone());
        grid()
            .iter()
            .map(|p| objective(&mut state, &mut ram, fit, p))
            .collect()
    };

    let parallel: Vec<f64> = grid()
        .par_iter()
        .map(|p| {
            let (mut state, mut ram) = (state.clone(), ram.clone());
            objective(&mut state, &mut ram, fit, p)
        })
        .collect();

    for (s, p) in sequential.iter().zip(&parallel) {
        assert_eq!(s.to_bits(), p.to_bits());
    }
}

#[test]
fn replicas_are_independent() {
    let (state, ram, fit) = model();
    let mut replicas: Vec<_> = (0..4).map(|_| (state.clone(), ram.clone())).collect();

    let values: Vec<f64> = replicas
        .par_iter_mut()
        .enumerate()
        .map(|(i, (state, ram))| objective(state, ram, fit, &[0.5, 0.5 * i as f64]))
        .collect();

    // Generating values b21 = 0.5, b32 = 0.5 reproduce the observed matrix.
    assert!(values[1].abs() < 1e-12);
    for (i, (state, _)) in replicas.iter().enumerate() {
        assert_eq!(state.free_parameter_values().unwrap(), vec![0.5, 0.5 * i as f64]);
    }
    // The template was never touched.
    assert_eq!(state.free_parameter_values().unwrap(), vec![0.0, 0.0]);
}

#[test]
fn state_is_send() {
    fn assert_send<T: Send + Clone>() {}
    assert_send::<ModelState>();
    assert_send::<RamExpectation>();
}
