//! Conversion of the TOML model description into a model state.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use semcore_algebra::{
    FreeParameter, MaximumLikelihood, ModelState, NodeId, PopulateEdge, RamConfig,
    RamExpectation, by_name,
};
use semcore_matrix::{Matrix, StorageOrder};
use tracing::{debug, info};

use crate::config::*;

/// A built model: the graph plus what the commands act on.
#[derive(Debug)]
pub struct Model {
    pub state: ModelState,
    pub ram: Option<RamExpectation>,
    pub fit: Option<NodeId>,
    pub evaluate: Vec<NodeId>,
}

/// Parses a storage order name.
pub fn parse_order(s: &str) -> Result<StorageOrder> {
    match s.to_lowercase().as_str() {
        "col" | "column" => Ok(StorageOrder::ColMajor),
        "row" => Ok(StorageOrder::RowMajor),
        other => bail!("unknown storage order: {other:?}"),
    }
}

/// Builds a [`RamConfig`] from the `[ram]` block.
pub fn build_ram_config(ram: &RamToml) -> Result<RamConfig> {
    let config = match (ram.mode.to_lowercase().as_str(), ram.depth) {
        ("general", None) => RamConfig::new(),
        ("series", Some(depth)) => RamConfig::new().with_series(depth),
        ("series", None) => bail!("series mode needs a depth"),
        ("auto", None) => RamConfig::new().with_auto_depth(),
        ("general" | "auto", Some(_)) => bail!("depth is only used by series mode"),
        (other, _) => bail!("unknown inversion mode: {other:?}"),
    };
    Ok(config)
}

fn build_matrix(m: &MatrixToml) -> Result<Matrix> {
    let order = parse_order(&m.order)?;
    let matrix = match &m.values {
        Some(values) => Matrix::from_vec(m.rows, m.cols, order, values.clone())
            .with_context(|| format!("matrix '{}'", m.name))?,
        None if m.identity => {
            if m.rows != m.cols {
                bail!("matrix '{}': identity needs a square shape", m.name);
            }
            Matrix::identity(m.rows)
        }
        None => Matrix::zeros(m.rows, m.cols, order),
    };
    Ok(matrix.with_name(m.name.as_str()))
}

fn to_zero_based(what: &str, row: usize, col: usize) -> Result<(usize, usize)> {
    if row == 0 || col == 0 {
        bail!("{what}: coordinates are 1-based, got ({row}, {col})");
    }
    Ok((row - 1, col - 1))
}

fn fill_algebra(state: &mut ModelState, id: NodeId, a: &AlgebraToml) -> Result<()> {
    match (&a.opcodes, &a.op) {
        (Some(opcodes), None) => state.fill_algebra(id, opcodes)?,
        (None, Some(op)) => {
            let entry = by_name(op).with_context(|| format!("unknown operator: {op:?}"))?;
            let args = a
                .args
                .iter()
                .map(|name| state.lookup(name))
                .collect::<Result<Vec<_>, _>>()?;
            state.set_algebra(id, Some(entry), args)?;
        }
        (None, None) if a.args.len() <= 1 => {
            let args = a
                .args
                .iter()
                .map(|name| state.lookup(name))
                .collect::<Result<Vec<_>, _>>()?;
            state.set_algebra(id, None, args)?;
        }
        (None, None) => bail!("more than one argument needs an operator"),
        (Some(_), Some(_)) => bail!("give either opcodes or op, not both"),
    }
    if a.rows.is_some() || a.cols.is_some() {
        let rows = a.rows.unwrap_or(1);
        let cols = a.cols.unwrap_or(rows);
        state.resize(id, rows, cols, false)?;
    }
    Ok(())
}

/// Builds the model state described by `config`.
pub fn build_model(config: &ModelConfig) -> Result<Model> {
    let mut state = ModelState::new();

    for m in &config.matrices {
        state.add_matrix(build_matrix(m)?);
    }

    let ids: Vec<NodeId> = config
        .algebras
        .iter()
        .map(|a| state.declare_algebra(&a.name))
        .collect();
    for (a, &id) in config.algebras.iter().zip(&ids) {
        fill_algebra(&mut state, id, a).with_context(|| format!("algebra '{}'", a.name))?;
    }

    for p in &config.populate {
        let what = format!("population of '{}'", p.into);
        let (dest_row, dest_col) = to_zero_based(&what, p.row, p.col)?;
        let (source_row, source_col) = to_zero_based(&what, p.from_row, p.from_col)?;
        let edge = PopulateEdge {
            source: state.lookup(&p.from)?,
            source_row,
            source_col,
            dest_row,
            dest_col,
        };
        let dest = state.lookup(&p.into)?;
        state.add_populate(dest, edge).with_context(|| what.clone())?;
    }

    for p in &config.parameters {
        let mut param = FreeParameter::new(p.name.as_str());
        for loc in &p.locations {
            let (row, col) = to_zero_based(&format!("parameter '{}'", p.name), loc.row, loc.col)?;
            param = param.with_location(state.lookup(&loc.matrix)?, row, col);
        }
        state.add_free_parameter(param)?;
    }
    if !config.parameters.is_empty() {
        let mut values = state.free_parameter_values()?;
        for (value, p) in values.iter_mut().zip(&config.parameters) {
            if let Some(start) = p.value {
                *value = start;
            }
        }
        state.set_free_parameters(&values)?;
    }

    let fit = match &config.fit {
        Some(f) => {
            let observed = state.value(state.lookup(&f.observed)?)?.clone();
            let objective = MaximumLikelihood::new(observed)
                .with_context(|| format!("observed matrix '{}'", f.observed))?;
            let expected = state.lookup(&f.expected)?;
            Some(state.add_fit(&f.name, Arc::new(objective), vec![expected])?)
        }
        None => None,
    };

    let ram = match &config.ram {
        Some(r) => Some(RamExpectation::new(
            state.lookup(&r.a)?,
            state.lookup(&r.s)?,
            state.lookup(&r.f)?,
            build_ram_config(r)?,
        )),
        None => None,
    };

    let evaluate = config
        .evaluate
        .iter()
        .map(|name| state.lookup(name))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        nodes = state.len(),
        matrices = state.matrices().len(),
        algebras = state.algebras().len(),
        parameters = state.free_parameters().len(),
        "model built"
    );
    debug!(?evaluate, "evaluation targets");
    Ok(Model {
        state,
        ram,
        fit,
        evaluate,
    })
}

/// Loads and builds a model file, then applies a parameter override.
pub fn load_model(path: &Path, params: Option<&[f64]>) -> Result<Model> {
    let config = ModelConfig::load(path)?;
    let mut model = build_model(&config)?;
    if let Some(values) = params {
        model
            .state
            .set_free_parameters(values)
            .context("failed to apply --params")?;
        info!(n = values.len(), "parameters overridden");
    }
    Ok(model)
}
