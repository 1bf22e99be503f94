//! The model state: node arena, free parameters and the recompute protocol.
//!
//! ## Staleness
//!
//! A monotonically increasing clock stamps every value change. A node is
//! out of date when
//!
//! - its own value is stale (version differs from clean version), or
//! - a dependency's version is newer than the clock reading at which this
//!   node was last brought up to date, or
//! - a dependency is itself out of date.
//!
//! The answer is memoised per node for the current epoch. The epoch
//! advances on every change made from outside the protocol
//! ([`mark_dirty`](ModelState::mark_dirty), [`set_element`](ModelState::set_element),
//! [`set_free_parameters`](ModelState::set_free_parameters), ...), so a
//! shared subexpression is examined once per epoch however many paths reach
//! it.

use std::sync::Arc;

use semcore_matrix::{CapacityWarning, Matrix, MatrixError, StorageOrder};
use tracing::{debug, trace};

use crate::diagnostics::{DeferredError, Diagnostics};
use crate::error::AlgebraError;
use crate::fit::{FitFunction, Objective};
use crate::node::{Algebra, Node, NodeId, Payload, PopulateEdge};
use crate::operator::{Operator, OperatorEntry};

/// A free parameter and the cells it is written to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeParameter {
    name: String,
    locations: Vec<(NodeId, usize, usize)>,
}

impl FreeParameter {
    /// Creates a parameter with no locations.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            locations: Vec::new(),
        }
    }

    /// Adds a 0-based `(row, col)` cell of `node`.
    pub fn with_location(mut self, node: NodeId, row: usize, col: usize) -> Self {
        self.locations.push((node, row, col));
        self
    }

    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cells written by this parameter.
    pub fn locations(&self) -> &[(NodeId, usize, usize)] {
        &self.locations
    }
}

/// Owner of every node of one model.
///
/// Cloning produces an independent deep copy: a worker can evaluate its
/// clone on its own thread while other clones are evaluated elsewhere.
#[derive(Debug, Clone, Default)]
pub struct ModelState {
    nodes: Vec<Node>,
    matrices: Vec<NodeId>,
    algebras: Vec<NodeId>,
    parameters: Vec<FreeParameter>,
    diagnostics: Diagnostics,
    clock: u64,
    epoch: u64,
}

impl ModelState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn new_epoch(&mut self) {
        self.epoch += 1;
    }

    pub(crate) fn push(&mut self, value: Matrix, payload: Payload) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(value, payload));
        id
    }

    /// Number of nodes, including anonymous sub-expressions.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` for a state without nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Current epoch.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Node by handle.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::UnknownNode`] for a foreign handle.
    pub fn node(&self, id: NodeId) -> Result<&Node, AlgebraError> {
        self.nodes
            .get(id.0)
            .ok_or(AlgebraError::UnknownNode { id: id.0 })
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, AlgebraError> {
        self.nodes
            .get_mut(id.0)
            .ok_or(AlgebraError::UnknownNode { id: id.0 })
    }

    /// Current value of a node, without recomputing it.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::UnknownNode`] for a foreign handle.
    pub fn value(&self, id: NodeId) -> Result<&Matrix, AlgebraError> {
        Ok(&self.node(id)?.value)
    }

    /// Registered matrices, in registration order.
    pub fn matrices(&self) -> &[NodeId] {
        &self.matrices
    }

    /// Registered algebras and fit functions, in registration order.
    pub fn algebras(&self) -> &[NodeId] {
        &self.algebras
    }

    /// The `index`-th registered matrix.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::UnknownMatrix`] when out of range.
    pub fn matrix(&self, index: usize) -> Result<NodeId, AlgebraError> {
        self.matrices
            .get(index)
            .copied()
            .ok_or(AlgebraError::UnknownMatrix {
                index,
                count: self.matrices.len(),
            })
    }

    /// The `index`-th registered algebra.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::UnknownAlgebra`] when out of range.
    pub fn algebra(&self, index: usize) -> Result<NodeId, AlgebraError> {
        self.algebras
            .get(index)
            .copied()
            .ok_or(AlgebraError::UnknownAlgebra {
                index,
                count: self.algebras.len(),
            })
    }

    /// Finds a registered matrix or algebra by name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.matrices
            .iter()
            .chain(&self.algebras)
            .copied()
            .find(|id| self.nodes[id.0].value.name() == Some(name))
    }

    /// Like [`find`](ModelState::find), as a `Result`.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::UnknownName`] when no node has that name.
    pub fn lookup(&self, name: &str) -> Result<NodeId, AlgebraError> {
        self.find(name).ok_or_else(|| AlgebraError::UnknownName {
            name: name.to_string(),
        })
    }

    /// Registers a plain matrix.
    pub fn add_matrix(&mut self, value: Matrix) -> NodeId {
        let id = self.push(value, Payload::Bare);
        self.matrices.push(id);
        id
    }

    /// Registers an empty pass-through algebra to be filled later with
    /// [`set_algebra`](ModelState::set_algebra) or
    /// [`fill_algebra`](ModelState::fill_algebra). Declaring every algebra
    /// first lets definitions refer to algebras declared after them.
    pub fn declare_algebra(&mut self, name: &str) -> NodeId {
        let value = Matrix::zero_by_zero().with_name(name);
        let id = self.push(value, Payload::Algebra(Algebra::default()));
        self.algebras.push(id);
        id
    }

    /// Registers an algebra applying `operator` to `args`.
    ///
    /// # Errors
    ///
    /// See [`set_algebra`](ModelState::set_algebra).
    pub fn add_algebra(
        &mut self,
        name: &str,
        operator: Option<&'static OperatorEntry>,
        args: Vec<NodeId>,
    ) -> Result<NodeId, AlgebraError> {
        let id = self.declare_algebra(name);
        self.set_algebra(id, operator, args)?;
        Ok(id)
    }

    /// Replaces the payload of `id` with an algebra. The node becomes stale.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`AlgebraError::UnknownNode`] | a handle is foreign |
    /// | [`AlgebraError::Arity`] | `args` does not fit the operator |
    /// | [`AlgebraError::PopulateTarget`] | `id` carries population edges |
    pub fn set_algebra(
        &mut self,
        id: NodeId,
        operator: Option<&'static OperatorEntry>,
        args: Vec<NodeId>,
    ) -> Result<(), AlgebraError> {
        check_arity(operator, args.len())?;
        for &arg in &args {
            self.node(arg)?;
        }
        let stamp = self.tick();
        let node = self.node_mut(id)?;
        if !node.populate.is_empty() {
            return Err(AlgebraError::PopulateTarget {
                node: node.name().to_string(),
            });
        }
        node.payload = Payload::Algebra(Algebra { operator, args });
        node.value.mark_dirty_at(stamp);
        self.new_epoch();
        Ok(())
    }

    /// Registers a fit function evaluating `objective` on `args`. Its value
    /// is the `1 x 1` objective value.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::UnknownNode`] for a foreign argument handle.
    pub fn add_fit(
        &mut self,
        name: &str,
        objective: Arc<dyn Objective>,
        args: Vec<NodeId>,
    ) -> Result<NodeId, AlgebraError> {
        for &arg in &args {
            self.node(arg)?;
        }
        let value = Matrix::zeros(1, 1, StorageOrder::ColMajor).with_name(name);
        let id = self.push(value, Payload::Fit(FitFunction { objective, args }));
        self.algebras.push(id);
        let stamp = self.tick();
        self.nodes[id.0].value.mark_dirty_at(stamp);
        self.new_epoch();
        Ok(id)
    }

    /// Attaches a population edge to the plain matrix `dest`. The matrix
    /// becomes stale and is substituted on every recompute from now on.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::UnknownNode`] for foreign handles or
    /// [`AlgebraError::PopulateTarget`] when `dest` is computed.
    pub fn add_populate(&mut self, dest: NodeId, edge: PopulateEdge) -> Result<(), AlgebraError> {
        self.node(edge.source)?;
        let stamp = self.tick();
        let node = self.node_mut(dest)?;
        if !matches!(node.payload, Payload::Bare) {
            return Err(AlgebraError::PopulateTarget {
                node: node.name().to_string(),
            });
        }
        node.populate.push(edge);
        node.value.mark_dirty_at(stamp);
        self.new_epoch();
        Ok(())
    }

    /// Makes `id` an alias of `source`: resets and compaction read from the
    /// source's current values.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::UnknownNode`] for foreign handles.
    pub fn set_alias(&mut self, id: NodeId, source: NodeId) -> Result<(), AlgebraError> {
        self.node(source)?;
        self.node_mut(id)?.alias = Some(source);
        Ok(())
    }

    /// Current value of the alias source of `id`, recomputed first.
    fn alias_value(&mut self, id: NodeId) -> Result<Option<Matrix>, AlgebraError> {
        match self.node(id)?.alias {
            Some(source) => {
                self.recompute(source)?;
                Ok(Some(self.nodes[source.0].value.clone()))
            }
            None => Ok(None),
        }
    }

    /// Restores the original shape of `id` and copies its alias source's
    /// values. A node without alias is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Matrix`] when the source does not have the
    /// node's original shape.
    pub fn reset_from_alias(&mut self, id: NodeId) -> Result<(), AlgebraError> {
        let Some(source) = self.alias_value(id)? else {
            return Ok(());
        };
        self.node_mut(id)?.value.reset_from_alias(&source)?;
        self.mark_dirty(id)
    }

    /// Compacts `id` by omitting flagged rows and columns, reading from its
    /// alias source when it has one.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Matrix`] when the masks do not fit the source.
    pub fn remove_rows_and_columns(
        &mut self,
        id: NodeId,
        row_mask: &[bool],
        col_mask: &[bool],
    ) -> Result<(), AlgebraError> {
        let source = self.alias_value(id)?;
        self.node_mut(id)?
            .value
            .remove_rows_and_columns(row_mask, col_mask, source.as_ref())?;
        self.mark_dirty(id)
    }

    /// Changes the shape of `id`. The node becomes stale.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::UnknownNode`] for a foreign handle.
    pub fn resize(
        &mut self,
        id: NodeId,
        rows: usize,
        cols: usize,
        keep_buffer: bool,
    ) -> Result<Option<CapacityWarning>, AlgebraError> {
        let warning = self.node_mut(id)?.value.resize(rows, cols, keep_buffer);
        self.mark_dirty(id)?;
        Ok(warning)
    }

    /// Bumps the version of `id` and starts a new epoch.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::UnknownNode`] for a foreign handle.
    pub fn mark_dirty(&mut self, id: NodeId) -> Result<(), AlgebraError> {
        let stamp = self.tick();
        self.node_mut(id)?.value.mark_dirty_at(stamp);
        self.new_epoch();
        Ok(())
    }

    /// Declares the value of `id` up to date with everything it reads, and
    /// starts a new epoch.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::UnknownNode`] for a foreign handle.
    pub fn mark_clean(&mut self, id: NodeId) -> Result<(), AlgebraError> {
        let clock = self.clock;
        let node = self.node_mut(id)?;
        node.value.mark_clean();
        node.synced = clock;
        self.new_epoch();
        Ok(())
    }

    /// Reads element `(row, col)` of the current value.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Matrix`] when out of range.
    pub fn element(&self, id: NodeId, row: usize, col: usize) -> Result<f64, AlgebraError> {
        Ok(self.node(id)?.value.get(row, col)?)
    }

    /// Writes element `(row, col)` and marks the node dirty. Nothing changes
    /// on error.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Matrix`] when out of range.
    pub fn set_element(
        &mut self,
        id: NodeId,
        row: usize,
        col: usize,
        value: f64,
    ) -> Result<(), AlgebraError> {
        self.node_mut(id)?.value.set(row, col, value)?;
        self.mark_dirty(id)
    }

    /// Registers a free parameter and returns its position.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`AlgebraError::UnknownNode`] | foreign location handle |
    /// | [`AlgebraError::InvalidConfig`] | parameter without locations |
    /// | [`AlgebraError::Matrix`] | location outside the node's current shape |
    pub fn add_free_parameter(&mut self, param: FreeParameter) -> Result<usize, AlgebraError> {
        if param.locations.is_empty() {
            return Err(AlgebraError::InvalidConfig(format!(
                "free parameter '{}' has no locations",
                param.name
            )));
        }
        for &(node, row, col) in &param.locations {
            self.node(node)?.value().get(row, col)?;
        }
        self.parameters.push(param);
        Ok(self.parameters.len() - 1)
    }

    /// Registered free parameters.
    pub fn free_parameters(&self) -> &[FreeParameter] {
        &self.parameters
    }

    /// Current parameter values, read from each parameter's first location.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Matrix`] when a location is out of range.
    pub fn free_parameter_values(&self) -> Result<Vec<f64>, AlgebraError> {
        self.parameters
            .iter()
            .map(|p| {
                let (node, row, col) = p.locations[0];
                self.element(node, row, col)
            })
            .collect()
    }

    /// Writes a new free-parameter vector into every location, marks each
    /// touched node dirty and starts a new epoch.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`AlgebraError::ParameterCount`] | `values` has the wrong length |
    /// | [`AlgebraError::Matrix`] | a location is out of range |
    ///
    /// Every location is checked before the first write, so an error leaves
    /// the state untouched.
    #[tracing::instrument(skip(self, values), fields(n = values.len()))]
    pub fn set_free_parameters(&mut self, values: &[f64]) -> Result<(), AlgebraError> {
        if values.len() != self.parameters.len() {
            return Err(AlgebraError::ParameterCount {
                expected: self.parameters.len(),
                got: values.len(),
            });
        }
        for param in &self.parameters {
            for &(node, row, col) in &param.locations {
                self.nodes[node.0].value.get(row, col)?;
            }
        }
        let mut touched = Vec::new();
        for (param, &value) in self.parameters.iter().zip(values) {
            for &(node, row, col) in &param.locations {
                self.nodes[node.0].value.set(row, col, value)?;
                touched.push(node);
            }
        }
        touched.sort_unstable();
        touched.dedup();
        let stamp = self.tick();
        for node in touched {
            self.nodes[node.0].value.mark_dirty_at(stamp);
        }
        self.new_epoch();
        Ok(())
    }

    /// Diagnostics recorded so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Mutable access to the recorded diagnostics.
    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Removes and returns every deferred condition.
    pub fn take_deferred(&mut self) -> Vec<DeferredError> {
        self.diagnostics.take()
    }

    /// Returns `true` when `id` must be recomputed before its value can be
    /// trusted. The answer is memoised for the current epoch.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Cycle`] when the dependencies loop back to
    /// `id`.
    pub fn needs_update(&mut self, id: NodeId) -> Result<bool, AlgebraError> {
        let epoch = self.epoch;
        let node = self.node_mut(id)?;
        if let Some((at, answer)) = node.memo {
            if at == epoch {
                return Ok(answer);
            }
        }
        if node.visiting {
            return Err(AlgebraError::Cycle {
                node: node.name().to_string(),
            });
        }
        if node.value.is_stale() {
            node.memo = Some((epoch, true));
            return Ok(true);
        }
        let synced = node.synced;
        let deps = node.dependencies();
        node.visiting = true;
        let result = self.dependencies_changed(synced, &deps);
        let node = &mut self.nodes[id.0];
        node.visiting = false;
        let answer = result?;
        node.memo = Some((epoch, answer));
        Ok(answer)
    }

    fn dependencies_changed(&mut self, synced: u64, deps: &[NodeId]) -> Result<bool, AlgebraError> {
        for &dep in deps {
            if self.node(dep)?.value.version() > synced || self.needs_update(dep)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Brings `id` up to date, computing it only when
    /// [`needs_update`](ModelState::needs_update) says so. Matrices with
    /// population edges are substituted unconditionally.
    ///
    /// # Errors
    ///
    /// Structural failures ([`AlgebraError::Matrix`], [`AlgebraError::Cycle`],
    /// ...) abort the recompute. Numeric singularity does not: it is recorded
    /// in [`diagnostics`](ModelState::diagnostics) and the node stays stale.
    pub fn recompute(&mut self, id: NodeId) -> Result<(), AlgebraError> {
        if !self.node(id)?.populate.is_empty() {
            return self.compute_node(id, false);
        }
        if self.needs_update(id)? {
            self.compute_node(id, false)
        } else {
            trace!(node = self.nodes[id.0].name(), "up to date");
            Ok(())
        }
    }

    /// Recomputes `id` and returns its value.
    ///
    /// # Errors
    ///
    /// See [`recompute`](ModelState::recompute).
    pub fn evaluate(&mut self, id: NodeId) -> Result<&Matrix, AlgebraError> {
        self.recompute(id)?;
        Ok(&self.nodes[id.0].value)
    }

    /// Computes `id` regardless of staleness, recomputing its arguments
    /// first. Starts a new epoch, since the forced value change is not
    /// visible to answers already memoised.
    ///
    /// # Errors
    ///
    /// See [`recompute`](ModelState::recompute).
    pub fn compute(&mut self, id: NodeId) -> Result<(), AlgebraError> {
        let result = self.compute_node(id, true);
        self.new_epoch();
        result
    }

    /// Without `force`, the operator is skipped when recomputing the
    /// arguments changed none of them.
    fn compute_node(&mut self, id: NodeId, force: bool) -> Result<(), AlgebraError> {
        let node = self.node_mut(id)?;
        if node.computing {
            return Err(AlgebraError::Cycle {
                node: node.name().to_string(),
            });
        }
        node.computing = true;
        let result = self.compute_inner(id, force);
        self.nodes[id.0].computing = false;
        result
    }

    fn compute_inner(&mut self, id: NodeId, force: bool) -> Result<(), AlgebraError> {
        let node = &self.nodes[id.0];
        if !node.populate.is_empty() {
            return self.apply_substitutions(id);
        }
        match node.payload.clone() {
            Payload::Bare => {
                self.finish_unchanged(id);
                Ok(())
            }
            Payload::Algebra(alg) => self.compute_algebra(id, &alg, force),
            Payload::Fit(fit) => self.compute_fit(id, &fit, force),
        }
    }

    /// Own value stale, or an argument newer than the last sync.
    fn inputs_changed(&self, id: NodeId, args: &[NodeId]) -> bool {
        let node = &self.nodes[id.0];
        node.value.is_stale()
            || args
                .iter()
                .any(|a| self.nodes[a.0].value.version() > node.synced)
    }

    fn compute_algebra(
        &mut self,
        id: NodeId,
        alg: &Algebra,
        force: bool,
    ) -> Result<(), AlgebraError> {
        for &arg in &alg.args {
            self.recompute(arg)?;
        }
        if !force && !self.inputs_changed(id, &alg.args) {
            trace!(node = self.nodes[id.0].name(), "arguments unchanged");
            self.finish_unchanged(id);
            return Ok(());
        }
        let Some(entry) = alg.operator else {
            if let Some(&arg) = alg.args.first() {
                let value = self.nodes[arg.0].value.clone();
                self.nodes[id.0].value.assign(value);
                self.finish_computed(id);
            } else {
                self.finish_unchanged(id);
            }
            return Ok(());
        };

        debug!(node = self.nodes[id.0].name(), op = entry.name, "computing algebra");
        let result = {
            let args: Vec<&Matrix> = alg.args.iter().map(|a| &self.nodes[a.0].value).collect();
            match (entry.operator, args.as_slice()) {
                (Operator::Nullary(f), []) => f(&self.nodes[id.0].value),
                (Operator::Unary(f), [a]) => f(a),
                (Operator::Binary(f), [a, b]) => f(a, b),
                (Operator::Variadic(f), all) => f(all),
                _ => {
                    return Err(AlgebraError::Arity {
                        op: entry.name,
                        expected: entry.arity_label(),
                        got: args.len(),
                    });
                }
            }
        };
        self.nodes[id.0].computations += 1;

        match result {
            Ok(value) => {
                self.nodes[id.0].value.assign(value);
                self.finish_computed(id);
                Ok(())
            }
            Err(MatrixError::Singular { pivot }) => {
                let node = self.nodes[id.0].name().to_string();
                self.diagnostics.record(DeferredError::SingularOperator {
                    node,
                    op: entry.name,
                    pivot,
                });
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn compute_fit(
        &mut self,
        id: NodeId,
        fit: &FitFunction,
        force: bool,
    ) -> Result<(), AlgebraError> {
        for &arg in &fit.args {
            self.recompute(arg)?;
        }
        if !force && !self.inputs_changed(id, &fit.args) {
            self.finish_unchanged(id);
            return Ok(());
        }
        let objective = fit.objective.as_ref();
        debug!(node = self.nodes[id.0].name(), objective = objective.name(), "computing fit");
        let result = {
            let args: Vec<&Matrix> = fit.args.iter().map(|a| &self.nodes[a.0].value).collect();
            objective.evaluate(&args)
        };
        self.nodes[id.0].computations += 1;

        match result {
            Ok(value) => {
                let node = &mut self.nodes[id.0];
                if node.value.shape() != (1, 1) {
                    node.value.resize(1, 1, false);
                }
                node.value.set(0, 0, value)?;
                self.finish_computed(id);
                Ok(())
            }
            Err(MatrixError::Singular { .. }) => {
                let node = self.nodes[id.0].name().to_string();
                self.diagnostics.record(DeferredError::SingularObjective {
                    node,
                    objective: objective.name().to_string(),
                });
                Ok(())
            }
            Err(e) => Err(AlgebraError::Objective {
                name: objective.name().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn apply_substitutions(&mut self, id: NodeId) -> Result<(), AlgebraError> {
        let edges = self.nodes[id.0].populate.clone();
        let mut changed = false;
        for edge in edges {
            self.recompute(edge.source)?;
            let value = self.nodes[edge.source.0]
                .value
                .get(edge.source_row, edge.source_col)?;
            let node = &mut self.nodes[id.0];
            let (rows, cols) = node.value.shape();
            if edge.dest_row >= rows || edge.dest_col >= cols {
                return Err(AlgebraError::PopulateOutOfBounds {
                    node: node.name().to_string(),
                    row: edge.dest_row + 1,
                    col: edge.dest_col + 1,
                    rows,
                    cols,
                });
            }
            let old = node.value.get(edge.dest_row, edge.dest_col)?;
            if old.to_bits() != value.to_bits() {
                node.value.set(edge.dest_row, edge.dest_col, value)?;
                changed = true;
            }
        }
        trace!(node = self.nodes[id.0].name(), changed, "applied substitutions");
        if changed {
            self.finish_computed(id);
        } else {
            self.finish_unchanged(id);
        }
        Ok(())
    }

    /// The value changed: new version, clean.
    fn finish_computed(&mut self, id: NodeId) {
        let stamp = self.tick();
        let epoch = self.epoch;
        let node = &mut self.nodes[id.0];
        node.value.mark_dirty_at(stamp);
        node.value.mark_clean();
        node.synced = stamp;
        node.memo = Some((epoch, false));
    }

    /// The value is current but did not change: dependents need not notice.
    fn finish_unchanged(&mut self, id: NodeId) {
        let (clock, epoch) = (self.clock, self.epoch);
        let node = &mut self.nodes[id.0];
        node.value.mark_clean();
        node.synced = clock;
        node.memo = Some((epoch, false));
    }

    /// Recomputes `id` and copies its value column-major into `out`.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::Matrix`] when `out` has the wrong length, or
    /// any error of [`recompute`](ModelState::recompute).
    pub fn export(&mut self, id: NodeId, out: &mut [f64]) -> Result<(), AlgebraError> {
        self.recompute(id)?;
        self.nodes[id.0].value.export_into(out)?;
        Ok(())
    }

    /// Human-readable description of a node: its expression for algebras,
    /// its objective for fit functions, followed by the current value.
    ///
    /// # Errors
    ///
    /// Returns [`AlgebraError::UnknownNode`] for a foreign handle.
    pub fn describe(&self, id: NodeId) -> Result<String, AlgebraError> {
        let node = self.node(id)?;
        let arg_names = |args: &[NodeId]| {
            args.iter()
                .map(|a| self.nodes[a.0].name())
                .collect::<Vec<_>>()
                .join(", ")
        };
        let text = match &node.payload {
            Payload::Bare => node.value.to_string(),
            Payload::Algebra(alg) => {
                let expr = match alg.operator {
                    Some(entry) => format!("{}({})", entry.symbol, arg_names(&alg.args)),
                    None if alg.args.is_empty() => "<empty>".to_string(),
                    None => arg_names(&alg.args),
                };
                format!("{} = {}\n{}", node.name(), expr, node.value)
            }
            Payload::Fit(fit) => {
                let value = node.value.get(0, 0).unwrap_or(f64::NAN);
                format!(
                    "{} = {}({}): {:.6}",
                    node.name(),
                    fit.objective.name(),
                    arg_names(&fit.args),
                    value
                )
            }
        };
        Ok(text)
    }
}

fn check_arity(operator: Option<&'static OperatorEntry>, got: usize) -> Result<(), AlgebraError> {
    match operator {
        None if got > 1 => Err(AlgebraError::Arity {
            op: "pass-through",
            expected: "0 or 1".to_string(),
            got,
        }),
        Some(entry) => match entry.operator.arity() {
            Some(expected) if expected != got => Err(AlgebraError::Arity {
                op: entry.name,
                expected: expected.to_string(),
                got,
            }),
            _ => Ok(()),
        },
        None => Ok(()),
    }
}
