//! Graph nodes: a matrix value plus what it is computed from.

use std::fmt;

use semcore_matrix::Matrix;

use crate::fit::FitFunction;
use crate::operator::OperatorEntry;

/// Stable handle to a node of a [`ModelState`](crate::ModelState).
///
/// Handles are only meaningful for the state that issued them and for its
/// clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position in the state's arena.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Algebra payload: an operator applied to argument nodes.
///
/// Without an operator the algebra passes its single argument through
/// unchanged, or does nothing when it has no argument.
#[derive(Debug, Clone, Default)]
pub struct Algebra {
    pub(crate) operator: Option<&'static OperatorEntry>,
    pub(crate) args: Vec<NodeId>,
}

impl Algebra {
    /// The operator, or `None` for a pass-through.
    pub fn operator(&self) -> Option<&'static OperatorEntry> {
        self.operator
    }

    /// Argument nodes, in order.
    pub fn args(&self) -> &[NodeId] {
        &self.args
    }
}

/// What a node's value is computed from. A node carries at most one
/// payload.
#[derive(Debug, Clone, Default)]
pub enum Payload {
    /// Plain matrix set from outside.
    #[default]
    Bare,
    /// Operator applied to arguments.
    Algebra(Algebra),
    /// Scalar objective over arguments.
    Fit(FitFunction),
}

impl Payload {
    /// Argument nodes of the payload.
    pub fn args(&self) -> &[NodeId] {
        match self {
            Self::Bare => &[],
            Self::Algebra(alg) => &alg.args,
            Self::Fit(fit) => &fit.args,
        }
    }
}

/// Copies one scalar of `source` into a fixed cell of the owning node on
/// every recompute. Coordinates are 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulateEdge {
    /// Node the value is read from.
    pub source: NodeId,
    /// Row read in the source.
    pub source_row: usize,
    /// Column read in the source.
    pub source_col: usize,
    /// Row written in the destination.
    pub dest_row: usize,
    /// Column written in the destination.
    pub dest_col: usize,
}

/// An arena entry.
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) value: Matrix,
    pub(crate) payload: Payload,
    pub(crate) populate: Vec<PopulateEdge>,
    pub(crate) alias: Option<NodeId>,
    /// `(epoch, answer)` of the last `needs_update` resolution.
    pub(crate) memo: Option<(u64, bool)>,
    pub(crate) visiting: bool,
    pub(crate) computing: bool,
    pub(crate) computations: u64,
    /// Clock reading when the value was last brought up to date.
    pub(crate) synced: u64,
}

impl Node {
    pub(crate) fn new(value: Matrix, payload: Payload) -> Self {
        Self {
            value,
            payload,
            populate: Vec::new(),
            alias: None,
            memo: None,
            visiting: false,
            computing: false,
            computations: 0,
            synced: 0,
        }
    }

    /// Current value. Only trustworthy after a recompute.
    pub fn value(&self) -> &Matrix {
        &self.value
    }

    /// Payload.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Population edges.
    pub fn populate(&self) -> &[PopulateEdge] {
        &self.populate
    }

    /// Alias source, if any.
    pub fn alias(&self) -> Option<NodeId> {
        self.alias
    }

    /// Diagnostic name, `"<unnamed>"` when unset.
    pub fn name(&self) -> &str {
        self.value.name().unwrap_or("<unnamed>")
    }

    /// Number of times an operator or objective was run for this node.
    pub fn computations(&self) -> u64 {
        self.computations
    }

    /// Every node this one reads from: payload arguments, then population
    /// sources.
    pub(crate) fn dependencies(&self) -> Vec<NodeId> {
        let mut deps = self.payload.args().to_vec();
        deps.extend(self.populate.iter().map(|e| e.source));
        deps
    }
}
