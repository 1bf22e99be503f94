//! The static operator table.
//!
//! Opcodes are 1-based positions in [`OPERATORS`]; opcode `0` is reserved
//! for algebra references in opcode lists.

use std::fmt;

use semcore_matrix::{Matrix, MatrixError};

use crate::ops;

/// Result of an operator application.
pub type OpResult = Result<Matrix, MatrixError>;

/// Calling convention of an operator.
#[derive(Clone, Copy)]
pub enum Operator {
    /// Computed from the node's own current value.
    Nullary(fn(&Matrix) -> OpResult),
    /// One argument.
    Unary(fn(&Matrix) -> OpResult),
    /// Two arguments.
    Binary(fn(&Matrix, &Matrix) -> OpResult),
    /// Any number of arguments. In opcode lists the argument count follows
    /// the opcode.
    Variadic(fn(&[&Matrix]) -> OpResult),
}

impl Operator {
    /// Fixed argument count, or `None` for variadic operators.
    pub fn arity(&self) -> Option<usize> {
        match self {
            Self::Nullary(_) => Some(0),
            Self::Unary(_) => Some(1),
            Self::Binary(_) => Some(2),
            Self::Variadic(_) => None,
        }
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Nullary(_) => "Nullary",
            Self::Unary(_) => "Unary",
            Self::Binary(_) => "Binary",
            Self::Variadic(_) => "Variadic",
        };
        f.write_str(kind)
    }
}

/// One row of the operator table.
#[derive(Debug, Clone, Copy)]
pub struct OperatorEntry {
    /// Opcode used in opcode lists.
    pub opcode: i32,
    /// Name used in configuration files.
    pub name: &'static str,
    /// Symbol used when describing an algebra.
    pub symbol: &'static str,
    /// Implementation and calling convention.
    pub operator: Operator,
}

impl OperatorEntry {
    /// Human-readable arity, `"any"` for variadic operators.
    pub fn arity_label(&self) -> String {
        match self.operator.arity() {
            Some(n) => n.to_string(),
            None => "any".to_string(),
        }
    }
}

impl PartialEq for OperatorEntry {
    fn eq(&self, other: &Self) -> bool {
        self.opcode == other.opcode
    }
}

impl Eq for OperatorEntry {}

/// Every operator, in opcode order.
#[rustfmt::skip]
pub static OPERATORS: &[OperatorEntry] = &[
    OperatorEntry { opcode: 1, name: "transpose", symbol: "t", operator: Operator::Unary(ops::transpose) },
    OperatorEntry { opcode: 2, name: "solve", symbol: "solve", operator: Operator::Unary(ops::solve) },
    OperatorEntry { opcode: 3, name: "multiply", symbol: "%*%", operator: Operator::Binary(ops::multiply) },
    OperatorEntry { opcode: 4, name: "elem_multiply", symbol: "*", operator: Operator::Binary(ops::elem_multiply) },
    OperatorEntry { opcode: 5, name: "kronecker", symbol: "%x%", operator: Operator::Binary(ops::kronecker) },
    OperatorEntry { opcode: 6, name: "quadratic", symbol: "%&%", operator: Operator::Binary(ops::quadratic) },
    OperatorEntry { opcode: 7, name: "elem_divide", symbol: "/", operator: Operator::Binary(ops::elem_divide) },
    OperatorEntry { opcode: 8, name: "add", symbol: "+", operator: Operator::Binary(ops::add) },
    OperatorEntry { opcode: 9, name: "subtract", symbol: "-", operator: Operator::Binary(ops::subtract) },
    OperatorEntry { opcode: 10, name: "negate", symbol: "-", operator: Operator::Unary(ops::negate) },
    OperatorEntry { opcode: 11, name: "cbind", symbol: "cbind", operator: Operator::Variadic(ops::cbind) },
    OperatorEntry { opcode: 12, name: "rbind", symbol: "rbind", operator: Operator::Variadic(ops::rbind) },
    OperatorEntry { opcode: 13, name: "det", symbol: "det", operator: Operator::Unary(ops::det) },
    OperatorEntry { opcode: 14, name: "trace", symbol: "tr", operator: Operator::Unary(ops::trace) },
    OperatorEntry { opcode: 15, name: "sum", symbol: "sum", operator: Operator::Variadic(ops::sum) },
    OperatorEntry { opcode: 16, name: "i_minus_a_inverse", symbol: "solve(I - .)", operator: Operator::Unary(ops::i_minus_a_inverse) },
    OperatorEntry { opcode: 17, name: "vec", symbol: "vec", operator: Operator::Unary(ops::vec) },
    OperatorEntry { opcode: 18, name: "diag", symbol: "diag2vec", operator: Operator::Unary(ops::diag) },
    OperatorEntry { opcode: 19, name: "identity", symbol: "I", operator: Operator::Nullary(ops::identity) },
];

/// Looks up an operator by opcode.
pub fn lookup(opcode: i32) -> Option<&'static OperatorEntry> {
    let index = usize::try_from(opcode).ok()?.checked_sub(1)?;
    OPERATORS.get(index)
}

/// Looks up an operator by configuration name.
pub fn by_name(name: &str) -> Option<&'static OperatorEntry> {
    OPERATORS.iter().find(|e| e.name == name)
}
