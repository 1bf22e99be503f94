//! Graph construction from host opcode lists.
//!
//! An opcode list is a flat prefix encoding of one expression:
//!
//! | Value | Meaning |
//! |-------|---------|
//! | `k > 0` | apply operator `k`; its operands follow. Variadic operators read their operand count next |
//! | `0, i` | the `i`-th registered algebra |
//! | `!i` (negative) | the `i`-th registered matrix |
//!
//! Nested operator applications become anonymous algebra nodes. A list that
//! is only a reference makes the algebra a pass-through of that node.

use semcore_matrix::Matrix;
use tracing::debug;

use crate::error::AlgebraError;
use crate::node::{NodeId, Payload};
use crate::operator::{OperatorEntry, lookup};
use crate::state::ModelState;

struct Opcodes<'a> {
    values: &'a [i32],
    pos: usize,
    name: &'a str,
}

impl Opcodes<'_> {
    fn read(&mut self) -> Result<i32, AlgebraError> {
        let value = self
            .values
            .get(self.pos)
            .copied()
            .ok_or_else(|| AlgebraError::TruncatedSpec {
                name: self.name.to_string(),
                position: self.pos,
            })?;
        self.pos += 1;
        Ok(value)
    }

    fn read_count(&mut self) -> Result<usize, AlgebraError> {
        let value = self.read()?;
        usize::try_from(value).map_err(|_| AlgebraError::UnknownOpcode {
            op: value.to_string(),
        })
    }

    fn remaining(&self) -> usize {
        self.values.len().saturating_sub(self.pos)
    }
}

fn entry(opcode: i32) -> Result<&'static OperatorEntry, AlgebraError> {
    lookup(opcode).ok_or_else(|| AlgebraError::UnknownOpcode {
        op: opcode.to_string(),
    })
}

impl ModelState {
    /// Declares and fills a registered algebra from an opcode list.
    ///
    /// # Errors
    ///
    /// See [`fill_algebra`](ModelState::fill_algebra).
    pub fn build_algebra(&mut self, name: &str, opcodes: &[i32]) -> Result<NodeId, AlgebraError> {
        let id = self.declare_algebra(name);
        self.fill_algebra(id, opcodes)?;
        Ok(id)
    }

    /// Sets the expression of a declared algebra from an opcode list.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`AlgebraError::UnknownOpcode`] | no operator with that opcode, or a negative count |
    /// | [`AlgebraError::UnknownMatrix`] / [`AlgebraError::UnknownAlgebra`] | reference out of range |
    /// | [`AlgebraError::TruncatedSpec`] | the list ends inside the expression |
    /// | [`AlgebraError::TrailingOpcodes`] | values remain after the expression |
    pub fn fill_algebra(&mut self, id: NodeId, opcodes: &[i32]) -> Result<(), AlgebraError> {
        let name = self.node(id)?.name().to_string();
        let mut ops = Opcodes {
            values: opcodes,
            pos: 0,
            name: &name,
        };
        let first = ops.read()?;
        let (operator, args) = if first > 0 {
            let entry = entry(first)?;
            (Some(entry), self.parse_operands(&mut ops, entry)?)
        } else if first == 0 {
            (None, vec![self.algebra(ops.read_count()?)?])
        } else {
            (None, vec![self.matrix(!first as usize)?])
        };
        let extra = ops.remaining();
        if extra > 0 {
            return Err(AlgebraError::TrailingOpcodes { name, extra });
        }
        debug!(
            algebra = name.as_str(),
            op = operator.map_or("pass-through", |e| e.name),
            args = args.len(),
            "built algebra"
        );
        self.set_algebra(id, operator, args)
    }

    fn parse_operands(
        &mut self,
        ops: &mut Opcodes<'_>,
        entry: &'static OperatorEntry,
    ) -> Result<Vec<NodeId>, AlgebraError> {
        let count = match entry.operator.arity() {
            Some(n) => n,
            None => ops.read_count()?,
        };
        let mut args = Vec::with_capacity(count);
        for _ in 0..count {
            args.push(self.parse_operand(ops)?);
        }
        Ok(args)
    }

    fn parse_operand(&mut self, ops: &mut Opcodes<'_>) -> Result<NodeId, AlgebraError> {
        let position = ops.pos;
        let value = ops.read()?;
        if value > 0 {
            let entry = entry(value)?;
            let args = self.parse_operands(ops, entry)?;
            let name = format!("{}[{}]", ops.name, position);
            let id = self.push(Matrix::zero_by_zero().with_name(name), Payload::Bare);
            self.set_algebra(id, Some(entry), args)?;
            Ok(id)
        } else if value == 0 {
            self.algebra(ops.read_count()?)
        } else {
            self.matrix(!value as usize)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state() -> ModelState {
        let mut state = ModelState::new();
        state.add_matrix(Matrix::from_rows(&[&[1.0, 2.0], &[3.0, 4.0]]).unwrap().with_name("A"));
        state.add_matrix(Matrix::identity(2).with_name("B"));
        state
    }

    #[test]
    fn binary_operator_on_matrices() {
        let mut state = state();
        // multiply(A, B)
        let id = state.build_algebra("AB", &[3, !0, !1]).unwrap();
        let value = state.evaluate(id).unwrap();
        assert_eq!(value.get(1, 0).unwrap(), 3.0);
    }

    #[test]
    fn nested_expression_creates_anonymous_nodes() {
        let mut state = state();
        let before = state.len();
        // add(transpose(A), B)
        let id = state.build_algebra("sum", &[8, 1, !0, !1]).unwrap();
        assert_eq!(state.len(), before + 2);
        assert_eq!(state.algebras().len(), 1);
        let value = state.evaluate(id).unwrap();
        assert_eq!(value.get(0, 1).unwrap(), 3.0);
        assert_eq!(value.get(0, 0).unwrap(), 2.0);
    }

    #[test]
    fn variadic_reads_count() {
        let mut state = state();
        // cbind(A, B, A)
        let id = state.build_algebra("wide", &[11, 3, !0, !1, !0]).unwrap();
        assert_eq!(state.evaluate(id).unwrap().shape(), (2, 6));
    }

    #[test]
    fn references_build_pass_through() {
        let mut state = state();
        let first = state.build_algebra("copy", &[!1]).unwrap();
        let second = state.build_algebra("copy2", &[0, 0]).unwrap();
        match state.node(second).unwrap().payload() {
            Payload::Algebra(alg) => {
                assert!(alg.operator().is_none());
                assert_eq!(alg.args(), &[first]);
            }
            other => panic!("unexpected payload {other:?}"),
        }
        let value = state.evaluate(second).unwrap();
        assert_eq!(value.max_abs_diff(&Matrix::identity(2)).unwrap(), 0.0);
    }

    #[test]
    fn forward_reference_after_declaration() {
        let mut state = state();
        let outer = state.declare_algebra("outer");
        let inner = state.declare_algebra("inner");
        state.fill_algebra(outer, &[10, 0, 1]).unwrap();
        state.fill_algebra(inner, &[1, !0]).unwrap();
        let value = state.evaluate(outer).unwrap();
        assert_eq!(value.get(0, 1).unwrap(), -3.0);
        assert!(!state.needs_update(inner).unwrap());
    }

    #[test]
    fn malformed_lists() {
        let mut state = state();
        assert!(matches!(
            state.build_algebra("t", &[3, !0]),
            Err(AlgebraError::TruncatedSpec { position: 2, .. })
        ));
        assert!(matches!(
            state.build_algebra("t", &[!0, !1]),
            Err(AlgebraError::TrailingOpcodes { extra: 1, .. })
        ));
        assert!(matches!(
            state.build_algebra("t", &[99]),
            Err(AlgebraError::UnknownOpcode { .. })
        ));
        assert!(matches!(
            state.build_algebra("t", &[!7]),
            Err(AlgebraError::UnknownMatrix { index: 7, count: 2 })
        ));
        assert!(matches!(
            state.build_algebra("t", &[0, 40]),
            Err(AlgebraError::UnknownAlgebra { index: 40, .. })
        ));
        assert!(matches!(
            state.build_algebra("t", &[]),
            Err(AlgebraError::TruncatedSpec { position: 0, .. })
        ));
    }
}
