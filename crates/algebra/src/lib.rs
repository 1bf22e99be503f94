//! # semcore-algebra
//!
//! A graph of matrix expressions evaluated lazily: each node is recomputed
//! only when something it reads from has changed since its last
//! computation.
//!
//! ## Architecture
//!
//! ```mermaid
//! graph LR
//!     P["set_free_parameters(&[f64])"] -->|"write + new epoch"| M["matrix nodes"]
//!     M -->|"population edges"| M
//!     M --> A["algebra nodes"]
//!     A -->|"operator table"| A
//!     A --> F["fit nodes (Objective)"]
//!     R["recompute(id)"] -->|"needs_update?"| A
//!     A -.->|"singular"| D["Diagnostics"]
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use semcore_algebra::{ModelState, by_name};
//! use semcore_matrix::Matrix;
//!
//! let mut state = ModelState::new();
//! let a = state.add_matrix(Matrix::identity(2).with_name("A"));
//! let b = state.add_matrix(Matrix::identity(2).with_name("B"));
//! let c = state.add_algebra("C", by_name("add"), vec![a, b])?;
//! // or from host opcodes: add(A, B)
//! let d = state.build_algebra("D", &[8, !0, !1])?;
//!
//! let value = state.evaluate(c)?;     // computes C
//! state.recompute(c)?;                // nothing changed: no work
//! state.set_element(a, 0, 0, 3.0)?;   // C is stale again
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `state` | [`ModelState`]: node arena, free parameters, recompute protocol |
//! | `node` | [`Node`], [`Payload`], [`PopulateEdge`] |
//! | `operator` | [`OPERATORS`] table and lookups |
//! | `ops` | Operator implementations |
//! | `build` | Graph construction from opcode lists |
//! | `fit` | [`Objective`] trait and [`MaximumLikelihood`] |
//! | [`ram`] | Shallow-inverse wrapper and [`RamExpectation`] |
//! | `diagnostics` | Deferred numeric conditions |
//! | `error` | Error types |

mod build;
mod diagnostics;
mod error;
mod fit;
mod node;
mod operator;
mod ops;
pub mod ram;
mod state;

pub use diagnostics::{DeferredError, Diagnostics};
pub use error::AlgebraError;
pub use fit::{FitFunction, MaximumLikelihood, Objective};
pub use node::{Algebra, Node, NodeId, Payload, PopulateEdge};
pub use operator::{OPERATORS, OpResult, Operator, OperatorEntry, by_name, lookup};
pub use ram::{DepthSelection, RamConfig, RamExpectation};
pub use state::{FreeParameter, ModelState};
