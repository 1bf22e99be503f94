//! # semcore-matrix
//!
//! Dense `f64` matrices with an explicit storage order, the multiply and
//! LU kernels built on them, and the shallow inverse `(I - A)^-1` used by
//! path-coefficient models.
//!
//! ## Data Flow
//!
//! ```mermaid
//! graph LR
//!     H["HostArray"] -->|"Matrix::from_host(.., Ingest)"| M["Matrix"]
//!     M -->|"gemm / gemv"| M
//!     M -->|"lu_factor + lu_invert"| M
//!     A["A (paths)"] -->|"shallow_inverse(mode, ..)"| Z["Z = (I - A)^-1"]
//!     M -->|"export_into(&mut [f64])"| O["host buffer"]
//! ```
//!
//! ## Quick Start
//!
//! ```ignore
//! use semcore_matrix::{InverseMode, Matrix, StorageOrder, shallow_inverse};
//!
//! let a = Matrix::from_rows(&[&[0.0, 0.0], &[0.5, 0.0]])?;
//! let mut z = Matrix::zeros(2, 2, StorageOrder::ColMajor);
//! let mut scratch = Matrix::zeros(2, 2, StorageOrder::ColMajor);
//! let mut identity = Matrix::identity(2);
//! shallow_inverse(InverseMode::General, &a, &mut z, &mut scratch, &mut identity)?;
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `matrix` | The [`Matrix`] type: shape, order, versions, element access |
//! | `host` | Host-side arrays and copy/view ingestion |
//! | `compact` | Row/column/element removal by mask |
//! | `blas` | `gemm`, `gemv` over strided `ndarray` views |
//! | `lu` | LU factorisation, inversion, determinant |
//! | `shallow` | `(I - A)^-1` in general or series mode, path depth |
//! | `print` | `Display` listing |
//! | `error` | Error types |

mod blas;
mod compact;
mod error;
mod host;
mod lu;
mod matrix;
mod order;
mod print;
mod shallow;

pub use blas::{gemm, gemv, multiply, view, view_mut};
pub use error::MatrixError;
pub use host::{HostArray, HostShape, Ingest};
pub use lu::{LuPivots, determinant, invert, lu_factor, lu_invert};
pub use matrix::{CapacityWarning, Matrix};
pub use order::{StorageOrder, Transpose};
pub use shallow::{InverseMode, path_depth, shallow_inverse};
