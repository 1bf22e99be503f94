//! Host-side arrays and the buffer that backs every [`Matrix`](crate::Matrix).
//!
//! The host environment hands over dense numeric arrays. A matrix either
//! copies them into an owned buffer or keeps a non-owning view. Views share
//! the host allocation through an [`Arc`]; the first write through a view
//! detaches it into an owned copy, so host storage is never mutated or freed
//! from this side.

use std::sync::Arc;

use crate::error::MatrixError;

/// Declared shape of a host array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostShape {
    /// Plain vector; imported as a `1 x len` row vector.
    Vector,
    /// Column-major dense matrix.
    Matrix {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },
}

/// A dense numeric array owned by the host environment.
#[derive(Debug, Clone)]
pub struct HostArray {
    data: Arc<Vec<f64>>,
    shape: HostShape,
}

impl HostArray {
    /// Wraps a host vector.
    pub fn vector(data: impl Into<Arc<Vec<f64>>>) -> Self {
        Self {
            data: data.into(),
            shape: HostShape::Vector,
        }
    }

    /// Wraps a column-major host matrix.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::HostSize`] when `data` does not hold exactly
    /// `rows * cols` values.
    pub fn matrix(
        rows: usize,
        cols: usize,
        data: impl Into<Arc<Vec<f64>>>,
    ) -> Result<Self, MatrixError> {
        let data = data.into();
        if data.len() != rows * cols {
            return Err(MatrixError::HostSize {
                expected: rows * cols,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            shape: HostShape::Matrix { rows, cols },
        })
    }

    /// Returns the declared shape.
    pub fn shape(&self) -> HostShape {
        self.shape
    }

    /// Returns `(rows, cols)` as the matrix will see them.
    pub fn dims(&self) -> (usize, usize) {
        match self.shape {
            HostShape::Vector => (1, self.data.len()),
            HostShape::Matrix { rows, cols } => (rows, cols),
        }
    }

    /// Returns the raw values.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub(crate) fn shared(&self) -> Arc<Vec<f64>> {
        Arc::clone(&self.data)
    }
}

/// How a matrix takes hold of host data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Ingest {
    /// Copy into an exclusively owned buffer.
    #[default]
    Copy,
    /// Keep a view of host storage until the first write.
    View,
}

/// Backing storage of a matrix.
#[derive(Debug, Clone)]
pub(crate) enum Buffer {
    Owned(Vec<f64>),
    Host(Arc<Vec<f64>>),
}

impl Buffer {
    pub(crate) fn zeros(len: usize) -> Self {
        Self::Owned(vec![0.0; len])
    }

    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Owned(v) => v.len(),
            Self::Host(v) => v.len(),
        }
    }

    pub(crate) fn is_owned(&self) -> bool {
        matches!(self, Self::Owned(_))
    }

    pub(crate) fn as_slice(&self) -> &[f64] {
        match self {
            Self::Owned(v) => v,
            Self::Host(v) => v,
        }
    }

    /// Returns the owned vector, detaching a host view first.
    pub(crate) fn make_mut(&mut self) -> &mut Vec<f64> {
        if let Self::Host(shared) = self {
            *self = Self::Owned(shared.as_ref().clone());
        }
        match self {
            Self::Owned(v) => v,
            Self::Host(_) => unreachable!("host view detached above"),
        }
    }
}
