//! The dense [`Matrix`] type.

use tracing::{debug, warn};

use crate::error::MatrixError;
use crate::host::{Buffer, HostArray, Ingest};
use crate::order::{StorageOrder, Transpose};

/// Non-fatal report from [`Matrix::resize`] when a kept buffer is asked to
/// hold more elements than were originally allocated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityWarning {
    /// Requested `(rows, cols)`.
    pub requested: (usize, usize),
    /// Number of elements originally allocated.
    pub capacity: usize,
}

impl std::fmt::Display for CapacityWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "upsizing a kept buffer of {} elements to ({}, {}); values beyond the original capacity are unspecified",
            self.capacity, self.requested.0, self.requested.1
        )
    }
}

/// A dense `f64` matrix with an explicit storage order.
///
/// Besides its values a matrix carries:
///
/// - the originally allocated shape, which bounds in-place reuse by
///   [`resize`](Matrix::resize) and is the source layout for
///   self-sourced [`remove_rows_and_columns`](Matrix::remove_rows_and_columns);
/// - a `version` / `clean_version` pair. The matrix is stale exactly when
///   the two differ.
#[derive(Debug, Clone)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    order: StorageOrder,
    buffer: Buffer,
    original_rows: usize,
    original_cols: usize,
    version: u64,
    clean_version: u64,
    name: Option<String>,
}

impl Matrix {
    /// Creates a zero-filled `rows x cols` matrix.
    pub fn zeros(rows: usize, cols: usize, order: StorageOrder) -> Self {
        Self {
            rows,
            cols,
            order,
            buffer: Buffer::zeros(rows * cols),
            original_rows: rows,
            original_cols: cols,
            version: 0,
            clean_version: 0,
            name: None,
        }
    }

    /// Creates an empty `0 x 0` matrix.
    pub fn zero_by_zero() -> Self {
        Self::zeros(0, 0, StorageOrder::ColMajor)
    }

    /// Creates the `n x n` identity.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n, StorageOrder::ColMajor);
        let data = m.buffer.make_mut();
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        m
    }

    /// Creates a matrix from a flat buffer laid out in `order`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::HostSize`] if `data.len() != rows * cols`.
    pub fn from_vec(
        rows: usize,
        cols: usize,
        order: StorageOrder,
        data: Vec<f64>,
    ) -> Result<Self, MatrixError> {
        if data.len() != rows * cols {
            return Err(MatrixError::HostSize {
                expected: rows * cols,
                got: data.len(),
            });
        }
        let mut m = Self::zeros(0, 0, order);
        m.rows = rows;
        m.cols = cols;
        m.original_rows = rows;
        m.original_cols = cols;
        m.buffer = Buffer::Owned(data);
        Ok(m)
    }

    /// Creates a matrix from row-major nested rows. Convenient for tests and
    /// literals.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::ShapeMismatch`] if the rows are ragged.
    pub fn from_rows(rows: &[&[f64]]) -> Result<Self, MatrixError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            if row.len() != n_cols {
                return Err(MatrixError::ShapeMismatch {
                    op: "from_rows",
                    lhs: (1, n_cols),
                    rhs: (1, row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Self::from_vec(n_rows, n_cols, StorageOrder::RowMajor, data)
    }

    /// Imports a host array. Host data is column-major; vectors become
    /// `1 x len` row vectors.
    pub fn from_host(host: &HostArray, ingest: Ingest) -> Self {
        let (rows, cols) = host.dims();
        let buffer = match ingest {
            Ingest::Copy => Buffer::Owned(host.data().to_vec()),
            Ingest::View => Buffer::Host(host.shared()),
        };
        Self {
            rows,
            cols,
            order: StorageOrder::ColMajor,
            buffer,
            original_rows: rows,
            original_cols: cols,
            version: 0,
            clean_version: 0,
            name: None,
        }
    }

    /// Sets a diagnostic name, builder style.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets or clears the diagnostic name.
    pub fn set_name(&mut self, name: Option<String>) {
        self.name = name;
    }

    /// Returns the diagnostic name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of elements, `rows * cols`.
    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    /// Returns `true` when the matrix has no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` for square matrices.
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Originally allocated `(rows, cols)`.
    pub fn original_shape(&self) -> (usize, usize) {
        (self.original_rows, self.original_cols)
    }

    /// Current storage order.
    pub fn order(&self) -> StorageOrder {
        self.order
    }

    /// Returns `true` when the buffer is exclusively owned, `false` for a
    /// view of host storage.
    pub fn is_owned(&self) -> bool {
        self.buffer.is_owned()
    }

    /// Leading dimension: rows for column-major, cols for row-major.
    pub fn leading(&self) -> usize {
        match self.order {
            StorageOrder::ColMajor => self.rows,
            StorageOrder::RowMajor => self.cols,
        }
    }

    /// The dimension that is not [`leading`](Matrix::leading).
    pub fn lagging(&self) -> usize {
        match self.order {
            StorageOrder::ColMajor => self.cols,
            StorageOrder::RowMajor => self.rows,
        }
    }

    /// Transpose flag that presents this buffer as the logical matrix to a
    /// column-major kernel.
    pub fn majority(&self) -> Transpose {
        match self.order {
            StorageOrder::ColMajor => Transpose::No,
            StorageOrder::RowMajor => Transpose::Yes,
        }
    }

    /// Transpose flag that presents this buffer as the logical transpose.
    pub fn minority(&self) -> Transpose {
        match self.order {
            StorageOrder::ColMajor => Transpose::Yes,
            StorageOrder::RowMajor => Transpose::No,
        }
    }

    /// Values in storage order.
    pub fn as_slice(&self) -> &[f64] {
        &self.buffer.as_slice()[..self.len()]
    }

    /// Mutable values in storage order. Detaches a host view.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        let len = self.len();
        &mut self.buffer.make_mut()[..len]
    }

    #[inline(always)]
    fn offset(&self, row: usize, col: usize) -> usize {
        self.order.offset(row, col, self.rows, self.cols)
    }

    fn check_index(&self, row: usize, col: usize) -> Result<usize, MatrixError> {
        if row >= self.rows || col >= self.cols {
            return Err(MatrixError::Index {
                row: row + 1,
                col: col + 1,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self.offset(row, col))
    }

    fn check_vector(&self, index: usize) -> Result<(), MatrixError> {
        if index >= self.len() {
            return Err(MatrixError::VectorIndex {
                index: index + 1,
                len: self.len(),
            });
        }
        Ok(())
    }

    /// Reads element `(row, col)` (0-based).
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::Index`] with 1-based coordinates when out of
    /// range.
    pub fn get(&self, row: usize, col: usize) -> Result<f64, MatrixError> {
        let at = self.check_index(row, col)?;
        Ok(self.buffer.as_slice()[at])
    }

    /// Writes element `(row, col)` (0-based). Nothing is written on error.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::Index`] with 1-based coordinates when out of
    /// range.
    pub fn set(&mut self, row: usize, col: usize, value: f64) -> Result<(), MatrixError> {
        let at = self.check_index(row, col)?;
        self.buffer.make_mut()[at] = value;
        Ok(())
    }

    /// Adds `value` to element `(row, col)`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::Index`] when out of range.
    pub fn accumulate(&mut self, row: usize, col: usize, value: f64) -> Result<(), MatrixError> {
        let at = self.check_index(row, col)?;
        self.buffer.make_mut()[at] += value;
        Ok(())
    }

    /// Reads the `index`-th value in storage order.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::VectorIndex`] when out of range.
    pub fn get_vector(&self, index: usize) -> Result<f64, MatrixError> {
        self.check_vector(index)?;
        Ok(self.buffer.as_slice()[index])
    }

    /// Writes the `index`-th value in storage order.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::VectorIndex`] when out of range.
    pub fn set_vector(&mut self, index: usize, value: f64) -> Result<(), MatrixError> {
        self.check_vector(index)?;
        self.buffer.make_mut()[index] = value;
        Ok(())
    }

    /// Current version stamp.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Version stamp at the last [`mark_clean`](Matrix::mark_clean).
    pub fn clean_version(&self) -> u64 {
        self.clean_version
    }

    /// Bumps the version counter.
    pub fn mark_dirty(&mut self) {
        self.version += 1;
    }

    /// Moves the version to `stamp` taken from a clock shared with other
    /// matrices. The version never decreases.
    pub fn mark_dirty_at(&mut self, stamp: u64) {
        self.version = stamp.max(self.version + 1);
    }

    /// Records the current version as clean.
    pub fn mark_clean(&mut self) {
        self.clean_version = self.version;
    }

    /// Returns `true` when the version moved since the last clean mark.
    pub fn is_stale(&self) -> bool {
        self.clean_version != self.version
    }

    /// Changes the logical shape.
    ///
    /// Without `keep_buffer` a shape change reallocates a zeroed buffer and
    /// resets the original capacity. With `keep_buffer` the existing values
    /// are reused; if the new size exceeds the original capacity a
    /// [`CapacityWarning`] is logged and returned and the buffer is
    /// zero-extended, leaving values beyond the old capacity unspecified.
    pub fn resize(
        &mut self,
        rows: usize,
        cols: usize,
        keep_buffer: bool,
    ) -> Option<CapacityWarning> {
        debug!(
            from_rows = self.rows,
            from_cols = self.cols,
            rows,
            cols,
            keep_buffer,
            "resizing matrix"
        );
        let mut warning = None;
        if !keep_buffer && (self.rows != rows || self.cols != cols) {
            self.buffer = Buffer::zeros(rows * cols);
        } else if self.original_rows * self.original_cols < rows * cols {
            let w = CapacityWarning {
                requested: (rows, cols),
                capacity: self.original_rows * self.original_cols,
            };
            warn!(name = self.name.as_deref().unwrap_or("<unnamed>"), "{w}");
            warning = Some(w);
        }
        if self.buffer.len() < rows * cols {
            self.buffer.make_mut().resize(rows * cols, 0.0);
        }
        self.rows = rows;
        self.cols = cols;
        if !keep_buffer {
            self.original_rows = rows;
            self.original_cols = cols;
        }
        warning
    }

    /// Rewrites the buffer in the opposite storage order. The logical matrix
    /// is unchanged.
    pub fn toggle_storage_order(&mut self) {
        let (rows, cols) = (self.rows, self.cols);
        let target = self.order.flipped();
        let old = self.as_slice();
        let mut data = vec![0.0; rows * cols];
        for c in 0..cols {
            for r in 0..rows {
                data[target.offset(r, c, rows, cols)] = old[self.order.offset(r, c, rows, cols)];
            }
        }
        self.buffer = Buffer::Owned(data);
        self.order = target;
        self.original_rows = rows;
        self.original_cols = cols;
    }

    /// Converts to column-major storage if needed.
    pub fn ensure_column_major(&mut self) {
        if !self.order.is_col_major() {
            self.toggle_storage_order();
        }
    }

    /// Transposes the logical matrix in O(1) by reinterpreting the buffer.
    pub fn transpose(&mut self) {
        self.order = self.order.flipped();
        std::mem::swap(&mut self.rows, &mut self.cols);
        std::mem::swap(&mut self.original_rows, &mut self.original_cols);
    }

    /// Copies shape, storage order and values from `src`.
    ///
    /// An owned buffer of exactly the right size is reused. Version stamps
    /// and the name are left untouched.
    pub fn copy_from(&mut self, src: &Matrix) {
        let n = src.len();
        if matches!(&self.buffer, Buffer::Owned(v) if v.len() == n) {
            self.buffer.make_mut().copy_from_slice(src.as_slice());
        } else {
            self.buffer = Buffer::Owned(src.as_slice().to_vec());
        }
        self.rows = src.rows;
        self.cols = src.cols;
        self.order = src.order;
        self.original_rows = src.rows;
        self.original_cols = src.cols;
    }

    /// Replaces the values with those of a freshly computed result, keeping
    /// version stamps and name.
    pub fn assign(&mut self, result: Matrix) {
        self.rows = result.rows;
        self.cols = result.cols;
        self.order = result.order;
        self.original_rows = result.rows;
        self.original_cols = result.cols;
        self.buffer = Buffer::Owned(result.as_slice().to_vec());
    }

    /// Restores the original shape and refreshes values and storage order
    /// from the matrix this one aliases.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::ShapeMismatch`] when `src` does not have this
    /// matrix's original shape.
    pub fn reset_from_alias(&mut self, src: &Matrix) -> Result<(), MatrixError> {
        if src.shape() != self.original_shape() {
            return Err(MatrixError::ShapeMismatch {
                op: "reset_from_alias",
                lhs: self.original_shape(),
                rhs: src.shape(),
            });
        }
        self.rows = self.original_rows;
        self.cols = self.original_cols;
        self.order = src.order;
        let n = self.len();
        let data = self.buffer.make_mut();
        if data.len() < n {
            data.resize(n, 0.0);
        }
        data[..n].copy_from_slice(src.as_slice());
        Ok(())
    }

    /// Largest absolute element-wise difference to `other`.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::ShapeMismatch`] when shapes differ.
    pub fn max_abs_diff(&self, other: &Matrix) -> Result<f64, MatrixError> {
        if self.shape() != other.shape() {
            return Err(MatrixError::ShapeMismatch {
                op: "max_abs_diff",
                lhs: self.shape(),
                rhs: other.shape(),
            });
        }
        let mut max = 0.0_f64;
        for c in 0..self.cols {
            for r in 0..self.rows {
                let a = self.as_slice()[self.offset(r, c)];
                let b = other.as_slice()[other.offset(r, c)];
                max = max.max((a - b).abs());
            }
        }
        Ok(max)
    }

    /// Copies the values into a column-major host buffer of identical size.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::ExportSize`] if `out.len() != rows * cols`.
    pub fn export_into(&self, out: &mut [f64]) -> Result<(), MatrixError> {
        if out.len() != self.len() {
            return Err(MatrixError::ExportSize {
                expected: self.len(),
                got: out.len(),
            });
        }
        let data = self.as_slice();
        for c in 0..self.cols {
            for r in 0..self.rows {
                out[c * self.rows + r] = data[self.offset(r, c)];
            }
        }
        Ok(())
    }

    /// Returns the values as a new column-major vector.
    pub fn to_col_major_vec(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.len()];
        // Sizes match by construction.
        let _ = self.export_into(&mut out);
        out
    }

    /// Values at original-shape coordinates, used when compacting in place.
    pub(crate) fn original_element(&self, row: usize, col: usize) -> Result<f64, MatrixError> {
        if row >= self.original_rows || col >= self.original_cols {
            return Err(MatrixError::Index {
                row: row + 1,
                col: col + 1,
                rows: self.original_rows,
                cols: self.original_cols,
            });
        }
        let at = self
            .order
            .offset(row, col, self.original_rows, self.original_cols);
        self.buffer
            .as_slice()
            .get(at)
            .copied()
            .ok_or(MatrixError::VectorIndex {
                index: at + 1,
                len: self.buffer.len(),
            })
    }

    /// Flat value at `index` of the originally-shaped buffer.
    pub(crate) fn original_vector_element(&self, index: usize) -> Result<f64, MatrixError> {
        let len = self.original_rows * self.original_cols;
        if index >= len {
            return Err(MatrixError::VectorIndex {
                index: index + 1,
                len,
            });
        }
        self.buffer
            .as_slice()
            .get(index)
            .copied()
            .ok_or(MatrixError::VectorIndex {
                index: index + 1,
                len: self.buffer.len(),
            })
    }

    /// Overwrites the shape and the leading values, used by compaction.
    pub(crate) fn overwrite(&mut self, rows: usize, cols: usize, values: &[f64]) {
        self.rows = rows;
        self.cols = cols;
        let data = self.buffer.make_mut();
        if data.len() < values.len() {
            data.resize(values.len(), 0.0);
        }
        data[..values.len()].copy_from_slice(values);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn grid() -> Matrix {
        Matrix::from_rows(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &[7.0, 8.0, 9.0]]).unwrap()
    }

    #[test]
    fn element_honours_storage_order() {
        let row_major = grid();
        let col_major =
            Matrix::from_vec(3, 3, StorageOrder::ColMajor, vec![1., 4., 7., 2., 5., 8., 3., 6., 9.])
                .unwrap();
        for r in 0..3 {
            for c in 0..3 {
                assert_eq!(row_major.get(r, c).unwrap(), col_major.get(r, c).unwrap());
            }
        }
        assert_eq!(row_major.get(0, 2).unwrap(), 3.0);
    }

    #[test]
    fn out_of_range_read_reports_one_based() {
        let m = Matrix::zeros(2, 2, StorageOrder::ColMajor);
        let err = m.get(3, 0).unwrap_err();
        assert!(
            matches!(
                err,
                MatrixError::Index {
                    row: 4,
                    col: 1,
                    rows: 2,
                    cols: 2
                }
            ),
            "got {err:?}"
        );
    }

    #[test]
    fn out_of_range_write_does_not_mutate() {
        let mut m = Matrix::identity(2);
        assert!(m.set(0, 5, 3.0).is_err());
        assert_eq!(m.as_slice(), &[1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn vector_access_is_bounds_checked() {
        let mut m = Matrix::zeros(1, 3, StorageOrder::ColMajor);
        m.set_vector(2, 4.0).unwrap();
        assert_eq!(m.get_vector(2).unwrap(), 4.0);
        assert!(matches!(
            m.get_vector(3),
            Err(MatrixError::VectorIndex { index: 4, len: 3 })
        ));
    }

    #[test]
    fn dirty_and_clean_versions() {
        let mut m = Matrix::identity(2);
        assert!(!m.is_stale());
        m.mark_dirty();
        assert!(m.is_stale());
        m.mark_clean();
        assert!(!m.is_stale());
        m.mark_dirty_at(10);
        assert_eq!(m.version(), 10);
        m.mark_dirty_at(3);
        assert_eq!(m.version(), 11);
    }

    #[test]
    fn toggle_keeps_logical_values() {
        let mut m = grid();
        m.toggle_storage_order();
        assert_eq!(m.order(), StorageOrder::ColMajor);
        assert_eq!(m.as_slice(), &[1., 4., 7., 2., 5., 8., 3., 6., 9.]);
        assert_eq!(m.get(2, 1).unwrap(), 8.0);
    }

    #[test]
    fn transpose_swaps_shape() {
        let mut m = Matrix::from_rows(&[&[1.0, 2.0, 3.0]]).unwrap();
        m.transpose();
        assert_eq!(m.shape(), (3, 1));
        assert_eq!(m.get(2, 0).unwrap(), 3.0);
    }

    #[test]
    fn leading_and_majority() {
        let m = Matrix::zeros(2, 5, StorageOrder::ColMajor);
        assert_eq!((m.leading(), m.lagging()), (2, 5));
        assert_eq!(m.majority(), Transpose::No);
        let m = Matrix::zeros(2, 5, StorageOrder::RowMajor);
        assert_eq!((m.leading(), m.lagging()), (5, 2));
        assert_eq!(m.majority(), Transpose::Yes);
        assert_eq!(m.minority(), Transpose::No);
    }

    #[test]
    fn resize_without_keep_reallocates() {
        let mut m = Matrix::identity(2);
        assert!(m.resize(3, 1, false).is_none());
        assert_eq!(m.shape(), (3, 1));
        assert_eq!(m.original_shape(), (3, 1));
        assert_eq!(m.as_slice(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn resize_with_keep_reuses_buffer() {
        let mut m =
            Matrix::from_vec(2, 2, StorageOrder::ColMajor, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!(m.resize(1, 3, true).is_none());
        assert_eq!(m.as_slice(), &[1.0, 2.0, 3.0]);
        assert_eq!(m.original_shape(), (2, 2));
    }

    #[test]
    fn resize_beyond_capacity_warns() {
        let mut m = Matrix::identity(2);
        let warning = m.resize(3, 3, true).expect("capacity warning");
        assert_eq!(warning.capacity, 4);
        assert_eq!(warning.requested, (3, 3));
        assert_eq!(m.len(), 9);
        // Writes stay memory-safe.
        m.set(2, 2, 1.0).unwrap();
    }

    #[test]
    fn host_view_detaches_on_write() {
        let host = HostArray::matrix(2, 1, vec![5.0, 6.0]).unwrap();
        let mut m = Matrix::from_host(&host, Ingest::View);
        assert!(!m.is_owned());
        assert_eq!(m.get(1, 0).unwrap(), 6.0);
        m.set(1, 0, 0.5).unwrap();
        assert!(m.is_owned());
        assert_eq!(host.data(), &[5.0, 6.0]);
    }

    #[test]
    fn host_vector_becomes_row() {
        let host = HostArray::vector(vec![1.0, 2.0, 3.0]);
        let m = Matrix::from_host(&host, Ingest::Copy);
        assert_eq!(m.shape(), (1, 3));
        assert!(m.is_owned());
    }

    #[test]
    fn export_is_column_major() {
        let m = grid();
        let mut out = vec![0.0; 9];
        m.export_into(&mut out).unwrap();
        assert_eq!(out, vec![1., 4., 7., 2., 5., 8., 3., 6., 9.]);
        let mut short = vec![0.0; 4];
        assert!(matches!(
            m.export_into(&mut short),
            Err(MatrixError::ExportSize {
                expected: 9,
                got: 4
            })
        ));
    }

    #[test]
    fn copy_from_takes_order_and_shape() {
        let mut dest = Matrix::zeros(3, 3, StorageOrder::ColMajor).with_name("dest");
        dest.copy_from(&grid());
        assert_eq!(dest.order(), StorageOrder::RowMajor);
        assert_eq!(dest.get(1, 2).unwrap(), 6.0);
        assert_eq!(dest.name(), Some("dest"));
    }

    #[test]
    fn reset_from_alias_restores_shape() {
        let src = grid();
        let mut view = grid();
        view.overwrite(2, 2, &[0.0; 4]);
        view.reset_from_alias(&src).unwrap();
        assert_eq!(view.shape(), (3, 3));
        assert_eq!(view.max_abs_diff(&src).unwrap(), 0.0);
    }

    #[test]
    fn max_abs_diff_mixed_orders() {
        let a = grid();
        let mut b = grid();
        b.toggle_storage_order();
        b.set(1, 1, 5.5).unwrap();
        assert_abs_diff_eq!(a.max_abs_diff(&b).unwrap(), 0.5, epsilon = 1e-15);
    }
}
