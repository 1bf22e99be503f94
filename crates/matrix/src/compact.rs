//! In-place removal of flagged rows, columns and vector elements.
//!
//! Both operations read from an alias source when one is given and from the
//! matrix's own buffer at its original shape otherwise. Compaction writes
//! over that buffer, so repeated compaction with different masks needs an
//! alias source holding the full data.

use tracing::trace;

use crate::error::MatrixError;
use crate::matrix::Matrix;

impl Matrix {
    /// Compacts the matrix by omitting rows and columns flagged `true`.
    ///
    /// The source is `alias` when given, else this matrix at its original
    /// shape. The result has shape
    /// `(source_rows - removed_rows, source_cols - removed_cols)` and keeps
    /// the current storage order. A call with no flags set is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::ShapeMismatch`] if the mask lengths differ from
    /// the source shape.
    pub fn remove_rows_and_columns(
        &mut self,
        row_mask: &[bool],
        col_mask: &[bool],
        alias: Option<&Matrix>,
    ) -> Result<(), MatrixError> {
        let removed_rows = row_mask.iter().filter(|&&r| r).count();
        let removed_cols = col_mask.iter().filter(|&&c| c).count();
        if removed_rows == 0 && removed_cols == 0 {
            return Ok(());
        }

        let (old_rows, old_cols) = match alias {
            Some(src) => src.shape(),
            None => self.original_shape(),
        };
        if row_mask.len() != old_rows || col_mask.len() != old_cols {
            return Err(MatrixError::ShapeMismatch {
                op: "remove_rows_and_columns",
                lhs: (row_mask.len(), col_mask.len()),
                rhs: (old_rows, old_cols),
            });
        }

        let new_rows = old_rows - removed_rows;
        let new_cols = old_cols - removed_cols;
        let order = self.order();
        let mut values = vec![0.0; new_rows * new_cols];

        let mut next_col = 0;
        for (j, _) in col_mask.iter().enumerate().filter(|(_, removed)| !**removed) {
            let mut next_row = 0;
            for (k, _) in row_mask.iter().enumerate().filter(|(_, removed)| !**removed) {
                let value = match alias {
                    Some(src) => src.get(k, j)?,
                    None => self.original_element(k, j)?,
                };
                values[order.offset(next_row, next_col, new_rows, new_cols)] = value;
                next_row += 1;
            }
            next_col += 1;
        }

        trace!(removed_rows, removed_cols, new_rows, new_cols, "compacted matrix");
        self.overwrite(new_rows, new_cols, &values);
        Ok(())
    }

    /// Vector analogue of
    /// [`remove_rows_and_columns`](Matrix::remove_rows_and_columns).
    ///
    /// Column vectors (more than one row) lose rows, everything else loses
    /// columns.
    ///
    /// # Errors
    ///
    /// Returns [`MatrixError::ShapeMismatch`] if the mask length differs from
    /// the source length.
    pub fn remove_elements(
        &mut self,
        mask: &[bool],
        alias: Option<&Matrix>,
    ) -> Result<(), MatrixError> {
        let removed = mask.iter().filter(|&&r| r).count();
        if removed == 0 {
            return Ok(());
        }
        let column_vector = self.rows() > 1;
        let old_len = match alias {
            Some(src) => src.len(),
            None => self.original_shape().0 * self.original_shape().1,
        };
        if mask.len() != old_len {
            return Err(MatrixError::ShapeMismatch {
                op: "remove_elements",
                lhs: (mask.len(), 1),
                rhs: (old_len, 1),
            });
        }

        let mut values = Vec::with_capacity(old_len - removed);
        for (j, _) in mask.iter().enumerate().filter(|(_, removed)| !**removed) {
            let value = match alias {
                Some(src) => src.get_vector(j)?,
                None => self.original_vector_element(j)?,
            };
            values.push(value);
        }

        let kept = values.len();
        if column_vector {
            self.overwrite(kept, 1, &values);
        } else {
            self.overwrite(1, kept, &values);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::StorageOrder;

    fn grid() -> Matrix {
        Matrix::from_rows(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0], &[7.0, 8.0, 9.0]]).unwrap()
    }

    #[test]
    fn removes_middle_row_and_column() {
        let mut m = grid();
        m.remove_rows_and_columns(&[false, true, false], &[false, true, false], None)
            .unwrap();
        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m.get(0, 0).unwrap(), 1.0);
        assert_eq!(m.get(0, 1).unwrap(), 3.0);
        assert_eq!(m.get(1, 0).unwrap(), 7.0);
        assert_eq!(m.get(1, 1).unwrap(), 9.0);
    }

    #[test]
    fn col_major_matches_row_major() {
        let mut a = grid();
        let mut b = grid();
        b.toggle_storage_order();
        let rows = [true, false, false];
        let cols = [false, false, true];
        a.remove_rows_and_columns(&rows, &cols, None).unwrap();
        b.remove_rows_and_columns(&rows, &cols, None).unwrap();
        assert_eq!(b.order(), StorageOrder::ColMajor);
        assert_eq!(a.max_abs_diff(&b).unwrap(), 0.0);
        assert_eq!(a.get(1, 1).unwrap(), 8.0);
    }

    #[test]
    fn repeated_removal_from_alias() {
        let src = grid();
        let mut m = grid();
        m.remove_rows_and_columns(&[true, true, false], &[false, false, false], Some(&src))
            .unwrap();
        assert_eq!(m.shape(), (1, 3));
        m.remove_rows_and_columns(&[false, false, true], &[true, false, false], Some(&src))
            .unwrap();
        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m.get(1, 1).unwrap(), 6.0);
    }

    #[test]
    fn reads_from_alias_when_given() {
        let src = grid();
        let mut m = Matrix::zeros(3, 3, StorageOrder::ColMajor);
        m.remove_rows_and_columns(&[false, false, true], &[true, false, false], Some(&src))
            .unwrap();
        assert_eq!(m.shape(), (2, 2));
        assert_eq!(m.get(0, 0).unwrap(), 2.0);
        assert_eq!(m.get(1, 1).unwrap(), 6.0);
    }

    #[test]
    fn empty_masks_are_noop() {
        let mut m = grid();
        m.remove_rows_and_columns(&[false; 3], &[false; 3], None).unwrap();
        assert_eq!(m.shape(), (3, 3));
    }

    #[test]
    fn mask_length_mismatch() {
        let mut m = grid();
        let err = m
            .remove_rows_and_columns(&[true, false], &[false; 3], None)
            .unwrap_err();
        assert!(matches!(err, MatrixError::ShapeMismatch { .. }));
    }

    #[test]
    fn removes_vector_elements() {
        let mut v = Matrix::from_rows(&[&[1.0, 2.0, 3.0, 4.0]]).unwrap();
        v.remove_elements(&[false, true, false, true], None).unwrap();
        assert_eq!(v.shape(), (1, 2));
        assert_eq!(v.as_slice(), &[1.0, 3.0]);
    }

    #[test]
    fn removes_column_vector_elements_from_alias() {
        let src = Matrix::from_vec(4, 1, StorageOrder::ColMajor, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let mut v = src.clone();
        v.remove_elements(&[true, false, false, false], Some(&src)).unwrap();
        assert_eq!(v.shape(), (3, 1));
        assert_eq!(v.as_slice(), &[2.0, 3.0, 4.0]);
    }
}
