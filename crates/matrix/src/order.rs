//! Storage order and the transpose labels handed to dense kernels.

/// Physical layout of a matrix buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum StorageOrder {
    /// Columns are contiguous: element `(r, c)` lives at `c * rows + r`.
    #[default]
    ColMajor,
    /// Rows are contiguous: element `(r, c)` lives at `r * cols + c`.
    RowMajor,
}

impl StorageOrder {
    /// Returns the opposite layout.
    pub fn flipped(self) -> Self {
        match self {
            Self::ColMajor => Self::RowMajor,
            Self::RowMajor => Self::ColMajor,
        }
    }

    /// Returns `true` for column-major storage.
    pub fn is_col_major(self) -> bool {
        matches!(self, Self::ColMajor)
    }

    /// Flat offset of `(row, col)` in a `rows x cols` buffer of this order.
    #[inline(always)]
    pub fn offset(self, row: usize, col: usize, rows: usize, cols: usize) -> usize {
        match self {
            Self::ColMajor => col * rows + row,
            Self::RowMajor => row * cols + col,
        }
    }

    /// Short label used by the pretty printer.
    pub fn label(self) -> &'static str {
        match self {
            Self::ColMajor => "col",
            Self::RowMajor => "row",
        }
    }
}

/// Transpose flag in the convention of a column-major BLAS call.
///
/// A row-major buffer read by a column-major kernel is the transpose of the
/// logical matrix, so its "majority" label is [`Transpose::Yes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transpose {
    /// Use the operand as stored (`'n'`).
    No,
    /// Use the transpose of the operand (`'T'`).
    Yes,
}

impl Transpose {
    /// BLAS character for this flag.
    pub fn as_char(self) -> char {
        match self {
            Self::No => 'n',
            Self::Yes => 'T',
        }
    }

    /// Composes two transpose flags.
    pub fn then(self, other: Transpose) -> Transpose {
        if self == other { Self::No } else { Self::Yes }
    }
}
