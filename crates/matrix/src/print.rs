//! Debug listing of a matrix as an R `matrix(...)` literal.

use std::fmt;

use crate::matrix::Matrix;

impl fmt::Display for Matrix {
    /// ```text
    /// S: (2 x 2) [col-major]
    /// S = matrix(c(
    ///  1.000000, 0.500000,
    ///  0.500000, 1.000000
    /// ), byrow=TRUE, nrow=2, ncol=2)
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name().unwrap_or("matrix");
        writeln!(
            f,
            "{name}: ({} x {}) [{}-major]",
            self.rows(),
            self.cols(),
            self.order().label()
        )?;
        writeln!(f, "{name} = matrix(c(")?;
        let data = self.as_slice();
        let last = self.len().saturating_sub(1);
        for r in 0..self.rows() {
            for c in 0..self.cols() {
                let value = data[self.order().offset(r, c, self.rows(), self.cols())];
                write!(f, " {value:.6}")?;
                if r * self.cols() + c != last {
                    write!(f, ",")?;
                }
            }
            writeln!(f)?;
        }
        write!(f, "), byrow=TRUE, nrow={}, ncol={})", self.rows(), self.cols())
    }
}
