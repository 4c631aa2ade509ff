//! Matrix Engine
//!
//! Rectangular byte matrices with GF(2^8)-aware multiplication and
//! Gauss-Jordan inversion. Both the encoder and the reconstruction paths
//! reduce to [`Matrix::multiply`] against a set of shard buffers.

use crate::ec::galois::GaloisField;
use crate::error::{Error, Result};
use tracing::{debug, error, trace};

/// Output size (rows x shard length) above which `multiply` fans rows out
/// over scoped worker threads.
pub const PARALLEL_THRESHOLD: usize = 256 * 1024;

// =============================================================================
// Matrix
// =============================================================================

/// Row-major matrix of field elements with a fixed shape
#[derive(Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<u8>,
}

impl Matrix {
    /// Allocate a zero-filled `rows x cols` matrix
    pub fn new(rows: usize, cols: usize) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions { rows, cols });
        }
        Ok(Self {
            rows,
            cols,
            data: vec![0u8; rows * cols],
        })
    }

    /// `n x n` identity matrix
    pub fn identity(n: usize) -> Result<Self> {
        let mut m = Self::new(n, n)?;
        for i in 0..n {
            m.set(i, i, 1);
        }
        Ok(m)
    }

    /// Build from explicit rows; every row must have the same non-zero length
    pub fn from_rows<R: AsRef<[u8]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut m = Self::new(rows.len(), cols)?;
        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(Error::InvalidDimensions {
                    rows: rows.len(),
                    cols: row.len(),
                });
            }
            m.row_mut(i).copy_from_slice(row);
        }
        Ok(m)
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.data[row * self.cols + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: u8) {
        self.data[row * self.cols + col] = value;
    }

    /// Borrow one row
    pub fn row(&self, row: usize) -> &[u8] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Mutably borrow one row
    pub fn row_mut(&mut self, row: usize) -> &mut [u8] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Iterate over rows
    pub fn iter_rows(&self) -> impl Iterator<Item = &[u8]> {
        self.data.chunks(self.cols)
    }

    /// Copy the listed rows, in order, into a new matrix
    pub fn sub_matrix(&self, row_indices: &[usize]) -> Result<Self> {
        let mut m = Self::new(row_indices.len(), self.cols)?;
        for (dst, &src) in row_indices.iter().enumerate() {
            if src >= self.rows {
                return Err(Error::DimensionMismatch {
                    expected: self.rows,
                    actual: src,
                });
            }
            m.row_mut(dst).copy_from_slice(self.row(src));
        }
        Ok(m)
    }

    /// Whether this is a square identity matrix
    pub fn is_identity(&self) -> bool {
        self.rows == self.cols
            && (0..self.rows)
                .all(|r| (0..self.cols).all(|c| self.get(r, c) == u8::from(r == c)))
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        let (lo, hi) = (a.min(b), a.max(b));
        let (head, tail) = self.data.split_at_mut(hi * self.cols);
        head[lo * self.cols..(lo + 1) * self.cols].swap_with_slice(&mut tail[..self.cols]);
    }

    // =========================================================================
    // Multiplication
    // =========================================================================

    /// Multiply this `m x n` matrix by `n` equal-length buffers.
    ///
    /// Output row `i` is `XOR over k of self[i][k] * buffers[k]`, so the result
    /// is `m` buffers of the input length.
    pub fn multiply<B>(&self, gf: &GaloisField, buffers: &[B]) -> Result<Vec<Vec<u8>>>
    where
        B: AsRef<[u8]> + Sync,
    {
        if buffers.len() != self.cols {
            return Err(Error::DimensionMismatch {
                expected: self.cols,
                actual: buffers.len(),
            });
        }
        let len = buffers[0].as_ref().len();
        if let Some(bad) = buffers.iter().find(|b| b.as_ref().len() != len) {
            return Err(Error::DimensionMismatch {
                expected: len,
                actual: bad.as_ref().len(),
            });
        }

        let mut out = vec![vec![0u8; len]; self.rows];

        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(self.rows);

        if workers > 1 && self.rows * len >= PARALLEL_THRESHOLD {
            let chunk = self.rows.div_ceil(workers);
            trace!(workers, chunk, len, "Parallel matrix multiply");

            let scoped = crossbeam::thread::scope(|s| {
                for (c, rows_out) in out.chunks_mut(chunk).enumerate() {
                    s.spawn(move |_| {
                        for (offset, dst) in rows_out.iter_mut().enumerate() {
                            self.accumulate_row(gf, c * chunk + offset, buffers, dst);
                        }
                    });
                }
            });
            if let Err(panic) = scoped {
                std::panic::resume_unwind(panic);
            }
        } else {
            for (i, dst) in out.iter_mut().enumerate() {
                self.accumulate_row(gf, i, buffers, dst);
            }
        }

        Ok(out)
    }

    fn accumulate_row<B: AsRef<[u8]>>(
        &self,
        gf: &GaloisField,
        row: usize,
        buffers: &[B],
        dst: &mut [u8],
    ) {
        for (&coefficient, src) in self.row(row).iter().zip(buffers) {
            gf.mul_slice_xor(coefficient, src.as_ref(), dst);
        }
    }

    /// Matrix product `self x other`
    pub fn mul(&self, gf: &GaloisField, other: &Matrix) -> Result<Matrix> {
        let rows: Vec<&[u8]> = other.iter_rows().collect();
        let product = self.multiply(gf, &rows)?;
        Matrix::from_rows(&product)
    }

    // =========================================================================
    // Inversion
    // =========================================================================

    /// Invert a square matrix by Gauss-Jordan elimination on `[A | I]`.
    ///
    /// A zero pivot is replaced by the first lower row with a non-zero entry
    /// in that column; `SingularMatrix` is returned only when no such row
    /// exists.
    pub fn invert(&self, gf: &GaloisField) -> Result<Matrix> {
        if self.rows != self.cols {
            return Err(Error::DimensionMismatch {
                expected: self.rows,
                actual: self.cols,
            });
        }
        let n = self.rows;

        let mut work = Matrix::new(n, 2 * n)?;
        for r in 0..n {
            work.row_mut(r)[..n].copy_from_slice(self.row(r));
            work.set(r, n + r, 1);
        }

        for col in 0..n {
            let pivot = match (col..n).find(|&r| work.get(r, col) != 0) {
                Some(p) => p,
                None => {
                    error!(column = col, size = n, "Matrix inversion hit a singular column");
                    return Err(Error::SingularMatrix);
                }
            };
            if pivot != col {
                debug!(column = col, pivot, "Swapping pivot row");
                work.swap_rows(pivot, col);
            }

            let scale = gf.inverse(work.get(col, col))?;
            if scale != 1 {
                for v in work.row_mut(col) {
                    *v = gf.multiply(*v, scale);
                }
            }

            let pivot_row = work.row(col).to_vec();
            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = work.get(r, col);
                if factor != 0 {
                    gf.mul_slice_xor(factor, &pivot_row, work.row_mut(r));
                }
            }
        }

        let mut inverse = Matrix::new(n, n)?;
        for r in 0..n {
            inverse.row_mut(r).copy_from_slice(&work.row(r)[n..]);
        }
        Ok(inverse)
    }
}

impl std::fmt::Debug for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Matrix {}x{}", self.rows, self.cols)?;
        for row in self.iter_rows() {
            writeln!(f, "  {:02x?}", row)?;
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn gf() -> &'static GaloisField {
        GaloisField::shared()
    }

    #[test]
    fn test_new_zero_filled() {
        let m = Matrix::new(2, 3).unwrap();
        assert_eq!(m.rows(), 2);
        assert_eq!(m.cols(), 3);
        assert!(m.iter_rows().all(|r| r == [0, 0, 0]));
    }

    #[test]
    fn test_new_invalid_dimensions() {
        assert_matches!(
            Matrix::new(0, 3),
            Err(Error::InvalidDimensions { rows: 0, cols: 3 })
        );
        assert_matches!(Matrix::new(3, 0), Err(Error::InvalidDimensions { .. }));
    }

    #[test]
    fn test_from_rows_ragged() {
        let rows = vec![vec![1u8, 2], vec![3u8]];
        assert_matches!(Matrix::from_rows(&rows), Err(Error::InvalidDimensions { .. }));

        let empty: Vec<Vec<u8>> = vec![];
        assert_matches!(Matrix::from_rows(&empty), Err(Error::InvalidDimensions { .. }));
    }

    #[test]
    fn test_identity() {
        let m = Matrix::identity(4).unwrap();
        assert!(m.is_identity());
        assert!(!Matrix::new(2, 2).unwrap().is_identity());
    }

    #[test]
    fn test_multiply_identity_passthrough() {
        let id = Matrix::identity(3).unwrap();
        let buffers = vec![b"abcd".to_vec(), b"efgh".to_vec(), b"ijkl".to_vec()];
        let out = id.multiply(gf(), &buffers).unwrap();
        assert_eq!(out, buffers);
    }

    #[test]
    fn test_multiply_known_values() {
        // [1 1]   [a]   [a ^ b]
        // [1 2] x [b] = [a ^ 2b]
        let m = Matrix::from_rows(&[[1u8, 1], [1, 2]]).unwrap();
        let buffers = [[3u8, 0x80], [7u8, 0x80]];
        let out = m.multiply(gf(), &buffers).unwrap();
        assert_eq!(out[0], vec![3 ^ 7, 0]);
        assert_eq!(out[1], vec![3 ^ gf().multiply(2, 7), 0x80 ^ 0x1D]);
    }

    #[test]
    fn test_multiply_dimension_mismatch() {
        let m = Matrix::identity(3).unwrap();
        let two = vec![vec![0u8; 4]; 2];
        assert_matches!(
            m.multiply(gf(), &two),
            Err(Error::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        );

        let uneven = vec![vec![0u8; 4], vec![0u8; 4], vec![0u8; 5]];
        assert_matches!(
            m.multiply(gf(), &uneven),
            Err(Error::DimensionMismatch {
                expected: 4,
                actual: 5
            })
        );
    }

    #[test]
    fn test_multiply_parallel_matches_sequential() {
        let m = Matrix::from_rows(&[
            [1u8, 2, 3, 4],
            [5, 6, 7, 8],
            [9, 10, 11, 12],
            [13, 14, 15, 16],
        ])
        .unwrap();
        let len = PARALLEL_THRESHOLD / 2;
        let buffers: Vec<Vec<u8>> = (0..4)
            .map(|k| (0..len).map(|j| ((j * 31 + k * 7) % 256) as u8).collect())
            .collect();

        let out = m.multiply(gf(), &buffers).unwrap();

        for (i, row) in out.iter().enumerate() {
            for j in (0..len).step_by(4099) {
                let mut expected = 0u8;
                for k in 0..4 {
                    expected ^= gf().multiply(m.get(i, k), buffers[k][j]);
                }
                assert_eq!(row[j], expected, "row {} col {}", i, j);
            }
        }
    }

    #[test]
    fn test_invert_roundtrip() {
        let m = Matrix::from_rows(&[[56u8, 23, 98], [3, 100, 200], [45, 201, 123]]).unwrap();
        let inv = m.invert(gf()).unwrap();
        assert!(m.mul(gf(), &inv).unwrap().is_identity());
        assert!(inv.mul(gf(), &m).unwrap().is_identity());
    }

    #[test]
    fn test_invert_needs_row_swap() {
        // Leading zero pivot, still invertible
        let m = Matrix::from_rows(&[[0u8, 1], [1, 0]]).unwrap();
        let inv = m.invert(gf()).unwrap();
        assert_eq!(inv, m);
    }

    #[test]
    fn test_invert_singular() {
        let m = Matrix::from_rows(&[[1u8, 2], [1, 2]]).unwrap();
        assert_matches!(m.invert(gf()), Err(Error::SingularMatrix));

        let zero = Matrix::new(3, 3).unwrap();
        assert_matches!(zero.invert(gf()), Err(Error::SingularMatrix));
    }

    #[test]
    fn test_invert_non_square() {
        let m = Matrix::new(2, 3).unwrap();
        assert_matches!(m.invert(gf()), Err(Error::DimensionMismatch { .. }));
    }

    #[test]
    fn test_sub_matrix() {
        let m = Matrix::from_rows(&[[1u8, 2], [3, 4], [5, 6]]).unwrap();
        let sub = m.sub_matrix(&[2, 0]).unwrap();
        assert_eq!(sub.row(0), &[5, 6]);
        assert_eq!(sub.row(1), &[1, 2]);
        assert!(m.sub_matrix(&[3]).is_err());
    }
}
