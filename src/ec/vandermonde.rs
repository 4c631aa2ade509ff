//! Encoding Matrix Builder
//!
//! Builds the systematic `(data + parity) x data` encoding matrix: a
//! Vandermonde matrix whose top square block is turned into the identity
//! by column operations. Column operations preserve the property that any
//! `data` rows form an invertible submatrix, so any `data` surviving shards
//! are enough to rebuild the rest.
//!
//! Construction follows J. Plank, "Note: Correction to the 1997 Tutorial on
//! Reed-Solomon Coding" (UT CS-03-504).

use crate::ec::galois::{GaloisField, FIELD_SIZE};
use crate::ec::matrix::Matrix;
use crate::error::{Error, Result};
use tracing::{debug, trace};

/// Build the systematic encoding matrix of shape `rows x cols`.
///
/// Rows `[0, cols)` are the identity; rows `[cols, rows)` generate parity.
pub fn fixed_vandermonde(gf: &GaloisField, rows: usize, cols: usize) -> Result<Matrix> {
    if cols == 0 || rows < cols {
        return Err(Error::InvalidDimensions { rows, cols });
    }
    if rows > FIELD_SIZE {
        return Err(Error::InvalidConfiguration(format!(
            "at most {} shards are addressable in GF(2^8), got {}",
            FIELD_SIZE, rows
        )));
    }

    let mut result = Matrix::new(rows, cols)?;
    for r in 0..rows {
        for c in 0..cols {
            result.set(r, c, gf.exp(r as u8, c));
        }
    }
    trace!(?result, "Vandermonde matrix");

    // Row 0 is already [1, 0, .., 0]. Rows above `r` are zero in column `r`
    // by the time we reach it, so only rows r.. need updating.
    for r in 1..cols {
        let factor = result.get(r, r);
        if factor != 1 {
            for r1 in r..rows {
                let v = gf.divide(result.get(r1, r), factor)?;
                result.set(r1, r, v);
            }
        }

        for c1 in 0..cols {
            if c1 == r {
                continue;
            }
            let multiplier = result.get(r, c1);
            if multiplier == 0 {
                continue;
            }
            for r1 in r..rows {
                let v = result.get(r1, c1) ^ gf.multiply(multiplier, result.get(r1, r));
                result.set(r1, c1, v);
            }
        }
    }

    debug!(rows, cols, "Built systematic encoding matrix");
    Ok(result)
}

// =============================================================================
// Tests
// =============================================================================
