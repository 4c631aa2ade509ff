//! Text rendering of disk arrays and matrices for the CLI and logs

use crate::ec::{Matrix, Shard};
use std::fmt::{self, Write as _};

/// Hex table of a disk array, one line per disk
pub struct DiskArrayTable<'a> {
    shards: &'a [Shard],
    data_shards: usize,
}

impl<'a> DiskArrayTable<'a> {
    pub fn new(shards: &'a [Shard], data_shards: usize) -> Self {
        Self {
            shards,
            data_shards,
        }
    }
}

impl fmt::Display for DiskArrayTable<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, shard) in self.shards.iter().enumerate() {
            let kind = if i < self.data_shards { "data" } else { "parity" };
            write!(f, "disk {:>3} {:<6} |", i, kind)?;
            match shard {
                Shard::Present(buf) => {
                    for b in buf {
                        write!(f, " {:02x}", b)?;
                    }
                }
                Shard::Absent => write!(f, " <absent>")?,
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Hex table of a matrix under a heading
pub fn matrix_table(name: &str, matrix: &Matrix) -> String {
    let mut out = format!("{}:\n", name);
    for row in matrix.iter_rows() {
        for v in row {
            let _ = write!(out, "{:02x} ", v);
        }
        out.push('\n');
    }
    out
}

/// Space-separated 8-bit binary rendering of a byte string
pub fn bit_string(data: &[u8]) -> String {
    data.iter()
        .map(|b| format!("{:08b}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
