//! Payload splitting and joining
//!
//! Turns a byte payload into `data_shards` equal-length buffers, zero-padding
//! the tail, and joins data shards back into the original payload.

use crate::error::{Error, Result};
use tracing::debug;

/// Byte used to pad the last shard
pub const PAD_BYTE: u8 = 0;

/// Shard length needed to hold `data_size` bytes in `data_shards` shards
pub fn calculate_shard_size(data_size: usize, data_shards: usize) -> usize {
    data_size.div_ceil(data_shards)
}

/// Split `data` into `data_shards` buffers of equal length.
///
/// The final bytes are padded with [`PAD_BYTE`]. An empty payload yields
/// `data_shards` empty buffers.
pub fn split(data: &[u8], data_shards: usize) -> Result<Vec<Vec<u8>>> {
    if data_shards == 0 {
        return Err(Error::InvalidConfiguration(
            "data_shards must be greater than 0".to_string(),
        ));
    }

    let shard_size = calculate_shard_size(data.len(), data_shards);
    let mut shards: Vec<Vec<u8>> = Vec::with_capacity(data_shards);

    for i in 0..data_shards {
        let start = std::cmp::min(i * shard_size, data.len());
        let end = std::cmp::min(start + shard_size, data.len());

        let mut shard = data[start..end].to_vec();
        shard.resize(shard_size, PAD_BYTE);
        shards.push(shard);
    }

    debug!(
        "Split {} bytes into {} shards of {} bytes each",
        data.len(),
        data_shards,
        shard_size
    );
    Ok(shards)
}

/// Concatenate data shards and trim to `original_size`
pub fn join<B: AsRef<[u8]>>(shards: &[B], original_size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(original_size);
    for shard in shards {
        data.extend_from_slice(shard.as_ref());
    }
    data.truncate(original_size);
    data
}

// =============================================================================
// Tests
// =============================================================================
