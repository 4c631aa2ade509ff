//! Error types for the RAID simulator

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the erasure-coding engine
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid shard configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Configuration file could not be loaded or parsed
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // =========================================================================
    // Field / Matrix Errors
    // =========================================================================
    /// Matrix requested with a zero dimension or ragged rows
    #[error("Invalid matrix dimensions: {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },

    /// Operand shapes do not line up
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Division by the zero field element
    #[error("Division by zero in GF(2^8)")]
    DivisionByZero,

    /// Matrix has no inverse
    #[error("Matrix is singular and cannot be inverted")]
    SingularMatrix,

    // =========================================================================
    // Disk Array Errors
    // =========================================================================
    /// Shard index out of range
    #[error("Invalid shard index {index}: array has {total} shards")]
    InvalidShardIndex { index: usize, total: usize },

    /// Bit position beyond the end of the shard
    #[error("Invalid bit position {position}: shard holds {bits} bits")]
    InvalidBitPosition { position: usize, bits: usize },

    /// Bit flip requested on a dropped shard
    #[error("Shard {index} is absent")]
    TargetShardAbsent { index: usize },

    /// Data shard required for the operation has been dropped
    #[error("Data shard {index} is absent, reconstruct data first")]
    DataShardAbsent { index: usize },

    /// Buffer larger than the fixed shard capacity
    #[error("Shard of {len} bytes exceeds capacity of {capacity} bytes")]
    ShardCapacityExceeded { len: usize, capacity: usize },

    // =========================================================================
    // Reconstruction Errors
    // =========================================================================
    /// Every parity shard disagrees with the data
    #[error("Data corruption is unrecoverable: all {parity_shards} parity shards are invalid")]
    DataCorruptionUnrecoverable { parity_shards: usize },

    /// Insufficient shards for reconstruction
    #[error("Insufficient shards for reconstruction: have {available}, need {required}")]
    InsufficientShards { available: usize, required: usize },

    /// Shard counts that no reconstruction path covers
    #[error("Invalid reconstruction state: {data_valid} data and {parity_valid} parity shards valid")]
    InvalidReconstructionState {
        data_valid: usize,
        parity_valid: usize,
    },
}
