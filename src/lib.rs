//! raidsim - Erasure-Coded Disk Array Simulator
//!
//! A Reed-Solomon style erasure-coding engine over GF(2^8). Data is split
//! into `k` data shards, `m` parity shards are computed with a systematic
//! Vandermonde-derived encoding matrix, and all `k + m` shards are kept in a
//! simulated disk array. Any `k` surviving shards are enough to rebuild the
//! rest.
//!
//! # Architecture
//!
//! ```text
//! payload → split → RaidSystem::encode → disk array
//!                                          │  drop / bit flip
//!                                          ▼
//!           join ← data shards ← detect / verify / reconstruct
//! ```
//!
//! # Modules
//!
//! - [`ec`] - Field arithmetic, matrix engine, encoding matrix, RAID system
//! - [`config`] - Shard geometry and YAML loading
//! - [`error`] - Error types
//! - [`payload`] - Payload split/join
//! - [`render`] - Hex/binary rendering for the CLI
//! - [`shared`] - Lock-protected handle for concurrent callers

pub mod config;
pub mod ec;
pub mod error;
pub mod payload;
pub mod render;
pub mod shared;

// Re-export commonly used types
pub use config::RaidConfig;
pub use ec::{ArrayState, GaloisField, Matrix, RaidSystem, RecoveryAction, Shard, Verification};
pub use error::{Error, Result};
pub use shared::SharedRaidSystem;
