//! Erasure Coding Module
//!
//! Reed-Solomon style erasure coding over GF(2^8) with a simulated disk
//! array.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Erasure Coding Module                             │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                          │
//! │  ┌──────────────┐    ┌──────────────┐    ┌───────────────────────────┐  │
//! │  │   GF(2^8)    │───▶│    Matrix    │───▶│   Encoding Matrix         │  │
//! │  │  Arithmetic  │    │    Engine    │    │   (Vandermonde)           │  │
//! │  └──────────────┘    └──────────────┘    └───────────────────────────┘  │
//! │         │                   │                         │                  │
//! │         └───────────────────┼─────────────────────────┘                  │
//! │                             │                                            │
//! │                   ┌─────────┴─────────┐                                  │
//! │                   │    RAID System    │                                  │
//! │                   │  (disk array)     │                                  │
//! │                   └───────────────────┘                                  │
//! │                                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - **Galois Field** (`galois.rs`): log/antilog table arithmetic with
//!   generator 2 over the polynomial 0x11D.
//!
//! - **Matrix Engine** (`matrix.rs`): byte matrices with field-aware
//!   multiplication against shard buffers and Gauss-Jordan inversion.
//!
//! - **Encoding Matrix Builder** (`vandermonde.rs`): systematic
//!   `(k + m) x k` matrix whose top block is the identity.
//!
//! - **RAID System** (`raid.rs`): encode, drop disks, flip bits, detect,
//!   verify parity and reconstruct.
//!
//! # Usage
//!
//! ```rust
//! use raidsim::ec::RaidSystem;
//! use raidsim::payload;
//!
//! let mut raid = RaidSystem::new(4, 2)?;
//! let data = b"Hello, World!";
//! let shards = payload::split(data, raid.data_shards())?;
//! raid.encode(&shards)?;
//!
//! // Lose two disks and rebuild
//! raid.drop_shard(0)?;
//! raid.drop_shard(5)?;
//! raid.reconstruct_disk()?;
//!
//! let recovered = payload::join(&raid.data_buffers()?, data.len());
//! assert_eq!(recovered, data);
//! # Ok::<(), raidsim::Error>(())
//! ```

pub mod galois;
pub mod matrix;
pub mod raid;
pub mod vandermonde;

#[cfg(test)]
mod proptest;

pub use galois::GaloisField;
pub use matrix::Matrix;
pub use raid::{ArrayState, RaidSystem, RecoveryAction, Shard, Verification};
pub use vandermonde::fixed_vandermonde;
