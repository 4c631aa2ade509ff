//! RAID Engine
//!
//! Owns the systematic encoding matrix and a simulated disk array of
//! `data + parity` shard slots. Provides encoding, fault injection (dropped
//! disks and bit flips), detection, and the two repair paths: rebuilding
//! data shards from any `data` survivors, and regenerating parity from
//! complete data.
//!
//! # Limitations
//!
//! [`RaidSystem::verify`] recomputes parity from the stored data and
//! compares it with the stored parity. It cannot tell a corrupted data shard
//! from corrupted parity: a single flipped data bit makes every parity shard
//! disagree. [`RaidSystem::reconstruct_corruption`] therefore treats "every
//! present parity shard is wrong" as data corruption and refuses to repair,
//! rather than overwriting good parity with values derived from bad data.
//! This is a heuristic, not a proof of which shard is damaged.

use crate::config::RaidConfig;
use crate::ec::galois::GaloisField;
use crate::ec::matrix::Matrix;
use crate::ec::vandermonde::fixed_vandermonde;
use crate::error::{Error, Result};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

// =============================================================================
// Shard Slots
// =============================================================================

/// One disk in the array
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shard {
    /// Disk holds a buffer, possibly corrupted
    Present(Vec<u8>),
    /// Disk has been lost
    Absent,
}

impl Shard {
    pub fn is_present(&self) -> bool {
        matches!(self, Shard::Present(_))
    }

    /// Buffer contents, if the disk is present
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Shard::Present(buf) => Some(buf),
            Shard::Absent => None,
        }
    }
}

/// Observed condition of the disk array
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ArrayState {
    /// Nothing encoded yet
    Empty,
    /// All disks present and parity consistent
    Encoded,
    /// At least one disk lost, enough remain to rebuild
    Degraded,
    /// All disks present, some parity disagrees with data
    Corrupted,
    /// Too many disks lost, or every parity shard disagrees with data
    Unrecoverable,
}

impl std::fmt::Display for ArrayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ArrayState::Empty => write!(f, "Empty"),
            ArrayState::Encoded => write!(f, "Encoded"),
            ArrayState::Degraded => write!(f, "Degraded"),
            ArrayState::Corrupted => write!(f, "Corrupted"),
            ArrayState::Unrecoverable => write!(f, "Unrecoverable"),
        }
    }
}

/// Result of comparing stored parity against parity recomputed from data
#[derive(Debug, Clone)]
pub struct Verification {
    /// One entry per parity shard: present and byte-equal to the recomputation
    pub parity_valid: Vec<bool>,
    /// Parity recomputed from the current data shards
    pub recomputed: Vec<Vec<u8>>,
}

impl Verification {
    /// Whether every parity shard matched
    pub fn is_consistent(&self) -> bool {
        self.parity_valid.iter().all(|&ok| ok)
    }

    /// Number of parity shards that did not match
    pub fn invalid_count(&self) -> usize {
        self.parity_valid.iter().filter(|&&ok| !ok).count()
    }
}

/// What [`RaidSystem::reconstruct_disk`] had to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RecoveryAction {
    /// Every disk was present; nothing changed
    Intact,
    /// Only parity disks were lost and have been regenerated
    ParityRepaired,
    /// Data disks were rebuilt, then parity regenerated
    DataRebuilt,
}

// =============================================================================
// RAID System
// =============================================================================

/// Erasure-coded disk array
pub struct RaidSystem {
    /// Process-wide field tables
    gf: &'static GaloisField,
    /// Shard geometry
    config: RaidConfig,
    /// `(data + parity) x data` systematic encoding matrix
    encoding_matrix: Matrix,
    /// Parity rows of the encoding matrix
    parity_matrix: Matrix,
    /// One slot per disk
    disk_array: Vec<Shard>,
    /// Set by the first successful encode
    encoded: bool,
}

impl std::fmt::Debug for RaidSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RaidSystem")
            .field("data_shards", &self.config.data_shards)
            .field("parity_shards", &self.config.parity_shards)
            .field("shard_capacity", &self.config.shard_capacity)
            .field("encoded", &self.encoded)
            .finish()
    }
}

impl RaidSystem {
    /// Create a system with the default shard capacity
    pub fn new(data_shards: usize, parity_shards: usize) -> Result<Self> {
        Self::with_config(RaidConfig::new(data_shards, parity_shards))
    }

    /// Create a system from a validated configuration.
    ///
    /// The disk array starts zero-filled, which is a consistent encoding of
    /// all-zero data.
    pub fn with_config(config: RaidConfig) -> Result<Self> {
        config.validate()?;

        let gf = GaloisField::shared();
        let total = config.total_shards();
        let encoding_matrix = fixed_vandermonde(gf, total, config.data_shards)?;
        let parity_rows: Vec<usize> = (config.data_shards..total).collect();
        let parity_matrix = encoding_matrix.sub_matrix(&parity_rows)?;

        info!(
            data_shards = config.data_shards,
            parity_shards = config.parity_shards,
            shard_capacity = config.shard_capacity,
            "Created RAID system"
        );

        Ok(Self {
            gf,
            disk_array: vec![Shard::Present(vec![0u8; config.shard_capacity]); total],
            config,
            encoding_matrix,
            parity_matrix,
            encoded: false,
        })
    }

    /// Number of data shards
    pub fn data_shards(&self) -> usize {
        self.config.data_shards
    }

    /// Number of parity shards
    pub fn parity_shards(&self) -> usize {
        self.config.parity_shards
    }

    /// Total number of shards
    pub fn total_shards(&self) -> usize {
        self.config.total_shards()
    }

    /// Maximum shard length in bytes
    pub fn shard_capacity(&self) -> usize {
        self.config.shard_capacity
    }

    pub fn config(&self) -> &RaidConfig {
        &self.config
    }

    pub fn encoding_matrix(&self) -> &Matrix {
        &self.encoding_matrix
    }

    /// All disk slots, data first
    pub fn disk_array(&self) -> &[Shard] {
        &self.disk_array
    }

    /// One disk slot
    pub fn shard(&self, index: usize) -> Result<&Shard> {
        self.check_index(index)?;
        Ok(&self.disk_array[index])
    }

    /// Borrow every data shard buffer; fails if any data disk is absent
    pub fn data_buffers(&self) -> Result<Vec<&[u8]>> {
        self.disk_array[..self.data_shards()]
            .iter()
            .enumerate()
            .map(|(index, shard)| shard.as_bytes().ok_or(Error::DataShardAbsent { index }))
            .collect()
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.total_shards() {
            return Err(Error::InvalidShardIndex {
                index,
                total: self.total_shards(),
            });
        }
        Ok(())
    }

    // =========================================================================
    // Encoding
    // =========================================================================

    /// Encode `data_shards` equal-length buffers into the whole disk array
    #[instrument(skip(self, data), fields(buffers = data.len()))]
    pub fn encode<B>(&mut self, data: &[B]) -> Result<()>
    where
        B: AsRef<[u8]> + Sync,
    {
        if data.len() != self.data_shards() {
            return Err(Error::DimensionMismatch {
                expected: self.data_shards(),
                actual: data.len(),
            });
        }
        if let Some(len) = data
            .iter()
            .map(|b| b.as_ref().len())
            .find(|&len| len > self.shard_capacity())
        {
            return Err(Error::ShardCapacityExceeded {
                len,
                capacity: self.shard_capacity(),
            });
        }

        let shards = self.encoding_matrix.multiply(self.gf, data)?;
        let shard_len = shards[0].len();
        self.disk_array = shards.into_iter().map(Shard::Present).collect();
        self.encoded = true;

        debug!(
            "Encoded {} data shards into {} shards of {} bytes each",
            self.data_shards(),
            self.total_shards(),
            shard_len
        );
        Ok(())
    }

    // =========================================================================
    // Fault Injection
    // =========================================================================

    /// Mark a disk as lost
    pub fn drop_shard(&mut self, index: usize) -> Result<()> {
        self.check_index(index)?;
        warn!(index, "Dropping shard");
        self.disk_array[index] = Shard::Absent;
        Ok(())
    }

    /// Flip bit `bit_position % 8` of byte `bit_position / 8` in a present shard
    pub fn create_bit_flip(&mut self, index: usize, bit_position: usize) -> Result<()> {
        self.check_index(index)?;
        let buf = match &mut self.disk_array[index] {
            Shard::Present(buf) => buf,
            Shard::Absent => return Err(Error::TargetShardAbsent { index }),
        };

        let bits = buf.len() * 8;
        if bit_position >= bits {
            return Err(Error::InvalidBitPosition {
                position: bit_position,
                bits,
            });
        }

        buf[bit_position / 8] ^= 1 << (bit_position % 8);
        warn!(index, bit_position, "Flipped bit in shard");
        Ok(())
    }

    // =========================================================================
    // Detection
    // =========================================================================

    /// One entry per disk: `true` if present. Says nothing about corruption.
    pub fn detect_broken_disk(&self) -> Vec<bool> {
        self.disk_array.iter().map(Shard::is_present).collect()
    }

    /// Recompute parity from data and compare against stored parity.
    ///
    /// See the module docs for why a mismatch does not prove the parity
    /// shard itself is bad.
    #[instrument(skip(self))]
    pub fn verify(&self) -> Result<Verification> {
        let data = self.data_buffers()?;
        let recomputed = self.parity_matrix.multiply(self.gf, &data)?;

        let parity_valid: Vec<bool> = self.disk_array[self.data_shards()..]
            .iter()
            .zip(&recomputed)
            .map(|(shard, expected)| shard.as_bytes() == Some(expected.as_slice()))
            .collect();

        debug!(?parity_valid, "Verified parity");
        Ok(Verification {
            parity_valid,
            recomputed,
        })
    }

    /// Current condition of the array
    pub fn state(&self) -> ArrayState {
        if !self.encoded {
            return ArrayState::Empty;
        }

        let present = self.disk_array.iter().filter(|s| s.is_present()).count();
        if present < self.data_shards() {
            return ArrayState::Unrecoverable;
        }
        if present < self.total_shards() {
            return ArrayState::Degraded;
        }

        match self.verify() {
            Ok(v) if v.is_consistent() => ArrayState::Encoded,
            Ok(v) if v.invalid_count() == self.parity_shards() => ArrayState::Unrecoverable,
            Ok(_) => ArrayState::Corrupted,
            Err(_) => ArrayState::Unrecoverable,
        }
    }

    // =========================================================================
    // Reconstruction
    // =========================================================================

    /// Regenerate every invalid parity shard from the current data.
    ///
    /// Fails with `DataCorruptionUnrecoverable` when every present parity
    /// shard disagrees with the data. When no parity shard is present there
    /// is nothing to disagree with and all parity is regenerated.
    #[instrument(skip(self))]
    pub fn reconstruct_corruption(&mut self) -> Result<()> {
        let verification = self.verify()?;
        let data_shards = self.data_shards();

        let present: Vec<bool> = self.disk_array[data_shards..]
            .iter()
            .map(Shard::is_present)
            .collect();
        let any_present = present.iter().any(|&p| p);
        let any_present_valid = verification
            .parity_valid
            .iter()
            .zip(&present)
            .any(|(&valid, &p)| valid && p);

        if any_present && !any_present_valid {
            error!(
                parity_shards = self.parity_shards(),
                "Every parity shard disagrees with data, assuming data corruption"
            );
            return Err(Error::DataCorruptionUnrecoverable {
                parity_shards: self.parity_shards(),
            });
        }

        let mut repaired = 0;
        for (i, (valid, recomputed)) in verification
            .parity_valid
            .into_iter()
            .zip(verification.recomputed)
            .enumerate()
        {
            if !valid {
                self.disk_array[data_shards + i] = Shard::Present(recomputed);
                repaired += 1;
            }
        }

        if repaired > 0 {
            info!(repaired, "Repaired parity shards");
        }
        Ok(())
    }

    /// Rebuild all data shards from the first `data_shards` slots marked
    /// valid in `validity_mask`.
    #[instrument(skip(self, validity_mask))]
    pub fn reconstruct_data_disk(&mut self, validity_mask: &[bool]) -> Result<()> {
        if validity_mask.len() != self.total_shards() {
            return Err(Error::DimensionMismatch {
                expected: self.total_shards(),
                actual: validity_mask.len(),
            });
        }

        let survivors: Vec<usize> = validity_mask
            .iter()
            .enumerate()
            .filter(|&(_, &valid)| valid)
            .map(|(i, _)| i)
            .take(self.data_shards())
            .collect();
        if survivors.len() < self.data_shards() {
            return Err(Error::InsufficientShards {
                available: survivors.len(),
                required: self.data_shards(),
            });
        }

        let buffers: Vec<&[u8]> = survivors
            .iter()
            .map(|&index| {
                self.disk_array[index]
                    .as_bytes()
                    .ok_or(Error::TargetShardAbsent { index })
            })
            .collect::<Result<_>>()?;

        let decode_matrix = self.encoding_matrix.sub_matrix(&survivors)?;
        let inverse = decode_matrix.invert(self.gf).map_err(|e| {
            error!(?survivors, "Decode matrix for surviving shards is singular");
            e
        })?;
        let recovered = inverse.multiply(self.gf, &buffers)?;

        for (slot, buf) in self.disk_array.iter_mut().zip(recovered) {
            *slot = Shard::Present(buf);
        }

        debug!(?survivors, "Rebuilt data shards");
        Ok(())
    }

    /// Detect lost disks and run whichever repair path applies
    #[instrument(skip(self))]
    pub fn reconstruct_disk(&mut self) -> Result<RecoveryAction> {
        let present = self.detect_broken_disk();
        let (data, parity) = present.split_at(self.data_shards());
        let data_valid = data.iter().filter(|&&p| p).count();
        let parity_valid = parity.iter().filter(|&&p| p).count();

        if data_valid + parity_valid < self.data_shards() {
            return Err(Error::InsufficientShards {
                available: data_valid + parity_valid,
                required: self.data_shards(),
            });
        }

        if data_valid < self.data_shards() {
            info!(data_valid, parity_valid, "Rebuilding lost data shards");
            self.reconstruct_data_disk(&present)?;
            self.reconstruct_corruption()?;
            return Ok(RecoveryAction::DataRebuilt);
        }

        if data_valid == self.data_shards() && parity_valid < self.parity_shards() {
            info!(parity_valid, "Regenerating lost parity shards");
            self.reconstruct_corruption()?;
            return Ok(RecoveryAction::ParityRepaired);
        }

        if data_valid == self.data_shards() && parity_valid == self.parity_shards() {
            debug!("All shards present, nothing to reconstruct");
            return Ok(RecoveryAction::Intact);
        }

        error!(data_valid, parity_valid, "Shard counts outside every recovery path");
        Err(Error::InvalidReconstructionState {
            data_valid,
            parity_valid,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
