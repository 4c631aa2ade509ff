//! Thread-safe handle to a RAID system
//!
//! [`RaidSystem`] has no internal synchronisation. `SharedRaidSystem` puts
//! the whole system behind one exclusive lock so encode, fault injection and
//! reconstruction from different threads never interleave.

use crate::ec::{ArrayState, RaidSystem, RecoveryAction, Shard, Verification};
use crate::error::Result;
use parking_lot::Mutex;
use std::sync::Arc;

/// Cloneable, lock-protected RAID system
#[derive(Clone)]
pub struct SharedRaidSystem {
    inner: Arc<Mutex<RaidSystem>>,
}

impl SharedRaidSystem {
    pub fn new(raid: RaidSystem) -> Self {
        Self {
            inner: Arc::new(Mutex::new(raid)),
        }
    }

    /// Run `f` with exclusive access to the system
    pub fn with<R>(&self, f: impl FnOnce(&mut RaidSystem) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    pub fn encode<B>(&self, data: &[B]) -> Result<()>
    where
        B: AsRef<[u8]> + Sync,
    {
        self.inner.lock().encode(data)
    }

    pub fn drop_shard(&self, index: usize) -> Result<()> {
        self.inner.lock().drop_shard(index)
    }

    pub fn create_bit_flip(&self, index: usize, bit_position: usize) -> Result<()> {
        self.inner.lock().create_bit_flip(index, bit_position)
    }

    pub fn detect_broken_disk(&self) -> Vec<bool> {
        self.inner.lock().detect_broken_disk()
    }

    pub fn verify(&self) -> Result<Verification> {
        self.inner.lock().verify()
    }

    pub fn reconstruct_corruption(&self) -> Result<()> {
        self.inner.lock().reconstruct_corruption()
    }

    pub fn reconstruct_disk(&self) -> Result<RecoveryAction> {
        self.inner.lock().reconstruct_disk()
    }

    pub fn state(&self) -> ArrayState {
        self.inner.lock().state()
    }

    /// Copy of the current disk array
    pub fn snapshot(&self) -> Vec<Shard> {
        self.inner.lock().disk_array().to_vec()
    }
}
