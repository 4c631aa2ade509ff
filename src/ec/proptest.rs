//! Property-Based Tests for Erasure Coding
//!
//! Uses proptest to check the field, the matrix engine and the RAID system
//! across a wide range of inputs and configurations.
//!
//! # Test Properties
//!
//! 1. **Field Laws**: commutativity, absorption, division inverts multiply
//! 2. **Roundtrip Correctness**: encode leaves data shards untouched
//! 3. **Fault Tolerance**: any <= m dropped disks are restored byte-for-byte
//! 4. **Loss Detection**: > m dropped disks fail with `InsufficientShards`
//! 5. **Corruption Repair**: a single parity bit flip is found and fixed

#![cfg(test)]

use proptest::prelude::*;

use super::galois::GaloisField;
use super::matrix::Matrix;
use super::raid::RaidSystem;
use crate::error::Error;
use crate::payload;

// =============================================================================
// Property Strategies
// =============================================================================

/// Strategy for generating small k+m configurations for faster tests.
fn small_ec_config_strategy() -> impl Strategy<Value = (usize, usize)> {
    (1usize..=6, 1usize..=4)
}

/// Strategy for generating small test data.
fn small_data_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..512)
}

/// Strategy for generating a set of distinct shard indices to drop.
fn erasure_strategy(total_shards: usize, max_erasures: usize) -> impl Strategy<Value = Vec<usize>> {
    prop::sample::subsequence((0..total_shards).collect::<Vec<_>>(), 0..=max_erasures)
}

/// Configuration, payload and an erasure pattern of at most m disks.
fn recoverable_case() -> impl Strategy<Value = ((usize, usize), Vec<u8>, Vec<usize>)> {
    small_ec_config_strategy().prop_flat_map(|(k, m)| {
        (Just((k, m)), small_data_strategy(), erasure_strategy(k + m, m))
    })
}

fn encoded(k: usize, m: usize, data: &[u8]) -> Result<RaidSystem, TestCaseError> {
    let mut raid = RaidSystem::new(k, m)?;
    let shards = payload::split(data, k)?;
    raid.encode(&shards)?;
    Ok(raid)
}

// =============================================================================
// Field Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: add and multiply commute.
    #[test]
    fn prop_field_commutative(a in any::<u8>(), b in any::<u8>()) {
        let gf = GaloisField::shared();
        prop_assert_eq!(gf.add(a, b), gf.add(b, a));
        prop_assert_eq!(gf.multiply(a, b), gf.multiply(b, a));
    }

    /// Property: zero absorbs multiplication.
    #[test]
    fn prop_field_zero_absorbs(a in any::<u8>()) {
        let gf = GaloisField::shared();
        prop_assert_eq!(gf.multiply(a, 0), 0);
        prop_assert_eq!(gf.multiply(0, a), 0);
    }

    /// Property: division undoes multiplication.
    #[test]
    fn prop_field_divide_inverts_multiply(a in any::<u8>(), b in 1u8..=255) {
        let gf = GaloisField::shared();
        prop_assert_eq!(gf.divide(gf.multiply(a, b), b)?, a);
    }

    /// Property: multiplication distributes over addition and associates.
    #[test]
    fn prop_field_distributive(a in any::<u8>(), b in any::<u8>(), c in any::<u8>()) {
        let gf = GaloisField::shared();
        prop_assert_eq!(
            gf.multiply(a, gf.add(b, c)),
            gf.add(gf.multiply(a, b), gf.multiply(a, c))
        );
        prop_assert_eq!(
            gf.multiply(gf.multiply(a, b), c),
            gf.multiply(a, gf.multiply(b, c))
        );
    }
}

// =============================================================================
// Matrix Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: any successfully inverted matrix times its inverse is the identity.
    #[test]
    fn prop_invert_gives_identity(
        n in 1usize..=6,
        seed in prop::collection::vec(any::<u8>(), 36),
    ) {
        let gf = GaloisField::shared();
        let rows: Vec<Vec<u8>> = seed.chunks(6).take(n).map(|r| r[..n].to_vec()).collect();
        let m = Matrix::from_rows(&rows)?;

        match m.invert(gf) {
            Ok(inv) => {
                prop_assert!(m.mul(gf, &inv)?.is_identity());
                prop_assert!(inv.mul(gf, &m)?.is_identity());
            }
            Err(Error::SingularMatrix) => {}
            Err(e) => return Err(e.into()),
        }
    }
}

// =============================================================================
// RAID Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Property: encoding leaves the data shards in slots [0, k) unchanged.
    #[test]
    fn prop_roundtrip_identity_block(
        (k, m) in small_ec_config_strategy(),
        data in small_data_strategy(),
    ) {
        let raid = encoded(k, m, &data)?;
        let shards = payload::split(&data, k)?;

        let buffers = raid.data_buffers()?;
        for (i, shard) in shards.iter().enumerate() {
            prop_assert_eq!(buffers[i], shard.as_slice());
        }
        prop_assert_eq!(payload::join(&buffers, data.len()), data);
        prop_assert!(raid.verify()?.is_consistent());
    }

    /// Property: any pattern of up to m dropped disks is restored exactly.
    #[test]
    fn prop_any_erasure_pattern(((k, m), data, erasures) in recoverable_case()) {
        let mut raid = encoded(k, m, &data)?;
        let before = raid.disk_array().to_vec();

        for &index in &erasures {
            raid.drop_shard(index)?;
        }
        raid.reconstruct_disk()?;

        prop_assert_eq!(raid.disk_array(), before.as_slice(),
            "Recovery failed for k={}, m={}, erasures={:?}", k, m, erasures);
    }

    /// Property: losing more than m disks is reported, never silently "repaired".
    #[test]
    fn prop_too_many_erasures_fail(
        (k, m) in small_ec_config_strategy(),
        data in small_data_strategy(),
        offset in 0usize..16,
    ) {
        let mut raid = encoded(k, m, &data)?;
        let total = k + m;
        for i in 0..=m {
            raid.drop_shard((offset + i) % total)?;
        }

        let result = raid.reconstruct_disk();
        prop_assert!(matches!(result, Err(Error::InsufficientShards { .. })), "{:?}", result);
    }

    /// Property: a single parity bit flip is flagged alone and repaired exactly.
    #[test]
    fn prop_parity_bit_flip_repaired(
        (k, m) in (1usize..=6, 2usize..=4),
        data in small_data_strategy(),
        parity in 0usize..4,
        bit in any::<prop::sample::Index>(),
    ) {
        let parity = parity % m;
        let mut raid = encoded(k, m, &data)?;
        let before = raid.disk_array().to_vec();
        let bits = raid.shard(k + parity)?.as_bytes().map(|b| b.len() * 8).unwrap_or(0);

        raid.create_bit_flip(k + parity, bit.index(bits))?;

        let v = raid.verify()?;
        for (i, &valid) in v.parity_valid.iter().enumerate() {
            prop_assert_eq!(valid, i != parity);
        }

        raid.reconstruct_corruption()?;
        prop_assert_eq!(raid.disk_array(), before.as_slice());
    }

    /// Property: a data bit flip makes every parity shard disagree.
    #[test]
    fn prop_data_bit_flip_detected(
        (k, m) in small_ec_config_strategy(),
        data in small_data_strategy(),
        disk in any::<prop::sample::Index>(),
        bit in any::<prop::sample::Index>(),
    ) {
        let mut raid = encoded(k, m, &data)?;
        let disk = disk.index(k);
        let bits = raid.shard(disk)?.as_bytes().map(|b| b.len() * 8).unwrap_or(0);
        raid.create_bit_flip(disk, bit.index(bits))?;

        prop_assert_eq!(raid.verify()?.invalid_count(), m);
        let result = raid.reconstruct_corruption();
        prop_assert!(
            matches!(result, Err(Error::DataCorruptionUnrecoverable { .. })),
            "{:?}", result
        );
    }
}
