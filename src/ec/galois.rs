//! GF(2^8) Arithmetic
//!
//! Log/antilog table arithmetic over the field generated by the primitive
//! polynomial x^8 + x^4 + x^3 + x^2 + 1 with generator 2.
//!
//! The tables live in a [`GaloisField`] value. A process-wide instance is
//! available through [`GaloisField::shared`]; it is built once and never
//! mutated afterwards.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;

/// Number of elements in the field
pub const FIELD_SIZE: usize = 256;

/// Primitive polynomial x^8 + x^4 + x^3 + x^2 + 1
pub const PRIMITIVE_POLYNOMIAL: u16 = 0x11D;

/// Generator of the multiplicative group
pub const GENERATOR: u8 = 0x02;

static SHARED_FIELD: Lazy<GaloisField> = Lazy::new(GaloisField::new);

/// Precomputed GF(2^8) tables
#[derive(Clone)]
pub struct GaloisField {
    /// exp[i] = GENERATOR^i, doubled so log sums never need a modulo
    exp: [u8; FIELD_SIZE * 2],
    /// log[x] for x != 0; log[0] is unused
    log: [u8; FIELD_SIZE],
}

impl std::fmt::Debug for GaloisField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GaloisField")
            .field("polynomial", &format_args!("{:#x}", PRIMITIVE_POLYNOMIAL))
            .field("generator", &GENERATOR)
            .finish()
    }
}

impl Default for GaloisField {
    fn default() -> Self {
        Self::new()
    }
}

impl GaloisField {
    /// Build the log/antilog tables
    pub fn new() -> Self {
        let mut exp = [0u8; FIELD_SIZE * 2];
        let mut log = [0u8; FIELD_SIZE];

        let mut x: u16 = 1;
        for i in 0..FIELD_SIZE - 1 {
            exp[i] = x as u8;
            log[x as usize] = i as u8;
            x = gf_mul_slow(x as u8, GENERATOR) as u16;
        }
        for i in FIELD_SIZE - 1..FIELD_SIZE * 2 {
            exp[i] = exp[i - (FIELD_SIZE - 1)];
        }

        Self { exp, log }
    }

    /// Process-wide immutable field instance
    pub fn shared() -> &'static GaloisField {
        &SHARED_FIELD
    }

    /// Field addition (XOR). Also subtraction.
    #[inline]
    pub fn add(&self, a: u8, b: u8) -> u8 {
        a ^ b
    }

    /// Field multiplication
    #[inline]
    pub fn multiply(&self, a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        let sum = self.log[a as usize] as usize + self.log[b as usize] as usize;
        self.exp[sum]
    }

    /// Field division, `a / b`
    #[inline]
    pub fn divide(&self, a: u8, b: u8) -> Result<u8> {
        if b == 0 {
            return Err(Error::DivisionByZero);
        }
        if a == 0 {
            return Ok(0);
        }
        let diff = self.log[a as usize] as usize + (FIELD_SIZE - 1) - self.log[b as usize] as usize;
        Ok(self.exp[diff])
    }

    /// Multiplicative inverse
    #[inline]
    pub fn inverse(&self, a: u8) -> Result<u8> {
        self.divide(1, a)
    }

    /// `base` raised to an integer power.
    ///
    /// `exp(x, 0) == 1` for every `x`, including zero.
    pub fn exp(&self, base: u8, power: usize) -> u8 {
        if power == 0 {
            return 1;
        }
        if base == 0 {
            return 0;
        }
        let order = FIELD_SIZE - 1;
        let log = (self.log[base as usize] as usize * (power % order)) % order;
        self.exp[log]
    }

    /// `dst[i] ^= coefficient * src[i]` over the shorter of the two slices
    pub fn mul_slice_xor(&self, coefficient: u8, src: &[u8], dst: &mut [u8]) {
        match coefficient {
            0 => {}
            1 => {
                for (d, s) in dst.iter_mut().zip(src) {
                    *d ^= *s;
                }
            }
            c => {
                let log_c = self.log[c as usize] as usize;
                for (d, &s) in dst.iter_mut().zip(src) {
                    if s != 0 {
                        *d ^= self.exp[log_c + self.log[s as usize] as usize];
                    }
                }
            }
        }
    }
}

/// Carry-less multiply reduced by the primitive polynomial (table generation only)
fn gf_mul_slow(a: u8, b: u8) -> u8 {
    let mut result = 0u8;
    let mut a = a;
    let mut b = b;

    while b != 0 {
        if b & 1 != 0 {
            result ^= a;
        }
        let high_bit = a & 0x80;
        a <<= 1;
        if high_bit != 0 {
            a ^= (PRIMITIVE_POLYNOMIAL & 0xFF) as u8;
        }
        b >>= 1;
    }
    result
}

// =============================================================================
// Tests
// =============================================================================
