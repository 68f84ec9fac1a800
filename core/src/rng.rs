//! Dice random number generation.
//!
//! Every roll command draws from its own PCG stream, derived from a
//! single master seed and a per-message sequence number:
//!   - Concurrent handlers never share RNG state.
//!   - With a fixed seed, the n-th roll always sees the same stream.

use rand::{RngCore, SeedableRng};
use rand_pcg::Pcg64Mcg;
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic RNG stream for one message handler.
pub struct DiceRng {
    pub stream: u64,
    inner: Pcg64Mcg,
}

impl DiceRng {
    /// Create a stream from the master seed and a stream index.
    pub fn new(master_seed: u64, stream: u64) -> Self {
        let derived_seed = master_seed ^ (stream.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            stream,
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }
}

impl RngCore for DiceRng {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}

/// Hands out one DiceRng per message. Shared across handler threads.
pub struct RngBank {
    master_seed: u64,
    next_stream: AtomicU64,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self {
            master_seed,
            next_stream: AtomicU64::new(0),
        }
    }

    /// Seeded bank when `seed` is set, otherwise seeded from the OS.
    pub fn from_optional_seed(seed: Option<u64>) -> Self {
        Self::new(seed.unwrap_or_else(rand::random))
    }

    pub fn next_rng(&self) -> DiceRng {
        let stream = self.next_stream.fetch_add(1, Ordering::Relaxed);
        DiceRng::new(self.master_seed, stream)
    }
}
