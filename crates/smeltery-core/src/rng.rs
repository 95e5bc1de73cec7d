//! Seeded randomness for byproduct rolls.
//!
//! SplitMix64 keeps eight bytes of state and produces the same stream on
//! every platform, so two engines built with the same seed leave exactly the
//! same charcoal behind.

use crate::fixed::Fixed64;
use serde::{Deserialize, Serialize};

const GOLDEN_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// SplitMix64 generator owned by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimRng {
    state: u64,
}

impl SimRng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(GOLDEN_GAMMA);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// Uniform draw in `[0, 1)`: the top 32 output bits become the fraction.
    pub fn next_unit(&mut self) -> Fixed64 {
        Fixed64::from_bits((self.next_u64() >> 32) as i64)
    }

    /// Draw once and report whether the draw is strictly above `threshold`.
    pub fn roll_above(&mut self, threshold: Fixed64) -> bool {
        self.next_unit() > threshold
    }

    /// Seed for a generator that continues this stream.
    pub fn state(&self) -> u64 {
        self.state
    }
}

impl Default for SimRng {
    fn default() -> Self {
        Self::new(0x5EED_F0E1)
    }
}
