//! The deterministic stream of trial seeds.

use crate::error::Error;

/// Multiplier for the 128-bit multiplicative generator. Odd, so the
/// state stays odd and never collapses to zero.
const MULTIPLIER: u128 = 0xda94_2042_e4dd_58b5;

/// A multiplicative congruential generator over odd 128-bit state.
/// Each draw returns the high 64 bits, then advances the state. One
/// instance is shared by all workers, advanced only under the search
/// coordinator's lock, which is what keeps seeds unique across threads.
pub struct SeedStream {
    state: u128,
}

impl SeedStream {
    pub fn new(state: u128) -> Self {
        SeedStream { state: state | 1 }
    }

    /// Seeds the stream from 16 bytes of OS randomness.
    pub fn from_entropy() -> Result<Self, Error> {
        let mut bytes = [0u8; 16];
        getrandom::fill(&mut bytes)?;
        Ok(Self::new(u128::from_le_bytes(bytes)))
    }

    pub fn next_seed(&mut self) -> u64 {
        let seed = (self.state >> 64) as u64;
        self.state = self.state.wrapping_mul(MULTIPLIER);
        seed
    }
}
