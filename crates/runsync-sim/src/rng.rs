//! Seeded random draws for fault injection and workload generation.
//!
//! The generator is a splitmix64 stream: a 64-bit counter advanced by a
//! fixed odd increment, scrambled through two xor-multiply rounds per
//! draw. No external RNG crate, no global state; a failing seed replays
//! the exact same schedule on any platform.

/// One independent stream of random draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeterministicRng {
    counter: u64,
}

impl DeterministicRng {
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self { counter: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.counter = self.counter.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut word = self.counter;
        word = (word ^ (word >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        word = (word ^ (word >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        word ^ (word >> 31)
    }

    /// Draw a value in `[0, upper_exclusive)`; `0` when the range is empty.
    pub fn next_bounded(&mut self, upper_exclusive: u64) -> u64 {
        if upper_exclusive == 0 {
            return 0;
        }
        self.next_u64() % upper_exclusive
    }

    /// Decide an event that fires `percent` times out of 100.
    pub fn chance(&mut self, percent: u8) -> bool {
        match percent {
            0 => false,
            p if p >= 100 => true,
            p => self.next_bounded(100) < u64::from(p),
        }
    }

    /// Draw an index into a slice of length `len`, `None` when empty.
    pub fn pick_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        usize::try_from(self.next_bounded(len as u64)).ok()
    }
}
