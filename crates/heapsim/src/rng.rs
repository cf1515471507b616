//! Randomness for the simulation
//!
//! Every probability-driven branch in the collectors goes through a named
//! method on [`Policy`]. The default methods draw from [`Policy::unit`], so a
//! seeded [`RandomPolicy`] makes a run reproducible and a test can override a
//! single decision without touching the rest.

use rand_core::{RngCore, SeedableRng, impls};

/// Fallback state when a seed collapses to zero (xorshift never leaves zero)
const NONZERO_SEED: u64 = 0x853c_49e6_748f_ea9b;

/// xorshift64 generator
#[derive(Debug, Clone)]
pub struct Xorshift64 {
    state: u64,
}

impl Xorshift64 {
    /// Create a generator from a raw state
    pub fn new(state: u64) -> Self {
        Self {
            state: if state == 0 { NONZERO_SEED } else { state },
        }
    }
}

impl RngCore for Xorshift64 {
    fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        let mut s = self.state;
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        self.state = s;
        s
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Xorshift64 {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u64::from_le_bytes(seed))
    }
}

/// Map 64 random bits onto [0, 1)
fn unit_f64(bits: u64) -> f64 {
    (bits >> 11) as f64 / (1u64 << 53) as f64
}

/// Named decision points used by the collectors
pub trait Policy: Send {
    /// Uniform sample in [0, 1)
    fn unit(&mut self) -> f64;

    /// Uniform integer in `0..bound` (0 when `bound` is 0)
    fn below(&mut self, bound: usize) -> usize {
        if bound == 0 {
            return 0;
        }
        ((self.unit() * bound as f64) as usize).min(bound - 1)
    }

    /// Regions claimed by one allocation (1 or 2)
    fn allocation_batch(&mut self) -> usize {
        1 + self.below(2)
    }

    /// Choose a slot among `len` candidates
    fn pick_index(&mut self, len: usize) -> usize {
        self.below(len)
    }

    /// Whether an allocation is humongous
    fn humongous(&mut self, chance: f64) -> bool {
        self.unit() < chance
    }

    /// Fill of a fresh allocation, in [60, 100)
    fn eden_fill(&mut self) -> f64 {
        60.0 + self.below(40) as f64
    }

    /// Liveness of a fresh allocation, in [20, 80)
    fn eden_liveness(&mut self) -> f64 {
        20.0 + self.below(60) as f64
    }

    /// Liveness lost by an old region during concurrent marking, in [30, 60)
    fn old_mark_decay(&mut self) -> f64 {
        30.0 + self.below(30) as f64
    }

    /// Whether a targeted page finishes marking this tick
    fn page_mark_progress(&mut self, chance: f64) -> bool {
        self.unit() < chance
    }

    /// Liveness lost by a page when it finishes marking, in [0, 40)
    fn page_mark_decay(&mut self) -> f64 {
        self.below(40) as f64
    }

    /// Whether the application allocates during a concurrent phase
    fn concurrent_allocation(&mut self, chance: f64) -> bool {
        self.unit() < chance
    }
}

/// Policy backed by a random number generator
#[derive(Debug, Clone)]
pub struct RandomPolicy<R = Xorshift64> {
    rng: R,
}

impl<R: RngCore> RandomPolicy<R> {
    /// Wrap a generator
    pub fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl RandomPolicy<Xorshift64> {
    /// Reproducible policy
    pub fn seeded(seed: u64) -> Self {
        Self::new(Xorshift64::seed_from_u64(seed))
    }

    /// Policy seeded from OS entropy
    pub fn from_entropy() -> Self {
        Self::new(Xorshift64::from_entropy())
    }
}

impl<R: RngCore + Send> Policy for RandomPolicy<R> {
    fn unit(&mut self) -> f64 {
        unit_f64(self.rng.next_u64())
    }
}
