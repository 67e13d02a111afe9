//! xorshift128+ PRNG, SplitMix64-seeded, with perfect save/restore. Every
//! independent stream used by a generation run (`layout`, `rooms`,
//! `connections`, `details`) is one of these, seeded independently so that
//! adding an RNG call to one pass can never perturb another pass's output.

const GOLDEN_GAMMA: u64 = 0x9E3779B97F4A7C15;
const WARMUP_DISCARDS: u32 = 8;

fn split_mix64(seed: &mut u64) -> u64 {
    *seed = seed.wrapping_add(GOLDEN_GAMMA);
    let mut z = *seed;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}

/// Two 64-bit lanes of xorshift128+ state, save/restore-able for exact
/// mid-stream replay.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RngState {
    pub lane0: u64,
    pub lane1: u64,
}

/// A single deterministic RNG stream.
#[derive(Clone, Debug)]
pub struct Rng {
    lane0: u64,
    lane1: u64,
}

impl Rng {
    /// Seed from a single integer: lane0 via `SplitMix64(seed)`, lane1 via
    /// `SplitMix64(seed XOR golden-gamma)`. If both lanes land on zero,
    /// lane1 is forced to 1 (an all-zero state never advances). Discards
    /// the first 8 outputs as warm-up.
    pub fn new(seed: u64) -> Self {
        let mut mix0 = seed;
        let mut mix1 = seed ^ GOLDEN_GAMMA;
        let mut lane0 = split_mix64(&mut mix0);
        let mut lane1 = split_mix64(&mut mix1);
        if lane0 == 0 && lane1 == 0 {
            lane1 = 1;
        }
        let mut rng = Self { lane0, lane1 };
        for _ in 0..WARMUP_DISCARDS {
            rng.next_u64();
        }
        lane0 = rng.lane0;
        lane1 = rng.lane1;
        Self { lane0, lane1 }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        let mut s1 = self.lane0;
        let s0 = self.lane1;
        self.lane0 = s0;
        s1 ^= s1 << 23;
        s1 ^= s1 >> 17;
        s1 ^= s0;
        s1 ^= s0 >> 26;
        self.lane1 = s1;
        self.lane0.wrapping_add(self.lane1)
    }

    /// `[0, 1)`, using the top 53 bits of `next_u64`.
    pub fn next_f64(&mut self) -> f64 {
        let top53 = self.next_u64() >> 11;
        top53 as f64 / ((1u64 << 53) - 1) as f64
    }

    /// Uniform integer in `[lo, hi]`, inclusive on both ends.
    pub fn gen_range_i64(&mut self, lo: i64, hi: i64) -> i64 {
        debug_assert!(lo <= hi);
        if lo == hi {
            return lo;
        }
        let span = (hi - lo + 1) as u64;
        lo + (self.next_u64() % span) as i64
    }

    pub fn gen_range_f64(&mut self, lo: f64, hi: f64) -> f64 {
        lo + self.next_f64() * (hi - lo)
    }

    /// `true` with probability `p`, clamped to `[0, 1]`.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p.clamp(0.0, 1.0)
    }

    pub fn save_state(&self) -> RngState {
        RngState {
            lane0: self.lane0,
            lane1: self.lane1,
        }
    }

    pub fn load_state(&mut self, state: RngState) {
        self.lane0 = state.lane0;
        self.lane1 = state.lane1;
    }

    /// Reconstruct a stream directly from saved lanes, bypassing
    /// SplitMix64 seeding and warm-up (used only to restore a previously
    /// saved stream, never for fresh generation).
    pub fn from_state(state: RngState) -> Self {
        Self {
            lane0: state.lane0,
            lane1: state.lane1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_produces_same_sequence() {
        let mut a = Rng::new(42);
        let mut b = Rng::new(42);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = Rng::new(1);
        let mut b = Rng::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn f64_stays_in_unit_interval() {
        let mut rng = Rng::new(7);
        for _ in 0..1000 {
            let v = rng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn save_and_restore_resumes_identically() {
        let mut rng = Rng::new(99);
        rng.next_u64();
        rng.next_u64();
        let state = rng.save_state();
        let next_from_live = rng.next_u64();

        let mut restored = Rng::from_state(state);
        let next_from_restored = restored.next_u64();
        assert_eq!(next_from_live, next_from_restored);
    }

    #[test]
    fn gen_range_stays_in_bounds() {
        let mut rng = Rng::new(3);
        for _ in 0..500 {
            let v = rng.gen_range_i64(5, 9);
            assert!((5..=9).contains(&v));
        }
    }
}
