// Seedable, portable pseudo-random number generator for melodygen.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding.
// Hand-rolled with no RNG crate dependency so that a given seed produces the
// same melody on every platform, which is what the offline renderer and the
// engine tests rely on.
//
// The engine never talks to `MelodyRng` directly. It draws through the
// `RandomSource` trait, which has two operations: an inclusive uniform
// integer and a uniform real in [0, 1). `MelodyRng` is the production
// implementation; `ScriptedSource` replays fixed draws so tests can pin every
// decision the engine makes. It is only built for this crate's own tests and
// under the `test-util` feature.
//
// One generator lives for the lifetime of the engine that owns it. It is
// seeded once (explicitly, or from the clock via `from_entropy`) and is never
// reseeded per draw.

#[cfg(any(test, feature = "test-util"))]
use std::collections::VecDeque;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Source of uniform random draws consumed by the note decision pipeline.
///
/// Each call is an independent fresh draw. Implementations must not share
/// or reseed state with other consumers.
pub trait RandomSource {
    /// Uniform integer in `[low, high]`, inclusive on both ends.
    ///
    /// Callers guarantee `low <= high`.
    fn uniform_int(&mut self, low: usize, high: usize) -> usize;

    /// Uniform real in `[0, 1)`.
    fn uniform_real01(&mut self) -> f64;
}

/// Xoshiro256++ PRNG, the engine's long-lived random source.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MelodyRng {
    s: [u64; 4],
}

impl MelodyRng {
    /// Create a new PRNG seeded from a `u64`.
    ///
    /// Uses SplitMix64 to expand the seed into the 256-bit internal state.
    /// Two generators created with the same seed produce identical streams.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Seed from the system clock. Called once when a host instantiates an
    /// engine without an explicit seed.
    pub fn from_entropy() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x5eed_0f_ca11);
        Self::new(nanos)
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Generate a uniform `f64` in [0, 1) from the upper 53 bits.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Generate a uniform random integer in `[low, high)`.
    ///
    /// Uses rejection sampling to avoid modulo bias.
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range;
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Generate a uniform random `usize` in `[low, high]` (inclusive on both ends).
    ///
    /// Panics if `low > high`.
    pub fn range_usize_inclusive(&mut self, low: usize, high: usize) -> usize {
        assert!(low <= high, "range_usize_inclusive: low must be <= high");
        self.range_u64(low as u64, high as u64 + 1) as usize
    }
}

impl RandomSource for MelodyRng {
    fn uniform_int(&mut self, low: usize, high: usize) -> usize {
        self.range_usize_inclusive(low, high)
    }

    fn uniform_real01(&mut self) -> f64 {
        self.next_f64()
    }
}

/// SplitMix64, used only for expanding a `u64` seed into xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Replays pre-recorded draws. For tests that need to pin rest, repeat,
/// gravity and trill rolls to exact values.
///
/// Integer draws are checked against the requested bounds, and every
/// requested `(low, high)` pair is recorded so tests can assert on the
/// window the selector asked for.
#[cfg(any(test, feature = "test-util"))]
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    reals: VecDeque<f64>,
    ints: VecDeque<usize>,
    /// Every `(low, high)` passed to `uniform_int`, in call order.
    pub int_requests: Vec<(usize, usize)>,
    /// Number of `uniform_real01` calls served so far.
    pub real_draws: usize,
}

#[cfg(any(test, feature = "test-util"))]
impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue real draws, returned in order by `uniform_real01`.
    pub fn with_reals(mut self, reals: impl IntoIterator<Item = f64>) -> Self {
        self.reals.extend(reals);
        self
    }

    /// Queue integer draws, returned in order by `uniform_int`.
    pub fn with_ints(mut self, ints: impl IntoIterator<Item = usize>) -> Self {
        self.ints.extend(ints);
        self
    }

    /// True once every queued draw has been consumed.
    pub fn is_exhausted(&self) -> bool {
        self.reals.is_empty() && self.ints.is_empty()
    }
}

#[cfg(any(test, feature = "test-util"))]
impl RandomSource for ScriptedSource {
    fn uniform_int(&mut self, low: usize, high: usize) -> usize {
        self.int_requests.push((low, high));
        let value = self
            .ints
            .pop_front()
            .unwrap_or_else(|| panic!("scripted source: no int queued for [{low}, {high}]"));
        assert!(
            (low..=high).contains(&value),
            "scripted int {value} outside requested [{low}, {high}]"
        );
        value
    }

    fn uniform_real01(&mut self) -> f64 {
        self.real_draws += 1;
        self.reals
            .pop_front()
            .unwrap_or_else(|| panic!("scripted source: no real queued"))
    }
}
