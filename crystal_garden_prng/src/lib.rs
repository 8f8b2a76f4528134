// Deterministic, portable pseudo-random number generator.
//
// Implements xoshiro256** (Blackman & Vigna, 2019) seeded via SplitMix64.
// Hand-rolled with no external dependencies so that the same seed produces
// the same stream on every platform, compiler version, and optimization
// level.
//
// This crate is the only source of randomness in the Crystal Garden project.
// The simulation engine (`crystal_garden_sim`) owns exactly one `GardenRng`,
// and every random decision — genome generation, tropism noise, branching,
// seeding, crystallization selection — draws from it. Replaying a run with
// the same seed and the same inputs reproduces the same state.
//
// **Critical constraint: determinism.** Every method must produce identical
// output given the same prior state. No stdlib PRNG, no OS entropy, no
// floating-point in the core generator.

use serde::{Deserialize, Serialize};

/// Xoshiro256** PRNG — the project's sole source of randomness.
///
/// The state serializes with the rest of the engine so that a saved
/// simulation resumes with an identical random stream.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GardenRng {
    s: [u64; 4],
}

impl GardenRng {
    /// Create a new PRNG from a `u64` seed, expanded to the 256-bit state
    /// with SplitMix64 (the seeding scheme recommended by the xoshiro
    /// authors).
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

    /// Next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = self.s[1].wrapping_mul(5).rotate_left(7).wrapping_mul(9);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Next `u32`, taken from the upper half of a `u64` draw.
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Uniform `f32` in `[0, 1)` — upper 24 bits fill the f32 mantissa.
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u64() >> 40) as f32 / (1u64 << 24) as f32
    }

    /// Uniform `f64` in `[0, 1)` — upper 53 bits fill the f64 mantissa.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Fill `buf` with random bytes. Used for genome generation.
    pub fn fill_bytes(&mut self, buf: &mut [u8]) {
        for chunk in buf.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    /// Uniform `f32` in `[low, high)`.
    ///
    /// Panics if `low >= high`.
    pub fn range_f32(&mut self, low: f32, high: f32) -> f32 {
        assert!(low < high, "range_f32: low must be less than high");
        low + self.next_f32() * (high - low)
    }

    /// Uniform `u64` in `[low, high)`, via rejection sampling to avoid
    /// modulo bias.
    ///
    /// Panics if `low >= high`.
    pub fn range_u64(&mut self, low: u64, high: u64) -> u64 {
        assert!(low < high, "range_u64: low must be less than high");
        let range = high - low;
        if range.is_power_of_two() {
            return low + (self.next_u64() & (range - 1));
        }
        let threshold = range.wrapping_neg() % range; // = (2^64 - range) % range
        loop {
            let r = self.next_u64();
            if r >= threshold {
                return low + (r % range);
            }
        }
    }

    /// Uniform `u32` in `[low, high)`.
    ///
    /// Panics if `low >= high`.
    pub fn range_u32(&mut self, low: u32, high: u32) -> u32 {
        self.range_u64(low as u64, high as u64) as u32
    }

    /// Uniform `usize` in `[low, high)`.
    ///
    /// Panics if `low >= high`.
    pub fn range_usize(&mut self, low: usize, high: usize) -> usize {
        self.range_u64(low as u64, high as u64) as usize
    }

    /// Uniform `i32` in `[low, high)`. Used for voxel jitter offsets, which
    /// are routinely negative.
    ///
    /// Panics if `low >= high`.
    pub fn range_i32(&mut self, low: i32, high: i32) -> i32 {
        assert!(low < high, "range_i32: low must be less than high");
        let span = (high as i64 - low as i64) as u64;
        low.wrapping_add(self.range_u64(0, span) as i32)
    }

    /// `true` with probability `p`. Values of `p` at or below 0.0 always
    /// return false; at or above 1.0 always true.
    pub fn random_bool(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Fisher–Yates shuffle, in place.
    ///
    /// The growth engine shuffles its tip list every tick before applying
    /// the per-tick work budget, and the lifecycle stepper shuffles owned
    /// cell indices to crystallize a uniform subset without replacement.
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.range_usize(0, i + 1);
            items.swap(i, j);
        }
    }
}

/// SplitMix64, used only to expand a `u64` seed into the xoshiro state.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_stream() {
        let mut a = GardenRng::new(42);
        let mut b = GardenRng::new(42);
        for _ in 0..1000 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn different_seeds_diverge() {
        let mut a = GardenRng::new(42);
        let mut b = GardenRng::new(43);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn unit_floats_in_range() {
        let mut rng = GardenRng::new(7);
        for _ in 0..10_000 {
            let f = rng.next_f32();
            assert!((0.0..1.0).contains(&f), "f32 out of range: {f}");
            let d = rng.next_f64();
            assert!((0.0..1.0).contains(&d), "f64 out of range: {d}");
        }
    }

    #[test]
    fn range_u64_within_bounds() {
        let mut rng = GardenRng::new(99);
        for _ in 0..10_000 {
            let v = rng.range_u64(10, 20);
            assert!((10..20).contains(&v), "range_u64 out of range: {v}");
        }
    }

    #[test]
    fn range_i32_handles_negative_spans() {
        let mut rng = GardenRng::new(5);
        let mut saw_negative = false;
        for _ in 0..10_000 {
            let v = rng.range_i32(-3, 4);
            assert!((-3..4).contains(&v), "range_i32 out of range: {v}");
            if v < 0 {
                saw_negative = true;
            }
        }
        assert!(saw_negative, "negative values should be reachable");
    }

    #[test]
    fn range_f32_within_bounds() {
        let mut rng = GardenRng::new(77);
        for _ in 0..10_000 {
            let v = rng.range_f32(1.5, 3.5);
            assert!(v >= 1.5 && v < 3.5, "range_f32 out of range: {v}");
        }
    }

    #[test]
    fn random_bool_distribution() {
        let mut rng = GardenRng::new(42);
        let n = 10_000;
        let hits = (0..n).filter(|_| rng.random_bool(0.5)).count();
        let pct = hits as f64 / n as f64;
        assert!(
            (0.45..0.55).contains(&pct),
            "random_bool(0.5) should be ~50%, got {:.1}%",
            pct * 100.0
        );
    }

    #[test]
    fn random_bool_extremes() {
        let mut rng = GardenRng::new(42);
        for _ in 0..100 {
            assert!(!rng.random_bool(0.0));
            assert!(rng.random_bool(1.0));
        }
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let mut rng = GardenRng::new(11);
        let mut items: Vec<u32> = (0..50).collect();
        rng.shuffle(&mut items);
        let mut sorted = items.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..50).collect::<Vec<u32>>());
    }

    #[test]
    fn shuffle_determinism() {
        let mut a = GardenRng::new(13);
        let mut b = GardenRng::new(13);
        let mut items_a: Vec<u32> = (0..20).collect();
        let mut items_b: Vec<u32> = (0..20).collect();
        a.shuffle(&mut items_a);
        b.shuffle(&mut items_b);
        assert_eq!(items_a, items_b);
    }

    #[test]
    fn fill_bytes_determinism() {
        let mut a = GardenRng::new(42);
        let mut b = GardenRng::new(42);
        let mut buf_a = [0u8; 6];
        let mut buf_b = [0u8; 6];
        a.fill_bytes(&mut buf_a);
        b.fill_bytes(&mut buf_b);
        assert_eq!(buf_a, buf_b);
    }

    #[test]
    fn serialization_resumes_the_stream() {
        let mut rng = GardenRng::new(42);
        for _ in 0..100 {
            rng.next_u64();
        }
        let json = serde_json::to_string(&rng).unwrap();
        let mut restored: GardenRng = serde_json::from_str(&json).unwrap();
        for _ in 0..100 {
            assert_eq!(rng.next_u64(), restored.next_u64());
        }
    }
}
