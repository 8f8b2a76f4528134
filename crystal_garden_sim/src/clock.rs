// Simulated day/night clock and tick conversion.
//
// Simulated time is a single scalar: the angular position of the day/night
// cycle. A full cycle is τ radians and corresponds to 86,400,000 ms of real
// time at 1× rate. One simulation tick is a fixed angular increment
// (`RADIANS_PER_TICK`, a tunable constant — the tick-to-angle ratio is not a
// guaranteed reproduction of any particular historical run). The external
// rate multiplier scales real time into cycle angle: 0 pauses the garden,
// large values fast-forward it. Engine behavior is identical in shape at
// any rate — only the real-time-to-tick ratio changes.
//
// `ticks_for_elapsed` carries the sub-tick angular remainder across calls,
// so feeding the clock many small real-time slices yields the same tick
// count as one large slice.
//
// See also: `engine.rs` which advances the clock once per tick and reads
// the sun direction for tropism, `catchup.rs` which seeds the clock from a
// persisted checkpoint and converts offline gaps into tick batches.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Real milliseconds per full day/night cycle at 1× rate.
pub const DAY_MS: f64 = 86_400_000.0;

/// Cycle angle consumed by one simulation tick, in radians.
pub const RADIANS_PER_TICK: f64 = 2.0;

/// The simulated clock: cycle angle, wall-time anchor, and rate multiplier.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimClock {
    /// Current cycle angle in `[0, τ)`. Drives the sun position.
    angle: f64,
    /// Simulated wall-clock timestamp in ms — advances with ticks and
    /// stamps birth records.
    timestamp_ms: f64,
    /// Real-time multiplier. 0 = paused.
    rate: f64,
    /// Sub-tick angular remainder retained between `ticks_for_elapsed`
    /// calls so fractional advance is never dropped.
    residual: f64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            angle: 0.0,
            timestamp_ms: 0.0,
            rate: 1.0,
            residual: 0.0,
        }
    }

    pub const fn rate(&self) -> f64 {
        self.rate
    }

    /// Set the rate multiplier. Negative input clamps to 0 (paused).
    pub fn set_rate(&mut self, rate: f64) {
        self.rate = rate.max(0.0);
    }

    pub const fn angle(&self) -> f64 {
        self.angle
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms as i64
    }

    /// Anchor the clock at a wall-clock timestamp, deriving the cycle
    /// angle from the time of day. Used when seeding from a checkpoint.
    pub fn set_timestamp(&mut self, timestamp_ms: i64) {
        self.timestamp_ms = timestamp_ms as f64;
        self.angle = (timestamp_ms as f64).rem_euclid(DAY_MS) / DAY_MS * TAU;
        self.residual = 0.0;
    }

    /// Convert an elapsed real-time span into whole simulation ticks at
    /// the current rate, carrying the fractional remainder. Returns 0 when
    /// paused.
    pub fn ticks_for_elapsed(&mut self, elapsed_ms: f64) -> u64 {
        if self.rate <= 0.0 || elapsed_ms <= 0.0 {
            return 0;
        }
        let radians = elapsed_ms / DAY_MS * TAU * self.rate;
        let total = self.residual + radians;
        let ticks = (total / RADIANS_PER_TICK).floor();
        self.residual = total - ticks * RADIANS_PER_TICK;
        ticks as u64
    }

    /// Advance one tick: the angle moves by `RADIANS_PER_TICK` (wrapping at
    /// τ) and the simulated timestamp by the equivalent real time.
    pub fn advance_tick(&mut self) {
        self.angle = (self.angle + RADIANS_PER_TICK).rem_euclid(TAU);
        if self.rate > 0.0 {
            self.timestamp_ms += RADIANS_PER_TICK / TAU * DAY_MS / self.rate;
        }
    }

    /// Unit vector toward the sun, derived from the cycle angle. The sun
    /// arcs across X with a floor on its elevation so tropism always has
    /// an upward component to pull toward.
    pub fn sun_direction(&self) -> [f32; 3] {
        let a = self.angle;
        let x = a.cos() as f32;
        let y = (0.55 + 0.45 * a.sin()) as f32;
        let z = 0.2_f32;
        let len = (x * x + y * y + z * z).sqrt();
        [x / len, y / len, z / len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paused_clock_yields_no_ticks() {
        let mut clock = SimClock::new();
        clock.set_rate(0.0);
        assert_eq!(clock.ticks_for_elapsed(10_000_000.0), 0);
    }

    #[test]
    fn one_full_day_is_tau_over_increment_ticks() {
        let mut clock = SimClock::new();
        clock.set_rate(1.0);
        let expected = (TAU / RADIANS_PER_TICK).floor() as u64;
        assert_eq!(clock.ticks_for_elapsed(DAY_MS), expected);
    }

    #[test]
    fn residual_carries_across_slices() {
        // Many small slices must produce the same tick total as one big
        // slice — the fractional remainder is retained, not dropped.
        let mut sliced = SimClock::new();
        let mut whole = SimClock::new();
        sliced.set_rate(5000.0);
        whole.set_rate(5000.0);

        let total_ms = 600_000.0; // 10 minutes
        let mut sliced_ticks = 0;
        for _ in 0..600 {
            sliced_ticks += sliced.ticks_for_elapsed(total_ms / 600.0);
        }
        let whole_ticks = whole.ticks_for_elapsed(total_ms);
        // Slicing may lag by at most one tick of accumulated float error.
        assert!(
            sliced_ticks.abs_diff(whole_ticks) <= 1,
            "sliced {sliced_ticks} vs whole {whole_ticks}"
        );
    }

    #[test]
    fn rate_scales_tick_count() {
        let mut slow = SimClock::new();
        let mut fast = SimClock::new();
        slow.set_rate(1000.0);
        fast.set_rate(2000.0);
        let slow_ticks = slow.ticks_for_elapsed(DAY_MS);
        let fast_ticks = fast.ticks_for_elapsed(DAY_MS);
        assert!(fast_ticks >= slow_ticks * 2 - 1 && fast_ticks <= slow_ticks * 2 + 1);
    }

    #[test]
    fn advance_tick_wraps_the_angle() {
        let mut clock = SimClock::new();
        for _ in 0..1000 {
            clock.advance_tick();
            assert!((0.0..TAU).contains(&clock.angle()));
        }
    }

    #[test]
    fn timestamp_advances_inversely_with_rate() {
        let mut clock = SimClock::new();
        clock.set_rate(2.0);
        let before = clock.timestamp_ms();
        clock.advance_tick();
        let per_tick_ms = RADIANS_PER_TICK / TAU * DAY_MS / 2.0;
        assert_eq!(clock.timestamp_ms() - before, per_tick_ms as i64);
    }

    #[test]
    fn set_timestamp_derives_time_of_day() {
        let mut clock = SimClock::new();
        // Noon: half a day in → angle is τ/2.
        clock.set_timestamp((DAY_MS / 2.0) as i64);
        assert!((clock.angle() - TAU / 2.0).abs() < 1e-9);
    }

    #[test]
    fn sun_direction_is_unit_length() {
        let mut clock = SimClock::new();
        for _ in 0..100 {
            clock.advance_tick();
            let [x, y, z] = clock.sun_direction();
            let len = (x * x + y * y + z * z).sqrt();
            assert!((len - 1.0).abs() < 1e-5);
            assert!(y > 0.0, "sun elevation never drops below the horizon pull");
        }
    }
}
