//! Speed Profile Executor.
//!
//! Advances `adjusted_rate` once per step event according to which of the
//! four (exhaustive, non-overlapping) phases `step_events_completed` falls
//! into, driven by an [`AccelTickGenerator`].

use crate::accel::AccelTickGenerator;
use crate::block::MotionParams;

/// Wraps an [`AccelTickGenerator`] with the phase logic that turns its
/// ticks into rate changes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct SpeedProfile {
    accel: AccelTickGenerator,
}

impl SpeedProfile {
    /// A fresh profile, ready for a block's first step event.
    pub const fn new() -> Self {
        SpeedProfile {
            accel: AccelTickGenerator::new(),
        }
    }

    /// Re-seed the underlying tick generator's counter to the midpoint of
    /// an acceleration tick. Called when entering a block (Phase A start)
    /// and at the Phase C boundary (deceleration start).
    pub fn reset_midpoint(&mut self, cycles_per_tick: u32) {
        self.accel.reset_midpoint(cycles_per_tick);
    }

    /// Advance the rate for one step event and return the new
    /// `adjusted_rate`. `step_events_completed` is the count *after* the
    /// step event that just occurred (so the first call for a block passes
    /// `1`, not `0`).
    pub fn advance(
        &mut self,
        block: &MotionParams,
        step_events_completed: u32,
        cycles_per_step_event: u32,
        cycles_per_tick: u32,
        adjusted_rate: u32,
    ) -> u32 {
        if step_events_completed < block.accelerate_until {
            // Phase A: accelerate.
            if self.accel.tick(cycles_per_step_event, cycles_per_tick) {
                (adjusted_rate + block.rate_delta).min(block.nominal_rate)
            } else {
                adjusted_rate
            }
        } else if step_events_completed < block.decelerate_after {
            // Phase B: cruise.
            block.nominal_rate
        } else if step_events_completed == block.decelerate_after {
            // Phase C boundary: reseed only, rate unchanged this event.
            self.reset_midpoint(cycles_per_tick);
            adjusted_rate
        } else {
            // Phase D: decelerate.
            if self.accel.tick(cycles_per_step_event, cycles_per_tick) {
                adjusted_rate
                    .saturating_sub(block.rate_delta)
                    .max(block.final_rate)
            } else {
                adjusted_rate
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn block(accelerate_until: u32, decelerate_after: u32) -> MotionParams {
        MotionParams::new(
            [1000, 0, 0],
            0,
            100,
            1000,
            100,
            50,
            accelerate_until,
            decelerate_after,
            255,
        )
    }

    #[test]
    fn cruise_snaps_to_nominal_rate() {
        let mut profile = SpeedProfile::new();
        let b = block(10, 900);
        let rate = profile.advance(&b, 500, 10, 100, 700);
        assert_eq!(rate, b.nominal_rate);
    }

    #[test]
    fn acceleration_clamps_at_nominal_rate() {
        let mut profile = SpeedProfile::new();
        let b = block(10, 900);
        // cycles_per_tick small enough that every step event fires a tick.
        let rate = profile.advance(&b, 1, 10, 1, 980);
        assert_eq!(rate, b.nominal_rate);
    }

    #[test]
    fn deceleration_clamps_at_final_rate_without_underflow() {
        let mut profile = SpeedProfile::new();
        let b = block(10, 900);
        let rate = profile.advance(&b, 901, 10, 1, 120);
        assert_eq!(rate, b.final_rate);
    }

    #[test]
    fn boundary_event_reseeds_without_changing_rate() {
        let mut profile = SpeedProfile::new();
        let b = block(10, 900);
        let rate = profile.advance(&b, 900, 10, 100, 1000);
        assert_eq!(rate, 1000);
    }
}
