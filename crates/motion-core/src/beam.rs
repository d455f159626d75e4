//! Beam Modulator.
//!
//! Two independent concerns share one struct because they share the same
//! per-step-event cadence: per-step laser pulsing (energy-per-length stays
//! constant across speed changes) and speed-proportional dimming (keeps
//! perceived intensity constant as `adjusted_rate` deviates from
//! `nominal_rate` during accel/decel). Dimming math runs in `fixed::U16F16`
//! so none of it touches the FPU from inside the step ISR.

use fixed::types::{U0F16, U16F16};

use crate::config::FULL_ON_DUTY_THRESHOLD;
use crate::hal::MotionHal;
use crate::timer;

/// Per-step pulsing and speed-proportional dimming state.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct BeamModulator {
    pwm_counter: u32,
    current_duty: u8,
}

impl BeamModulator {
    /// A fresh modulator, laser off.
    pub const fn new() -> Self {
        BeamModulator {
            pwm_counter: 0,
            current_duty: 0,
        }
    }

    /// The duty most recently set via [`BeamModulator::set_intensity`].
    pub fn current_duty(&self) -> u8 {
        self.current_duty
    }

    /// Set the laser's base intensity, driving it to the hardware
    /// immediately. Used both for the continuous (non-raster) dimming path
    /// and to force 0 during raster accel/decel and interlock trips.
    pub fn set_intensity(&mut self, hal: &mut impl MotionHal, duty: u8) {
        self.current_duty = duty;
        hal.set_laser_pwm(duty);
    }

    /// Advance the per-step pulsing counter by one step event, issuing a
    /// pulse (or re-arming continuous full-on) every `beamdynamics_every`
    /// step events. `static_pwm_freq` selects boards whose laser PWM runs
    /// off a fixed-frequency hardware timer shared with other peripherals:
    /// on those boards the one-shot pulse timer is never armed, and duty is
    /// instead held directly on the existing PWM channel.
    pub fn on_step_event(
        &mut self,
        hal: &mut impl MotionHal,
        cycles_per_step_event: u32,
        beamdynamics_every: u32,
        static_pwm_freq: bool,
    ) {
        self.pwm_counter += 1;
        if self.pwm_counter < beamdynamics_every {
            return;
        }
        self.pwm_counter = 1;

        if self.current_duty == 0 {
            return;
        }
        if self.current_duty >= FULL_ON_DUTY_THRESHOLD {
            hal.set_laser_pwm(255);
            return;
        }
        if static_pwm_freq {
            hal.set_laser_pwm(self.current_duty);
            return;
        }
        let pulse_cycles = (beamdynamics_every as u64
            * self.current_duty as u64
            * cycles_per_step_event as u64
            / 256) as u32;
        let (prescaler, ceiling, _) = timer::select_prescaler(pulse_cycles);
        hal.arm_beam_pulse(prescaler, ceiling);
    }

    /// Reset pulsing cadence. Called when a new motion block starts so the
    /// first pulse of a block does not inherit a partial count from the
    /// previous one.
    pub fn reset(&mut self) {
        self.pwm_counter = 0;
    }
}

/// Compute the dimmed intensity for the current step rate, proportionally
/// scaling between the dimming floor and full intensity as the rate
/// approaches its nominal value.
///
/// `beamdynamics_start_q16` is `CONFIG_BEAMDYNAMICS_START` expressed as a
/// Q0.16 fraction of 1.0 (see [`crate::config::CoreConfig`]).
pub fn compute_dimming(
    nominal_intensity: u8,
    nominal_rate: u32,
    steps_per_minute: u32,
    beamdynamics_start_q16: u16,
) -> u8 {
    let one = U16F16::from_num(1u8);
    let intensity = U16F16::from_num(nominal_intensity);
    let start: U16F16 = U16F16::from_num(U0F16::from_bits(beamdynamics_start_q16));

    let dimm = start + (one - start) * intensity / U16F16::from_num(255u8);
    let rate_ratio = if nominal_rate == 0 {
        U16F16::from_num(0u8)
    } else {
        U16F16::from_num(steps_per_minute) / U16F16::from_num(nominal_rate)
    };

    let adjusted = intensity * ((one - dimm) + dimm * rate_ratio);
    adjusted.to_num::<u32>().min(255) as u8
}

/// Map one raster byte to a laser intensity for the given block's nominal
/// intensity: `[128,255] -> [0, I]` linearly, everything below 128 maps to 0.
pub fn map_raster_pixel(byte: u8, nominal_intensity: u8) -> u8 {
    let delta = byte.saturating_sub(128) as u32;
    ((delta * 2 * nominal_intensity as u32) / 255).min(255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dimming_at_nominal_rate_returns_nominal_intensity() {
        let duty = compute_dimming(200, 1000, 1000, 0x8000);
        assert_eq!(duty, 200);
    }

    #[test]
    fn dimming_below_start_floor_is_reduced_at_low_speed() {
        let full = compute_dimming(255, 1000, 1000, 0x8000);
        let slow = compute_dimming(255, 1000, 100, 0x8000);
        assert!(slow < full);
    }

    #[test]
    fn raster_pixel_below_midpoint_is_dark() {
        assert_eq!(map_raster_pixel(0, 255), 0);
        assert_eq!(map_raster_pixel(127, 255), 0);
    }

    #[test]
    fn raster_pixel_at_max_maps_to_full_nominal_intensity() {
        assert_eq!(map_raster_pixel(255, 200), 200);
    }

    #[test]
    fn pulse_fires_only_every_beamdynamics_every_events() {
        let mut modulator = BeamModulator::new();
        let mut hal = crate::testing::MockHal::new();
        modulator.set_intensity(&mut hal, 100);
        hal.laser_pwm_calls.clear();

        modulator.on_step_event(&mut hal, 1000, 4, false);
        modulator.on_step_event(&mut hal, 1000, 4, false);
        modulator.on_step_event(&mut hal, 1000, 4, false);
        assert!(hal.beam_pulse_calls.is_empty());

        modulator.on_step_event(&mut hal, 1000, 4, false);
        assert_eq!(hal.beam_pulse_calls.len(), 1);
    }

    #[test]
    fn full_on_duty_holds_pin_high_without_arming_timer() {
        let mut modulator = BeamModulator::new();
        let mut hal = crate::testing::MockHal::new();
        modulator.set_intensity(&mut hal, FULL_ON_DUTY_THRESHOLD);
        modulator.on_step_event(&mut hal, 1000, 1, false);
        assert!(hal.beam_pulse_calls.is_empty());
        assert_eq!(hal.laser_pwm_calls.last(), Some(&255));
    }

    #[test]
    fn zero_duty_never_pulses() {
        let mut modulator = BeamModulator::new();
        let mut hal = crate::testing::MockHal::new();
        modulator.set_intensity(&mut hal, 0);
        modulator.on_step_event(&mut hal, 1000, 1, false);
        assert!(hal.beam_pulse_calls.is_empty());
    }

    #[test]
    fn static_pwm_freq_holds_duty_instead_of_arming_pulse_timer() {
        let mut modulator = BeamModulator::new();
        let mut hal = crate::testing::MockHal::new();
        modulator.set_intensity(&mut hal, 100);
        hal.laser_pwm_calls.clear();

        modulator.on_step_event(&mut hal, 1000, 1, true);

        assert!(hal.beam_pulse_calls.is_empty());
        assert_eq!(hal.laser_pwm_calls.last(), Some(&100));
    }
}
