//! Homing Controller.
//!
//! Runs entirely on the foreground (main loop) context with the step timer
//! disabled, so it is free to busy-wait via [`MotionHal::delay_us`] instead
//! of being driven by the step ISR. The approach-then-retract pairing
//! across one or two passes per axis set is a protocol-layer concern; this
//! module implements one blocking pass.

use crate::block::STEP_BIT;
use crate::config::{CoreConfig, HOMING_OVERSHOOT_COUNT};
use crate::error::HomingError;
use crate::hal::MotionHal;
use crate::position::Position;

/// Run one homing pass: drive `direction_bits` (inverted if `reverse`) on
/// every axis set in `axis_mask`, stepping at `step_period_us` until each
/// axis's end-stop has stayed asserted for [`HOMING_OVERSHOOT_COUNT`]
/// consecutive iterations, masking that axis out as it settles. Resets
/// [`Position`] to the origin on completion.
///
/// Returns [`HomingError::ProcessingActive`] without touching hardware if
/// `processing` is true (the step ISR must be quiesced before homing runs).
pub fn run_cycle(
    hal: &mut impl MotionHal,
    position: &mut Position,
    config: &CoreConfig,
    axis_mask: u8,
    direction_bits: u8,
    reverse: bool,
    step_period_us: u32,
    processing: bool,
) -> Result<(), HomingError> {
    if processing {
        return Err(HomingError::ProcessingActive);
    }

    const DIR_MASK: u8 = (1 << 3) | (1 << 4) | (1 << 5);
    let dir_bits = if reverse {
        direction_bits ^ DIR_MASK
    } else {
        direction_bits
    };
    hal.set_direction_bits(dir_bits);

    let axis_mask = if config.enable_3axes {
        axis_mask
    } else {
        axis_mask & !STEP_BIT[2]
    };

    let mut overshoot = [HOMING_OVERSHOOT_COUNT; 3];
    let mut active = axis_mask;

    while active != 0 {
        let mut limit_bits = hal.read_limit_bits();
        if config.invert_limits {
            limit_bits = !limit_bits;
        }
        let mut newly_masked = 0u8;
        for (axis, &bit) in STEP_BIT.iter().enumerate() {
            if active & bit != 0 && limit_bits & bit != 0 {
                overshoot[axis] -= 1;
                if overshoot[axis] == 0 {
                    newly_masked |= bit;
                }
            }
        }

        // An axis reaching its overshoot allowance this iteration still
        // gets this iteration's pulse; it is only excluded from the next
        // one's `out_bits`.
        hal.set_step_bits(active);
        hal.delay_us(config.pulse_microseconds);
        hal.reset_step_bits(0);
        hal.delay_us(step_period_us.saturating_sub(config.pulse_microseconds));

        active &= !newly_masked;
    }

    position.reset();
    Ok(())
}
