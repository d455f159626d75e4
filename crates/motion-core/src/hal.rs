//! Collaborator traits: the minimal hardware-abstraction seam this crate
//! needs, plus the upstream planner and raster byte stream it consumes but
//! doesn't own.
//!
//! `MotionHal` is modeled on a `hal::stepper::Driver` /
//! `hal::driver::StepperDriver` split: control-plane operations (`enable`,
//! `direction`) are kept apart from pulse-generation operations (`start`,
//! `preload_delay`, `is_running`), widened here from one axis to three axes
//! plus the beam. `Planner` and `RasterSource` are the remaining external
//! collaborators this core treats as out of scope to implement itself.

use crate::block::Block;

/// Non-blocking peek/pop interface onto the upstream planner's block queue.
pub trait Planner {
    /// Peek at the head of the queue without removing it.
    fn current_block(&mut self) -> Option<Block>;
    /// Pop the head of the queue.
    fn discard_current_block(&mut self);
    /// Drop all pending blocks.
    fn reset_block_buffer(&mut self);
}

/// The serial raster byte stream, shared with the serial RX ISR.
///
/// Implementations of `read_byte` must wrap the underlying ring-buffer pop
/// in a critical section: mutual exclusion around reads is enforced by
/// disabling global interrupts for the duration of the read.
/// `motion-core` calls `read_byte` only from inside the step ISR and only
/// during a raster block's cruise phase, so the critical section need only
/// exclude the serial RX ISR, not the step ISR itself.
pub trait RasterSource {
    /// Consume one raster byte, if one is available.
    fn read_byte(&mut self) -> Option<u8>;
    /// Drain any bytes remaining for the block that just completed.
    fn consume_remaining(&mut self);
}

/// The hardware actions the motion core needs, abstracted so the core is
/// testable without real silicon.
pub trait MotionHal {
    /// Set the direction output bits (see [`crate::block::DIR_BIT`]).
    fn set_direction_bits(&mut self, bits: u8);
    /// Assert the step output bits (see [`crate::block::STEP_BIT`]).
    fn set_step_bits(&mut self, bits: u8);
    /// Drive the step outputs back to their invert-masked idle state.
    fn reset_step_bits(&mut self, idle_bits: u8);
    /// Program the step-event timer to the given (prescaler, ceiling) pair.
    fn program_step_timer(&mut self, prescaler: u16, ceiling: u16);
    /// Arm the Pulse Shaper's one-shot reset timer to fire after `cycles`
    /// CPU cycles.
    fn arm_pulse_reset(&mut self, cycles: u32);
    /// Set the laser PWM duty cycle, 0-255.
    fn set_laser_pwm(&mut self, duty: u8);
    /// Arm the beam modulator's one-shot pulse timer with the given
    /// (prescaler, ceiling) pair.
    fn arm_beam_pulse(&mut self, prescaler: u16, ceiling: u16);
    /// Read the raw limit-switch bit register (one bit per end-stop).
    fn read_limit_bits(&mut self) -> u8;
    /// `true` if the safety door is open.
    fn door_open(&mut self) -> bool;
    /// `true` if the coolant chiller is not running.
    fn chiller_off(&mut self) -> bool;
    /// Drive the air-assist output.
    fn set_air_assist(&mut self, on: bool);
    /// Drive auxiliary output 1.
    fn set_aux1(&mut self, on: bool);
    /// Drive auxiliary output 2.
    fn set_aux2(&mut self, on: bool);
    /// Instruct the serial transport to stop accepting further data.
    fn serial_stop(&mut self);
    /// Delay the calling (foreground) context for the given number of
    /// microseconds. Used only by the blocking homing routine.
    fn delay_us(&mut self, microseconds: u32);
    /// Enable or disable the step-event timer interrupt at the interrupt
    /// controller. Backs [`crate::core::MotionCore::start_processing`]/
    /// `stop_processing`, and the automatic disarm on queue underrun.
    fn set_step_interrupt_enabled(&mut self, enabled: bool);
}
