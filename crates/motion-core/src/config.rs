//! Compile-time configuration constants.
//!
//! A flat module of `pub const` values and a single aggregate, rather than
//! C preprocessor `#ifdef`s. Board-specific pin assignments live in the
//! firmware binary crate; this module only holds the constants the core's
//! algorithms need.

/// Number of additional step pulses a homing axis emits after its end-stop
/// first asserts, before it is masked out of the active set.
pub const HOMING_OVERSHOOT_COUNT: u8 = 6;

/// Laser duty values at or above this are treated as fully on (pin held
/// high, no one-shot timer armed). Carried over verbatim from the source
/// firmware; the 242 threshold is unexplained and not re-derived here.
pub const FULL_ON_DUTY_THRESHOLD: u8 = 242;

/// Aggregate, board-independent configuration for one motion core instance.
///
/// The firmware binary builds one of these from its own pin/clock
/// configuration; host tests build one directly with [`CoreConfig::TEST`]-
/// style literals.
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct CoreConfig {
    /// CPU clock frequency in Hz (`F_CPU`).
    pub f_cpu: u32,
    /// Nominal acceleration-tick rate, ticks/second (`ACCELERATION_TICKS_PER_SECOND`).
    pub acceleration_ticks_per_second: u32,
    /// Floor below which `adjusted_rate` is never driven (steps/minute).
    pub minimum_steps_per_minute: u32,
    /// Minimum guaranteed step-pulse high time, in microseconds.
    pub pulse_microseconds: u32,
    /// Steps per millimetre, one entry per axis (X, Y, Z).
    pub steps_per_mm: [f64; 3],
    /// Origin offset in millimetres, one entry per axis (X, Y, Z).
    pub origin_offset_mm: [f64; 3],
    /// Step events between one beam pulse and the next (`CONFIG_BEAMDYNAMICS_EVERY`).
    pub beamdynamics_every: u32,
    /// Minimum dimming floor in [0, 1], Q0.16 fixed point (`CONFIG_BEAMDYNAMICS_START`).
    pub beamdynamics_start_q16: u16,
    /// Step rate used while homing (steps/minute, `CONFIG_HOMINGRATE`).
    pub homing_rate: u32,
    /// XOR mask applied to the direction+step output byte for boards that
    /// need active-low lines.
    pub invert_mask: u8,
    /// Whether the limit-switch bit register itself reads active-low and
    /// needs inverting before axis bits are tested.
    pub invert_limits: bool,
    /// Compiled-in feature flags (`ENABLE_LASER_INTERLOCKS`, `ENABLE_3AXES`,
    /// `STATIC_PWM_FREQ`, `DRIVEBOARD_USB`), expressed as explicit booleans
    /// rather than preprocessor conditionals.
    pub enable_laser_interlocks: bool,
    /// Whether the Z axis participates in motion (single-axis boards mask
    /// it out of Bresenham/homing).
    pub enable_3axes: bool,
    /// Whether the beam PWM frequency is fixed in hardware (affects how the
    /// beam modulator arms its one-shot pulse timer).
    pub static_pwm_freq: bool,
    /// Whether the serial transport is USB CDC rather than UART.
    pub driveboard_usb: bool,
}

impl CoreConfig {
    /// Acceleration-tick period, expressed in CPU cycles.
    pub const fn cycles_per_acceleration_tick(&self) -> u32 {
        self.f_cpu / self.acceleration_ticks_per_second
    }

    /// `homing_rate` (steps/minute) expressed as a per-step period in
    /// microseconds, the unit [`crate::homing::run_cycle`] steps at.
    pub const fn homing_step_period_us(&self) -> u32 {
        60_000_000 / self.homing_rate
    }
}
