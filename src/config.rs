//! Pin assignments and the machine-specific [`motion_core::CoreConfig`].
//!
//! A flat const-module layout, rather than a struct built up at runtime:
//! every physical assignment lives here as a `(port, pin)` pair, and
//! [`motion_config`]
//! bundles the tuning constants the rest of the firmware and `motion-core`
//! both need.

/// `(port, pin)` index pairs, one entry per axis (X, Y, Z).
pub const STEP_PINS: [(char, u8); 3] = [('A', 2), ('A', 4), ('A', 6)];

/// See [`STEP_PINS`].
pub const DIR_PINS: [(char, u8); 3] = [('A', 1), ('A', 3), ('A', 5)];

/// End-stop inputs, in [`motion_core::StopStatus`] declaration order
/// (X1, X2, Y1, Y2, Z1, Z2).
pub const LIMIT_PINS: [(char, u8); 6] = [
    ('B', 0),
    ('B', 1),
    ('B', 2),
    ('B', 10),
    ('B', 11),
    ('B', 12),
];

/// Safety interlock inputs.
pub const DOOR_PIN: (char, u8) = ('C', 13);
/// See [`DOOR_PIN`].
pub const CHILLER_PIN: (char, u8) = ('C', 14);

/// Assist outputs.
pub const AIR_ASSIST_PIN: (char, u8) = ('B', 13);
/// See [`AIR_ASSIST_PIN`].
pub const AUX1_PIN: (char, u8) = ('B', 14);
/// See [`AIR_ASSIST_PIN`].
pub const AUX2_PIN: (char, u8) = ('B', 15);

/// Laser intensity output, driven by TIM2 channel 1.
pub const LASER_PWM_PIN: (char, u8) = ('A', 0);

/// Raster byte stream, USART1 (PA9 = TX, PA10 = RX).
pub const USART_TX_PIN: (char, u8) = ('A', 9);
/// See [`USART_TX_PIN`].
pub const USART_RX_PIN: (char, u8) = ('A', 10);

/// The machine's tuning constants, handed to [`motion_core::MotionCore::new`].
pub const fn motion_config() -> motion_core::CoreConfig {
    motion_core::CoreConfig {
        f_cpu: 72_000_000,
        acceleration_ticks_per_second: 100,
        minimum_steps_per_minute: 60,
        pulse_microseconds: 5,
        steps_per_mm: [80.0, 80.0, 400.0],
        origin_offset_mm: [0.0, 0.0, 0.0],
        beamdynamics_every: 4,
        beamdynamics_start_q16: 0x4000, // 0.25
        homing_rate: 3000,
        invert_mask: 0,
        invert_limits: false,
        enable_laser_interlocks: true,
        enable_3axes: true,
        static_pwm_freq: false,
        driveboard_usb: false,
    }
}
