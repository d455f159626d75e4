//! Host-only test doubles, mirroring this workspace's per-crate `tests`
//! fixtures. Not part of the public API surface shipped to firmware.

use std::vec::Vec;

use crate::block::{Block, BlockKind};
use crate::config::CoreConfig;
use crate::hal::{MotionHal, Planner, RasterSource};

/// A [`CoreConfig`] with round, host-friendly numbers. Not meant to model
/// any particular real machine.
pub fn test_config() -> CoreConfig {
    CoreConfig {
        f_cpu: 72_000_000,
        acceleration_ticks_per_second: 100,
        minimum_steps_per_minute: 60,
        pulse_microseconds: 5,
        steps_per_mm: [80.0, 80.0, 400.0],
        origin_offset_mm: [0.0, 0.0, 0.0],
        beamdynamics_every: 4,
        beamdynamics_start_q16: 0x8000,
        homing_rate: 3000,
        invert_mask: 0,
        invert_limits: false,
        enable_laser_interlocks: true,
        enable_3axes: true,
        static_pwm_freq: false,
        driveboard_usb: false,
    }
}

/// Records every call made against it; a [`MotionHal`] for assertions, not
/// simulation. Where a return value matters (limit bits, door/chiller
/// sense), pull it from a queue so a test can script a sequence.
#[derive(Debug, Default)]
pub struct MockHal {
    /// Arguments of every `set_direction_bits` call, in order.
    pub set_direction_bits_calls: Vec<u8>,
    /// Arguments of every `set_step_bits` call, in order.
    pub set_step_bits_calls: Vec<u8>,
    /// Arguments of every `reset_step_bits` call, in order.
    pub reset_step_bits_calls: Vec<u8>,
    /// `(prescaler, ceiling)` of every `program_step_timer` call.
    pub program_step_timer_calls: Vec<(u16, u16)>,
    /// Cycle counts of every `arm_pulse_reset` call.
    pub arm_pulse_reset_calls: Vec<u32>,
    /// Duty values of every `set_laser_pwm` call.
    pub laser_pwm_calls: Vec<u8>,
    /// `(prescaler, ceiling)` of every `arm_beam_pulse` call.
    pub beam_pulse_calls: Vec<(u16, u16)>,
    /// Values returned by `read_limit_bits`, consumed front-to-back; 0
    /// once exhausted.
    pub limit_bits_sequence: Vec<u8>,
    /// Number of times `read_limit_bits` was called.
    pub read_limit_bits_calls: u32,
    /// What `door_open` should return.
    pub door_open_value: bool,
    /// What `chiller_off` should return.
    pub chiller_off_value: bool,
    /// Arguments of every `set_air_assist` call, in order.
    pub air_assist_calls: Vec<bool>,
    /// Arguments of every `set_aux1` call, in order.
    pub aux1_calls: Vec<bool>,
    /// Arguments of every `set_aux2` call, in order.
    pub aux2_calls: Vec<bool>,
    /// Number of times `serial_stop` was called.
    pub serial_stop_calls: u32,
    /// Arguments of every `delay_us` call, in order.
    pub delay_us_calls: Vec<u32>,
    /// Arguments of every `set_step_interrupt_enabled` call, in order.
    pub step_interrupt_enabled_calls: Vec<bool>,
}

impl MockHal {
    /// A fresh mock, everything zeroed/empty.
    pub fn new() -> Self {
        MockHal::default()
    }
}

impl MotionHal for MockHal {
    fn set_direction_bits(&mut self, bits: u8) {
        self.set_direction_bits_calls.push(bits);
    }

    fn set_step_bits(&mut self, bits: u8) {
        self.set_step_bits_calls.push(bits);
    }

    fn reset_step_bits(&mut self, idle_bits: u8) {
        self.reset_step_bits_calls.push(idle_bits);
    }

    fn program_step_timer(&mut self, prescaler: u16, ceiling: u16) {
        self.program_step_timer_calls.push((prescaler, ceiling));
    }

    fn arm_pulse_reset(&mut self, cycles: u32) {
        self.arm_pulse_reset_calls.push(cycles);
    }

    fn set_laser_pwm(&mut self, duty: u8) {
        self.laser_pwm_calls.push(duty);
    }

    fn arm_beam_pulse(&mut self, prescaler: u16, ceiling: u16) {
        self.beam_pulse_calls.push((prescaler, ceiling));
    }

    fn read_limit_bits(&mut self) -> u8 {
        self.read_limit_bits_calls += 1;
        if self.limit_bits_sequence.is_empty() {
            0
        } else {
            self.limit_bits_sequence.remove(0)
        }
    }

    fn door_open(&mut self) -> bool {
        self.door_open_value
    }

    fn chiller_off(&mut self) -> bool {
        self.chiller_off_value
    }

    fn set_air_assist(&mut self, on: bool) {
        self.air_assist_calls.push(on);
    }

    fn set_aux1(&mut self, on: bool) {
        self.aux1_calls.push(on);
    }

    fn set_aux2(&mut self, on: bool) {
        self.aux2_calls.push(on);
    }

    fn serial_stop(&mut self) {
        self.serial_stop_calls += 1;
    }

    fn delay_us(&mut self, microseconds: u32) {
        self.delay_us_calls.push(microseconds);
    }

    fn set_step_interrupt_enabled(&mut self, enabled: bool) {
        self.step_interrupt_enabled_calls.push(enabled);
    }
}

/// A scripted queue of blocks, popped in order.
#[derive(Debug, Default)]
pub struct MockPlanner {
    queue: Vec<Block>,
    reset_count: u32,
}

impl MockPlanner {
    /// An empty planner.
    pub fn new() -> Self {
        MockPlanner::default()
    }

    /// Append a block to the tail of the queue.
    pub fn push(&mut self, kind: BlockKind) {
        self.queue.push(Block::new(kind));
    }

    /// Number of times `reset_block_buffer` was called.
    pub fn reset_count(&self) -> u32 {
        self.reset_count
    }
}

impl Planner for MockPlanner {
    fn current_block(&mut self) -> Option<Block> {
        self.queue.first().copied()
    }

    fn discard_current_block(&mut self) {
        if !self.queue.is_empty() {
            self.queue.remove(0);
        }
    }

    fn reset_block_buffer(&mut self) {
        self.queue.clear();
        self.reset_count += 1;
    }
}

/// A scripted byte stream for raster mode.
#[derive(Debug, Default)]
pub struct MockRasterSource {
    bytes: Vec<u8>,
    /// Number of times `consume_remaining` was called.
    pub consume_remaining_calls: u32,
}

impl MockRasterSource {
    /// A raster source that will yield `bytes` in order, then `None`.
    pub fn new(bytes: Vec<u8>) -> Self {
        MockRasterSource {
            bytes,
            consume_remaining_calls: 0,
        }
    }
}

impl RasterSource for MockRasterSource {
    fn read_byte(&mut self) -> Option<u8> {
        if self.bytes.is_empty() {
            None
        } else {
            Some(self.bytes.remove(0))
        }
    }

    fn consume_remaining(&mut self) {
        self.bytes.clear();
        self.consume_remaining_calls += 1;
    }
}
