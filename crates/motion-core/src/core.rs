//! Motion Core: the step-ISR orchestrator.
//!
//! Wires the Timer Controller, Speed Profile Executor, Bresenham Step
//! Distributor, Beam Modulator and Stop/Interlock Supervisor together into
//! the single routine the firmware's step-timer interrupt calls. Every
//! hardware action goes through `H: MotionHal`, so [`MotionCore::step_isr`]
//! runs unchanged on the host in tests and on real silicon in firmware.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::beam::{self, BeamModulator};
use crate::block::{BlockKind, MotionParams, StopStatus, DIR_BIT, STEP_BIT};
use crate::bresenham::BresenhamState;
use crate::config::CoreConfig;
use crate::error::HomingError;
use crate::hal::{MotionHal, Planner, RasterSource};
use crate::homing;
use crate::position::Position;
use crate::profile::SpeedProfile;
use crate::supervisor::Supervisor;
use crate::timer;

const DIR_MASK: u8 = DIR_BIT[0] | DIR_BIT[1] | DIR_BIT[2];
const STEP_MASK: u8 = STEP_BIT[0] | STEP_BIT[1] | STEP_BIT[2];

/// One bit per end-stop, in [`StopStatus`] declaration order.
const LIMIT_BITS: [(u8, StopStatus); 6] = [
    (1 << 0, StopStatus::LimitHitX1),
    (1 << 1, StopStatus::LimitHitX2),
    (1 << 2, StopStatus::LimitHitY1),
    (1 << 3, StopStatus::LimitHitY2),
    (1 << 4, StopStatus::LimitHitZ1),
    (1 << 5, StopStatus::LimitHitZ2),
];

fn limit_status(bits: u8) -> Option<StopStatus> {
    LIMIT_BITS
        .iter()
        .find(|&&(mask, _)| bits & mask != 0)
        .map(|&(_, status)| status)
}

/// Clears `busy` on every exit path out of [`MotionCore::step_isr`],
/// including its several early returns.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The motion controller's hardware-agnostic state machine.
pub struct MotionCore {
    config: CoreConfig,
    position: Position,
    profile: SpeedProfile,
    bresenham: BresenhamState,
    beam: BeamModulator,
    supervisor: Supervisor,
    busy: AtomicBool,
    block_active: bool,
    processing: bool,
    step_events_completed: u32,
    adjusted_rate: u32,
    cycles_per_step_event: u32,
}

impl MotionCore {
    /// A fresh core for the given configuration, idle.
    pub fn new(config: CoreConfig) -> Self {
        MotionCore {
            config,
            position: Position::zero(),
            profile: SpeedProfile::new(),
            bresenham: BresenhamState::default(),
            beam: BeamModulator::new(),
            supervisor: Supervisor::new(),
            busy: AtomicBool::new(false),
            block_active: false,
            processing: false,
            step_events_completed: 0,
            adjusted_rate: 0,
            cycles_per_step_event: 0,
        }
    }

    /// Configure idle-state hardware outputs, zero the absolute position,
    /// and disarm the step-event interrupt. Call once at firmware startup,
    /// before the step timer interrupt is ever unmasked.
    pub fn init(&mut self, hal: &mut impl MotionHal) {
        hal.reset_step_bits(self.config.invert_mask & STEP_MASK);
        hal.set_laser_pwm(0);
        hal.set_step_interrupt_enabled(false);
        self.position = Position::zero();
        self.processing = false;
    }

    /// Arm the step-event interrupt so [`MotionCore::step_isr`] starts
    /// running. A no-op, from the caller's perspective, if already armed.
    pub fn start_processing(&mut self, hal: &mut impl MotionHal) {
        hal.set_step_interrupt_enabled(true);
        self.processing = true;
    }

    /// Disarm the step-event interrupt, halting all stepping immediately.
    pub fn stop_processing(&mut self, hal: &mut impl MotionHal) {
        hal.set_step_interrupt_enabled(false);
        self.processing = false;
    }

    /// `true` while the step-event interrupt is armed.
    pub fn processing(&self) -> bool {
        self.processing
    }

    /// Current absolute position.
    pub fn position(&self) -> &Position {
        &self.position
    }

    /// Mutable access to the current position, for [`crate::homing::run_cycle`]
    /// to update directly. The only caller outside `step_isr`'s own
    /// Bresenham bookkeeping, and only while the step timer interrupt is
    /// disabled.
    pub fn position_mut(&mut self) -> &mut Position {
        &mut self.position
    }

    /// Current stop status (see [`Supervisor`]).
    pub fn stop_status(&self) -> StopStatus {
        self.supervisor.stop_status()
    }

    /// `true` while stepping is halted.
    pub fn stop_requested(&self) -> bool {
        self.supervisor.stop_requested()
    }

    /// Clear a stop condition and allow motion to resume.
    pub fn resume(&mut self) {
        self.supervisor.resume();
    }

    /// Current X position, in millimetres.
    pub fn get_position_x(&self) -> f64 {
        self.position.mm(0, &self.config)
    }

    /// Current Y position, in millimetres.
    pub fn get_position_y(&self) -> f64 {
        self.position.mm(1, &self.config)
    }

    /// Current Z position, in millimetres.
    pub fn get_position_z(&self) -> f64 {
        self.position.mm(2, &self.config)
    }

    /// Overwrite the absolute position, in millimetres, without moving the
    /// carriage. Used by the protocol layer to establish a work offset.
    pub fn set_position(&mut self, x: f64, y: f64, z: f64) {
        self.position.set_mm(0, x, &self.config);
        self.position.set_mm(1, y, &self.config);
        self.position.set_mm(2, z, &self.config);
    }

    /// Run one blocking homing pass toward the end-stops selected by
    /// `axis_mask`/`direction_bits` (see [`crate::homing::run_cycle`]).
    /// Refuses to run while [`MotionCore::processing`] is armed: homing
    /// busy-waits on the foreground and is not safe to interleave with the
    /// step ISR.
    pub fn homing_cycle(
        &mut self,
        hal: &mut impl MotionHal,
        axis_mask: u8,
        direction_bits: u8,
        reverse: bool,
    ) -> Result<(), HomingError> {
        let step_period_us = self.config.homing_step_period_us();
        homing::run_cycle(
            hal,
            &mut self.position,
            &self.config,
            axis_mask,
            direction_bits,
            reverse,
            step_period_us,
            self.processing,
        )
    }

    fn cycles_for_rate(f_cpu: u32, steps_per_minute: u32) -> u32 {
        if steps_per_minute == 0 {
            u32::MAX
        } else {
            ((f_cpu as u64 * 60) / steps_per_minute as u64) as u32
        }
    }

    fn pulse_cycles(&self) -> u32 {
        ((self.config.f_cpu as u64 * self.config.pulse_microseconds as u64) / 1_000_000) as u32
    }

    fn begin_block(&mut self, hal: &mut impl MotionHal, motion: &MotionParams, is_raster: bool) {
        self.adjusted_rate = motion.initial_rate.max(self.config.minimum_steps_per_minute);
        self.cycles_per_step_event = Self::cycles_for_rate(self.config.f_cpu, self.adjusted_rate);
        let cycles_per_tick = self.config.cycles_per_acceleration_tick();

        self.profile = SpeedProfile::new();
        self.profile.reset_midpoint(cycles_per_tick);
        self.cycles_per_step_event = timer::configure(hal, self.cycles_per_step_event);
        self.bresenham = BresenhamState::init(motion.step_event_count);
        self.step_events_completed = 0;
        self.beam.reset();

        let initial_duty = if is_raster {
            0
        } else {
            beam::compute_dimming(
                motion.nominal_laser_intensity,
                motion.nominal_rate,
                self.adjusted_rate,
                self.config.beamdynamics_start_q16,
            )
        };
        self.beam.set_intensity(hal, initial_duty);
    }

    /// Advance one motion block by one step event. Returns `true` once the
    /// block's full `step_event_count` has been emitted.
    fn advance_motion(
        &mut self,
        hal: &mut impl MotionHal,
        motion: &MotionParams,
        is_raster: bool,
        pixel_steps: u32,
        raster: &mut impl RasterSource,
    ) -> bool {
        let raw_bits = self.bresenham.step(
            motion.steps,
            motion.step_event_count,
            motion.direction_bits,
            &mut self.position,
            self.config.enable_3axes,
        );
        let out_bits = raw_bits ^ self.config.invert_mask;
        hal.set_direction_bits(out_bits & DIR_MASK);
        hal.set_step_bits(out_bits & STEP_MASK);
        hal.arm_pulse_reset(self.pulse_cycles());

        self.step_events_completed += 1;

        if is_raster {
            let in_cruise = self.step_events_completed >= motion.accelerate_until
                && self.step_events_completed < motion.decelerate_after;
            if in_cruise && pixel_steps != 0 && self.step_events_completed % pixel_steps == 0 {
                if let Some(byte) = raster.read_byte() {
                    let duty = beam::map_raster_pixel(byte, motion.nominal_laser_intensity);
                    self.beam.set_intensity(hal, duty);
                }
            } else if !in_cruise {
                self.beam.set_intensity(hal, 0);
            }
        }

        let cycles_per_tick = self.config.cycles_per_acceleration_tick();
        let new_rate = self.profile.advance(
            motion,
            self.step_events_completed,
            self.cycles_per_step_event,
            cycles_per_tick,
            self.adjusted_rate,
        );
        if new_rate != self.adjusted_rate {
            self.adjusted_rate = new_rate;
            let requested = Self::cycles_for_rate(self.config.f_cpu, self.adjusted_rate);
            self.cycles_per_step_event = timer::configure(hal, requested);
            if !is_raster {
                let duty = beam::compute_dimming(
                    motion.nominal_laser_intensity,
                    motion.nominal_rate,
                    self.adjusted_rate,
                    self.config.beamdynamics_start_q16,
                );
                self.beam.set_intensity(hal, duty);
            }
        }

        self.step_events_completed >= motion.step_event_count
    }

    /// The step timer's interrupt handler. Single-entry and
    /// reentrancy-guarded: a tick that arrives while a previous invocation
    /// is still running is dropped, not queued.
    pub fn step_isr(
        &mut self,
        hal: &mut impl MotionHal,
        planner: &mut impl Planner,
        raster: &mut impl RasterSource,
    ) {
        if self.busy.swap(true, Ordering::AcqRel) {
            return;
        }
        let _guard = BusyGuard(&self.busy);

        if self.supervisor.stop_requested() {
            self.stop_processing(hal);
            planner.reset_block_buffer();
            self.block_active = false;
            return;
        }

        if self.config.enable_laser_interlocks {
            if hal.door_open() || hal.chiller_off() {
                self.beam.set_intensity(hal, 0);
            }
            let limit_bits = hal.read_limit_bits();
            if let Some(status) = limit_status(limit_bits) {
                self.supervisor.request_stop(hal, status);
                self.stop_processing(hal);
                planner.reset_block_buffer();
                self.block_active = false;
                return;
            }
        }

        self.beam.on_step_event(
            hal,
            self.cycles_per_step_event,
            self.config.beamdynamics_every,
            self.config.static_pwm_freq,
        );

        let block = match planner.current_block() {
            Some(block) => block,
            None => {
                self.block_active = false;
                self.stop_processing(hal);
                return;
            }
        };

        let is_raster = matches!(block.kind, BlockKind::RasterLine { .. });
        if !self.block_active {
            if let Some(motion) = block.kind.motion() {
                self.begin_block(hal, motion, is_raster);
            }
            self.block_active = true;
        }

        match block.kind {
            BlockKind::Line(motion) => {
                if self.advance_motion(hal, &motion, false, 0, raster) {
                    planner.discard_current_block();
                    self.block_active = false;
                }
            }
            BlockKind::RasterLine { motion, pixel_steps } => {
                if self.advance_motion(hal, &motion, true, pixel_steps, raster) {
                    raster.consume_remaining();
                    planner.discard_current_block();
                    self.block_active = false;
                }
            }
            BlockKind::AirAssistEnable => {
                hal.set_air_assist(true);
                planner.discard_current_block();
                self.block_active = false;
            }
            BlockKind::AirAssistDisable => {
                hal.set_air_assist(false);
                planner.discard_current_block();
                self.block_active = false;
            }
            BlockKind::Aux1Enable => {
                hal.set_aux1(true);
                planner.discard_current_block();
                self.block_active = false;
            }
            BlockKind::Aux1Disable => {
                hal.set_aux1(false);
                planner.discard_current_block();
                self.block_active = false;
            }
            BlockKind::Aux2Enable => {
                hal.set_aux2(true);
                planner.discard_current_block();
                self.block_active = false;
            }
            BlockKind::Aux2Disable => {
                hal.set_aux2(false);
                planner.discard_current_block();
                self.block_active = false;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_config, MockHal, MockPlanner, MockRasterSource};
    use pretty_assertions::assert_eq;
    use std::vec;

    fn line(steps: [u32; 3], direction_bits: u8) -> BlockKind {
        BlockKind::Line(MotionParams::new(steps, direction_bits, 600, 600, 600, 600, 0, steps.iter().copied().max().unwrap(), 255))
    }

    #[test]
    fn reentrant_tick_is_dropped() {
        let mut core = MotionCore::new(test_config());
        core.busy.store(true, Ordering::Relaxed);
        let mut hal = MockHal::new();
        let mut planner = MockPlanner::new();
        let mut raster = MockRasterSource::new(vec![]);
        core.step_isr(&mut hal, &mut planner, &mut raster);
        assert!(hal.set_step_bits_calls.is_empty());
        assert!(core.busy.load(Ordering::Relaxed));
    }

    #[test]
    fn line_block_completes_after_its_step_events() {
        let mut core = MotionCore::new(test_config());
        let mut hal = MockHal::new();
        let mut planner = MockPlanner::new();
        planner.push(line([4, 0, 0], DIR_BIT[0]));
        let mut raster = MockRasterSource::new(vec![]);

        for _ in 0..4 {
            core.step_isr(&mut hal, &mut planner, &mut raster);
        }

        assert_eq!(core.position().steps(0), 4);
        assert!(planner.current_block().is_none());
    }

    #[test]
    fn limit_switch_requests_stop_and_halts_stepping() {
        let mut core = MotionCore::new(test_config());
        let mut hal = MockHal::new();
        hal.limit_bits_sequence = vec![1 << 0];
        let mut planner = MockPlanner::new();
        planner.push(line([10, 0, 0], DIR_BIT[0]));
        let mut raster = MockRasterSource::new(vec![]);

        core.step_isr(&mut hal, &mut planner, &mut raster);

        assert_eq!(core.stop_status(), StopStatus::LimitHitX1);
        assert_eq!(hal.serial_stop_calls, 1);
        assert!(hal.set_step_bits_calls.is_empty());
        assert!(!core.processing());
        assert_eq!(hal.step_interrupt_enabled_calls, vec![false]);
        assert_eq!(planner.reset_count(), 1);
        assert!(planner.current_block().is_none());
    }

    #[test]
    fn queue_underrun_disarms_processing() {
        let mut core = MotionCore::new(test_config());
        let mut hal = MockHal::new();
        core.start_processing(&mut hal);
        let mut planner = MockPlanner::new();
        let mut raster = MockRasterSource::new(vec![]);

        core.step_isr(&mut hal, &mut planner, &mut raster);

        assert!(!core.processing());
    }

    #[test]
    fn position_round_trips_through_set_position() {
        let mut core = MotionCore::new(test_config());
        core.set_position(10.0, -5.0, 0.0);
        assert!((core.get_position_x() - 10.0).abs() < 0.02);
        assert!((core.get_position_y() - -5.0).abs() < 0.02);
        assert!((core.get_position_z() - 0.0).abs() < 0.01);
    }

    #[test]
    fn homing_cycle_refuses_while_processing() {
        let mut core = MotionCore::new(test_config());
        let mut hal = MockHal::new();
        core.start_processing(&mut hal);

        let result = core.homing_cycle(&mut hal, STEP_MASK, 0, false);

        assert_eq!(result, Err(crate::error::HomingError::ProcessingActive));
    }

    #[test]
    fn stop_requested_drains_planner_on_next_entry() {
        let mut core = MotionCore::new(test_config());
        let mut hal = MockHal::new();
        let mut planner = MockPlanner::new();
        planner.push(line([10, 0, 0], DIR_BIT[0]));
        let mut raster = MockRasterSource::new(vec![]);

        core.supervisor.request_stop(&mut hal, StopStatus::LimitHitY1);
        core.step_isr(&mut hal, &mut planner, &mut raster);

        assert_eq!(planner.reset_count(), 1);
    }

    #[test]
    fn toggle_block_fires_gpio_and_discards_immediately() {
        let mut core = MotionCore::new(test_config());
        let mut hal = MockHal::new();
        let mut planner = MockPlanner::new();
        planner.push(BlockKind::AirAssistEnable);
        let mut raster = MockRasterSource::new(vec![]);

        core.step_isr(&mut hal, &mut planner, &mut raster);

        assert_eq!(hal.air_assist_calls, vec![true]);
        assert!(planner.current_block().is_none());
    }
}
