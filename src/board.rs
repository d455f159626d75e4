//! Wires real STM32F103 peripherals to [`motion_core::MotionHal`].
//!
//! GPIO reads/writes go through `stm32_hal::gpio`'s bit-banded [`Pin`]
//! type, so toggling one axis's step line never performs a read-modify-
//! write race against another. Timer reconfiguration pokes `TIM1`/`TIM3`/
//! `TIM4` registers directly, the same direct-register style used to
//! program `TIM1` for step pulse generation.

use cortex_m::peripheral::NVIC;
use stm32f1xx_hal::delay::Delay;
use stm32f1xx_hal::pac::{Interrupt, TIM1, TIM3, TIM4};
use stm32f1xx_hal::pwm::{Pwm, C1};
use stm32f1xx_hal::timer::Tim2NoRemap;

use stm32_hal::gpio::Pin;

use motion_core::MotionHal;

type LaserPwm = Pwm<stm32f1xx_hal::pac::TIM2, Tim2NoRemap, C1, stm32f1xx_hal::gpio::gpioa::PA0<stm32f1xx_hal::gpio::Alternate<stm32f1xx_hal::gpio::PushPull>>>;

/// All board-specific hardware `motion_core` needs, minus the step-event
/// timer interrupt itself (that's bound directly to [`crate::app::step_isr`]).
pub struct Board {
    tim1: TIM1,
    tim3: TIM3,
    tim4: TIM4,
    step_pins: [Pin; 3],
    dir_pins: [Pin; 3],
    limit_pins: [Pin; 6],
    door_pin: Pin,
    chiller_pin: Pin,
    air_assist_pin: Pin,
    aux1_pin: Pin,
    aux2_pin: Pin,
    laser_pwm: LaserPwm,
    serial_stopped: bool,
    delay: Delay,
}

impl Board {
    /// Assemble a [`Board`] from already-split, already-configured pins and
    /// peripherals. Pin direction/mode setup happens in `init` (`main.rs`);
    /// this constructor only stores the handles.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tim1: TIM1,
        tim3: TIM3,
        tim4: TIM4,
        step_pins: [Pin; 3],
        dir_pins: [Pin; 3],
        limit_pins: [Pin; 6],
        door_pin: Pin,
        chiller_pin: Pin,
        air_assist_pin: Pin,
        aux1_pin: Pin,
        aux2_pin: Pin,
        laser_pwm: LaserPwm,
        delay: Delay,
    ) -> Self {
        Board {
            tim1,
            tim3,
            tim4,
            step_pins,
            dir_pins,
            limit_pins,
            door_pin,
            chiller_pin,
            air_assist_pin,
            aux1_pin,
            aux2_pin,
            laser_pwm,
            serial_stopped: false,
            delay,
        }
    }

    /// `true` once [`MotionHal::serial_stop`] has been called. Polled by
    /// the serial RX task to stop accepting further raster/command bytes.
    pub fn serial_stopped(&self) -> bool {
        self.serial_stopped
    }

    /// Clear the latched serial-stop flag (called on `resume`).
    pub fn clear_serial_stop(&mut self) {
        self.serial_stopped = false;
    }

    /// Arm `tim3` (the Pulse Shaper's reset timer) in one-pulse mode for
    /// `cycles` CPU cycles, self-disabling once it fires.
    pub fn arm_one_shot_tim3(&mut self, cycles: u32) {
        let (prescaler, ceiling, _) = motion_core::timer::select_prescaler(cycles);
        self.tim3.psc.write(|w| w.psc().bits(prescaler - 1));
        self.tim3.arr.write(|w| w.arr().bits(ceiling));
        self.tim3.egr.write(|w| w.ug().set_bit());
        self.tim3.sr.modify(|_, w| w.uif().clear_bit());
        self.tim3.cr1.modify(|_, w| w.opm().set_bit().cen().set_bit());
    }

    /// Dismiss `TIM3`'s update interrupt flag. Called by the Pulse Shaper
    /// reset task once it has restored the step pins to idle.
    pub fn clear_tim3_interrupt(&mut self) {
        self.tim3.sr.modify(|_, w| w.uif().clear_bit());
    }

    /// Dismiss `TIM4`'s update interrupt flag. Called by the beam pulse
    /// reset task; the laser gate line itself is already cleared in
    /// hardware by TIM4's output-compare unit.
    pub fn clear_tim4_interrupt(&mut self) {
        self.tim4.sr.modify(|_, w| w.uif().clear_bit());
    }
}

impl MotionHal for Board {
    fn set_direction_bits(&mut self, bits: u8) {
        for (axis, pin) in self.dir_pins.iter().enumerate() {
            pin.write(bits & (1 << (axis + 3)) != 0);
        }
    }

    fn set_step_bits(&mut self, bits: u8) {
        for (axis, pin) in self.step_pins.iter().enumerate() {
            pin.write(bits & (1 << axis) != 0);
        }
    }

    fn reset_step_bits(&mut self, idle_bits: u8) {
        for (axis, pin) in self.step_pins.iter().enumerate() {
            pin.write(idle_bits & (1 << axis) != 0);
        }
    }

    fn program_step_timer(&mut self, prescaler: u16, ceiling: u16) {
        self.tim1.psc.write(|w| w.psc().bits(prescaler - 1));
        self.tim1.arr.write(|w| w.arr().bits(ceiling));
        self.tim1.egr.write(|w| w.ug().set_bit());
    }

    fn arm_pulse_reset(&mut self, cycles: u32) {
        self.arm_one_shot_tim3(cycles);
    }

    fn set_laser_pwm(&mut self, duty: u8) {
        let max = self.laser_pwm.get_max_duty() as u32;
        self.laser_pwm.set_duty((max * duty as u32 / 255) as u16);
    }

    fn arm_beam_pulse(&mut self, prescaler: u16, ceiling: u16) {
        self.tim4.psc.write(|w| w.psc().bits(prescaler - 1));
        self.tim4.arr.write(|w| w.arr().bits(ceiling));
        self.tim4.egr.write(|w| w.ug().set_bit());
        self.tim4.sr.modify(|_, w| w.uif().clear_bit());
        self.tim4.cr1.modify(|_, w| w.opm().set_bit().cen().set_bit());
    }

    fn read_limit_bits(&mut self) -> u8 {
        let mut bits = 0u8;
        for (axis, pin) in self.limit_pins.iter().enumerate() {
            if pin.read() {
                bits |= 1 << axis;
            }
        }
        bits
    }

    fn door_open(&mut self) -> bool {
        self.door_pin.read()
    }

    fn chiller_off(&mut self) -> bool {
        self.chiller_pin.read()
    }

    fn set_air_assist(&mut self, on: bool) {
        self.air_assist_pin.write(on);
    }

    fn set_aux1(&mut self, on: bool) {
        self.aux1_pin.write(on);
    }

    fn set_aux2(&mut self, on: bool) {
        self.aux2_pin.write(on);
    }

    fn serial_stop(&mut self) {
        self.serial_stopped = true;
    }

    fn delay_us(&mut self, microseconds: u32) {
        self.delay.delay_us(microseconds);
    }

    fn set_step_interrupt_enabled(&mut self, enabled: bool) {
        // Safety: masking/unmasking an NVIC line is a register write with no
        // aliasing hazard; `TIM1_UP_TIM10` is bound to exactly one RTIC task
        // (`step_isr`), so this never races a handler it would enable.
        unsafe {
            if enabled {
                NVIC::unmask(Interrupt::TIM1_UP_TIM10);
            } else {
                NVIC::mask(Interrupt::TIM1_UP_TIM10);
            }
        }
    }
}

