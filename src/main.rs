//! Firmware entry point: wires [`motion_core::MotionCore`] to real STM32F103
//! peripherals and schedules the RTIC tasks each interrupt-driven context
//! runs as.
//!
//! The planner, the serial transport and its raster byte stream, and the
//! high-level protocol loop are all external collaborators this binary
//! treats as interfaces only; it owns the storage for them ([`queue`]'s
//! `BlockQueue`/`RasterRing`) but not the logic that fills them.

#![no_main]
#![no_std]

use defmt_rtt as _;
use panic_probe as _;

mod board;
mod config;
mod queue;

#[rtic::app(device = stm32f1xx_hal::pac, peripherals = true)]
mod app {
    use stm32f1xx_hal::delay::Delay;
    use stm32f1xx_hal::prelude::*;
    use stm32f1xx_hal::pwm::Channel;
    use stm32f1xx_hal::timer::{Tim2NoRemap, Timer};

    use stm32_hal::gpio::Port;

    use motion_core::MotionCore;

    use crate::board::Board;
    use crate::config::motion_config;
    use crate::queue::{BlockQueue, RasterRing};

    #[shared]
    struct Shared {
        core: MotionCore,
        board: Board,
        planner: BlockQueue,
        raster: RasterRing,
    }

    #[local]
    struct Local {}

    #[init]
    fn init(cx: init::Context) -> (Shared, Local, init::Monotonics) {
        let dp = cx.device;

        dp.RCC.apb2enr.modify(|_, w| w.iopaen().enabled());
        dp.RCC.apb2enr.modify(|_, w| w.iopben().enabled());
        dp.RCC.apb2enr.modify(|_, w| w.iopcen().enabled());
        dp.RCC.apb2enr.modify(|_, w| w.afioen().enabled());
        dp.RCC.apb1enr.modify(|_, w| w.tim2en().enabled());
        dp.RCC.apb1enr.modify(|_, w| w.tim3en().enabled());
        dp.RCC.apb1enr.modify(|_, w| w.tim4en().enabled());
        dp.RCC.apb2enr.modify(|_, w| w.tim1en().enabled());

        let mut flash = dp.FLASH.constrain();
        let mut rcc = dp.RCC.constrain();
        let clocks = rcc
            .cfgr
            .use_hse(8.mhz())
            .sysclk(72.mhz())
            .pclk1(36.mhz())
            .freeze(&mut flash.acr);

        // Two independent accessors to GPIOA: `stolen` drives the typed
        // `stm32f1xx_hal` split needed to put PA0 into its TIM2-CH1
        // alternate function (the laser PWM channel); `dp.GPIOA` below is
        // bit-banded directly for every other pin on the port. The two
        // never touch the same pin, and both are zero-sized tokens over
        // the same memory-mapped block, so the aliasing is benign.
        let stolen = unsafe { stm32f1xx_hal::pac::Peripherals::steal() };
        let mut afio = dp.AFIO.constrain(&mut rcc.apb2);
        let mut gpioa_typed = stolen.GPIOA.split(&mut rcc.apb2);
        let pa0 = gpioa_typed.pa0.into_alternate_push_pull(&mut gpioa_typed.crl);
        let mut laser_pwm = Timer::new(stolen.TIM2, &clocks).pwm::<Tim2NoRemap, _, _, _>(
            pa0,
            &mut afio.mapr,
            1.khz(),
        );
        laser_pwm.enable(Channel::C1);

        // Bit-banded access to the remaining pins, named per
        // `crate::config`'s pin map (PA0 is skipped; it belongs to the
        // typed split above).
        let [_a0, dir_x, step_x, dir_y, step_y, dir_z, step_z, ..] = dp.GPIOA.into_bitband();
        let [limit_x1, limit_x2, limit_y1, _b3, _b4, _b5, _b6, _b7, _b8, _b9, limit_y2, limit_z1, limit_z2, air_assist, aux1, aux2] =
            dp.GPIOB.into_bitband();
        let [_c0, _c1, _c2, _c3, _c4, _c5, _c6, _c7, _c8, _c9, _c10, _c11, _c12, door, chiller, _c15] =
            dp.GPIOC.into_bitband();

        for pin in [&dir_x, &dir_y, &dir_z, &step_x, &step_y, &step_z, &air_assist, &aux1, &aux2] {
            pin.config().output50().push_pull().general();
        }
        for pin in [
            &limit_x1, &limit_x2, &limit_y1, &limit_y2, &limit_z1, &limit_z2, &door, &chiller,
        ] {
            pin.config().floating();
        }

        let delay = Delay::new(cx.core.SYST, clocks);

        let board = Board::new(
            dp.TIM1,
            dp.TIM3,
            dp.TIM4,
            [step_x, step_y, step_z],
            [dir_x, dir_y, dir_z],
            [limit_x1, limit_x2, limit_y1, limit_y2, limit_z1, limit_z2],
            door,
            chiller,
            air_assist,
            aux1,
            aux2,
            laser_pwm,
            delay,
        );

        defmt::info!("motion core initialized");

        (
            Shared {
                core: MotionCore::new(motion_config()),
                board,
                planner: BlockQueue::new(),
                raster: RasterRing::new(),
            },
            Local {},
            init::Monotonics(),
        )
    }

    /// Runs [`MotionCore::homing_cycle`] once at startup, before the
    /// step-event interrupt is ever armed, then arms the step timer and
    /// idles. The protocol loop that would drive `request_stop`,
    /// `set_position`, further `homing_cycle` calls, etc. in response to
    /// host commands is an out-of-scope collaborator; this `idle` stands in
    /// for it with the one startup sequence those exposed operations are
    /// meant to support.
    #[idle(shared = [core, board])]
    fn idle(mut cx: idle::Context) -> ! {
        cx.shared.board.lock(|board| {
            cx.shared.core.lock(|core| {
                core.init(board);
                let _ = core.homing_cycle(board, 0b0011_1111, 0, false);
                core.start_processing(board);
            });
        });

        loop {
            cortex_m::asm::wfi();
        }
    }

    /// The Step ISR. Single-entry and reentrancy-guarded
    /// inside [`MotionCore::step_isr`] itself via its `busy` flag. RTIC's
    /// priority ceiling keeps `pulse_reset`/`beam_reset`, which run at a
    /// higher priority, from observing `board` mid-update.
    #[task(binds = TIM1_UP_TIM10, priority = 4, shared = [core, board, planner, raster])]
    fn step_isr(cx: step_isr::Context) {
        let step_isr::SharedResources { mut core, mut board, mut planner, mut raster } = cx.shared;
        board.lock(|board| {
            core.lock(|core| {
                planner.lock(|planner| {
                    raster.lock(|raster| core.step_isr(board, planner, raster));
                });
            });
        });
    }

    /// Pulse Shaper reset ISR: restores step pins to their
    /// invert-masked idle state. The one-pulse-mode bit set in
    /// `Board::arm_one_shot_tim3` already disables the timer in hardware;
    /// software only needs to dismiss the interrupt and drop the pins.
    #[task(binds = TIM3, priority = 5, shared = [board])]
    fn pulse_reset(mut cx: pulse_reset::Context) {
        cx.shared.board.lock(|board| {
            board.clear_tim3_interrupt();
            board.reset_step_bits(motion_config().invert_mask);
        });
    }

    /// Beam pulse reset ISR: TIM4's output-compare channel
    /// drives the laser gate line directly in hardware, so software only
    /// needs to dismiss the interrupt.
    #[task(binds = TIM4, priority = 5, shared = [board])]
    fn beam_reset(mut cx: beam_reset::Context) {
        cx.shared.board.lock(|board| board.clear_tim4_interrupt());
    }
}
