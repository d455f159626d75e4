//! HAL layer for STM32 devices on top of STM32 device crates (`stm32f103`)
#![no_std]
#![warn(missing_docs)]
#![deny(warnings)]

/// HAL layer for GPIO ports. Includes:
/// * better API for configuring GPIO ports
/// * atomic updates to GPIO configuration and pins
///
/// # Examples
///
/// Configuring GPIO pins without disturbing other pins (no read-modify-write which could lead to
/// data races):
///
/// ```rust,no_run
/// # extern crate stm32_hal;
/// extern crate stm32f103;
/// use stm32f103::GPIOC;
/// use stm32_hal::gpio::Port;
///
/// # fn main() {
/// # let gpioc = unsafe { &*GPIOC.get() };
/// // Get GPIOC somehow...
/// // let gpioc = GPIOC.borrow(cs);
///
/// // Set pin to 2Mhz, open-drain.
/// // Modifies corresponding GPIO configuration bits without reads
/// gpioc.pin_config(13).output2().open_drain();
/// # }
/// ```
///
/// Generalized interface to GPIO pins:
///
/// ```rust,no_run
/// # extern crate stm32_hal;
/// # extern crate stm32f103;
/// use stm32f103::GPIOC;
/// use stm32_hal::gpio::Port;
///
/// # fn main() {
/// # let gpioc = unsafe { &*GPIOC.get() };
/// // Get GPIOC somehow...
/// // let gpioc = GPIOC.borrow(cs);
///
/// // Set pins 13, 14 and 15 on GPIOC to 1, 0 and 1.
/// gpioc.write_pin_range(13, 3, 0b101);
/// # }
/// ```
pub mod gpio;

#[cfg(feature = "stm32f103")]
mod stm32f1xx;
