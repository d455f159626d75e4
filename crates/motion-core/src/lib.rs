//! Hardware-agnostic core of a laser-cutter motion controller.
//!
//! This crate owns the trapezoidal speed-profile executor, the Bresenham
//! multi-axis step distributor, dynamic step-timer reconfiguration, and
//! beam-intensity modulation. It never touches a register directly: all
//! hardware actions go through [`hal::MotionHal`], so the whole core is
//! unit-testable on the host. The firmware binary crate is the only place
//! that wires real STM32 peripherals to it.
#![no_std]
#![warn(missing_docs)]

#[cfg(test)]
extern crate std;

pub mod accel;
pub mod beam;
pub mod block;
pub mod bresenham;
pub mod config;
pub mod core;
pub mod error;
pub mod hal;
pub mod homing;
pub mod position;
pub mod profile;
pub mod supervisor;
pub mod timer;

#[cfg(test)]
pub mod testing;

pub use crate::block::{Block, BlockKind, StopStatus};
pub use crate::config::CoreConfig;
pub use crate::core::MotionCore;
pub use crate::error::MotionError;
pub use crate::hal::{MotionHal, Planner, RasterSource};
pub use crate::position::Position;
