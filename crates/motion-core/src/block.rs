//! The planner-produced `Block` record.
//!
//! Rather than one C-style struct with fields unused by non-motion block
//! types, `BlockKind` is a Rust enum: every field a motion block needs is
//! present on [`MotionParams`] (shared by `Line` and `RasterLine`), and the
//! four toggle commands simply carry no payload.

/// Per-axis bit position shared by the direction and step output bytes.
/// Axis 0 = X, 1 = Y, 2 = Z. A single byte packs step bits in bits 0-2 and
/// direction bits in bits 3-5, matching a typical single-port step/dir
/// board layout; [`crate::hal::MotionHal::set_direction_bits`] and
/// `set_step_bits` each look only at the bits that matter to them.
pub const STEP_BIT: [u8; 3] = [1 << 0, 1 << 1, 1 << 2];

/// See [`STEP_BIT`].
pub const DIR_BIT: [u8; 3] = [1 << 3, 1 << 4, 1 << 5];

/// Fields shared by `LINE` and `RASTER_LINE` blocks.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MotionParams {
    /// Non-negative step counts per axis (X, Y, Z).
    pub steps: [u32; 3],
    /// Per-axis sign flags, packed per [`DIR_BIT`]. A set bit means the
    /// positive direction.
    pub direction_bits: u8,
    /// `max(steps_x, steps_y, steps_z)`.
    pub step_event_count: u32,
    /// Step rate at block entry, steps/minute.
    pub initial_rate: u32,
    /// Cruise step rate, steps/minute.
    pub nominal_rate: u32,
    /// Step rate at block exit, steps/minute.
    pub final_rate: u32,
    /// Rate change applied per acceleration tick, steps/minute.
    pub rate_delta: u32,
    /// Step-event index at which acceleration (Phase A) ends.
    pub accelerate_until: u32,
    /// Step-event index at which deceleration (Phase D) begins.
    pub decelerate_after: u32,
    /// Nominal laser intensity for this block, 0-255.
    pub nominal_laser_intensity: u8,
}

impl MotionParams {
    /// Build a [`MotionParams`], checking the invariants the planner is
    /// contractually responsible for (`step_event_count` consistency and
    /// `accelerate_until <= decelerate_after`).
    pub fn new(
        steps: [u32; 3],
        direction_bits: u8,
        initial_rate: u32,
        nominal_rate: u32,
        final_rate: u32,
        rate_delta: u32,
        accelerate_until: u32,
        decelerate_after: u32,
        nominal_laser_intensity: u8,
    ) -> Self {
        let step_event_count = steps.iter().copied().max().unwrap_or(0);
        debug_assert!(accelerate_until <= decelerate_after);
        debug_assert!(decelerate_after <= step_event_count);
        MotionParams {
            steps,
            direction_bits,
            step_event_count,
            initial_rate,
            nominal_rate,
            final_rate,
            rate_delta,
            accelerate_until,
            decelerate_after,
            nominal_laser_intensity,
        }
    }
}

/// A planner-produced record: one motion block or one side-effect command.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum BlockKind {
    /// A straight multi-axis move at constant laser intensity.
    Line(MotionParams),
    /// A multi-axis move whose laser intensity is sampled per pixel from
    /// the serial raster stream during cruise.
    RasterLine {
        /// Shared motion parameters.
        motion: MotionParams,
        /// Step events per pixel column.
        pixel_steps: u32,
    },
    /// Assert the air-assist output.
    AirAssistEnable,
    /// Deassert the air-assist output.
    AirAssistDisable,
    /// Assert auxiliary output 1.
    Aux1Enable,
    /// Deassert auxiliary output 1.
    Aux1Disable,
    /// Assert auxiliary output 2.
    Aux2Enable,
    /// Deassert auxiliary output 2.
    Aux2Disable,
}

impl BlockKind {
    /// The shared motion parameters, if this is `Line` or `RasterLine`.
    pub fn motion(&self) -> Option<&MotionParams> {
        match self {
            BlockKind::Line(motion) => Some(motion),
            BlockKind::RasterLine { motion, .. } => Some(motion),
            _ => None,
        }
    }

    /// `true` for `Line`/`RasterLine`, `false` for the toggle commands.
    pub fn is_motion(&self) -> bool {
        self.motion().is_some()
    }
}

/// Reasons stepping may have stopped.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopStatus {
    /// Nothing is wrong; processing stopped normally or was never halted.
    #[default]
    Ok,
    /// X-minus end-stop asserted during motion.
    LimitHitX1,
    /// X-plus end-stop asserted during motion.
    LimitHitX2,
    /// Y-minus end-stop asserted during motion.
    LimitHitY1,
    /// Y-plus end-stop asserted during motion.
    LimitHitY2,
    /// Z-minus end-stop asserted during motion.
    LimitHitZ1,
    /// Z-plus end-stop asserted during motion.
    LimitHitZ2,
}

/// A full `Block` as consumed by the core: the discriminant plus its
/// fields, read-only to everything but the planner that produced it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Block {
    /// The block's kind and payload.
    pub kind: BlockKind,
}

impl Block {
    /// Wrap a [`BlockKind`] into a [`Block`].
    pub const fn new(kind: BlockKind) -> Self {
        Block { kind }
    }
}
