//! Error types. Follows a `StepperError`-style shape: small, `Copy` enums
//! per subsystem composed with `From` impls, rather than a
//! `thiserror`-derived type (`thiserror` needs `std` and doesn't fit an
//! interrupt-context `no_std` crate).

/// Error bubbled up from [`crate::homing`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum HomingError {
    /// `homing_cycle` was invoked while the step-event interrupt was armed.
    ProcessingActive,
}

/// Top-level error type surfaced by [`crate::core::MotionCore`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum MotionError {
    /// See [`HomingError`].
    Homing(HomingError),
}

impl From<HomingError> for MotionError {
    fn from(err: HomingError) -> Self {
        MotionError::Homing(err)
    }
}
