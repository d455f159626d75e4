//! Stop/Interlock Supervisor.

use crate::block::StopStatus;
use crate::hal::MotionHal;

/// Tracks whether a stop has been requested and why.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Supervisor {
    stop_requested: bool,
    stop_status: StopStatus,
}

impl Supervisor {
    /// A fresh supervisor, nothing stopped.
    pub const fn new() -> Self {
        Supervisor {
            stop_requested: false,
            stop_status: StopStatus::Ok,
        }
    }

    /// Request a stop. Idempotent: only the first call for a given stopped
    /// period tells the serial transport to stop accepting data, so a
    /// limit switch that stays asserted across several step ISR entries
    /// does not spam `serial_stop`.
    pub fn request_stop(&mut self, hal: &mut impl MotionHal, status: StopStatus) {
        if self.stop_requested {
            return;
        }
        self.stop_requested = true;
        self.stop_status = status;
        hal.serial_stop();
    }

    /// Clear the stop flag and status, allowing motion to resume.
    pub fn resume(&mut self) {
        self.stop_requested = false;
        self.stop_status = StopStatus::Ok;
    }

    /// `true` while a stop is in effect.
    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// The reason for the current stop, or `StopStatus::Ok` if none.
    pub fn stop_status(&self) -> StopStatus {
        self.stop_status
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_stop_request_notifies_serial_layer() {
        let mut supervisor = Supervisor::new();
        let mut hal = crate::testing::MockHal::new();
        supervisor.request_stop(&mut hal, StopStatus::LimitHitX1);
        assert_eq!(hal.serial_stop_calls, 1);
        assert_eq!(supervisor.stop_status(), StopStatus::LimitHitX1);
        assert!(supervisor.stop_requested());
    }

    #[test]
    fn repeated_stop_requests_are_idempotent() {
        let mut supervisor = Supervisor::new();
        let mut hal = crate::testing::MockHal::new();
        supervisor.request_stop(&mut hal, StopStatus::LimitHitX1);
        supervisor.request_stop(&mut hal, StopStatus::LimitHitY2);
        assert_eq!(hal.serial_stop_calls, 1);
        // First status wins; a second limit trip does not overwrite it.
        assert_eq!(supervisor.stop_status(), StopStatus::LimitHitX1);
    }

    #[test]
    fn resume_clears_flag_and_status() {
        let mut supervisor = Supervisor::new();
        let mut hal = crate::testing::MockHal::new();
        supervisor.request_stop(&mut hal, StopStatus::LimitHitZ1);
        supervisor.resume();
        assert!(!supervisor.stop_requested());
        assert_eq!(supervisor.stop_status(), StopStatus::Ok);
    }
}
