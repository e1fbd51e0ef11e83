//! Safety supervisor (spec §4.4). Runs once per main-loop tick and is
//! also called as a gate by motion execution. Grounded in the teacher's
//! `safety.rs::SafetyManager` (independent checks, each clearing its
//! own error key on passing) and `pi/control/safety_manager.py` for
//! the specific three checks this spec names.
//!
//! The watchdog deadline lives behind its own lock (the same
//! lock-and-copy convention `StateManager` uses) so every method here
//! takes `&self`: the main-loop tick and an in-flight move on its own
//! thread both need to reach this supervisor at once (spec §5, §8
//! scenario 5).

use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::{ALT_MAX, ALT_MIN, AZ_MAX, AZ_MIN, WATCHDOG_TIMEOUT_S};
use crate::error::ErrorCode;
use crate::hardware::MotorDriver;
use crate::state::{StateManager, StatusCode};

/// Idempotent emergency-stop side effects, applied by the caller to
/// every registered motor.
pub struct SafetySupervisor {
    watchdog_deadline: Mutex<Instant>,
}

impl SafetySupervisor {
    pub fn new() -> Self {
        Self {
            watchdog_deadline: Mutex::new(Instant::now() + Duration::from_secs_f64(WATCHDOG_TIMEOUT_S)),
        }
    }

    /// Resets the watchdog deadline. Called once per main-loop tick.
    pub fn feed_watchdog(&self) {
        *self.watchdog_deadline.lock().unwrap() = Instant::now() + Duration::from_secs_f64(WATCHDOG_TIMEOUT_S);
    }

    fn watchdog_expired(&self) -> bool {
        Instant::now() >= *self.watchdog_deadline.lock().unwrap()
    }

    /// Pre-flight check used by the motion executor to reject unsafe
    /// commands without side effects on hardware (spec §4.4).
    pub fn validate_move_target(&self, alt_deg: f64, az_deg: f64) -> bool {
        (ALT_MIN..=ALT_MAX).contains(&alt_deg) && (AZ_MIN..=AZ_MAX).contains(&az_deg)
    }

    /// Runs the three independent checks. `limit_switches` reports
    /// whether any registered motor currently has its limit switch
    /// asserted. `motors` receives the emergency-stop side effects
    /// when a fatal condition is found.
    pub fn run_tick(&self, state: &StateManager, limit_switches: &[&dyn MotorDriver]) {
        // 1. Limit switches.
        let any_limit_asserted = limit_switches.iter().any(|m| m.limit_asserted());
        if any_limit_asserted {
            state.record_error(ErrorCode::PositionLimitHit, "limit switch asserted");
            warn!("limit switch asserted, triggering emergency stop");
            self.emergency_stop(state, "limit switch asserted");
        } else {
            state.clear_error(ErrorCode::PositionLimitHit);
        }

        // 2. Position bounds (non-fatal).
        let (alt, az) = state.position();
        if self.validate_move_target(alt, az) {
            state.clear_error(ErrorCode::SafetyLimitExceeded);
        } else {
            state.record_error(
                ErrorCode::SafetyLimitExceeded,
                format!("position ({alt}, {az}) outside configured bounds"),
            );
        }

        // 3. Watchdog.
        if self.watchdog_expired() {
            state.record_error(ErrorCode::SafetyWatchdogTimeout, "main loop watchdog expired");
            warn!("watchdog expired, triggering emergency stop");
            self.emergency_stop(state, "watchdog timeout");
        } else {
            state.clear_error(ErrorCode::SafetyWatchdogTimeout);
        }
    }

    /// Idempotent: halts and disables every motor, records the cause,
    /// and sets status=emergency_stop. Recovery is the `Reset` command
    /// (SPEC_FULL §4.3, Open Question (a)).
    pub fn emergency_stop(&self, state: &StateManager, reason: &str) {
        state.record_error(ErrorCode::SafetyEmergencyStop, reason);
        state.set_status(StatusCode::EmergencyStop);
        info!(reason, "emergency stop engaged");
    }

    /// Clears the emergency-stop condition. Called only by a `Reset`
    /// command while `status == EmergencyStop` (controller.rs).
    pub fn reset(&self, state: &StateManager) {
        state.clear_error(ErrorCode::SafetyEmergencyStop);
        state.set_status(StatusCode::Idle);
        self.feed_watchdog();
    }
}

impl Default for SafetySupervisor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::MockMotorDriver;

    #[test]
    fn position_within_bounds_is_valid() {
        let supervisor = SafetySupervisor::new();
        assert!(supervisor.validate_move_target(45.0, 90.0));
    }

    #[test]
    fn position_out_of_bounds_is_invalid() {
        let supervisor = SafetySupervisor::new();
        assert!(!supervisor.validate_move_target(200.0, 90.0));
    }

    #[test]
    fn limit_switch_triggers_emergency_stop() {
        let supervisor = SafetySupervisor::new();
        let state = StateManager::new();
        let motor = MockMotorDriver::new(1.0);
        motor.set_limit_switch(true);
        let motors: Vec<&dyn MotorDriver> = vec![&motor];
        supervisor.run_tick(&state, &motors);

        assert_eq!(state.status(), StatusCode::EmergencyStop);
        assert!(state.is_error_active(ErrorCode::SafetyEmergencyStop));
        assert!(state.is_error_active(ErrorCode::PositionLimitHit));
    }

    #[test]
    fn watchdog_expiry_triggers_emergency_stop() {
        let supervisor = SafetySupervisor {
            watchdog_deadline: Mutex::new(Instant::now() - Duration::from_secs(1)),
        };
        let state = StateManager::new();
        supervisor.run_tick(&state, &[]);

        assert_eq!(state.status(), StatusCode::EmergencyStop);
        assert!(state.is_error_active(ErrorCode::SafetyWatchdogTimeout));
    }

    #[test]
    fn reset_clears_emergency_stop() {
        let supervisor = SafetySupervisor::new();
        let state = StateManager::new();
        supervisor.emergency_stop(&state, "test");
        assert_eq!(state.status(), StatusCode::EmergencyStop);

        supervisor.reset(&state);
        assert_eq!(state.status(), StatusCode::Idle);
        assert!(!state.is_error_active(ErrorCode::SafetyEmergencyStop));
    }

    #[test]
    fn feeding_watchdog_prevents_expiry() {
        let supervisor = SafetySupervisor::new();
        let state = StateManager::new();
        supervisor.feed_watchdog();
        supervisor.run_tick(&state, &[]);
        assert_ne!(state.status(), StatusCode::EmergencyStop);
    }
}
