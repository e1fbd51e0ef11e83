//! Motion execution (spec §4.3). Grounded in the original source's
//! `pi/control/motor_controller.py` (chunked stepping, speed-to-rate
//! mapping, timeout accumulation) and `pi/control/focus_controller.py`
//! (focus counter, partial-update-on-timeout), shaped using the
//! teacher's `agent.rs::execute_command` dispatch-and-report pattern.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::config::{
    FOCUS_POSITION_MAX, FOCUS_POSITION_MIN, MAX_STEP_RATE_HZ, MIN_STEP_RATE_HZ, STEPS_PER_DEGREE_ALT,
    STEPS_PER_DEGREE_AZ, STEP_CHUNK_SIZE,
};
use crate::error::ErrorCode;
use crate::hardware::{Direction, MotorDriver};
use crate::protocol::FocusDirection;
use crate::safety::SafetySupervisor;
use crate::state::{StateManager, StatusCode};

/// Shared flag a `Stop` command sets to preempt an in-flight move or
/// focus run. Checked once per step chunk (spec §4.3 "coarse
/// preemption granularity").
#[derive(Default)]
pub struct StopSignal(AtomicBool);

impl StopSignal {
    pub fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    pub fn trigger(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Maps a normalized speed in `[0, 1]` to a step rate in
/// `[MIN_STEP_RATE_HZ, MAX_STEP_RATE_HZ]` (spec §6.1).
fn speed_to_rate_hz(speed: f64) -> f64 {
    MIN_STEP_RATE_HZ + speed.clamp(0.0, 1.0) * (MAX_STEP_RATE_HZ - MIN_STEP_RATE_HZ)
}

/// Drives the altitude/azimuth motors and the focus motor. Owns no
/// state of its own beyond the stop signal; position and status live
/// in [`StateManager`] so the rest of the controller can read them
/// concurrently with a move in progress. Motor parameters are shared
/// references, not exclusive borrows: each [`MotorDriver`] does its own
/// interior synchronization so the safety supervisor's tick can poll
/// `limit_asserted` on the same motor a move thread is currently
/// stepping (spec §5, §8 scenario 5).
pub struct MotionExecutor {
    pub stop: StopSignal,
}

impl MotionExecutor {
    pub fn new() -> Self {
        Self {
            stop: StopSignal::new(),
        }
    }

    /// Executes a move to `(target_alt_deg, target_az_deg)` at
    /// normalized `speed`, aborting early if `timeout_s` elapses or the
    /// stop signal is set. Blocking; callers run this on a dedicated
    /// thread (spec §5 "motion executed synchronously on the dispatch
    /// task").
    #[allow(clippy::too_many_arguments)]
    pub fn execute_move(
        &self,
        state: &StateManager,
        safety: &SafetySupervisor,
        alt_motor: &dyn MotorDriver,
        az_motor: &dyn MotorDriver,
        target_alt_deg: f64,
        target_az_deg: f64,
        speed: f64,
        timeout_s: f64,
    ) -> Result<(), ErrorCode> {
        if !safety.validate_move_target(target_alt_deg, target_az_deg) {
            return Err(ErrorCode::PositionOutOfRange);
        }

        self.stop.clear();
        state.set_target(Some(target_alt_deg), Some(target_az_deg));
        state.set_status(StatusCode::Moving);

        let rate_hz = speed_to_rate_hz(speed);
        let deadline = Instant::now() + Duration::from_secs_f64(timeout_s);
        let mut result = Ok(());
        let mut completed = false;

        loop {
            let (alt, az) = state.position();
            let alt_done = (alt - target_alt_deg).abs() < 1.0 / STEPS_PER_DEGREE_ALT;
            let az_done = (az - target_az_deg).abs() < 1.0 / STEPS_PER_DEGREE_AZ;
            if alt_done && az_done {
                completed = true;
                break;
            }
            if self.stop.is_set() {
                info!("move preempted by stop command");
                break;
            }
            if Instant::now() >= deadline {
                warn!("move timed out before reaching target");
                result = Err(ErrorCode::MotorTimeout);
                break;
            }

            for _ in 0..STEP_CHUNK_SIZE {
                if self.stop.is_set() || Instant::now() >= deadline {
                    break;
                }
                let (mut alt, mut az) = state.position();
                if (alt - target_alt_deg).abs() >= 1.0 / STEPS_PER_DEGREE_ALT {
                    let dir = if target_alt_deg > alt {
                        Direction::Forward
                    } else {
                        Direction::Backward
                    };
                    alt_motor.step(dir, rate_hz);
                    alt += match dir {
                        Direction::Forward => 1.0 / STEPS_PER_DEGREE_ALT,
                        Direction::Backward => -1.0 / STEPS_PER_DEGREE_ALT,
                    };
                }
                if (az - target_az_deg).abs() >= 1.0 / STEPS_PER_DEGREE_AZ {
                    let dir = if target_az_deg > az {
                        Direction::Forward
                    } else {
                        Direction::Backward
                    };
                    az_motor.step(dir, rate_hz);
                    az += match dir {
                        Direction::Forward => 1.0 / STEPS_PER_DEGREE_AZ,
                        Direction::Backward => -1.0 / STEPS_PER_DEGREE_AZ,
                    };
                }
                state.set_position(alt, az);
                if alt_motor.limit_asserted() || az_motor.limit_asserted() {
                    result = Err(ErrorCode::PositionLimitHit);
                    safety.emergency_stop(state, "limit switch asserted");
                    break;
                }
            }
            if result.is_err() {
                break;
            }
        }

        state.set_target(None, None);
        if completed {
            // Chunked stepping stops once within one step's tolerance of
            // the target, not at exact equality (spec §8: completed
            // moves report the commanded target exactly).
            state.set_position(target_alt_deg, target_az_deg);
        }
        match &result {
            Ok(()) => {
                if state.status() != StatusCode::EmergencyStop {
                    state.set_status(StatusCode::Idle);
                }
            }
            Err(ErrorCode::PositionLimitHit) => {
                // `safety.emergency_stop` above already set the status.
            }
            Err(_) => state.set_status(StatusCode::Error),
        }
        result
    }

    /// Executes a focus move of `steps` in `direction`, updating the
    /// focus counter as it goes so a timeout leaves a partially-applied
    /// count rather than none at all (original
    /// `pi/control/focus_controller.py` behavior).
    pub fn execute_focus(
        &self,
        state: &StateManager,
        focus_motor: &dyn MotorDriver,
        direction: FocusDirection,
        steps: i32,
        timeout_s: f64,
    ) -> Result<(), ErrorCode> {
        self.stop.clear();
        state.set_status(StatusCode::Focusing);

        let rate_hz = speed_to_rate_hz(0.5);
        let deadline = Instant::now() + Duration::from_secs_f64(timeout_s);
        let motor_dir = match direction {
            FocusDirection::In => Direction::Backward,
            FocusDirection::Out => Direction::Forward,
        };
        let delta = match direction {
            FocusDirection::In => -1,
            FocusDirection::Out => 1,
        };

        let mut result = Ok(());
        let mut remaining = steps;
        while remaining > 0 {
            if self.stop.is_set() {
                info!("focus move preempted by stop command");
                break;
            }
            if Instant::now() >= deadline {
                warn!("focus move timed out with {remaining} steps remaining");
                result = Err(ErrorCode::FocusTimeout);
                break;
            }

            let chunk = remaining.min(STEP_CHUNK_SIZE as i32);
            for _ in 0..chunk {
                focus_motor.step(motor_dir, rate_hz);
                let next = (state.focus_position() + delta).clamp(FOCUS_POSITION_MIN, FOCUS_POSITION_MAX);
                state.set_focus_position(next);
                if focus_motor.limit_asserted() {
                    result = Err(ErrorCode::FocusLimitHit);
                    break;
                }
            }
            remaining -= chunk;
            if result.is_err() {
                break;
            }
        }

        debug!(final_position = state.focus_position(), "focus move complete");
        state.set_status(if result.is_ok() { StatusCode::Idle } else { StatusCode::Error });
        result
    }

    pub fn stop(&self) {
        self.stop.trigger();
    }
}

impl Default for MotionExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::MockMotorDriver;

    #[test]
    fn speed_zero_maps_to_min_rate() {
        assert_eq!(speed_to_rate_hz(0.0), MIN_STEP_RATE_HZ);
    }

    #[test]
    fn speed_one_maps_to_max_rate() {
        assert_eq!(speed_to_rate_hz(1.0), MAX_STEP_RATE_HZ);
    }

    #[test]
    fn move_out_of_bounds_is_rejected_before_motion() {
        let executor = MotionExecutor::new();
        let state = StateManager::new();
        let safety = SafetySupervisor::new();
        let alt = MockMotorDriver::new(1.0 / STEPS_PER_DEGREE_ALT);
        let az = MockMotorDriver::new(1.0 / STEPS_PER_DEGREE_AZ);

        let result = executor.execute_move(&state, &safety, &alt, &az, 999.0, 10.0, 0.5, 5.0);
        assert_eq!(result, Err(ErrorCode::PositionOutOfRange));
        assert_eq!(state.status(), StatusCode::Idle);
    }

    #[test]
    fn successful_move_reports_the_exact_commanded_target() {
        let executor = MotionExecutor::new();
        let state = StateManager::new();
        let safety = SafetySupervisor::new();
        let alt = MockMotorDriver::new(1.0 / STEPS_PER_DEGREE_ALT);
        let az = MockMotorDriver::new(1.0 / STEPS_PER_DEGREE_AZ);

        let result = executor.execute_move(&state, &safety, &alt, &az, 10.0, 20.0, 1.0, 30.0);
        assert!(result.is_ok());
        assert_eq!(state.position(), (10.0, 20.0));
    }

    #[test]
    fn limit_switch_hit_during_a_move_triggers_emergency_stop() {
        let executor = MotionExecutor::new();
        let state = StateManager::new();
        let safety = SafetySupervisor::new();
        let alt = MockMotorDriver::new(1.0 / STEPS_PER_DEGREE_ALT);
        alt.set_limit_switch(true);
        let az = MockMotorDriver::new(1.0 / STEPS_PER_DEGREE_AZ);

        let result = executor.execute_move(&state, &safety, &alt, &az, 10.0, 0.0, 0.5, 5.0);
        assert_eq!(result, Err(ErrorCode::PositionLimitHit));
        assert_eq!(state.status(), StatusCode::EmergencyStop);
        assert!(state.is_error_active(crate::error::ErrorCode::SafetyEmergencyStop));
    }

    #[test]
    fn focus_accumulates_counter() {
        let executor = MotionExecutor::new();
        let state = StateManager::new();
        let motor = MockMotorDriver::new(1.0);

        let result = executor.execute_focus(&state, &motor, FocusDirection::Out, 5, 5.0);
        assert!(result.is_ok());
        assert_eq!(state.focus_position(), 5);
    }

    #[test]
    fn focus_in_decrements_counter() {
        let executor = MotionExecutor::new();
        let state = StateManager::new();
        let motor = MockMotorDriver::new(1.0);
        state.set_focus_position(10);

        executor.execute_focus(&state, &motor, FocusDirection::In, 3, 5.0).unwrap();
        assert_eq!(state.focus_position(), 7);
    }
}
