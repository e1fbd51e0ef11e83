use auto_telescope::error::ErrorCode;
use auto_telescope::hardware::MockMotorDriver;
use auto_telescope::safety::SafetySupervisor;
use auto_telescope::state::{StateManager, StatusCode};

#[test]
fn position_inside_bounds_passes_validation() {
    let supervisor = SafetySupervisor::new();
    assert!(supervisor.validate_move_target(45.0, 200.0));
}

#[test]
fn position_outside_altitude_bound_fails_validation() {
    let supervisor = SafetySupervisor::new();
    assert!(!supervisor.validate_move_target(91.0, 200.0));
}

#[test]
fn limit_switch_assertion_drives_emergency_stop_and_records_both_codes() {
    let supervisor = SafetySupervisor::new();
    let state = StateManager::new();
    let motor = MockMotorDriver::new(1.0);
    motor.set_limit_switch(true);

    let motors: Vec<&dyn auto_telescope::hardware::MotorDriver> = vec![&motor];
    supervisor.run_tick(&state, &motors);

    let snapshot = state.snapshot();
    assert_eq!(snapshot.status, StatusCode::EmergencyStop);
    assert!(snapshot.error_codes.contains(&ErrorCode::SafetyEmergencyStop));
    assert!(snapshot.error_codes.contains(&ErrorCode::PositionLimitHit));
}

#[test]
fn reset_returns_controller_to_idle_and_clears_emergency_code() {
    let supervisor = SafetySupervisor::new();
    let state = StateManager::new();
    supervisor.emergency_stop(&state, "manual trigger for test");
    assert_eq!(state.status(), StatusCode::EmergencyStop);

    supervisor.reset(&state);
    let snapshot = state.snapshot();
    assert_eq!(snapshot.status, StatusCode::Idle);
    assert!(!snapshot.error_codes.contains(&ErrorCode::SafetyEmergencyStop));
}

#[test]
fn emergency_stop_is_idempotent() {
    let supervisor = SafetySupervisor::new();
    let state = StateManager::new();
    supervisor.emergency_stop(&state, "first");
    supervisor.emergency_stop(&state, "second");
    assert_eq!(state.status(), StatusCode::EmergencyStop);
    assert_eq!(state.snapshot().error_codes.iter().filter(|c| **c == ErrorCode::SafetyEmergencyStop).count(), 1);
}
