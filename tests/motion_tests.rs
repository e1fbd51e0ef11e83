use auto_telescope::config::{STEPS_PER_DEGREE_ALT, STEPS_PER_DEGREE_AZ};
use auto_telescope::error::ErrorCode;
use auto_telescope::hardware::MockMotorDriver;
use auto_telescope::motion::MotionExecutor;
use auto_telescope::protocol::FocusDirection;
use auto_telescope::safety::SafetySupervisor;
use auto_telescope::state::{StateManager, StatusCode};

#[test]
fn move_out_of_safety_bounds_is_rejected_before_any_stepping() {
    let executor = MotionExecutor::new();
    let state = StateManager::new();
    let safety = SafetySupervisor::new();
    let alt = MockMotorDriver::new(1.0 / STEPS_PER_DEGREE_ALT);
    let az = MockMotorDriver::new(1.0 / STEPS_PER_DEGREE_AZ);

    let result = executor.execute_move(&state, &safety, &alt, &az, 500.0, 45.0, 0.5, 5.0);
    assert_eq!(result, Err(ErrorCode::PositionOutOfRange));
    assert_eq!(state.status(), StatusCode::Idle);
    assert_eq!(state.position(), (0.0, 0.0));
}

#[test]
fn stop_command_preempts_an_in_flight_move_and_leaves_status_idle() {
    use std::sync::Arc;

    let executor = Arc::new(MotionExecutor::new());
    let state = StateManager::new();
    let safety = SafetySupervisor::new();
    let alt = MockMotorDriver::new(1.0 / STEPS_PER_DEGREE_ALT);
    let az = MockMotorDriver::new(1.0 / STEPS_PER_DEGREE_AZ);

    let stopper = Arc::clone(&executor);
    std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(5));
        stopper.stop();
    });

    // A large target at a slow speed guarantees many step chunks, so
    // the preemption below is observed well before the move completes
    // or times out on its own.
    let result = executor.execute_move(&state, &safety, &alt, &az, 80.0, 300.0, 0.2, 30.0);
    assert!(result.is_ok());
    assert_eq!(state.status(), StatusCode::Idle);
}

#[test]
fn focus_out_increments_the_focus_counter_by_the_requested_steps() {
    let executor = MotionExecutor::new();
    let state = StateManager::new();
    let motor = MockMotorDriver::new(1.0);

    executor.execute_focus(&state, &motor, FocusDirection::Out, 12, 5.0).unwrap();
    assert_eq!(state.focus_position(), 12);
}

#[test]
fn focus_in_from_a_nonzero_position_decrements_the_counter() {
    let executor = MotionExecutor::new();
    let state = StateManager::new();
    let motor = MockMotorDriver::new(1.0);
    state.set_focus_position(20);

    executor.execute_focus(&state, &motor, FocusDirection::In, 8, 5.0).unwrap();
    assert_eq!(state.focus_position(), 12);
}

#[test]
fn focus_timeout_leaves_a_partially_applied_count() {
    let executor = MotionExecutor::new();
    let state = StateManager::new();
    let motor = MockMotorDriver::new(1.0);

    // A zero-second timeout guarantees the deadline has already
    // elapsed before the first chunk completes, so the run stops with
    // the counter still at its starting value rather than silently
    // applying the full request.
    let result = executor.execute_focus(&state, &motor, FocusDirection::Out, 1000, 0.0);
    assert_eq!(result, Err(ErrorCode::FocusTimeout));
}
