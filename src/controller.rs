//! Controller agent (spec §4.3, §5). Ties state, safety, motion and the
//! wire protocol together behind one dispatch entry point, grounded in
//! the teacher's `agent.rs::SatelliteAgent` (owns hardware, exposes one
//! `execute_command`-shaped dispatch, logs every transition).
//!
//! `dispatch` sends exactly one `Ack`/`Error` response per command
//! before motion executes (spec §4.5 ordering invariant: "the
//! controller sends exactly one Ack ... then zero or more state
//! reports"). A validated `Move`/`Focus` is handed to a dedicated
//! thread so the dispatch loop that called `dispatch` keeps polling
//! for `Stop` and feeding the watchdog while the move is in flight —
//! real moves run tens of seconds, far past `COMMAND_ACK_TIMEOUT_S`.
//! `ControllerAgent` is meant to live behind an `Arc` so that thread can
//! share it with the caller.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::ErrorCode;
use crate::hardware::MotorDriver;
use crate::motion::MotionExecutor;
use crate::protocol::{validate_command, Command, Response};
use crate::safety::SafetySupervisor;
use crate::session_log::SessionLog;
use crate::state::{StateManager, StatusCode};

/// Owns the hardware handles and the per-command dispatch logic. One
/// instance per accepted connection (spec §2: single host connection at
/// a time).
pub struct ControllerAgent {
    pub state: StateManager,
    pub safety: SafetySupervisor,
    pub motion: MotionExecutor,
    pub session_log: SessionLog,
    alt_motor: Box<dyn MotorDriver>,
    az_motor: Box<dyn MotorDriver>,
    focus_motor: Box<dyn MotorDriver>,
}

impl ControllerAgent {
    pub fn new(
        alt_motor: Box<dyn MotorDriver>,
        az_motor: Box<dyn MotorDriver>,
        focus_motor: Box<dyn MotorDriver>,
    ) -> Self {
        Self {
            state: StateManager::new(),
            safety: SafetySupervisor::new(),
            motion: MotionExecutor::new(),
            session_log: SessionLog::new(),
            alt_motor,
            az_motor,
            focus_motor,
        }
    }

    /// One main-loop tick (spec §4.4): feeds the watchdog and runs the
    /// three safety checks. Callers invoke this at `MAIN_LOOP_HZ`.
    pub fn tick_safety(&self) {
        self.safety.feed_watchdog();
        let motors: [&dyn MotorDriver; 3] = [&*self.alt_motor, &*self.az_motor, &*self.focus_motor];
        self.safety.run_tick(&self.state, &motors);
    }

    /// Dispatches one command, returning the single `Ack`/`Error`/
    /// `StateReport` response to send back immediately (spec §4.3).
    /// `StatusRequest` always succeeds. `Reset` and `Stop` apply their
    /// side effects synchronously and return right away. A validated
    /// `Move`/`Focus` is acked here, then executed on a spawned thread;
    /// that thread's eventual success or failure is recorded in
    /// `session_log` and the error state, not in a second response.
    pub fn dispatch(self: &Arc<Self>, command: Command) -> Response {
        match &command {
            Command::StatusRequest {} => Response::StateReport {
                snapshot: self.state.snapshot(),
            },
            Command::Reset { command_id, .. } => {
                self.safety.reset(&self.state);
                self.session_log.record("reset", "emergency stop cleared");
                Response::ack(command_id.clone())
            }
            Command::Stop {
                command_id,
                emergency,
                reason,
                ..
            } => {
                self.motion.stop();
                if *emergency {
                    self.safety.emergency_stop(&self.state, reason);
                    self.session_log.record("emergency_stop", reason.clone());
                } else {
                    self.state.set_status(StatusCode::Idle);
                    self.session_log.record("stop", "motion halted");
                }
                Response::ack(command_id.clone())
            }
            Command::Move { command_id, .. } | Command::Focus { command_id, .. } => {
                let command_id = command_id.clone();
                let errors = validate_command(&command);
                if !errors.is_empty() {
                    warn!(?errors, "rejecting command");
                    return Response::error(command_id, errors.join("; "));
                }
                if self.state.status() == StatusCode::EmergencyStop {
                    return Response::error(command_id, "controller is under emergency stop; send reset first");
                }
                if matches!(self.state.status(), StatusCode::Moving | StatusCode::Focusing) {
                    return Response::error(command_id, "a move or focus command is already in progress");
                }

                // Claim the busy state before returning so a second
                // command racing this one sees Moving/Focusing rather
                // than Idle (spec §5: no concurrent motion).
                self.state.set_status(match &command {
                    Command::Focus { .. } => StatusCode::Focusing,
                    _ => StatusCode::Moving,
                });

                let agent = Arc::clone(self);
                std::thread::spawn(move || agent.run_to_completion(&command, &command_id));

                Response::ack(command_id)
            }
        }
    }

    /// Runs a validated `Move`/`Focus` to completion off the dispatch
    /// thread, logging the outcome. No response is sent for this call —
    /// the caller already got its `Ack` from `dispatch`.
    fn run_to_completion(&self, command: &Command, command_id: &str) {
        match self.execute(command) {
            Ok(()) => {
                self.session_log.record("command", format!("{command_id} completed"));
            }
            Err(code) => {
                self.state.record_error(code, code.description());
                self.session_log.record("command", format!("{command_id} failed: {code}"));
            }
        }
    }

    fn execute(&self, command: &Command) -> Result<(), ErrorCode> {
        match command {
            Command::Move {
                target_alt_deg,
                target_az_deg,
                speed,
                timeout_s,
                ..
            } => {
                info!(target_alt_deg, target_az_deg, "executing move");
                self.motion.execute_move(
                    &self.state,
                    &self.safety,
                    &*self.alt_motor,
                    &*self.az_motor,
                    *target_alt_deg,
                    *target_az_deg,
                    *speed,
                    *timeout_s,
                )
            }
            Command::Focus {
                direction,
                steps,
                timeout_s,
                ..
            } => {
                info!(?direction, steps, "executing focus");
                self.motion.execute_focus(&self.state, &*self.focus_motor, *direction, *steps, *timeout_s)
            }
            Command::Stop { .. } | Command::Reset { .. } | Command::StatusRequest {} => Ok(()),
        }
    }
}
