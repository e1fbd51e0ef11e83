//! # Auto Telescope
//!
//! Host/controller library for a two-node telescope mount: a
//! controller process that drives altitude/azimuth/focus motors behind
//! a safety supervisor, and a host process that issues motion commands
//! and runs a closed-loop tracking controller over a length-prefixed
//! JSON TCP protocol.
//!
//! ## Quick Start
//!
//! ```rust
//! use auto_telescope::controller::ControllerAgent;
//! use auto_telescope::hardware::MockMotorDriver;
//! use auto_telescope::config::{STEPS_PER_DEGREE_ALT, STEPS_PER_DEGREE_AZ};
//!
//! let agent = ControllerAgent::new(
//!     Box::new(MockMotorDriver::new(1.0 / STEPS_PER_DEGREE_ALT)),
//!     Box::new(MockMotorDriver::new(1.0 / STEPS_PER_DEGREE_AZ)),
//!     Box::new(MockMotorDriver::new(1.0)),
//! );
//! agent.tick_safety();
//! ```
//!
//! ## Architecture
//!
//! - [`protocol`] - wire framing and the `Command`/`Response` types
//! - [`state`] - controller-side state and the snapshot invariants
//! - [`safety`] - limit/bounds/watchdog checks and emergency stop
//! - [`motion`] - chunked move/focus execution
//! - [`hardware`] - motor and GPIO abstraction plus mocks
//! - [`controller`] - ties the above together behind one dispatch call
//! - [`resolver`] - target-name-to-alt/az resolution seam
//! - [`session_log`] - bounded in-memory activity log
//! - [`host`] - command sender/receiver, state mirror, tracking loop
//! - [`config`] - every numeric constant and CLI-derived config struct
//! - [`error`] - wire-visible error codes and internal error types

#![deny(warnings)]
#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod config;
pub mod controller;
pub mod error;
pub mod hardware;
pub mod host;
pub mod motion;
pub mod protocol;
pub mod resolver;
pub mod safety;
pub mod session_log;
pub mod state;

pub use controller::ControllerAgent;
pub use protocol::{Command, Response};
pub use state::TelescopeSnapshot;
