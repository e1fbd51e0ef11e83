//! Numeric constants from spec §6 and the §6.1 implementation-detail
//! defaults, plus the CLI-derived configuration structs for each binary.

/// Minimum altitude, degrees.
pub const ALT_MIN: f64 = 0.0;
/// Maximum altitude, degrees.
pub const ALT_MAX: f64 = 90.0;
/// Minimum azimuth, degrees.
pub const AZ_MIN: f64 = 0.0;
/// Maximum azimuth, degrees.
pub const AZ_MAX: f64 = 360.0;
pub const SPEED_MIN: f64 = 0.0;
pub const SPEED_MAX: f64 = 1.0;
pub const FOCUS_STEPS_MIN: i32 = 1;
pub const FOCUS_STEPS_MAX: i32 = 10_000;
pub const MAX_MESSAGE_SIZE: u32 = 65_536;
pub const HEADER_SIZE: usize = 4;
pub const DEFAULT_COMMAND_TIMEOUT_S: f64 = 30.0;
pub const DEFAULT_SPEED: f64 = 0.5;
pub const DEFAULT_PORT: u16 = 5050;

/// Dispatch loop tick rate on the controller.
pub const MAIN_LOOP_HZ: f64 = 50.0;
/// State snapshot publish rate.
pub const STATE_REPORT_HZ: f64 = 2.0;

pub const STEPS_PER_DEGREE_ALT: f64 = 177.78;
pub const STEPS_PER_DEGREE_AZ: f64 = 177.78;
pub const STEP_CHUNK_SIZE: u32 = 20;
pub const MIN_STEP_RATE_HZ: f64 = 50.0;
pub const MAX_STEP_RATE_HZ: f64 = 800.0;
pub const WATCHDOG_TIMEOUT_S: f64 = 2.0;

pub const FOCUS_POSITION_MIN: i32 = 0;
pub const FOCUS_POSITION_MAX: i32 = 10_000;

pub const MAX_RECONNECT_ATTEMPTS: u32 = 5;
pub const RECONNECT_DELAY_S: f64 = 2.0;

pub const TRACKING_LOOP_HZ: f64 = 1.0;
pub const TRACKING_TOLERANCE_DEG: f64 = 0.05;
pub const PID_KP: f64 = 0.8;
pub const PID_KI: f64 = 0.05;
pub const PID_KD: f64 = 0.1;
pub const TRACKING_SPEED_MIN: f64 = 0.05;
pub const TRACKING_SPEED_MAX: f64 = 1.0;

pub const COMMAND_ACK_TIMEOUT_S: f64 = 5.0;

pub const SESSION_LOG_CAPACITY: usize = 1000;

/// Configuration for the controller binary: `host, port, mock-mode`
/// (spec §6 CLI surface). The controller is the TCP *client*: it dials
/// out to the host's listening endpoint with bounded reconnect (spec
/// §4.1 "Session lifecycle (controller side)").
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    pub host: String,
    pub port: u16,
    pub mock_mode: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            mock_mode: true,
        }
    }
}

/// Configuration for the host binary: `host, port, lat, lon, elev,
/// simulate` (spec §6 CLI surface). The host is the TCP *server*: it
/// binds and accepts exactly one controller connection (spec §4.1
/// "Session lifecycle (host side)").
#[derive(Debug, Clone)]
pub struct HostConfig {
    pub bind_host: String,
    pub port: u16,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub elev_m: f64,
    pub simulate: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            lat_deg: 0.0,
            lon_deg: 0.0,
            elev_m: 0.0,
            simulate: false,
        }
    }
}
