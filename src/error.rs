use std::fmt;

/// Wire-visible error taxonomy, grouped by decade (spec §7).
///
/// These codes travel inside a [`crate::state::TelescopeSnapshot`]'s
/// `error_codes` set; they are not the same thing as [`AppError`], which
/// never crosses the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
#[repr(u16)]
pub enum ErrorCode {
    MotorStall = 10,
    MotorOvercurrent = 11,
    MotorTimeout = 12,
    MotorNotInitialized = 13,

    PositionOutOfRange = 20,
    PositionLimitHit = 21,
    PositionUnknown = 22,

    FocusStall = 30,
    FocusLimitHit = 31,
    FocusTimeout = 32,

    CommsTimeout = 40,
    CommsDisconnect = 41,
    CommsInvalidMessage = 42,
    CommsProtocolError = 43,

    CameraGeneric = 50,
    CameraDisconnected = 51,
    CameraTimeout = 52,

    SensorFault = 60,
    SensorDisconnected = 61,

    SafetyLimitExceeded = 70,
    SafetyEmergencyStop = 71,
    SafetyWatchdogTimeout = 72,
}

impl ErrorCode {
    pub fn description(self) -> &'static str {
        match self {
            ErrorCode::MotorStall => "motor stalled",
            ErrorCode::MotorOvercurrent => "motor overcurrent",
            ErrorCode::MotorTimeout => "motor did not complete move in time",
            ErrorCode::MotorNotInitialized => "motor not initialized",
            ErrorCode::PositionOutOfRange => "commanded position out of range",
            ErrorCode::PositionLimitHit => "position limit switch asserted",
            ErrorCode::PositionUnknown => "position unknown",
            ErrorCode::FocusStall => "focus motor stalled",
            ErrorCode::FocusLimitHit => "focus position limit reached",
            ErrorCode::FocusTimeout => "focus did not complete move in time",
            ErrorCode::CommsTimeout => "communications timeout",
            ErrorCode::CommsDisconnect => "communications link disconnected",
            ErrorCode::CommsInvalidMessage => "invalid message received",
            ErrorCode::CommsProtocolError => "protocol framing error",
            ErrorCode::CameraGeneric => "camera error",
            ErrorCode::CameraDisconnected => "camera disconnected",
            ErrorCode::CameraTimeout => "camera timeout",
            ErrorCode::SensorFault => "sensor fault",
            ErrorCode::SensorDisconnected => "sensor disconnected",
            ErrorCode::SafetyLimitExceeded => "position outside safety bounds",
            ErrorCode::SafetyEmergencyStop => "emergency stop active",
            ErrorCode::SafetyWatchdogTimeout => "main loop watchdog expired",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", *self as u16, self.description())
    }
}

/// Library-internal error type. Never serialized to the wire directly;
/// operations that fail across the protocol boundary map into an
/// [`ErrorCode`] or a `Response::Error{message}` string instead.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The peer closed its write half cleanly between frames. Distinct
    /// from [`ProtocolError::ClosedMidFrame`], which means the peer
    /// vanished partway through sending one.
    #[error("peer closed the connection")]
    PeerClosed,

    #[error("validation failed: {0:?}")]
    Validation(Vec<String>),

    #[error("safety violation: {0}")]
    Safety(ErrorCode),

    #[error("motion failed: {0}")]
    Motion(ErrorCode),

    #[error("resolver error: {0}")]
    Resolve(#[from] ResolveError),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Framing-layer failures (spec §4.1).
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("frame length {0} exceeds MAX_MESSAGE_SIZE")]
    OversizedFrame(u32),

    #[error("peer closed connection mid-frame")]
    ClosedMidFrame,

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("unknown command_type")]
    UnknownCommandType,
}

/// Errors the injected [`crate::resolver::TargetResolver`] may return.
/// The tracking loop treats every variant identically: skip this tick.
#[derive(Debug, thiserror::Error, Clone)]
pub enum ResolveError {
    #[error("unknown target {0:?}")]
    UnknownTarget(String),

    #[error("resolver backend unavailable: {0}")]
    Unavailable(String),
}
