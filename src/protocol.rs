//! Wire protocol and session framing (spec §4.1, §4.2, §6).
//!
//! A frame is `HEADER(4 bytes, big-endian u32 length) || PAYLOAD` where
//! `PAYLOAD` is `length` bytes of UTF-8 JSON object text. Framing here
//! mirrors the teacher's single-writer-lock send discipline
//! (`protocol.rs::ProtocolHandler`) but speaks length-prefixed JSON
//! rather than the teacher's newline-delimited wire format, per
//! `shared/protocols/tcp_protocol.py`.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::config::{
    ALT_MAX, ALT_MIN, AZ_MAX, AZ_MIN, DEFAULT_COMMAND_TIMEOUT_S, DEFAULT_SPEED, FOCUS_STEPS_MAX,
    FOCUS_STEPS_MIN, HEADER_SIZE, MAX_MESSAGE_SIZE, SPEED_MAX, SPEED_MIN,
};
use crate::error::ProtocolError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusDirection {
    In,
    Out,
}

/// Tagged command variant (spec §3, §6). Every non-status command
/// carries a host-assigned `command_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command_type", rename_all = "snake_case")]
pub enum Command {
    Move {
        command_id: String,
        timestamp: f64,
        target_alt_deg: f64,
        target_az_deg: f64,
        #[serde(default = "default_speed")]
        speed: f64,
        #[serde(default = "default_timeout")]
        timeout_s: f64,
    },
    Focus {
        command_id: String,
        timestamp: f64,
        direction: FocusDirection,
        steps: i32,
        #[serde(default = "default_timeout")]
        timeout_s: f64,
    },
    Stop {
        command_id: String,
        timestamp: f64,
        #[serde(default)]
        emergency: bool,
        #[serde(default)]
        reason: String,
    },
    /// Additive: Open Question (a) resolution. Clears `emergency_stop`.
    Reset {
        command_id: String,
        timestamp: f64,
    },
    StatusRequest {},
}

fn default_speed() -> f64 {
    DEFAULT_SPEED
}

fn default_timeout() -> f64 {
    DEFAULT_COMMAND_TIMEOUT_S
}

impl Command {
    pub fn command_id(&self) -> Option<&str> {
        match self {
            Command::Move { command_id, .. }
            | Command::Focus { command_id, .. }
            | Command::Stop { command_id, .. }
            | Command::Reset { command_id, .. } => Some(command_id),
            Command::StatusRequest {} => None,
        }
    }
}

/// Tagged response variant (spec §3, §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "message_type", rename_all = "snake_case")]
pub enum Response {
    Ack {
        command_id: String,
        timestamp: f64,
    },
    Error {
        command_id: String,
        error: String,
        timestamp: f64,
    },
    StateReport {
        #[serde(flatten)]
        snapshot: crate::state::TelescopeSnapshot,
    },
}

impl Response {
    pub fn ack(command_id: impl Into<String>) -> Self {
        Response::Ack {
            command_id: command_id.into(),
            timestamp: crate::state::now_seconds(),
        }
    }

    pub fn error(command_id: impl Into<String>, message: impl Into<String>) -> Self {
        Response::Error {
            command_id: command_id.into(),
            error: message.into(),
            timestamp: crate::state::now_seconds(),
        }
    }

    pub fn command_id(&self) -> Option<&str> {
        match self {
            Response::Ack { command_id, .. } => Some(command_id),
            Response::Error { command_id, .. } => Some(command_id),
            Response::StateReport { .. } => None,
        }
    }
}

/// Validates a [`Command`] against the ranges in spec §4.2 / §6.
/// Returns a list of human-readable errors; an empty list means
/// accept. Unknown `command_type` values are rejected at
/// deserialization time (§9 Design Notes), not here.
pub fn validate_command(command: &Command) -> Vec<String> {
    let mut errors = Vec::new();
    match command {
        Command::Move {
            target_alt_deg,
            target_az_deg,
            speed,
            ..
        } => {
            if !(ALT_MIN..=ALT_MAX).contains(target_alt_deg) {
                errors.push(format!(
                    "target_alt_deg {target_alt_deg} out of range [{ALT_MIN}, {ALT_MAX}]"
                ));
            }
            if !(AZ_MIN..=AZ_MAX).contains(target_az_deg) {
                errors.push(format!(
                    "target_az_deg {target_az_deg} out of range [{AZ_MIN}, {AZ_MAX}]"
                ));
            }
            if !(SPEED_MIN..=SPEED_MAX).contains(speed) {
                errors.push(format!("speed {speed} out of range [{SPEED_MIN}, {SPEED_MAX}]"));
            }
        }
        Command::Focus { steps, .. } => {
            if *steps < FOCUS_STEPS_MIN || *steps > FOCUS_STEPS_MAX {
                errors.push(format!(
                    "steps {steps} out of range [{FOCUS_STEPS_MIN}, {FOCUS_STEPS_MAX}]"
                ));
            }
        }
        Command::Stop { .. } | Command::Reset { .. } | Command::StatusRequest {} => {}
    }
    errors
}

/// Reads one frame from `reader`. Returns `Ok(None)` when the peer
/// closed the stream cleanly before any header bytes arrived (spec
/// §4.1: "peer closed", not an error); returns
/// `Err(ProtocolError::ClosedMidFrame)` on a close partway through a
/// header or payload, and `Err(ProtocolError::OversizedFrame)` when
/// the declared length exceeds `MAX_MESSAGE_SIZE`.
pub async fn read_frame<R>(reader: &mut R) -> Result<Option<Vec<u8>>, ProtocolError>
where
    R: AsyncReadExt + Unpin,
{
    let mut header = [0u8; HEADER_SIZE];
    let mut read_total = 0usize;
    while read_total < HEADER_SIZE {
        let n = reader
            .read(&mut header[read_total..])
            .await
            .map_err(|_| ProtocolError::ClosedMidFrame)?;
        if n == 0 {
            if read_total == 0 {
                return Ok(None);
            }
            return Err(ProtocolError::ClosedMidFrame);
        }
        read_total += n;
    }

    let length = u32::from_be_bytes(header);
    if length > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::OversizedFrame(length));
    }

    let mut payload = vec![0u8; length as usize];
    reader
        .read_exact(&mut payload)
        .await
        .map_err(|_| ProtocolError::ClosedMidFrame)?;
    Ok(Some(payload))
}

/// Writes one frame to `writer`: the full header+payload must land
/// before any other writer may enqueue bytes (spec §4.1 "send is
/// atomic"). Callers serialize this behind a single write mutex per
/// endpoint (`host::sender::Sender`, `controller::ControllerAgent`).
pub async fn write_frame<W>(writer: &mut W, payload: &[u8]) -> Result<(), ProtocolError>
where
    W: AsyncWriteExt + Unpin,
{
    if payload.len() as u32 > MAX_MESSAGE_SIZE {
        return Err(ProtocolError::OversizedFrame(payload.len() as u32));
    }
    let header = (payload.len() as u32).to_be_bytes();
    writer
        .write_all(&header)
        .await
        .map_err(|_| ProtocolError::ClosedMidFrame)?;
    writer
        .write_all(payload)
        .await
        .map_err(|_| ProtocolError::ClosedMidFrame)?;
    writer.flush().await.map_err(|_| ProtocolError::ClosedMidFrame)?;
    Ok(())
}

/// Parses a frame payload into a [`Command`]. A non-object payload or
/// unrecognized `command_type` is a fatal, non-dispatchable error
/// (spec §4.2).
pub fn parse_command(payload: &[u8]) -> Result<Command, ProtocolError> {
    let value: serde_json::Value =
        serde_json::from_slice(payload).map_err(|_| ProtocolError::NotAnObject)?;
    if !value.is_object() {
        return Err(ProtocolError::NotAnObject);
    }
    serde_json::from_value(value).map_err(|_| ProtocolError::UnknownCommandType)
}

pub fn serialize_command(command: &Command) -> Result<Vec<u8>, crate::error::AppError> {
    Ok(serde_json::to_vec(command)?)
}

pub fn parse_response(payload: &[u8]) -> Result<Response, ProtocolError> {
    serde_json::from_slice(payload).map_err(|_| ProtocolError::UnknownCommandType)
}

pub fn serialize_response(response: &Response) -> Result<Vec<u8>, crate::error::AppError> {
    Ok(serde_json::to_vec(response)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn move_command() -> Command {
        Command::Move {
            command_id: "m1".into(),
            timestamp: 1000.0,
            target_alt_deg: 45.0,
            target_az_deg: 90.0,
            speed: 0.5,
            timeout_s: 30.0,
        }
    }

    #[test]
    fn valid_move_has_no_errors() {
        assert!(validate_command(&move_command()).is_empty());
    }

    #[test]
    fn out_of_range_move_is_rejected() {
        let command = Command::Move {
            command_id: "m2".into(),
            timestamp: 1000.0,
            target_alt_deg: 200.0,
            target_az_deg: 90.0,
            speed: 0.5,
            timeout_s: 30.0,
        };
        let errors = validate_command(&command);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn boundary_values_are_accepted() {
        let command = Command::Move {
            command_id: "m3".into(),
            timestamp: 1000.0,
            target_alt_deg: ALT_MAX,
            target_az_deg: AZ_MAX,
            speed: SPEED_MAX,
            timeout_s: 30.0,
        };
        assert!(validate_command(&command).is_empty());
    }

    #[test]
    fn off_by_epsilon_is_rejected() {
        let command = Command::Move {
            command_id: "m4".into(),
            timestamp: 1000.0,
            target_alt_deg: ALT_MAX + 1e-9,
            target_az_deg: 90.0,
            speed: 0.5,
            timeout_s: 30.0,
        };
        assert!(!validate_command(&command).is_empty());
    }

    #[test]
    fn under_bound_focus_is_rejected() {
        let command = Command::Focus {
            command_id: "f1".into(),
            timestamp: 1000.0,
            direction: FocusDirection::In,
            steps: 0,
            timeout_s: 30.0,
        };
        assert!(!validate_command(&command).is_empty());
    }

    #[test]
    fn command_round_trips_through_json() {
        let original = move_command();
        let bytes = serialize_command(&original).unwrap();
        let decoded = parse_command(&bytes).unwrap();
        match decoded {
            Command::Move { command_id, target_alt_deg, .. } => {
                assert_eq!(command_id, "m1");
                assert_eq!(target_alt_deg, 45.0);
            }
            _ => panic!("expected Move"),
        }
    }

    #[test]
    fn unknown_command_type_is_rejected() {
        let payload = br#"{"command_type":"launch_missiles","command_id":"x"}"#;
        assert!(parse_command(payload).is_err());
    }

    #[test]
    fn non_object_payload_is_rejected() {
        let payload = br#"[1,2,3]"#;
        assert!(parse_command(payload).is_err());
    }

    #[tokio::test]
    async fn clean_close_before_header_yields_none() {
        let (mut client, server) = tokio::io::duplex(64);
        drop(server);
        let result = read_frame(&mut client).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn close_mid_frame_is_protocol_error() {
        let (mut client, mut server) = tokio::io::duplex(64);
        server.write_all(&[0, 0, 0, 10, 1, 2, 3]).await.unwrap();
        drop(server);
        let result = read_frame(&mut client).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let (mut client, mut server) = tokio::io::duplex(64);
        server
            .write_all(&(MAX_MESSAGE_SIZE + 1).to_be_bytes())
            .await
            .unwrap();
        drop(server);
        let result = read_frame(&mut client).await;
        assert!(matches!(result, Err(ProtocolError::OversizedFrame(_))));
    }

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let command = move_command();
        let payload = serialize_command(&command).unwrap();

        let (mut client, mut server) = tokio::io::duplex(4096);
        write_frame(&mut client, &payload).await.unwrap();
        drop(client);

        let read_back = read_frame(&mut server).await.unwrap().unwrap();
        assert_eq!(read_back, payload);
    }
}
