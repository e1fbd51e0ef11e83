use std::sync::Arc;

use auto_telescope::config::{STEPS_PER_DEGREE_ALT, STEPS_PER_DEGREE_AZ};
use auto_telescope::controller::ControllerAgent;
use auto_telescope::hardware::MockMotorDriver;
use auto_telescope::protocol::{parse_command, parse_response, read_frame, serialize_command, serialize_response, write_frame, Command, Response};
use auto_telescope::state::StatusCode;

fn agent() -> Arc<ControllerAgent> {
    Arc::new(ControllerAgent::new(
        Box::new(MockMotorDriver::new(1.0 / STEPS_PER_DEGREE_ALT)),
        Box::new(MockMotorDriver::new(1.0 / STEPS_PER_DEGREE_AZ)),
        Box::new(MockMotorDriver::new(1.0)),
    ))
}

/// Drives one request/response round trip over an in-memory duplex pipe
/// the way the controller binary drives it over a real socket: parse
/// the frame, dispatch it against a live `ControllerAgent`, and write
/// the serialized response back.
async fn round_trip(command: Command) -> Response {
    let (mut client, mut controller_side) = tokio::io::duplex(8192);
    let payload = serialize_command(&command).unwrap();

    write_frame(&mut client, &payload).await.unwrap();
    drop(client);

    let received = read_frame(&mut controller_side).await.unwrap().unwrap();
    let decoded = parse_command(&received).unwrap();

    let controller_agent = agent();
    let response = controller_agent.dispatch(decoded);
    let response_bytes = serialize_response(&response).unwrap();

    let (mut response_writer, mut response_reader) = tokio::io::duplex(8192);
    write_frame(&mut response_writer, &response_bytes).await.unwrap();
    drop(response_writer);
    let response_payload = read_frame(&mut response_reader).await.unwrap().unwrap();
    parse_response(&response_payload).unwrap()
}

#[tokio::test]
async fn status_request_round_trips_to_a_state_report() {
    let response = round_trip(Command::StatusRequest {}).await;
    match response {
        Response::StateReport { snapshot } => assert_eq!(snapshot.status, StatusCode::Idle),
        _ => panic!("expected a state report"),
    }
}

#[tokio::test]
async fn out_of_range_move_round_trips_to_an_error_response() {
    let command = Command::Move {
        command_id: "m1".into(),
        timestamp: 0.0,
        target_alt_deg: 500.0,
        target_az_deg: 0.0,
        speed: 0.5,
        timeout_s: 5.0,
    };
    let response = round_trip(command).await;
    match response {
        Response::Error { command_id, .. } => assert_eq!(command_id, "m1"),
        _ => panic!("expected an error response"),
    }
}

#[test]
fn disconnect_mid_frame_is_distinguished_from_a_clean_close() {
    use auto_telescope::error::ProtocolError;

    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        let (mut client, server) = tokio::io::duplex(64);
        drop(server);
        let clean_close = auto_telescope::protocol::read_frame(&mut client).await.unwrap();
        assert!(clean_close.is_none());

        let (mut client, mut server) = tokio::io::duplex(64);
        tokio::io::AsyncWriteExt::write_all(&mut server, &[0, 0, 0, 10, 1, 2]).await.unwrap();
        drop(server);
        let result = auto_telescope::protocol::read_frame(&mut client).await;
        assert!(matches!(result, Err(ProtocolError::ClosedMidFrame)));
    });
}

#[test]
fn a_full_session_logs_every_command_it_handles() {
    let controller_agent = agent();
    controller_agent.dispatch(Command::StatusRequest {});
    controller_agent.dispatch(Command::Reset {
        command_id: "r1".into(),
        timestamp: 0.0,
    });
    assert!(!controller_agent.session_log.is_empty());
}
