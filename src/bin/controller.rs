//! Controller process entry point (spec §1, §2, §5). The controller is
//! the TCP *client*: it dials the host's listening endpoint with a
//! bounded reconnect loop, then runs one connection at a time with a
//! dedicated read task and write task bridged to a blocking dispatch
//! loop (so a long move never stalls the async runtime) via
//! `tokio::sync::mpsc` channels. Grounded in the teacher's
//! `bin/simulator.rs` accept-loop shape, adapted to a dial-out session.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{App, Arg};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

use auto_telescope::config::{
    ControllerConfig, DEFAULT_PORT, MAIN_LOOP_HZ, MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY_S, STATE_REPORT_HZ,
    STEPS_PER_DEGREE_ALT, STEPS_PER_DEGREE_AZ,
};
use auto_telescope::controller::ControllerAgent;
use auto_telescope::error::ErrorCode;
use auto_telescope::hardware::MockMotorDriver;
use auto_telescope::protocol::{parse_command, read_frame, serialize_response, write_frame, Response};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let matches = App::new("telescope-controller")
        .version("0.1.0")
        .author("Telescope Systems Team")
        .about("Controller process driving the telescope mount over TCP")
        .arg(
            Arg::with_name("host")
                .short("h")
                .long("host")
                .value_name("HOST")
                .help("Address of the host process to connect to")
                .takes_value(true)
                .default_value("127.0.0.1"),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Host port")
                .takes_value(true)
                .default_value("5050"),
        )
        .arg(
            Arg::with_name("mock-mode")
                .long("mock-mode")
                .help("Run against simulated motors instead of real hardware (currently the only supported mode)"),
        )
        .get_matches();

    let config = ControllerConfig {
        host: matches.value_of("host").unwrap_or("127.0.0.1").to_string(),
        port: matches
            .value_of("port")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT),
        mock_mode: true,
    };

    let agent = Arc::new(ControllerAgent::new(
        Box::new(MockMotorDriver::new(1.0 / STEPS_PER_DEGREE_ALT)),
        Box::new(MockMotorDriver::new(1.0 / STEPS_PER_DEGREE_AZ)),
        Box::new(MockMotorDriver::new(1.0)),
    ));

    let mut attempt: u32 = 0;
    loop {
        info!(host = %config.host, port = config.port, attempt, "connecting to host");
        match TcpStream::connect((config.host.as_str(), config.port)).await {
            Ok(stream) => {
                attempt = 0;
                agent.state.clear_error(ErrorCode::CommsDisconnect);
                info!("connected to host");
                if let Err(err) = handle_connection(stream, Arc::clone(&agent)).await {
                    error!(%err, "connection ended with error");
                }
                agent.state.record_error(ErrorCode::CommsDisconnect, "connection to host lost");
                warn!("disconnected from host");
            }
            Err(err) => {
                warn!(%err, "connect attempt failed");
            }
        }

        attempt += 1;
        if attempt >= MAX_RECONNECT_ATTEMPTS {
            error!(attempts = attempt, "exceeded MAX_RECONNECT_ATTEMPTS, giving up");
            return Ok(());
        }
        tokio::time::sleep(Duration::from_secs_f64(RECONNECT_DELAY_S)).await;
    }
}

async fn handle_connection(socket: TcpStream, agent: Arc<ControllerAgent>) -> Result<(), Box<dyn std::error::Error>> {
    let (mut read_half, mut write_half) = socket.into_split();

    let (inbound_tx, mut inbound_rx) = mpsc::channel::<Vec<u8>>(32);
    let (outbound_tx, mut outbound_rx) = mpsc::channel::<Vec<u8>>(32);

    let read_task = tokio::spawn(async move {
        loop {
            match read_frame(&mut read_half).await {
                Ok(Some(payload)) => {
                    if inbound_tx.send(payload).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(err) => {
                    warn!(%err, "framing error, closing connection");
                    break;
                }
            }
        }
    });

    let write_task = tokio::spawn(async move {
        while let Some(payload) = outbound_rx.recv().await {
            if write_frame(&mut write_half, &payload).await.is_err() {
                break;
            }
        }
    });

    let dispatch_outbound_tx = outbound_tx.clone();
    let dispatch_agent = Arc::clone(&agent);
    let dispatch_task = tokio::task::spawn_blocking(move || {
        let agent = dispatch_agent;
        let tick_period = Duration::from_secs_f64(1.0 / MAIN_LOOP_HZ);
        let report_period = Duration::from_secs_f64(1.0 / STATE_REPORT_HZ);
        let mut last_report = Instant::now();

        loop {
            let tick_start = Instant::now();

            match inbound_rx.try_recv() {
                Ok(payload) => match parse_command(&payload) {
                    Ok(command) => {
                        let response = agent.dispatch(command);
                        if let Ok(bytes) = serialize_response(&response) {
                            if dispatch_outbound_tx.blocking_send(bytes).is_err() {
                                break;
                            }
                        }
                    }
                    Err(err) => warn!(%err, "dropping unparseable command"),
                },
                Err(mpsc::error::TryRecvError::Empty) => {}
                Err(mpsc::error::TryRecvError::Disconnected) => break,
            }

            // Motion for Move/Focus runs on its own thread spawned from
            // `dispatch`, so this tick keeps running — feeding the
            // watchdog and staying responsive to `Stop` — for the full
            // duration of an in-flight move (spec §5, §8 scenario 5).
            agent.tick_safety();

            if last_report.elapsed() >= report_period {
                let response = Response::StateReport {
                    snapshot: agent.state.snapshot(),
                };
                if let Ok(bytes) = serialize_response(&response) {
                    if dispatch_outbound_tx.blocking_send(bytes).is_err() {
                        break;
                    }
                }
                last_report = Instant::now();
            }

            let elapsed = tick_start.elapsed();
            if elapsed < tick_period {
                std::thread::sleep(tick_period - elapsed);
            }
        }
    });

    let _ = read_task.await;
    drop(outbound_tx);
    let _ = write_task.await;
    let _ = dispatch_task.await;

    Ok(())
}
