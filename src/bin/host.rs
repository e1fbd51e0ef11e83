//! Host CLI entry point (spec §1, §6 CLI surface). The host is the TCP
//! *server*: it binds a listening endpoint and accepts exactly one
//! controller connection (spec §4.1 "Session lifecycle (host side)"),
//! then spawns the receive task that keeps the state mirror current
//! and dispatches one subcommand. Grounded in the teacher's
//! `bin/satbus.rs` clap layout (global host/port args, one subcommand
//! per operation, `colored` for pass/fail framing).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use clap::{App, Arg, SubCommand};
use colored::*;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

use auto_telescope::config::DEFAULT_PORT;
use auto_telescope::host::channel::CommandChannel;
use auto_telescope::host::mirror::StateMirror;
use auto_telescope::host::receiver;
use auto_telescope::host::sender::Sender;
use auto_telescope::host::tracker::TrackingController;
use auto_telescope::protocol::FocusDirection;
use auto_telescope::resolver::FixedCatalogResolver;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let matches = App::new("telescope-host")
        .version("0.1.0")
        .author("Telescope Systems Team")
        .about("Host CLI for commanding a telescope controller over TCP")
        .arg(
            Arg::with_name("host")
                .short("H")
                .long("host")
                .value_name("HOST")
                .help("Address to bind and listen on for the controller")
                .takes_value(true)
                .default_value("0.0.0.0")
                .global(true),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .value_name("PORT")
                .help("Port to bind and listen on")
                .takes_value(true)
                .default_value("5050")
                .global(true),
        )
        .arg(
            Arg::with_name("lat")
                .long("lat")
                .value_name("DEGREES")
                .help("Observer latitude, degrees")
                .takes_value(true)
                .default_value("0.0")
                .global(true),
        )
        .arg(
            Arg::with_name("lon")
                .long("lon")
                .value_name("DEGREES")
                .help("Observer longitude, degrees")
                .takes_value(true)
                .default_value("0.0")
                .global(true),
        )
        .arg(
            Arg::with_name("elev")
                .long("elev")
                .value_name("METERS")
                .help("Observer elevation, meters")
                .takes_value(true)
                .default_value("0.0")
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("move")
                .about("Slew to an altitude/azimuth target")
                .arg(Arg::with_name("alt").long("alt").takes_value(true).required(true))
                .arg(Arg::with_name("az").long("az").takes_value(true).required(true))
                .arg(Arg::with_name("speed").long("speed").takes_value(true).default_value("0.5"))
                .arg(Arg::with_name("timeout").long("timeout").takes_value(true).default_value("30.0")),
        )
        .subcommand(
            SubCommand::with_name("focus")
                .about("Move the focuser")
                .arg(
                    Arg::with_name("direction")
                        .long("direction")
                        .takes_value(true)
                        .possible_values(&["in", "out"])
                        .required(true),
                )
                .arg(Arg::with_name("steps").long("steps").takes_value(true).required(true))
                .arg(Arg::with_name("timeout").long("timeout").takes_value(true).default_value("30.0")),
        )
        .subcommand(
            SubCommand::with_name("stop")
                .about("Halt motion")
                .arg(Arg::with_name("emergency").long("emergency").help("Trip the safety supervisor's emergency stop"))
                .arg(Arg::with_name("reason").long("reason").takes_value(true).default_value("operator stop")),
        )
        .subcommand(SubCommand::with_name("reset").about("Clear an emergency stop"))
        .subcommand(SubCommand::with_name("status").about("Print the latest telescope state"))
        .subcommand(
            SubCommand::with_name("track")
                .about("Start the closed-loop tracking controller against a named target")
                .arg(Arg::with_name("target").long("target").takes_value(true).required(true)),
        )
        .subcommand(SubCommand::with_name("monitor").about("Print state reports as they arrive"))
        .get_matches();

    let bind_host = matches.value_of("host").unwrap_or("0.0.0.0").to_string();
    let port: u16 = matches
        .value_of("port")
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let lat_deg: f64 = matches.value_of("lat").and_then(|v| v.parse().ok()).unwrap_or(0.0);
    let lon_deg: f64 = matches.value_of("lon").and_then(|v| v.parse().ok()).unwrap_or(0.0);
    let elev_m: f64 = matches.value_of("elev").and_then(|v| v.parse().ok()).unwrap_or(0.0);

    let listener = TcpListener::bind((bind_host.as_str(), port)).await?;
    info_listening(&bind_host, port);
    let (stream, addr) = listener.accept().await?;
    println!("{} {addr}", "controller connected:".cyan());
    let (read_half, write_half) = stream.into_split();

    let pending = Arc::new(Mutex::new(HashMap::new()));
    let mirror = Arc::new(StateMirror::new());
    let sender = Arc::new(Sender::new(write_half, pending.clone()));

    let receiver_mirror = mirror.clone();
    let receiver_task = tokio::spawn(receiver::run(read_half, pending.clone(), receiver_mirror));

    match matches.subcommand() {
        ("move", Some(sub)) => {
            let alt: f64 = sub.value_of("alt").unwrap().parse()?;
            let az: f64 = sub.value_of("az").unwrap().parse()?;
            let speed: f64 = sub.value_of("speed").unwrap().parse()?;
            let timeout: f64 = sub.value_of("timeout").unwrap().parse()?;
            report(sender.send_move(alt, az, speed, timeout).await, "move");
        }
        ("focus", Some(sub)) => {
            let direction = match sub.value_of("direction").unwrap() {
                "in" => FocusDirection::In,
                _ => FocusDirection::Out,
            };
            let steps: i32 = sub.value_of("steps").unwrap().parse()?;
            let timeout: f64 = sub.value_of("timeout").unwrap().parse()?;
            report(sender.send_focus(direction, steps, timeout).await, "focus");
        }
        ("stop", Some(sub)) => {
            let emergency = sub.is_present("emergency");
            let reason = sub.value_of("reason").unwrap();
            report(sender.send_stop(emergency, reason).await, "stop");
        }
        ("reset", _) => {
            report(sender.send_reset().await, "reset");
        }
        ("status", _) => {
            let _ = sender.send_status_request().await;
            tokio::time::sleep(Duration::from_millis(500)).await;
            match mirror.snapshot() {
                Some(snapshot) => println!("{snapshot:#?}"),
                None => println!("{}", "no status received".yellow()),
            }
        }
        ("track", Some(sub)) => {
            let target = sub.value_of("target").unwrap().to_string();
            // No ephemeris backend is wired up here; a fixed catalog
            // entry stands in for the resolved target (SPEC_FULL §4.13).
            let resolver = Arc::new(FixedCatalogResolver::new().with_entry(target.clone(), 45.0, 180.0));
            let mut tracker = TrackingController::new(sender.clone(), mirror.clone(), resolver, lat_deg, lon_deg, elev_m);
            if tracker.start_tracking(target) {
                println!("{}", "tracking started, press ctrl-c to stop".cyan());
                tracker.run().await;
            } else {
                println!("{}", "tracking refused: target not visible or unresolvable".red());
            }
        }
        ("monitor", _) => loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            if let Some(snapshot) = mirror.snapshot() {
                println!(
                    "{} alt={:.2} az={:.2} status={:?}",
                    "state".cyan(),
                    snapshot.current_alt_deg,
                    snapshot.current_az_deg,
                    snapshot.status
                );
            }
        },
        _ => println!("{}", "no subcommand given; use --help".yellow()),
    }

    receiver_task.abort();
    Ok(())
}

fn info_listening(host: &str, port: u16) {
    tracing::info!(%host, port, "listening for controller connection");
}

fn report(result: Result<(), auto_telescope::error::AppError>, label: &str) {
    match result {
        Ok(()) => println!("{} {}", label.green(), "acknowledged".green()),
        Err(err) => println!("{} {err}", format!("{label} failed:").red()),
    }
}
