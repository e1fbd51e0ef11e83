//! Command sender (spec §4.6). Owns the socket write half and the
//! command-id counter; every public command method blocks on the
//! matching Ack/Error via a pending-request table keyed by
//! `command_id`, grounded in the teacher's `protocol.rs` request/ack
//! correlation and `tokio::sync::oneshot` completion pattern used
//! throughout the teacher's async call sites.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::AsyncWrite;
use tokio::sync::{oneshot, Mutex};

use crate::config::COMMAND_ACK_TIMEOUT_S;
use crate::error::AppError;
use crate::host::channel::CommandChannel;
use crate::protocol::{serialize_command, write_frame, Command, FocusDirection, Response};
use crate::state::now_seconds;

pub type PendingTable = Arc<Mutex<HashMap<String, oneshot::Sender<Response>>>>;

/// Writes commands to the controller and waits for their matching
/// response. Requires exclusive access to the write half — the single
/// write mutex is the socket write half's owning `Mutex` below, not an
/// additional lock, matching spec §4.1's "send is atomic" framing rule.
pub struct Sender<W> {
    writer: Mutex<W>,
    pending: PendingTable,
    next_id: AtomicU64,
}

impl<W> Sender<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(writer: W, pending: PendingTable) -> Self {
        Self {
            writer: Mutex::new(writer),
            pending,
            next_id: AtomicU64::new(1),
        }
    }

    fn next_command_id(&self) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        format!("cmd-{id}")
    }

    async fn send_and_wait(&self, command: Command) -> Result<Response, AppError> {
        let command_id = command.command_id().map(str::to_string);
        let payload = serialize_command(&command)?;

        let rx = if let Some(id) = command_id {
            let (tx, rx) = oneshot::channel();
            self.pending.lock().await.insert(id, tx);
            Some(rx)
        } else {
            None
        };

        {
            let mut writer = self.writer.lock().await;
            write_frame(&mut *writer, &payload).await?;
        }

        match rx {
            Some(rx) => tokio::time::timeout(Duration::from_secs_f64(COMMAND_ACK_TIMEOUT_S), rx)
                .await
                .map_err(|_| AppError::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "command ack timed out")))?
                .map_err(|_| AppError::Io(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "receiver task dropped"))),
            None => Ok(Response::ack("status_request")),
        }
    }
}

#[async_trait]
impl<W> CommandChannel for Sender<W>
where
    W: AsyncWrite + Unpin + Send + Sync,
{
    async fn send_move(&self, target_alt_deg: f64, target_az_deg: f64, speed: f64, timeout_s: f64) -> Result<(), AppError> {
        let command = Command::Move {
            command_id: self.next_command_id(),
            timestamp: now_seconds(),
            target_alt_deg,
            target_az_deg,
            speed,
            timeout_s,
        };
        expect_ack(self.send_and_wait(command).await?)
    }

    async fn send_focus(&self, direction: FocusDirection, steps: i32, timeout_s: f64) -> Result<(), AppError> {
        let command = Command::Focus {
            command_id: self.next_command_id(),
            timestamp: now_seconds(),
            direction,
            steps,
            timeout_s,
        };
        expect_ack(self.send_and_wait(command).await?)
    }

    async fn send_stop(&self, emergency: bool, reason: &str) -> Result<(), AppError> {
        let command = Command::Stop {
            command_id: self.next_command_id(),
            timestamp: now_seconds(),
            emergency,
            reason: reason.to_string(),
        };
        expect_ack(self.send_and_wait(command).await?)
    }

    async fn send_reset(&self) -> Result<(), AppError> {
        let command = Command::Reset {
            command_id: self.next_command_id(),
            timestamp: now_seconds(),
        };
        expect_ack(self.send_and_wait(command).await?)
    }

    async fn send_status_request(&self) -> Result<(), AppError> {
        self.send_and_wait(Command::StatusRequest {}).await.map(|_| ())
    }
}

fn expect_ack(response: Response) -> Result<(), AppError> {
    match response {
        Response::Ack { .. } => Ok(()),
        Response::Error { error, .. } => Err(AppError::Validation(vec![error])),
        Response::StateReport { .. } => Ok(()),
    }
}
