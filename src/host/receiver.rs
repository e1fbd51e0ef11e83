//! Host-side receive task (spec §4.7). A dedicated async task reads
//! frames off the socket for the lifetime of the connection and routes
//! each parsed [`Response`] by `message_type`: Ack/Error complete the
//! matching pending request in `sender::PendingTable`; StateReport
//! updates the [`StateMirror`]. Grounded in the teacher's split
//! read/write halves in `bin/simulator.rs`.

use tokio::io::AsyncRead;
use tracing::{debug, warn};

use crate::host::mirror::StateMirror;
use crate::host::sender::PendingTable;
use crate::protocol::{parse_response, read_frame, Response};

use std::sync::Arc;

/// Runs until the peer closes the connection or a protocol error
/// occurs, returning the terminal reason for logging by the caller.
pub async fn run<R>(mut reader: R, pending: PendingTable, mirror: Arc<StateMirror>) -> crate::error::AppError
where
    R: AsyncRead + Unpin,
{
    loop {
        match read_frame(&mut reader).await {
            Ok(None) => {
                debug!("controller closed connection");
                return crate::error::AppError::PeerClosed;
            }
            Ok(Some(payload)) => match parse_response(&payload) {
                Ok(response) => dispatch(response, &pending, &mirror).await,
                Err(err) => warn!(%err, "dropping unparseable response"),
            },
            Err(err) => return crate::error::AppError::Protocol(err),
        }
    }
}

async fn dispatch(response: Response, pending: &PendingTable, mirror: &StateMirror) {
    match response {
        Response::StateReport { snapshot } => mirror.update(snapshot),
        other => {
            if let Some(id) = other.command_id() {
                if let Some(tx) = pending.lock().await.remove(id) {
                    let _ = tx.send(other);
                } else {
                    warn!(command_id = id, "response for unknown or already-resolved command");
                }
            }
        }
    }
}
