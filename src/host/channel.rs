//! Command-issuing seam (spec §4.6). `TrackingController` and the CLI
//! binary both depend on this trait rather than on `Sender` directly,
//! matching the teacher's pattern of dispatching behind a small trait
//! at the module boundary instead of a concrete socket type.

use async_trait::async_trait;

use crate::error::AppError;
use crate::protocol::FocusDirection;

#[async_trait]
pub trait CommandChannel: Send + Sync {
    async fn send_move(&self, target_alt_deg: f64, target_az_deg: f64, speed: f64, timeout_s: f64) -> Result<(), AppError>;
    async fn send_focus(&self, direction: FocusDirection, steps: i32, timeout_s: f64) -> Result<(), AppError>;
    async fn send_stop(&self, emergency: bool, reason: &str) -> Result<(), AppError>;
    async fn send_reset(&self) -> Result<(), AppError>;
    async fn send_status_request(&self) -> Result<(), AppError>;
}
