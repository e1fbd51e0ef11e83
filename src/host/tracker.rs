//! Tracking loop (spec §4.7). Polls a [`TargetResolver`] at
//! `TRACKING_LOOP_HZ`, feeds the single scalar angular error through
//! one [`Pid`], and issues `Move` commands through a [`CommandChannel`]
//! when the error exceeds `TRACKING_TOLERANCE_DEG`. Grounded in the
//! original source's `host/control/tracking_controller.py`.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::config::{TRACKING_LOOP_HZ, TRACKING_TOLERANCE_DEG};
use crate::host::channel::CommandChannel;
use crate::host::math::angular_distance;
use crate::host::mirror::StateMirror;
use crate::host::pid::Pid;
use crate::resolver::TargetResolver;

/// Owns the loop's running state. `start_tracking`/`stop_tracking` flip
/// a flag the spawned task polls once per tick; `update` performs a
/// single tick and is exposed separately so tests can drive it without
/// a background task.
pub struct TrackingController<C, R> {
    channel: Arc<C>,
    mirror: Arc<StateMirror>,
    resolver: Arc<R>,
    pid: Pid,
    target_name: Option<String>,
    lat_deg: f64,
    lon_deg: f64,
    elev_m: f64,
    stop: Arc<Notify>,
}

impl<C, R> TrackingController<C, R>
where
    C: CommandChannel + 'static,
    R: TargetResolver + 'static,
{
    pub fn new(channel: Arc<C>, mirror: Arc<StateMirror>, resolver: Arc<R>, lat_deg: f64, lon_deg: f64, elev_m: f64) -> Self {
        Self {
            channel,
            mirror,
            resolver,
            pid: Pid::new(),
            target_name: None,
            lat_deg,
            lon_deg,
            elev_m,
            stop: Arc::new(Notify::new()),
        }
    }

    /// Resolves `target_name` and starts tracking it. Refuses (and
    /// leaves tracking off) if the resolver errors or the target is not
    /// currently visible (`alt_deg <= 0`, spec §4.7). Returns whether
    /// tracking actually started.
    pub fn start_tracking(&mut self, target_name: impl Into<String>) -> bool {
        let target_name = target_name.into();
        let target = match self.resolver.resolve(&target_name, self.lat_deg, self.lon_deg, self.elev_m) {
            Ok(target) => target,
            Err(err) => {
                warn!(%err, target = %target_name, "refusing to start tracking: resolve failed");
                return false;
            }
        };
        if !target.visible {
            warn!(target = %target_name, alt_deg = target.alt_deg, "refusing to start tracking: target not visible");
            return false;
        }

        self.target_name = Some(target_name);
        self.pid.reset();
        info!(target = ?self.target_name, "tracking started");
        true
    }

    pub fn stop_tracking(&mut self) {
        self.target_name = None;
        self.stop.notify_one();
        info!("tracking stopped");
    }

    pub fn is_tracking(&self) -> bool {
        self.target_name.is_some()
    }

    /// Performs a single tracking tick: resolves the current target
    /// position, compares it against the mirrored telescope position,
    /// and sends a corrective `Move` if the error exceeds tolerance.
    /// Any resolver error is logged and the tick is skipped (spec §4.8:
    /// "every [resolver] error is treated identically"). If the target
    /// has set below the horizon since tracking started, tracking stops
    /// automatically.
    pub async fn update(&mut self, dt_s: f64) {
        let Some(target_name) = self.target_name.clone() else {
            return;
        };

        let target = match self.resolver.resolve(&target_name, self.lat_deg, self.lon_deg, self.elev_m) {
            Ok(target) => target,
            Err(err) => {
                warn!(%err, target = %target_name, "skipping tracking tick");
                return;
            }
        };

        if !target.visible {
            warn!(target = %target_name, "target has set, stopping tracking");
            self.stop_tracking();
            return;
        }

        let Some((current_alt, current_az)) = self.mirror.get_position() else {
            debug!("no state yet, skipping tracking tick");
            return;
        };

        let error_deg = angular_distance(current_alt, current_az, target.alt_deg, target.az_deg);
        if error_deg < TRACKING_TOLERANCE_DEG {
            return;
        }

        let speed = self.pid.update(error_deg, dt_s);

        if let Err(err) = self
            .channel
            .send_move(target.alt_deg, target.az_deg, speed, 1.0 / TRACKING_LOOP_HZ)
            .await
        {
            warn!(%err, "tracking correction move failed");
        }
    }

    /// Runs `update` at `TRACKING_LOOP_HZ` until `stop_tracking` is
    /// called. Intended to be spawned as a background task.
    pub async fn run(&mut self) {
        let period = Duration::from_secs_f64(1.0 / TRACKING_LOOP_HZ);
        loop {
            tokio::select! {
                _ = self.stop.notified() => break,
                _ = tokio::time::sleep(period) => {
                    if self.target_name.is_none() {
                        continue;
                    }
                    self.update(period.as_secs_f64()).await;
                }
            }
        }
    }
}
