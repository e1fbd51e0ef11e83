//! Host-side state mirror (spec §4.7). Holds the most recent
//! `TelescopeSnapshot` pushed by the receive task and the wall-clock
//! time it arrived, so the tracking loop and CLI can answer "where is
//! the telescope" without round-tripping a `StatusRequest`. Grounded in
//! the original source's `host/state/telescope_state.py`, which plays
//! the same role on the Python host.

use std::sync::Mutex;
use std::time::Instant;

use crate::state::{StatusCode, TelescopeSnapshot};

struct Mirrored {
    snapshot: TelescopeSnapshot,
    received_at: Instant,
}

#[derive(Default)]
pub struct StateMirror {
    inner: Mutex<Option<Mirrored>>,
}

impl StateMirror {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&self, snapshot: TelescopeSnapshot) {
        *self.inner.lock().unwrap() = Some(Mirrored {
            snapshot,
            received_at: Instant::now(),
        });
    }

    pub fn has_state(&self) -> bool {
        self.inner.lock().unwrap().is_some()
    }

    pub fn get_position(&self) -> Option<(f64, f64)> {
        self.inner
            .lock()
            .unwrap()
            .as_ref()
            .map(|m| (m.snapshot.current_alt_deg, m.snapshot.current_az_deg))
    }

    pub fn get_status(&self) -> Option<StatusCode> {
        self.inner.lock().unwrap().as_ref().map(|m| m.snapshot.status)
    }

    pub fn get_target(&self) -> Option<(Option<f64>, Option<f64>)> {
        self.inner
            .lock()
            .unwrap()
            .as_ref()
            .map(|m| (m.snapshot.target_alt_deg, m.snapshot.target_az_deg))
    }

    pub fn snapshot(&self) -> Option<TelescopeSnapshot> {
        self.inner.lock().unwrap().as_ref().map(|m| m.snapshot.clone())
    }

    /// Seconds since the last `StateReport` arrived, used to detect a
    /// stalled link (spec §4.8 "disconnect detection").
    pub fn seconds_since_update(&self) -> Option<f64> {
        self.inner
            .lock()
            .unwrap()
            .as_ref()
            .map(|m| m.received_at.elapsed().as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn snapshot() -> TelescopeSnapshot {
        TelescopeSnapshot {
            current_alt_deg: 10.0,
            current_az_deg: 20.0,
            status: StatusCode::Idle,
            target_alt_deg: None,
            target_az_deg: None,
            focus_position: Some(0),
            is_tracking: false,
            error_codes: Vec::<ErrorCode>::new(),
            timestamp: 0.0,
        }
    }

    #[test]
    fn starts_empty() {
        let mirror = StateMirror::new();
        assert!(!mirror.has_state());
        assert!(mirror.get_position().is_none());
    }

    #[test]
    fn update_populates_accessors() {
        let mirror = StateMirror::new();
        mirror.update(snapshot());
        assert!(mirror.has_state());
        assert_eq!(mirror.get_position(), Some((10.0, 20.0)));
        assert_eq!(mirror.get_status(), Some(StatusCode::Idle));
        assert!(mirror.seconds_since_update().unwrap() < 1.0);
    }
}
