//! Controller-side state management (spec §4.5, §3).

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    Idle,
    Moving,
    Focusing,
    EmergencyStop,
    Error,
    Ok,
    Busy,
}

/// Authoritative controller state, serialized to the host (spec §3).
///
/// Invariant: `status == Moving` implies both target fields are
/// `Some`. `status == EmergencyStop` implies
/// `error_codes` contains [`ErrorCode::SafetyEmergencyStop`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelescopeSnapshot {
    pub current_alt_deg: f64,
    pub current_az_deg: f64,
    pub status: StatusCode,
    pub target_alt_deg: Option<f64>,
    pub target_az_deg: Option<f64>,
    pub focus_position: Option<i32>,
    pub is_tracking: bool,
    pub error_codes: Vec<ErrorCode>,
    pub timestamp: f64,
}

impl TelescopeSnapshot {
    fn debug_check_invariants(&self) {
        debug_assert!(
            self.status != StatusCode::Moving
                || (self.target_alt_deg.is_some() && self.target_az_deg.is_some()),
            "status=Moving without a published target"
        );
        debug_assert!(
            self.status != StatusCode::EmergencyStop
                || self.error_codes.contains(&ErrorCode::SafetyEmergencyStop),
            "status=EmergencyStop without SAFETY_EMERGENCY_STOP in error_codes"
        );
    }
}

/// `ErrorCode -> detail string` map with append-only history (spec §3).
/// The *active* set (what serializes into a snapshot) is the currently
/// present keys; clearing an entry removes it from the active set but
/// not from `history`.
#[derive(Debug, Default)]
pub struct ErrorState {
    active: BTreeMap<ErrorCode, String>,
    history: Vec<(ErrorCode, String, f64)>,
}

impl ErrorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, code: ErrorCode, detail: impl Into<String>, timestamp: f64) {
        let detail = detail.into();
        self.history.push((code, detail.clone(), timestamp));
        self.active.insert(code, detail);
    }

    /// Clears `code` when its precondition is known to hold again.
    pub fn clear(&mut self, code: ErrorCode) {
        self.active.remove(&code);
    }

    pub fn is_active(&self, code: ErrorCode) -> bool {
        self.active.contains_key(&code)
    }

    pub fn active_codes(&self) -> Vec<ErrorCode> {
        self.active.keys().copied().collect()
    }

    pub fn history(&self) -> &[(ErrorCode, String, f64)] {
        &self.history
    }
}

/// Single serialized store for controller state (spec §4.5). All
/// mutations go through the setters below; [`StateManager::snapshot`]
/// is the single atomic read that copies every field under one lock.
pub struct StateManager {
    inner: Mutex<Inner>,
}

struct Inner {
    current_alt_deg: f64,
    current_az_deg: f64,
    status: StatusCode,
    target_alt_deg: Option<f64>,
    target_az_deg: Option<f64>,
    focus_position: i32,
    is_tracking: bool,
    errors: ErrorState,
}

impl StateManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                current_alt_deg: 0.0,
                current_az_deg: 0.0,
                status: StatusCode::Idle,
                target_alt_deg: None,
                target_az_deg: None,
                // Open Question (b): focus counter starts at 0, not
                // "unset" — see SPEC_FULL.md §9.
                focus_position: 0,
                is_tracking: false,
                errors: ErrorState::new(),
            }),
        }
    }

    pub fn set_position(&self, alt_deg: f64, az_deg: f64) {
        let mut inner = self.inner.lock().unwrap();
        inner.current_alt_deg = alt_deg;
        inner.current_az_deg = az_deg;
    }

    pub fn set_status(&self, status: StatusCode) {
        self.inner.lock().unwrap().status = status;
    }

    pub fn set_target(&self, alt_deg: Option<f64>, az_deg: Option<f64>) {
        let mut inner = self.inner.lock().unwrap();
        inner.target_alt_deg = alt_deg;
        inner.target_az_deg = az_deg;
    }

    pub fn set_focus_position(&self, position: i32) {
        self.inner.lock().unwrap().focus_position = position;
    }

    pub fn focus_position(&self) -> i32 {
        self.inner.lock().unwrap().focus_position
    }

    pub fn position(&self) -> (f64, f64) {
        let inner = self.inner.lock().unwrap();
        (inner.current_alt_deg, inner.current_az_deg)
    }

    pub fn status(&self) -> StatusCode {
        self.inner.lock().unwrap().status
    }

    pub fn set_tracking(&self, tracking: bool) {
        self.inner.lock().unwrap().is_tracking = tracking;
    }

    pub fn record_error(&self, code: ErrorCode, detail: impl Into<String>) {
        let mut inner = self.inner.lock().unwrap();
        let ts = now_seconds();
        inner.errors.set(code, detail, ts);
    }

    pub fn clear_error(&self, code: ErrorCode) {
        self.inner.lock().unwrap().errors.clear(code);
    }

    pub fn is_error_active(&self, code: ErrorCode) -> bool {
        self.inner.lock().unwrap().errors.is_active(code)
    }

    /// Single atomic read: copies every field under one critical
    /// section (spec §4.5).
    pub fn snapshot(&self) -> TelescopeSnapshot {
        let inner = self.inner.lock().unwrap();
        let snapshot = TelescopeSnapshot {
            current_alt_deg: inner.current_alt_deg,
            current_az_deg: inner.current_az_deg,
            status: inner.status,
            target_alt_deg: inner.target_alt_deg,
            target_az_deg: inner.target_az_deg,
            focus_position: Some(inner.focus_position),
            is_tracking: inner.is_tracking,
            error_codes: inner.errors.active_codes(),
            timestamp: now_seconds(),
        };
        snapshot.debug_check_invariants();
        snapshot
    }
}

impl Default for StateManager {
    fn default() -> Self {
        Self::new()
    }
}

pub fn now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
