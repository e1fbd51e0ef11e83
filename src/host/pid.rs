//! Textbook PID controller used by the tracking loop to turn an
//! angular error into a normalized speed command (SPEC_FULL §4.8
//! supplement). Grounded in the original source's
//! `host/control/pid_controller.py`.

use crate::config::{PID_KD, PID_KI, PID_KP, TRACKING_SPEED_MAX, TRACKING_SPEED_MIN};

pub struct Pid {
    kp: f64,
    ki: f64,
    kd: f64,
    output_min: f64,
    output_max: f64,
    integral: f64,
    previous_error: Option<f64>,
}

impl Pid {
    pub fn new() -> Self {
        Self {
            kp: PID_KP,
            ki: PID_KI,
            kd: PID_KD,
            output_min: TRACKING_SPEED_MIN,
            output_max: TRACKING_SPEED_MAX,
            integral: 0.0,
            previous_error: None,
        }
    }

    /// Computes the next control output for `error` (degrees) over a
    /// `dt`-second step. The first call after construction or `reset`
    /// has no prior error to derive against, so the derivative term is
    /// zero for that call only.
    pub fn update(&mut self, error: f64, dt: f64) -> f64 {
        self.integral += error * dt;
        let derivative = match self.previous_error {
            Some(previous) if dt > 0.0 => (error - previous) / dt,
            _ => 0.0,
        };
        self.previous_error = Some(error);

        let output = self.kp * error + self.ki * self.integral + self.kd * derivative;
        output.clamp(self.output_min, self.output_max)
    }

    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = None;
    }
}

impl Default for Pid {
    fn default() -> Self {
        Self::new()
    }
}
