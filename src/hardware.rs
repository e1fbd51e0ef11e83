//! Hardware abstraction the motion executor drives (SPEC_FULL §4.12).
//!
//! Grounded in the original source's `pi/hardware/motor_driver.py`
//! (`MotorDriver` ABC + `StepperMotorDriver` + `MockMotorDriver`) and
//! `pi/hardware/gpio_setup.py` (`GPIOProvider` ABC +
//! `MockGPIOProvider`). The spec treats the physical GPIO layer as an
//! external collaborator behind a fixed interface; this module is that
//! interface plus the mock implementation the tests and `--mock-mode`
//! use. No GPIO crate is fabricated — a real `StepperMotorDriver` would
//! bind to whatever `GpioProvider` the embedder supplies.
//!
//! Methods take `&self`, not `&mut self`: the safety supervisor's
//! per-tick limit-switch poll and the motion executor's stepping both
//! need to reach the same motor while a move is in flight on its own
//! thread (spec §5, §8 scenario 5), so each driver owns its mutable
//! state behind its own synchronization rather than requiring a single
//! exclusive borrow.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// One physical axis (altitude, azimuth, or focus).
pub trait MotorDriver: Send + Sync {
    /// Pulses the step line once in `dir`, blocking for the pulse
    /// width implied by `rate_hz` (high for `1/(2*rate_hz)`s, low for
    /// the same — spec §4.3).
    fn step(&self, dir: Direction, rate_hz: f64);

    fn enable(&self, enabled: bool);

    /// True when the axis's limit switch is asserted.
    fn limit_asserted(&self) -> bool;
}

/// Software-simulated axis. Moves a floating-point position by a fixed
/// increment per step and never asserts its limit switch unless told
/// to, matching `MockGPIOProvider`'s pin-map-in-memory approach.
pub struct MockMotorDriver {
    position: Mutex<f64>,
    degrees_per_step: f64,
    enabled: AtomicBool,
    limit_switch: AtomicBool,
}

impl MockMotorDriver {
    pub fn new(degrees_per_step: f64) -> Self {
        Self {
            position: Mutex::new(0.0),
            degrees_per_step,
            enabled: AtomicBool::new(true),
            limit_switch: AtomicBool::new(false),
        }
    }

    pub fn position(&self) -> f64 {
        *self.position.lock().unwrap()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Test hook: flips the simulated limit switch.
    pub fn set_limit_switch(&self, asserted: bool) {
        self.limit_switch.store(asserted, Ordering::SeqCst);
    }
}

impl MotorDriver for MockMotorDriver {
    fn step(&self, dir: Direction, rate_hz: f64) {
        let rate_hz = rate_hz.max(1.0);
        let half_period = Duration::from_secs_f64(1.0 / (2.0 * rate_hz));
        std::thread::sleep(half_period);
        std::thread::sleep(half_period);
        let mut position = self.position.lock().unwrap();
        match dir {
            Direction::Forward => *position += self.degrees_per_step,
            Direction::Backward => *position -= self.degrees_per_step,
        }
    }

    fn enable(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    fn limit_asserted(&self) -> bool {
        self.limit_switch.load(Ordering::SeqCst)
    }
}

/// Abstract pin I/O interface (spec §1 "physical GPIO layer ... treated
/// as an abstract pin I/O interface"). A production `StepperMotorDriver`
/// would hold one of these per axis; no concrete hardware-backed
/// implementation ships here since no GPIO crate appears in the
/// dependency pack.
pub trait GpioProvider: Send {
    fn write(&mut self, pin: u8, high: bool);
    fn read(&self, pin: u8) -> bool;
}

/// In-memory `GpioProvider` for tests, grounded in
/// `pi/hardware/gpio_setup.py::MockGPIOProvider`.
#[derive(Debug, Default)]
pub struct MockGpioProvider {
    pins: std::collections::HashMap<u8, bool>,
}

impl GpioProvider for MockGpioProvider {
    fn write(&mut self, pin: u8, high: bool) {
        self.pins.insert(pin, high);
    }

    fn read(&self, pin: u8) -> bool {
        *self.pins.get(&pin).unwrap_or(&false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_motor_advances_position_on_step() {
        let motor = MockMotorDriver::new(1.0 / 177.78);
        let before = motor.position();
        motor.step(Direction::Forward, 800.0);
        assert!(motor.position() > before);
    }

    #[test]
    fn mock_motor_reverses_on_backward_step() {
        let motor = MockMotorDriver::new(1.0 / 177.78);
        motor.step(Direction::Forward, 800.0);
        let after_forward = motor.position();
        motor.step(Direction::Backward, 800.0);
        assert!(motor.position() < after_forward);
    }

    #[test]
    fn mock_gpio_round_trips_pin_state() {
        let mut gpio = MockGpioProvider::default();
        assert!(!gpio.read(3));
        gpio.write(3, true);
        assert!(gpio.read(3));
    }
}
