//! Cascaded PID controller
//!
//! Two loops share one actuator, the cart acceleration u:
//!
//! u_angle = −kp·eθ + kd·θ̇ − ki·∫eθ
//! u_cart  = kp_cart·ev − kd_cart·u_prev + ki_cart·∫ev
//! u       = u_angle + u_cart
//!
//! where eθ is the angle error, ev the cart velocity error and u_prev the
//! controller's own total output from the previous tick. The cart loop's
//! derivative term deliberately acts on u_prev rather than on a measured
//! cart acceleration, which closes an extra one-tick feedback on the
//! controller output. The command is unbounded: there is no output or
//! integral clamping in this system.

use serde::{Deserialize, Serialize};

/// Gains for both loops of the cascade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CascadeGains {
    /// Angle loop proportional gain
    pub kp: f64,
    /// Angle loop derivative gain (acts on angular velocity)
    pub kd: f64,
    /// Angle loop integral gain
    pub ki: f64,
    /// Cart loop proportional gain (acts on cart velocity error)
    pub kp_cart: f64,
    /// Cart loop derivative gain (acts on the previous total command)
    pub kd_cart: f64,
    /// Cart loop integral gain
    pub ki_cart: f64,
}

impl Default for CascadeGains {
    fn default() -> Self {
        Self {
            kp: 100.0,
            kd: 20.0,
            ki: 1.0,
            kp_cart: 0.2,
            kd_cart: 0.1,
            ki_cart: 0.01,
        }
    }
}

/// Cascaded controller state
///
/// Holds the gains, the enable gate and the last computed commands. Gains
/// may be changed at any time; they apply from the next [`compute`] call,
/// never retroactively.
///
/// [`compute`]: CascadeController::compute
#[derive(Debug, Clone)]
pub struct CascadeController {
    /// Controller gains
    pub gains: CascadeGains,
    enabled: bool,
    command_angle: f64,
    command_cart: f64,
    command: f64,
}

impl CascadeController {
    pub fn new(gains: CascadeGains) -> Self {
        Self {
            gains,
            enabled: false,
            command_angle: 0.0,
            command_cart: 0.0,
            command: 0.0,
        }
    }

    /// Compute the next cart acceleration command from the current error
    /// state, and return it.
    ///
    /// When disabled, both sub-commands are forced to zero. The total is
    /// always recomputed as their sum. Pure in its inputs plus the
    /// internal gain/enable state; no failure paths.
    pub fn compute(
        &mut self,
        angle_error: f64,
        angular_velocity: f64,
        angle_error_integral: f64,
        cart_velocity_error: f64,
        cart_velocity_error_integral: f64,
    ) -> f64 {
        if self.enabled {
            self.command_angle = -self.gains.kp * angle_error
                + self.gains.kd * angular_velocity
                - self.gains.ki * angle_error_integral;
            // kd_cart acts on the previous tick's total command.
            self.command_cart = self.gains.kp_cart * cart_velocity_error
                - self.gains.kd_cart * self.command
                + self.gains.ki_cart * cart_velocity_error_integral;
        } else {
            self.command_angle = 0.0;
            self.command_cart = 0.0;
        }

        self.command = self.command_angle + self.command_cart;
        self.command
    }

    /// Add a transient increment to the command (manual cart thrust).
    ///
    /// Consumed by the next dynamics step and overwritten by the next
    /// [`compute`](CascadeController::compute); not persisted anywhere.
    pub fn nudge(&mut self, delta: f64) {
        self.command += delta;
    }

    /// Zero the command and both sub-commands. Gains and the enable gate
    /// are untouched.
    pub fn reset(&mut self) {
        self.command_angle = 0.0;
        self.command_cart = 0.0;
        self.command = 0.0;
    }

    /// Enable or disable the controller. Takes effect on the very next
    /// [`compute`](CascadeController::compute); no hysteresis.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Total command: the cart acceleration fed to the dynamics
    pub fn command(&self) -> f64 {
        self.command
    }

    /// Angle loop sub-command from the last computation
    pub fn command_angle(&self) -> f64 {
        self.command_angle
    }

    /// Cart loop sub-command from the last computation
    pub fn command_cart(&self) -> f64 {
        self.command_cart
    }
}

impl Default for CascadeController {
    fn default() -> Self {
        Self::new(CascadeGains::default())
    }
}
