//! Cart-pole dynamics
//!
//! Pendulum on a motorized cart, driven by a commanded cart acceleration u:
//!
//! θ̈ = g·sin(θ)/l − u·cos(θ)/l − cθ·θ̇
//! ẍ = u − cx·ẋ
//!
//! where:
//! - θ: pendulum angle relative to vertically upright, kept in (-π, π]
//! - x: cart position
//! - l: pendulum length
//! - cθ, cx: angular and cart damping coefficients
//!
//! The state also tracks the reference errors of θ and ẋ together with
//! their running time-integrals, which feed the integral terms of the
//! cascaded controller. The command u is unconstrained: no saturation is
//! applied anywhere, so aggressive gains can legitimately diverge.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

use crate::math::wrap_to_pi;
use crate::GRAVITY;

/// Default initial pendulum angle [rad] (−20° from upright)
pub const DEFAULT_INITIAL_ANGLE: f64 = -20.0 * std::f64::consts::PI / 180.0;

/// Cart-pole state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartPoleState {
    /// Pendulum angle [rad], relative to vertically upright, in (-π, π]
    pub angle: f64,
    /// Pendulum angular velocity [rad/s]
    pub angular_velocity: f64,
    /// Pendulum angular acceleration [rad/s²]
    pub angular_acceleration: f64,
    /// Cart position
    pub cart_position: f64,
    /// Cart velocity
    pub cart_velocity: f64,
    /// Angle tracking error (reference − angle), from the last step
    pub angle_error: f64,
    /// Running time-integral of the angle error
    pub angle_error_integral: f64,
    /// Cart velocity tracking error (reference − velocity), from the last step
    pub cart_velocity_error: f64,
    /// Running time-integral of the cart velocity error
    pub cart_velocity_error_integral: f64,
}

impl Default for CartPoleState {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_ANGLE)
    }
}

impl CartPoleState {
    /// Create a state at rest with the given pendulum angle
    pub fn new(initial_angle: f64) -> Self {
        Self {
            angle: initial_angle,
            angular_velocity: 0.0,
            angular_acceleration: 0.0,
            cart_position: 0.0,
            cart_velocity: 0.0,
            angle_error: 0.0,
            angle_error_integral: 0.0,
            cart_velocity_error: 0.0,
            cart_velocity_error_integral: 0.0,
        }
    }

    /// Add an instantaneous increment to the angular velocity.
    ///
    /// Manual override: takes effect immediately, bypassing the
    /// integrator. Any finite value is accepted.
    pub fn add_angular_velocity(&mut self, delta: f64) {
        self.angular_velocity += delta;
    }

    /// Set the pendulum angle directly [rad].
    ///
    /// Manual override: takes effect immediately, bypassing the
    /// integrator. Any finite value is accepted.
    pub fn set_angle(&mut self, angle: f64) {
        self.angle = angle;
    }

    /// Return to the initial condition.
    ///
    /// Zeroes positions, velocities and both error integrals and restores
    /// the angle. The instantaneous error fields and the angular
    /// acceleration are left as-is; the next step recomputes them.
    pub fn reset(&mut self, initial_angle: f64) {
        self.angle = initial_angle;
        self.angular_velocity = 0.0;
        self.cart_position = 0.0;
        self.cart_velocity = 0.0;
        self.angle_error_integral = 0.0;
        self.cart_velocity_error_integral = 0.0;
    }
}

/// Cart-pole physical parameters
///
/// Mutable at runtime and never touched by a reset, including the two
/// reference targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartPoleParams {
    /// Fixed integration timestep [s]
    pub timestep: f64,
    /// Gravitational acceleration [m/s²]
    pub gravity: f64,
    /// Pendulum length
    pub pendulum_length: f64,
    /// Damping coefficient on the angular velocity
    pub angular_damping: f64,
    /// Damping coefficient on the cart velocity
    pub cart_damping: f64,
    /// Angle restored by a reset [rad]
    pub initial_angle: f64,
    /// Target angle for the angle loop [rad]
    pub angle_reference: f64,
    /// Target cart velocity for the cart loop
    pub cart_velocity_reference: f64,
}

impl Default for CartPoleParams {
    fn default() -> Self {
        Self {
            timestep: 0.03,
            gravity: GRAVITY,
            pendulum_length: 15.0,
            angular_damping: 0.1,
            cart_damping: 0.5,
            initial_angle: DEFAULT_INITIAL_ANGLE,
            angle_reference: 0.0,
            cart_velocity_reference: 0.0,
        }
    }
}

/// Cart-pole dynamics model
#[derive(Debug, Clone, Default)]
pub struct CartPoleDynamics {
    pub params: CartPoleParams,
}

impl CartPoleDynamics {
    pub fn new(params: CartPoleParams) -> Self {
        Self { params }
    }

    /// Advance the state by one timestep under the commanded cart
    /// acceleration.
    ///
    /// The tracking errors are computed from the pre-update state, then
    /// everything is integrated with explicit Euler. The angle update
    /// consumes the just-updated angular velocity and the cart position
    /// the just-updated cart velocity; keep this order.
    pub fn advance(&self, state: &mut CartPoleState, command: f64) {
        let p = &self.params;

        state.angular_acceleration = p.gravity * state.angle.sin() / p.pendulum_length
            - command * state.angle.cos() / p.pendulum_length
            - p.angular_damping * state.angular_velocity;

        state.angle_error = p.angle_reference - state.angle;
        state.cart_velocity_error = p.cart_velocity_reference - state.cart_velocity;

        // Euler integration
        state.angle_error_integral += state.angle_error * p.timestep;
        state.cart_velocity_error_integral += state.cart_velocity_error * p.timestep;
        state.angular_velocity += state.angular_acceleration * p.timestep;
        state.angle += state.angular_velocity * p.timestep;
        state.cart_velocity += (command - p.cart_damping * state.cart_velocity) * p.timestep;
        state.cart_position += state.cart_velocity * p.timestep;

        state.angle = wrap_to_pi(state.angle);
    }

    /// Cartesian position of the pendulum bob for an arbitrary angle,
    /// relative to the current cart position. Pure; used for rendering.
    pub fn bob_position(&self, state: &CartPoleState, angle: f64) -> Vector2<f64> {
        Vector2::new(
            state.cart_position + self.params.pendulum_length * angle.sin(),
            self.params.pendulum_length * angle.cos(),
        )
    }
}
