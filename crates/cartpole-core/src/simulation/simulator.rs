//! Tick driver for the cart-pole simulation
//!
//! Owns the dynamics model, its state, the cascaded controller, the
//! manual-override queue and the snapshot history, and advances the whole
//! system one fixed timestep at a time. Single-threaded by construction:
//! every mutation goes through `&mut self`, so parameter and gain changes
//! are atomic with respect to a tick.
//!
//! Each tick, in order:
//! 1. the dynamics integrate with the command computed on the *previous*
//!    tick (one-tick actuation delay),
//! 2. the controller computes the next command from the fresh errors,
//! 3. queued manual overrides are drained exactly once,
//! 4. the clock and frame counter advance and a snapshot is recorded.
//!
//! While paused, a tick is a no-op: no state change, not even time.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, trace};

use crate::control::{CascadeController, CascadeGains};
use crate::dynamics::{CartPoleDynamics, CartPoleParams, CartPoleState};

use super::SimConfig;

/// Per-tick state snapshot exposed to presentation layers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    /// Cumulative simulation time [s]
    pub time: f64,
    /// Tick counter since start (or last reset)
    pub frame: u64,
    /// Pendulum angle [rad]
    pub angle: f64,
    /// Pendulum angular velocity [rad/s]
    pub angular_velocity: f64,
    /// Cart position
    pub cart_position: f64,
    /// Cart velocity
    pub cart_velocity: f64,
    /// Total commanded cart acceleration
    pub command: f64,
    /// Angle loop sub-command
    pub command_angle: f64,
    /// Cart loop sub-command
    pub command_cart: f64,
    /// Running integral of the angle error
    pub angle_error_integral: f64,
    /// Running integral of the cart velocity error
    pub cart_velocity_error_integral: f64,
}

/// Rolling history of snapshots, oldest-first
///
/// Bounded: beyond `max_samples` the oldest snapshot is dropped, keeping
/// strip-chart consumers at a fixed memory footprint.
#[derive(Debug, Clone)]
pub struct SimHistory {
    samples: VecDeque<StateSnapshot>,
    max_samples: usize,
}

impl SimHistory {
    pub fn new(max_samples: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(max_samples),
            max_samples,
        }
    }

    /// Record a snapshot, dropping the oldest if the buffer is full
    pub fn record(&mut self, snapshot: StateSnapshot) {
        if self.samples.len() == self.max_samples {
            self.samples.pop_front();
        }
        self.samples.push_back(snapshot);
    }

    /// Number of recorded snapshots
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Check if the history is empty
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Most recent snapshot
    pub fn latest(&self) -> Option<&StateSnapshot> {
        self.samples.back()
    }

    /// Time span covered by the recorded snapshots
    pub fn duration(&self) -> f64 {
        match (self.samples.front(), self.samples.back()) {
            (Some(first), Some(last)) => last.time - first.time,
            _ => 0.0,
        }
    }

    /// Iterate snapshots oldest-first
    pub fn iter(&self) -> impl Iterator<Item = &StateSnapshot> {
        self.samples.iter()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

/// Manual override, queued from an input surface and consumed exactly
/// once on the next tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ManualOverride {
    /// Add the configured nudge increment to the command
    NudgeRight,
    /// Subtract the configured nudge increment from the command
    NudgeLeft,
    /// Add an increment to the pendulum angular velocity [rad/s]
    AddAngularVelocity(f64),
    /// Set the pendulum angle directly [rad]
    SetAngle(f64),
}

/// The simulation tick driver
pub struct Simulator {
    /// Configuration the simulator was built from
    pub config: SimConfig,
    dynamics: CartPoleDynamics,
    state: CartPoleState,
    controller: CascadeController,
    time: f64,
    frame: u64,
    paused: bool,
    pending: Vec<ManualOverride>,
    history: SimHistory,
}

impl Simulator {
    /// Create a simulator from a configuration. The controller starts
    /// disabled.
    pub fn new(config: SimConfig) -> Self {
        let dynamics = CartPoleDynamics::new(config.to_params());
        let state = CartPoleState::new(config.initial_state.angle);
        let controller = CascadeController::new(config.gains.clone());
        let history = SimHistory::new(config.max_history_samples);

        Self {
            config,
            dynamics,
            state,
            controller,
            time: 0.0,
            frame: 0,
            paused: false,
            pending: Vec::new(),
            history,
        }
    }

    /// Advance the system by one tick.
    ///
    /// Returns the recorded snapshot, or `None` when paused (in which
    /// case nothing, including time, has changed).
    pub fn step(&mut self) -> Option<StateSnapshot> {
        if self.paused {
            return None;
        }

        // Integrate with the previous tick's command.
        let command = self.controller.command();
        self.dynamics.advance(&mut self.state, command);

        self.controller.compute(
            self.state.angle_error,
            self.state.angular_velocity,
            self.state.angle_error_integral,
            self.state.cart_velocity_error,
            self.state.cart_velocity_error_integral,
        );

        // Drain manual overrides, in arrival order.
        for action in std::mem::take(&mut self.pending) {
            trace!(?action, "applying manual override");
            match action {
                ManualOverride::NudgeRight => self.controller.nudge(self.config.nudge_increment),
                ManualOverride::NudgeLeft => self.controller.nudge(-self.config.nudge_increment),
                ManualOverride::AddAngularVelocity(delta) => {
                    self.state.add_angular_velocity(delta)
                }
                ManualOverride::SetAngle(angle) => self.state.set_angle(angle),
            }
        }

        self.time += self.dynamics.params.timestep;
        self.frame += 1;

        let snapshot = self.snapshot();
        self.history.record(snapshot);
        trace!(
            time = self.time,
            angle = self.state.angle,
            command = self.controller.command(),
            "tick"
        );

        Some(snapshot)
    }

    /// Step until the configured duration is reached (no-op when paused)
    pub fn run(&mut self) -> &SimHistory {
        while self.time < self.config.duration {
            if self.step().is_none() {
                break;
            }
        }
        &self.history
    }

    /// Return to the initial condition.
    ///
    /// Restores the pendulum angle, zeroes positions, velocities, error
    /// integrals and all controller outputs, rewinds the frame counter
    /// and clears the history and any queued overrides. Gains, physical
    /// parameters, references, the enable gate and the cumulative clock
    /// survive. Idempotent.
    pub fn reset(&mut self) {
        debug!("resetting simulation");
        self.state.reset(self.dynamics.params.initial_angle);
        self.controller.reset();
        self.frame = 0;
        self.pending.clear();
        self.history.clear();
    }

    /// Snapshot of the current state without stepping
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            time: self.time,
            frame: self.frame,
            angle: self.state.angle,
            angular_velocity: self.state.angular_velocity,
            cart_position: self.state.cart_position,
            cart_velocity: self.state.cart_velocity,
            command: self.controller.command(),
            command_angle: self.controller.command_angle(),
            command_cart: self.controller.command_cart(),
            angle_error_integral: self.state.angle_error_integral,
            cart_velocity_error_integral: self.state.cart_velocity_error_integral,
        }
    }

    /// Queue a manual override for the next tick
    pub fn queue_override(&mut self, action: ManualOverride) {
        debug!(?action, "queueing manual override");
        self.pending.push(action);
    }

    /// Queue a positive manual cart thrust
    pub fn nudge_right(&mut self) {
        self.queue_override(ManualOverride::NudgeRight);
    }

    /// Queue a negative manual cart thrust
    pub fn nudge_left(&mut self) {
        self.queue_override(ManualOverride::NudgeLeft);
    }

    /// Queue an angular velocity increment [rad/s]
    pub fn add_angular_velocity(&mut self, delta: f64) {
        self.queue_override(ManualOverride::AddAngularVelocity(delta));
    }

    /// Queue a direct angle override [rad]
    pub fn set_angle(&mut self, angle: f64) {
        self.queue_override(ManualOverride::SetAngle(angle));
    }

    /// Enable or disable the controller
    pub fn set_enabled(&mut self, enabled: bool) {
        debug!(enabled, "controller enable toggled");
        self.controller.set_enabled(enabled);
    }

    /// Pause or resume the tick gate
    pub fn set_paused(&mut self, paused: bool) {
        debug!(paused, "pause toggled");
        self.paused = paused;
    }

    pub fn toggle_pause(&mut self) {
        self.set_paused(!self.paused);
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Target angle for the angle loop [rad]
    pub fn set_angle_reference(&mut self, reference: f64) {
        self.dynamics.params.angle_reference = reference;
    }

    /// Target velocity for the cart loop
    pub fn set_cart_velocity_reference(&mut self, reference: f64) {
        self.dynamics.params.cart_velocity_reference = reference;
    }

    /// Controller gains, individually tunable at any time
    pub fn gains_mut(&mut self) -> &mut CascadeGains {
        &mut self.controller.gains
    }

    pub fn set_gains(&mut self, gains: CascadeGains) {
        self.controller.gains = gains;
    }

    /// Physical parameters, tunable at any time (timestep, gravity,
    /// length, dampings, initial angle, references)
    pub fn params_mut(&mut self) -> &mut CartPoleParams {
        &mut self.dynamics.params
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn state(&self) -> &CartPoleState {
        &self.state
    }

    pub fn controller(&self) -> &CascadeController {
        &self.controller
    }

    pub fn dynamics(&self) -> &CartPoleDynamics {
        &self.dynamics
    }

    pub fn history(&self) -> &SimHistory {
        &self.history
    }
}
