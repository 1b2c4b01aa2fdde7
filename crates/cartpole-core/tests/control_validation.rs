//! Control-loop validation tests
//!
//! End-to-end checks of the coupled dynamics/controller system:
//!
//! 1. Angle wrapping under bounded per-step growth
//! 2. Disabled-controller zeroing
//! 3. Reset idempotence
//! 4. Error-integral accumulation
//! 5. Deterministic replay
//! 6. A one-step numerical scenario from the −20° initial condition
//! 7. Closed-loop convergence with the reference tuning

use approx::assert_relative_eq;
use std::f64::consts::PI;

use cartpole_core::control::{CascadeController, CascadeGains};
use cartpole_core::dynamics::{CartPoleDynamics, CartPoleParams, CartPoleState};
use cartpole_core::simulation::{SimConfig, Simulator};
use cartpole_core::GRAVITY;

mod dynamics_properties {
    use super::*;

    #[test]
    fn test_angle_wrap_single_correction() {
        // Drive the angle across each boundary with one step's worth of
        // angular velocity; the wrapped result must land in (-π, π] and
        // differ from the unwrapped value by exactly 2π.
        let dynamics = CartPoleDynamics::new(CartPoleParams::default());

        for &(start, velocity) in &[
            (PI - 0.001, 0.5),
            (PI - 0.01, 2.0),
            (-PI + 0.001, -0.5),
            (-PI + 0.01, -2.0),
        ] {
            let mut state = CartPoleState::new(start);
            state.angular_velocity = velocity;

            dynamics.advance(&mut state, 0.0);

            assert!(
                state.angle > -PI && state.angle <= PI,
                "angle {} escaped (-π, π]",
                state.angle
            );

            // Recompute the unwrapped angle this step produced.
            let alpha = GRAVITY * start.sin() / 15.0 - 0.1 * velocity;
            let unwrapped = start + (velocity + alpha * 0.03) * 0.03;
            if unwrapped > PI || unwrapped <= -PI {
                assert_relative_eq!(
                    (state.angle - unwrapped).abs(),
                    2.0 * PI,
                    epsilon = 1e-12
                );
            }
        }
    }

    #[test]
    fn test_one_step_scenario_from_minus_twenty_degrees() {
        // Default physics, controller off, a single uncommanded step.
        let dynamics = CartPoleDynamics::new(CartPoleParams::default());
        let mut state = CartPoleState::default();
        let theta0 = state.angle;

        dynamics.advance(&mut state, 0.0);

        assert_relative_eq!(state.angular_acceleration, -0.223681174, epsilon = 1e-6);
        assert_relative_eq!(state.angular_velocity, -0.006710435, epsilon = 1e-6);
        assert_relative_eq!(
            state.angle,
            theta0 + state.angular_velocity * 0.03,
            epsilon = 1e-6
        );
        assert_eq!(state.cart_velocity, 0.0);
        assert_eq!(state.cart_position, 0.0);
    }

    #[test]
    fn test_integral_accumulation_under_constant_error() {
        // With gravity and damping off and the pendulum at rest, the
        // angle never moves and the error stays constant, so the
        // integral grows linearly: n · e · dt.
        let params = CartPoleParams {
            gravity: 0.0,
            angular_damping: 0.0,
            ..CartPoleParams::default()
        };
        let dynamics = CartPoleDynamics::new(params);
        let mut state = CartPoleState::new(0.25);

        let n = 40;
        for _ in 0..n {
            dynamics.advance(&mut state, 0.0);
        }

        let error = 0.0 - 0.25;
        assert_relative_eq!(
            state.angle_error_integral,
            n as f64 * error * 0.03,
            epsilon = 1e-9
        );
    }
}

mod controller_properties {
    use super::*;

    #[test]
    fn test_disabled_controller_zeroes_output() {
        let mut controller = CascadeController::default();

        for &(e, w, ei, ev, evi) in &[
            (0.0, 0.0, 0.0, 0.0, 0.0),
            (1e6, -1e6, 1e9, 42.0, -7.5),
            (f64::MIN_POSITIVE, f64::MAX / 1e10, -1.0, 2.0, 3.0),
        ] {
            let u = controller.compute(e, w, ei, ev, evi);
            assert_eq!(u, 0.0);
            assert_eq!(controller.command_angle(), 0.0);
            assert_eq!(controller.command_cart(), 0.0);
        }
    }

    #[test]
    fn test_previous_command_coupling() {
        // With only kd_cart active, each output is −kd_cart times the
        // previous one: a pure one-tick feedback on the controller's own
        // output.
        let mut controller = CascadeController::new(CascadeGains {
            kp: 0.0,
            kd: 0.0,
            ki: 0.0,
            kp_cart: 0.0,
            kd_cart: 0.5,
            ki_cart: 0.0,
        });
        controller.set_enabled(true);
        controller.nudge(16.0);

        let mut previous = controller.command();
        for _ in 0..6 {
            let u = controller.compute(0.0, 0.0, 0.0, 0.0, 0.0);
            assert_relative_eq!(u, -0.5 * previous, epsilon = 1e-12);
            previous = u;
        }
    }
}

mod simulation_properties {
    use super::*;

    #[test]
    fn test_reset_is_idempotent() {
        let mut sim = Simulator::new(SimConfig::default());
        sim.set_enabled(true);
        for _ in 0..100 {
            sim.step();
        }

        sim.reset();
        let once_state = sim.state().clone();
        let once_snapshot = sim.snapshot();

        sim.reset();

        assert_eq!(*sim.state(), once_state);
        assert_eq!(sim.snapshot(), once_snapshot);
        assert_relative_eq!(sim.state().angle, sim.config.initial_state.angle);
        assert_eq!(sim.state().angular_velocity, 0.0);
        assert_eq!(sim.state().cart_position, 0.0);
        assert_eq!(sim.state().cart_velocity, 0.0);
        assert_eq!(sim.state().angle_error_integral, 0.0);
        assert_eq!(sim.state().cart_velocity_error_integral, 0.0);
        assert_eq!(sim.controller().command(), 0.0);
        assert_eq!(sim.controller().command_angle(), 0.0);
        assert_eq!(sim.controller().command_cart(), 0.0);
    }

    #[test]
    fn test_deterministic_replay() {
        // Two independent runs with identical initial state and input
        // sequence must produce bit-identical trajectories.
        let run = || {
            let mut sim = Simulator::new(SimConfig::default());
            let mut trajectory = Vec::new();
            for frame in 0..500 {
                match frame {
                    50 => sim.set_enabled(true),
                    120 => sim.nudge_right(),
                    200 => sim.gains_mut().kp = 140.0,
                    260 => sim.add_angular_velocity(0.4),
                    330 => sim.set_cart_velocity_reference(1.0),
                    _ => {}
                }
                trajectory.push(sim.step().unwrap());
            }
            trajectory
        };

        let first = run();
        let second = run();

        assert_eq!(first, second);
    }

    #[test]
    fn test_closed_loop_convergence_with_default_gains() {
        // The reference tuning balances the pendulum from −20° and keeps
        // the cart bounded.
        let mut sim = Simulator::new(SimConfig::default());
        sim.set_enabled(true);

        for _ in 0..1000 {
            sim.step();
        }
        assert!(
            sim.state().angle.abs() < 0.01,
            "pendulum not balanced: angle = {}",
            sim.state().angle
        );

        // Stays balanced and bounded over a longer horizon.
        for _ in 0..3000 {
            sim.step();
        }
        assert!(sim.state().angle.abs() < 0.01);
        assert!(sim.state().cart_position.abs() < 20.0);
        assert!(sim.state().cart_velocity.abs() < 1.0);
    }

    #[test]
    fn test_nudge_perturbs_exactly_one_advance() {
        let mut sim = Simulator::new(SimConfig::default());

        // Controller disabled: without the nudge the cart never moves.
        sim.nudge_right();
        sim.step();
        let first = sim.step().unwrap();
        assert_relative_eq!(first.cart_velocity, 50.0 * 0.03, epsilon = 1e-12);

        // From here the command is back to zero; only damping acts.
        let second = sim.step().unwrap();
        assert!(second.cart_velocity < first.cart_velocity);
        assert_eq!(second.command, 0.0);
    }

    #[test]
    fn test_history_keeps_newest_samples() {
        let mut config = SimConfig::default();
        config.max_history_samples = 8;
        let mut sim = Simulator::new(config);

        for _ in 0..20 {
            sim.step();
        }

        let history = sim.history();
        assert_eq!(history.len(), 8);
        let frames: Vec<u64> = history.iter().map(|s| s.frame).collect();
        assert_eq!(frames, (13..=20).collect::<Vec<u64>>());
        assert_relative_eq!(history.duration(), 7.0 * 0.03, epsilon = 1e-9);
    }

    #[test]
    fn test_pause_gate_freezes_time_and_state() {
        let mut sim = Simulator::new(SimConfig::default());
        sim.set_enabled(true);
        for _ in 0..10 {
            sim.step();
        }

        let frozen_state = sim.state().clone();
        let frozen_snapshot = sim.snapshot();
        let frozen_history_len = sim.history().len();

        sim.set_paused(true);
        for _ in 0..25 {
            assert!(sim.step().is_none());
        }

        assert_eq!(*sim.state(), frozen_state);
        assert_eq!(sim.snapshot(), frozen_snapshot);
        assert_eq!(sim.history().len(), frozen_history_len);
        assert_eq!(sim.time(), frozen_snapshot.time);
        assert_eq!(sim.frame(), frozen_snapshot.frame);
    }
}
