//! Closed-loop stabilization demo
//!
//! Runs the cart-pole from the −20° initial condition with the cascaded
//! controller enabled and prints the trajectory once per simulated
//! second. Set RUST_LOG=debug (or trace) for the tick-level events.

use cartpole_core::simulation::{SimConfig, Simulator};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut config = SimConfig::default();
    config.duration = 30.0;
    let ticks_per_second = (1.0 / config.dt).round() as u64;

    println!("=== Cart-Pole Stabilization ===\n");
    println!(
        "dt = {} s, gains: kp={} kd={} ki={} / kp_cart={} kd_cart={} ki_cart={}\n",
        config.dt,
        config.gains.kp,
        config.gains.kd,
        config.gains.ki,
        config.gains.kp_cart,
        config.gains.kd_cart,
        config.gains.ki_cart,
    );

    let mut sim = Simulator::new(config);
    sim.set_enabled(true);

    println!("{:>6}  {:>10}  {:>10}  {:>10}  {:>10}", "t [s]", "angle [°]", "x", "xdot", "u");
    while let Some(snapshot) = sim.step() {
        if snapshot.frame % ticks_per_second == 0 {
            println!(
                "{:>6.1}  {:>10.4}  {:>10.4}  {:>10.4}  {:>10.4}",
                snapshot.time,
                snapshot.angle.to_degrees(),
                snapshot.cart_position,
                snapshot.cart_velocity,
                snapshot.command,
            );
        }
        if sim.time() >= sim.config.duration {
            break;
        }
    }

    let final_state = sim.state();
    println!(
        "\nFinal angle: {:.4}° after {} ticks ({}within ±1° of upright)",
        final_state.angle.to_degrees(),
        sim.frame(),
        if final_state.angle.to_degrees().abs() < 1.0 { "" } else { "NOT " },
    );
}
