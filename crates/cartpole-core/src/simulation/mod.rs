//! Simulation framework for the cart-pole system
//!
//! The tick driver that couples the dynamics model to the cascaded
//! controller, plus configuration and the snapshot history consumed by
//! presentation layers.

pub mod config;
pub mod simulator;

pub use config::*;
pub use simulator::*;
