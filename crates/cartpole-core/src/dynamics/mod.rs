//! Dynamics model for the cart-pole system
//!
//! A single inverted pendulum hinged on a motorized cart, integrated
//! with explicit Euler at a fixed timestep.

pub mod cart_pole;

pub use cart_pole::*;
