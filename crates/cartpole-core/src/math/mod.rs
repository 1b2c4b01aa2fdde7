//! Mathematical utilities for the cart-pole simulation
//!
//! Angle normalization helpers. Degree/radian conversion uses
//! `f64::to_radians` / `f64::to_degrees` from std directly.

pub mod angle;

pub use angle::*;
