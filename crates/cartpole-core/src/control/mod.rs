//! Controllers for the cart-pole system
//!
//! A cascaded pair of PID loops: one keeps the pendulum upright, the
//! other bleeds off cart velocity. Their outputs sum into a single cart
//! acceleration command.

pub mod cascade;

pub use cascade::*;
