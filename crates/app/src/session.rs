//! Per-connection control loops.
//!
//! Each accepted connection runs exactly one session task. Sessions never
//! talk to each other directly; every effect goes through the shared
//! [`Hub`](crate::hub::Hub).

pub mod client;
pub mod device;
