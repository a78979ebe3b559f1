//! # relayhub-domain
//!
//! Pure domain model for the relayhub device relay.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers and error conventions
//! - Define **`DeviceState`** (the actuation/sensing snapshot of one device)
//! - Define the **`Envelope`** wire message exchanged with devices and UI
//!   clients, and the pre-serialized **`Frame`** the hub fans out
//! - Contain all invariant enforcement (non-empty device ids, identifier
//!   overwrite, envelope classification)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;

pub mod device_state;
pub mod envelope;
