//! Port definitions: traits that transport adapters implement.
//!
//! Ports are the boundaries between the hub and the outside world. A
//! connection is split in two: the [`Connection`] half may be written from
//! any task (the hub fans out through it), while the [`Inbound`] half is
//! owned and read exclusively by the session loop.

pub mod connection;
pub mod inbound;

pub use connection::{Connection, SendError};
pub use inbound::{Inbound, RecvError};
