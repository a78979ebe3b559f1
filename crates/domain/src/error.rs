//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`RelayError`]
//! via `#[from]`.

/// Top-level domain error.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("protocol error")]
    Protocol(#[from] ProtocolError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),
}

/// A value violates a domain invariant.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("device id must not be empty")]
    EmptyDeviceId,
}

/// An inbound frame does not follow the envelope protocol.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// The frame is not a JSON envelope.
    #[error("malformed envelope")]
    Malformed(#[source] serde_json::Error),

    /// The envelope has a different `type` than the protocol step expects.
    #[error("expected a `{expected}` message, got `{actual}`")]
    UnexpectedType {
        expected: &'static str,
        actual: String,
    },

    /// The envelope has no (or an empty) `id`.
    #[error("message has no device id")]
    MissingId,

    /// An outgoing envelope could not be serialized.
    #[error("failed to encode envelope")]
    Encode(#[source] serde_json::Error),
}

/// A lookup did not match anything.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}
