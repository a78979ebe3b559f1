//! Wire envelope: the JSON message exchanged with devices and UI clients.
//!
//! ```json
//! { "type": "state", "id": "esp-1", "state": { "power": true, ... } }
//! ```
//!
//! Optional fields are omitted on output. An unrecognised or missing `type`
//! decodes to [`MessageKind::Unknown`] instead of failing, so sessions can
//! ignore it.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::device_state::DeviceState;
use crate::error::ProtocolError;
use crate::id::DeviceId;

/// Text of the error returned to a UI client whose control targets an
/// unknown device.
pub const DEVICE_NOT_FOUND: &str = "Device not found";

/// Discriminator carried in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Register,
    State,
    Control,
    Log,
    Error,
    #[default]
    #[serde(other)]
    Unknown,
}

impl MessageKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::State => "state",
            Self::Control => "control",
            Self::Log => "log",
            Self::Error => "error",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The wire-level union of everything exchanged over a connection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type", default)]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<DeviceState>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Envelope {
    /// A device announcing itself.
    #[must_use]
    pub fn register(id: &DeviceId) -> Self {
        Self {
            kind: MessageKind::Register,
            id: Some(id.to_string()),
            ..Self::default()
        }
    }

    /// A state report for `id`, identifier forced onto the payload.
    #[must_use]
    pub fn state(id: &DeviceId, state: DeviceState) -> Self {
        Self {
            kind: MessageKind::State,
            id: Some(id.to_string()),
            state: Some(state.with_id(id)),
            message: None,
        }
    }

    /// A control command addressed to `id`, identifier forced onto the payload.
    #[must_use]
    pub fn control(id: &DeviceId, state: DeviceState) -> Self {
        Self {
            kind: MessageKind::Control,
            ..Self::state(id, state)
        }
    }

    /// A hub-originated log line.
    #[must_use]
    pub fn log(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Log,
            message: Some(text.into()),
            ..Self::default()
        }
    }

    /// A hub-originated error reply.
    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Error,
            message: Some(text.into()),
            ..Self::default()
        }
    }

    /// Parse one inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Malformed`] when the text is not a JSON
    /// envelope or a field has the wrong shape.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Malformed)
    }

    /// Serialize into a shareable [`Frame`].
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    pub fn encode(&self) -> Result<Frame, ProtocolError> {
        serde_json::to_string(self)
            .map(Frame::from)
            .map_err(ProtocolError::Encode)
    }

    /// The addressed device, if `id` is present and non-empty.
    #[must_use]
    pub fn device_id(&self) -> Option<DeviceId> {
        self.id.as_deref().and_then(|id| DeviceId::new(id).ok())
    }

    /// Non-empty `message` text.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.message.as_deref().filter(|text| !text.is_empty())
    }

    /// Interpret this envelope as the opening `register` handshake.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::UnexpectedType`] for any other `type`, or
    /// [`ProtocolError::MissingId`] when `id` is absent or empty.
    pub fn into_registration(self) -> Result<DeviceId, ProtocolError> {
        if self.kind != MessageKind::Register {
            return Err(ProtocolError::UnexpectedType {
                expected: MessageKind::Register.as_str(),
                actual: self.kind.to_string(),
            });
        }
        self.device_id().ok_or(ProtocolError::MissingId)
    }
}

/// An immutable, already-serialized text frame.
///
/// Cloning is a reference-count bump, so one encoded envelope can be queued
/// to every recipient of a fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame(Arc<str>);

impl Frame {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for Frame {
    fn from(text: String) -> Self {
        Self(Arc::from(text))
    }
}

impl From<&str> for Frame {
    fn from(text: &str) -> Self {
        Self(Arc::from(text))
    }
}

impl AsRef<str> for Frame {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn esp1() -> DeviceId {
        DeviceId::new("esp-1").unwrap()
    }

    #[test]
    fn should_decode_register_message() {
        let env = Envelope::decode(r#"{"type":"register","id":"esp-1"}"#).unwrap();
        assert_eq!(env.kind, MessageKind::Register);
        assert_eq!(env.into_registration().unwrap(), esp1());
    }

    #[test]
    fn should_decode_unknown_type_without_error() {
        let env = Envelope::decode(r#"{"type":"telemetry","id":"esp-1"}"#).unwrap();
        assert_eq!(env.kind, MessageKind::Unknown);
    }

    #[test]
    fn should_decode_missing_type_as_unknown() {
        let env = Envelope::decode(r#"{"id":"esp-1"}"#).unwrap();
        assert_eq!(env.kind, MessageKind::Unknown);
    }

    #[test]
    fn should_treat_null_state_as_absent() {
        let env = Envelope::decode(r#"{"type":"state","id":"esp-1","state":null}"#).unwrap();
        assert!(env.state.is_none());
    }

    #[test]
    fn should_fail_to_decode_non_json_text() {
        let result = Envelope::decode("hello");
        assert!(matches!(result, Err(ProtocolError::Malformed(_))));
    }

    #[test]
    fn should_reject_registration_with_wrong_type() {
        let env = Envelope::decode(r#"{"type":"state","id":"esp-1"}"#).unwrap();
        assert!(matches!(
            env.into_registration(),
            Err(ProtocolError::UnexpectedType { expected: "register", .. })
        ));
    }

    #[test]
    fn should_reject_registration_with_empty_id() {
        let env = Envelope::decode(r#"{"type":"register","id":""}"#).unwrap();
        assert!(matches!(
            env.into_registration(),
            Err(ProtocolError::MissingId)
        ));
    }

    #[test]
    fn should_encode_error_without_optional_fields() {
        let frame = Envelope::error(DEVICE_NOT_FOUND).encode().unwrap();
        assert_eq!(
            frame.as_str(),
            r#"{"type":"error","message":"Device not found"}"#
        );
    }

    #[test]
    fn should_encode_log_without_id() {
        let frame = Envelope::log("device connected: esp-1").encode().unwrap();
        let json: serde_json::Value = serde_json::from_str(frame.as_str()).unwrap();
        assert_eq!(json["type"], "log");
        assert_eq!(json["message"], "device connected: esp-1");
        assert!(json.get("id").is_none());
        assert!(json.get("state").is_none());
    }

    #[test]
    fn should_force_identifier_in_state_envelope() {
        let state = DeviceState {
            id: "other".to_string(),
            power: true,
            ..DeviceState::default()
        };
        let env = Envelope::state(&esp1(), state);
        assert_eq!(env.id.as_deref(), Some("esp-1"));
        assert_eq!(env.state.unwrap().id, "esp-1");
    }

    #[test]
    fn should_build_control_envelope_with_control_kind() {
        let env = Envelope::control(&esp1(), DeviceState::default());
        assert_eq!(env.kind, MessageKind::Control);
        assert_eq!(env.device_id(), Some(esp1()));
    }

    #[test]
    fn should_ignore_empty_message_text() {
        let env = Envelope::decode(r#"{"type":"log","message":""}"#).unwrap();
        assert!(env.text().is_none());
    }
}
