//! Typed identifiers.
//!
//! [`DeviceId`] is chosen by the device itself and is stable per physical
//! device. [`ConnectionId`] is generated by the hub for every accepted
//! connection and is only used for identity comparisons.

use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identifier a device registers under. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Validate and wrap a device identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyDeviceId`] when `id` is empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::EmptyDeviceId);
        }
        Ok(Self(id))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for DeviceId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}

impl FromStr for DeviceId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Borrow<str> for DeviceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for one accepted connection, backed by a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(uuid::Uuid);

impl Default for ConnectionId {
    fn default() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl ConnectionId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the inner UUID.
    #[must_use]
    pub fn as_uuid(self) -> uuid::Uuid {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_empty_device_id() {
        assert_eq!(DeviceId::new(""), Err(ValidationError::EmptyDeviceId));
    }

    #[test]
    fn should_accept_non_empty_device_id() {
        let id = DeviceId::new("esp32-s3-device").unwrap();
        assert_eq!(id.as_str(), "esp32-s3-device");
        assert_eq!(id.to_string(), "esp32-s3-device");
    }

    #[test]
    fn should_serialize_device_id_as_plain_string() {
        let id = DeviceId::new("esp-1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"esp-1\"");
    }

    #[test]
    fn should_fail_to_deserialize_empty_device_id() {
        let result: Result<DeviceId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn should_generate_unique_connection_ids_when_called_twice() {
        assert_ne!(ConnectionId::new(), ConnectionId::new());
    }
}
