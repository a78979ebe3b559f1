//! Device state: the actuation/sensing snapshot of one device.

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;

/// Last-known values of a single device.
///
/// Every field defaults when absent so partial payloads (the UI only sends
/// what it controls) still decode. `id` is informational on the wire: the
/// hub always replaces it with the registry key before storing or relaying.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceState {
    pub id: String,
    pub power: bool,
    /// RGB components.
    pub color: [u8; 3],
    pub brightness: u8,
    pub auto_brightness: bool,
    /// Signed step counts of the three positioning axes.
    pub position: [i32; 3],
    pub auto_position: bool,
    /// Sensor reading reported by the device, independent of control state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

impl DeviceState {
    /// Return this state with its identifier forced to `id`.
    #[must_use]
    pub fn with_id(mut self, id: &DeviceId) -> Self {
        id.as_str().clone_into(&mut self.id);
        self
    }
}

/// Public view of one device known to the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub id: DeviceId,
    /// Whether a device connection is currently registered under `id`.
    pub connected: bool,
    /// Last cached state, if the device ever reported one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<DeviceState>,
}
