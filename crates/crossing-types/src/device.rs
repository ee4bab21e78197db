//! Local input device descriptors.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Identifier of a physical input device on the local node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub struct InputDeviceId(pub i32);

impl std::fmt::Display for InputDeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of input a device provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum DeviceCapability {
    Keyboard,
    Pointer,
    Touch,
}

/// Describes a local input device known to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct DeviceInfo {
    /// Local device ID.
    pub id: InputDeviceId,
    /// Human-readable name (e.g. "Logitech MX Master 3").
    pub name: String,
    /// What this device can do.
    pub capabilities: Vec<DeviceCapability>,
}
