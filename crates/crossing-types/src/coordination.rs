//! Coordination lifecycle types.
//!
//! The local node moves through a small state machine while keyboard-mouse
//! input is crossed to a remote node; transitions are announced to listeners
//! as [`CoordinationNotice`] values.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::device::InputDeviceId;

/// Stable descriptor of a remote node on the local network.
///
/// Assigned by whatever names nodes on the wire; the coordinator only
/// requires it to be non-empty and stable for the lifetime of a link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub struct NetworkId(String);

impl NetworkId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for NetworkId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for NetworkId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for NetworkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the local node stands in the crossing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum CoordinationState {
    /// No crossing prepared; the resting state.
    Idle,
    /// Ready to activate a crossing to a remote node.
    Prepared,
    /// Activation request in flight, waiting for the remote acknowledgment.
    Activating,
    /// Input is crossed to the active target.
    Active,
    /// Deactivation request in flight.
    Deactivating,
}

impl CoordinationState {
    /// Whether `prepare` is legal from this state.
    pub fn can_prepare(self) -> bool {
        self == Self::Idle
    }

    /// Whether `activate` is legal from this state.
    pub fn can_activate(self) -> bool {
        self == Self::Prepared
    }

    /// Whether `deactivate` is legal from this state.
    pub fn can_deactivate(self) -> bool {
        self == Self::Active
    }

    /// Whether an adapter round-trip is outstanding.
    pub fn is_pending(self) -> bool {
        matches!(self, Self::Activating | Self::Deactivating)
    }
}

impl std::fmt::Display for CoordinationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Prepared => write!(f, "Prepared"),
            Self::Activating => write!(f, "Activating"),
            Self::Active => write!(f, "Active"),
            Self::Deactivating => write!(f, "Deactivating"),
        }
    }
}

/// Message emitted on a coordination state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum CoordinationMsg {
    Prepare,
    Unprepare,
    Activate,
    ActivateSuccess,
    ActivateFail,
    DeactivateSuccess,
    DeactivateFail,
}

/// Remote node plus the local input device being crossed to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct CoordinationTarget {
    /// Which remote node receives the crossed input.
    pub network_id: NetworkId,
    /// Which local input device crosses over.
    pub input_device_id: InputDeviceId,
}

impl CoordinationTarget {
    #[must_use]
    pub fn new(network_id: impl Into<NetworkId>, input_device_id: InputDeviceId) -> Self {
        Self {
            network_id: network_id.into(),
            input_device_id,
        }
    }
}

/// Listener-visible coordination event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct CoordinationNotice {
    /// Remote peer involved, absent for the purely local
    /// `Prepare`/`Unprepare` transitions.
    pub network_id: Option<NetworkId>,
    /// The transition that occurred.
    pub msg: CoordinationMsg,
}

impl CoordinationNotice {
    /// A notice for a transition with no remote peer involved.
    #[must_use]
    pub fn local(msg: CoordinationMsg) -> Self {
        Self {
            network_id: None,
            msg,
        }
    }

    /// A notice for a transition involving `network_id`.
    #[must_use]
    pub fn remote(network_id: NetworkId, msg: CoordinationMsg) -> Self {
        Self {
            network_id: Some(network_id),
            msg,
        }
    }
}
