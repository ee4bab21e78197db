//! Coordinator event types.
//!
//! [`CrossingEvent`] is the tagged event fanned out to registered listeners;
//! its variant decides which listener category receives it. [`AdapterEvent`]
//! is what a transport adapter delivers inbound from the network.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::coordination::{CoordinationMsg, CoordinationNotice, NetworkId};
use crate::drag::{DragState, NoticeMsg};

/// Listener category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum EventCategory {
    Coordination,
    Drag,
}

impl std::fmt::Display for EventCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coordination => write!(f, "coordination"),
            Self::Drag => write!(f, "drag"),
        }
    }
}

/// Event delivered to registered listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum CrossingEvent {
    /// A coordination lifecycle transition.
    Coordination(CoordinationNotice),
    /// A drag lifecycle transition.
    Drag(DragState),
}

impl CrossingEvent {
    /// Which listener category receives this event.
    #[must_use]
    pub fn category(&self) -> EventCategory {
        match self {
            Self::Coordination(_) => EventCategory::Coordination,
            Self::Drag(_) => EventCategory::Drag,
        }
    }
}

/// Inbound event delivered by the transport adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum AdapterEvent {
    /// Coordination notice originated by a remote node.
    Coordination {
        network_id: NetworkId,
        msg: CoordinationMsg,
    },
    /// Mid-drag advisory from the remote side of a crossing.
    DragNotice(NoticeMsg),
    /// The remote side closed the session underpinning a link.
    SessionClosed { network_id: NetworkId },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drag::NoticeMsgType;

    #[test]
    fn event_category_mapping() {
        let coordination = CrossingEvent::Coordination(CoordinationNotice::local(
            CoordinationMsg::Prepare,
        ));
        assert_eq!(coordination.category(), EventCategory::Coordination);

        let drag = CrossingEvent::Drag(DragState::Start);
        assert_eq!(drag.category(), EventCategory::Drag);
    }

    #[test]
    fn adapter_event_roundtrip() {
        let event = AdapterEvent::DragNotice(NoticeMsg {
            msg_type: NoticeMsgType::DragCross,
            allow_drag_in: true,
            text: None,
        });
        let config = bincode::config::standard();
        let bytes = bincode::encode_to_vec(&event, config).unwrap();
        let (decoded, _): (AdapterEvent, _) = bincode::decode_from_slice(&bytes, config).unwrap();
        assert_eq!(event, decoded);
    }
}
