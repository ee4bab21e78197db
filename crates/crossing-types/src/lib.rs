//! Shared types for crossing.
//!
//! This crate contains all types shared across the crossing workspace:
//! coordination lifecycle states and messages, drag session descriptors,
//! local input device identity, and the tagged events fanned out to
//! listeners or delivered inbound by a transport adapter.

pub mod coordination;
pub mod device;
pub mod drag;
pub mod event;

pub use coordination::{
    CoordinationMsg, CoordinationNotice, CoordinationState, CoordinationTarget, NetworkId,
};
pub use device::{DeviceCapability, DeviceInfo, InputDeviceId};
pub use drag::{
    DragEnd, DragOption, DragResult, DragSession, DragSource, DragState, NoticeMsg, NoticeMsgType,
    ProcessId, ShadowThumbnail,
};
pub use event::{AdapterEvent, CrossingEvent, EventCategory};
