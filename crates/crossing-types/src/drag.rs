//! Drag session types.
//!
//! One drag operation runs from pick-up to drop. The session carries the
//! identity fixed at start (owning pid, thumbnail, origin, source, object
//! count) plus presentation hints that mid-flight notices fold in.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Process that owns one side of a drag operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub struct ProcessId(pub i32);

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Input modality that originated a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum DragSource {
    Mouse,
    Touch,
}

/// Terminal outcome of a drag session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum DragResult {
    Copy,
    Move,
    Cancel,
    Fail,
}

/// Observable drag lifecycle state, fanned out to drag listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum DragState {
    Error,
    Start,
    Stop,
    Cancel,
}

impl DragState {
    /// Terminal state a finished session maps to for a given result.
    #[must_use]
    pub fn from_result(result: DragResult) -> Self {
        match result {
            DragResult::Copy | DragResult::Move => Self::Stop,
            DragResult::Cancel => Self::Cancel,
            DragResult::Fail => Self::Error,
        }
    }
}

impl std::fmt::Display for DragState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Start => write!(f, "start"),
            Self::Stop => write!(f, "stop"),
            Self::Cancel => write!(f, "cancel"),
        }
    }
}

/// Kind of mid-drag advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum NoticeMsgType {
    /// Drop-acceptance styling changed.
    DragStyle,
    /// Badge text changed.
    DragText,
    /// The drag crossed a device boundary.
    DragCross,
}

/// Mid-drag advisory for the thumbnail delegate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct NoticeMsg {
    pub msg_type: NoticeMsgType,
    /// Whether the current drop target accepts the dragged object.
    pub allow_drag_in: bool,
    /// Optional badge text shown beside the thumbnail.
    pub text: Option<String>,
}

/// Dimensions of the drag shadow. Pixel data stays with the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct ShadowThumbnail {
    pub width: u32,
    pub height: u32,
}

/// Everything needed to start a drag session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct DragOption {
    /// Shadow drawn under the pointer while dragging.
    pub thumbnail: ShadowThumbnail,
    /// Pointer x at pick-up, display coordinates.
    pub x: i32,
    /// Pointer y at pick-up, display coordinates.
    pub y: i32,
    /// Input modality driving the drag.
    pub source: DragSource,
    /// Number of objects being dragged.
    pub drag_num: u32,
    /// Process starting the drag.
    pub start_drag_pid: ProcessId,
}

/// Completion payload handed to the delegate when a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct DragEnd {
    /// Process that terminated the drag.
    pub end_drag_pid: ProcessId,
    /// How the drag ended.
    pub drag_result: DragResult,
}

/// One in-flight drag, from pick-up to drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct DragSession {
    /// Process that started the drag.
    pub start_drag_pid: ProcessId,
    /// Shadow dimensions fixed at start.
    pub thumbnail: ShadowThumbnail,
    /// Pointer x at session start.
    pub start_x: i32,
    /// Pointer y at session start.
    pub start_y: i32,
    /// Input modality driving the drag.
    pub source: DragSource,
    /// Number of objects being dragged.
    pub drag_num: u32,
    /// Latest drop-acceptance hint; false until a notice reports otherwise.
    pub allow_drag_in: bool,
    /// Latest badge text, if any notice carried one.
    pub badge_text: Option<String>,
}

impl DragSession {
    /// Open a session from the originator's start options.
    #[must_use]
    pub fn from_option(option: &DragOption) -> Self {
        Self {
            start_drag_pid: option.start_drag_pid,
            thumbnail: option.thumbnail,
            start_x: option.x,
            start_y: option.y,
            source: option.source,
            drag_num: option.drag_num,
            allow_drag_in: false,
            badge_text: None,
        }
    }

    /// Fold a notice's presentation hints into the session.
    ///
    /// Identity fields are untouched; an absent badge text leaves the
    /// previous badge in place.
    pub fn apply_notice(&mut self, notice: &NoticeMsg) {
        self.allow_drag_in = notice.allow_drag_in;
        if let Some(text) = &notice.text {
            self.badge_text = Some(text.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn option(pid: i32) -> DragOption {
        DragOption {
            thumbnail: ShadowThumbnail {
                width: 64,
                height: 64,
            },
            x: 120,
            y: 80,
            source: DragSource::Mouse,
            drag_num: 1,
            start_drag_pid: ProcessId(pid),
        }
    }

    #[test]
    fn result_to_state_mapping() {
        assert_eq!(DragState::from_result(DragResult::Copy), DragState::Stop);
        assert_eq!(DragState::from_result(DragResult::Move), DragState::Stop);
        assert_eq!(DragState::from_result(DragResult::Cancel), DragState::Cancel);
        assert_eq!(DragState::from_result(DragResult::Fail), DragState::Error);
    }

    #[test]
    fn session_opens_from_option() {
        let session = DragSession::from_option(&option(100));
        assert_eq!(session.start_drag_pid, ProcessId(100));
        assert_eq!(session.start_x, 120);
        assert_eq!(session.start_y, 80);
        assert_eq!(session.drag_num, 1);
        assert!(!session.allow_drag_in);
        assert!(session.badge_text.is_none());
    }

    #[test]
    fn notice_folds_hints_without_touching_identity() {
        let mut session = DragSession::from_option(&option(100));
        session.apply_notice(&NoticeMsg {
            msg_type: NoticeMsgType::DragStyle,
            allow_drag_in: true,
            text: None,
        });
        assert!(session.allow_drag_in);
        assert!(session.badge_text.is_none());

        session.apply_notice(&NoticeMsg {
            msg_type: NoticeMsgType::DragText,
            allow_drag_in: true,
            text: Some("3 items".to_string()),
        });
        assert_eq!(session.badge_text.as_deref(), Some("3 items"));

        // A later notice without text keeps the previous badge.
        session.apply_notice(&NoticeMsg {
            msg_type: NoticeMsgType::DragStyle,
            allow_drag_in: false,
            text: None,
        });
        assert!(!session.allow_drag_in);
        assert_eq!(session.badge_text.as_deref(), Some("3 items"));
        assert_eq!(session.start_drag_pid, ProcessId(100));
    }

    #[test]
    fn notice_msg_serde_roundtrip() {
        let notice = NoticeMsg {
            msg_type: NoticeMsgType::DragCross,
            allow_drag_in: true,
            text: Some("moving".to_string()),
        };
        let json = serde_json::to_string(&notice).unwrap();
        let decoded: NoticeMsg = serde_json::from_str(&json).unwrap();
        assert_eq!(notice, decoded);
    }
}
