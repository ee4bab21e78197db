//! Drag session lifecycle and thumbnail delegation.
//!
//! At most one drag session runs at a time. Rendering is delegated: an
//! embedder registers one [`ThumbnailDraw`] and receives the start option,
//! every mid-flight notice, and the completion payload. Lifecycle
//! transitions additionally fan out to drag-category listeners as
//! [`DragState`] values.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossing_types::{
    CrossingEvent, DragEnd, DragOption, DragResult, DragSession, DragState, NoticeMsg, ProcessId,
};
use tracing::{debug, info};

use crate::error::CoordinatorError;
use crate::registry::ListenerRegistry;

/// Renders the drag shadow on behalf of the coordinator.
///
/// Callbacks are invoked synchronously on the thread driving the session,
/// outside the manager's lock. Implementations must not block for long.
pub trait ThumbnailDraw: Send + Sync {
    /// A session opened with `option`.
    fn on_start(&self, option: &DragOption);
    /// A mid-flight advisory arrived.
    fn on_notice(&self, notice: &NoticeMsg);
    /// The session reached a terminal result.
    fn on_end(&self, end: &DragEnd);
}

#[derive(Default)]
struct DragCell {
    session: Option<DragSession>,
    delegate: Option<Arc<dyn ThumbnailDraw>>,
}

/// Owns the single active drag session and the exclusive delegate slot.
pub(crate) struct DragSessionManager {
    registry: Arc<ListenerRegistry>,
    cell: Mutex<DragCell>,
}

impl DragSessionManager {
    pub(crate) fn new(registry: Arc<ListenerRegistry>) -> Self {
        Self {
            registry,
            cell: Mutex::new(DragCell::default()),
        }
    }

    /// Opens the session. Fails `ConflictingSession` while one is active;
    /// the existing session is unaffected.
    pub(crate) fn start(&self, option: DragOption) -> Result<(), CoordinatorError> {
        let delegate = {
            let mut cell = self.lock();
            if let Some(session) = &cell.session {
                return Err(CoordinatorError::ConflictingSession(session.start_drag_pid));
            }
            cell.session = Some(DragSession::from_option(&option));
            cell.delegate.clone()
        };
        info!(pid = %option.start_drag_pid, drag_num = option.drag_num, "drag session started");
        if let Some(delegate) = delegate {
            delegate.on_start(&option);
        }
        self.registry.emit(&CrossingEvent::Drag(DragState::Start));
        Ok(())
    }

    /// Folds `notice` into the session's presentation hints and forwards it
    /// to the delegate. Dropped silently when no session is active.
    pub(crate) fn notify(&self, notice: NoticeMsg) {
        let delegate = {
            let mut cell = self.lock();
            let Some(session) = cell.session.as_mut() else {
                debug!(?notice, "drag notice dropped, no active session");
                return;
            };
            session.apply_notice(&notice);
            cell.delegate.clone()
        };
        if let Some(delegate) = delegate {
            delegate.on_notice(&notice);
        }
    }

    /// Terminates the session with `result`, ended by `pid`.
    pub(crate) fn end(&self, pid: ProcessId, result: DragResult) -> Result<(), CoordinatorError> {
        let delegate = {
            let mut cell = self.lock();
            if cell.session.take().is_none() {
                return Err(CoordinatorError::NoActiveSession);
            }
            cell.delegate.clone()
        };
        let end = DragEnd {
            end_drag_pid: pid,
            drag_result: result,
        };
        let state = DragState::from_result(result);
        info!(pid = %pid, state = %state, "drag session ended");
        if let Some(delegate) = delegate {
            delegate.on_end(&end);
        }
        self.registry.emit(&CrossingEvent::Drag(state));
        Ok(())
    }

    /// Installs the delegate. Exclusive: a second registration without an
    /// intervening unregister fails `AlreadyRegistered`.
    pub(crate) fn register_thumbnail_draw(
        &self,
        delegate: Arc<dyn ThumbnailDraw>,
    ) -> Result<(), CoordinatorError> {
        let mut cell = self.lock();
        if cell.delegate.is_some() {
            return Err(CoordinatorError::AlreadyRegistered);
        }
        cell.delegate = Some(delegate);
        Ok(())
    }

    /// Clears the delegate slot. Idempotent.
    pub(crate) fn unregister_thumbnail_draw(&self) {
        self.lock().delegate = None;
    }

    pub(crate) fn current_session(&self) -> Option<DragSession> {
        self.lock().session.clone()
    }

    fn lock(&self) -> MutexGuard<'_, DragCell> {
        self.cell.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
