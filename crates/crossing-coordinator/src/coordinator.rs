//! The process-wide coordinator context.
//!
//! [`Coordinator`] wires the coordination and drag managers to one listener
//! registry and one transport adapter, pumps inbound adapter events, and
//! exposes the caller-facing surface. The five coordination operations come
//! in an awaitable form and a completion-callback form over the same
//! underlying primitive; the drag and listener operations complete
//! synchronously and are plain methods.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crossing_transport::CrossingTransport;
use crossing_types::{
    AdapterEvent, CoordinationState, CoordinationTarget, DeviceInfo, DragOption, DragResult,
    DragSession, EventCategory, InputDeviceId, NetworkId, NoticeMsg, ProcessId,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::Config;
use crate::coordination::CoordinationManager;
use crate::drag::{DragSessionManager, ThumbnailDraw};
use crate::error::CoordinatorError;
use crate::registry::{CrossingListener, ListenerRegistry};

enum PumpState {
    Stopped,
    Starting,
    Running(JoinHandle<()>),
}

struct Inner {
    config: Config,
    transport: Arc<dyn CrossingTransport>,
    registry: Arc<ListenerRegistry>,
    coordination: CoordinationManager,
    drag: DragSessionManager,
    pump: Mutex<PumpState>,
}

impl Inner {
    async fn pump(&self, mut rx: mpsc::Receiver<AdapterEvent>) {
        while let Some(event) = rx.recv().await {
            match event {
                AdapterEvent::Coordination { network_id, msg } => {
                    self.coordination.handle_remote_notice(network_id, msg);
                }
                AdapterEvent::DragNotice(notice) => self.drag.notify(notice),
                AdapterEvent::SessionClosed { network_id } => {
                    self.coordination.handle_session_closed(&network_id);
                }
            }
        }
        debug!("adapter event stream closed");
    }

    fn lock_pump(&self) -> MutexGuard<'_, PumpState> {
        self.pump.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Owned coordination context; cheap to clone, all clones share state.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<Inner>,
}

impl Coordinator {
    /// Builds the context around `transport`. Call [`Coordinator::start`]
    /// before expecting inbound events.
    pub fn new(config: Config, transport: Arc<dyn CrossingTransport>) -> Self {
        let registry = Arc::new(ListenerRegistry::new());
        let coordination = CoordinationManager::new(
            config.coordinator.clone(),
            Arc::clone(&transport),
            Arc::clone(&registry),
        );
        let drag = DragSessionManager::new(Arc::clone(&registry));
        Self {
            inner: Arc::new(Inner {
                config,
                transport,
                registry,
                coordination,
                drag,
                pump: Mutex::new(PumpState::Stopped),
            }),
        }
    }

    /// Starts the transport and the inbound event pump.
    pub async fn start(&self) -> Result<(), CoordinatorError> {
        {
            let mut pump = self.inner.lock_pump();
            match *pump {
                PumpState::Stopped => *pump = PumpState::Starting,
                _ => return Err(CoordinatorError::AlreadyRunning),
            }
        }
        let (tx, rx) = mpsc::channel(self.inner.config.coordinator.event_capacity);
        if let Err(e) = self.inner.transport.start(tx).await {
            *self.inner.lock_pump() = PumpState::Stopped;
            return Err(e.into());
        }
        let inner = Arc::clone(&self.inner);
        *self.inner.lock_pump() = PumpState::Running(tokio::spawn(async move {
            inner.pump(rx).await;
        }));
        info!("coordinator started");
        Ok(())
    }

    /// Tears the context down: clears the crossing lifecycle, stops the
    /// transport, and waits for the inbound pump to drain.
    pub async fn shutdown(&self) -> Result<(), CoordinatorError> {
        self.inner.coordination.unprepare()?;
        self.inner.transport.shutdown().await?;
        let handle = {
            let mut pump = self.inner.lock_pump();
            match std::mem::replace(&mut *pump, PumpState::Stopped) {
                PumpState::Running(handle) => Some(handle),
                PumpState::Stopped | PumpState::Starting => None,
            }
        };
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        info!("coordinator shut down");
        Ok(())
    }

    /// `Idle -> Prepared`.
    #[allow(clippy::unused_async)]
    pub async fn prepare(&self) -> Result<(), CoordinatorError> {
        self.inner.coordination.prepare()
    }

    /// Completion-callback form of [`Coordinator::prepare`].
    pub fn prepare_with_callback(
        &self,
        done: impl FnOnce(Result<(), CoordinatorError>) + Send + 'static,
    ) {
        done(self.inner.coordination.prepare());
    }

    /// Returns the lifecycle to `Idle` from any state, abandoning an
    /// in-flight activation. A no-op from `Idle`.
    #[allow(clippy::unused_async)]
    pub async fn unprepare(&self) -> Result<(), CoordinatorError> {
        self.inner.coordination.unprepare()
    }

    /// Completion-callback form of [`Coordinator::unprepare`].
    pub fn unprepare_with_callback(
        &self,
        done: impl FnOnce(Result<(), CoordinatorError>) + Send + 'static,
    ) {
        done(self.inner.coordination.unprepare());
    }

    /// Crosses input to `network_id` through local device
    /// `input_device_id`. Resolves once the remote acknowledged (state
    /// `Active`) or the request failed (state back to `Prepared`).
    pub async fn activate(
        &self,
        network_id: impl Into<NetworkId>,
        input_device_id: InputDeviceId,
    ) -> Result<(), CoordinatorError> {
        let target = CoordinationTarget::new(network_id, input_device_id);
        self.inner.coordination.activate(target).await
    }

    /// Completion-callback form of [`Coordinator::activate`]. Parameter
    /// validation still fails before anything is spawned; the remote
    /// outcome reaches `done` from the ambient tokio runtime.
    pub fn activate_with_callback(
        &self,
        network_id: impl Into<NetworkId>,
        input_device_id: InputDeviceId,
        done: impl FnOnce(Result<(), CoordinatorError>) + Send + 'static,
    ) {
        let target = CoordinationTarget::new(network_id, input_device_id);
        if let Err(e) = self.inner.coordination.validate_target(&target) {
            done(Err(e));
            return;
        }
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            done(inner.coordination.activate(target).await);
        });
    }

    /// Ends the active crossing. `unchained` additionally tears down the
    /// device link on the remote side. Local state ends `Idle` whether or
    /// not the remote acknowledged.
    pub async fn deactivate(&self, unchained: bool) -> Result<(), CoordinatorError> {
        self.inner.coordination.deactivate(unchained).await
    }

    /// Completion-callback form of [`Coordinator::deactivate`].
    pub fn deactivate_with_callback(
        &self,
        unchained: bool,
        done: impl FnOnce(Result<(), CoordinatorError>) + Send + 'static,
    ) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            done(inner.coordination.deactivate(unchained).await);
        });
    }

    /// Whether `network_id` currently permits crossing. Pure query, no
    /// local state involved.
    pub async fn crossing_switch_state(
        &self,
        network_id: impl Into<NetworkId>,
    ) -> Result<bool, CoordinatorError> {
        let network_id = network_id.into();
        self.inner
            .coordination
            .crossing_switch_state(&network_id)
            .await
    }

    /// Completion-callback form of [`Coordinator::crossing_switch_state`].
    pub fn crossing_switch_state_with_callback(
        &self,
        network_id: impl Into<NetworkId>,
        done: impl FnOnce(Result<bool, CoordinatorError>) + Send + 'static,
    ) {
        let network_id = network_id.into();
        if let Err(e) = CoordinationManager::validate_network_id(&network_id) {
            done(Err(e));
            return;
        }
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            done(inner.coordination.crossing_switch_state(&network_id).await);
        });
    }

    /// Opens the single drag session.
    pub fn start_drag(&self, option: DragOption) -> Result<(), CoordinatorError> {
        self.inner.drag.start(option)
    }

    /// Mid-flight advisory from the drag originator. Silently dropped when
    /// no session is active.
    pub fn notify_drag(&self, notice: NoticeMsg) {
        self.inner.drag.notify(notice);
    }

    /// Terminates the active drag session with `result`, ended by `pid`.
    pub fn end_drag(&self, pid: ProcessId, result: DragResult) -> Result<(), CoordinatorError> {
        self.inner.drag.end(pid, result)
    }

    /// Installs the exclusive thumbnail delegate.
    pub fn register_thumbnail_draw(
        &self,
        delegate: Arc<dyn ThumbnailDraw>,
    ) -> Result<(), CoordinatorError> {
        self.inner.drag.register_thumbnail_draw(delegate)
    }

    /// Clears the thumbnail delegate slot. Idempotent.
    pub fn unregister_thumbnail_draw(&self) {
        self.inner.drag.unregister_thumbnail_draw();
    }

    /// Registers an event listener under `category`.
    pub fn on(&self, category: EventCategory, listener: CrossingListener) {
        self.inner.registry.on(category, listener);
    }

    /// Removes `listener` by handle identity, or every listener for the
    /// category when `listener` is `None`.
    pub fn off(&self, category: EventCategory, listener: Option<&CrossingListener>) {
        self.inner.registry.off(category, listener);
    }

    /// Snapshot of the crossing lifecycle state.
    pub fn coordination_state(&self) -> CoordinationState {
        self.inner.coordination.state()
    }

    /// The target of the current (or in-flight) crossing, if any.
    pub fn active_target(&self) -> Option<CoordinationTarget> {
        self.inner.coordination.active_target()
    }

    /// Snapshot of the active drag session, hints included.
    pub fn current_drag_session(&self) -> Option<DragSession> {
        self.inner.drag.current_session()
    }

    /// Replaces the set of local input devices used to validate activation
    /// targets.
    pub fn set_local_devices(&self, devices: Vec<DeviceInfo>) {
        self.inner.coordination.set_local_devices(devices);
    }
}
