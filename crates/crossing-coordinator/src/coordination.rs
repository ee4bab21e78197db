//! Keyboard-mouse crossing lifecycle.
//!
//! Drives the prepare/activate/deactivate state machine for crossing local
//! input to a remote node. Activation and deactivation are round trips
//! through the transport adapter bounded by the configured acknowledgment
//! windows; every other transition completes synchronously. Round trips run
//! in spawned tasks so `unprepare` can abandon them without waiting.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crossing_transport::{CrossingTransport, TransportError};
use crossing_types::{
    CoordinationMsg, CoordinationNotice, CoordinationState, CoordinationTarget, CrossingEvent,
    DeviceInfo, NetworkId,
};
use tokio::sync::oneshot;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::CoordinatorConfig;
use crate::error::CoordinatorError;
use crate::registry::ListenerRegistry;

/// Mutable lifecycle state, guarded as one unit.
struct Lifecycle {
    state: CoordinationState,
    target: Option<CoordinationTarget>,
    /// Bumped on every reset; a round-trip task compares epochs before
    /// applying its outcome so an abandoned trip cannot resurrect state.
    epoch: u64,
    /// Signals the in-flight round-trip task to stop waiting.
    cancel: Option<oneshot::Sender<()>>,
}

impl Lifecycle {
    /// Clears the lifecycle back to `Idle`, invalidating any in-flight
    /// round trip. The returned cancel handle is fired outside the lock.
    fn reset(&mut self) -> Option<oneshot::Sender<()>> {
        self.state = CoordinationState::Idle;
        self.target = None;
        self.epoch += 1;
        self.cancel.take()
    }
}

fn lock_lifecycle(cell: &Mutex<Lifecycle>) -> MutexGuard<'_, Lifecycle> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns the crossing state machine and the adapter round trips that move it.
pub(crate) struct CoordinationManager {
    config: CoordinatorConfig,
    transport: Arc<dyn CrossingTransport>,
    registry: Arc<ListenerRegistry>,
    devices: Mutex<Vec<DeviceInfo>>,
    lifecycle: Arc<Mutex<Lifecycle>>,
}

impl CoordinationManager {
    pub(crate) fn new(
        config: CoordinatorConfig,
        transport: Arc<dyn CrossingTransport>,
        registry: Arc<ListenerRegistry>,
    ) -> Self {
        Self {
            config,
            transport,
            registry,
            devices: Mutex::new(Vec::new()),
            lifecycle: Arc::new(Mutex::new(Lifecycle {
                state: CoordinationState::Idle,
                target: None,
                epoch: 0,
                cancel: None,
            })),
        }
    }

    pub(crate) fn state(&self) -> CoordinationState {
        lock_lifecycle(&self.lifecycle).state
    }

    pub(crate) fn active_target(&self) -> Option<CoordinationTarget> {
        lock_lifecycle(&self.lifecycle).target.clone()
    }

    /// Replaces the set of local input devices used to validate activation
    /// targets.
    pub(crate) fn set_local_devices(&self, devices: Vec<DeviceInfo>) {
        *self.devices.lock().unwrap_or_else(PoisonError::into_inner) = devices;
    }

    /// `Idle -> Prepared`.
    pub(crate) fn prepare(&self) -> Result<(), CoordinatorError> {
        {
            let mut lifecycle = lock_lifecycle(&self.lifecycle);
            if !lifecycle.state.can_prepare() {
                return Err(CoordinatorError::InvalidState {
                    op: "prepare",
                    state: lifecycle.state,
                });
            }
            lifecycle.state = CoordinationState::Prepared;
        }
        info!("coordination prepared");
        self.emit(CoordinationNotice::local(CoordinationMsg::Prepare));
        Ok(())
    }

    /// Any state back to `Idle`. Local state clears immediately; an
    /// in-flight activation is abandoned at the adapter. A no-op from
    /// `Idle`.
    pub(crate) fn unprepare(&self) -> Result<(), CoordinatorError> {
        let cancel = {
            let mut lifecycle = lock_lifecycle(&self.lifecycle);
            if lifecycle.state == CoordinationState::Idle {
                return Ok(());
            }
            lifecycle.reset()
        };
        if let Some(tx) = cancel {
            let _ = tx.send(());
        }
        info!("coordination unprepared");
        self.emit(CoordinationNotice::local(CoordinationMsg::Unprepare));
        Ok(())
    }

    pub(crate) fn validate_network_id(network_id: &NetworkId) -> Result<(), CoordinatorError> {
        if network_id.is_empty() {
            return Err(CoordinatorError::InvalidArgument(
                "network id must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Checks an activation target before any state mutation or adapter
    /// contact: non-empty network id, device known locally.
    pub(crate) fn validate_target(
        &self,
        target: &CoordinationTarget,
    ) -> Result<(), CoordinatorError> {
        Self::validate_network_id(&target.network_id)?;
        let devices = self.devices.lock().unwrap_or_else(PoisonError::into_inner);
        if !devices.iter().any(|d| d.id == target.input_device_id) {
            return Err(CoordinatorError::InvalidArgument(format!(
                "unknown input device {}",
                target.input_device_id
            )));
        }
        Ok(())
    }

    /// `Prepared -> Activating -> Active` on acknowledgment, back to
    /// `Prepared` on rejection or timeout.
    pub(crate) async fn activate(
        &self,
        target: CoordinationTarget,
    ) -> Result<(), CoordinatorError> {
        self.validate_target(&target)?;

        let (cancel_tx, cancel_rx) = oneshot::channel();
        let epoch = {
            let mut lifecycle = lock_lifecycle(&self.lifecycle);
            if !lifecycle.state.can_activate() {
                return Err(CoordinatorError::InvalidState {
                    op: "activate",
                    state: lifecycle.state,
                });
            }
            lifecycle.state = CoordinationState::Activating;
            lifecycle.target = Some(target.clone());
            lifecycle.cancel = Some(cancel_tx);
            lifecycle.epoch
        };
        info!(peer = %target.network_id, device = %target.input_device_id, "activating crossing");
        self.emit(CoordinationNotice::remote(
            target.network_id.clone(),
            CoordinationMsg::Activate,
        ));

        let (done_tx, done_rx) = oneshot::channel();
        let transport = Arc::clone(&self.transport);
        let lifecycle = Arc::clone(&self.lifecycle);
        let registry = Arc::clone(&self.registry);
        let window = self.config.activate_timeout();
        tokio::spawn(async move {
            let outcome = await_ack(transport.request_activate(&target), cancel_rx, window).await;
            let msg = {
                let mut lifecycle = lock_lifecycle(&lifecycle);
                if lifecycle.epoch == epoch {
                    lifecycle.cancel = None;
                    if outcome.is_ok() {
                        lifecycle.state = CoordinationState::Active;
                        Some(CoordinationMsg::ActivateSuccess)
                    } else {
                        lifecycle.state = CoordinationState::Prepared;
                        lifecycle.target = None;
                        Some(CoordinationMsg::ActivateFail)
                    }
                } else {
                    None
                }
            };
            let outcome = match msg {
                Some(msg) => {
                    match &outcome {
                        Ok(()) => info!(peer = %target.network_id, "crossing active"),
                        Err(e) => warn!(peer = %target.network_id, error = %e, "activation failed"),
                    }
                    registry.emit(&CrossingEvent::Coordination(CoordinationNotice::remote(
                        target.network_id,
                        msg,
                    )));
                    outcome
                }
                None => Err(CoordinatorError::RemoteFailure(
                    "lifecycle reset before acknowledgment".to_string(),
                )),
            };
            let _ = done_tx.send(outcome);
        });
        await_done(done_rx).await
    }

    /// `Active -> Deactivating -> Idle`. Local state ends `Idle` whether
    /// or not the remote acknowledged; a failed acknowledgment is still
    /// reported to the caller.
    pub(crate) async fn deactivate(&self, unchained: bool) -> Result<(), CoordinatorError> {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let (target, epoch) = {
            let mut lifecycle = lock_lifecycle(&self.lifecycle);
            match (lifecycle.state, lifecycle.target.clone()) {
                (CoordinationState::Active, Some(target)) => {
                    lifecycle.state = CoordinationState::Deactivating;
                    lifecycle.cancel = Some(cancel_tx);
                    (target, lifecycle.epoch)
                }
                (state, _) => {
                    return Err(CoordinatorError::InvalidState {
                        op: "deactivate",
                        state,
                    })
                }
            }
        };
        info!(peer = %target.network_id, unchained, "deactivating crossing");

        let (done_tx, done_rx) = oneshot::channel();
        let transport = Arc::clone(&self.transport);
        let lifecycle = Arc::clone(&self.lifecycle);
        let registry = Arc::clone(&self.registry);
        let window = self.config.deactivate_timeout();
        tokio::spawn(async move {
            let outcome = await_ack(
                transport.request_deactivate(&target.network_id, unchained),
                cancel_rx,
                window,
            )
            .await;
            let msg = {
                let mut lifecycle = lock_lifecycle(&lifecycle);
                if lifecycle.epoch == epoch {
                    lifecycle.cancel = None;
                    lifecycle.state = CoordinationState::Idle;
                    lifecycle.target = None;
                    if outcome.is_ok() {
                        Some(CoordinationMsg::DeactivateSuccess)
                    } else {
                        Some(CoordinationMsg::DeactivateFail)
                    }
                } else {
                    None
                }
            };
            let outcome = match msg {
                Some(msg) => {
                    match &outcome {
                        Ok(()) => info!(peer = %target.network_id, "crossing deactivated"),
                        Err(e) => {
                            warn!(peer = %target.network_id, error = %e, "deactivation unacknowledged, local state cleared");
                        }
                    }
                    registry.emit(&CrossingEvent::Coordination(CoordinationNotice::remote(
                        target.network_id,
                        msg,
                    )));
                    outcome
                }
                None => Err(CoordinatorError::RemoteFailure(
                    "lifecycle reset before acknowledgment".to_string(),
                )),
            };
            let _ = done_tx.send(outcome);
        });
        await_done(done_rx).await
    }

    /// Pure adapter query; no local state involved.
    pub(crate) async fn crossing_switch_state(
        &self,
        network_id: &NetworkId,
    ) -> Result<bool, CoordinatorError> {
        Self::validate_network_id(network_id)?;
        let window = self.config.query_timeout();
        match timeout(window, self.transport.query_switch_state(network_id)).await {
            Ok(result) => result.map_err(CoordinatorError::from),
            Err(_) => Err(CoordinatorError::RemoteFailure(format!(
                "no response within {}ms",
                window.as_millis()
            ))),
        }
    }

    /// Inbound coordination notice from a remote node, forwarded to
    /// listeners verbatim.
    pub(crate) fn handle_remote_notice(&self, network_id: NetworkId, msg: CoordinationMsg) {
        debug!(peer = %network_id, ?msg, "remote coordination notice");
        self.emit(CoordinationNotice::remote(network_id, msg));
    }

    /// The remote side closed the session underpinning the link. If it
    /// names the current target the lifecycle resets to `Idle` and
    /// listeners see a `DeactivateSuccess`.
    pub(crate) fn handle_session_closed(&self, network_id: &NetworkId) {
        let cancel = {
            let mut lifecycle = lock_lifecycle(&self.lifecycle);
            let concerns_link = lifecycle
                .target
                .as_ref()
                .is_some_and(|t| &t.network_id == network_id);
            if !concerns_link {
                debug!(peer = %network_id, "session closed for non-linked peer");
                return;
            }
            lifecycle.reset()
        };
        if let Some(tx) = cancel {
            let _ = tx.send(());
        }
        info!(peer = %network_id, "remote closed the session, crossing torn down");
        self.emit(CoordinationNotice::remote(
            network_id.clone(),
            CoordinationMsg::DeactivateSuccess,
        ));
    }

    fn emit(&self, notice: CoordinationNotice) {
        self.registry.emit(&CrossingEvent::Coordination(notice));
    }
}

/// Waits for an adapter round trip bounded by `window`, racing the cancel
/// signal fired by `unprepare`. Losing the race drops the request future,
/// abandoning the outstanding adapter request.
async fn await_ack<F>(
    request: F,
    cancel: oneshot::Receiver<()>,
    window: Duration,
) -> Result<(), CoordinatorError>
where
    F: Future<Output = Result<(), TransportError>>,
{
    tokio::select! {
        outcome = timeout(window, request) => match outcome {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(CoordinatorError::from(e)),
            Err(_) => Err(CoordinatorError::RemoteFailure(format!(
                "no acknowledgment within {}ms",
                window.as_millis()
            ))),
        },
        _ = cancel => Err(CoordinatorError::RemoteFailure(
            "request cancelled before acknowledgment".to_string(),
        )),
    }
}

async fn await_done(
    done: oneshot::Receiver<Result<(), CoordinatorError>>,
) -> Result<(), CoordinatorError> {
    match done.await {
        Ok(result) => result,
        Err(_) => Err(CoordinatorError::RemoteFailure(
            "acknowledgment channel closed".to_string(),
        )),
    }
}
