//! Mock transport backend for testing.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use crossing_types::{AdapterEvent, CoordinationTarget, NetworkId};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::TransportError;
use crate::CrossingTransport;

/// Scripted outcome for a mock request.
#[derive(Debug, Clone, Default)]
pub enum MockReply {
    /// Acknowledge the request.
    #[default]
    Ack,
    /// Reject with the given reason.
    Reject(String),
    /// Never answer; the caller's bounded wait decides.
    Hang,
}

#[derive(Debug, Default)]
struct MockTransportState {
    activate_requests: Vec<CoordinationTarget>,
    deactivate_requests: Vec<(NetworkId, bool)>,
    switch_queries: Vec<NetworkId>,
    activate_reply: MockReply,
    deactivate_reply: MockReply,
    switch_reply: MockReply,
    switch_state: bool,
    events_tx: Option<mpsc::Sender<AdapterEvent>>,
    shutdown: bool,
}

/// Mock transport for testing.
///
/// Requests resolve according to scripted [`MockReply`] values and every
/// request is recorded; tests script and observe through the paired
/// [`MockTransportHandle`], including injecting inbound events as if the
/// network delivered them.
pub struct MockTransport {
    state: Arc<Mutex<MockTransportState>>,
}

impl MockTransport {
    /// Create a new mock transport and its scripting/observer handle.
    pub fn new() -> (Self, MockTransportHandle) {
        let state = Arc::new(Mutex::new(MockTransportState::default()));
        let handle = MockTransportHandle {
            state: Arc::clone(&state),
        };
        (Self { state }, handle)
    }
}

/// Clonable scripting and observer handle for [`MockTransport`].
#[derive(Clone)]
pub struct MockTransportHandle {
    state: Arc<Mutex<MockTransportState>>,
}

impl MockTransportHandle {
    /// Script the outcome of activate requests.
    pub fn set_activate_reply(&self, reply: MockReply) {
        self.state.lock().unwrap().activate_reply = reply;
    }

    /// Script the outcome of deactivate requests.
    pub fn set_deactivate_reply(&self, reply: MockReply) {
        self.state.lock().unwrap().deactivate_reply = reply;
    }

    /// Script the outcome of switch-state queries.
    pub fn set_switch_reply(&self, reply: MockReply) {
        self.state.lock().unwrap().switch_reply = reply;
    }

    /// Set the switch state reported by acknowledged queries.
    pub fn set_switch_state(&self, permits: bool) {
        self.state.lock().unwrap().switch_state = permits;
    }

    /// Snapshot of recorded activate requests.
    pub fn activate_requests(&self) -> Vec<CoordinationTarget> {
        self.state.lock().unwrap().activate_requests.clone()
    }

    /// Snapshot of recorded deactivate requests with their unchained flag.
    pub fn deactivate_requests(&self) -> Vec<(NetworkId, bool)> {
        self.state.lock().unwrap().deactivate_requests.clone()
    }

    /// Snapshot of recorded switch-state queries.
    pub fn switch_queries(&self) -> Vec<NetworkId> {
        self.state.lock().unwrap().switch_queries.clone()
    }

    /// Check if shutdown was called.
    pub fn is_shutdown(&self) -> bool {
        self.state.lock().unwrap().shutdown
    }

    /// Inject an inbound event as if the network delivered it.
    pub async fn push_event(&self, event: AdapterEvent) -> Result<(), TransportError> {
        let tx = self
            .state
            .lock()
            .unwrap()
            .events_tx
            .clone()
            .ok_or(TransportError::Closed)?;
        tx.send(event).await.map_err(|_| TransportError::Closed)
    }
}

async fn resolve(reply: MockReply) -> Result<(), TransportError> {
    match reply {
        MockReply::Ack => Ok(()),
        MockReply::Reject(reason) => Err(TransportError::Rejected(reason)),
        MockReply::Hang => std::future::pending().await,
    }
}

#[async_trait]
impl CrossingTransport for MockTransport {
    async fn start(&self, tx: mpsc::Sender<AdapterEvent>) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        if state.events_tx.is_some() {
            return Err(TransportError::Other(anyhow::anyhow!(
                "MockTransport already started"
            )));
        }
        state.events_tx = Some(tx);
        Ok(())
    }

    async fn request_activate(&self, target: &CoordinationTarget) -> Result<(), TransportError> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state.activate_requests.push(target.clone());
            state.activate_reply.clone()
        };
        debug!(peer = %target.network_id, ?reply, "mock activate request");
        resolve(reply).await
    }

    async fn request_deactivate(
        &self,
        network_id: &NetworkId,
        unchained: bool,
    ) -> Result<(), TransportError> {
        let reply = {
            let mut state = self.state.lock().unwrap();
            state
                .deactivate_requests
                .push((network_id.clone(), unchained));
            state.deactivate_reply.clone()
        };
        debug!(peer = %network_id, unchained, ?reply, "mock deactivate request");
        resolve(reply).await
    }

    async fn query_switch_state(&self, network_id: &NetworkId) -> Result<bool, TransportError> {
        let (reply, permits) = {
            let mut state = self.state.lock().unwrap();
            state.switch_queries.push(network_id.clone());
            (state.switch_reply.clone(), state.switch_state)
        };
        resolve(reply).await?;
        Ok(permits)
    }

    async fn shutdown(&self) -> Result<(), TransportError> {
        let mut state = self.state.lock().unwrap();
        state.shutdown = true;
        state.events_tx = None;
        Ok(())
    }
}
