//! Transport adapter seam for crossing.
//!
//! This crate defines the [`CrossingTransport`] trait the coordinator uses to
//! reach remote nodes. A concrete networked backend lives with the embedder;
//! this crate ships the seam plus a scripted mock for tests (behind the
//! `mock` feature).

use async_trait::async_trait;
use crossing_types::{AdapterEvent, CoordinationTarget, NetworkId};
use tokio::sync::mpsc;

pub mod error;
#[cfg(feature = "mock")]
pub mod mock;

pub use error::TransportError;

/// Reliable request/acknowledgment channel to named remote nodes.
///
/// Each request method resolves once the remote node has answered.
/// The coordinator bounds every wait and drops the future of a request it
/// abandons; implementations must treat a dropped request future as a
/// cancelled request. Inbound traffic (remote coordination notices, drag
/// notices, session teardown) flows through the channel handed to
/// [`start`](CrossingTransport::start).
#[async_trait]
pub trait CrossingTransport: Send + Sync + 'static {
    /// Start delivering inbound events to `tx`. Called once at startup.
    async fn start(&self, tx: mpsc::Sender<AdapterEvent>) -> Result<(), TransportError>;

    /// Ask `target`'s node to accept a crossing of the given local device.
    async fn request_activate(&self, target: &CoordinationTarget) -> Result<(), TransportError>;

    /// Ask `network_id` to release the active crossing. With `unchained`
    /// the underlying device link is torn down as well.
    async fn request_deactivate(
        &self,
        network_id: &NetworkId,
        unchained: bool,
    ) -> Result<(), TransportError>;

    /// Whether `network_id` currently permits crossing onto it.
    async fn query_switch_state(&self, network_id: &NetworkId) -> Result<bool, TransportError>;

    /// Stop delivering events and release transport resources.
    async fn shutdown(&self) -> Result<(), TransportError>;
}
