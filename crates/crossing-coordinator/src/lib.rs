//! Cross-device input-coordination and drag-session coordinator.
//!
//! Implements the keyboard-mouse crossing lifecycle
//! (prepare/activate/deactivate against a remote node), the single active
//! drag session with delegated thumbnail rendering, and per-category
//! listener fan-out, all over an opaque transport adapter.

pub mod config;
mod coordination;
pub mod coordinator;
pub mod drag;
pub mod error;
pub mod registry;

pub use config::{Config, CoordinatorConfig};
pub use coordinator::Coordinator;
pub use drag::ThumbnailDraw;
pub use error::CoordinatorError;
pub use registry::{CrossingListener, ListenerRegistry};
