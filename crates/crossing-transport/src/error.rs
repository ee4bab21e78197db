//! Transport adapter errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("remote node unreachable: {0}")]
    Unreachable(String),

    #[error("request rejected by remote: {0}")]
    Rejected(String),

    #[error("transport closed")]
    Closed,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
