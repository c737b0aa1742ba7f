//! Errors surfaced by the serving layer.

use std::net::SocketAddr;

/// Failure while answering a request or running the server
///
/// Only [`ServeError::Archive`] can occur while handling a request; it maps to
/// `500 Internal Server Error` before the response head is written and aborts
/// the connection when it happens mid-body.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// Reading from the archive failed (I/O, corrupt data, unsupported entry)
    #[error(transparent)]
    Archive(#[from] anyhow::Error),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T, E = ServeError> = std::result::Result<T, E>;
