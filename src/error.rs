//! Errors surfaced through send completions and `warn` events.

use std::io;
use std::sync::Arc;

use thiserror::Error;

use crate::encoder::EncodeError;

/// Failure reported to a send completion.
///
/// I/O errors are shared behind an [`Arc`] so the same failure can be handed
/// to the caller's callback and to every `warn` subscriber.
#[derive(Clone, Debug, Error)]
pub enum TransportError {
    /// The socket refused or failed to hand the datagram to the network
    /// stack, including failures to resolve an unresolved destination.
    #[error("failed to send datagram: {0}")]
    Send(#[source] Arc<io::Error>),
    /// The outbound socket could not be created.
    #[error("failed to open udp socket: {0}")]
    Connect(#[source] Arc<io::Error>),
    /// Building the wire message failed.
    #[error(transparent)]
    Encode(#[from] EncodeError),
    /// The sender already released its socket.
    #[error("sender is closed")]
    Closed,
    /// The sender queue is at capacity.
    #[error("sender queue is full")]
    QueueFull,
}

impl TransportError {
    pub(crate) fn send(err: io::Error) -> Self {
        Self::Send(Arc::new(err))
    }

    pub(crate) fn connect(err: io::Error) -> Self {
        Self::Connect(Arc::new(err))
    }
}

/// Outcome of a single send.
pub type SendResult = Result<(), TransportError>;

/// Callback invoked once a send has been handed to the socket or has failed.
pub type Completion = Box<dyn FnOnce(SendResult) + Send + 'static>;
