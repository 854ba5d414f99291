//! Public sender handle.

use std::{sync::Arc, time::Duration};

use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::warn;
use parking_lot::RwLock;

use crate::{
    error::{SendResult, TransportError},
    rate_limited_warner::{DropReason, RateLimitedWarner},
    resolver::Destination,
};

use super::{
    config::SenderConfig,
    state::{SenderState, Shared},
    worker::{PendingMessage, SenderCommand, spawn_worker},
};

/// Owner of one outbound UDP socket and its ordered send queue.
pub struct UdpSender {
    tx: RwLock<Option<Sender<SenderCommand>>>,
    done_rx: Receiver<()>,
    shared: Arc<Shared>,
    warner: RateLimitedWarner,
    destination: Destination,
}

impl UdpSender {
    /// Construct a sender targeting `destination` with default configuration.
    pub fn new(destination: Destination) -> Self {
        Self::with_config(SenderConfig::new(destination))
    }

    /// Construct the sender from a configuration object.
    ///
    /// The worker starts resolving the destination immediately; this call
    /// does not wait for it.
    pub fn with_config(config: SenderConfig) -> Self {
        let warner = RateLimitedWarner::new(config.warn_interval);
        let destination = config.destination.clone();
        let shared = Arc::new(Shared::new());
        let (tx, done_rx) = spawn_worker(config, Arc::clone(&shared));
        Self {
            tx: RwLock::new(Some(tx)),
            done_rx,
            shared,
            warner,
            destination,
        }
    }

    pub fn destination(&self) -> &Destination {
        &self.destination
    }

    pub fn state(&self) -> SenderState {
        self.shared.state()
    }

    /// Queue `payload` for delivery.
    ///
    /// Never blocks. `callback` runs exactly once: on the worker thread after
    /// the socket accepted or rejected the datagram, or on the calling thread
    /// when the message cannot be queued. The only exception is a message
    /// discarded by [`force_shutdown`](Self::force_shutdown), whose callback
    /// is dropped without running.
    pub fn send<F>(&self, payload: Vec<u8>, callback: F)
    where
        F: FnOnce(SendResult) + Send + 'static,
    {
        let message = PendingMessage::new(payload, Box::new(callback));
        let guard = self.tx.read();
        let Some(tx) = guard.as_ref() else {
            drop(guard);
            self.report_drop(DropReason::Closed);
            message.complete(Err(TransportError::Closed));
            return;
        };
        match tx.try_send(SenderCommand::Datagram(message)) {
            Ok(()) => {}
            Err(TrySendError::Full(command)) => {
                drop(guard);
                self.report_drop(DropReason::QueueFull);
                fail_command(command, TransportError::QueueFull);
            }
            Err(TrySendError::Disconnected(command)) => {
                drop(guard);
                self.report_drop(DropReason::Closed);
                fail_command(command, TransportError::Closed);
            }
        }
    }

    /// Request a graceful shutdown.
    ///
    /// The sender keeps draining its queue and releases the socket once the
    /// queue is empty. Messages sent after the socket is released complete
    /// with [`TransportError::Closed`].
    pub fn shutdown(&self) {
        self.shared.request_drain();
        if let Some(tx) = self.tx.read().as_ref() {
            // A full queue means the worker is busy and will observe the
            // drain flag after its next datagram.
            let _ = tx.try_send(SenderCommand::Drain);
        }
    }

    /// Discard queued messages and release the socket as soon as the
    /// datagram in flight, if any, completes. Safe to call repeatedly.
    pub fn force_shutdown(&self) {
        if self.shared.request_kill() {
            self.warner.flush(|counts| {
                warn!(
                    "logstash udp sender for {} dropped {counts}",
                    self.destination
                );
            });
        }
        self.tx.write().take();
    }

    /// Wait until the socket has been released, returning `false` on timeout.
    pub fn wait_closed(&self, timeout: Duration) -> bool {
        if self.state().is_terminal() {
            return true;
        }
        self.done_rx.recv_timeout(timeout).is_ok() || self.state().is_terminal()
    }

    fn report_drop(&self, reason: DropReason) {
        self.warner.record_drop(reason);
        self.warner.warn_if_due(|counts| {
            warn!(
                "logstash udp sender for {} dropped {counts}",
                self.destination
            );
        });
    }
}

fn fail_command(command: SenderCommand, err: TransportError) {
    if let SenderCommand::Datagram(message) = command {
        message.complete(Err(err));
    }
}

impl Drop for UdpSender {
    /// Dropping the handle disconnects the queue; the worker finishes what is
    /// already queued and then releases the socket.
    fn drop(&mut self) {
        self.shared.request_drain();
        self.tx.get_mut().take();
    }
}

impl std::fmt::Debug for UdpSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpSender")
            .field("destination", &self.destination)
            .field("state", &self.state())
            .finish()
    }
}
