//! Observable outcomes of `log` calls.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;

use crate::{error::TransportError, log_record::LogRecord};

/// Event published after a record has been handed to the socket or failed.
#[derive(Clone, Debug)]
pub enum TransportEvent {
    /// The record was accepted by the local network stack.
    Logged(Arc<LogRecord>),
    /// The record could not be sent.
    Warn(TransportError),
}

/// Fan-out of events to any number of subscribers.
///
/// Publishing with no subscribers is a no-op; subscribers whose receiver has
/// been dropped are pruned on the next publish.
#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Mutex<Vec<Sender<TransportEvent>>>,
}

impl EventBus {
    pub(crate) fn subscribe(&self) -> Receiver<TransportEvent> {
        let (tx, rx) = unbounded();
        self.subscribers.lock().push(tx);
        rx
    }

    pub(crate) fn publish(&self, event: TransportEvent) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    #[cfg(test)]
    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
