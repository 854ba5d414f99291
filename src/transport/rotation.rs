//! Periodic sender rotation.
//!
//! The rotation task is a thread parked on a cancellation channel. Each
//! timeout rotates the transport's sender; a message on the channel, or the
//! handle being dropped, ends the task.

use std::{
    sync::Weak,
    thread::{self, JoinHandle},
    time::Duration,
};

use crossbeam_channel::{RecvTimeoutError, Sender, bounded};
use log::warn;

use super::Inner;

/// Owned handle to a running rotation task.
#[derive(Debug)]
pub(crate) struct RotationHandle {
    cancel_tx: Sender<()>,
    handle: JoinHandle<()>,
}

impl RotationHandle {
    pub(crate) fn spawn(inner: Weak<Inner>, interval: Duration) -> Self {
        let (cancel_tx, cancel_rx) = bounded(1);
        let handle = thread::spawn(move || {
            loop {
                match cancel_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => {
                        let Some(inner) = inner.upgrade() else {
                            break;
                        };
                        inner.rotate();
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
        });
        Self { cancel_tx, handle }
    }

    /// Stop the task and wait for it to exit.
    pub(crate) fn cancel(self) {
        let _ = self.cancel_tx.try_send(());
        if self.handle.join().is_err() {
            warn!("logstash udp rotation thread panicked");
        }
    }
}
