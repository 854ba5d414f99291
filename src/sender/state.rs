//! Lifecycle state shared between a sender handle and its worker.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Observable lifecycle of a [`UdpSender`](super::UdpSender).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SenderState {
    /// Constructed; no socket yet.
    Fresh = 0,
    /// Opening the socket for the first datagram.
    Connecting = 1,
    /// Socket open and accepting datagrams.
    Active = 2,
    /// Graceful shutdown requested; the queue is being drained.
    Draining = 3,
    /// Socket released after a graceful drain.
    Closed = 4,
    /// Socket released by a forced shutdown.
    Killed = 5,
}

impl SenderState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Self::Fresh,
            1 => Self::Connecting,
            2 => Self::Active,
            3 => Self::Draining,
            4 => Self::Closed,
            _ => Self::Killed,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Killed)
    }
}

/// Flags and state visible to both sides of a sender.
#[derive(Debug)]
pub(crate) struct Shared {
    state: AtomicU8,
    draining: AtomicBool,
    killed: AtomicBool,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(SenderState::Fresh as u8),
            draining: AtomicBool::new(false),
            killed: AtomicBool::new(false),
        }
    }

    pub(crate) fn state(&self) -> SenderState {
        SenderState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Move from `from` to `to`; returns `false` if another transition won.
    pub(crate) fn advance(&self, from: SenderState, to: SenderState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn request_drain(&self) {
        self.draining.store(true, Ordering::Release);
        self.transition_unless_terminal(|state| match state {
            SenderState::Fresh | SenderState::Connecting | SenderState::Active => {
                Some(SenderState::Draining)
            }
            _ => None,
        });
    }

    /// Returns `true` on the first call only. The state becomes
    /// [`SenderState::Killed`] once the worker has released the socket.
    pub(crate) fn request_kill(&self) -> bool {
        !self.killed.swap(true, Ordering::AcqRel)
    }

    pub(crate) fn is_draining(&self) -> bool {
        self.draining.load(Ordering::Acquire)
    }

    pub(crate) fn is_killed(&self) -> bool {
        self.killed.load(Ordering::Acquire)
    }

    /// Record the terminal state once the worker has released the socket.
    pub(crate) fn mark_released(&self) {
        let terminal = if self.is_killed() {
            SenderState::Killed
        } else {
            SenderState::Closed
        };
        self.transition_unless_terminal(|_| Some(terminal));
    }

    fn transition_unless_terminal(&self, next: impl Fn(SenderState) -> Option<SenderState>) {
        let _ = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |raw| {
                let current = SenderState::from_u8(raw);
                if current.is_terminal() {
                    return None;
                }
                next(current).map(|state| state as u8)
            });
    }
}
