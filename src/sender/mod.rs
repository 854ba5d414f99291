//! Single-socket UDP sender.
//!
//! A [`UdpSender`] owns one consumer thread and, lazily, one UDP socket. The
//! handle enqueues framed datagrams on a bounded channel; the worker resolves
//! the destination once, opens the socket on the first datagram, and hands
//! datagrams to the socket strictly one at a time in submission order.
//!
//! Two teardown modes exist. [`UdpSender::shutdown`] marks the sender as
//! draining: queued datagrams are still sent and the socket is released once
//! the queue runs dry. [`UdpSender::force_shutdown`] discards whatever is
//! still queued and releases the socket as soon as the datagram currently in
//! flight, if any, completes.

mod config;
mod handle;
mod socket;
mod state;
mod worker;


pub use config::{DEFAULT_CHANNEL_CAPACITY, SenderConfig};
pub use handle::UdpSender;
pub use state::SenderState;
