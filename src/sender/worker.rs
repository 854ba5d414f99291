//! Worker thread driving a sender's socket.
//!
//! The worker is the only code touching the socket, which is what makes
//! dispatch single-flight: one datagram is handed to the socket, its
//! completion runs, and only then is the next command received.

use std::{sync::Arc, thread};

use crossbeam_channel::{Receiver, Sender, bounded};
use log::debug;

use crate::{
    error::{Completion, SendResult, TransportError},
    resolver::{AddressResolver, Destination, ResolvedAddress, resolve_or_fallback},
};

use super::{
    config::SenderConfig,
    socket::DatagramSocket,
    state::{SenderState, Shared},
};

/// A framed datagram waiting for the socket, together with its completion.
///
/// Completions run exactly once. A message dropped without being completed
/// or discarded (for example because it raced the worker's exit) reports
/// [`TransportError::Closed`].
pub(crate) struct PendingMessage {
    payload: Vec<u8>,
    completion: Option<Completion>,
}

impl PendingMessage {
    pub(crate) fn new(payload: Vec<u8>, completion: Completion) -> Self {
        Self {
            payload,
            completion: Some(completion),
        }
    }

    pub(crate) fn complete(mut self, result: SendResult) {
        if let Some(completion) = self.completion.take() {
            completion(result);
        }
    }

    /// Drop the message without running its completion.
    pub(crate) fn discard(mut self) {
        self.completion = None;
    }
}

impl Drop for PendingMessage {
    fn drop(&mut self) {
        if let Some(completion) = self.completion.take() {
            completion(Err(TransportError::Closed));
        }
    }
}

impl std::fmt::Debug for PendingMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingMessage")
            .field("len", &self.payload.len())
            .finish()
    }
}

/// Commands processed by the worker thread.
#[derive(Debug)]
pub(crate) enum SenderCommand {
    Datagram(PendingMessage),
    /// Wakes an idle worker so it notices a drain request.
    Drain,
}

/// Spawn the worker, returning the command sender and a channel that
/// receives one message once the socket has been released.
pub(crate) fn spawn_worker(
    config: SenderConfig,
    shared: Arc<Shared>,
) -> (Sender<SenderCommand>, Receiver<()>) {
    let (tx, rx) = bounded(config.capacity);
    let (done_tx, done_rx) = bounded(1);
    thread::spawn(move || {
        Worker::new(config, shared).run(rx);
        let _ = done_tx.send(());
    });
    (tx, done_rx)
}

struct Worker {
    destination: Destination,
    resolver: Arc<dyn AddressResolver>,
    shared: Arc<Shared>,
    socket: Option<DatagramSocket>,
}

impl Worker {
    fn new(config: SenderConfig, shared: Arc<Shared>) -> Self {
        Self {
            destination: config.destination,
            resolver: config.resolver,
            shared,
            socket: None,
        }
    }

    fn run(mut self, rx: Receiver<SenderCommand>) {
        // Resolve before the first receive so DNS latency is never charged to
        // whoever happens to log first.
        let address = resolve_or_fallback(self.resolver.as_ref(), &self.destination.host);
        debug!(
            "logstash udp sender resolved {} to {address}",
            self.destination
        );

        while !self.shared.is_killed() {
            let Ok(command) = rx.recv() else {
                break;
            };
            match command {
                SenderCommand::Datagram(message) if self.shared.is_killed() => message.discard(),
                SenderCommand::Datagram(message) => self.dispatch(message, &address),
                SenderCommand::Drain => {}
            }
            if self.shared.is_draining() && rx.is_empty() {
                break;
            }
        }
        self.finish(&rx, &address);
    }

    fn dispatch(&mut self, message: PendingMessage, address: &ResolvedAddress) {
        let port = self.destination.port;
        let result = match self.socket() {
            Ok(socket) => socket
                .send_to(&message.payload, address, port)
                .map_err(TransportError::send),
            Err(err) => Err(err),
        };
        message.complete(result);
    }

    fn socket(&mut self) -> Result<&DatagramSocket, TransportError> {
        if self.socket.is_none() {
            self.shared
                .advance(SenderState::Fresh, SenderState::Connecting);
            let socket = DatagramSocket::open().map_err(TransportError::connect)?;
            self.shared
                .advance(SenderState::Connecting, SenderState::Active);
            self.socket = Some(socket);
        }
        self.socket
            .as_ref()
            .ok_or_else(|| TransportError::connect(std::io::ErrorKind::NotConnected.into()))
    }

    /// Settle anything still queued and release the socket.
    ///
    /// After a graceful drain, datagrams that slipped in behind the drain
    /// check are still sent; after a forced shutdown they are discarded.
    fn finish(mut self, rx: &Receiver<SenderCommand>, address: &ResolvedAddress) {
        let killed = self.shared.is_killed();
        while let Ok(command) = rx.try_recv() {
            if let SenderCommand::Datagram(message) = command {
                if killed {
                    message.discard();
                } else {
                    self.dispatch(message, address);
                }
            }
        }
        self.socket = None;
        self.shared.mark_released();
        debug!(
            "logstash udp sender for {} released its socket",
            self.destination
        );
    }
}

#[cfg(test)]
mod tests {
    use std::{
        net::{IpAddr, Ipv4Addr, UdpSocket},
        time::Duration,
    };

    use crossbeam_channel::unbounded;
    use rstest::rstest;

    use super::*;

    fn queued(payloads: &[&str]) -> (Receiver<SenderCommand>, Receiver<SendResult>) {
        let (tx, rx) = unbounded();
        let (done_tx, done_rx) = unbounded();
        for payload in payloads {
            let done_tx = done_tx.clone();
            let message = PendingMessage::new(
                payload.as_bytes().to_vec(),
                Box::new(move |result| {
                    let _ = done_tx.send(result);
                }),
            );
            tx.send(SenderCommand::Datagram(message))
                .expect("queue datagram");
        }
        (rx, done_rx)
    }

    fn worker_for(receiver: &UdpSocket, shared: &Arc<Shared>) -> Worker {
        let port = receiver.local_addr().expect("receiver address").port();
        Worker::new(
            SenderConfig::new(Destination::new("127.0.0.1", port)),
            Arc::clone(shared),
        )
    }

    #[rstest]
    fn drained_worker_still_sends_stragglers() {
        let receiver = UdpSocket::bind("127.0.0.1:0").expect("bind receiver");
        receiver
            .set_read_timeout(Some(Duration::from_secs(2)))
            .expect("set timeout");
        let shared = Arc::new(Shared::new());
        shared.request_drain();
        let (rx, results) = queued(&["late-1", "late-2"]);

        let address = ResolvedAddress::Ip(IpAddr::V4(Ipv4Addr::LOCALHOST));
        worker_for(&receiver, &shared).finish(&rx, &address);

        assert!(results.try_recv().expect("first completion").is_ok());
        assert!(results.try_recv().expect("second completion").is_ok());
        let mut buf = [0u8; 16];
        let (len, _) = receiver.recv_from(&mut buf).expect("datagram");
        assert_eq!(&buf[..len], b"late-1");
        assert_eq!(shared.state(), SenderState::Closed);
    }

    #[rstest]
    fn killed_worker_discards_stragglers() {
        let receiver = UdpSocket::bind("127.0.0.1:0").expect("bind receiver");
        let shared = Arc::new(Shared::new());
        shared.request_kill();
        let (rx, results) = queued(&["gone"]);

        let address = ResolvedAddress::Ip(IpAddr::V4(Ipv4Addr::LOCALHOST));
        worker_for(&receiver, &shared).finish(&rx, &address);

        assert!(results.try_recv().is_err());
        assert_eq!(shared.state(), SenderState::Killed);
    }
}
