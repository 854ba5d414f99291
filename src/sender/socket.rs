//! Outbound datagram socket owned by a sender worker.

use std::{
    io,
    net::{Ipv4Addr, SocketAddr, ToSocketAddrs, UdpSocket},
};

use log::debug;

use crate::resolver::{ResolvedAddress, first_ipv4, no_ipv4_address};

/// IPv4 UDP socket with a standing handler for asynchronous errors.
///
/// The socket is released when the value is dropped; the worker owns the only
/// instance, so release happens exactly once.
#[derive(Debug)]
pub(crate) struct DatagramSocket {
    socket: UdpSocket,
}

impl DatagramSocket {
    pub(crate) fn open() -> io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        Ok(Self { socket })
    }

    /// Hand one datagram to the network stack.
    pub(crate) fn send_to(
        &self,
        payload: &[u8],
        address: &ResolvedAddress,
        port: u16,
    ) -> io::Result<()> {
        let target = target_addr(address, port)?;
        let written = self.socket.send_to(payload, target);
        self.drain_async_error();
        let written = written?;
        if written != payload.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("datagram truncated: wrote {written} of {} bytes", payload.len()),
            ));
        }
        Ok(())
    }

    /// Consume any error the OS queued on the socket, such as an ICMP
    /// unreachable for an earlier datagram. These are not tied to the
    /// datagram being sent and are only logged.
    fn drain_async_error(&self) {
        match self.socket.take_error() {
            Ok(Some(err)) => debug!("logstash udp socket reported an asynchronous error: {err}"),
            Ok(None) => {}
            Err(err) => debug!("logstash udp socket error state unavailable: {err}"),
        }
    }

    #[cfg(test)]
    pub(crate) fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

fn target_addr(address: &ResolvedAddress, port: u16) -> io::Result<SocketAddr> {
    match address {
        ResolvedAddress::Ip(ip) => Ok(SocketAddr::new(*ip, port)),
        ResolvedAddress::Unresolved(host) => {
            first_ipv4((host.as_str(), port).to_socket_addrs()?)
                .ok_or_else(|| no_ipv4_address(host))
        }
    }
}
