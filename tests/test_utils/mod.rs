//! Shared fixtures for integration tests: a loopback UDP listener standing in
//! for a Logstash input, and builders pointed at it.

use std::{net::UdpSocket, time::Duration};

use logstash_udp::{Destination, TransportBuilder};
use rstest::fixture;

pub const TIMEOUT: Duration = Duration::from_secs(2);

/// Loopback socket receiving what the transport sends.
pub struct Listener {
    socket: UdpSocket,
}

impl Listener {
    pub fn port(&self) -> u16 {
        self.socket.local_addr().expect("listener address").port()
    }

    pub fn destination(&self) -> Destination {
        Destination::new("127.0.0.1", self.port())
    }

    /// Builder with fixed identity fields targeting this listener.
    pub fn builder(&self) -> TransportBuilder {
        TransportBuilder::new()
            .with_port(self.port())
            .with_app_name("test")
            .with_localhost("localhost")
    }

    /// Wait for the next datagram and return its raw bytes.
    pub fn recv_bytes(&self) -> Vec<u8> {
        let mut buf = [0u8; 8192];
        let (len, _) = self.socket.recv_from(&mut buf).expect("datagram received");
        buf[..len].to_vec()
    }

    pub fn recv_text(&self) -> String {
        String::from_utf8(self.recv_bytes()).expect("utf-8 datagram")
    }

    /// Receive one datagram and parse it as a JSON object.
    pub fn recv_json(&self) -> serde_json::Map<String, serde_json::Value> {
        match serde_json::from_str(self.recv_text().trim_end()).expect("json datagram") {
            serde_json::Value::Object(map) => map,
            other => panic!("expected a JSON object, got {other}"),
        }
    }
}

#[fixture]
pub fn listener() -> Listener {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("bind listener");
    socket
        .set_read_timeout(Some(TIMEOUT))
        .expect("set read timeout");
    Listener { socket }
}
