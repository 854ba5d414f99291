//! Destination address resolution.
//!
//! Resolution is a cache, not a correctness requirement: a failed lookup
//! yields [`ResolvedAddress::Unresolved`] and the socket leaves resolution to
//! the operating system at send time. Resolved values are immutable; a
//! refresh produces a new sender with a fresh value rather than mutating one
//! in place.

use std::{
    fmt, io,
    net::{IpAddr, SocketAddr, ToSocketAddrs},
    time::Duration,
};

use log::debug;

/// Lower bound for the address refresh and sender rotation interval.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_millis(10_000);

/// User-configured destination.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Destination {
    pub host: String,
    pub port: u16,
}

impl Destination {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Cached result of resolving [`Destination::host`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ResolvedAddress {
    Ip(IpAddr),
    /// Lookup failed; carries the literal host.
    Unresolved(String),
}

impl ResolvedAddress {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolvedAddress::Ip(_))
    }
}

impl fmt::Display for ResolvedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedAddress::Ip(ip) => write!(f, "{ip}"),
            ResolvedAddress::Unresolved(host) => f.write_str(host),
        }
    }
}

/// Forward lookup used by senders.
///
/// Implementations may block; they are only ever called from a sender's
/// worker thread.
pub trait AddressResolver: Send + Sync + fmt::Debug {
    fn lookup(&self, host: &str) -> io::Result<IpAddr>;
}

/// Resolver backed by the system's `getaddrinfo`, restricted to IPv4.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemResolver;

impl AddressResolver for SystemResolver {
    fn lookup(&self, host: &str) -> io::Result<IpAddr> {
        if let Ok(ip) = host.parse::<IpAddr>() {
            return Ok(ip);
        }
        first_ipv4((host, 0).to_socket_addrs()?)
            .map(|addr| addr.ip())
            .ok_or_else(|| no_ipv4_address(host))
    }
}

pub(crate) fn first_ipv4(mut addrs: impl Iterator<Item = SocketAddr>) -> Option<SocketAddr> {
    addrs.find(SocketAddr::is_ipv4)
}

pub(crate) fn no_ipv4_address(host: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::AddrNotAvailable,
        format!("no IPv4 address found for {host}"),
    )
}

/// Resolve `host`, falling back to the literal host on failure.
pub fn resolve_or_fallback(resolver: &dyn AddressResolver, host: &str) -> ResolvedAddress {
    match resolver.lookup(host) {
        Ok(ip) => ResolvedAddress::Ip(ip),
        Err(err) => {
            debug!("address lookup for {host} failed, sending to unresolved host: {err}");
            ResolvedAddress::Unresolved(host.to_owned())
        }
    }
}

/// Raise intervals below [`MIN_REFRESH_INTERVAL`] to the floor.
pub fn clamp_refresh_interval(interval: Duration) -> Duration {
    interval.max(MIN_REFRESH_INTERVAL)
}
