//! Configuration consumed by [`UdpSender`](super::UdpSender).

use std::{sync::Arc, time::Duration};

use crate::{
    rate_limited_warner::DEFAULT_WARN_INTERVAL,
    resolver::{AddressResolver, Destination, SystemResolver},
};

/// Default bounded channel capacity used by each sender.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

#[derive(Clone, Debug)]
pub struct SenderConfig {
    pub destination: Destination,
    pub capacity: usize,
    pub warn_interval: Duration,
    pub resolver: Arc<dyn AddressResolver>,
}

impl SenderConfig {
    pub fn new(destination: Destination) -> Self {
        Self {
            destination,
            capacity: DEFAULT_CHANNEL_CAPACITY,
            warn_interval: DEFAULT_WARN_INTERVAL,
            resolver: Arc::new(SystemResolver),
        }
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn AddressResolver>) -> Self {
        self.resolver = resolver;
        self
    }
}
