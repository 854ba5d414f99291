//! Logstash UDP transport.
//!
//! [`LogstashTransport`] is the object a logging pipeline talks to. It owns
//! the encoder, exactly one active [`UdpSender`], and a rotation task that
//! periodically replaces the active sender so that no socket/address pairing
//! outlives one refresh interval. A retired sender drains in the background;
//! records logged after a rotation go to the new sender and carry no ordering
//! guarantee relative to those still draining.

mod events;
mod rotation;


use std::{
    mem,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use log::warn;
use parking_lot::Mutex;

use crossbeam_channel::Receiver;

use crate::{
    config::{TransportBuilder, TransportConfig},
    encoder::{LogRecordEncoder, frame_message},
    error::{SendResult, TransportError},
    level::Level,
    log_record::LogRecord,
    sender::UdpSender,
};

pub use events::TransportEvent;

use events::EventBus;
use rotation::RotationHandle;

/// State shared with the rotation task.
#[derive(Debug)]
pub(crate) struct Inner {
    config: TransportConfig,
    encoder: LogRecordEncoder,
    active: Mutex<Arc<UdpSender>>,
    events: EventBus,
    closed: AtomicBool,
}

impl Inner {
    fn current(&self) -> Arc<UdpSender> {
        Arc::clone(&self.active.lock())
    }

    /// Install a new sender and gracefully retire the previous one.
    pub(crate) fn rotate(&self) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        let fresh = Arc::new(UdpSender::with_config(self.config.sender_config()));
        let retired = {
            let mut active = self.active.lock();
            if self.closed.load(Ordering::Acquire) {
                drop(active);
                fresh.force_shutdown();
                return;
            }
            mem::replace(&mut *active, fresh)
        };
        retired.shutdown();
    }

    fn close(&self) {
        let active = self.active.lock();
        self.closed.store(true, Ordering::Release);
        active.force_shutdown();
    }
}

/// Structured log sink shipping JSON datagrams to a Logstash UDP input.
#[derive(Debug)]
pub struct LogstashTransport {
    inner: Arc<Inner>,
    rotation: Mutex<Option<RotationHandle>>,
}

impl LogstashTransport {
    pub fn new(config: TransportConfig) -> Self {
        let encoder = LogRecordEncoder::new(&config.meta, &config.localhost, &config.app_name);
        let sender = Arc::new(UdpSender::with_config(config.sender_config()));
        let interval = config.conn_flush_interval;
        let inner = Arc::new(Inner {
            config,
            encoder,
            active: Mutex::new(sender),
            events: EventBus::default(),
            closed: AtomicBool::new(false),
        });
        let rotation = RotationHandle::spawn(Arc::downgrade(&inner), interval);
        Self {
            inner,
            rotation: Mutex::new(Some(rotation)),
        }
    }

    pub fn builder() -> TransportBuilder {
        TransportBuilder::new()
    }

    pub fn config(&self) -> &TransportConfig {
        &self.inner.config
    }

    pub fn encoder(&self) -> &LogRecordEncoder {
        &self.inner.encoder
    }

    /// Whether the configured minimum level accepts `level`.
    pub fn enabled(&self, level: Level) -> bool {
        self.inner.config.level.accepts(level)
    }

    /// Receive `logged` and `warn` events for subsequent records.
    pub fn subscribe(&self) -> Receiver<TransportEvent> {
        self.inner.events.subscribe()
    }

    /// Log `record`, ignoring the outcome beyond published events.
    pub fn log(&self, record: LogRecord) {
        self.log_with(record, |_| {});
    }

    /// Log `record` and run `callback` once the outcome is known.
    ///
    /// Returns immediately. In silent mode the callback receives `Ok(())`
    /// without any network activity or events. Encoding failures are
    /// reported to the callback only; send outcomes are reported to the
    /// callback and published as [`TransportEvent`]s.
    pub fn log_with<F>(&self, record: LogRecord, callback: F)
    where
        F: FnOnce(SendResult) + Send + 'static,
    {
        if self.inner.config.silent {
            callback(Ok(()));
            return;
        }
        let message = match self.inner.encoder.encode(&record) {
            Ok(message) => message,
            Err(err) => {
                warn!("logstash udp transport failed to encode record: {err}");
                callback(Err(TransportError::from(err)));
                return;
            }
        };
        let record = Arc::new(record);
        let inner = Arc::downgrade(&self.inner);
        self.dispatch(&message, move |result| {
            if let Some(inner) = inner.upgrade() {
                let event = match &result {
                    Ok(()) => TransportEvent::Logged(record),
                    Err(err) => TransportEvent::Warn(err.clone()),
                };
                inner.events.publish(event);
            }
            callback(result);
        });
    }

    /// Frame an already built message and hand it to the active sender.
    ///
    /// No events are published for raw messages.
    pub fn send_message<F>(&self, message: &str, callback: F)
    where
        F: FnOnce(SendResult) + Send + 'static,
    {
        if self.inner.config.silent {
            callback(Ok(()));
            return;
        }
        self.dispatch(message, callback);
    }

    fn dispatch<F>(&self, message: &str, callback: F)
    where
        F: FnOnce(SendResult) + Send + 'static,
    {
        let payload = frame_message(message, &self.inner.config.line_terminator);
        self.inner.current().send(payload, callback);
    }

    /// Replace the active sender now, draining the old one.
    pub fn rotate(&self) {
        self.inner.rotate();
    }

    /// The sender currently accepting messages.
    pub fn active_sender(&self) -> Arc<UdpSender> {
        self.inner.current()
    }

    /// Stop rotating and tear down the active sender immediately.
    ///
    /// Queued messages may be dropped. Safe to call more than once.
    pub fn shutdown(&self) {
        if let Some(rotation) = self.rotation.lock().take() {
            rotation.cancel();
        }
        self.inner.close();
    }
}

impl Drop for LogstashTransport {
    fn drop(&mut self) {
        self.shutdown();
    }
}
