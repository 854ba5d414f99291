//! Compatibility bridge for the Rust `log` crate.
//!
//! [`LogstashLogAdapter`] implements `log::Log` over a shared
//! [`LogstashTransport`], so existing `log::info!` call sites ship to
//! Logstash. Key-value pairs attached to a record become splat fields.
//! Records emitted by this crate's own diagnostics are ignored to keep them
//! from looping back into the transport.

use std::sync::Arc;

use log::{
    LevelFilter, Metadata, Record, SetLoggerError,
    kv::{self, VisitSource},
};

use crate::{
    level::Level,
    log_record::{FieldValue, Fields, LogRecord},
    transport::LogstashTransport,
};

const OWN_TARGET: &str = env!("CARGO_CRATE_NAME");

/// Adapter implementing the Rust `log::Log` trait.
#[derive(Debug, Clone)]
pub struct LogstashLogAdapter {
    transport: Arc<LogstashTransport>,
}

fn map_log_level(level: log::Level) -> Level {
    match level {
        log::Level::Trace => Level::Silly,
        log::Level::Debug => Level::Debug,
        log::Level::Info => Level::Info,
        log::Level::Warn => Level::Warn,
        log::Level::Error => Level::Error,
    }
}

/// The most permissive `log` filter that can still produce records the
/// transport accepts at `level`.
fn max_level_filter(level: Level) -> LevelFilter {
    match level {
        Level::Silly => LevelFilter::Trace,
        Level::Debug => LevelFilter::Debug,
        Level::Verbose | Level::Http | Level::Info => LevelFilter::Info,
        Level::Warn => LevelFilter::Warn,
        Level::Error => LevelFilter::Error,
    }
}

impl From<log::Level> for Level {
    fn from(level: log::Level) -> Self {
        map_log_level(level)
    }
}

fn is_own_target(target: &str) -> bool {
    target
        .strip_prefix(OWN_TARGET)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

#[derive(Default)]
struct FieldCollector {
    fields: Fields,
}

impl<'kvs> VisitSource<'kvs> for FieldCollector {
    fn visit_pair(&mut self, key: kv::Key<'kvs>, value: kv::Value<'kvs>) -> Result<(), kv::Error> {
        self.fields
            .insert(key.as_str().to_owned(), field_value(&value));
        Ok(())
    }
}

fn field_value(value: &kv::Value<'_>) -> FieldValue {
    if let Some(b) = value.to_bool() {
        FieldValue::Bool(b)
    } else if let Some(i) = value.to_i64() {
        FieldValue::Int(i)
    } else if let Some(u) = value.to_u64() {
        FieldValue::UInt(u)
    } else if let Some(f) = value.to_f64() {
        FieldValue::Float(f)
    } else if let Some(s) = value.to_borrowed_str() {
        FieldValue::Str(s.to_owned())
    } else {
        FieldValue::Str(value.to_string())
    }
}

impl LogstashLogAdapter {
    pub fn new(transport: Arc<LogstashTransport>) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &Arc<LogstashTransport> {
        &self.transport
    }

    fn convert(record: &Record<'_>) -> LogRecord {
        let mut collector = FieldCollector::default();
        // A failing source only loses its remaining pairs.
        let _ = record.key_values().visit(&mut collector);
        let converted = LogRecord::new(record.level().into(), record.args().to_string());
        if collector.fields.is_empty() {
            converted
        } else {
            converted.with_fields(collector.fields)
        }
    }
}

impl log::Log for LogstashLogAdapter {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        !is_own_target(metadata.target()) && self.transport.enabled(metadata.level().into())
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        self.transport.log(Self::convert(record));
    }

    fn flush(&self) {}
}

/// Install an adapter over `transport` as the global Rust logger.
///
/// Fails when another global logger is already set. The `log` max level is
/// derived from the transport's configured level.
pub fn install(transport: Arc<LogstashTransport>) -> Result<(), SetLoggerError> {
    let filter = max_level_filter(transport.config().level);
    let adapter: &'static LogstashLogAdapter =
        Box::leak(Box::new(LogstashLogAdapter::new(transport)));
    log::set_logger(adapter)?;
    log::set_max_level(filter);
    Ok(())
}
