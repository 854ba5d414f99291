//! Transport configuration and its builder.
//!
//! `TransportBuilder` collects optional overrides, validates them and
//! produces a [`TransportConfig`]. Every option has a default, so
//! `TransportBuilder::new().build()` yields a transport shipping to a
//! Logstash UDP input on `127.0.0.1:5043`.

use std::{env, io, sync::Arc, time::Duration};

use thiserror::Error;

use crate::{
    encoder::LINE_ENDING,
    level::Level,
    log_record::{FieldValue, Fields, fields_from_json},
    rate_limited_warner::DEFAULT_WARN_INTERVAL,
    resolver::{
        AddressResolver, Destination, MIN_REFRESH_INTERVAL, SystemResolver,
        clamp_refresh_interval,
    },
    sender::{DEFAULT_CHANNEL_CAPACITY, SenderConfig},
    transport::LogstashTransport,
};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5043;
pub const DEFAULT_CONN_FLUSH_INTERVAL: Duration = MIN_REFRESH_INTERVAL;

/// Errors that may occur while building a transport.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid user supplied configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),
    /// Underlying I/O error whilst reading configuration.
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("invalid ini configuration: {0}")]
    Ini(#[from] ini::ParseError),
}

/// Resolved transport settings.
#[derive(Clone, Debug)]
pub struct TransportConfig {
    pub destination: Destination,
    /// Interval between sender rotations; never below [`MIN_REFRESH_INTERVAL`].
    pub conn_flush_interval: Duration,
    /// Value of the `application` field.
    pub app_name: String,
    /// Value of the `host` field.
    pub localhost: String,
    /// Static fields merged into every message.
    pub meta: Fields,
    /// Minimum level accepted by framework adapters.
    pub level: Level,
    /// Turn `log` into a no-op.
    pub silent: bool,
    pub line_terminator: String,
    pub capacity: usize,
    pub warn_interval: Duration,
    pub resolver: Arc<dyn AddressResolver>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            destination: Destination::new(DEFAULT_HOST, DEFAULT_PORT),
            conn_flush_interval: DEFAULT_CONN_FLUSH_INTERVAL,
            app_name: default_app_name(),
            localhost: default_hostname(),
            meta: Fields::new(),
            level: Level::Info,
            silent: false,
            line_terminator: LINE_ENDING.to_owned(),
            capacity: DEFAULT_CHANNEL_CAPACITY,
            warn_interval: DEFAULT_WARN_INTERVAL,
            resolver: Arc::new(SystemResolver),
        }
    }
}

impl TransportConfig {
    /// Configuration handed to each sender created by the transport.
    pub fn sender_config(&self) -> SenderConfig {
        SenderConfig {
            destination: self.destination.clone(),
            capacity: self.capacity,
            warn_interval: self.warn_interval,
            resolver: Arc::clone(&self.resolver),
        }
    }
}

/// Name of the running executable, used as the default application name.
pub fn default_app_name() -> String {
    env::current_exe()
        .ok()
        .and_then(|path| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "rust".to_owned())
}

/// Machine hostname as reported by the operating system.
pub fn default_hostname() -> String {
    hostname::get()
        .map(|name| name.to_string_lossy().into_owned())
        .ok()
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_owned())
}

macro_rules! ensure_positive {
    ($value:expr, $field:expr) => {{
        if $value == 0 {
            Err(ConfigError::InvalidConfig(format!(
                "{} must be greater than zero",
                $field
            )))
        } else {
            Ok($value)
        }
    }};
}

macro_rules! option_setter {
    ($(#[$meta:meta])* $fn_name:ident, $field:ident, $ty:ty) => {
        $(#[$meta])*
        pub fn $fn_name(mut self, value: $ty) -> Self {
            self.$field = Some(value);
            self
        }
    };
}

/// Builder for constructing [`LogstashTransport`] instances.
#[derive(Clone, Debug, Default)]
pub struct TransportBuilder {
    host: Option<String>,
    port: Option<u16>,
    conn_flush_interval_ms: Option<u64>,
    app_name: Option<String>,
    localhost: Option<String>,
    meta: Fields,
    level: Option<Level>,
    silent: Option<bool>,
    line_terminator: Option<String>,
    capacity: Option<usize>,
    warn_interval_ms: Option<u64>,
    resolver: Option<Arc<dyn AddressResolver>>,
}

impl TransportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the destination hostname or IP address.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    option_setter!(
        #[doc = "Set the destination UDP port."]
        with_port,
        port,
        u16
    );
    option_setter!(
        #[doc = "Set the rotation interval; values below ten seconds are raised to it."]
        with_conn_flush_interval_ms,
        conn_flush_interval_ms,
        u64
    );
    option_setter!(with_level, level, Level);
    option_setter!(with_silent, silent, bool);
    option_setter!(with_capacity, capacity, usize);
    option_setter!(with_warn_interval_ms, warn_interval_ms, u64);

    /// Set the `application` field written to every message.
    pub fn with_app_name(mut self, app_name: impl Into<String>) -> Self {
        self.app_name = Some(app_name.into());
        self
    }

    /// Set the `host` field written to every message.
    pub fn with_localhost(mut self, localhost: impl Into<String>) -> Self {
        self.localhost = Some(localhost.into());
        self
    }

    pub fn with_line_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.line_terminator = Some(terminator.into());
        self
    }

    /// Merge `meta` into the static metadata.
    pub fn with_meta(mut self, meta: Fields) -> Self {
        self.meta.extend(meta);
        self
    }

    pub fn with_meta_field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Merge a JSON object into the static metadata.
    ///
    /// Nested objects and arrays are dropped; a non-object value is ignored.
    pub fn with_meta_json(mut self, meta: serde_json::Value) -> Self {
        if let serde_json::Value::Object(map) = meta {
            self.meta.extend(fields_from_json(map));
        }
        self
    }

    /// Override the resolver used by every sender.
    pub fn with_resolver(mut self, resolver: Arc<dyn AddressResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(host) = &self.host
            && host.trim().is_empty()
        {
            return Err(ConfigError::InvalidConfig("host must not be empty".into()));
        }
        if let Some(port) = self.port {
            ensure_positive!(port, "port")?;
        }
        if let Some(capacity) = self.capacity {
            ensure_positive!(capacity, "capacity")?;
        }
        if let Some(interval) = self.warn_interval_ms {
            ensure_positive!(interval, "warn_interval_ms")?;
        }
        Ok(())
    }

    /// Validate the overrides and produce a configuration.
    pub fn build_config(&self) -> Result<TransportConfig, ConfigError> {
        self.validate()?;
        let mut config = TransportConfig::default();
        if let Some(host) = &self.host {
            config.destination.host = host.trim().to_owned();
        }
        if let Some(port) = self.port {
            config.destination.port = port;
        }
        if let Some(ms) = self.conn_flush_interval_ms {
            config.conn_flush_interval = clamp_refresh_interval(Duration::from_millis(ms));
        }
        if let Some(app_name) = &self.app_name {
            config.app_name = app_name.clone();
        }
        if let Some(localhost) = &self.localhost {
            config.localhost = localhost.clone();
        }
        config.meta = self.meta.clone();
        if let Some(level) = self.level {
            config.level = level;
        }
        if let Some(silent) = self.silent {
            config.silent = silent;
        }
        if let Some(terminator) = &self.line_terminator {
            config.line_terminator = terminator.clone();
        }
        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(ms) = self.warn_interval_ms {
            config.warn_interval = Duration::from_millis(ms);
        }
        if let Some(resolver) = &self.resolver {
            config.resolver = Arc::clone(resolver);
        }
        Ok(config)
    }

    /// Build the transport; its first sender starts resolving immediately.
    pub fn build(&self) -> Result<LogstashTransport, ConfigError> {
        Ok(LogstashTransport::new(self.build_config()?))
    }
}
