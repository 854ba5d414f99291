//! INI loading for [`TransportBuilder`].
//!
//! A single section supplies the transport options:
//!
//! ```ini
//! [logstash]
//! host = logs.internal
//! port = 5043
//! connFlushInterval = 30000
//! appName = billing
//! level = debug
//! silent = false
//! localhost = web-01
//! meta.team = payments
//! meta.shard = 3
//! ```
//!
//! Keys are matched exactly. `meta.<name>` values are read as JSON scalars
//! where possible (`3`, `true`, `null`) and as plain strings otherwise.

use std::{fs, path::Path};

use ini::Ini;

use crate::{
    config::{ConfigError, TransportBuilder},
    level::Level,
    log_record::FieldValue,
};

const META_PREFIX: &str = "meta.";

impl TransportBuilder {
    /// Build a builder from `section` of an INI document.
    pub fn from_ini_str(text: &str, section: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text)?;
        let props = ini.section(Some(section)).ok_or_else(|| {
            ConfigError::InvalidConfig(format!("section [{section}] not found"))
        })?;
        props
            .iter()
            .try_fold(Self::new(), |builder, (key, value)| {
                apply_key(builder, key, value.trim())
            })
    }

    /// Read `path` and build a builder from `section`.
    pub fn from_ini_file(path: impl AsRef<Path>, section: &str) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_ini_str(&text, section)
    }
}

fn apply_key(builder: TransportBuilder, key: &str, value: &str) -> Result<TransportBuilder, ConfigError> {
    if let Some(name) = key.strip_prefix(META_PREFIX) {
        if name.is_empty() {
            return Err(invalid(key, value, "meta key needs a name"));
        }
        return Ok(builder.with_meta_field(name, meta_value(value)));
    }
    let builder = match key {
        "host" => builder.with_host(value),
        "port" => builder.with_port(parse_number(key, value)?),
        "connFlushInterval" => builder.with_conn_flush_interval_ms(parse_number(key, value)?),
        "appName" => builder.with_app_name(value),
        "level" => builder.with_level(
            value
                .parse::<Level>()
                .map_err(|err| invalid(key, value, &err.to_string()))?,
        ),
        "silent" => builder.with_silent(parse_bool(key, value)?),
        "localhost" => builder.with_localhost(value),
        _ => {
            return Err(ConfigError::InvalidConfig(format!(
                "unknown key {key:?}"
            )));
        }
    };
    Ok(builder)
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| invalid(key, value, "expected a non-negative integer"))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(invalid(key, value, "expected a boolean")),
    }
}

fn meta_value(value: &str) -> FieldValue {
    serde_json::from_str::<serde_json::Value>(value)
        .ok()
        .and_then(|json| FieldValue::from_json(json).ok())
        .unwrap_or_else(|| FieldValue::from(value))
}

fn invalid(key: &str, value: &str, reason: &str) -> ConfigError {
    ConfigError::InvalidConfig(format!("{key} = {value:?}: {reason}"))
}
