//! Severity levels understood by the transport.
//!
//! Names follow the npm convention used by Logstash shippers so that the
//! `level` field on the wire matches what downstream pipelines expect.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Silly,
    Debug,
    Verbose,
    Http,
    #[default]
    Info,
    Warn,
    Error,
}

/// Returned when a level name is not recognised.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unknown log level {0:?}")]
pub struct ParseLevelError(pub String);

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Silly => "silly",
            Level::Debug => "debug",
            Level::Verbose => "verbose",
            Level::Http => "http",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }

    /// Return `true` when `self`, used as a minimum threshold, accepts `level`.
    pub fn accepts(self, level: Level) -> bool {
        level >= self
    }

    pub fn parse_or_info(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "silly" | "trace" => Ok(Self::Silly),
            "debug" => Ok(Self::Debug),
            "verbose" => Ok(Self::Verbose),
            "http" => Ok(Self::Http),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(ParseLevelError(s.to_owned())),
        }
    }
}
