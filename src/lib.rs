//! Structured logging over UDP to a Logstash input.
//!
//! Records are encoded as one JSON object per datagram, terminated by a line
//! ending, and handed to a background sender that preserves submission order.
//!
//! ```no_run
//! use logstash_udp::{Level, LogRecord, LogstashTransport};
//!
//! let transport = LogstashTransport::builder()
//!     .with_host("logs.internal")
//!     .with_port(5043)
//!     .with_app_name("billing")
//!     .build()?;
//! transport.log(LogRecord::new(Level::Info, "invoice sent").with_field("invoice", 42));
//! # Ok::<(), logstash_udp::ConfigError>(())
//! ```

pub mod config;
pub mod encoder;
pub mod error;
mod file_config;
pub mod level;
#[cfg(feature = "log-compat")]
pub mod log_compat;
pub mod log_record;
pub mod rate_limited_warner;
pub mod resolver;
pub mod sender;
pub mod transport;

pub use config::{ConfigError, TransportBuilder, TransportConfig};
pub use encoder::{EncodeError, LINE_ENDING, LogRecordEncoder, frame_message};
pub use error::{Completion, SendResult, TransportError};
pub use level::{Level, ParseLevelError};
#[cfg(feature = "log-compat")]
pub use log_compat::{LogstashLogAdapter, install};
pub use log_record::{FieldValue, Fields, LogRecord, Splat};
pub use resolver::{AddressResolver, Destination, ResolvedAddress, SystemResolver};
pub use sender::{SenderConfig, SenderState, UdpSender};
pub use transport::{LogstashTransport, TransportEvent};
