//! Send/Sync guarantees for core types.

use logstash_udp::{
    LogRecordEncoder, LogstashLogAdapter, LogstashTransport, SystemResolver, TransportBuilder,
    TransportConfig, TransportError, TransportEvent, UdpSender,
};
use rstest::rstest;
use static_assertions::assert_impl_all;

#[rstest]
fn builders_are_send_sync() {
    assert_impl_all!(TransportBuilder: Send, Sync, Clone);
    assert_impl_all!(TransportConfig: Send, Sync, Clone);
}

#[rstest]
fn components_are_send_sync() {
    assert_impl_all!(LogstashTransport: Send, Sync);
    assert_impl_all!(UdpSender: Send, Sync);
    assert_impl_all!(LogRecordEncoder: Send, Sync);
    assert_impl_all!(SystemResolver: Send, Sync);
    assert_impl_all!(LogstashLogAdapter: Send, Sync);
}

#[rstest]
fn outcomes_cross_threads() {
    assert_impl_all!(TransportError: Send, Sync, Clone);
    assert_impl_all!(TransportEvent: Send, Sync, Clone);
}
