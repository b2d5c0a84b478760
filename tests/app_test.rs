mod common;

use common::transport;
use rask_log_transport::app::forward_lines;
use rask_log_transport::{Severity, TransportConfig};
use std::time::Duration;

fn console_only() -> TransportConfig {
    TransportConfig::default().with_remote(false).with_color(false)
}

#[tokio::test]
async fn test_forward_lines_renders_json_and_text() {
    let (transport, console, diagnostics) = transport(console_only());
    let input: &[u8] = b"{\"level\":40,\"msg\":\"disk low\",\"free\":\"2%\"}\nplain text line\n\n";

    let dispatched = forward_lines(&transport, Severity::TRACE, input).await;

    assert_eq!(dispatched, 2);
    assert_eq!(console.text(), "disk low\n  free: 2%\nplain text line\n");
    assert_eq!(diagnostics.count(), 0);
}

#[tokio::test]
async fn test_forward_lines_applies_minimum_level() {
    let (transport, console, _) = transport(console_only());
    let input: &[u8] = b"{\"level\":20,\"msg\":\"noise\"}\n{\"level\":\"error\",\"msg\":\"boom\"}\n";

    let dispatched = forward_lines(&transport, Severity::WARN, input).await;

    assert_eq!(dispatched, 1);
    assert_eq!(console.text(), "boom\n");
}

#[tokio::test]
async fn test_forward_then_drain_without_remote() {
    let (transport, _, _) = transport(console_only());
    let input: &[u8] = b"one\ntwo\n";

    forward_lines(&transport, Severity::INFO, input).await;

    assert!(transport.wait_until_idle(Duration::from_millis(50)).await.is_idle());
}
