//! End-to-end link tests over the scripted mock transport

use defendum_link::config::AppConfig;
use defendum_link::core::Position;
use defendum_link::link::{Link, ReceiveLoop};
use defendum_link::protocol::{Frame, Message};
use defendum_link::transport::mock::{MockConnector, MockTransport, ScriptedRead};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const RECONNECT_INTERVAL: Duration = Duration::from_millis(20);

fn test_link() -> Arc<Link> {
    let _ = env_logger::builder().is_test(true).try_init();
    Link::new(&AppConfig::small_arena_defaults().link)
}

fn spawn_loop(
    link: &Arc<Link>,
    connector: MockConnector,
    running: &Arc<AtomicBool>,
) -> std::thread::JoinHandle<()> {
    ReceiveLoop::new(
        Arc::clone(link),
        Box::new(connector),
        Arc::clone(running),
        RECONNECT_INTERVAL,
    )
    .spawn()
    .unwrap()
}

fn wait_for(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    false
}

#[test]
fn reconnects_after_scripted_failures() {
    let link = test_link();
    let failures = 3;
    let connector = MockConnector::new(MockTransport::new(), failures);
    let attempts: Arc<AtomicUsize> = connector.attempts();
    let running = Arc::new(AtomicBool::new(true));

    let start = Instant::now();
    let handle = spawn_loop(&link, connector, &running);

    assert!(
        wait_for(Duration::from_secs(2), || link.is_connected()),
        "link never connected"
    );
    // Connected on attempt N+1, with one sleep period before each attempt
    assert_eq!(attempts.load(Ordering::SeqCst), failures + 1);
    assert!(start.elapsed() >= RECONNECT_INTERVAL * (failures as u32 + 1));

    running.store(false, Ordering::Relaxed);
    handle.join().unwrap();
}

#[test]
fn shutdown_observed_within_one_sleep_period() {
    let link = test_link();
    // Connector that never succeeds keeps the loop in its sleep cycle
    let connector = MockConnector::new(MockTransport::new(), usize::MAX);
    let running = Arc::new(AtomicBool::new(true));
    let handle = spawn_loop(&link, connector, &running);

    std::thread::sleep(RECONNECT_INTERVAL / 2);
    let stop = Instant::now();
    running.store(false, Ordering::Relaxed);
    handle.join().unwrap();

    // Bounded by one sleep period plus scheduling slack
    assert!(stop.elapsed() < RECONNECT_INTERVAL * 3);
    assert!(!link.is_connected());
}

#[test]
fn sends_flow_and_acks_advance_watermark() {
    let link = test_link();
    let transport = MockTransport::new();
    let connector = MockConnector::new(transport.clone(), 0);
    let running = Arc::new(AtomicBool::new(true));
    let handle = spawn_loop(&link, connector, &running);

    assert!(wait_for(Duration::from_secs(2), || link.is_connected()));

    let id = link.send_position(Position::new(700, -300)).unwrap();
    assert_eq!(id, 1);
    let written = transport.written();
    assert_eq!(written.len(), 1);
    let sent = Frame::decode(&written[0]).unwrap();
    assert_eq!(
        sent.message,
        Message::Position {
            position: Position::new(700, -300)
        }
    );

    // Server acknowledges it
    transport.inject_frame(
        &Frame {
            id: 1,
            src: link.peer_id(),
            dst: link.local_id(),
            message: Message::Ack {
                acked_id: id,
                status: 0,
            },
        }
        .encode(),
    );
    assert!(
        wait_for(Duration::from_secs(2), || link.ack_watermark() == id),
        "watermark never advanced"
    );

    running.store(false, Ordering::Relaxed);
    handle.join().unwrap();
}

#[test]
fn disconnect_fails_senders_until_reconnected() {
    let link = test_link();
    let transport = MockTransport::new();
    let connector = MockConnector::new(transport.clone(), 0);
    let running = Arc::new(AtomicBool::new(true));
    let handle = spawn_loop(&link, connector, &running);

    assert!(wait_for(Duration::from_secs(2), || link.is_connected()));

    // Remote closes; the receive loop must notice and detach the writer
    transport.push_read(ScriptedRead::Close);
    assert!(wait_for(Duration::from_secs(2), || !link.is_connected()));
    assert!(link.send_position(Position::new(0, 0)).is_err());

    // The same connector reconnects on the next cycle
    assert!(wait_for(Duration::from_secs(2), || link.is_connected()));
    assert!(link.send_position(Position::new(0, 0)).is_ok());

    running.store(false, Ordering::Relaxed);
    handle.join().unwrap();
}
