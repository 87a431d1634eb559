//! Tests for the UDP receiver: lifecycle, queue discipline, decode mode

use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;

use lwes_protocol::Event;

use crate::receiver::{Receiver, ReceiverConfig, ReceiverError};

fn loopback_config(queue_size: usize) -> ReceiverConfig {
    ReceiverConfig {
        id: "test_udp".into(),
        address: "127.0.0.1:0".into(),
        queue_size,
        ..Default::default()
    }
}

fn sample_event() -> Event {
    let mut event = Event::new("Test::Sample");
    event.set("seq", 1u32);
    event.set("label", "hello");
    event
}

#[test]
fn test_config_defaults() {
    let config = ReceiverConfig::default();
    assert_eq!(config.queue_size, 100_000);
    assert_eq!(config.max_packet_size, 64 * 1024);
    assert_eq!(config.recv_buffer_size, 256 * 1024 * 1024);
    assert_eq!(config.read_timeout, Duration::from_millis(100));
}

#[test]
fn test_packet_capacity_floor() {
    // any valid UDP payload must fit
    let config = ReceiverConfig {
        max_packet_size: 1000,
        ..Default::default()
    };
    assert_eq!(config.packet_capacity(), 65_507);

    let config = ReceiverConfig {
        max_packet_size: 128 * 1024,
        ..Default::default()
    };
    assert_eq!(config.packet_capacity(), 128 * 1024);
}

#[tokio::test]
async fn test_bind_unicast() {
    let receiver = Receiver::bind(loopback_config(16)).await.unwrap();
    assert_ne!(receiver.local_addr().port(), 0);
    assert!(!receiver.is_serving());
}

#[tokio::test]
async fn test_bind_unresolvable_address() {
    let config = ReceiverConfig {
        address: "not-an-address".into(),
        ..Default::default()
    };
    match Receiver::bind(config).await {
        Err(ReceiverError::Resolve { address, .. }) => assert_eq!(address, "not-an-address"),
        other => panic!("expected resolve error, got {:?}", other.map(|_| ())),
    }
}

#[tokio::test]
async fn test_receive_packet() {
    let receiver = Arc::new(Receiver::bind(loopback_config(16)).await.unwrap());
    let mut packets = receiver.packets();
    receiver.serve();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let payload = sample_event().encode().unwrap();
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    client
        .send_to(&payload, receiver.local_addr())
        .await
        .unwrap();

    let pbuf = tokio::time::timeout(Duration::from_secs(1), packets.recv())
        .await
        .expect("packet within a second")
        .unwrap();
    assert_eq!(pbuf.bytes(), &payload[..]);
    drop(pbuf);

    let snapshot = receiver.metrics().snapshot();
    assert_eq!(snapshot.packets_received, 1);
    assert_eq!(snapshot.packets_processed, 1);
    assert_eq!(snapshot.bytes_received, payload.len() as u64);
    assert_eq!(snapshot.packet_size, payload.len() as u64);

    receiver.stop().await;
    assert_eq!(receiver.in_flight(), 0);
}

#[tokio::test]
async fn test_queue_full_drops_newest() {
    // Q = 4, ten datagrams, no consumer until stop
    let receiver = Arc::new(Receiver::bind(loopback_config(4)).await.unwrap());
    receiver.serve();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let payload = sample_event().encode().unwrap();
    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    for _ in 0..10 {
        client
            .send_to(&payload, receiver.local_addr())
            .await
            .unwrap();
    }

    // let the read loop drain the socket
    tokio::time::sleep(Duration::from_millis(300)).await;

    let snapshot = receiver.metrics().snapshot();
    assert_eq!(snapshot.packets_received, 10);
    assert_eq!(snapshot.packets_processed, 4);
    assert_eq!(snapshot.packets_dropped, 6);
    assert_eq!(snapshot.bytes_dropped, 6 * payload.len() as u64);
    assert_eq!(receiver.in_flight(), 4);

    // a draining consumer lets stop() complete
    let mut packets = receiver.packets();
    let drain = tokio::spawn(async move { while packets.recv().await.is_ok() {} });

    receiver.stop().await;
    assert_eq!(receiver.in_flight(), 0);
    let _ = drain.await;
}

#[tokio::test]
async fn test_serve_and_stop_are_idempotent() {
    let receiver = Arc::new(Receiver::bind(loopback_config(16)).await.unwrap());

    receiver.serve();
    receiver.serve();
    assert!(receiver.is_serving());

    receiver.stop().await;
    assert!(!receiver.is_serving());
    receiver.stop().await;
    assert!(!receiver.is_serving());
    assert_eq!(receiver.in_flight(), 0);

    // the receiver is terminal once stopped
    receiver.serve();
    assert!(!receiver.is_serving());
}

#[tokio::test]
async fn test_stop_before_serve_is_a_noop() {
    let receiver = Receiver::bind(loopback_config(16)).await.unwrap();
    receiver.stop().await;
    assert!(!receiver.is_serving());
}

#[tokio::test]
async fn test_decode_mode_counts_valid_and_invalid() {
    let receiver = Arc::new(Receiver::bind(loopback_config(16)).await.unwrap());
    let mut events = receiver.events(2);
    receiver.serve();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let payload = sample_event().encode().unwrap();
    client
        .send_to(&payload, receiver.local_addr())
        .await
        .unwrap();
    // a name length of 255 with no name bytes behind it
    client
        .send_to(&[0xff], receiver.local_addr())
        .await
        .unwrap();

    let event = tokio::time::timeout(Duration::from_secs(1), events.recv())
        .await
        .expect("decoded event within a second")
        .unwrap();
    assert_eq!(event.name(), "Test::Sample");
    assert_eq!(event.get("label").unwrap().to_string(), "hello");

    tokio::time::sleep(Duration::from_millis(100)).await;
    receiver.stop().await;

    let snapshot = receiver.metrics().snapshot();
    assert_eq!(snapshot.packets_received, 2);
    assert_eq!(snapshot.packets_decoded, 1);
    assert_eq!(snapshot.packets_decoded_passed, 1);
    assert_eq!(snapshot.packets_invalid, 1);
    assert_eq!(receiver.in_flight(), 0);

    // the event queue closes once the workers drain out
    assert!(events.recv().await.is_err());
}
