//! End-to-end discovery and frame transmission against a fake controller on
//! loopback.

use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use bytes::BytesMut;
use striplink_frame::{DiscoveryResponse, MAGIC};
use striplink_session::{discover, discover_with_retry, DiscoveryListener, ListenerConfig};

/// A controller stand-in: answers each discovery request with the configured
/// reply payloads (in order) and forwards every non-request datagram (pixel
/// frames) to the test.
struct FakeController {
    addr: SocketAddr,
    frames: mpsc::Receiver<Vec<u8>>,
}

fn spawn_controller(replies: Vec<Vec<u8>>, ignore_requests: usize) -> FakeController {
    let socket = UdpSocket::bind("127.0.0.1:0").expect("controller should bind");
    let addr = socket.local_addr().expect("controller addr");
    let (frame_tx, frame_rx) = mpsc::channel();

    thread::spawn(move || {
        let mut buf = [0u8; 4096];
        let mut seen_requests = 0usize;
        loop {
            let Ok((len, src)) = socket.recv_from(&mut buf) else {
                break;
            };
            if buf[..len] == MAGIC {
                seen_requests += 1;
                if seen_requests > ignore_requests {
                    for reply in &replies {
                        let _ = socket.send_to(reply, src);
                    }
                }
            } else if frame_tx.send(buf[..len].to_vec()).is_err() {
                break;
            }
        }
    });

    FakeController {
        addr,
        frames: frame_rx,
    }
}

fn encoded(response: DiscoveryResponse) -> Vec<u8> {
    let mut buf = BytesMut::new();
    response.encode(&mut buf);
    buf.to_vec()
}

fn listener_for(controller: &FakeController) -> DiscoveryListener {
    DiscoveryListener::spawn_with_config(ListenerConfig {
        bind_addr: "127.0.0.1:0".parse().expect("addr should parse"),
        discovery_addr: controller.addr,
    })
    .expect("listener should spawn")
}

#[test]
fn discover_set_show_end_to_end() {
    let controller = spawn_controller(
        vec![encoded(DiscoveryResponse {
            unit_id: 1,
            pixel_count: 10,
            channels: 3,
        })],
        0,
    );
    let listener = listener_for(&controller);

    let mut session = discover(&listener, Some(1)).expect("discovery should succeed");

    assert_eq!(session.unit_id(), 1);
    assert_eq!(session.len(), 10);
    assert_eq!(session.channels(), 3);
    assert_eq!(session.buffer().as_bytes().len(), 44);
    assert_eq!(session.peer_addr(), Some(controller.addr));

    session
        .set_pixel_color(0, 255, 0, 0, 0)
        .expect("pixel 0 should be in bounds");
    session.show().expect("show should send");

    let frame = controller
        .frames
        .recv_timeout(Duration::from_secs(2))
        .expect("controller should receive the frame");
    assert_eq!(frame.len(), 44);
    assert_eq!(&frame[..4], &MAGIC);
    assert_eq!(&frame[4..7], &[255, 0, 0]);
}

#[test]
fn retry_fires_once_per_silent_interval() {
    let controller = spawn_controller(
        vec![encoded(DiscoveryResponse {
            unit_id: 1,
            pixel_count: 4,
            channels: 3,
        })],
        2,
    );
    let listener = listener_for(&controller);

    let retries = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&retries);
    let session = discover_with_retry(&listener, Some(1), || {
        counter.fetch_add(1, Ordering::SeqCst);
    })
    .expect("discovery should eventually succeed");

    // Two ignored requests, one retry per elapsed interval before the third
    // request is answered, none after.
    assert_eq!(retries.load(Ordering::SeqCst), 2);
    assert_eq!(session.unit_id(), 1);
}

#[test]
fn responses_from_other_units_are_ignored() {
    let controller = spawn_controller(
        vec![
            encoded(DiscoveryResponse {
                unit_id: 7,
                pixel_count: 99,
                channels: 4,
            }),
            encoded(DiscoveryResponse {
                unit_id: 1,
                pixel_count: 10,
                channels: 3,
            }),
        ],
        0,
    );
    let listener = listener_for(&controller);

    let session = discover(&listener, Some(1)).expect("discovery should succeed");
    assert_eq!(session.unit_id(), 1);
    assert_eq!(session.len(), 10);
}

#[test]
fn malformed_datagrams_are_skipped() {
    let controller = spawn_controller(
        vec![
            b"\xde\xad".to_vec(),
            vec![0xff, 0xff, 0xff, 0xff, 1, 0, 10, 3],
            encoded(DiscoveryResponse {
                unit_id: 2,
                pixel_count: 8,
                channels: 4,
            }),
        ],
        0,
    );
    let listener = listener_for(&controller);

    let session = discover(&listener, None).expect("discovery should succeed");
    assert_eq!(session.unit_id(), 2);
    assert_eq!(session.len(), 8);
}

#[test]
fn concurrent_discover_calls_each_get_a_session() {
    let controller = spawn_controller(
        vec![encoded(DiscoveryResponse {
            unit_id: 1,
            pixel_count: 5,
            channels: 3,
        })],
        0,
    );
    let listener = Arc::new(listener_for(&controller));

    let workers: Vec<_> = (0..2)
        .map(|_| {
            let listener = Arc::clone(&listener);
            thread::spawn(move || discover(&listener, Some(1)))
        })
        .collect();

    for worker in workers {
        let session = worker
            .join()
            .expect("worker should not panic")
            .expect("each caller should get a session");
        assert_eq!(session.unit_id(), 1);
        assert_eq!(session.len(), 5);
    }
}
