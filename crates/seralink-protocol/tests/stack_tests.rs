//! End-to-end tests driving two full link stacks against each other
//! over an in-memory duplex byte pipe.

use seralink_protocol::{LinkStack, SecureError, StackConfig, StackEvent};
use seralink_crypto::iv::SessionKey;

/// Two stacks wired back to back. `run` shuttles every pending write to
/// the other side until both stacks go quiet, collecting the non-wire
/// events for the tests to inspect.
struct Pipe {
    a: LinkStack,
    b: LinkStack,
    a_events: Vec<StackEvent>,
    b_events: Vec<StackEvent>,
}

impl Pipe {
    fn new(a: StackConfig, b: StackConfig) -> Self {
        Self {
            a: LinkStack::new(a),
            b: LinkStack::new(b),
            a_events: Vec::new(),
            b_events: Vec::new(),
        }
    }

    fn run(&mut self) {
        loop {
            let mut progressed = false;
            if let Some(event) = self.a.poll_event() {
                progressed = true;
                match event {
                    StackEvent::Write(bytes) => {
                        self.b.on_data_received(&bytes);
                        self.a.on_write_complete();
                    }
                    other => self.a_events.push(other),
                }
            }
            if let Some(event) = self.b.poll_event() {
                progressed = true;
                match event {
                    StackEvent::Write(bytes) => {
                        self.a.on_data_received(&bytes);
                        self.b.on_write_complete();
                    }
                    other => self.b_events.push(other),
                }
            }
            if !progressed {
                return;
            }
        }
    }

    /// Send one message from `a` to `b` through the request/ready/send
    /// sequence, panicking if the grant does not arrive.
    fn send_a_to_b(&mut self, payload: &[u8]) {
        self.a.request_send(payload.len());
        self.run();
        assert_eq!(
            self.a_events.pop(),
            Some(StackEvent::SendReady {
                size: payload.len()
            })
        );
        self.a.send(payload.to_vec()).unwrap();
        self.run();
    }
}

fn session(seed: u8) -> SessionKey {
    let key: [u8; 16] = hex::decode(format!("{:032x}", seed as u128 + 1))
        .unwrap()
        .try_into()
        .unwrap();
    SessionKey::new(key, [seed; 16])
}

// ---------------------------------------------------------------------------
// Plaintext links
// ---------------------------------------------------------------------------

#[test]
fn handshake_then_roundtrip_both_directions() {
    let mut pipe = Pipe::new(StackConfig::default(), StackConfig::default());
    pipe.run();
    assert!(pipe.a_events.is_empty());
    assert!(pipe.b_events.is_empty());

    pipe.send_a_to_b(b"hello");
    assert_eq!(
        pipe.b_events,
        [StackEvent::Received(b"hello".to_vec())]
    );
    pipe.b_events.clear();
    pipe.b.ack_received();

    // The other direction over the same pair.
    pipe.b.request_send(5);
    pipe.run();
    assert_eq!(pipe.b_events.pop(), Some(StackEvent::SendReady { size: 5 }));
    pipe.b.send(b"world".to_vec()).unwrap();
    pipe.run();
    assert_eq!(pipe.a_events, [StackEvent::Received(b"world".to_vec())]);
}

#[test]
fn window_exhaustion_defers_send_until_ack_releases() {
    let small_receiver = StackConfig {
        receive_window: 16,
        release_guard: 1,
        ..StackConfig::default()
    };
    let mut pipe = Pipe::new(StackConfig::default(), small_receiver);
    pipe.run();

    // A 4-byte payload costs 7 framed bytes; the 16-byte window fits two.
    pipe.send_a_to_b(b"msg1");
    pipe.send_a_to_b(b"msg2");
    assert_eq!(
        pipe.b_events,
        [StackEvent::Received(b"msg1".to_vec())],
        "second message is queued behind the unacked first"
    );
    pipe.b_events.clear();

    // Two framed bytes remain: the third send stays deferred.
    pipe.a.request_send(4);
    pipe.run();
    assert!(pipe.a_events.is_empty());

    // Releasing the first message frees 7 bytes and delivers the second.
    pipe.b.ack_received();
    pipe.run();
    assert_eq!(pipe.a_events, [StackEvent::SendReady { size: 4 }]);
    assert_eq!(pipe.b_events, [StackEvent::Received(b"msg2".to_vec())]);
    pipe.a_events.clear();
    pipe.b_events.clear();

    pipe.a.send(b"msg3".to_vec()).unwrap();
    pipe.run();
    assert!(pipe.b_events.is_empty(), "still waiting behind msg2's ack");
    pipe.b.ack_received();
    pipe.run();
    assert_eq!(pipe.b_events, [StackEvent::Received(b"msg3".to_vec())]);
}

#[test]
fn line_noise_between_frames_is_discarded() {
    let mut pipe = Pipe::new(StackConfig::default(), StackConfig::default());
    pipe.run();

    // Noise terminated by a delimiter: decoded as a nonsense record and
    // dropped without disturbing the link.
    pipe.b.on_data_received(&[0x37, 0x99, 0x00]);
    pipe.run();
    assert!(pipe.b_events.is_empty());

    pipe.send_a_to_b(b"after noise");
    assert_eq!(
        pipe.b_events,
        [StackEvent::Received(b"after noise".to_vec())]
    );
}

#[test]
fn largest_payload_fits_exactly() {
    let mut pipe = Pipe::new(StackConfig::default(), StackConfig::default());
    pipe.run();
    let payload = vec![0xAB; pipe.a.max_send_size()];
    pipe.send_a_to_b(&payload);
    assert_eq!(pipe.b_events, [StackEvent::Received(payload)]);
}

// ---------------------------------------------------------------------------
// Secured links
// ---------------------------------------------------------------------------

fn secured_config() -> StackConfig {
    StackConfig {
        secured: true,
        ..StackConfig::default()
    }
}

#[test]
fn secured_roundtrip_both_directions() {
    let mut pipe = Pipe::new(secured_config(), secured_config());
    pipe.a.set_send_key(session(1));
    pipe.b.set_receive_key(session(1));
    pipe.b.set_send_key(session(2));
    pipe.a.set_receive_key(session(2));
    pipe.run();

    for round in 0..3u8 {
        let payload = vec![round; 20];
        pipe.send_a_to_b(&payload);
        assert_eq!(pipe.b_events, [StackEvent::Received(payload)]);
        pipe.b_events.clear();
        pipe.b.ack_received();
        pipe.run();
    }

    pipe.b.request_send(4);
    pipe.run();
    assert_eq!(pipe.b_events.pop(), Some(StackEvent::SendReady { size: 4 }));
    pipe.b.send(b"back".to_vec()).unwrap();
    pipe.run();
    assert_eq!(pipe.a_events, [StackEvent::Received(b"back".to_vec())]);
}

#[test]
fn wrong_receive_key_drops_silently_and_link_survives() {
    let mut pipe = Pipe::new(secured_config(), secured_config());
    pipe.a.set_send_key(session(1));
    pipe.b.set_receive_key(session(9)); // mismatched
    pipe.run();

    // Every message fails authentication at B: nothing is delivered and
    // nothing indicates tampering on the wire.
    pipe.send_a_to_b(b"first");
    pipe.send_a_to_b(b"second");
    assert!(pipe.b_events.is_empty());

    // The dropped messages released their window internally, so A keeps
    // getting grants instead of stalling.
    pipe.a.request_send(8);
    pipe.run();
    assert_eq!(pipe.a_events.pop(), Some(StackEvent::SendReady { size: 8 }));
}

#[test]
fn send_without_key_fails_after_grant() {
    let mut pipe = Pipe::new(secured_config(), secured_config());
    pipe.run();
    pipe.a.request_send(4);
    pipe.run();
    assert_eq!(pipe.a_events.pop(), Some(StackEvent::SendReady { size: 4 }));
    assert_eq!(
        pipe.a.send(b"data".to_vec()),
        Err(SecureError::MissingSendKey)
    );
}

#[test]
fn key_installed_midway_takes_effect_on_next_message() {
    let mut pipe = Pipe::new(secured_config(), secured_config());
    pipe.a.set_send_key(session(5));
    pipe.run();

    // No receive key yet at B: dropped.
    pipe.send_a_to_b(b"lost");
    assert!(pipe.b_events.is_empty());

    // B installs the key at A's current counter position (one message
    // consumed a value already).
    let mut key = session(5);
    key.iv.increment();
    pipe.b.set_receive_key(key);
    pipe.send_a_to_b(b"kept");
    assert_eq!(pipe.b_events, [StackEvent::Received(b"kept".to_vec())]);
}
