//! In-process loopback link: two full stacks wired back to back.
//!
//! The demo stands in for a pair of devices on a serial line, driving
//! both ends from one loop so the whole stack can be exercised without
//! hardware. Writes from each side are fed straight into the other
//! side's receive path.

use seralink_protocol::{LinkStack, StackConfig, StackEvent};

use crate::config::NodeConfig;
use crate::error::NodeError;

/// Counters from a completed loopback run.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoopbackStats {
    /// Messages delivered in each direction.
    pub delivered_a_to_b: u32,
    pub delivered_b_to_a: u32,
    /// Total bytes that crossed the simulated wire, both directions.
    pub wire_bytes: usize,
}

/// One endpoint of the loopback pair plus its traffic bookkeeping.
struct Endpoint {
    name: &'static str,
    stack: LinkStack,
    /// Messages still to be sent by this side.
    to_send: u32,
    /// A request is in flight or granted but not yet sent.
    request_pending: bool,
    received: u32,
}

impl Endpoint {
    fn new(name: &'static str, config: StackConfig) -> Self {
        Self {
            name,
            stack: LinkStack::new(config),
            to_send: 0,
            request_pending: false,
            received: 0,
        }
    }
}

/// Run the loopback exchange described by `config` to completion.
pub fn run(config: &NodeConfig) -> Result<LoopbackStats, NodeError> {
    let stack_config = config.stack_config();
    let mut a = Endpoint::new("a", stack_config);
    let mut b = Endpoint::new("b", stack_config);

    if config.security.enabled {
        let forward = config.send_session()?;
        let reverse = config.receive_session()?;
        a.stack.set_send_key(forward);
        b.stack.set_receive_key(forward);
        b.stack.set_send_key(reverse);
        a.stack.set_receive_key(reverse);
    }

    a.to_send = config.demo.messages;
    b.to_send = config.demo.messages;
    let payload_size = config.demo.payload_size.min(a.stack.max_send_size());
    let mut stats = LoopbackStats::default();

    // Drive both sides until all traffic is exchanged. Every iteration
    // either moves an event or starts the next send; with acks issued on
    // delivery the exchange cannot stall.
    loop {
        let progressed = step(&mut a, &mut b, payload_size, &mut stats)?
            | step(&mut b, &mut a, payload_size, &mut stats)?;
        if !progressed {
            break;
        }
    }

    stats.delivered_a_to_b = b.received;
    stats.delivered_b_to_a = a.received;
    tracing::info!(
        a_to_b = stats.delivered_a_to_b,
        b_to_a = stats.delivered_b_to_a,
        wire_bytes = stats.wire_bytes,
        "loopback exchange complete"
    );
    Ok(stats)
}

/// Advance one endpoint by one action. Returns whether anything moved.
fn step(
    side: &mut Endpoint,
    other: &mut Endpoint,
    payload_size: usize,
    stats: &mut LoopbackStats,
) -> Result<bool, NodeError> {
    if let Some(event) = side.stack.poll_event() {
        match event {
            StackEvent::Write(bytes) => {
                stats.wire_bytes += bytes.len();
                other.stack.on_data_received(&bytes);
                side.stack.on_write_complete();
            }
            StackEvent::SendReady { size } => {
                let payload = vec![side.received as u8, side.to_send as u8]
                    .into_iter()
                    .cycle()
                    .take(size)
                    .collect();
                side.stack.send(payload)?;
                side.to_send -= 1;
                side.request_pending = false;
                tracing::debug!(side = side.name, remaining = side.to_send, "message sent");
            }
            StackEvent::Received(payload) => {
                side.received += 1;
                tracing::debug!(side = side.name, len = payload.len(), n = side.received, "message received");
                side.stack.ack_received();
            }
        }
        return Ok(true);
    }
    if side.to_send > 0 && !side.request_pending {
        side.request_pending = true;
        side.stack.request_send(payload_size);
        return Ok(true);
    }
    Ok(false)
}
