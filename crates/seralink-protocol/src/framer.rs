//! The framer layer: incremental COBS frame transmission and streaming
//! receive over a raw byte transport.
//!
//! Sending is incremental: each completion callback from the transport
//! releases exactly one more physical write (the chunk cursor survives
//! arbitrary suspension in between). The opening delimiter is written only
//! before the very first frame; afterwards the previous frame's closing
//! delimiter doubles as the next opener.
//!
//! Like every layer in this stack, the framer performs no I/O itself; it
//! emits [`FramerEvent`]s for the driver to act on.

use std::collections::VecDeque;

use seralink_core::framing::cobs::{max_message_size, next_chunk, DELIMITER};
use seralink_core::framing::decoder::CobsDecoder;

/// Actions and notifications produced by the framer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FramerEvent {
    /// One physical write for the transport. The next write is released
    /// only after [`Framer::on_write_complete`].
    Write(Vec<u8>),
    /// The frame handed to [`Framer::send_frame`] is fully on the wire.
    SendComplete,
    /// A complete frame was reassembled from the receive stream.
    FrameReceived(Vec<u8>),
}

/// In-progress outgoing frame: payload plus the encode cursor.
struct FrameSend {
    payload: Vec<u8>,
    cursor: usize,
    /// The last chunk consumed a trailing payload zero; an empty chunk is
    /// still owed for it.
    zero_owed: bool,
    /// Body written; the next write is the closing delimiter.
    closing: bool,
}

/// COBS framer over a raw byte link.
pub struct Framer {
    capacity: usize,
    opener_sent: bool,
    send: Option<FrameSend>,
    decoder: CobsDecoder,
    events: VecDeque<FramerEvent>,
}

impl Framer {
    /// Create a framer whose staging and accumulation buffers hold
    /// `capacity` bytes of framed data.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            opener_sent: false,
            send: None,
            decoder: CobsDecoder::new(capacity),
            events: VecDeque::new(),
        }
    }

    /// Largest payload that fits the staging buffer once framed.
    pub fn max_send_message_size(&self) -> usize {
        max_message_size(self.capacity)
    }

    /// Whether a frame transmission is in progress.
    pub fn is_sending(&self) -> bool {
        self.send.is_some()
    }

    /// Begin transmitting one frame.
    ///
    /// # Panics
    ///
    /// Panics if a send is already in progress, the payload is empty, or
    /// the payload exceeds [`Framer::max_send_message_size`], all caller
    /// contract violations.
    pub fn send_frame(&mut self, payload: Vec<u8>) {
        assert!(self.send.is_none(), "frame send already in progress");
        assert!(!payload.is_empty(), "frames carry at least one byte");
        assert!(
            payload.len() <= self.max_send_message_size(),
            "payload of {} bytes exceeds max frame payload {}",
            payload.len(),
            self.max_send_message_size()
        );

        tracing::trace!(len = payload.len(), "framer: frame send started");
        self.send = Some(FrameSend {
            payload,
            cursor: 0,
            zero_owed: false,
            closing: false,
        });

        if self.opener_sent {
            self.advance_send();
        } else {
            self.opener_sent = true;
            self.events.push_back(FramerEvent::Write(vec![DELIMITER]));
        }
    }

    /// The transport finished the previously released write.
    pub fn on_write_complete(&mut self) {
        assert!(self.send.is_some(), "write completion with no send in flight");
        self.advance_send();
    }

    fn advance_send(&mut self) {
        let send = self.send.as_mut().expect("send state present");

        if send.closing {
            self.send = None;
            tracing::trace!("framer: frame send complete");
            self.events.push_back(FramerEvent::SendComplete);
            return;
        }

        if send.cursor < send.payload.len() {
            let chunk = next_chunk(&send.payload[send.cursor..]);
            let mut piece = Vec::with_capacity(1 + chunk.literals);
            piece.push(chunk.overhead);
            piece.extend_from_slice(&send.payload[send.cursor..send.cursor + chunk.literals]);
            send.cursor += chunk.consumed;
            // A chunk ending on a consumed final zero leaves an empty
            // chunk owed before the frame may close.
            send.zero_owed = chunk.consumed > chunk.literals && send.cursor >= send.payload.len();
            self.events.push_back(FramerEvent::Write(piece));
        } else if send.zero_owed {
            send.zero_owed = false;
            self.events.push_back(FramerEvent::Write(vec![1]));
        } else {
            send.closing = true;
            self.events.push_back(FramerEvent::Write(vec![DELIMITER]));
        }
    }

    /// Feed raw bytes received from the transport.
    pub fn on_data_received(&mut self, data: &[u8]) {
        for frame in self.decoder.feed(data) {
            tracing::trace!(len = frame.len(), "framer: frame received");
            self.events.push_back(FramerEvent::FrameReceived(frame));
        }
    }

    /// Drain the next pending event.
    pub fn poll_event(&mut self) -> Option<FramerEvent> {
        self.events.pop_front()
    }
}
