//! The windowed channel: sliding-window flow control over a one-frame
//! message provider.
//!
//! Each peer advertises its free receive-buffer capacity (the window, in
//! framed bytes) with the one-time Init/InitResponse handshake and
//! returns freed capacity with ReleaseWindow records, so a sender can
//! never overrun the receiver's buffer without needing a fixed message
//! size.
//!
//! # Handshake
//!
//! ```text
//! PEER A                                   PEER B
//!    |-- Init [window_a] ----------------->|
//!    |<----------------- Init [window_b] --|
//!    |-- InitResponse [window_a] --------->|
//!    |<--------- InitResponse [window_b] --|
//!    |                                     |
//!    |        === OPERATIONAL ===          |
//!    |-- Message [payload] --------------->|
//!    |<---------- ReleaseWindow [freed] ---|
//! ```
//!
//! There is no retransmission, no checksum and no handshake timeout at
//! this layer: byte integrity is the transport's (or the secured
//! channel's) concern, link recovery an external supervisor's.

pub mod constants;
pub mod state;

use std::collections::VecDeque;

use seralink_core::control::ControlMessage;

pub use constants::{DEFAULT_BUFFER_CAPACITY, DEFAULT_RECEIVE_WINDOW, DEFAULT_RELEASE_GUARD};
pub use state::SendState;
use state::{fits_window, message_wire_size, release_due};

/// Windowed-channel tunables.
#[derive(Debug, Clone, Copy)]
pub struct ChannelConfig {
    /// Largest Message payload the layer below can carry in one frame.
    pub max_payload: usize,
    /// Receive-buffer capacity advertised to the peer, in framed bytes.
    pub receive_window: u16,
    /// Freed bytes accumulated before a ReleaseWindow is sent.
    pub release_guard: u16,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            max_payload: seralink_core::framing::cobs::max_message_size(DEFAULT_BUFFER_CAPACITY)
                - seralink_core::control::MESSAGE_OVERHEAD,
            receive_window: DEFAULT_RECEIVE_WINDOW,
            release_guard: DEFAULT_RELEASE_GUARD,
        }
    }
}

/// Actions and notifications produced by the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    /// A packed control record for the layer below to frame and send.
    /// The channel starts no further transmit until
    /// [`WindowedChannel::on_send_complete`].
    Transmit(Vec<u8>),
    /// An earlier [`WindowedChannel::request_send_message`] may proceed:
    /// call [`WindowedChannel::send_message`] with up to `size` bytes.
    SendGranted { size: usize },
    /// A message arrived. No further message is delivered until
    /// [`WindowedChannel::ack_received`] releases this one.
    MessageReceived(Vec<u8>),
}

/// Sliding-window flow-control channel over a frame transport.
pub struct WindowedChannel {
    config: ChannelConfig,
    state: SendState,

    // ---- Send direction ----
    /// Window granted to us by the peer, in framed bytes.
    other_window: usize,
    /// True once the peer's Init or InitResponse established the window.
    peer_synced: bool,
    /// A peer Init awaits an InitResponse once the send slot frees up.
    init_reply_pending: bool,
    /// Deferred send request from the layer above.
    pending_request: Option<usize>,
    /// Granted request awaiting [`WindowedChannel::send_message`].
    granted: Option<usize>,

    // ---- Receive direction ----
    /// Framed bytes of received messages not yet acked.
    occupied: usize,
    /// Freed framed bytes not yet advertised back to the peer.
    pending_release: usize,
    /// Framed size of the delivered-but-unacked message.
    outstanding_delivery: Option<usize>,
    /// Messages decoded behind the single outstanding reader.
    delivery_queue: VecDeque<Vec<u8>>,

    events: VecDeque<ChannelEvent>,
}

impl WindowedChannel {
    /// Create a channel and start the handshake: the opening Init is
    /// queued as the first [`ChannelEvent::Transmit`].
    pub fn new(config: ChannelConfig) -> Self {
        let mut channel = Self {
            config,
            state: SendState::SendingInit,
            other_window: 0,
            peer_synced: false,
            init_reply_pending: false,
            pending_request: None,
            granted: None,
            occupied: 0,
            pending_release: 0,
            outstanding_delivery: None,
            delivery_queue: VecDeque::new(),
            events: VecDeque::new(),
        };
        tracing::debug!(window = config.receive_window, "channel: sending init");
        channel.transmit(ControlMessage::Init {
            window: config.receive_window,
        });
        channel
    }

    /// Largest payload accepted by [`WindowedChannel::request_send_message`].
    pub fn max_send_message_size(&self) -> usize {
        self.config.max_payload
    }

    /// Current send state.
    pub fn send_state(&self) -> SendState {
        self.state
    }

    /// Window currently granted to us by the peer, in framed bytes.
    pub fn available_window(&self) -> usize {
        self.other_window
    }

    /// Drain the next pending event.
    pub fn poll_event(&mut self) -> Option<ChannelEvent> {
        self.events.pop_front()
    }

    // ------------------------------------------------------------------ //
    // Send path
    // ------------------------------------------------------------------ //

    /// Request to send a message of `size` bytes.
    ///
    /// Granted via [`ChannelEvent::SendGranted`] as soon as the handshake
    /// is complete, the send slot is free, and the framed size fits the
    /// peer's window; deferred until then otherwise.
    ///
    /// # Panics
    ///
    /// Panics if `size` exceeds [`WindowedChannel::max_send_message_size`]
    /// or a request is already outstanding; both are caller contract violations.
    pub fn request_send_message(&mut self, size: usize) {
        assert!(
            size <= self.config.max_payload,
            "message of {size} bytes exceeds max {}",
            self.config.max_payload
        );
        assert!(
            self.pending_request.is_none() && self.granted.is_none(),
            "a send request is already outstanding"
        );
        tracing::trace!(size, "channel: send requested");
        self.pending_request = Some(size);
        self.advance();
        if self.pending_request.is_some() {
            tracing::trace!(
                size,
                window = self.other_window,
                state = ?self.state,
                "channel: send deferred"
            );
        }
    }

    /// Transmit the payload for the granted request.
    ///
    /// # Panics
    ///
    /// Panics without a prior grant, or if the payload exceeds the
    /// granted size.
    pub fn send_message(&mut self, payload: Vec<u8>) {
        let granted = self
            .granted
            .take()
            .expect("send_message without a granted request");
        assert!(
            payload.len() <= granted,
            "payload of {} bytes exceeds granted {granted}",
            payload.len()
        );
        debug_assert_eq!(self.state, SendState::Operational);

        let wire = message_wire_size(payload.len());
        debug_assert!(wire <= self.other_window, "grant exceeded the window");
        self.other_window -= wire;
        tracing::trace!(
            len = payload.len(),
            wire,
            window = self.other_window,
            "channel: message send started"
        );
        self.state = SendState::SendingMessage;
        self.transmit(ControlMessage::Message(payload));
    }

    /// The layer below finished transmitting the current record.
    pub fn on_send_complete(&mut self) {
        match self.state {
            SendState::SendingInit => {
                if self.init_reply_pending {
                    self.init_reply_pending = false;
                    self.send_init_response();
                } else {
                    self.enter_operational();
                }
            }
            SendState::SendingInitResponse
            | SendState::SendingMessage
            | SendState::SendingReleaseWindow => self.enter_operational(),
            SendState::Operational => {
                debug_assert!(false, "send completion with no send in flight")
            }
        }
    }

    // ------------------------------------------------------------------ //
    // Receive path
    // ------------------------------------------------------------------ //

    /// A complete frame arrived from the layer below.
    pub fn on_frame_received(&mut self, frame: &[u8]) {
        let record = match ControlMessage::unpack(frame) {
            Ok(record) => record,
            Err(e) => {
                tracing::trace!(error = %e, "channel: dropping malformed record");
                return;
            }
        };
        match record {
            ControlMessage::Init { window } => self.on_init(window),
            ControlMessage::InitResponse { window } => self.on_init_response(window),
            ControlMessage::ReleaseWindow { window } => self.on_release_window(window),
            ControlMessage::Message(payload) => self.on_message(payload),
        }
    }

    /// Release the previously delivered message, freeing its buffer
    /// space. The next queued message, if any, is delivered.
    ///
    /// # Panics
    ///
    /// Panics if no delivery is outstanding.
    pub fn ack_received(&mut self) {
        let wire = self
            .outstanding_delivery
            .take()
            .expect("ack_received without an outstanding message");
        self.occupied -= wire;
        self.pending_release += wire;
        tracing::trace!(
            freed = wire,
            pending = self.pending_release,
            "channel: receive acked"
        );
        if let Some(payload) = self.delivery_queue.pop_front() {
            self.outstanding_delivery = Some(message_wire_size(payload.len()));
            self.events.push_back(ChannelEvent::MessageReceived(payload));
        }
        self.advance();
    }

    // ------------------------------------------------------------------ //
    // Control-record handling
    // ------------------------------------------------------------------ //

    fn on_init(&mut self, window: u16) {
        if self.peer_synced {
            // Re-handshake: answer again, but leave in-flight window
            // accounting untouched.
            tracing::debug!(window, "channel: repeated init, re-syncing peer");
        } else {
            self.peer_synced = true;
            self.other_window = window as usize;
            tracing::debug!(window, "channel: peer init received");
        }
        if self.state == SendState::Operational && self.granted.is_none() {
            self.send_init_response();
        } else {
            self.init_reply_pending = true;
        }
    }

    fn on_init_response(&mut self, window: u16) {
        self.peer_synced = true;
        self.other_window = window as usize;
        tracing::debug!(window, "channel: init response received");
        self.advance();
    }

    fn on_release_window(&mut self, window: u16) {
        if !self.peer_synced {
            tracing::trace!(window, "channel: release before handshake, dropped");
            return;
        }
        self.other_window += window as usize;
        tracing::trace!(
            released = window,
            window = self.other_window,
            "channel: window released by peer"
        );
        self.advance();
    }

    fn on_message(&mut self, payload: Vec<u8>) {
        if !self.peer_synced {
            tracing::trace!(len = payload.len(), "channel: message before handshake, dropped");
            return;
        }
        let wire = message_wire_size(payload.len());
        if wire > self.local_free() {
            tracing::warn!(
                wire,
                free = self.local_free(),
                "channel: peer exceeded advertised window, message dropped"
            );
            return;
        }
        self.occupied += wire;
        if self.outstanding_delivery.is_none() {
            self.outstanding_delivery = Some(wire);
            self.events.push_back(ChannelEvent::MessageReceived(payload));
        } else {
            // Structural backpressure: held until the reader is released.
            self.delivery_queue.push_back(payload);
        }
    }

    // ------------------------------------------------------------------ //
    // Transitions
    // ------------------------------------------------------------------ //

    fn enter_operational(&mut self) {
        self.state = SendState::Operational;
        self.advance();
    }

    /// Start whatever deferred work the free send slot allows, in
    /// priority order: answer a pending Init, advertise a due release,
    /// grant a deferred send.
    fn advance(&mut self) {
        if self.state != SendState::Operational || self.granted.is_some() {
            return;
        }
        if self.init_reply_pending {
            self.init_reply_pending = false;
            self.send_init_response();
            return;
        }
        if release_due(self.pending_release, self.config.release_guard) {
            self.send_release();
            return;
        }
        if let Some(size) = self.pending_request {
            if self.peer_synced && fits_window(self.other_window, size) {
                self.pending_request = None;
                self.granted = Some(size);
                tracing::trace!(size, "channel: send granted");
                self.events.push_back(ChannelEvent::SendGranted { size });
            }
        }
    }

    fn send_init_response(&mut self) {
        // Advertise the absolute free capacity; any unadvertised release
        // is folded in rather than double counted.
        self.pending_release = 0;
        let window = self.local_free() as u16;
        tracing::debug!(window, "channel: sending init response");
        self.state = SendState::SendingInitResponse;
        self.transmit(ControlMessage::InitResponse { window });
    }

    fn send_release(&mut self) {
        let amount = self.pending_release.min(u16::MAX as usize) as u16;
        self.pending_release -= amount as usize;
        tracing::trace!(window = amount, "channel: sending window release");
        self.state = SendState::SendingReleaseWindow;
        self.transmit(ControlMessage::ReleaseWindow { window: amount });
    }

    fn transmit(&mut self, record: ControlMessage) {
        self.events.push_back(ChannelEvent::Transmit(record.pack()));
    }

    /// Receive capacity not currently held by unacked messages.
    fn local_free(&self) -> usize {
        self.config.receive_window as usize - self.occupied
    }
}
