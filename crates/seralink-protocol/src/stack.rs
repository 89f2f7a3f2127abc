//! The assembled link stack: framer, windowed channel and optional
//! secured channel behind one driver surface.
//!
//! The transport owner feeds `on_data_received` / `on_write_complete`
//! callbacks in and drains [`StackEvent`]s out; everything between the
//! raw byte link and application messages happens inside. Layer wiring
//! runs to a fixpoint on every entry point, so a single callback can
//! carry a frame all the way up to a [`StackEvent::Received`].

use std::collections::VecDeque;

use seralink_core::control::MESSAGE_OVERHEAD;

use crate::channel::{
    ChannelConfig, ChannelEvent, WindowedChannel, DEFAULT_BUFFER_CAPACITY,
    DEFAULT_RECEIVE_WINDOW, DEFAULT_RELEASE_GUARD,
};
use crate::error::SecureError;
use crate::framer::{Framer, FramerEvent};
use crate::secure::SecuredChannel;
use seralink_crypto::iv::SessionKey;

/// Link-stack tunables.
#[derive(Debug, Clone, Copy)]
pub struct StackConfig {
    /// Framer staging/accumulation buffer size, in bytes.
    pub buffer_capacity: usize,
    /// Receive window advertised to the peer, in framed bytes.
    pub receive_window: u16,
    /// Freed bytes accumulated before a ReleaseWindow goes out.
    pub release_guard: u16,
    /// Run payloads through the AEAD layer.
    pub secured: bool,
}

impl Default for StackConfig {
    fn default() -> Self {
        Self {
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            receive_window: DEFAULT_RECEIVE_WINDOW,
            release_guard: DEFAULT_RELEASE_GUARD,
            secured: false,
        }
    }
}

/// Actions and notifications produced by the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StackEvent {
    /// Raw bytes for the transport. Confirm with
    /// [`LinkStack::on_write_complete`] before the next write is
    /// released.
    Write(Vec<u8>),
    /// An earlier [`LinkStack::request_send`] may proceed: call
    /// [`LinkStack::send`] with up to `size` bytes.
    SendReady { size: usize },
    /// An application message arrived. Release it with
    /// [`LinkStack::ack_received`].
    Received(Vec<u8>),
}

/// Full transport stack over one raw byte link.
pub struct LinkStack {
    framer: Framer,
    channel: WindowedChannel,
    secure: SecuredChannel,
    secured: bool,
    events: VecDeque<StackEvent>,
}

impl LinkStack {
    pub fn new(config: StackConfig) -> Self {
        let framer = Framer::new(config.buffer_capacity);
        let channel = WindowedChannel::new(ChannelConfig {
            max_payload: framer.max_send_message_size() - MESSAGE_OVERHEAD,
            receive_window: config.receive_window,
            release_guard: config.release_guard,
        });
        let mut stack = Self {
            framer,
            channel,
            secure: SecuredChannel::new(),
            secured: config.secured,
            events: VecDeque::new(),
        };
        // Carry the channel's opening Init down to the wire.
        stack.pump();
        stack
    }

    /// Per-message bytes consumed by the AEAD layer, if any.
    fn seal_overhead(&self) -> usize {
        if self.secured {
            SecuredChannel::overhead()
        } else {
            0
        }
    }

    /// Largest application payload [`LinkStack::request_send`] accepts.
    pub fn max_send_size(&self) -> usize {
        self.channel.max_send_message_size() - self.seal_overhead()
    }

    /// Install the AEAD key material for the send direction.
    ///
    /// # Panics
    ///
    /// Panics on an unsecured stack.
    pub fn set_send_key(&mut self, key: SessionKey) {
        assert!(self.secured, "send key on an unsecured stack");
        self.secure.set_send_key(key);
    }

    /// Install the AEAD key material for the receive direction.
    ///
    /// # Panics
    ///
    /// Panics on an unsecured stack.
    pub fn set_receive_key(&mut self, key: SessionKey) {
        assert!(self.secured, "receive key on an unsecured stack");
        self.secure.set_receive_key(key);
    }

    /// Request to send an application message of `size` bytes; answered
    /// with [`StackEvent::SendReady`] once the window permits.
    ///
    /// # Panics
    ///
    /// Panics if `size` exceeds [`LinkStack::max_send_size`] or a request
    /// is already outstanding.
    pub fn request_send(&mut self, size: usize) {
        assert!(
            size <= self.max_send_size(),
            "message of {size} bytes exceeds max {}",
            self.max_send_size()
        );
        self.channel.request_send_message(size + self.seal_overhead());
        self.pump();
    }

    /// Send the payload for the granted request, sealing it first on a
    /// secured stack.
    ///
    /// # Errors
    ///
    /// Returns [`SecureError::MissingSendKey`] on a secured stack with no
    /// send key installed; the grant stays consumed either way.
    pub fn send(&mut self, payload: Vec<u8>) -> Result<(), SecureError> {
        let record = if self.secured {
            self.secure.seal(&payload)?
        } else {
            payload
        };
        self.channel.send_message(record);
        self.pump();
        Ok(())
    }

    /// Feed raw bytes received from the transport.
    pub fn on_data_received(&mut self, data: &[u8]) {
        self.framer.on_data_received(data);
        self.pump();
    }

    /// The transport finished the previously released write.
    pub fn on_write_complete(&mut self) {
        self.framer.on_write_complete();
        self.pump();
    }

    /// Release the previously delivered message, freeing receive window.
    pub fn ack_received(&mut self) {
        self.channel.ack_received();
        self.pump();
    }

    /// Drain the next pending event.
    pub fn poll_event(&mut self) -> Option<StackEvent> {
        self.events.pop_front()
    }

    /// Shuttle events between the layers until none produces more.
    fn pump(&mut self) {
        loop {
            let mut progressed = false;
            while let Some(event) = self.framer.poll_event() {
                progressed = true;
                match event {
                    FramerEvent::Write(bytes) => self.events.push_back(StackEvent::Write(bytes)),
                    FramerEvent::SendComplete => self.channel.on_send_complete(),
                    FramerEvent::FrameReceived(frame) => self.channel.on_frame_received(&frame),
                }
            }
            while let Some(event) = self.channel.poll_event() {
                progressed = true;
                match event {
                    ChannelEvent::Transmit(record) => self.framer.send_frame(record),
                    ChannelEvent::SendGranted { size } => self.events.push_back(
                        StackEvent::SendReady {
                            size: size - self.seal_overhead(),
                        },
                    ),
                    ChannelEvent::MessageReceived(payload) => self.deliver(payload),
                }
            }
            if !progressed {
                return;
            }
        }
    }

    fn deliver(&mut self, payload: Vec<u8>) {
        if !self.secured {
            self.events.push_back(StackEvent::Received(payload));
            return;
        }
        match self.secure.open(&payload) {
            Some(plaintext) => self.events.push_back(StackEvent::Received(plaintext)),
            // Dropped silently, but its window must not leak: ack the
            // channel slot the dropped message held.
            None => self.channel.ack_received(),
        }
    }
}
