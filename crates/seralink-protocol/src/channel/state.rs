//! Channel send states and pure window accounting.
//!
//! [`SendState`] names the five states of the send direction; the
//! functions here are the window arithmetic the channel decides with,
//! kept free of I/O and channel bookkeeping.

use seralink_core::control::MESSAGE_OVERHEAD;
use seralink_core::framing::cobs::framed_size;

/// State of the channel's send direction. Exactly one is active at a
/// time; receive processing is an asynchronous input that can trigger
/// transitions. `Operational` is the steady state; there is no terminal
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    /// Transmitting our opening Init.
    SendingInit,
    /// Transmitting an InitResponse to the peer's Init.
    SendingInitResponse,
    /// Idle; sends are granted from here.
    Operational,
    /// Transmitting an application Message.
    SendingMessage,
    /// Transmitting a ReleaseWindow.
    SendingReleaseWindow,
}

/// Window bytes a Message with `payload_len` payload bytes consumes:
/// the framed size of the tag byte plus payload.
pub fn message_wire_size(payload_len: usize) -> usize {
    framed_size(MESSAGE_OVERHEAD + payload_len)
}

/// Whether a Message with `payload_len` payload bytes fits `window`.
pub fn fits_window(window: usize, payload_len: usize) -> bool {
    message_wire_size(payload_len) <= window
}

/// Whether enough freed bytes have accumulated to advertise a release.
pub fn release_due(pending_release: usize, guard: u16) -> bool {
    pending_release > 0 && pending_release >= guard as usize
}
