//! Windowed-channel defaults.
//!
//! The release guard trades control-message overhead against how quickly
//! the peer's window is replenished; it is configuration, not a protocol
//! invariant.

/// Default framer buffer capacity in bytes.
pub const DEFAULT_BUFFER_CAPACITY: usize = 1024;

/// Default receive window advertised to the peer, in framed bytes.
pub const DEFAULT_RECEIVE_WINDOW: u16 = 1024;

/// Default freed-byte threshold before a ReleaseWindow is sent.
pub const DEFAULT_RELEASE_GUARD: u16 = 256;
