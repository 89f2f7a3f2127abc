//! Windowed-channel control records.
//!
//! Every frame exchanged by the windowed channel carries one control
//! record. The first byte is the tag; Init, InitResponse and ReleaseWindow
//! carry a little-endian 16-bit window value, Message carries opaque
//! payload:
//!
//! ```text
//! 0x01 window(2)    Init
//! 0x02 window(2)    InitResponse
//! 0x03 window(2)    ReleaseWindow
//! 0x04 payload(var) Message
//! ```

extern crate alloc;
use alloc::vec::Vec;

use crate::error::ControlError;

pub const TAG_INIT: u8 = 0x01;
pub const TAG_INIT_RESPONSE: u8 = 0x02;
pub const TAG_RELEASE_WINDOW: u8 = 0x03;
pub const TAG_MESSAGE: u8 = 0x04;

/// Record overhead of a Message: the tag byte.
pub const MESSAGE_OVERHEAD: usize = 1;

/// Size of the window-bearing records on the wire.
pub const WINDOW_RECORD_SIZE: usize = 3;

/// A control record exchanged between windowed-channel peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlMessage {
    /// Opens the handshake, advertising the sender's receive window.
    Init { window: u16 },
    /// Answers an Init, advertising the responder's receive window.
    InitResponse { window: u16 },
    /// Returns freed receive-buffer bytes to the peer.
    ReleaseWindow { window: u16 },
    /// Opaque application payload.
    Message(Vec<u8>),
}

impl ControlMessage {
    /// Pack the record into its wire format.
    pub fn pack(&self) -> Vec<u8> {
        match self {
            ControlMessage::Init { window } => pack_window(TAG_INIT, *window),
            ControlMessage::InitResponse { window } => pack_window(TAG_INIT_RESPONSE, *window),
            ControlMessage::ReleaseWindow { window } => pack_window(TAG_RELEASE_WINDOW, *window),
            ControlMessage::Message(payload) => {
                let mut buf = Vec::with_capacity(MESSAGE_OVERHEAD + payload.len());
                buf.push(TAG_MESSAGE);
                buf.extend_from_slice(payload);
                buf
            }
        }
    }

    /// Unpack a record from its wire format.
    pub fn unpack(data: &[u8]) -> Result<Self, ControlError> {
        let (&tag, rest) = data.split_first().ok_or(ControlError::Empty)?;
        match tag {
            TAG_INIT => Ok(ControlMessage::Init {
                window: unpack_window(tag, rest)?,
            }),
            TAG_INIT_RESPONSE => Ok(ControlMessage::InitResponse {
                window: unpack_window(tag, rest)?,
            }),
            TAG_RELEASE_WINDOW => Ok(ControlMessage::ReleaseWindow {
                window: unpack_window(tag, rest)?,
            }),
            TAG_MESSAGE => Ok(ControlMessage::Message(rest.to_vec())),
            other => Err(ControlError::UnknownTag(other)),
        }
    }

    /// Record length on the wire, before framing.
    pub fn wire_len(&self) -> usize {
        match self {
            ControlMessage::Message(payload) => MESSAGE_OVERHEAD + payload.len(),
            _ => WINDOW_RECORD_SIZE,
        }
    }
}

fn pack_window(tag: u8, window: u16) -> Vec<u8> {
    let mut buf = Vec::with_capacity(WINDOW_RECORD_SIZE);
    buf.push(tag);
    buf.extend_from_slice(&window.to_le_bytes());
    buf
}

fn unpack_window(tag: u8, rest: &[u8]) -> Result<u16, ControlError> {
    if rest.len() < 2 {
        return Err(ControlError::TooShort {
            tag,
            min: WINDOW_RECORD_SIZE,
            actual: rest.len() + 1,
        });
    }
    Ok(u16::from_le_bytes([rest[0], rest[1]]))
}
