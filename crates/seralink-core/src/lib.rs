//! Wire-level building blocks for the seralink transport stack.
//!
//! This crate defines the COBS frame codec used to delimit messages on a raw
//! byte link, and the control-record wire format exchanged by the windowed
//! channel layer. It contains no protocol state beyond the streaming frame
//! decoder and performs no I/O.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod control;
pub mod error;
pub mod framing;

pub use control::ControlMessage;
pub use error::{ControlError, FramingError};
pub use framing::cobs::{cobs_encode, cobs_frame, framed_size, max_message_size};
pub use framing::decoder::{cobs_unframe, CobsDecoder};
