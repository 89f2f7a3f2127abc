//! COBS frame codec.
//!
//! Consistent Overhead Byte Stuffing removes all zero bytes from a payload
//! via length-prefixed chunks, reserving zero exclusively as the frame
//! delimiter. [`cobs`] holds the pure encoding functions and frame-size
//! arithmetic; [`decoder`] holds the streaming decoder used on the receive
//! path.

pub mod cobs;
pub mod decoder;
