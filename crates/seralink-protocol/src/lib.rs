//! Protocol state machines for the seralink transport stack.
//!
//! This crate implements the stateful layers between a raw byte transport
//! and the application: the COBS [`framer`], the flow-controlled
//! [`channel`], the AEAD [`secure`] layer, and the [`stack`] driver that
//! composes them.
//!
//! Every layer is a single-threaded state machine driven synchronously
//! from whichever transport callback fires (data arrived, write
//! completed). Layers never perform I/O: they emit actions through a
//! drained event queue, which also serves as the upward notification
//! path ("you may send now", "a message arrived").

pub mod channel;
pub mod error;
pub mod framer;
pub mod secure;
pub mod stack;

pub use channel::{ChannelConfig, ChannelEvent, WindowedChannel};
pub use error::SecureError;
pub use framer::{Framer, FramerEvent};
pub use secure::SecuredChannel;
pub use stack::{LinkStack, StackConfig, StackEvent};
