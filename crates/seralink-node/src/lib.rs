//! Demo node for the seralink transport stack.
//!
//! Wires two [`seralink_protocol::LinkStack`]s back to back and runs a
//! configurable message exchange over the simulated serial line,
//! optionally secured with AES-128-GCM.

pub mod config;
pub mod error;
pub mod logging;
pub mod loopback;

pub use config::NodeConfig;
pub use error::NodeError;
pub use loopback::{run, LoopbackStats};
