//! TOML-based configuration for the demo node.

use std::path::Path;

use serde::Deserialize;

use seralink_crypto::iv::SessionKey;
use seralink_protocol::StackConfig;

use crate::error::NodeError;

/// Top-level node configuration loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct NodeConfig {
    #[serde(default)]
    pub link: LinkSection,
    #[serde(default)]
    pub security: SecuritySection,
    #[serde(default)]
    pub demo: DemoSection,
}

/// The `[link]` section: windowed-channel and framer tunables.
#[derive(Debug, Deserialize)]
pub struct LinkSection {
    /// Framer buffer size in bytes. Default: 1024.
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: usize,
    /// Receive window advertised to the peer, in framed bytes. Default: 1024.
    #[serde(default = "default_receive_window")]
    pub receive_window: u16,
    /// Freed bytes accumulated before a window release is sent. Default: 256.
    #[serde(default = "default_release_guard")]
    pub release_guard: u16,
}

/// The `[security]` section: AES-128-GCM key material, hex encoded.
///
/// `send_*` secures the A-to-B direction of the loopback demo and
/// `receive_*` the reverse; a real deployment would load each side's
/// half from its own provisioning.
#[derive(Debug, Default, Deserialize)]
pub struct SecuritySection {
    #[serde(default)]
    pub enabled: bool,
    pub send_key: Option<String>,
    pub send_iv: Option<String>,
    pub receive_key: Option<String>,
    pub receive_iv: Option<String>,
}

/// The `[demo]` section: loopback traffic shape.
#[derive(Debug, Deserialize)]
pub struct DemoSection {
    /// Messages exchanged in each direction. Default: 16.
    #[serde(default = "default_messages")]
    pub messages: u32,
    /// Payload size in bytes. Default: 64.
    #[serde(default = "default_payload_size")]
    pub payload_size: usize,
}

fn default_buffer_capacity() -> usize {
    1024
}

fn default_receive_window() -> u16 {
    1024
}

fn default_release_guard() -> u16 {
    256
}

fn default_messages() -> u32 {
    16
}

fn default_payload_size() -> usize {
    64
}

impl Default for LinkSection {
    fn default() -> Self {
        Self {
            buffer_capacity: default_buffer_capacity(),
            receive_window: default_receive_window(),
            release_guard: default_release_guard(),
        }
    }
}

impl Default for DemoSection {
    fn default() -> Self {
        Self {
            messages: default_messages(),
            payload_size: default_payload_size(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, NodeError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NodeError::Config(format!("failed to read config file: {e}")))?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(format!("failed to parse config: {e}")))
    }

    /// Stack tunables derived from the `[link]` and `[security]` sections.
    pub fn stack_config(&self) -> StackConfig {
        StackConfig {
            buffer_capacity: self.link.buffer_capacity,
            receive_window: self.link.receive_window,
            release_guard: self.link.release_guard,
            secured: self.security.enabled,
        }
    }

    /// Decode the key material for the A-to-B direction.
    pub fn send_session(&self) -> Result<SessionKey, NodeError> {
        session_from_hex(
            self.security.send_key.as_deref(),
            self.security.send_iv.as_deref(),
            "send_key",
            "send_iv",
        )
    }

    /// Decode the key material for the B-to-A direction.
    pub fn receive_session(&self) -> Result<SessionKey, NodeError> {
        session_from_hex(
            self.security.receive_key.as_deref(),
            self.security.receive_iv.as_deref(),
            "receive_key",
            "receive_iv",
        )
    }
}

fn session_from_hex(
    key: Option<&str>,
    iv: Option<&str>,
    key_field: &'static str,
    iv_field: &'static str,
) -> Result<SessionKey, NodeError> {
    Ok(SessionKey::new(
        bytes_from_hex(key, key_field)?,
        bytes_from_hex(iv, iv_field)?,
    ))
}

fn bytes_from_hex(value: Option<&str>, field: &'static str) -> Result<[u8; 16], NodeError> {
    let invalid = NodeError::InvalidKey {
        field,
        expected: 32,
    };
    let value = value.ok_or(invalid)?;
    let decoded = hex::decode(value).map_err(|_| NodeError::InvalidKey {
        field,
        expected: 32,
    })?;
    decoded.try_into().map_err(|_| NodeError::InvalidKey {
        field,
        expected: 32,
    })
}
