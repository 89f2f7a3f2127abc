//! Error types for the seralink-core crate.

use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramingError {
    MissingDelimiter,
    TruncatedFrame,
}

impl fmt::Display for FramingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FramingError::MissingDelimiter => write!(f, "missing frame delimiter"),
            FramingError::TruncatedFrame => write!(f, "frame truncated before delimiter"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FramingError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlError {
    Empty,
    TooShort { tag: u8, min: usize, actual: usize },
    UnknownTag(u8),
}

impl fmt::Display for ControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlError::Empty => write!(f, "empty control record"),
            ControlError::TooShort { tag, min, actual } => {
                write!(
                    f,
                    "control record 0x{tag:02x} too short: need {min} bytes, got {actual}"
                )
            }
            ControlError::UnknownTag(tag) => write!(f, "unknown control tag: 0x{tag:02x}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ControlError {}
