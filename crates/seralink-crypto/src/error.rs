use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoError {
    AuthenticationFailed,
    InvalidLength { reason: &'static str },
}

impl fmt::Display for CryptoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CryptoError::AuthenticationFailed => write!(f, "authentication tag mismatch"),
            CryptoError::InvalidLength { reason } => write!(f, "invalid length: {reason}"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for CryptoError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crypto_error_display_all_variants() {
        let variants = [
            CryptoError::AuthenticationFailed,
            CryptoError::InvalidLength {
                reason: "too short",
            },
        ];
        for variant in &variants {
            let msg = variant.to_string();
            assert!(!msg.is_empty(), "{variant:?} should have non-empty Display");
        }
    }
}
