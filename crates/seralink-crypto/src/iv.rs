//! Counter IVs and per-direction session key material.
//!
//! Each direction of a secured channel holds a 16-byte key and a 16-byte
//! IV. The IV advances by one after every successfully processed message
//! in that direction, so an IV value is never reused under the same key.
//! Long-lived sessions must re-key before the counter space wraps.

use crate::gcm::IV_SIZE;

/// A 16-byte deterministically incrementing IV.
///
/// Treated as a big-endian counter: [`Iv::increment`] adds one with carry
/// from the last byte, wrapping at the full 128-bit width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iv([u8; IV_SIZE]);

impl Iv {
    pub fn new(bytes: [u8; IV_SIZE]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; IV_SIZE] {
        &self.0
    }

    /// Advance the counter by one.
    pub fn increment(&mut self) {
        for byte in self.0.iter_mut().rev() {
            let (next, carry) = byte.overflowing_add(1);
            *byte = next;
            if !carry {
                break;
            }
        }
    }
}

/// Key material for one direction of a secured channel.
#[derive(Debug, Clone, Copy)]
pub struct SessionKey {
    pub key: [u8; 16],
    pub iv: Iv,
}

impl SessionKey {
    pub fn new(key: [u8; 16], iv: [u8; IV_SIZE]) -> Self {
        Self {
            key,
            iv: Iv::new(iv),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increment_simple() {
        let mut iv = Iv::new([0u8; 16]);
        iv.increment();
        let mut expected = [0u8; 16];
        expected[15] = 1;
        assert_eq!(iv.as_bytes(), &expected);
    }

    #[test]
    fn test_increment_carries() {
        let mut bytes = [0u8; 16];
        bytes[15] = 0xFF;
        bytes[14] = 0xFF;
        let mut iv = Iv::new(bytes);
        iv.increment();
        let mut expected = [0u8; 16];
        expected[13] = 1;
        assert_eq!(iv.as_bytes(), &expected);
    }

    #[test]
    fn test_increment_wraps_full_width() {
        let mut iv = Iv::new([0xFF; 16]);
        iv.increment();
        assert_eq!(iv.as_bytes(), &[0u8; 16]);
    }

    #[test]
    fn test_sequential_values_distinct() {
        let mut iv = Iv::new([0u8; 16]);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(*iv.as_bytes()));
            iv.increment();
        }
    }
}
