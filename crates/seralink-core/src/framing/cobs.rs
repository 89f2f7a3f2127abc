//! COBS encoding and frame-size arithmetic.
//!
//! A frame body is a sequence of chunks. Each chunk is an overhead byte
//! followed by up to 254 non-zero literal bytes: overhead `N` (2..=254)
//! means `N-1` literals followed by an implicit zero in the payload;
//! overhead 255 means 254 literals with no implicit zero; overhead 1 means
//! an empty chunk standing for a single zero. The body contains no zero
//! bytes, so zero serves exclusively as the frame delimiter.

extern crate alloc;
use alloc::vec::Vec;

/// Frame delimiter byte. Never appears inside an encoded body.
pub const DELIMITER: u8 = 0x00;

/// Maximum literal bytes per chunk.
pub const MAX_CHUNK: usize = 254;

/// Overhead byte marking a full 254-literal chunk with no implicit zero.
pub const OVERHEAD_MAX: u8 = 0xFF;

/// One encoded chunk of a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Overhead byte to emit before the literals.
    pub overhead: u8,
    /// Number of literal payload bytes in this chunk.
    pub literals: usize,
    /// Payload bytes consumed, including a terminating zero if present.
    pub consumed: usize,
}

/// Compute the next chunk of `remaining` payload bytes.
///
/// Scans at most [`MAX_CHUNK`] bytes for a zero. A zero terminates the
/// chunk and is consumed (it is represented by the chunk boundary itself);
/// a full 254-byte run without a zero yields overhead [`OVERHEAD_MAX`].
pub fn next_chunk(remaining: &[u8]) -> Chunk {
    let scan = remaining.len().min(MAX_CHUNK);
    match remaining[..scan].iter().position(|&b| b == DELIMITER) {
        Some(d) => Chunk {
            overhead: (d + 1) as u8,
            literals: d,
            consumed: d + 1,
        },
        None if remaining.len() >= MAX_CHUNK => Chunk {
            overhead: OVERHEAD_MAX,
            literals: MAX_CHUNK,
            consumed: MAX_CHUNK,
        },
        None => Chunk {
            overhead: (scan + 1) as u8,
            literals: scan,
            consumed: scan,
        },
    }
}

/// Encode a payload into a COBS body (no delimiters).
///
/// The result contains no zero bytes.
pub fn cobs_encode(payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(framed_size(payload.len()));
    let mut cursor = 0;
    loop {
        let chunk = next_chunk(&payload[cursor..]);
        out.push(chunk.overhead);
        out.extend_from_slice(&payload[cursor..cursor + chunk.literals]);
        cursor += chunk.consumed;
        if cursor >= payload.len() {
            // A chunk that ended by consuming the final payload byte as a
            // zero still owes an empty chunk to represent it.
            if chunk.consumed > chunk.literals {
                out.push(1);
            }
            break;
        }
    }
    out
}

/// Encode a payload into a complete self-delimiting frame:
/// `DELIMITER || body || DELIMITER`.
///
/// On a live link the leading delimiter is emitted only for the very first
/// frame (the previous frame's closing delimiter doubles as the opener);
/// this function produces the first-frame form.
pub fn cobs_frame(payload: &[u8]) -> Vec<u8> {
    let body = cobs_encode(payload);
    let mut framed = Vec::with_capacity(body.len() + 2);
    framed.push(DELIMITER);
    framed.extend_from_slice(&body);
    framed.push(DELIMITER);
    framed
}

/// Wire size charged against the window for a payload of `len` bytes.
///
/// `len + floor(len/254) + 2`: the payload, one overhead byte per started
/// 254-byte run, and the delimiter pair. Both peers account with this same
/// formula, so the slight overestimate for exact 254-multiples is harmless.
pub const fn framed_size(len: usize) -> usize {
    len + len / MAX_CHUNK + 2
}

/// Largest payload a buffer of `capacity` bytes can hold once framed:
/// `capacity - 2 - floor(capacity/255)`.
pub const fn max_message_size(capacity: usize) -> usize {
    capacity.saturating_sub(2 + capacity / 255)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_simple_payload() {
        // {1,2,3,4} -> [0,5,1,2,3,4,0]
        assert_eq!(cobs_frame(&[1, 2, 3, 4]), [0, 5, 1, 2, 3, 4, 0]);
    }

    #[test]
    fn test_frame_embedded_zero() {
        // {1,0,3,4} -> [0,2,1,3,3,4,0]
        assert_eq!(cobs_frame(&[1, 0, 3, 4]), [0, 2, 1, 3, 3, 4, 0]);
    }

    #[test]
    fn test_encode_empty() {
        assert_eq!(cobs_encode(&[]), [1]);
    }

    #[test]
    fn test_encode_single_zero() {
        // The zero becomes two empty chunks.
        assert_eq!(cobs_encode(&[0]), [1, 1]);
    }

    #[test]
    fn test_encode_trailing_zero() {
        assert_eq!(cobs_encode(&[1, 0]), [2, 1, 1]);
    }

    #[test]
    fn test_encode_zero_run() {
        assert_eq!(cobs_encode(&[0, 0, 0]), [1, 1, 1, 1]);
    }

    #[test]
    fn test_encode_full_chunk() {
        // Exactly 254 non-zero bytes: single 0xFF chunk, no trailing group.
        let payload: Vec<u8> = (0..254).map(|i| (i % 255) as u8 + 1).collect();
        let body = cobs_encode(&payload);
        assert_eq!(body.len(), 255);
        assert_eq!(body[0], OVERHEAD_MAX);
        assert_eq!(&body[1..], payload.as_slice());
    }

    #[test]
    fn test_encode_over_full_chunk() {
        // 255 non-zero bytes: 0xFF chunk plus a 2-byte chunk.
        let payload = [0x41u8; 255];
        let body = cobs_encode(&payload);
        assert_eq!(body.len(), 257);
        assert_eq!(body[0], OVERHEAD_MAX);
        assert_eq!(body[255], 2);
        assert_eq!(body[256], 0x41);
    }

    #[test]
    fn test_encode_contains_no_zero() {
        let payload: Vec<u8> = (0..1000).map(|i| (i % 7) as u8).collect();
        assert!(!cobs_encode(&payload).contains(&DELIMITER));
    }

    #[test]
    fn test_next_chunk_boundaries() {
        assert_eq!(
            next_chunk(&[]),
            Chunk {
                overhead: 1,
                literals: 0,
                consumed: 0
            }
        );
        assert_eq!(
            next_chunk(&[0]),
            Chunk {
                overhead: 1,
                literals: 0,
                consumed: 1
            }
        );
        assert_eq!(
            next_chunk(&[7, 0, 9]),
            Chunk {
                overhead: 2,
                literals: 1,
                consumed: 2
            }
        );
        let long = [1u8; 300];
        assert_eq!(
            next_chunk(&long),
            Chunk {
                overhead: OVERHEAD_MAX,
                literals: MAX_CHUNK,
                consumed: MAX_CHUNK
            }
        );
    }

    #[test]
    fn test_framed_size() {
        assert_eq!(framed_size(0), 2);
        assert_eq!(framed_size(4), 6);
        assert_eq!(framed_size(5), 7);
        assert_eq!(framed_size(253), 255);
        assert_eq!(framed_size(254), 257);
        assert_eq!(framed_size(255), 258);
    }

    #[test]
    fn test_max_message_size() {
        assert_eq!(max_message_size(0), 0);
        assert_eq!(max_message_size(2), 0);
        assert_eq!(max_message_size(256), 253);
        assert_eq!(max_message_size(512), 508);
        // framed_size(max) never exceeds the buffer
        for capacity in [3usize, 64, 255, 256, 510, 511, 1024, 4096] {
            let max = max_message_size(capacity);
            assert!(
                framed_size(max) <= capacity,
                "framed_size({max}) = {} exceeds capacity {capacity}",
                framed_size(max)
            );
        }
    }
}
