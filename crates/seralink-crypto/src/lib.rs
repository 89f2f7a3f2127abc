//! Cryptographic primitives for the seralink secured channel.
//!
//! Provides the single AEAD construction the secured channel speaks
//! (AES-128-GCM with a 16-byte counter IV and a 16-byte trailing tag) and
//! the per-direction session key material with its deterministic IV
//! advance.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod error;
pub mod gcm;
pub mod iv;

pub use error::CryptoError;
pub use gcm::{gcm_open, gcm_seal, BLOCK_SIZE, IV_SIZE, KEY_SIZE, TAG_SIZE};
pub use iv::{Iv, SessionKey};
