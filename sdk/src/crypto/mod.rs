//! # Cryptographic Primitives
//!
//! Everything the client does with key material lives here: deriving the
//! AES-256 key from the app key, producing and parsing the 32-character IV,
//! and the CBC encrypt/decrypt pair used for request payloads.
//!
//! There is no long-lived cipher object anywhere in the crate. Each call
//! instantiates its own CBC context from the immutable key and IV, so any
//! number of threads can encrypt at once without coordination.

pub mod encryption;
pub mod keys;

pub use encryption::{decrypt, encrypt, open, seal, EncryptionError};
pub use keys::{derive_key, generate_iv, parse_iv};
