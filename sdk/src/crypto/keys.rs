//! Key and IV handling.
//!
//! The app key is an arbitrary-length string, so it is never used as AES key
//! bytes directly: the cipher key is `SHA-256(app_key)`, which is always
//! exactly 32 bytes. The IV is carried around as 32 hex characters (that is
//! the form sent in the `X-IV` header) and decoded to the 16-byte AES block
//! only when a cipher is instantiated.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::config::{AES_BLOCK_LENGTH, AES_KEY_LENGTH, ENCRYPTION_IV_LENGTH};
use crate::error::ClientError;

/// Derive the AES-256 key from the app key.
pub fn derive_key(app_key: &str) -> [u8; AES_KEY_LENGTH] {
    Sha256::digest(app_key.as_bytes()).into()
}

/// Generate a fresh IV from the OS CSPRNG, hex-encoded.
///
/// Always returns exactly [`ENCRYPTION_IV_LENGTH`] characters.
pub fn generate_iv() -> String {
    let mut iv = [0u8; AES_BLOCK_LENGTH];
    rand::rngs::OsRng.fill_bytes(&mut iv);
    hex::encode(iv)
}

/// Validate a 32-character IV string and decode it to the AES block.
///
/// Length is checked first so that a wrong-length IV is always reported as
/// [`ClientError::InvalidEncryptionIv`], whatever its contents.
pub fn parse_iv(iv: &str) -> Result<[u8; AES_BLOCK_LENGTH], ClientError> {
    let len = iv.chars().count();
    if len != ENCRYPTION_IV_LENGTH {
        return Err(ClientError::InvalidEncryptionIv(len));
    }

    let mut out = [0u8; AES_BLOCK_LENGTH];
    hex::decode_to_slice(iv, &mut out).map_err(|_| ClientError::MalformedEncryptionIv)?;
    Ok(out)
}
