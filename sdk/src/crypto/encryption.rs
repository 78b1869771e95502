//! # AES-256-CBC Encryption
//!
//! The Eyowo API expects request payloads encrypted with AES-256 in CBC
//! mode, PKCS#7 padded, under a key derived from the app key and the IV the
//! client advertises in the `X-IV` header.
//!
//! CBC carries no authentication tag. A wrong key usually surfaces as a
//! padding failure on decrypt, but not always; callers that need integrity
//! must get it from TLS, not from here.
//!
//! ## Wire format
//!
//! [`seal`] returns the ciphertext as standard base64, which is what goes
//! into the `authData` field. [`open`] reverses it.

use aes::Aes256;
use base64::Engine;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use thiserror::Error;

use crate::config::{AES_BLOCK_LENGTH, AES_KEY_LENGTH};

type Aes256CbcEnc = cbc::Encryptor<Aes256>;
type Aes256CbcDec = cbc::Decryptor<Aes256>;

/// Errors that can occur while decrypting.
///
/// Encryption itself cannot fail: key and IV lengths are enforced by the
/// type system and PKCS#7 pads any input.
#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("decryption failed -- wrong key, wrong IV or corrupted ciphertext")]
    DecryptFailed,

    #[error("auth data is not valid base64")]
    InvalidEncoding,
}

/// Encrypt `plaintext` with AES-256-CBC and PKCS#7 padding.
///
/// The output length is always the next multiple of 16 above the input
/// length (a full padding block is added when the input is block-aligned).
///
/// # Example
///
/// ```
/// use eyowo::crypto::encryption::{encrypt, decrypt};
///
/// let key = [0x42u8; 32];
/// let iv = [0x24u8; 16];
///
/// let ciphertext = encrypt(&key, &iv, b"{\"mobile\":\"1\"}");
/// let recovered = decrypt(&key, &iv, &ciphertext).unwrap();
/// assert_eq!(recovered, b"{\"mobile\":\"1\"}");
/// ```
pub fn encrypt(
    key: &[u8; AES_KEY_LENGTH],
    iv: &[u8; AES_BLOCK_LENGTH],
    plaintext: &[u8],
) -> Vec<u8> {
    Aes256CbcEnc::new(key.into(), iv.into()).encrypt_padded_vec_mut::<Pkcs7>(plaintext)
}

/// Decrypt data produced by [`encrypt`] with the same key and IV.
///
/// # Errors
///
/// Returns [`EncryptionError::DecryptFailed`] when the ciphertext is not a
/// whole number of blocks or the padding does not check out.
pub fn decrypt(
    key: &[u8; AES_KEY_LENGTH],
    iv: &[u8; AES_BLOCK_LENGTH],
    ciphertext: &[u8],
) -> Result<Vec<u8>, EncryptionError> {
    Aes256CbcDec::new(key.into(), iv.into())
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| EncryptionError::DecryptFailed)
}

/// Encrypt and base64-encode, producing an `authData` string.
pub fn seal(key: &[u8; AES_KEY_LENGTH], iv: &[u8; AES_BLOCK_LENGTH], plaintext: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(encrypt(key, iv, plaintext))
}

/// Decode and decrypt an `authData` string produced by [`seal`].
pub fn open(
    key: &[u8; AES_KEY_LENGTH],
    iv: &[u8; AES_BLOCK_LENGTH],
    auth_data: &str,
) -> Result<Vec<u8>, EncryptionError> {
    let ciphertext = base64::engine::general_purpose::STANDARD
        .decode(auth_data)
        .map_err(|_| EncryptionError::InvalidEncoding)?;
    decrypt(key, iv, &ciphertext)
}
