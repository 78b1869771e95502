//! Error types for the Eyowo client.
//!
//! [`ClientError`] covers everything the request-construction core can
//! reject: configuration, parameter validation and encryption. All of it is
//! deterministic for a given input, so none of it is ever retried.
//! [`TransportError`] wraps it for the network layer, which is the only
//! place retries happen.

use thiserror::Error;

use crate::crypto::EncryptionError;

/// Errors raised while configuring the client or building a request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// `init` was called without a required credential.
    #[error("{0} is a required client configuration and must be specified")]
    MissingRequiredConfig(String),

    /// The environment (explicit option or `APP_ENV`) is not permitted.
    #[error("invalid environment {0:?}: permitted values are production, sandbox, development, test")]
    InvalidEnvironment(String),

    /// The supplied encryption IV is not exactly 32 characters long.
    #[error("invalid encryption IV: expected 32 characters, got {0}")]
    InvalidEncryptionIv(usize),

    /// The supplied encryption IV has the right length but is not hex.
    #[error("invalid encryption IV: expected 32 hex characters")]
    MalformedEncryptionIv,

    /// Request parameters are not a key-value mapping (or contain a value of
    /// the wrong shape, such as a non-string header).
    #[error("invalid parameter shape: {0}")]
    InvalidParameterShape(String),

    /// The operation kind is not in the catalog.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The first required field (in declared order) that is missing.
    #[error("{0} is required")]
    MissingRequiredParam(String),

    /// A wallet operation was invoked without a usable wallet token.
    #[error("wallet operation requires a wallet token")]
    MissingWalletToken,

    /// The cipher rejected its input.
    #[error("encryption error: {0}")]
    Encryption(#[from] EncryptionError),

    /// The payload could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors raised while sending a prepared request.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be built in the first place.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Build(String),

    /// Connection-level failure after exhausting retries.
    #[error("network error after {attempts} attempt(s): {message}")]
    Network {
        /// How many attempts were made in total.
        attempts: u32,
        /// The last underlying error.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("API returned HTTP {status}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("failed to decode response: {0}")]
    Decode(String),
}
