//! Request envelope construction.
//!
//! An envelope is what the transport actually sends: the encrypted payload
//! (`authData`) and the headers that let the server decrypt and authorize
//! it. Building one is a four-step pipeline:
//!
//! 1. Validate the parameters against the operation catalog.
//! 2. Assemble headers: the base set (content type, app key, IV), then any
//!    caller-supplied `headers` mapping, then the wallet access token for
//!    wallet operations. Later layers win on name collisions, compared
//!    case-insensitively.
//! 3. Strip `headers` out of the parameters, and `walletToken` too for
//!    wallet operations; those travel as headers only. Any other operation
//!    keeps `walletToken` as an ordinary field. Serialize what is left as
//!    JSON with sorted keys.
//! 4. Encrypt the JSON with a cipher instantiated for this call.
//!
//! Nothing here touches shared mutable state, so envelopes for concurrent
//! requests can be built from the same [`ClientConfig`] on any thread.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::ClientError;
use crate::operation::{Operation, WALLET_TOKEN_FIELD};
use crate::validation::{check_required, normalize_params};

pub const CONTENT_TYPE_HEADER: &str = "Content-Type";
pub const APP_KEY_HEADER: &str = "X-App-Key";
pub const IV_HEADER: &str = "X-IV";
pub const WALLET_TOKEN_HEADER: &str = "X-App-Wallet-Access-Token";

/// Parameter key carrying caller-supplied headers.
pub const HEADERS_FIELD: &str = "headers";

/// Header name → value. Ordered so that envelopes print and compare stably.
pub type Headers = BTreeMap<String, String>;

/// An encrypted request, ready for the transport.
///
/// Built fresh for every call and owned by the caller; the core keeps no
/// reference to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Base64 AES-256-CBC ciphertext of the JSON payload.
    #[serde(rename = "authData")]
    pub auth_data: String,
    pub headers: Headers,
}

impl RequestEnvelope {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Validate `params` for `operation` and build its encrypted envelope.
///
/// # Errors
///
/// - Any [`crate::validation::validate`] failure, unchanged.
/// - [`ClientError::InvalidParameterShape`] if `headers` is not a mapping
///   of strings, or the wallet token is not a string.
/// - [`ClientError::MissingWalletToken`] for a wallet operation whose
///   `walletToken` is `null` or empty.
pub fn construct(
    config: &ClientConfig,
    params: &Value,
    operation: Operation,
) -> Result<RequestEnvelope, ClientError> {
    let mut params = normalize_params(params)?;
    check_required(&params, operation)?;

    let mut headers = base_headers(config);
    if let Some(caller_headers) = params.remove(HEADERS_FIELD) {
        merge_caller_headers(&mut headers, caller_headers)?;
    }

    if operation.is_wallet_operation() {
        let token = require_wallet_token(params.remove(WALLET_TOKEN_FIELD))?;
        insert_header(&mut headers, WALLET_TOKEN_HEADER, token);
    }

    let plaintext = serde_json::to_vec(&Value::Object(params))?;
    let auth_data = config.seal(&plaintext);

    tracing::debug!(
        %operation,
        headers = headers.len(),
        payload_bytes = plaintext.len(),
        "request envelope constructed"
    );

    Ok(RequestEnvelope { auth_data, headers })
}

/// Decrypt an envelope's `authData` back into its JSON payload.
pub fn open(config: &ClientConfig, envelope: &RequestEnvelope) -> Result<Value, ClientError> {
    open_auth_data(config, &envelope.auth_data)
}

/// Decrypt a bare `authData` string back into its JSON payload.
pub fn open_auth_data(config: &ClientConfig, auth_data: &str) -> Result<Value, ClientError> {
    let plaintext = config.open(auth_data)?;
    Ok(serde_json::from_slice(&plaintext)?)
}

fn base_headers(config: &ClientConfig) -> Headers {
    let mut headers = Headers::new();
    headers.insert(CONTENT_TYPE_HEADER.to_string(), "application/json".to_string());
    headers.insert(APP_KEY_HEADER.to_string(), config.app_key().to_string());
    headers.insert(IV_HEADER.to_string(), config.encryption_iv().to_string());
    headers
}

fn merge_caller_headers(headers: &mut Headers, caller: Value) -> Result<(), ClientError> {
    let caller = match caller {
        Value::Null => return Ok(()),
        Value::Object(map) => map,
        _ => {
            return Err(ClientError::InvalidParameterShape(
                "headers must be a mapping of header name to string value".to_string(),
            ))
        }
    };

    for (name, value) in caller {
        let Value::String(value) = value else {
            return Err(ClientError::InvalidParameterShape(format!(
                "header {name} must have a string value"
            )));
        };
        insert_header(headers, &name, value);
    }
    Ok(())
}

fn require_wallet_token(token: Option<Value>) -> Result<String, ClientError> {
    match token {
        None | Some(Value::Null) => Err(ClientError::MissingWalletToken),
        Some(Value::String(t)) if t.is_empty() => Err(ClientError::MissingWalletToken),
        Some(Value::String(t)) => Ok(t),
        Some(_) => Err(ClientError::InvalidParameterShape(format!(
            "{WALLET_TOKEN_FIELD} must be a string"
        ))),
    }
}

/// Insert a header, replacing any existing one with the same name in any
/// letter case.
fn insert_header(headers: &mut Headers, name: &str, value: String) {
    headers.retain(|k, _| !k.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value);
}
