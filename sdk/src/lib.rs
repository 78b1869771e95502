// Copyright (c) 2026 Eyowo Developers. MIT License.
// See LICENSE for details.

//! # Eyowo: Rust Client Library
//!
//! A client for the Eyowo payments and wallet API. The HTTP calls are thin;
//! the interesting part is what happens before a request leaves the process:
//!
//! - **config**: Client configuration: credentials, cipher material,
//!   environment, base URL and the transport policy (timeouts, retries).
//! - **operation**: The closed catalog of API operations and the fields
//!   each one requires.
//! - **validation**: Checks a parameter mapping against the catalog.
//! - **crypto**: AES-256-CBC primitives. A fresh cipher per message.
//! - **envelope**: Turns validated parameters into an encrypted envelope
//!   (`authData` + headers) ready for the wire.
//! - **resources**: Balance, bills and transfers: path/method pairs.
//! - **transport**: The HTTP layer (reqwest), retries and timeouts.
//! - **client**: A small facade tying config and transport together.
//!
//! ## Quick start
//!
//! ```no_run
//! use eyowo::{Client, HttpTransport, InitOptions};
//! use serde_json::json;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = eyowo::init(&json!({ "appKey": "my-app-key" }), InitOptions::default())?;
//! let client = Client::new(config.clone(), HttpTransport::new(&config)?);
//!
//! let balance = client.get_balance(&json!({ "mobile": "2348000000000" })).await?;
//! println!("{}", balance.body);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod crypto;
pub mod envelope;
pub mod error;
pub mod operation;
pub mod resources;
pub mod transport;
pub mod validation;

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

pub use client::Client;
pub use config::{ClientConfig, Environment, InitOptions};
pub use envelope::RequestEnvelope;
pub use error::{ClientError, TransportError};
pub use operation::{Operation, OperationSpec};
pub use resources::{Balance, Bills, HttpMethod, PreparedRequest, Transfer};
pub use transport::{ApiResponse, HttpTransport, Transport};

/// The process-wide configuration slot populated by [`init`].
static GLOBAL_CONFIG: RwLock<Option<Arc<ClientConfig>>> = parking_lot::const_rwlock(None);

/// Initializes the process-wide client configuration.
///
/// Builds a [`ClientConfig`] via [`ClientConfig::init`] and stores it as the
/// current global snapshot, replacing any previous one. Requests already in
/// flight keep the snapshot they were started with.
pub fn init(params: &Value, options: InitOptions) -> Result<Arc<ClientConfig>, ClientError> {
    let config = Arc::new(ClientConfig::init(params, options)?);
    *GLOBAL_CONFIG.write() = Some(Arc::clone(&config));
    Ok(config)
}

/// Returns the configuration installed by the last successful [`init`].
pub fn config() -> Option<Arc<ClientConfig>> {
    GLOBAL_CONFIG.read().clone()
}
