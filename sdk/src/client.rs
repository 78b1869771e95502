//! The client facade.
//!
//! [`Client`] pairs a shared [`ClientConfig`] with a [`Transport`] and
//! exposes one async method per API call. Each method builds the request
//! synchronously (validation and encryption), then hands it to the
//! transport. Build failures come back as [`TransportError::Client`] without
//! any network traffic.

use std::sync::Arc;

use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::operation::Operation;
use crate::resources::{Balance, Bills, PreparedRequest, Transfer};
use crate::transport::{ApiResponse, HttpTransport, Transport};

pub struct Client<T: Transport = HttpTransport> {
    config: Arc<ClientConfig>,
    transport: T,
}

impl Client<HttpTransport> {
    /// Client over the default HTTP transport for `config`.
    pub fn from_config(config: Arc<ClientConfig>) -> Result<Self, TransportError> {
        let transport = HttpTransport::new(&config)?;
        Ok(Client { config, transport })
    }
}

impl<T: Transport> Client<T> {
    pub fn new(config: Arc<ClientConfig>, transport: T) -> Self {
        Client { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Balance of the user identified by `mobile`.
    pub async fn get_balance(&self, params: &Value) -> Result<ApiResponse, TransportError> {
        self.send(Balance::retrieve(&self.config, params)?).await
    }

    /// Pay a bill (airtime/VTU) from the caller's wallet.
    pub async fn create_bill(&self, params: &Value) -> Result<ApiResponse, TransportError> {
        self.send(Bills::create(&self.config, params)?).await
    }

    /// Transfer from the caller's wallet to a bank account.
    pub async fn credit_bank(&self, params: &Value) -> Result<ApiResponse, TransportError> {
        self.send(Transfer::credit_bank(&self.config, params)?).await
    }

    /// Transfer from the caller's wallet to another user's phone number.
    pub async fn credit_phone(&self, params: &Value) -> Result<ApiResponse, TransportError> {
        self.send(Transfer::credit_phone(&self.config, params)?).await
    }

    /// Run any catalog operation.
    pub async fn execute(
        &self,
        operation: Operation,
        params: &Value,
    ) -> Result<ApiResponse, TransportError> {
        self.send(PreparedRequest::new(&self.config, params, operation)?)
            .await
    }

    async fn send(&self, request: PreparedRequest) -> Result<ApiResponse, TransportError> {
        self.transport.send(&request).await
    }
}
