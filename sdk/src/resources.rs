//! API resources.
//!
//! Each resource call is one line of real work: pick the operation, build
//! the envelope, attach the method and path. The result is a
//! [`PreparedRequest`] that any [`crate::Transport`] can send.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::envelope::{self, RequestEnvelope};
use crate::error::ClientError;
use crate::operation::Operation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}

/// Method and path (relative to the base URL) for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    pub method: HttpMethod,
    pub path: &'static str,
}

/// Where each operation is served.
pub fn route(operation: Operation) -> Route {
    match operation {
        Operation::GetBalance => Route {
            method: HttpMethod::Get,
            path: "/users/balance",
        },
        Operation::CreateBill => Route {
            method: HttpMethod::Post,
            path: "/users/payments/bills/vtu",
        },
        Operation::BankTransfer => Route {
            method: HttpMethod::Post,
            path: "/users/transfers/bank",
        },
        Operation::MobileTransfer => Route {
            method: HttpMethod::Post,
            path: "/users/transfers/phone",
        },
    }
}

/// A fully built request: where it goes and what it carries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedRequest {
    pub operation: Operation,
    pub method: HttpMethod,
    pub path: &'static str,
    pub envelope: RequestEnvelope,
}

impl PreparedRequest {
    /// Build the envelope for `operation` and attach its route.
    pub fn new(
        config: &ClientConfig,
        params: &Value,
        operation: Operation,
    ) -> Result<Self, ClientError> {
        let envelope = envelope::construct(config, params, operation)?;
        let Route { method, path } = route(operation);
        Ok(PreparedRequest {
            operation,
            method,
            path,
            envelope,
        })
    }

    /// Absolute URL under `base_url`.
    pub fn url(&self, base_url: &str) -> String {
        format!("{}{}", base_url.trim_end_matches('/'), self.path)
    }
}

/// Wallet balance.
pub struct Balance;

impl Balance {
    /// Balance of the user identified by `mobile`.
    pub fn retrieve(config: &ClientConfig, params: &Value) -> Result<PreparedRequest, ClientError> {
        PreparedRequest::new(config, params, Operation::GetBalance)
    }
}

/// Bill payments (airtime/VTU).
pub struct Bills;

impl Bills {
    /// Requires `mobile`, `amount`, `provider` and `walletToken`.
    pub fn create(config: &ClientConfig, params: &Value) -> Result<PreparedRequest, ClientError> {
        PreparedRequest::new(config, params, Operation::CreateBill)
    }
}

/// Outgoing transfers.
pub struct Transfer;

impl Transfer {
    /// Transfer to a bank account. Requires `amount`, `accountName`,
    /// `accountNumber`, `bankCode` and `walletToken`.
    pub fn credit_bank(
        config: &ClientConfig,
        params: &Value,
    ) -> Result<PreparedRequest, ClientError> {
        PreparedRequest::new(config, params, Operation::BankTransfer)
    }

    /// Transfer to another Eyowo user by phone number. Requires `mobile`,
    /// `amount` and `walletToken`.
    pub fn credit_phone(
        config: &ClientConfig,
        params: &Value,
    ) -> Result<PreparedRequest, ClientError> {
        PreparedRequest::new(config, params, Operation::MobileTransfer)
    }
}
