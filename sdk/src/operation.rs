//! The operation catalog.
//!
//! Every API call the client can build a request for is an [`Operation`].
//! Each one maps to a static [`OperationSpec`] naming the fields it needs, in
//! the order they are checked, and whether it touches the caller's wallet.
//! The table is immutable and shared; there is nothing to initialize.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Key under which callers pass the wallet access token.
pub const WALLET_TOKEN_FIELD: &str = "walletToken";

/// An API operation the client knows how to build a request for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    GetBalance,
    CreateBill,
    MobileTransfer,
    BankTransfer,
}

/// Static description of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationSpec {
    pub operation: Operation,
    /// Required parameter names, canonical (camelCase) form, in check order.
    pub required_fields: &'static [&'static str],
    /// Wallet operations must carry a wallet access token.
    pub is_wallet_operation: bool,
}

static CATALOG: [OperationSpec; 4] = [
    OperationSpec {
        operation: Operation::GetBalance,
        required_fields: &["mobile"],
        is_wallet_operation: false,
    },
    OperationSpec {
        operation: Operation::CreateBill,
        required_fields: &["mobile", "amount", "provider", WALLET_TOKEN_FIELD],
        is_wallet_operation: true,
    },
    OperationSpec {
        operation: Operation::MobileTransfer,
        required_fields: &["mobile", "amount", WALLET_TOKEN_FIELD],
        is_wallet_operation: true,
    },
    OperationSpec {
        operation: Operation::BankTransfer,
        required_fields: &[
            "amount",
            "accountName",
            "accountNumber",
            "bankCode",
            WALLET_TOKEN_FIELD,
        ],
        is_wallet_operation: true,
    },
];

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::GetBalance,
        Operation::CreateBill,
        Operation::MobileTransfer,
        Operation::BankTransfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetBalance => "get_balance",
            Operation::CreateBill => "create_bill",
            Operation::MobileTransfer => "mobile_transfer",
            Operation::BankTransfer => "bank_transfer",
        }
    }

    /// Catalog entry for this operation.
    pub fn spec(&self) -> &'static OperationSpec {
        lookup(*self)
    }

    pub fn is_wallet_operation(&self) -> bool {
        self.spec().is_wallet_operation
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Operation {
    type Err = ClientError;

    /// Accepts `create_bill`, `create-bill`, `createBill` and `CreateBill`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match folded.as_str() {
            "getbalance" => Ok(Operation::GetBalance),
            "createbill" => Ok(Operation::CreateBill),
            "mobiletransfer" => Ok(Operation::MobileTransfer),
            "banktransfer" => Ok(Operation::BankTransfer),
            _ => Err(ClientError::UnsupportedOperation(s.to_string())),
        }
    }
}

/// Look up the catalog entry for an operation.
pub fn lookup(operation: Operation) -> &'static OperationSpec {
    // Indexed by declaration order; the test below pins that down.
    &CATALOG[operation as usize]
}

/// Look up an operation by name, failing with
/// [`ClientError::UnsupportedOperation`] for names not in the catalog.
pub fn lookup_by_name(name: &str) -> Result<&'static OperationSpec, ClientError> {
    name.parse::<Operation>().map(lookup)
}
