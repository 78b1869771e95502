//! Request parameter validation.
//!
//! Parameters arrive as a loose JSON mapping. Before anything looks at them,
//! keys are folded to one canonical form (camelCase, the form the API uses on
//! the wire), so `wallet_token`, `wallet-token` and `walletToken` all mean the
//! same field.
//!
//! Validation is a pure function of the parameters and the operation: there
//! is no validator object and no state.

use serde_json::{Map, Value};

use crate::error::ClientError;
use crate::operation::{lookup, Operation};

/// Fold a key to canonical camelCase.
///
/// `_`, `-` and spaces are word separators. A word written entirely in
/// capitals is lowercased first, so `APP_KEY` and `app_key` both fold to
/// `appKey`. The first character is lowercased; keys already in camelCase
/// pass through untouched.
pub fn canonical_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len());

    for word in key.split(['_', '-', ' ']).filter(|w| !w.is_empty()) {
        let word = if word.chars().any(char::is_lowercase) {
            word.to_string()
        } else {
            word.to_lowercase()
        };
        let mut chars = word.chars();
        let Some(first) = chars.next() else { continue };
        if out.is_empty() {
            out.extend(first.to_lowercase());
        } else {
            out.extend(first.to_uppercase());
        }
        out.push_str(chars.as_str());
    }
    out
}

/// Turn `params` into a mapping with canonical keys.
///
/// Fails with [`ClientError::InvalidParameterShape`] when `params` is not a
/// JSON object, or when two keys fold to the same canonical key
/// (`walletToken` next to `wallet_token`). Only top-level keys are folded;
/// nested values (for example caller-supplied headers) are left as they are.
pub fn normalize_params(params: &Value) -> Result<Map<String, Value>, ClientError> {
    let object = params.as_object().ok_or_else(|| {
        ClientError::InvalidParameterShape(format!(
            "expected a key-value mapping, got {}",
            shape_name(params)
        ))
    })?;

    let mut normalized = Map::with_capacity(object.len());
    for (key, value) in object {
        let canonical = canonical_key(key);
        if normalized.contains_key(&canonical) {
            return Err(ClientError::InvalidParameterShape(format!(
                "parameter {key} is given more than once as {canonical}"
            )));
        }
        normalized.insert(canonical, value.clone());
    }
    Ok(normalized)
}

/// Check `params` against the catalog entry for `operation`.
///
/// Required fields are checked in their declared order and the first one
/// absent is reported. A field present with a `null` value counts as
/// present. Extra fields are allowed.
pub fn validate(params: &Value, operation: Operation) -> Result<(), ClientError> {
    let params = normalize_params(params)?;
    check_required(&params, operation)
}

/// [`validate`] for a mapping that has already been normalized.
pub(crate) fn check_required(
    params: &Map<String, Value>,
    operation: Operation,
) -> Result<(), ClientError> {
    let spec = lookup(operation);
    match spec
        .required_fields
        .iter()
        .find(|field| !params.contains_key(**field))
    {
        Some(missing) => {
            tracing::debug!(%operation, field = *missing, "missing required parameter");
            Err(ClientError::MissingRequiredParam(missing.to_string()))
        }
        None => Ok(()),
    }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_key() {
        assert_eq!(canonical_key("wallet_token"), "walletToken");
        assert_eq!(canonical_key("account-number"), "accountNumber");
        assert_eq!(canonical_key("walletToken"), "walletToken");
        assert_eq!(canonical_key("BankCode"), "bankCode");
        assert_eq!(canonical_key("mobile"), "mobile");
        assert_eq!(canonical_key("_leading"), "leading");
        assert_eq!(canonical_key("app__key"), "appKey");
        assert_eq!(canonical_key("APP_KEY"), "appKey");
        assert_eq!(canonical_key("Wallet-TOKEN"), "walletToken");
        assert_eq!(canonical_key("MOBILE"), "mobile");
        assert_eq!(canonical_key("account_Number"), "accountNumber");
    }

    #[test]
    fn test_keys_folding_to_the_same_name_are_rejected() {
        let err = normalize_params(&json!({ "walletToken": "a", "wallet_token": "b" })).unwrap_err();
        assert!(matches!(err, ClientError::InvalidParameterShape(ref m) if m.contains("walletToken")));
    }

    #[test]
    fn test_balance_with_mobile_is_valid() {
        assert!(validate(&json!({ "mobile": "1" }), Operation::GetBalance).is_ok());
    }

    #[test]
    fn test_balance_without_mobile_fails() {
        let err = validate(&json!({}), Operation::GetBalance).unwrap_err();
        assert!(matches!(err, ClientError::MissingRequiredParam(ref f) if f == "mobile"));
    }

    #[test]
    fn test_bill_without_wallet_token_fails_in_field_order() {
        let err = validate(
            &json!({ "mobile": "1", "amount": 5, "provider": "x" }),
            Operation::CreateBill,
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::MissingRequiredParam(ref f) if f == "walletToken"));
    }

    #[test]
    fn test_first_missing_field_is_reported() {
        // Both amount and bankCode are missing; amount is declared first.
        let err = validate(
            &json!({ "accountName": "A", "accountNumber": "0123", "walletToken": "t" }),
            Operation::BankTransfer,
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::MissingRequiredParam(ref f) if f == "amount"));
    }

    #[test]
    fn test_snake_case_params_satisfy_camel_case_fields() {
        let params = json!({
            "amount": 100,
            "account_name": "Ada",
            "account_number": "0123456789",
            "bank_code": "058",
            "wallet_token": "t",
        });
        assert!(validate(&params, Operation::BankTransfer).is_ok());
    }

    #[test]
    fn test_extra_fields_are_tolerated() {
        let params = json!({ "mobile": "1", "note": "hi", "headers": { "X-Trace": "1" } });
        assert!(validate(&params, Operation::GetBalance).is_ok());
    }

    #[test]
    fn test_null_counts_as_present() {
        let params = json!({ "mobile": "1", "amount": 5, "walletToken": null });
        assert!(validate(&params, Operation::MobileTransfer).is_ok());
    }

    #[test]
    fn test_non_mapping_params_are_rejected() {
        for params in [json!(null), json!("mobile"), json!([1, 2]), json!(42)] {
            let err = validate(&params, Operation::GetBalance).unwrap_err();
            assert!(matches!(err, ClientError::InvalidParameterShape(_)));
        }
    }
}
