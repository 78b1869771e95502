//! # CLI Interface
//!
//! Defines the command-line argument structure for the `eyowo` binary using
//! `clap` derive, plus the small amount of parsing needed to turn
//! `--param` flags into a request parameter mapping.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value};

use crate::logging::LogFormat;

/// Eyowo payments API client.
///
/// Builds encrypted request envelopes and, for the resource commands, sends
/// them to the Eyowo API.
#[derive(Parser, Debug)]
#[command(name = "eyowo", about = "Eyowo payments API client", version, propagate_version = true)]
pub struct EyowoCli {
    /// Log output format.
    #[arg(long, global = true, env = "EYOWO_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    #[command(flatten)]
    pub config: ConfigArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build an envelope for any operation and print it, without sending.
    Envelope(EnvelopeArgs),
    /// Decrypt an `authData` string back into its JSON payload.
    Open(OpenArgs),
    /// Retrieve a wallet balance (GET /users/balance).
    Balance(RequestArgs),
    /// Pay a bill (POST /users/payments/bills/vtu).
    Bill(RequestArgs),
    /// Transfer to a bank account (POST /users/transfers/bank).
    CreditBank(RequestArgs),
    /// Transfer to a phone number (POST /users/transfers/phone).
    CreditPhone(RequestArgs),
    /// Print version information and exit.
    Version,
}

/// Client credentials and options, shared by every command that needs them.
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Developer app key.
    #[arg(long, global = true, env = "EYOWO_APP_KEY", hide_env_values = true)]
    pub app_key: Option<String>,

    /// Application secret.
    #[arg(long, global = true, env = "EYOWO_APP_SECRET", hide_env_values = true)]
    pub app_secret: Option<String>,

    /// AES IV: exactly 32 hexadecimal characters (16 bytes), e.g.
    /// `000102030405060708090a0b0c0d0e0f`. Other 32-character strings are
    /// rejected. Generated when omitted, which makes `open` unable to read
    /// envelopes from an earlier run.
    #[arg(long, global = true, env = "EYOWO_ENCRYPTION_IV", hide_env_values = true)]
    pub encryption_iv: Option<String>,

    /// production, sandbox (development) or test. Falls back to `APP_ENV`.
    #[arg(long, global = true)]
    pub environment: Option<String>,

    /// API version used in the base URL.
    #[arg(long, global = true, env = "EYOWO_API_VERSION")]
    pub api_version: Option<u32>,

    /// Skip TLS certificate verification.
    #[arg(long, global = true)]
    pub insecure: bool,

    /// Retries on connection failures.
    #[arg(long, global = true)]
    pub max_network_retries: Option<u32>,

    /// Send requests here instead of the environment's base URL.
    #[arg(long, global = true, env = "EYOWO_BASE_URL")]
    pub base_url: Option<String>,
}

/// Arguments for the `envelope` subcommand.
#[derive(Args, Debug)]
pub struct EnvelopeArgs {
    /// Operation name: get_balance, create_bill, mobile_transfer, bank_transfer.
    pub operation: String,

    #[command(flatten)]
    pub request: RequestArgs,
}

/// Arguments for the `open` subcommand.
#[derive(Args, Debug)]
pub struct OpenArgs {
    /// The base64 `authData` value.
    pub auth_data: String,
}

/// Request parameters.
#[derive(Args, Debug, Default)]
pub struct RequestArgs {
    /// `key=value` for a string, `key:=json` for a raw JSON value
    /// (`amount:=500`). Repeatable; applied after `--json`.
    #[arg(long = "param", short = 'p', value_name = "KEY=VALUE")]
    pub params: Vec<String>,

    /// A JSON object of parameters.
    #[arg(long)]
    pub json: Option<String>,
}

impl ConfigArgs {
    /// The `init` params mapping. Absent values are simply left out, so a
    /// missing app key is reported by the library itself.
    pub fn init_params(&self) -> Value {
        let mut params = Map::new();
        let fields = [
            ("appKey", &self.app_key),
            ("appSecret", &self.app_secret),
            ("encryptionIv", &self.encryption_iv),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                params.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        Value::Object(params)
    }

    pub fn init_options(&self) -> eyowo::InitOptions {
        eyowo::InitOptions {
            api_version: self.api_version,
            force_ssl: self.insecure.then_some(false),
            max_network_retries: self.max_network_retries,
            environment: self.environment.clone(),
            ..Default::default()
        }
    }
}

impl RequestArgs {
    /// Merge `--json` and `--param` flags into one parameter mapping.
    pub fn to_params(&self) -> Result<Value> {
        let mut params = match &self.json {
            Some(raw) => match serde_json::from_str::<Value>(raw).context("--json is not valid JSON")? {
                Value::Object(map) => map,
                _ => bail!("--json must be a JSON object"),
            },
            None => Map::new(),
        };

        for param in &self.params {
            let (key, value) = parse_param(param)?;
            params.insert(key, value);
        }
        Ok(Value::Object(params))
    }
}

/// Parse one `key=value` or `key:=json` flag.
fn parse_param(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected KEY=VALUE or KEY:=JSON, got {raw:?}"))?;

    let (key, value) = match key.strip_suffix(':') {
        Some(key) => (
            key,
            serde_json::from_str(value).with_context(|| format!("{key}: invalid JSON {value:?}"))?,
        ),
        None => (key, Value::String(value.to_string())),
    };

    if key.is_empty() {
        bail!("empty parameter name in {raw:?}");
    }
    Ok((key.to_string(), value))
}
