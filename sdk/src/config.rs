//! # Client Configuration
//!
//! Every constant the client depends on lives at the top of this file, and
//! the [`ClientConfig`] built from them lives at the bottom.
//!
//! A `ClientConfig` is created once by [`ClientConfig::init`] and never
//! mutated afterwards. It holds the credentials, the cipher material derived
//! from them, the resolved environment and base URL, and the timeout/retry
//! policy the transport must honor. Share it through an `Arc`.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::crypto::{self, EncryptionError};
use crate::error::ClientError;
use crate::validation::normalize_params;

// ---------------------------------------------------------------------------
// Hosts
// ---------------------------------------------------------------------------

/// Production API host.
pub const PRODUCTION_HOST: &str = "api.console.eyowo.com";

/// Sandbox API host, used by every non-production environment.
pub const SANDBOX_HOST: &str = "api.sandbox.developer.eyowo.com";

/// Environment variable consulted when no explicit environment is given.
pub const APP_ENV_VAR: &str = "APP_ENV";

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

/// Parameters `init` must receive.
pub const REQUIRED_CONFIG_PARAMS: &[&str] = &["appKey"];

/// Parameters `init` accepts at all. Anything else is dropped before
/// validation.
pub const ACCEPTED_CONFIG_PARAMS: &[&str] = &["appKey", "appSecret", "encryptionIv"];

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// AES-256 key length in bytes.
pub const AES_KEY_LENGTH: usize = 32;

/// AES block length in bytes, which is also the CBC IV length.
pub const AES_BLOCK_LENGTH: usize = 16;

/// Length of the IV string (hex-encoded AES block).
pub const ENCRYPTION_IV_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_API_VERSION: u32 = 1;

pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(30);

pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(80);

pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(20);

/// Pause between two attempts of a request that failed at the network level.
pub const DEFAULT_NETWORK_RETRY_DELAY: Duration = Duration::from_millis(500);

/// Retries on top of the first attempt. Two retries means three attempts.
pub const DEFAULT_MAX_NETWORK_RETRIES: u32 = 2;

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// Where requests are sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Environment {
    Production,
    /// Also accepted as `development` / `dev`.
    Sandbox,
    Test,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Sandbox => "sandbox",
            Environment::Test => "test",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }

    /// Host serving this environment.
    pub fn host(&self) -> &'static str {
        if self.is_production() {
            PRODUCTION_HOST
        } else {
            SANDBOX_HOST
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Ok(Environment::Production),
            "sandbox" | "development" | "dev" => Ok(Environment::Sandbox),
            "test" => Ok(Environment::Test),
            _ => Err(ClientError::InvalidEnvironment(s.to_string())),
        }
    }
}

/// `https://{host}/v{api_version}`.
pub fn base_url_for(environment: Environment, api_version: u32) -> String {
    format!("https://{}/v{}", environment.host(), api_version)
}

// ---------------------------------------------------------------------------
// Init options
// ---------------------------------------------------------------------------

/// Optional settings for [`ClientConfig::init`].
///
/// Every field left as `None` keeps its default. When parsed from a mapping
/// with [`InitOptions::from_value`], keys may be camelCase or snake_case and
/// unknown keys are ignored. Durations in a mapping are seconds (fractions
/// allowed, e.g. `0.5`).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InitOptions {
    #[serde(alias = "api_version")]
    pub api_version: Option<u32>,

    #[serde(alias = "force_ssl")]
    pub force_ssl: Option<bool>,

    #[serde(alias = "network_retry_delay", deserialize_with = "optional_secs")]
    pub network_retry_delay: Option<Duration>,

    #[serde(alias = "max_network_retries")]
    pub max_network_retries: Option<u32>,

    #[serde(alias = "open_timeout", deserialize_with = "optional_secs")]
    pub open_timeout: Option<Duration>,

    #[serde(alias = "read_timeout", deserialize_with = "optional_secs")]
    pub read_timeout: Option<Duration>,

    #[serde(alias = "write_timeout", deserialize_with = "optional_secs")]
    pub write_timeout: Option<Duration>,

    /// Raw environment name; validated during `init`.
    #[serde(alias = "app_env", alias = "appEnv")]
    pub environment: Option<String>,
}

impl InitOptions {
    /// Parse options from a key-value mapping.
    ///
    /// Unknown keys are silently ignored. A non-mapping, or a known key with
    /// a value of the wrong type, is an [`ClientError::InvalidParameterShape`].
    pub fn from_value(value: &Value) -> Result<Self, ClientError> {
        if !value.is_object() {
            return Err(ClientError::InvalidParameterShape(
                "init options must be a key-value mapping".to_string(),
            ));
        }
        InitOptions::deserialize(value)
            .map_err(|e| ClientError::InvalidParameterShape(format!("init options: {e}")))
    }

    /// Options with only the environment set.
    pub fn for_environment(environment: impl Into<String>) -> Self {
        InitOptions {
            environment: Some(environment.into()),
            ..Default::default()
        }
    }

    pub fn with_api_version(mut self, api_version: u32) -> Self {
        self.api_version = Some(api_version);
        self
    }
}

fn optional_secs<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    let secs: Option<f64> = Option::deserialize(deserializer)?;
    secs.map(|s| Duration::try_from_secs_f64(s).map_err(serde::de::Error::custom))
        .transpose()
}

// ---------------------------------------------------------------------------
// ClientConfig
// ---------------------------------------------------------------------------

/// Immutable client configuration.
///
/// Construct with [`ClientConfig::init`]. The fields are private so that the
/// derived ones (`base_url`, the cipher key) cannot drift from their inputs.
#[derive(Clone)]
pub struct ClientConfig {
    app_key: String,
    app_secret: Option<String>,
    encryption_iv: String,
    cipher_key: [u8; AES_KEY_LENGTH],
    cipher_iv: [u8; AES_BLOCK_LENGTH],
    api_version: u32,
    environment: Environment,
    force_ssl: bool,
    base_url: String,
    open_timeout: Duration,
    read_timeout: Duration,
    write_timeout: Duration,
    network_retry_delay: Duration,
    max_network_retries: u32,
}

impl ClientConfig {
    /// Build a configuration, consulting the process environment for
    /// `APP_ENV` when `options.environment` is not set.
    ///
    /// `params` must be a mapping containing `appKey`, and may contain
    /// `appSecret` and `encryptionIv`. Other keys are dropped.
    ///
    /// `encryptionIv` must be 32 hexadecimal characters (16 bytes); it is
    /// generated when absent. A 32-character string that is not hex, such
    /// as a random alphanumeric token, fails with
    /// [`ClientError::MalformedEncryptionIv`].
    pub fn init(params: &Value, options: InitOptions) -> Result<Self, ClientError> {
        Self::init_with_env(params, options, |key| std::env::var(key).ok())
    }

    /// Same as [`ClientConfig::init`], with the environment-variable lookup
    /// supplied by the caller.
    pub fn init_with_env<F>(
        params: &Value,
        options: InitOptions,
        env_lookup: F,
    ) -> Result<Self, ClientError>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        let mut params = normalize_params(params)?;
        sanitize_config_params(&mut params);
        validate_config_params(&params)?;

        let app_key = string_param(&params, "appKey")?.unwrap_or_default();
        let app_secret = string_param(&params, "appSecret")?;

        // An explicit but bogus environment is rejected before anything else
        // is derived.
        let explicit_env = options
            .environment
            .as_deref()
            .map(Environment::from_str)
            .transpose()?;

        let cipher_key = crypto::derive_key(&app_key);
        let (encryption_iv, generated_iv) = match string_param(&params, "encryptionIv")? {
            Some(iv) => (iv, false),
            None => (crypto::generate_iv(), true),
        };
        let cipher_iv = crypto::parse_iv(&encryption_iv)?;

        let environment = match explicit_env {
            Some(env) => env,
            None => resolve_env_var(env_lookup(APP_ENV_VAR))?,
        };

        let api_version = options.api_version.unwrap_or(DEFAULT_API_VERSION);
        let base_url = base_url_for(environment, api_version);

        tracing::info!(
            %environment,
            %base_url,
            generated_iv,
            "eyowo client configured"
        );

        Ok(ClientConfig {
            app_key,
            app_secret,
            encryption_iv,
            cipher_key,
            cipher_iv,
            api_version,
            environment,
            force_ssl: options.force_ssl.unwrap_or(true),
            base_url,
            open_timeout: options.open_timeout.unwrap_or(DEFAULT_OPEN_TIMEOUT),
            read_timeout: options.read_timeout.unwrap_or(DEFAULT_READ_TIMEOUT),
            write_timeout: options.write_timeout.unwrap_or(DEFAULT_WRITE_TIMEOUT),
            network_retry_delay: options
                .network_retry_delay
                .unwrap_or(DEFAULT_NETWORK_RETRY_DELAY),
            max_network_retries: options
                .max_network_retries
                .unwrap_or(DEFAULT_MAX_NETWORK_RETRIES),
        })
    }

    pub fn app_key(&self) -> &str {
        &self.app_key
    }

    pub fn app_secret(&self) -> Option<&str> {
        self.app_secret.as_deref()
    }

    /// The 32-character IV advertised in the `X-IV` header.
    pub fn encryption_iv(&self) -> &str {
        &self.encryption_iv
    }

    pub fn api_version(&self) -> u32 {
        self.api_version
    }

    pub fn environment(&self) -> Environment {
        self.environment
    }

    /// When false, the transport skips TLS certificate verification.
    pub fn force_ssl(&self) -> bool {
        self.force_ssl
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn open_timeout(&self) -> Duration {
        self.open_timeout
    }

    pub fn read_timeout(&self) -> Duration {
        self.read_timeout
    }

    pub fn write_timeout(&self) -> Duration {
        self.write_timeout
    }

    pub fn network_retry_delay(&self) -> Duration {
        self.network_retry_delay
    }

    pub fn max_network_retries(&self) -> u32 {
        self.max_network_retries
    }

    /// Encrypt `plaintext` into an `authData` string with a cipher context
    /// created for this call alone.
    pub fn seal(&self, plaintext: &[u8]) -> String {
        crypto::seal(&self.cipher_key, &self.cipher_iv, plaintext)
    }

    /// Reverse of [`ClientConfig::seal`].
    pub fn open(&self, auth_data: &str) -> Result<Vec<u8>, EncryptionError> {
        crypto::open(&self.cipher_key, &self.cipher_iv, auth_data)
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("app_key", &"<redacted>")
            .field("app_secret", &self.app_secret.as_ref().map(|_| "<redacted>"))
            .field("api_version", &self.api_version)
            .field("environment", &self.environment)
            .field("force_ssl", &self.force_ssl)
            .field("base_url", &self.base_url)
            .field("open_timeout", &self.open_timeout)
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("network_retry_delay", &self.network_retry_delay)
            .field("max_network_retries", &self.max_network_retries)
            .finish_non_exhaustive()
    }
}

/// Drop every parameter `init` does not know about.
fn sanitize_config_params(params: &mut Map<String, Value>) {
    let accepted: BTreeSet<&str> = ACCEPTED_CONFIG_PARAMS.iter().copied().collect();
    params.retain(|key, _| accepted.contains(key.as_str()));
}

/// Every required parameter must be present, non-null and non-empty.
fn validate_config_params(params: &Map<String, Value>) -> Result<(), ClientError> {
    for &param in REQUIRED_CONFIG_PARAMS {
        let present = match params.get(param) {
            None | Some(Value::Null) => false,
            Some(Value::String(s)) => !s.is_empty(),
            Some(_) => true,
        };
        if !present {
            return Err(ClientError::MissingRequiredConfig(param.to_string()));
        }
    }
    Ok(())
}

/// `Ok(None)` for absent or null, an error for anything but a string.
fn string_param(params: &Map<String, Value>, key: &str) -> Result<Option<String>, ClientError> {
    match params.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(ClientError::InvalidParameterShape(format!(
            "{key} must be a string, got {other}"
        ))),
    }
}

/// `APP_ENV` unset or blank means production; anything else must parse.
fn resolve_env_var(raw: Option<String>) -> Result<Environment, ClientError> {
    match raw {
        Some(value) if !value.trim().is_empty() => value.parse(),
        _ => Ok(Environment::Production),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn init(params: Value, options: InitOptions) -> Result<ClientConfig, ClientError> {
        ClientConfig::init_with_env(&params, options, no_env)
    }

    #[test]
    fn test_missing_app_key_fails() {
        let err = init(json!({}), InitOptions::default()).unwrap_err();
        assert!(matches!(err, ClientError::MissingRequiredConfig(ref p) if p == "appKey"));
    }

    #[test]
    fn test_empty_app_key_counts_as_missing() {
        let err = init(json!({ "appKey": "" }), InitOptions::default()).unwrap_err();
        assert!(matches!(err, ClientError::MissingRequiredConfig(_)));
    }

    #[test]
    fn test_params_must_be_a_mapping() {
        let err = init(json!(["appKey", "k"]), InitOptions::default()).unwrap_err();
        assert!(matches!(err, ClientError::InvalidParameterShape(_)));
    }

    #[test]
    fn test_snake_case_keys_are_normalized() {
        let config = init(json!({ "app_key": "k", "app_secret": "s" }), InitOptions::default())
            .unwrap();
        assert_eq!(config.app_key(), "k");
        assert_eq!(config.app_secret(), Some("s"));
    }

    #[test]
    fn test_upper_snake_case_keys_are_normalized() {
        let config = init(json!({ "APP_KEY": "k" }), InitOptions::default()).unwrap();
        assert_eq!(config.app_key(), "k");
    }

    #[test]
    fn test_non_hex_iv_is_malformed() {
        let err = init(
            json!({ "appKey": "k", "encryptionIv": "abcdefghijklmnopqrstuvwxyz012345" }),
            InitOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::MalformedEncryptionIv));
    }

    #[test]
    fn test_unknown_params_are_dropped() {
        // `apiVersion` is an option, not a param; passing it here does nothing.
        let config = init(json!({ "appKey": "k", "apiVersion": 9 }), InitOptions::default())
            .unwrap();
        assert_eq!(config.api_version(), DEFAULT_API_VERSION);
    }

    #[test]
    fn test_short_iv_is_rejected() {
        let err = init(
            json!({ "appKey": "k", "encryptionIv": "short" }),
            InitOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::InvalidEncryptionIv(5)));
    }

    #[test]
    fn test_supplied_iv_is_kept() {
        let iv = "00112233445566778899aabbccddeeff";
        let config = init(json!({ "appKey": "k", "encryptionIv": iv }), InitOptions::default())
            .unwrap();
        assert_eq!(config.encryption_iv(), iv);
    }

    #[test]
    fn test_missing_iv_is_generated() {
        let config = init(json!({ "appKey": "k" }), InitOptions::default()).unwrap();
        assert_eq!(config.encryption_iv().len(), ENCRYPTION_IV_LENGTH);
    }

    #[test]
    fn test_null_iv_is_generated() {
        let config = init(
            json!({ "appKey": "k", "encryptionIv": null }),
            InitOptions::default(),
        )
        .unwrap();
        assert_eq!(config.encryption_iv().len(), ENCRYPTION_IV_LENGTH);
    }

    #[test]
    fn test_defaults() {
        let config = init(json!({ "appKey": "k" }), InitOptions::default()).unwrap();
        assert_eq!(config.environment(), Environment::Production);
        assert_eq!(config.base_url(), "https://api.console.eyowo.com/v1");
        assert!(config.force_ssl());
        assert_eq!(config.open_timeout(), DEFAULT_OPEN_TIMEOUT);
        assert_eq!(config.read_timeout(), DEFAULT_READ_TIMEOUT);
        assert_eq!(config.write_timeout(), DEFAULT_WRITE_TIMEOUT);
        assert_eq!(config.network_retry_delay(), DEFAULT_NETWORK_RETRY_DELAY);
        assert_eq!(config.max_network_retries(), DEFAULT_MAX_NETWORK_RETRIES);
    }

    #[test]
    fn test_api_version_option_changes_base_url() {
        let config = init(
            json!({ "appKey": "k" }),
            InitOptions::default().with_api_version(2),
        )
        .unwrap();
        assert!(config.base_url().ends_with("/v2"));
    }

    #[test]
    fn test_explicit_environment_overrides_env_var() {
        let config = ClientConfig::init_with_env(
            &json!({ "appKey": "k" }),
            InitOptions::for_environment("sandbox"),
            |_| Some("production".to_string()),
        )
        .unwrap();
        assert_eq!(config.environment(), Environment::Sandbox);
        assert_eq!(config.base_url(), "https://api.sandbox.developer.eyowo.com/v1");
    }

    #[test]
    fn test_explicit_environment_skips_env_lookup() {
        // Even a garbage APP_ENV is irrelevant when the option is given.
        let config = ClientConfig::init_with_env(
            &json!({ "appKey": "k" }),
            InitOptions::for_environment("test"),
            |_| Some("garbage".to_string()),
        )
        .unwrap();
        assert_eq!(config.environment(), Environment::Test);
    }

    #[test]
    fn test_invalid_explicit_environment_fails() {
        let err = init(json!({ "appKey": "k" }), InitOptions::for_environment("staging"))
            .unwrap_err();
        assert!(matches!(err, ClientError::InvalidEnvironment(ref v) if v == "staging"));
    }

    #[test]
    fn test_env_var_is_used_when_no_option() {
        let config = ClientConfig::init_with_env(
            &json!({ "appKey": "k" }),
            InitOptions::default(),
            |key| (key == APP_ENV_VAR).then(|| "development".to_string()),
        )
        .unwrap();
        assert_eq!(config.environment(), Environment::Sandbox);
    }

    #[test]
    fn test_invalid_env_var_is_a_hard_failure() {
        let err = ClientConfig::init_with_env(
            &json!({ "appKey": "k" }),
            InitOptions::default(),
            |_| Some("qa".to_string()),
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::InvalidEnvironment(_)));
    }

    #[test]
    fn test_blank_env_var_defaults_to_production() {
        let config = ClientConfig::init_with_env(
            &json!({ "appKey": "k" }),
            InitOptions::default(),
            |_| Some("  ".to_string()),
        )
        .unwrap();
        assert_eq!(config.environment(), Environment::Production);
    }

    #[test]
    fn test_options_from_value_ignores_unknown_keys() {
        let options = InitOptions::from_value(&json!({
            "api_version": 3,
            "forceSsl": false,
            "networkRetryDelay": 0.25,
            "read_timeout": 5,
            "app_env": "sandbox",
            "colour": "blue",
        }))
        .unwrap();
        assert_eq!(options.api_version, Some(3));
        assert_eq!(options.force_ssl, Some(false));
        assert_eq!(options.network_retry_delay, Some(Duration::from_millis(250)));
        assert_eq!(options.read_timeout, Some(Duration::from_secs(5)));
        assert_eq!(options.environment.as_deref(), Some("sandbox"));

        let config = init(json!({ "appKey": "k" }), options).unwrap();
        assert!(!config.force_ssl());
        assert_eq!(config.base_url(), "https://api.sandbox.developer.eyowo.com/v3");
    }

    #[test]
    fn test_options_from_value_rejects_bad_shapes() {
        assert!(InitOptions::from_value(&json!("sandbox")).is_err());
        assert!(InitOptions::from_value(&json!({ "apiVersion": "two" })).is_err());
        assert!(InitOptions::from_value(&json!({ "openTimeout": -1 })).is_err());
    }

    #[test]
    fn test_environment_parsing() {
        assert_eq!("PRODUCTION".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Sandbox);
        assert_eq!("test".parse::<Environment>().unwrap(), Environment::Test);
        assert!("".parse::<Environment>().is_err());
    }

    #[test]
    fn test_base_url_only_distinguishes_production() {
        assert_eq!(
            base_url_for(Environment::Test, 4),
            base_url_for(Environment::Sandbox, 4)
        );
        assert_ne!(
            base_url_for(Environment::Production, 4),
            base_url_for(Environment::Sandbox, 4)
        );
    }

    #[test]
    fn test_seal_open_roundtrip() {
        let config = init(json!({ "appKey": "k" }), InitOptions::default()).unwrap();
        let sealed = config.seal(b"{\"mobile\":\"1\"}");
        assert_eq!(config.open(&sealed).unwrap(), b"{\"mobile\":\"1\"}");
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = init(
            json!({ "appKey": "super-secret-key", "appSecret": "hush" }),
            InitOptions::default(),
        )
        .unwrap();
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret-key"));
        assert!(!rendered.contains("hush"));
    }
}
