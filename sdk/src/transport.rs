//! HTTP transport.
//!
//! The request-construction core never does I/O; this module is where a
//! [`PreparedRequest`] meets the network. The [`Transport`] trait is the
//! seam: [`HttpTransport`] is the reqwest-backed implementation, and tests
//! plug in their own.
//!
//! ## Wire shape
//!
//! - `POST`: body `{"authData": "<base64>"}`.
//! - `GET`: `authData` as a query parameter, no body.
//!
//! Envelope headers are sent verbatim in both cases.
//!
//! ## Retries
//!
//! Only connection-level failures (connect errors, timeouts) are retried, up
//! to `max_network_retries` extra attempts with `network_retry_delay`
//! between them. A response with an error status is an answer, not a
//! failure to get one, and is returned immediately as
//! [`TransportError::Api`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::TransportError;
use crate::resources::{HttpMethod, PreparedRequest};

/// Query parameter / body field carrying the encrypted payload.
pub const AUTH_DATA_FIELD: &str = "authData";

/// A decoded API response.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    /// Parsed JSON body; `Value::Null` when the body was empty.
    pub body: Value,
}

/// Sends prepared requests.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &PreparedRequest) -> Result<ApiResponse, TransportError>;
}

#[derive(Serialize)]
struct AuthBody<'a> {
    #[serde(rename = "authData")]
    auth_data: &'a str,
}

/// reqwest-backed [`Transport`] honoring the config's timeouts and retry
/// policy.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: String,
    network_retry_delay: Duration,
    max_network_retries: u32,
}

impl HttpTransport {
    /// Transport pointed at `config.base_url()`.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        Self::with_base_url(config, config.base_url())
    }

    /// Transport pointed at an arbitrary base URL (a proxy or a local mock),
    /// with everything else taken from `config`.
    ///
    /// Timeouts map onto reqwest as: connect = `open_timeout`, per-read =
    /// `read_timeout`, and the whole exchange is bounded by the sum of the
    /// open, read and write timeouts. Certificate verification is switched
    /// off when `force_ssl` is false.
    pub fn with_base_url(config: &ClientConfig, base_url: &str) -> Result<Self, TransportError> {
        let total = config
            .open_timeout()
            .saturating_add(config.read_timeout())
            .saturating_add(config.write_timeout());
        let http = reqwest::Client::builder()
            .connect_timeout(config.open_timeout())
            .read_timeout(config.read_timeout())
            .timeout(total)
            .danger_accept_invalid_certs(!config.force_ssl())
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(HttpTransport {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            network_retry_delay: config.network_retry_delay(),
            max_network_retries: config.max_network_retries(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build(
        &self,
        request: &PreparedRequest,
        url: &str,
    ) -> Result<reqwest::RequestBuilder, TransportError> {
        let auth_data = request.envelope.auth_data.as_str();
        let mut builder = match request.method {
            HttpMethod::Get => self.http.get(url).query(&[(AUTH_DATA_FIELD, auth_data)]),
            HttpMethod::Post => {
                let body = serde_json::to_vec(&AuthBody { auth_data })
                    .map_err(|e| TransportError::Client(e.into()))?;
                self.http.post(url).body(body)
            }
        };
        for (name, value) in &request.envelope.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        Ok(builder)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<ApiResponse, TransportError> {
        let url = request.url(&self.base_url);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            tracing::debug!(
                operation = %request.operation,
                method = %request.method,
                %url,
                attempt,
                "sending request"
            );

            match self.build(request, &url)?.send().await {
                Ok(response) => return decode_response(response, attempt).await,
                Err(e) if is_retryable(&e) && attempt <= self.max_network_retries => {
                    tracing::warn!(
                        operation = %request.operation,
                        attempt,
                        error = %e,
                        "network error, retrying in {:?}",
                        self.network_retry_delay
                    );
                    tokio::time::sleep(self.network_retry_delay).await;
                }
                Err(e) => {
                    return Err(TransportError::Network {
                        attempts: attempt,
                        message: e.to_string(),
                    })
                }
            }
        }
    }
}

fn is_retryable(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout()
}

async fn decode_response(
    response: reqwest::Response,
    attempts: u32,
) -> Result<ApiResponse, TransportError> {
    let status = response.status();
    let text = response.text().await.map_err(|e| TransportError::Network {
        attempts,
        message: format!("failed to read response body: {e}"),
    })?;

    if !status.is_success() {
        return Err(TransportError::Api {
            status: status.as_u16(),
            body: text,
        });
    }

    let body = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).map_err(|e| TransportError::Decode(e.to_string()))?
    };

    Ok(ApiResponse {
        status: status.as_u16(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InitOptions;
    use crate::envelope::{open_auth_data, WALLET_TOKEN_HEADER};
    use crate::resources::{Balance, Transfer};
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn config(options: Value) -> ClientConfig {
        ClientConfig::init_with_env(
            &json!({ "appKey": "k" }),
            InitOptions::from_value(&options).unwrap(),
            |_| None,
        )
        .unwrap()
    }

    /// Raw HTTP request as seen by the server.
    struct Captured {
        head: String,
        body: String,
    }

    /// One-shot HTTP/1.1 server: reads a single request, answers with
    /// `status` and `body`, and hands back what it received.
    async fn one_shot_server(
        status: &'static str,
        body: &'static str,
    ) -> (String, tokio::task::JoinHandle<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];

            let head_end = loop {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending headers");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
            let content_length = head
                .lines()
                .find_map(|l| {
                    let (name, value) = l.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            while buf.len() < head_end + content_length {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending the body");
                buf.extend_from_slice(&chunk[..n]);
            }
            let req_body = String::from_utf8_lossy(&buf[head_end..]).to_string();

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();

            Captured {
                head,
                body: req_body,
            }
        });

        (format!("http://{addr}/v1"), handle)
    }

    #[tokio::test]
    async fn test_post_sends_auth_data_body_and_headers() {
        let config = config(json!({}));
        let (base_url, server) = one_shot_server("200 OK", r#"{"success":true}"#).await;
        let transport = HttpTransport::with_base_url(&config, &base_url).unwrap();

        let request = Transfer::credit_phone(
            &config,
            &json!({ "mobile": "2348000000000", "amount": 100, "walletToken": "tok" }),
        )
        .unwrap();
        let response = transport.send(&request).await.unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.body, json!({ "success": true }));

        let captured = server.await.unwrap();
        assert!(captured.head.starts_with("POST /v1/users/transfers/phone "));
        let head = captured.head.to_ascii_lowercase();
        assert!(head.contains(&format!("{}: tok", WALLET_TOKEN_HEADER.to_ascii_lowercase())));
        assert!(head.contains("x-app-key: k"));

        let body: Value = serde_json::from_str(&captured.body).unwrap();
        let auth_data = body[AUTH_DATA_FIELD].as_str().unwrap();
        assert_eq!(
            open_auth_data(&config, auth_data).unwrap(),
            json!({ "mobile": "2348000000000", "amount": 100 })
        );
    }

    #[tokio::test]
    async fn test_get_sends_auth_data_as_query() {
        let config = config(json!({}));
        let (base_url, server) = one_shot_server("200 OK", r#"{"balance":0}"#).await;
        let transport = HttpTransport::with_base_url(&config, &base_url).unwrap();

        let request = Balance::retrieve(&config, &json!({ "mobile": "1" })).unwrap();
        transport.send(&request).await.unwrap();

        let captured = server.await.unwrap();
        assert!(captured.head.starts_with("GET /v1/users/balance?authData="));
        assert!(captured.body.is_empty());
    }

    #[tokio::test]
    async fn test_error_status_is_not_retried() {
        let config = config(json!({ "maxNetworkRetries": 5 }));
        let (base_url, server) =
            one_shot_server("400 Bad Request", r#"{"message":"bad"}"#).await;
        let transport = HttpTransport::with_base_url(&config, &base_url).unwrap();

        let request = Balance::retrieve(&config, &json!({ "mobile": "1" })).unwrap();
        let err = transport.send(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Api { status: 400, .. }));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connection_failures_are_retried_then_reported() {
        // Bind then drop to get a port nothing is listening on.
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let config = config(json!({ "maxNetworkRetries": 2, "networkRetryDelay": 0.01 }));
        let transport =
            HttpTransport::with_base_url(&config, &format!("http://127.0.0.1:{port}/v1")).unwrap();

        let request = Balance::retrieve(&config, &json!({ "mobile": "1" })).unwrap();
        let err = transport.send(&request).await.unwrap_err();
        assert!(matches!(err, TransportError::Network { attempts: 3, .. }));
    }

    #[tokio::test]
    async fn test_truncated_body_is_a_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending headers");
                buf.extend_from_slice(&chunk[..n]);
            }
            stream
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\n{\"balance\"")
                .await
                .unwrap();
            stream.shutdown().await.unwrap();
        });

        let config = config(json!({}));
        let transport = HttpTransport::with_base_url(&config, &format!("http://{addr}/v1")).unwrap();
        let request = Balance::retrieve(&config, &json!({ "mobile": "1" })).unwrap();

        let err = transport.send(&request).await.unwrap_err();
        server.await.unwrap();
        match err {
            TransportError::Network { attempts, message } => {
                assert_eq!(attempts, 1);
                assert!(message.starts_with("failed to read response body"));
            }
            other => panic!("expected a network error, got {other:?}"),
        }
    }

    #[test]
    fn test_huge_timeouts_do_not_overflow() {
        let config = config(json!({
            "openTimeout": 1.0e19,
            "readTimeout": 1.0e19,
            "writeTimeout": 1.0e19,
        }));
        assert!(config.open_timeout() > Duration::from_secs(u64::MAX / 2));
        assert!(HttpTransport::new(&config).is_ok());
    }

    #[test]
    fn test_transport_uses_config_base_url() {
        let config = config(json!({ "environment": "sandbox", "forceSsl": false }));
        let transport = HttpTransport::new(&config).unwrap();
        assert_eq!(transport.base_url(), config.base_url());
    }
}
