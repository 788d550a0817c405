//! HTTP access to the archive store.
//!
//! The fetcher talks to the store through the [`ArchiveSource`] trait;
//! [`DownloadClient`] is the reqwest-backed implementation.

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use quarry_types::settings::DownloadSettings;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Streaming response body.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, SourceError>> + Send>>;

/// Configuration for the download client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Idle connections kept per host; match the worker count.
    pub concurrency: usize,
    /// Longest wait for the next bytes of a response. A slow body that keeps
    /// arriving never hits it.
    pub timeout: Duration,
    /// Connection establishment timeout.
    pub connect_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            user_agent: format!("quarry/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Builds a client configuration from the `[download]` settings.
    #[must_use]
    pub fn from_settings(download: &DownloadSettings) -> Self {
        Self {
            concurrency: download.max_concurrent_downloads,
            timeout: download.timeout(),
            ..Self::default()
        }
    }
}

/// Transport-level failures. All of them are retryable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Connection could not be established.
    #[error("connection failed: {0}")]
    Connect(String),

    /// Any other transport or body error.
    #[error("transport error: {0}")]
    Transport(String),

    /// Body could not be decoded.
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error.to_string())
        } else {
            Self::Transport(error.to_string())
        }
    }
}

/// What the store answered.
pub enum SourceResponse {
    /// 404: no archive for this key.
    NotFound,
    /// Any other non-success status.
    Status(u16),
    /// Success, with the body still to be streamed.
    Body(ByteStream),
}

impl std::fmt::Debug for SourceResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => f.write_str("NotFound"),
            Self::Status(status) => f.debug_tuple("Status").field(status).finish(),
            Self::Body(_) => f.write_str("Body(..)"),
        }
    }
}

/// Source of archive bytes.
#[async_trait]
pub trait ArchiveSource: Send + Sync {
    /// Issues one GET request. Never retries.
    async fn get(&self, url: &str) -> Result<SourceResponse, SourceError>;
}

/// HTTP client with connection pooling.
#[derive(Debug, Clone)]
pub struct DownloadClient {
    client: Client,
    config: ClientConfig,
}

impl DownloadClient {
    /// Creates a new download client with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .pool_max_idle_per_host(config.concurrency)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_nodelay(true)
            .tcp_keepalive(Duration::from_secs(60))
            .read_timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(&config.user_agent)
            .gzip(true)
            .build()?;
        Ok(Self { client, config })
    }

    /// Creates a client with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_defaults() -> Result<Self, reqwest::Error> {
        Self::new(ClientConfig::default())
    }

    /// Returns the client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Fetches and decodes a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure, a non-success status, or a body
    /// that does not decode as `T`.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, SourceError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Transport(format!("HTTP {status} for {url}")));
        }
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| SourceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl ArchiveSource for DownloadClient {
    async fn get(&self, url: &str) -> Result<SourceResponse, SourceError> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(SourceResponse::NotFound);
        }
        if !status.is_success() {
            return Ok(SourceResponse::Status(status.as_u16()));
        }

        let stream = response.bytes_stream().map_err(SourceError::from);
        Ok(SourceResponse::Body(Box::pin(stream)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves `response` to every connection and returns the base URL.
    async fn serve(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(async move {
                    let mut buf = [0u8; 4096];
                    let _ = socket.read(&mut buf).await;
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{addr}/")
    }

    /// Sends a 200 header for a `len`-byte body, then the body one byte at a
    /// time with `gap` between bytes, stopping after `sent` bytes.
    async fn serve_trickle(len: usize, sent: usize, gap: Duration) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            let header =
                format!("HTTP/1.1 200 OK\r\nContent-Length: {len}\r\nConnection: close\r\n\r\n");
            let _ = socket.write_all(header.as_bytes()).await;
            for _ in 0..sent {
                tokio::time::sleep(gap).await;
                if socket.write_all(b"x").await.is_err() {
                    return;
                }
                let _ = socket.flush().await;
            }
            // Hold the connection open so a stalled body cannot end early.
            tokio::time::sleep(Duration::from_secs(5)).await;
        });
        format!("http://{addr}/")
    }

    fn short_timeout_client(timeout: Duration) -> DownloadClient {
        DownloadClient::new(ClientConfig {
            timeout,
            ..ClientConfig::default()
        })
        .unwrap()
    }

    async fn drain(mut stream: ByteStream) -> (usize, Option<SourceError>) {
        let mut received = 0;
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => received += bytes.len(),
                Err(e) => return (received, Some(e)),
            }
        }
        (received, None)
    }

    #[tokio::test]
    async fn test_slow_body_outlasting_timeout_completes() {
        // 10 bytes at 100ms each take about a second, well past the 400ms limit.
        let base = serve_trickle(10, 10, Duration::from_millis(100)).await;
        let client = short_timeout_client(Duration::from_millis(400));

        let response = client.get(&format!("{base}slow.zip")).await.unwrap();
        let SourceResponse::Body(stream) = response else {
            panic!("expected body, got {response:?}");
        };
        let (received, error) = drain(stream).await;
        assert_eq!(error, None);
        assert_eq!(received, 10);
    }

    #[tokio::test]
    async fn test_stalled_body_times_out() {
        let base = serve_trickle(10, 2, Duration::from_millis(10)).await;
        let client = short_timeout_client(Duration::from_millis(300));

        let response = client.get(&format!("{base}stalled.zip")).await.unwrap();
        let SourceResponse::Body(stream) = response else {
            panic!("expected body, got {response:?}");
        };
        let (received, error) = drain(stream).await;
        assert!(received < 10);
        assert!(error.is_some());
    }

    #[test]
    fn test_client_config_from_settings() {
        let settings = DownloadSettings {
            max_concurrent_downloads: 7,
            timeout: 2.5,
            ..DownloadSettings::default()
        };
        let config = ClientConfig::from_settings(&settings);
        assert_eq!(config.concurrency, 7);
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert!(config.user_agent.starts_with("quarry/"));
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = DownloadClient::with_defaults();
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_get_streams_body() {
        let base = serve("HTTP/1.1 200 OK\r\nContent-Length: 5\r\nConnection: close\r\n\r\nhello").await;
        let client = DownloadClient::with_defaults().unwrap();

        let response = client.get(&format!("{base}a.zip")).await.unwrap();
        let SourceResponse::Body(mut stream) = response else {
            panic!("expected body, got {response:?}");
        };
        let mut body = Vec::new();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn test_get_maps_not_found() {
        let base = serve("HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let client = DownloadClient::with_defaults().unwrap();

        let response = client.get(&format!("{base}missing.zip")).await.unwrap();
        assert!(matches!(response, SourceResponse::NotFound));
    }

    #[tokio::test]
    async fn test_get_reports_error_status() {
        let base = serve("HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n").await;
        let client = DownloadClient::with_defaults().unwrap();

        let response = client.get(&format!("{base}busy.zip")).await.unwrap();
        assert!(matches!(response, SourceResponse::Status(503)));
    }

    #[tokio::test]
    async fn test_get_json() {
        let base = serve(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 13\r\nConnection: close\r\n\r\n{\"value\": 42}",
        )
        .await;
        let client = DownloadClient::with_defaults().unwrap();

        let value: serde_json::Value = client.get_json(&format!("{base}info")).await.unwrap();
        assert_eq!(value["value"], 42);
    }

    #[tokio::test]
    async fn test_connection_refused_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = DownloadClient::with_defaults().unwrap();
        let result = client.get(&format!("http://{addr}/a.zip")).await;
        assert!(result.is_err());
    }
}
