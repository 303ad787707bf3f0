//! HTTP client wrapper for streaming documents to disk.
//!
//! This module provides the `HttpClient` struct which handles streaming
//! downloads with proper timeout configuration and error handling.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, instrument};
use url::Url;

use super::Fetcher;
use super::constants::{CONNECT_TIMEOUT_SECS, FETCH_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::user_agent;

/// Network settings for [`HttpClient`].
#[derive(Debug, Clone)]
pub struct FetchSettings {
    /// TCP/TLS connect timeout.
    pub connect_timeout: Duration,
    /// Longest allowed stall between reads, while waiting for headers or body bytes.
    pub fetch_timeout: Duration,
    /// User-Agent header sent with every request.
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
            fetch_timeout: Duration::from_secs(FETCH_TIMEOUT_SECS),
            user_agent: user_agent::default_fetch_user_agent(),
        }
    }
}

/// HTTP client for downloading documents with streaming support.
///
/// This client is designed to be created once and reused for every item,
/// taking advantage of connection pooling.
///
/// # Example
///
/// ```no_run
/// use harvester_core::download::{Fetcher, HttpClient};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let bytes = client
///     .stream_to("https://example.com/act.pdf", Path::new("./act.pdf"))
///     .await?;
/// println!("Downloaded {bytes} bytes");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read (stall) timeout: 120 seconds
    /// - Gzip decompression: enabled
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new() -> Self {
        Self::with_settings(&FetchSettings::default())
            .expect("failed to build HTTP client with static configuration")
    }

    /// Creates a client with explicit timeouts and User-Agent.
    ///
    /// # Errors
    ///
    /// Returns the reqwest builder error when the TLS backend cannot be initialized
    /// or the User-Agent is not a valid header value.
    pub fn with_settings(settings: &FetchSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(settings.connect_timeout)
            .read_timeout(settings.fetch_timeout)
            .gzip(true)
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetcher for HttpClient {
    #[instrument(skip(self, destination), fields(url = %url, destination = %destination.display()))]
    async fn stream_to(&self, url: &str, destination: &Path) -> Result<u64, DownloadError> {
        debug!("starting download");

        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::from_transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let mut file = File::create(destination)
            .await
            .map_err(|e| DownloadError::io(destination, e))?;

        let stream_result = stream_to_file(&mut file, response, url, destination).await;
        if stream_result.is_err() {
            debug!(path = %destination.display(), "cleaning up partial file after error");
            drop(file);
            let _ = tokio::fs::remove_file(destination).await;
        }
        let bytes_written = stream_result?;

        debug!(bytes = bytes_written, "transfer complete");
        Ok(bytes_written)
    }
}

/// Streams response body to file, returning bytes written.
///
/// This is extracted to enable cleanup on error in the caller.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::from_transport(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path, e))?;

        bytes_written += chunk.len() as u64;
    }

    // Ensure all data is flushed to disk
    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path, e))?;

    Ok(bytes_written)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::test_support::socket_guard::start_mock_server_or_skip;
    use tempfile::TempDir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, ResponseTemplate};

    fn short_timeout_client(secs: u64) -> HttpClient {
        HttpClient::with_settings(&FetchSettings {
            fetch_timeout: Duration::from_secs(secs),
            ..FetchSettings::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_stream_to_writes_body_and_returns_length() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/act.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 statute"))
            .mount(&mock_server)
            .await;

        let client = HttpClient::new();
        let destination = temp_dir.path().join("Contract Act.pdf");
        let url = format!("{}/act.pdf", mock_server.uri());

        let bytes = client.stream_to(&url, &destination).await.unwrap();

        assert_eq!(bytes, 16);
        assert_eq!(std::fs::read(&destination).unwrap(), b"%PDF-1.4 statute");
    }

    #[tokio::test]
    async fn test_stream_to_overwrites_existing_file() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();
        let destination = temp_dir.path().join("act.pdf");
        std::fs::write(&destination, b"stale content that is much longer").unwrap();

        Mock::given(method("GET"))
            .and(path("/act.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fresh"))
            .mount(&mock_server)
            .await;

        let url = format!("{}/act.pdf", mock_server.uri());
        HttpClient::new().stream_to(&url, &destination).await.unwrap();

        assert_eq!(std::fs::read(&destination).unwrap(), b"fresh");
    }

    #[tokio::test]
    async fn test_stream_to_404_is_error_and_creates_no_file() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/missing.pdf"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let destination = temp_dir.path().join("missing.pdf");
        let url = format!("{}/missing.pdf", mock_server.uri());
        let result = HttpClient::new().stream_to(&url, &destination).await;

        match result {
            Err(DownloadError::HttpStatus { status, .. }) => assert_eq!(status, 404),
            other => panic!("Expected HttpStatus error, got: {other:?}"),
        }
        assert!(!destination.exists(), "non-2xx must not leave an empty file");
    }

    #[tokio::test]
    async fn test_stream_to_500_is_error() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/error"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let url = format!("{}/error", mock_server.uri());
        let result = HttpClient::new()
            .stream_to(&url, &temp_dir.path().join("error.pdf"))
            .await;

        assert!(matches!(
            result,
            Err(DownloadError::HttpStatus { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn test_stream_to_invalid_url() {
        let temp_dir = TempDir::new().unwrap();
        let result = HttpClient::new()
            .stream_to("not-a-valid-url", &temp_dir.path().join("x.pdf"))
            .await;

        assert!(matches!(result, Err(DownloadError::InvalidUrl { .. })));
    }

    #[tokio::test]
    async fn test_stream_to_timeout_is_reported_and_leaves_no_file() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/slow.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&mock_server)
            .await;

        let destination = temp_dir.path().join("slow.pdf");
        let url = format!("{}/slow.pdf", mock_server.uri());
        let result = short_timeout_client(1).stream_to(&url, &destination).await;

        assert!(
            matches!(result, Err(DownloadError::Timeout { .. })),
            "Expected timeout, got: {result:?}"
        );
        assert!(!destination.exists());
    }

    /// Serves one response whose body arrives a byte at a time, `gap` apart.
    async fn spawn_trickling_server(body: &'static [u8], gap: Duration) -> String {
        use tokio::io::AsyncReadExt;
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0_u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\nContent-Length: {}\r\n\r\n",
                body.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            for byte in body {
                tokio::time::sleep(gap).await;
                // The client may already have given up on a stalled body.
                if socket.write_all(std::slice::from_ref(byte)).await.is_err() {
                    return;
                }
                let _ = socket.flush().await;
            }
        });
        format!("http://{addr}/trickle.pdf")
    }

    #[tokio::test]
    async fn test_stream_to_slow_but_steady_transfer_outlasts_fetch_timeout() {
        if crate::test_support::socket_guard::should_skip_socket_bound_test() {
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let url = spawn_trickling_server(b"%PDF-1", Duration::from_millis(400)).await;
        let destination = temp_dir.path().join("trickle.pdf");

        // 6 bytes at 400ms each take ~2.4s in total, but no single read stalls for 1s.
        let bytes = short_timeout_client(1)
            .stream_to(&url, &destination)
            .await
            .unwrap();

        assert_eq!(bytes, 6);
        assert_eq!(std::fs::read(&destination).unwrap(), b"%PDF-1");
    }

    #[tokio::test]
    async fn test_stream_to_stalled_body_times_out_and_leaves_no_file() {
        if crate::test_support::socket_guard::should_skip_socket_bound_test() {
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let url = spawn_trickling_server(b"%P", Duration::from_secs(3)).await;
        let destination = temp_dir.path().join("stalled.pdf");

        let result = short_timeout_client(1).stream_to(&url, &destination).await;

        assert!(
            matches!(result, Err(DownloadError::Timeout { .. })),
            "Expected timeout, got: {result:?}"
        );
        assert!(!destination.exists());
    }

    #[tokio::test]
    async fn test_stream_to_sends_configured_user_agent() {
        let Some(mock_server) = start_mock_server_or_skip().await else {
            return;
        };
        let temp_dir = TempDir::new().unwrap();

        Mock::given(method("GET"))
            .and(path("/ua.pdf"))
            .and(header("user-agent", "custom-agent/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ok"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = HttpClient::with_settings(&FetchSettings {
            user_agent: "custom-agent/1.0".to_string(),
            ..FetchSettings::default()
        })
        .unwrap();
        let url = format!("{}/ua.pdf", mock_server.uri());

        let bytes = client
            .stream_to(&url, &temp_dir.path().join("ua.pdf"))
            .await
            .unwrap();
        assert_eq!(bytes, 2);
    }
}
