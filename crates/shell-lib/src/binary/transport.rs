//! Download transport and progress reporting
//!
//! `Transport` is the seam between the cache resolver and the network, so
//! the resolver can be exercised with in-memory bodies.

use crate::error::{Result, ShellError};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Failure reported by a transport, request or body
#[derive(Debug, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// A streaming response body
pub struct Download {
    /// Declared content length, if the server sent one
    pub content_length: Option<u64>,
    pub body: BoxStream<'static, Result<Bytes, TransportError>>,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Start a GET and return the body stream
    async fn fetch(&self, url: &Url) -> Result<Download, TransportError>;
}

/// Receives download progress
///
/// `started` is called once with the total size when known; `None` means
/// the caller should show an indeterminate spinner.
pub trait DownloadProgress: Send + Sync {
    fn started(&self, total: Option<u64>);
    fn advanced(&self, bytes: u64);
    fn finished(&self);
    fn failed(&self) {}
}

/// Progress sink that ignores everything
pub struct NoProgress;

impl DownloadProgress for NoProgress {
    fn started(&self, _total: Option<u64>) {}
    fn advanced(&self, _bytes: u64) {}
    fn finished(&self) {}
}

/// reqwest backed transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(connect_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ShellError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &Url) -> Result<Download, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| TransportError(format!("request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(TransportError(format!(
                "{} returned {}",
                url,
                response.status()
            )));
        }

        let content_length = response.content_length();
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError(format!("download interrupted: {}", e))))
            .boxed();

        Ok(Download {
            content_length,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn collect(download: Download) -> Vec<u8> {
        let mut body = download.body;
        let mut data = Vec::new();
        while let Some(chunk) = body.next().await {
            data.extend_from_slice(&chunk.unwrap());
        }
        data
    }

    #[tokio::test]
    async fn test_http_transport_streams_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/release/v1.29.3/bin/linux/amd64/kubectl")
            .with_status(200)
            .with_body(vec![7u8; 4096])
            .create_async()
            .await;

        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse(&format!(
            "{}/release/v1.29.3/bin/linux/amd64/kubectl",
            server.url()
        ))
        .unwrap();

        let download = transport.fetch(&url).await.unwrap();
        assert_eq!(download.content_length, Some(4096));
        assert_eq!(collect(download).await, vec![7u8; 4096]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_http_transport_rejects_error_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/release/v9.9.9/bin/linux/amd64/kubectl")
            .with_status(404)
            .create_async()
            .await;

        let transport = HttpTransport::new(Duration::from_secs(5)).unwrap();
        let url = Url::parse(&format!(
            "{}/release/v9.9.9/bin/linux/amd64/kubectl",
            server.url()
        ))
        .unwrap();

        match transport.fetch(&url).await {
            Err(err) => assert!(err.to_string().contains("404")),
            Ok(_) => panic!("expected 404 to fail"),
        }
    }
}
