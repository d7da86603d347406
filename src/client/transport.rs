//! Transports the reconnection controller runs over

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use thiserror::Error;

use super::decoder::SseDecoder;
use crate::realtime::Frame;
use crate::types::Snapshot;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
    #[error("stream closed by server")]
    StreamClosed,
    #[error("invalid snapshot: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Frames of one physical connection; ends with an error, never with `None`
/// under normal operation.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<Frame, ClientError>> + Send>>;

#[async_trait]
pub trait StatusTransport: Send + Sync {
    /// Whether `open_stream` can work at all; if not the client polls
    fn supports_streaming(&self) -> bool {
        true
    }

    async fn open_stream(&self) -> Result<FrameStream, ClientError>;

    async fn fetch_snapshot(&self) -> Result<Snapshot, ClientError>;
}

/// `reqwest` transport against a running status server
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl StatusTransport for HttpTransport {
    async fn open_stream(&self) -> Result<FrameStream, ClientError> {
        let response = self
            .client
            .get(format!("{}/api/status/stream", self.base_url))
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        let mut body = response.bytes_stream();
        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            while let Some(chunk) = body.next().await {
                match chunk {
                    Ok(bytes) => {
                        for frame in decoder.feed(&bytes) {
                            yield Ok(frame);
                        }
                    }
                    Err(e) => {
                        yield Err(ClientError::Http(e));
                        return;
                    }
                }
            }
            yield Err(ClientError::StreamClosed);
        };

        Ok(Box::pin(stream))
    }

    async fn fetch_snapshot(&self) -> Result<Snapshot, ClientError> {
        let response = self
            .client
            .get(format!("{}/api/status", self.base_url))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
