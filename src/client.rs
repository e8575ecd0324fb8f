//! Signaling client
//!
//! Thin WebSocket client for the relay, with the capped reconnect policy the
//! browser pages use: retry a few times with a fixed or linearly growing
//! delay, then give up.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Client errors
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("gave up after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        source: tungstenite::Error,
    },

    #[error("connection closed")]
    Closed,
}

/// Delay schedule for reconnect attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Added to the delay for every further retry
    pub step: Duration,
    /// Retries after the initial attempt
    pub max_retries: u32,
}

impl ReconnectPolicy {
    pub fn fixed(delay: Duration, max_retries: u32) -> Self {
        Self {
            base_delay: delay,
            step: Duration::ZERO,
            max_retries,
        }
    }

    pub fn linear(base_delay: Duration, step: Duration, max_retries: u32) -> Self {
        Self {
            base_delay,
            step,
            max_retries,
        }
    }

    /// Single attempt, no retries
    pub fn never() -> Self {
        Self::fixed(Duration::ZERO, 0)
    }

    /// Delay before retry number `attempt` (1-based), or `None` once the
    /// retry budget is spent
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_retries {
            return None;
        }
        Some(self.base_delay + self.step * (attempt - 1))
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::fixed(Duration::from_secs(3), 3)
    }
}

/// Connected signaling client
pub struct SignalingClient {
    stream: WsStream,
}

impl SignalingClient {
    /// Connect to `url`, retrying per `policy`
    pub async fn connect(url: &str, policy: &ReconnectPolicy) -> Result<Self, ClientError> {
        let mut failures = 0;
        loop {
            match connect_async(url).await {
                Ok((stream, _)) => {
                    debug!(url, failures, "connected to signaling server");
                    return Ok(Self { stream });
                }
                Err(e) => {
                    failures += 1;
                    match policy.delay_for(failures) {
                        Some(delay) => {
                            warn!(url, attempt = failures, ?delay, error = %e, "connect failed, retrying");
                            tokio::time::sleep(delay).await;
                        }
                        None => {
                            return Err(ClientError::Exhausted {
                                attempts: failures,
                                source: e,
                            })
                        }
                    }
                }
            }
        }
    }

    /// Send a raw text frame
    pub async fn send_text(&mut self, text: impl Into<String>) -> Result<(), ClientError> {
        self.stream.send(Message::Text(text.into())).await?;
        Ok(())
    }

    pub async fn send_json(&mut self, value: &Value) -> Result<(), ClientError> {
        self.send_text(serde_json::to_string(value)?).await
    }

    /// Claim the broadcaster slot
    pub async fn announce_broadcaster(&mut self) -> Result<(), ClientError> {
        self.send_json(&json!({"type": "broadcaster"})).await
    }

    /// Announce as a viewer
    pub async fn announce_viewer(&mut self) -> Result<(), ClientError> {
        self.send_json(&json!({"type": "viewer"})).await
    }

    /// Release the broadcaster slot
    pub async fn disconnect(&mut self) -> Result<(), ClientError> {
        self.send_json(&json!({"type": "disconnect"})).await
    }

    /// Next text frame parsed as JSON. Control and binary frames are skipped.
    pub async fn next_json(&mut self) -> Result<Value, ClientError> {
        while let Some(frame) = self.stream.next().await {
            match frame? {
                Message::Text(text) => return Ok(serde_json::from_str(&text)?),
                Message::Close(_) => return Err(ClientError::Closed),
                _ => continue,
            }
        }
        Err(ClientError::Closed)
    }

    /// Send a close frame and wait for the server to acknowledge it
    pub async fn close(mut self) -> Result<(), ClientError> {
        match self.stream.close(None).await {
            Ok(()) | Err(tungstenite::Error::ConnectionClosed) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
