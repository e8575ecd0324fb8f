//! Signaling message types
//!
//! Inbound frames are only inspected for their `type` and `target` fields.
//! Offer, answer and candidate payloads stay opaque and are relayed as the
//! original text.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Side of the relay a signaling message is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// The current broadcaster
    Broadcaster,
    /// Every non-broadcaster connection except the sender
    Viewers,
}

/// WebRTC negotiation message kind
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    Candidate,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Offer => "offer",
            SignalKind::Answer => "answer",
            SignalKind::Candidate => "candidate",
        }
    }
}

/// Inbound message classified by its declared `type`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Claim the broadcaster slot
    Broadcaster,
    /// Announce as a viewer and ask for the stream status
    Viewer,
    /// Relay a negotiation message to the counterpart side
    Signal { kind: SignalKind, target: Target },
    /// Give up the broadcaster slot
    Disconnect,
    /// Any other `type`; ignored by the router
    Unknown(String),
}

/// Minimal view of an inbound frame
#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    target: Option<Value>,
}

impl ClientMessage {
    /// Classify a text frame. Fails on invalid JSON or a missing string `type`.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let envelope: Envelope = serde_json::from_str(text)?;

        let target = match envelope.target.as_ref().and_then(Value::as_str) {
            Some("broadcaster") => Target::Broadcaster,
            _ => Target::Viewers,
        };

        let message = match envelope.kind.as_str() {
            "broadcaster" => ClientMessage::Broadcaster,
            "viewer" => ClientMessage::Viewer,
            "disconnect" => ClientMessage::Disconnect,
            "offer" => ClientMessage::Signal {
                kind: SignalKind::Offer,
                target,
            },
            "answer" => ClientMessage::Signal {
                kind: SignalKind::Answer,
                target,
            },
            "candidate" => ClientMessage::Signal {
                kind: SignalKind::Candidate,
                target,
            },
            _ => ClientMessage::Unknown(envelope.kind),
        };

        Ok(message)
    }
}

/// Messages originated by the relay itself
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    /// Whether a broadcaster is currently live
    StreamStatus {
        #[serde(rename = "isLive")]
        is_live: bool,
    },

    /// Number of connections that announced themselves as viewers
    ViewerCount { count: usize },

    /// Request rejected; the connection may be closed afterwards
    Error { message: String },
}

impl ServerMessage {
    pub fn stream_status(is_live: bool) -> Self {
        ServerMessage::StreamStatus { is_live }
    }

    pub fn broadcaster_exists() -> Self {
        ServerMessage::Error {
            message: "Broadcaster already exists".to_string(),
        }
    }
}
