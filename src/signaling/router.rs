//! Message router
//!
//! Dispatches one inbound text frame: role messages update the registry,
//! negotiation messages are forwarded verbatim to the counterpart side.

use tracing::{debug, info, warn};

use super::messages::{ClientMessage, SignalKind};
use super::registry::{Admission, ConnectionId, ConnectionRegistry};
use crate::error::RelayResult;

/// What the router did with a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routed {
    /// The sender now holds (or already held) the broadcaster slot
    BroadcasterAdmitted,
    /// The slot was taken; the sender has been told and is being closed
    BroadcasterRejected,
    /// The sender gave up the broadcaster slot
    BroadcasterReleased,
    /// The sender was registered as a viewer and sent the stream status
    StatusSent { is_live: bool },
    /// A negotiation message was queued for `delivered` connections
    Forwarded { kind: SignalKind, delivered: usize },
    /// Nothing to do
    Ignored,
}

impl Routed {
    /// Whether the reader loop should stop after this frame
    pub fn closes_connection(&self) -> bool {
        matches!(self, Routed::BroadcasterRejected)
    }
}

/// Route one text frame from connection `id`
pub fn route(registry: &ConnectionRegistry, id: ConnectionId, text: &str) -> RelayResult<Routed> {
    let message = ClientMessage::parse(text)?;

    let routed = match message {
        ClientMessage::Broadcaster => match registry.register_broadcaster(id) {
            Admission::Accepted => {
                info!(connection_id = id, "broadcaster connected");
                Routed::BroadcasterAdmitted
            }
            Admission::AlreadyBroadcasting => Routed::BroadcasterAdmitted,
            Admission::Rejected => {
                warn!(connection_id = id, "rejected second broadcaster");
                Routed::BroadcasterRejected
            }
        },
        ClientMessage::Viewer => Routed::StatusSent {
            is_live: registry.register_viewer(id),
        },
        ClientMessage::Signal { kind, target } => {
            let delivered = registry.forward(id, target, text);
            debug!(
                connection_id = id,
                kind = kind.as_str(),
                ?target,
                delivered,
                "relayed signaling message"
            );
            Routed::Forwarded { kind, delivered }
        }
        ClientMessage::Disconnect => {
            if registry.release_broadcaster(id) {
                info!(connection_id = id, "broadcaster disconnected");
                Routed::BroadcasterReleased
            } else {
                Routed::Ignored
            }
        }
        ClientMessage::Unknown(kind) => {
            debug!(connection_id = id, %kind, "ignoring unknown message type");
            Routed::Ignored
        }
    };

    Ok(routed)
}
