//! Connection registry
//!
//! Owns every open signaling connection and the single broadcaster slot.
//! All admission decisions and fan-out happen under one mutex, so two
//! sockets can never both hold the slot. Sends are unbounded channel pushes
//! and never block while the lock is held.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::warn;

use super::messages::{ServerMessage, Target};

/// Identifier assigned to each socket on registration
pub type ConnectionId = u64;

/// Role a connection has declared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Unassigned,
    Viewer,
    Broadcaster,
}

/// Frame queued for a connection's writer task
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Close,
}

/// Result of a broadcaster claim
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The slot was free and is now held by the caller
    Accepted,
    /// The caller already holds the slot
    AlreadyBroadcasting,
    /// Another connection holds the slot; the caller was sent an error and closed
    Rejected,
}

struct Peer {
    role: Role,
    tx: mpsc::UnboundedSender<Outbound>,
}

#[derive(Default)]
struct Inner {
    peers: HashMap<ConnectionId, Peer>,
    broadcaster: Option<ConnectionId>,
}

impl Inner {
    fn push(&self, id: ConnectionId, frame: Outbound) -> bool {
        match self.peers.get(&id) {
            // A closed receiver means the writer already exited
            Some(peer) => peer.tx.send(frame).is_ok(),
            None => false,
        }
    }

    fn send_message(&self, id: ConnectionId, message: &ServerMessage) -> bool {
        match serde_json::to_string(message) {
            Ok(json) => self.push(id, Outbound::Text(json)),
            Err(e) => {
                warn!(connection_id = id, error = %e, "failed to encode server message");
                false
            }
        }
    }

    /// Send to every connection that is not the broadcaster
    fn notify_audience(&self, message: &ServerMessage) {
        let Ok(json) = serde_json::to_string(message) else {
            return;
        };
        for (id, peer) in &self.peers {
            if Some(*id) != self.broadcaster {
                let _ = peer.tx.send(Outbound::Text(json.clone()));
            }
        }
    }

    fn viewer_count(&self) -> usize {
        self.peers
            .values()
            .filter(|p| p.role == Role::Viewer)
            .count()
    }

    /// Send the viewer count to the broadcaster and every viewer
    fn publish_viewer_count(&self) {
        let message = ServerMessage::ViewerCount {
            count: self.viewer_count(),
        };
        let Ok(json) = serde_json::to_string(&message) else {
            return;
        };
        for peer in self.peers.values() {
            if matches!(peer.role, Role::Viewer | Role::Broadcaster) {
                let _ = peer.tx.send(Outbound::Text(json.clone()));
            }
        }
    }

    fn clear_broadcaster(&mut self) {
        self.broadcaster = None;
        self.notify_audience(&ServerMessage::stream_status(false));
        self.publish_viewer_count();
    }
}

/// Registry of open sockets and the active broadcaster
pub struct ConnectionRegistry {
    inner: Mutex<Inner>,
    next_id: AtomicU64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add an open socket. The receiver yields frames for its writer task.
    pub fn register(&self) -> (ConnectionId, mpsc::UnboundedReceiver<Outbound>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().peers.insert(
            id,
            Peer {
                role: Role::Unassigned,
                tx,
            },
        );
        (id, rx)
    }

    /// Claim the broadcaster slot for `id`
    pub fn register_broadcaster(&self, id: ConnectionId) -> Admission {
        let mut inner = self.inner.lock();
        if !inner.peers.contains_key(&id) {
            return Admission::Rejected;
        }

        let current = inner.broadcaster;
        match current {
            Some(holder) if holder == id => Admission::AlreadyBroadcasting,
            Some(_) => {
                inner.send_message(id, &ServerMessage::broadcaster_exists());
                inner.push(id, Outbound::Close);
                Admission::Rejected
            }
            None => {
                let was_viewer = inner
                    .peers
                    .get(&id)
                    .is_some_and(|p| p.role == Role::Viewer);
                if let Some(peer) = inner.peers.get_mut(&id) {
                    peer.role = Role::Broadcaster;
                }
                inner.broadcaster = Some(id);
                inner.notify_audience(&ServerMessage::stream_status(true));
                if was_viewer {
                    inner.publish_viewer_count();
                }
                Admission::Accepted
            }
        }
    }

    /// Mark `id` as a viewer and reply with the current stream status.
    /// Returns whether a broadcaster is live.
    pub fn register_viewer(&self, id: ConnectionId) -> bool {
        let mut inner = self.inner.lock();
        let is_live = inner.broadcaster.is_some();

        let newly_viewer = match inner.peers.get_mut(&id) {
            Some(peer) if peer.role == Role::Unassigned => {
                peer.role = Role::Viewer;
                true
            }
            Some(_) => false,
            None => return is_live,
        };

        inner.send_message(id, &ServerMessage::stream_status(is_live));
        if newly_viewer {
            inner.publish_viewer_count();
        }
        is_live
    }

    /// Give up the broadcaster slot. Ignored unless `id` holds it.
    pub fn release_broadcaster(&self, id: ConnectionId) -> bool {
        let mut inner = self.inner.lock();
        if inner.broadcaster != Some(id) {
            return false;
        }
        if let Some(peer) = inner.peers.get_mut(&id) {
            peer.role = Role::Unassigned;
        }
        inner.clear_broadcaster();
        true
    }

    /// Relay `text` verbatim to the `target` side. Returns the number of
    /// connections it was queued for.
    pub fn forward(&self, from: ConnectionId, target: Target, text: &str) -> usize {
        let inner = self.inner.lock();
        match target {
            Target::Broadcaster => match inner.broadcaster {
                Some(broadcaster) if broadcaster != from => {
                    usize::from(inner.push(broadcaster, Outbound::Text(text.to_string())))
                }
                _ => 0,
            },
            Target::Viewers => {
                let mut delivered = 0;
                for (id, peer) in &inner.peers {
                    if *id == from || Some(*id) == inner.broadcaster {
                        continue;
                    }
                    if peer.tx.send(Outbound::Text(text.to_string())).is_ok() {
                        delivered += 1;
                    }
                }
                delivered
            }
        }
    }

    /// Remove a closed socket, releasing the broadcaster slot if it held it
    pub fn deregister(&self, id: ConnectionId) -> Option<Role> {
        let mut inner = self.inner.lock();
        let peer = inner.peers.remove(&id)?;

        if inner.broadcaster == Some(id) {
            inner.clear_broadcaster();
        } else if peer.role == Role::Viewer {
            inner.publish_viewer_count();
        }
        Some(peer.role)
    }

    pub fn is_live(&self) -> bool {
        self.inner.lock().broadcaster.is_some()
    }

    pub fn broadcaster(&self) -> Option<ConnectionId> {
        self.inner.lock().broadcaster
    }

    pub fn role_of(&self, id: ConnectionId) -> Option<Role> {
        self.inner.lock().peers.get(&id).map(|p| p.role)
    }

    pub fn connection_count(&self) -> usize {
        self.inner.lock().peers.len()
    }

    pub fn viewer_count(&self) -> usize {
        self.inner.lock().viewer_count()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn drain(rx: &mut mpsc::UnboundedReceiver<Outbound>) -> Vec<Outbound> {
        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        frames
    }

    fn texts(frames: &[Outbound]) -> Vec<Value> {
        frames
            .iter()
            .filter_map(|f| match f {
                Outbound::Text(t) => serde_json::from_str(t).ok(),
                Outbound::Close => None,
            })
            .collect()
    }

    #[test]
    fn test_viewer_before_broadcaster_is_offline() {
        let registry = ConnectionRegistry::new();
        let (viewer, mut rx) = registry.register();

        assert!(!registry.register_viewer(viewer));

        let frames = texts(&drain(&mut rx));
        assert_eq!(frames[0], json!({"type": "streamStatus", "isLive": false}));
        assert_eq!(frames[1], json!({"type": "viewerCount", "count": 1}));
    }

    #[test]
    fn test_broadcaster_announces_live_to_others() {
        let registry = ConnectionRegistry::new();
        let (viewer, mut viewer_rx) = registry.register();
        let (broadcaster, mut broadcaster_rx) = registry.register();
        registry.register_viewer(viewer);
        drain(&mut viewer_rx);

        assert_eq!(registry.register_broadcaster(broadcaster), Admission::Accepted);
        assert!(registry.is_live());
        assert_eq!(registry.broadcaster(), Some(broadcaster));

        let frames = texts(&drain(&mut viewer_rx));
        assert_eq!(frames, vec![json!({"type": "streamStatus", "isLive": true})]);
        // The broadcaster is not told about its own stream
        assert!(drain(&mut broadcaster_rx).is_empty());
    }

    #[test]
    fn test_second_broadcaster_rejected_and_closed() {
        let registry = ConnectionRegistry::new();
        let (first, mut first_rx) = registry.register();
        let (second, mut second_rx) = registry.register();

        assert_eq!(registry.register_broadcaster(first), Admission::Accepted);
        drain(&mut first_rx);
        drain(&mut second_rx);

        assert_eq!(registry.register_broadcaster(second), Admission::Rejected);
        assert_eq!(registry.broadcaster(), Some(first));

        let frames = drain(&mut second_rx);
        assert_eq!(
            texts(&frames),
            vec![json!({"type": "error", "message": "Broadcaster already exists"})]
        );
        assert_eq!(frames.last(), Some(&Outbound::Close));
        assert!(drain(&mut first_rx).is_empty());
    }

    #[test]
    fn test_repeat_claim_is_idempotent() {
        let registry = ConnectionRegistry::new();
        let (id, _rx) = registry.register();
        assert_eq!(registry.register_broadcaster(id), Admission::Accepted);
        assert_eq!(registry.register_broadcaster(id), Admission::AlreadyBroadcasting);
    }

    #[test]
    fn test_unknown_connection_cannot_claim() {
        let registry = ConnectionRegistry::new();
        assert_eq!(registry.register_broadcaster(99), Admission::Rejected);
        assert!(!registry.is_live());
    }

    #[test]
    fn test_forward_to_broadcaster() {
        let registry = ConnectionRegistry::new();
        let (broadcaster, mut broadcaster_rx) = registry.register();
        let (viewer, _viewer_rx) = registry.register();
        registry.register_broadcaster(broadcaster);

        let raw = r#"{"type":"answer","answer":{"sdp":"v=0"},"target":"broadcaster"}"#;
        assert_eq!(registry.forward(viewer, Target::Broadcaster, raw), 1);
        assert_eq!(drain(&mut broadcaster_rx), vec![Outbound::Text(raw.to_string())]);
    }

    #[test]
    fn test_forward_to_broadcaster_without_one() {
        let registry = ConnectionRegistry::new();
        let (viewer, _rx) = registry.register();
        assert_eq!(registry.forward(viewer, Target::Broadcaster, "{}"), 0);
    }

    #[test]
    fn test_forward_to_viewers_skips_sender_and_broadcaster() {
        let registry = ConnectionRegistry::new();
        let (broadcaster, mut broadcaster_rx) = registry.register();
        let (a, mut a_rx) = registry.register();
        let (_b, mut b_rx) = registry.register();
        registry.register_broadcaster(broadcaster);
        drain(&mut a_rx);
        drain(&mut b_rx);

        let raw = r#"{"type":"offer","offer":{"sdp":"v=0"},"target":"viewer"}"#;
        assert_eq!(registry.forward(broadcaster, Target::Viewers, raw), 2);
        assert_eq!(drain(&mut a_rx), vec![Outbound::Text(raw.to_string())]);
        assert_eq!(drain(&mut b_rx), vec![Outbound::Text(raw.to_string())]);
        assert!(drain(&mut broadcaster_rx).is_empty());

        // A viewer-side candidate reaches the other viewers only
        assert_eq!(registry.forward(a, Target::Viewers, raw), 1);
        assert!(drain(&mut a_rx).is_empty());
        assert_eq!(drain(&mut b_rx).len(), 1);
    }

    #[test]
    fn test_release_by_non_broadcaster_ignored() {
        let registry = ConnectionRegistry::new();
        let (broadcaster, _b_rx) = registry.register();
        let (other, _o_rx) = registry.register();
        registry.register_broadcaster(broadcaster);

        assert!(!registry.release_broadcaster(other));
        assert!(registry.is_live());
    }

    #[test]
    fn test_release_notifies_offline() {
        let registry = ConnectionRegistry::new();
        let (broadcaster, _b_rx) = registry.register();
        let (viewer, mut viewer_rx) = registry.register();
        registry.register_broadcaster(broadcaster);
        registry.register_viewer(viewer);
        drain(&mut viewer_rx);

        assert!(registry.release_broadcaster(broadcaster));
        assert!(!registry.is_live());
        assert_eq!(registry.role_of(broadcaster), Some(Role::Unassigned));

        let frames = texts(&drain(&mut viewer_rx));
        assert_eq!(frames[0], json!({"type": "streamStatus", "isLive": false}));

        // The slot is free again
        let (next, _n_rx) = registry.register();
        assert_eq!(registry.register_broadcaster(next), Admission::Accepted);
    }

    #[test]
    fn test_deregister_broadcaster_frees_slot() {
        let registry = ConnectionRegistry::new();
        let (broadcaster, _b_rx) = registry.register();
        let (_viewer, mut viewer_rx) = registry.register();
        registry.register_broadcaster(broadcaster);
        drain(&mut viewer_rx);

        assert_eq!(registry.deregister(broadcaster), Some(Role::Broadcaster));
        assert!(!registry.is_live());
        assert_eq!(registry.connection_count(), 1);

        let frames = texts(&drain(&mut viewer_rx));
        assert_eq!(frames[0], json!({"type": "streamStatus", "isLive": false}));
    }

    #[test]
    fn test_viewer_count_tracks_joins_and_leaves() {
        let registry = ConnectionRegistry::new();
        let (broadcaster, mut broadcaster_rx) = registry.register();
        let (a, _a_rx) = registry.register();
        let (b, _b_rx) = registry.register();
        registry.register_broadcaster(broadcaster);

        registry.register_viewer(a);
        registry.register_viewer(b);
        // Announcing twice does not double count
        registry.register_viewer(b);
        assert_eq!(registry.viewer_count(), 2);

        registry.deregister(a);
        assert_eq!(registry.viewer_count(), 1);

        let counts: Vec<Value> = texts(&drain(&mut broadcaster_rx))
            .into_iter()
            .filter(|v| v["type"] == "viewerCount")
            .map(|v| v["count"].clone())
            .collect();
        assert_eq!(counts, vec![json!(1), json!(2), json!(1)]);
    }

    #[test]
    fn test_deregister_unknown_is_noop() {
        let registry = ConnectionRegistry::new();
        assert_eq!(registry.deregister(42), None);
    }

    #[test]
    fn test_concurrent_claims_admit_exactly_one() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(ConnectionRegistry::new());
        let ids: Vec<_> = (0..16).map(|_| registry.register()).collect();

        let handles: Vec<_> = ids
            .iter()
            .map(|(id, _)| {
                let registry = Arc::clone(&registry);
                let id = *id;
                thread::spawn(move || registry.register_broadcaster(id))
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|a| *a == Admission::Accepted)
            .count();
        assert_eq!(accepted, 1);
    }
}
