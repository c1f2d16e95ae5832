//! Connection Registry: the transient identity -> live channel map.
//!
//! At most one live channel per identity; registering again replaces the
//! previous entry (last registration wins).  Sends are best-effort: an
//! absent identity is a silent no-op, and offline identities rely on the
//! message log for later retrieval.  Nothing here is persisted -- the map's
//! lifetime is bounded by the connections themselves.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::debug;

use courier_shared::protocol::ServerEvent;

/// Token identifying one registration.
///
/// A channel that was replaced holds a stale token, so its unregister on
/// teardown cannot evict the newer channel for the same identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationId(u64);

struct Entry {
    id: RegistrationId,
    tx: mpsc::UnboundedSender<ServerEvent>,
}

#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<Mutex<HashMap<String, Entry>>>,
    next_id: Arc<AtomicU64>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live channel, replacing any previous one for `identity`.
    pub async fn register(
        &self,
        identity: &str,
        tx: mpsc::UnboundedSender<ServerEvent>,
    ) -> RegistrationId {
        let id = RegistrationId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let mut map = self.inner.lock().await;
        if map.insert(identity.to_string(), Entry { id, tx }).is_some() {
            debug!(identity, "replaced existing relay channel");
        }
        id
    }

    /// Remove the entry only if it is still the one `id` registered.
    pub async fn unregister(&self, identity: &str, id: RegistrationId) {
        let mut map = self.inner.lock().await;
        if map.get(identity).is_some_and(|entry| entry.id == id) {
            map.remove(identity);
        }
    }

    /// Whether `identity` currently has a live channel.
    pub async fn is_registered(&self, identity: &str) -> bool {
        self.inner.lock().await.contains_key(identity)
    }

    /// Best-effort delivery to the identity's live channel, if any.
    pub async fn send(&self, identity: &str, event: ServerEvent) {
        let map = self.inner.lock().await;
        if let Some(entry) = map.get(identity) {
            // A closed receiver means the channel is mid-teardown; that is
            // indistinguishable from offline and dropped the same way.
            let _ = entry.tx.send(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_shared::protocol::MessageKind;

    fn event(msg: &str) -> ServerEvent {
        ServerEvent::ack("alice".into(), "bob".into(), msg.into(), MessageKind::Text)
    }

    #[tokio::test]
    async fn send_reaches_registered_channel() {
        let registry = ConnectionRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        registry.register("bob", tx).await;
        registry.send("bob", event("hi")).await;

        assert_eq!(rx.recv().await.unwrap().message, "hi");
    }

    #[tokio::test]
    async fn send_to_absent_identity_is_a_no_op() {
        let registry = ConnectionRegistry::new();
        registry.send("nobody", event("lost")).await;
        assert!(!registry.is_registered("nobody").await);
    }

    #[tokio::test]
    async fn re_registration_routes_to_the_newest_channel() {
        let registry = ConnectionRegistry::new();
        let (old_tx, mut old_rx) = mpsc::unbounded_channel();
        let (new_tx, mut new_rx) = mpsc::unbounded_channel();

        registry.register("bob", old_tx).await;
        registry.register("bob", new_tx).await;

        registry.send("bob", event("fresh")).await;

        assert_eq!(new_rx.recv().await.unwrap().message, "fresh");
        assert!(old_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stale_unregister_does_not_evict_newer_channel() {
        let registry = ConnectionRegistry::new();
        let (old_tx, _old_rx) = mpsc::unbounded_channel();
        let (new_tx, mut new_rx) = mpsc::unbounded_channel();

        let stale = registry.register("bob", old_tx).await;
        registry.register("bob", new_tx).await;

        // The replaced connection tears down and unregisters with its
        // stale token; the newer channel must survive.
        registry.unregister("bob", stale).await;
        assert!(registry.is_registered("bob").await);

        registry.send("bob", event("still here")).await;
        assert_eq!(new_rx.recv().await.unwrap().message, "still here");
    }

    #[tokio::test]
    async fn matching_unregister_removes_the_entry() {
        let registry = ConnectionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = registry.register("bob", tx).await;
        registry.unregister("bob", id).await;

        assert!(!registry.is_registered("bob").await);
    }
}
