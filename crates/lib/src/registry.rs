//! Session registry: live WebSocket connections keyed by session id.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::RwLock;

/// Outbound leg of one WebSocket connection; carries serialized frames.
pub type SessionChannel = UnboundedSender<String>;

/// Registry of session ids to connection channels. Shared across the gateway.
/// At most one live channel per id: a second register displaces the first.
pub struct SessionRegistry {
    inner: Arc<RwLock<HashMap<String, SessionChannel>>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store `channel` under `id`, displacing any prior entry. The displaced
    /// channel is not closed here; sends now reach the replacement only, and
    /// the displaced connection lives until its own socket closes.
    pub async fn register(&self, id: String, channel: SessionChannel) {
        self.inner.write().await.insert(id, channel);
    }

    /// Remove the entry for `id`. No-op when absent.
    pub async fn unregister(&self, id: &str) {
        self.inner.write().await.remove(id);
    }

    /// Remove the entry for `id` only if it still holds `channel`, so a
    /// displaced connection cannot evict its replacement on teardown.
    pub async fn unregister_channel(&self, id: &str, channel: &SessionChannel) {
        let mut g = self.inner.write().await;
        if g.get(id).map_or(false, |c| c.same_channel(channel)) {
            g.remove(id);
        }
    }

    /// Write `text` to the session's channel. Silently drops the message when
    /// the id is unknown or the channel has closed; nothing is queued.
    pub async fn send_to_session(&self, id: &str, text: String) {
        let g = self.inner.read().await;
        if let Some(channel) = g.get(id) {
            let _ = channel.send(text);
        }
    }
}
