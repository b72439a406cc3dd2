//! Per-session chat handles shared across requests.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

use crate::config::ChatConfig;
use crate::metrics::CHAT_SESSIONS_ACTIVE;
use crate::services::gemini::{ChatHandle, GatewayError};

struct Entry {
    handle: ChatHandle,
    last_used: Instant,
}

/// Maps learning-session ids to their chat handle.
///
/// Creation runs under the registry lock, so concurrent first requests for a
/// session end up with one handle. Idle entries expire after `idle_ttl` and
/// the least recently used entry makes room once `max_entries` is reached.
#[derive(Clone)]
pub struct ChatSessionRegistry {
    entries: Arc<Mutex<HashMap<String, Entry>>>,
    idle_ttl: Duration,
    max_entries: usize,
}

impl ChatSessionRegistry {
    pub fn new(config: &ChatConfig) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            idle_ttl: config.idle_ttl,
            max_entries: config.max_entries.max(1),
        }
    }

    /// Returns the cached handle for `session_id` or stores the one `create` builds.
    pub async fn get_or_create<F, Fut>(
        &self,
        session_id: &str,
        create: F,
    ) -> Result<ChatHandle, GatewayError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ChatHandle, GatewayError>>,
    {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        self.purge_idle(&mut entries, now);

        if let Some(entry) = entries.get_mut(session_id) {
            entry.last_used = now;
            return Ok(entry.handle.clone());
        }

        let handle = create().await?;

        if entries.len() >= self.max_entries {
            evict_least_recent(&mut entries);
        }
        entries.insert(
            session_id.to_string(),
            Entry {
                handle: handle.clone(),
                last_used: Instant::now(),
            },
        );
        CHAT_SESSIONS_ACTIVE.set(entries.len() as i64);
        tracing::debug!("Created chat handle {} for session {}", handle.id(), session_id);

        Ok(handle)
    }

    pub async fn get(&self, session_id: &str) -> Option<ChatHandle> {
        let mut entries = self.entries.lock().await;
        self.purge_idle(&mut entries, Instant::now());
        entries.get_mut(session_id).map(|entry| {
            entry.last_used = Instant::now();
            entry.handle.clone()
        })
    }

    pub async fn remove(&self, session_id: &str) -> bool {
        let mut entries = self.entries.lock().await;
        let removed = entries.remove(session_id).is_some();
        CHAT_SESSIONS_ACTIVE.set(entries.len() as i64);
        removed
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn purge_idle(&self, entries: &mut HashMap<String, Entry>, now: Instant) {
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.last_used) < self.idle_ttl);
        if entries.len() != before {
            tracing::debug!("Expired {} idle chat handles", before - entries.len());
            CHAT_SESSIONS_ACTIVE.set(entries.len() as i64);
        }
    }
}

fn evict_least_recent(entries: &mut HashMap<String, Entry>) {
    let oldest = entries
        .iter()
        .min_by_key(|(_, entry)| entry.last_used)
        .map(|(id, _)| id.clone());
    if let Some(id) = oldest {
        entries.remove(&id);
        tracing::debug!("Evicted chat handle for session {}", id);
    }
}
