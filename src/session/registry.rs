//! Process-wide registry of session stores: one instance per identity,
//! created lazily, never explicitly freed.

use super::identity::SessionId;
use super::storage::SnapshotStore;
use super::store::SessionStore;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct SessionRegistry {
    max_history: usize,
    snapshots: Arc<dyn SnapshotStore>,
    sessions: Mutex<HashMap<SessionId, Arc<SessionStore>>>,
}

impl SessionRegistry {
    pub fn new(max_history: usize, snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self {
            max_history,
            snapshots,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve a logical name to its one store instance, creating it (and
    /// starting its snapshot restore) on first use.
    pub async fn resolve(&self, name: &str) -> Arc<SessionStore> {
        let id = SessionId::from_name(name);
        let mut sessions = self.sessions.lock().await;
        match sessions.entry(id) {
            Entry::Occupied(entry) => Arc::clone(entry.get()),
            Entry::Vacant(entry) => {
                tracing::debug!(session = %entry.key(), "creating session store");
                let store = SessionStore::open(
                    entry.key().clone(),
                    self.max_history,
                    Arc::clone(&self.snapshots),
                );
                entry.insert(Arc::clone(&store));
                store
            }
        }
    }

    /// Number of live session instances.
    pub async fn active(&self) -> usize {
        self.sessions.lock().await.len()
    }
}
