//! The session store: one bounded transcript, one durable snapshot, one
//! instance per session identity.

use super::identity::SessionId;
use super::storage::SnapshotStore;
use super::types::TranscriptEntry;
use crate::error::SessionError;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard, OnceCell};

/// Holds one session's transcript in memory, keeps it consistent with its
/// durable snapshot, and serializes initialization against first use.
///
/// The snapshot restore starts when the instance is created and runs exactly
/// once. Every transcript-touching operation awaits it, so concurrent early
/// requests never observe a partially-restored transcript. A failed restore
/// latches: the instance stays unusable until recreated.
pub struct SessionStore {
    id: SessionId,
    max_history: usize,
    snapshots: Arc<dyn SnapshotStore>,
    init: OnceCell<Result<(), String>>,
    transcript: Mutex<VecDeque<TranscriptEntry>>,
    turn_lock: Mutex<()>,
}

impl SessionStore {
    /// Create the store and start its snapshot restore in the background.
    pub fn open(
        id: SessionId,
        max_history: usize,
        snapshots: Arc<dyn SnapshotStore>,
    ) -> Arc<Self> {
        let store = Arc::new(Self {
            id,
            max_history,
            snapshots,
            init: OnceCell::new(),
            transcript: Mutex::new(VecDeque::new()),
            turn_lock: Mutex::new(()),
        });

        let eager = Arc::clone(&store);
        tokio::spawn(async move {
            if let Err(error) = eager.ready().await {
                tracing::warn!(session = %eager.id, "eager restore failed: {error}");
            }
        });

        store
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Wait for the one-time snapshot restore.
    ///
    /// A missing snapshot is not an error — the transcript starts empty.
    pub async fn ready(&self) -> Result<(), SessionError> {
        self.init
            .get_or_init(|| self.restore())
            .await
            .clone()
            .map_err(SessionError::Init)
    }

    async fn restore(&self) -> Result<(), String> {
        match self.snapshots.load(&self.id).await {
            Ok(Some(entries)) => {
                let mut transcript = self.transcript.lock().await;
                *transcript = entries.into();
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(error) => Err(error.to_string()),
        }
    }

    /// Append entries in order, evict oldest-first down to `max_history`,
    /// then persist the surviving transcript.
    ///
    /// Entries arrive in same-turn pairs, so eviction never splits a
    /// user/assistant pair unevenly in normal operation. On a persist
    /// failure the in-memory append stands — the turn happened, it just may
    /// not survive a restart.
    pub async fn append(&self, entries: Vec<TranscriptEntry>) -> Result<(), SessionError> {
        self.ready().await?;

        let mut transcript = self.transcript.lock().await;
        transcript.extend(entries);
        while transcript.len() > self.max_history {
            transcript.pop_front();
        }

        let snapshot: Vec<TranscriptEntry> = transcript.iter().cloned().collect();
        self.snapshots
            .persist(&self.id, &snapshot)
            .await
            .map_err(|error| SessionError::Store(error.to_string()))
    }

    /// Read-only copy of the current transcript, post-initialization.
    pub async fn snapshot(&self) -> Result<Vec<TranscriptEntry>, SessionError> {
        self.ready().await?;
        let transcript = self.transcript.lock().await;
        Ok(transcript.iter().cloned().collect())
    }

    /// Per-session mutual exclusion for a whole moderation turn.
    pub async fn lock_turn(&self) -> MutexGuard<'_, ()> {
        self.turn_lock.lock().await
    }
}
