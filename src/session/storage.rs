//! Durable snapshot backends.
//!
//! One value per session id: the full transcript, JSON-encoded. Read once at
//! store initialization, rewritten after every successful append.

use super::identity::SessionId;
use super::types::TranscriptEntry;
use crate::config::{Config, SnapshotBackend};
use async_trait::async_trait;
use chrono::Local;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the persisted transcript for a session, if one exists.
    async fn load(&self, id: &SessionId) -> anyhow::Result<Option<Vec<TranscriptEntry>>>;

    /// Replace the persisted transcript for a session.
    async fn persist(&self, id: &SessionId, transcript: &[TranscriptEntry]) -> anyhow::Result<()>;
}

/// Build the snapshot backend selected in `[session] backend`.
pub async fn create_snapshot_store(config: &Config) -> anyhow::Result<Arc<dyn SnapshotStore>> {
    match config.session.backend {
        SnapshotBackend::Sqlite => {
            let workspace = config.session.workspace_dir()?;
            Ok(Arc::new(SqliteSnapshots::open(&workspace).await?))
        }
        SnapshotBackend::Memory => Ok(Arc::new(MemorySnapshots::new())),
    }
}

// ─── SQLite backend ─────────────────────────────────────────────────────────

pub struct SqliteSnapshots {
    pool: SqlitePool,
}

impl SqliteSnapshots {
    pub async fn open(workspace_dir: &Path) -> anyhow::Result<Self> {
        let db_path = workspace_dir.join("sessions").join("snapshots.db");
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let options = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS snapshots (
                session_id TEXT PRIMARY KEY,
                transcript TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )",
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshots {
    async fn load(&self, id: &SessionId) -> anyhow::Result<Option<Vec<TranscriptEntry>>> {
        let row = sqlx::query("SELECT transcript FROM snapshots WHERE session_id = ?1")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let raw: String = row.get("transcript");
                let entries = serde_json::from_str(&raw)?;
                Ok(Some(entries))
            }
            None => Ok(None),
        }
    }

    async fn persist(&self, id: &SessionId, transcript: &[TranscriptEntry]) -> anyhow::Result<()> {
        let encoded = serde_json::to_string(transcript)?;
        sqlx::query(
            "INSERT INTO snapshots (session_id, transcript, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(session_id) DO UPDATE
             SET transcript = excluded.transcript, updated_at = excluded.updated_at",
        )
        .bind(id.as_str())
        .bind(encoded)
        .bind(Local::now().to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

// ─── In-memory backend ──────────────────────────────────────────────────────

/// Process-local backend for tests and throwaway runs. Lost on exit.
#[derive(Default)]
pub struct MemorySnapshots {
    entries: Mutex<HashMap<String, Vec<TranscriptEntry>>>,
}

impl MemorySnapshots {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for MemorySnapshots {
    async fn load(&self, id: &SessionId) -> anyhow::Result<Option<Vec<TranscriptEntry>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("snapshot map poisoned"))?;
        Ok(entries.get(id.as_str()).cloned())
    }

    async fn persist(&self, id: &SessionId, transcript: &[TranscriptEntry]) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("snapshot map poisoned"))?;
        entries.insert(id.as_str().to_owned(), transcript.to_vec());
        Ok(())
    }
}
