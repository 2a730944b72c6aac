//! One moderation round-trip per inbound chat message, folded into the
//! session store.

use super::client::ModerationClient;
use super::{prompt, reply};
use crate::error::{CompliaError, SessionError};
use crate::session::{SessionStore, TranscriptEntry};
use std::sync::Arc;

pub struct TurnOrchestrator {
    client: Arc<dyn ModerationClient>,
}

impl TurnOrchestrator {
    pub fn new(client: Arc<dyn ModerationClient>) -> Self {
        Self { client }
    }

    /// Run exactly one moderation round-trip and append both turn sides.
    ///
    /// Turns on one session are serialized by the store's turn lock, held
    /// across the whole round-trip. A classification call fault propagates
    /// without touching the transcript; an unrecognized response shape is a
    /// degraded-but-valid reply and is recorded like any other. A persist
    /// fault is logged and does not fail the turn.
    pub async fn process_turn(
        &self,
        store: &SessionStore,
        message: &str,
        rulebook: &str,
    ) -> Result<String, CompliaError> {
        let _turn = store.lock_turn().await;
        store.ready().await?;

        let instructions = [
            prompt::system_instruction(rulebook),
            prompt::user_instruction(message),
        ];
        tracing::debug!(session = %store.id(), "running moderation turn");
        let raw = self.client.classify(&instructions).await?;
        let verdict = reply::normalize_verdict(&raw);

        let turn = vec![
            TranscriptEntry::user(message),
            TranscriptEntry::assistant(verdict.clone()),
        ];
        match store.append(turn).await {
            Ok(()) => {}
            Err(SessionError::Store(error)) => {
                tracing::warn!(session = %store.id(), "turn persisted in memory only: {error}");
            }
            Err(error) => return Err(error.into()),
        }

        Ok(verdict)
    }
}
