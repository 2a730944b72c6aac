use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for Complia.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum CompliaError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Session ─────────────────────────────────────────────────────────
    #[error("session: {0}")]
    Session(#[from] SessionError),

    // ── Moderation ──────────────────────────────────────────────────────
    #[error("moderation: {0}")]
    Moderation(#[from] ModerationError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Session errors ─────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SessionError {
    /// Snapshot restore failed. Fatal to the store instance: every
    /// transcript operation keeps returning this until it is recreated.
    #[error("snapshot restore failed: {0}")]
    Init(String),

    /// Durable write failed after an append. The in-memory transcript
    /// already reflects the append; the turn may not survive a restart.
    #[error("snapshot persist failed: {0}")]
    Store(String),
}

// ─── Moderation errors ──────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("moderation endpoint request failed: {0}")]
    Http(String),

    #[error("moderation endpoint returned {status}: {message}")]
    Api { status: u16, message: String },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, CompliaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_displays_correctly() {
        let err = CompliaError::Config(ConfigError::Parse("bad port".into()));
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn session_init_is_distinct_from_store() {
        let init = SessionError::Init("db locked".into());
        let store = SessionError::Store("disk full".into());
        assert!(init.to_string().contains("restore"));
        assert!(store.to_string().contains("persist"));
    }

    #[test]
    fn moderation_api_displays_status() {
        let err = CompliaError::Moderation(ModerationError::Api {
            status: 503,
            message: "overloaded".into(),
        });
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("overloaded"));
    }

    #[test]
    fn anyhow_interop() {
        let anyhow_err = anyhow::anyhow!("something went wrong");
        let complia_err: CompliaError = anyhow_err.into();
        assert!(complia_err.to_string().contains("something went wrong"));
    }
}
