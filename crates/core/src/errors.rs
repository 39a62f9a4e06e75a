use thiserror::Error;

/// Unified error type for the entire card-tracker-core library.
/// Every public function returns `Result<T, CoreError>`.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input validation ────────────────────────────────────────────
    #[error("Validation failed: {0}")]
    ValidationError(String),

    // ── Storage gateway ─────────────────────────────────────────────
    #[error("Storage error ({gateway}): {message}")]
    Storage {
        gateway: String,
        message: String,
    },

    #[error("Record not found: {collection}/{id}")]
    NotFound {
        collection: String,
        id: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    // ── Encoding ────────────────────────────────────────────────────
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    // ── Configuration ───────────────────────────────────────────────
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl CoreError {
    /// `true` for failures raised at the storage gateway boundary
    /// (transport, permission, missing record). These are reported to the
    /// user and may be retried; the ledger snapshot is left untouched.
    #[must_use]
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            CoreError::Storage { .. } | CoreError::NotFound { .. } | CoreError::Network(_)
        )
    }
}

// ── Conversion helpers (From impls) ─────────────────────────────────

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Config(format!("I/O failure: {e}"))
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        CoreError::Deserialization(e.to_string())
    }
}

impl From<reqwest::Error> for CoreError {
    fn from(e: reqwest::Error) -> Self {
        // Firestore takes the API key as `?key=`, strip queries from URLs.
        let msg = e.to_string();
        let sanitized = if let Some(idx) = msg.find('?') {
            format!("{}?<query redacted>", &msg[..idx])
        } else {
            msg
        };
        CoreError::Network(sanitized)
    }
}
