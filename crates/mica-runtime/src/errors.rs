//! Runtime errors.

use thiserror::Error;

/// Errors surfaced by the runtime to its caller.
///
/// Most failures inside a turn degrade silently or become textual tool
/// results; only transport-level and persistence failures cross this
/// boundary.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The model provider failed at the transport or API level.
    #[error(transparent)]
    Provider(#[from] mica_llm::ProviderError),

    /// Memory subsystem failure during setup.
    #[error(transparent)]
    Memory(#[from] mica_memory::MemoryError),

    /// Session or workspace file I/O failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Session state could not be serialized or parsed.
    #[error("session serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
