//! Provider error type.
//!
//! Transport failures are the only errors that cross the runtime's layer
//! boundary as raised errors; everything else degrades in place.

use thiserror::Error;

/// Errors raised by a chat provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Network-level failure (connect, timeout, TLS).
    #[error("transport error: {0}")]
    Transport(String),

    /// The provider API returned an error status.
    #[error("api error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Provider error message.
        message: String,
    },

    /// The response body could not be interpreted.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}
