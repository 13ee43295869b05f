//! Unified error types for the Warden core.
//!
//! These are the failure domains of the two external collaborators the core
//! talks to: the configuration store and the chat platform. Framework-level
//! errors (like `ContextError`) are defined in warden-framework.

use thiserror::Error;

// =============================================================================
// Store Errors
// =============================================================================

/// Errors returned by a [`ConfigStore`](crate::ConfigStore).
///
/// Each variant is a distinct, named condition so that callers on the hot
/// path (prefix resolution) can match them exhaustively and degrade instead
/// of propagating.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The requested community has no configuration record yet.
    #[error("configuration record not found")]
    NotFound,

    /// The store has not been initialized (or is misconfigured).
    #[error("configuration store is not ready")]
    NotReady,

    /// The store could not be reached.
    #[error("configuration store unavailable: {0}")]
    StoreUnavailable(String),

    /// The lookup did not complete in time.
    #[error("configuration lookup timed out")]
    Timeout,

    /// The lookup key could not be resolved by the store.
    #[error("invalid lookup key: {0}")]
    InvalidKey(String),
}

impl StoreError {
    /// Creates an unavailable error with the given reason.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::StoreUnavailable(reason.into())
    }
}

// =============================================================================
// Platform Errors
// =============================================================================

/// Errors returned by a [`ChatPlatform`](crate::ChatPlatform).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The platform dropped the connection abruptly.
    ///
    /// This is the known transient condition; the error pipeline reports it
    /// tersely instead of as a bug.
    #[error("disconnected from server")]
    Disconnected,

    /// The gateway connection was closed cleanly (usually right before a
    /// reconnect).
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason given by the platform.
        reason: String,
    },

    /// The referenced message no longer exists.
    #[error("referenced message no longer exists")]
    MessageMissing,

    /// The bot lacks permission for the operation.
    #[error("missing permissions: {0}")]
    Forbidden(String),

    /// The platform rejected the request.
    #[error("platform error ({status}): {message}")]
    Http {
        /// HTTP-like status code.
        status: u16,
        /// Error message.
        message: String,
    },

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl PlatformError {
    /// Returns `true` for connection-level conditions that are expected to
    /// resolve on their own through a reconnect.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Disconnected)
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for platform operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_disconnect_is_transient() {
        assert!(PlatformError::Disconnected.is_transient());
        assert!(
            !PlatformError::ConnectionClosed {
                reason: "resume".into()
            }
            .is_transient()
        );
        assert!(!PlatformError::Other("boom".into()).is_transient());
    }

    #[test]
    fn store_error_messages() {
        assert_eq!(
            StoreError::unavailable("pool closed").to_string(),
            "configuration store unavailable: pool closed"
        );
        assert_eq!(StoreError::Timeout.to_string(), "configuration lookup timed out");
    }
}
