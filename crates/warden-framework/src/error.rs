//! Error types for the Warden framework.

use thiserror::Error;
use warden_core::StoreError;

/// Errors raised by [`InvocationContext`](crate::InvocationContext) helpers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The invocation did not come from a community.
    #[error("command was not invoked inside a community")]
    NotInCommunity,

    /// The configuration store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors raised while registering commands.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A command or alias with this name is already registered.
    #[error("command name '{0}' is already registered")]
    Duplicate(String),

    /// Command names must be non-empty and free of whitespace.
    #[error("invalid command name '{0}'")]
    InvalidName(String),
}

/// Result type for context helpers.
pub type ContextResult<T> = Result<T, ContextError>;
