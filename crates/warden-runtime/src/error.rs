//! Runtime error types.

use thiserror::Error;

use warden_core::PlatformError;

use crate::config::ConfigError;

/// Errors raised while loading an extension.
#[derive(Error, Debug)]
pub enum ExtensionError {
    /// The extension exists on disk but exposes no setup entry point.
    #[error("Extension {0} has no setup entry point")]
    NoEntryPoint(String),

    /// The extension's setup failed.
    #[error("Failed to load extension {id}: {reason}")]
    LoadFailed { id: String, reason: String },

    /// The discovery pattern built from the configuration is not a valid glob.
    #[error("Invalid extension pattern {pattern}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

impl ExtensionError {
    /// Creates a load failure for `id`.
    pub fn load_failed(id: impl Into<String>, reason: impl ToString) -> Self {
        Self::LoadFailed {
            id: id.into(),
            reason: reason.to_string(),
        }
    }
}

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// An extension failed to load.
    #[error("Extension error: {0}")]
    Extension(#[from] ExtensionError),

    /// The platform failed during startup.
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// The event source closed before the platform became ready.
    #[error("Event stream closed before the platform became ready")]
    EventStreamClosed,

    /// The keep-alive page could not bind its address.
    #[error("Failed to bind keep-alive page on {addr}: {source}")]
    KeepAlive {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The runtime was started twice.
    #[error("Runtime is already running")]
    AlreadyRunning,
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
