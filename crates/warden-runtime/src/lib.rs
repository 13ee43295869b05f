//! Warden Runtime - startup and orchestration for the Warden bot.
//!
//! This crate provides:
//! - Configuration loading and validation (`config`)
//! - Logging setup (`logging`)
//! - Extension discovery and loading (`extensions`)
//! - The optional keep-alive HTTP page (`keep_alive`)
//! - The startup lifecycle and event loop (`WardenRuntime`)
//!
//! ```ignore
//! use warden_runtime::WardenRuntime;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (platform, events) = my_platform::connect().await?;
//!     let store = my_store::connect().await?;
//!
//!     let runtime = WardenRuntime::builder().build(platform, store)?;
//!     runtime.run(events).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod extensions;
pub mod keep_alive;
pub mod logging;
pub mod runtime;

pub use config::{ConfigError, ConfigLoader, ConfigResult, WardenConfig};
pub use error::{ExtensionError, RuntimeError, RuntimeResult};
pub use extensions::{Extension, ExtensionSet, discover_extensions};
pub use keep_alive::{KeepAliveHandle, spawn_keep_alive};
pub use logging::{LoggingBuilder, SpanEvents};
pub use runtime::{RECONNECTING_NOTICE, RuntimeBuilder, WardenRuntime};

// Re-export tracing for use by extension crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for extension code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
