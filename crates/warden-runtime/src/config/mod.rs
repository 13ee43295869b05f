//! Configuration module for the Warden runtime.
//!
//! TOML files, `WARDEN_*` environment variables and programmatic overrides
//! are merged with figment, then checked by [`validate_config`].

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    BotConfig, ExtensionsConfig, KeepAliveConfig, LogFormat, LogLevel, LogOutput, LoggingConfig,
    SpanEventConfig, StoreConfig, WardenConfig,
};
pub use validation::validate_config;
