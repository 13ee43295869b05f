//! Configuration schema definitions.

use std::collections::HashMap;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use warden_core::{Activity, Colour, CommunityId, DEFAULT_PREFIX};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct WardenConfig {
    /// Bot behaviour.
    #[serde(default)]
    pub bot: BotConfig,

    /// Configuration store connection.
    #[serde(default)]
    pub store: StoreConfig,

    /// Extension discovery.
    #[serde(default)]
    pub extensions: ExtensionsConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Keep-alive page.
    #[serde(default)]
    pub keep_alive: KeepAliveConfig,
}

// =============================================================================
// Bot
// =============================================================================

/// Bot behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Prefix used when a message's community is not resolvable yet.
    #[serde(default = "default_prefix")]
    pub default_prefix: String,

    /// Staging community where only allow-listed commands run.
    #[serde(default)]
    pub restricted_community: Option<CommunityId>,

    /// Commands available to everyone in the restricted community.
    #[serde(default = "default_allow_list")]
    pub restricted_allow_list: Vec<String>,

    /// Upper bound for a prefix lookup against the store, in milliseconds.
    #[serde(default = "default_lookup_timeout_ms")]
    pub prefix_lookup_timeout_ms: u64,

    /// Theme colour used by commands.
    #[serde(default = "default_color")]
    pub color: u32,

    /// Presence text, shown as "watching ...".
    #[serde(default = "default_activity")]
    pub activity: String,

    /// Platform token, handed to the platform client.
    #[serde(default)]
    pub token: Option<String>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            default_prefix: default_prefix(),
            restricted_community: None,
            restricted_allow_list: default_allow_list(),
            prefix_lookup_timeout_ms: default_lookup_timeout_ms(),
            color: default_color(),
            activity: default_activity(),
            token: None,
        }
    }
}

impl BotConfig {
    /// Prefix lookup timeout as a [`Duration`].
    pub fn prefix_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.prefix_lookup_timeout_ms)
    }

    /// Theme colour.
    pub fn colour(&self) -> Colour {
        Colour(self.color)
    }

    /// Presence activity.
    pub fn presence(&self) -> Activity {
        Activity::watching(&self.activity)
    }
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_allow_list() -> Vec<String> {
    vec!["help".to_string(), "ping".to_string()]
}

fn default_lookup_timeout_ms() -> u64 {
    5000
}

fn default_color() -> u32 {
    Colour::THEME.0
}

fn default_activity() -> String {
    "over some Realms".to_string()
}

// =============================================================================
// Store
// =============================================================================

/// Configuration store connection settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Connection URL, handed to the store implementation.
    #[serde(default)]
    pub url: Option<String>,
}

// =============================================================================
// Extensions
// =============================================================================

/// Extension discovery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionsConfig {
    /// Directory containing the extension folder. Defaults to the working
    /// directory.
    #[serde(default)]
    pub base_dir: Option<PathBuf>,

    /// Folder walked for extension files.
    #[serde(default = "default_folder")]
    pub folder: String,

    /// Extension of extension files, without the dot.
    #[serde(default = "default_file_extension")]
    pub file_extension: String,

    /// Extension ids that are never loaded.
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,

    /// Extension ids loaded first, in order.
    #[serde(default = "default_preloaded")]
    pub preloaded: Vec<String>,
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            base_dir: None,
            folder: default_folder(),
            file_extension: default_file_extension(),
            denylist: default_denylist(),
            preloaded: default_preloaded(),
        }
    }
}

impl ExtensionsConfig {
    /// Returns the base directory, falling back to the working directory.
    pub fn resolved_base_dir(&self) -> PathBuf {
        self.base_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn default_folder() -> String {
    "cogs".to_string()
}

fn default_file_extension() -> String {
    "rs".to_string()
}

fn default_denylist() -> Vec<String> {
    vec!["cogs.db_handler".to_string()]
}

fn default_preloaded() -> Vec<String> {
    vec!["cogs.owner_cmds".to_string()]
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature.
    Json,
}

/// Where log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    /// Appends to [`LoggingConfig::file_path`].
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file, used with [`LogOutput::File`].
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Per-module levels, e.g. `warden_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include file names and line numbers.
    #[serde(default)]
    pub file_location: bool,
}

// =============================================================================
// Keep-alive
// =============================================================================

/// Keep-alive page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeepAliveConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_port(),
        }
    }
}

impl KeepAliveConfig {
    /// The `host:port` string to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parses the bind address, if it is a literal socket address.
    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.bind_addr().parse().ok()
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WardenConfig::default();
        assert_eq!(config.bot.default_prefix, "!?");
        assert_eq!(config.bot.restricted_allow_list, vec!["help", "ping"]);
        assert_eq!(config.bot.prefix_lookup_timeout(), Duration::from_secs(5));
        assert_eq!(config.bot.colour(), Colour::THEME);
        assert_eq!(config.extensions.denylist, vec!["cogs.db_handler"]);
        assert!(!config.keep_alive.enabled);
        assert_eq!(config.keep_alive.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: WardenConfig = serde_json::from_value(serde_json::json!({
            "bot": { "restricted_community": 775912554928144384u64 },
            "logging": { "level": "debug", "filters": { "warden_framework": "trace" } }
        }))
        .unwrap();

        assert_eq!(
            config.bot.restricted_community,
            Some(CommunityId(775912554928144384))
        );
        assert_eq!(config.bot.activity, "over some Realms");
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(
            config.logging.filters.get("warden_framework"),
            Some(&LogLevel::Trace)
        );
    }
}
