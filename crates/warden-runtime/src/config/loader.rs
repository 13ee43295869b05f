//! Configuration loader using figment.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Built-in defaults
//! 2. Profile-specific config file (`warden.{profile}.toml`)
//! 3. Main config file (`warden.toml` / `config.toml`)
//! 4. Environment variables (`WARDEN_*`)
//! 5. Programmatic overrides
//!
//! The `CONFIG_LOCATION` environment variable names an explicit file and
//! skips the search.
//!
//! # Environment Variable Mapping
//!
//! Environment variables are mapped using the `WARDEN_` prefix with `__` as
//! separator:
//!
//! - `WARDEN_LOGGING__LEVEL=debug` → `logging.level = "debug"`
//! - `WARDEN_BOT__RESTRICTED_COMMUNITY=775912554928144384` → `bot.restricted_community`
//! - `WARDEN_STORE__URL=postgres://...` → `store.url`
//!
//! # Example
//!
//! ```rust,ignore
//! use warden_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .load()?;
//! ```

use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(feature = "toml-config")]
use figment::providers::{Format, Toml};
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::WardenConfig;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_LOCATION_ENV: &str = "CONFIG_LOCATION";

/// Environment variable selecting the profile.
pub const PROFILE_ENV: &str = "WARDEN_PROFILE";

const ENV_PREFIX: &str = "WARDEN_";
const BASE_NAMES: &[&str] = &["warden.toml", "config.toml"];

/// Configuration profile for environment-specific settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    /// Development profile (default).
    #[default]
    Development,
    /// Production profile.
    Production,
    /// Custom profile name.
    Custom(String),
}

impl Profile {
    /// Returns the profile name as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Parses a profile name.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Reads the profile from `WARDEN_PROFILE`, defaulting to development.
    pub fn from_env() -> Self {
        std::env::var(PROFILE_ENV)
            .map(|p| Self::parse(&p))
            .unwrap_or_default()
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration loader with figment-based multi-source support.
pub struct ConfigLoader {
    /// Programmatic overrides, merged last.
    overrides: Figment,
    profile: Profile,
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Specific config file to load (overrides search).
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader honouring `WARDEN_PROFILE` and `CONFIG_LOCATION`.
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: std::env::var_os(CONFIG_LOCATION_ENV).map(PathBuf::from),
        }
    }

    /// Sets the configuration profile.
    pub fn profile(mut self, profile: impl AsRef<str>) -> Self {
        self.profile = Profile::parse(profile.as_ref());
        self
    }

    /// Adds a search path for configuration files.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Sets a specific configuration file to load.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Enables loading environment variables (default: true).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Disables loading environment variables.
    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges a configuration programmatically, above every other source.
    pub fn merge(mut self, config: WardenConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Loads and returns the configuration.
    pub fn load(self) -> ConfigResult<WardenConfig> {
        let profile = self.profile.clone();
        let config: WardenConfig = self.build_figment()?.extract()?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    fn build_figment(mut self) -> ConfigResult<Figment> {
        let mut figment = Figment::from(Serialized::defaults(WardenConfig::default()));

        if let Some(path) = self.config_file.take() {
            if !path.exists() {
                return Err(ConfigError::FileNotFound(path));
            }
            info!(path = %path.display(), "Loading configuration file");
            figment = merge_config_file(figment, &path)?;
        } else {
            figment = self.load_config_files(figment);
        }

        if self.load_env {
            trace!("Loading environment variables with {ENV_PREFIX} prefix");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment.merge(self.overrides))
    }

    fn resolve_search_paths(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        let mut paths = Vec::new();
        if let Ok(cwd) = std::env::current_dir() {
            paths.push(cwd);
        }
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("warden"));
        }
        paths
    }

    /// Searches the paths for a profile file and a base file.
    ///
    /// Stops at the first directory holding a base file.
    fn load_config_files(&self, mut figment: Figment) -> Figment {
        for search_path in self.resolve_search_paths() {
            for base_name in BASE_NAMES {
                let Some((stem, ext)) = base_name.rsplit_once('.') else {
                    continue;
                };

                let profile_path =
                    search_path.join(format!("{stem}.{}.{ext}", self.profile.as_str()));
                if profile_path.exists() {
                    debug!(path = %profile_path.display(), "Loading profile-specific config");
                    figment = merge_or_skip(figment, &profile_path);
                }

                let base_path = search_path.join(base_name);
                if base_path.exists() {
                    info!(path = %base_path.display(), "Loading configuration file");
                    return merge_or_skip(figment, &base_path);
                }
            }
        }

        warn!("No configuration file found, using defaults");
        figment
    }
}

fn merge_or_skip(figment: Figment, path: &Path) -> Figment {
    match merge_config_file(figment.clone(), path) {
        Ok(merged) => merged,
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Skipping configuration file");
            figment
        }
    }
}

/// Merges a single config file, dispatching on its extension.
fn merge_config_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Loads the configuration from the default sources.
pub fn load_config() -> ConfigResult<WardenConfig> {
    ConfigLoader::new().load()
}

/// Loads the configuration from `path` plus the environment.
pub fn load_config_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<WardenConfig> {
    ConfigLoader::new().file(path).load()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::config::schema::{LogLevel, LogOutput};
    use warden_core::CommunityId;

    fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new()
            .without_env()
            .search_path(dir.path())
            .load()
            .unwrap();

        assert_eq!(config.logging.level.as_str(), "info");
        assert_eq!(config.bot.default_prefix, "!?");
    }

    #[test]
    fn test_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "bot.toml",
            r#"
                [bot]
                restricted_community = 775912554928144384
                activity = "the servers"

                [logging]
                level = "debug"
                output = "file"
                file_path = "discord.log"
            "#,
        );

        let config = ConfigLoader::new().without_env().file(&path).load().unwrap();

        assert_eq!(
            config.bot.restricted_community,
            Some(CommunityId(775912554928144384))
        );
        assert_eq!(config.bot.activity, "the servers");
        assert_eq!(config.bot.restricted_allow_list, vec!["help", "ping"]);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.output, LogOutput::File);
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = ConfigLoader::new()
            .without_env()
            .file("/definitely/not/here.toml")
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_profile_file_is_below_base_file() {
        let dir = tempfile::tempdir().unwrap();
        write_file(
            dir.path(),
            "warden.production.toml",
            "[bot]\ndefault_prefix = \"p!\"\nactivity = \"prod\"\n",
        );
        write_file(dir.path(), "warden.toml", "[bot]\nactivity = \"base\"\n");

        let config = ConfigLoader::new()
            .without_env()
            .profile("prod")
            .search_path(dir.path())
            .load()
            .unwrap();

        assert_eq!(config.bot.default_prefix, "p!");
        assert_eq!(config.bot.activity, "base");
    }

    #[test]
    fn test_overrides_win() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "config.toml", "[keep_alive]\nport = 9000\n");

        let mut overrides = WardenConfig::default();
        overrides.keep_alive.port = 9100;
        let config = ConfigLoader::new()
            .without_env()
            .search_path(dir.path())
            .merge(overrides)
            .load()
            .unwrap();

        assert_eq!(config.keep_alive.port, 9100);
    }

    #[test]
    fn test_bad_value_fails_extraction() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "warden.toml", "[logging]\nlevel = \"loud\"\n");

        let err = ConfigLoader::new()
            .without_env()
            .file(&path)
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::Extract(_)));
    }

    #[test]
    fn test_profile_parse() {
        assert_eq!(Profile::parse("PROD"), Profile::Production);
        assert_eq!(Profile::parse("dev"), Profile::Development);
        assert_eq!(Profile::parse("staging"), Profile::Custom("staging".into()));
    }
}
