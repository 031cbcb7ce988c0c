//! Layered configuration loading.
//!
//! A [`ConfigLoader`] stacks these sources with figment, each one overriding
//! the ones before it:
//!
//! 1. [`YoaiConfig::default`]
//! 2. the profile file next to the main file, e.g. `yoai.production.toml`
//! 3. the main file (`yoai.toml`, `config.toml`, `yoai.yaml`, ...)
//! 4. `YOAI_*` environment variables, nested with `__`
//!    (`YOAI_API__API_KEY` sets `api.api_key`)
//! 5. values passed to [`ConfigLoader::merge`] or [`ConfigLoader::set`]
//!
//! File formats are opt-in: `toml-config` reads `.toml` files and
//! `yaml-config` reads `.yaml`/`.yml` files. With both enabled, one file of
//! each format may be merged, TOML first.
//!
//! Unless [`ConfigLoader::search_path`] is given, files are looked up in the
//! working directory and then in the user config directory (`~/.config/yoai`
//! on Linux).
//!
//! ```rust,ignore
//! use yoai_runtime::config::ConfigLoader;
//!
//! let config = ConfigLoader::new()
//!     .profile("production")
//!     .set("polling.interval_secs", 10)
//!     .load()?;
//! ```

use std::fmt;
use std::path::{Path, PathBuf};

use figment::Figment;
#[cfg(any(feature = "yaml-config", feature = "toml-config"))]
use figment::providers::Format;
#[cfg(feature = "toml-config")]
use figment::providers::Toml;
#[cfg(feature = "yaml-config")]
use figment::providers::Yaml;
use figment::providers::{Env, Serialized};
use tracing::{debug, info, trace, warn};

use super::error::{ConfigError, ConfigResult};
use super::schema::YoaiConfig;

/// Prefix of environment variables read by the loader.
pub const ENV_PREFIX: &str = "YOAI_";

/// Environment variable selecting the profile.
pub const PROFILE_ENV: &str = "YOAI_PROFILE";

/// Directory under the user config directory that is searched by default.
const APP_DIR: &str = "yoai";

#[cfg(feature = "toml-config")]
const TOML_NAMES: &[&str] = &["yoai.toml", "config.toml"];

#[cfg(feature = "yaml-config")]
const YAML_NAMES: &[&str] = &["yoai.yaml", "yoai.yml", "config.yaml", "config.yml"];

/// Names of the profile-specific file layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Development,
    Production,
    /// Any other name, lowercased.
    Custom(String),
}

impl Profile {
    /// Parses a profile name; `dev` and `prod` are accepted as short forms.
    pub fn parse(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "development" | "dev" => Self::Development,
            other => Self::Custom(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Custom(name) => name,
        }
    }

    /// Reads `YOAI_PROFILE`; unset means [`Profile::Development`].
    pub fn from_env() -> Self {
        std::env::var(PROFILE_ENV)
            .map(|name| Self::parse(&name))
            .unwrap_or_default()
    }

    /// `yoai.toml` becomes `yoai.<profile>.toml`.
    fn file_name(&self, base_name: &str) -> Option<String> {
        let (stem, ext) = base_name.rsplit_once('.')?;
        Some(format!("{stem}.{}.{ext}", self.as_str()))
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Builds a [`YoaiConfig`] from files, the environment and overrides.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Merged on top of every other source.
    overrides: Figment,
    profile: Profile,
    /// Directories to search; empty means the default locations.
    search_paths: Vec<PathBuf>,
    load_env: bool,
    /// Replaces the search when set.
    config_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Creates a loader for the profile named by `YOAI_PROFILE`.
    pub fn new() -> Self {
        Self {
            overrides: Figment::new(),
            profile: Profile::from_env(),
            search_paths: Vec::new(),
            load_env: true,
            config_file: None,
        }
    }

    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Profile::parse(&profile.into());
        self
    }

    /// Searches `path` for configuration files.
    ///
    /// Once any search path is given, the default locations are skipped.
    pub fn search_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.search_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Loads exactly this file; a missing file is an error.
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Reads `YOAI_*` variables (the default).
    pub fn with_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    pub fn without_env(mut self) -> Self {
        self.load_env = false;
        self
    }

    /// Merges a complete configuration on top of every other source.
    pub fn merge(mut self, config: YoaiConfig) -> Self {
        self.overrides = self.overrides.merge(Serialized::defaults(config));
        self
    }

    /// Overrides a single key, e.g. `set("api.api_key", key)`.
    pub fn set<V: serde::Serialize>(mut self, key: &str, value: V) -> Self {
        self.overrides = self.overrides.merge(Serialized::default(key, value));
        self
    }

    /// Merges every source and extracts the result.
    ///
    /// The result is not validated; see
    /// [`validate_config`](super::validate_config).
    ///
    /// # Errors
    ///
    /// Fails when an explicit file is missing or has an unsupported
    /// extension, or when the merged values do not fit [`YoaiConfig`].
    pub fn load(self) -> ConfigResult<YoaiConfig> {
        let profile = self.profile.clone();
        let config: YoaiConfig = self.into_figment()?.extract()?;

        debug!(
            profile = %profile,
            logging_level = %config.logging.level,
            commands = config.commands.len(),
            "Configuration loaded"
        );

        Ok(config)
    }

    fn into_figment(self) -> ConfigResult<Figment> {
        let defaults = Figment::from(Serialized::defaults(YoaiConfig::default()));

        let mut figment = match &self.config_file {
            Some(path) if path.exists() => {
                info!(path = %path.display(), "Loading configuration file");
                merge_file(defaults, path)?
            }
            Some(path) => return Err(ConfigError::FileNotFound(path.clone())),
            None => self.merge_found_files(defaults),
        };

        if self.load_env {
            trace!(prefix = ENV_PREFIX, "Loading environment variables");
            figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        }

        Ok(figment.merge(self.overrides))
    }

    fn search_dirs(&self) -> Vec<PathBuf> {
        if !self.search_paths.is_empty() {
            return self.search_paths.clone();
        }
        std::env::current_dir()
            .ok()
            .into_iter()
            .chain(dirs::config_dir().map(|dir| dir.join(APP_DIR)))
            .collect()
    }

    /// Merges the first main file of each enabled format, preceded by its
    /// profile file when one sits next to it.
    fn merge_found_files(&self, mut figment: Figment) -> Figment {
        let dirs = self.search_dirs();
        let mut found = false;

        for base_names in enabled_formats() {
            let Some(main) = first_existing(&dirs, base_names) else {
                continue;
            };

            let profile_file = main
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(|name| self.profile.file_name(name))
                .map(|name| main.with_file_name(name))
                .filter(|path| path.exists());
            if let Some(path) = profile_file {
                debug!(path = %path.display(), "Loading profile configuration file");
                figment = merge_searched(figment, &path);
            }

            info!(path = %main.display(), "Loading configuration file");
            figment = merge_searched(figment, &main);
            found = true;
        }

        if !found {
            warn!(paths = ?dirs, "No configuration file found, using defaults");
        }
        figment
    }
}

/// Base file names of every enabled format, in merge order.
#[allow(unused_mut)]
fn enabled_formats() -> Vec<&'static [&'static str]> {
    let mut formats = Vec::new();
    #[cfg(feature = "toml-config")]
    formats.push(TOML_NAMES);
    #[cfg(feature = "yaml-config")]
    formats.push(YAML_NAMES);
    formats
}

fn first_existing(dirs: &[PathBuf], base_names: &[&str]) -> Option<PathBuf> {
    dirs.iter()
        .flat_map(|dir| base_names.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

/// Merges a file found by the search, whose extension is always enabled.
fn merge_searched(figment: Figment, path: &Path) -> Figment {
    match merge_file(figment.clone(), path) {
        Ok(merged) => merged,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Skipping configuration file");
            figment
        }
    }
}

/// Merges `path` into `figment` according to its extension.
fn merge_file(figment: Figment, path: &Path) -> ConfigResult<Figment> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    match ext {
        #[cfg(feature = "toml-config")]
        "toml" => Ok(figment.merge(Toml::file(path))),
        #[cfg(feature = "yaml-config")]
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        _ => {
            let _ = figment;
            Err(ConfigError::UnsupportedFormat(ext.to_string()))
        }
    }
}

/// Loads configuration from the default locations and the environment.
pub fn load_config() -> ConfigResult<YoaiConfig> {
    ConfigLoader::new().load()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn test_default_config() {
        Jail::expect_with(|jail| {
            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.logging.level.as_str(), "info");
            assert_eq!(config.polling.interval_secs, 3);
            assert!(config.api.api_key.is_empty());
            Ok(())
        });
    }

    #[test]
    fn test_env_overrides() {
        Jail::expect_with(|jail| {
            jail.set_env("YOAI_API__API_KEY", "from-env");
            jail.set_env("YOAI_POLLING__INTERVAL_SECS", "10");
            jail.set_env("YOAI_LOGGING__LEVEL", "debug");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.api.api_key, "from-env");
            assert_eq!(config.polling.interval_secs, 10);
            assert_eq!(config.polling.cooldown_secs, 5);
            assert_eq!(config.logging.level.as_str(), "debug");
            Ok(())
        });
    }

    #[test]
    fn test_programmatic_override_wins_over_env() {
        Jail::expect_with(|jail| {
            jail.set_env("YOAI_API__API_KEY", "from-env");

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .set("api.api_key", "explicit")
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.api.api_key, "explicit");
            Ok(())
        });
    }

    #[test]
    fn test_missing_explicit_file() {
        Jail::expect_with(|jail| {
            let result = ConfigLoader::new()
                .file(jail.directory().join("nope.toml"))
                .load();
            assert!(matches!(result, Err(ConfigError::FileNotFound(_))));
            Ok(())
        });
    }

    #[test]
    fn test_unsupported_extension() {
        Jail::expect_with(|jail| {
            jail.create_file("yoai.ini", "api_key = x")?;
            let result = ConfigLoader::new()
                .file(jail.directory().join("yoai.ini"))
                .load();
            assert!(matches!(result, Err(ConfigError::UnsupportedFormat(ext)) if ext == "ini"));
            Ok(())
        });
    }

    #[test]
    fn test_profile_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env(PROFILE_ENV, "prod");
            assert_eq!(Profile::from_env(), Profile::Production);

            jail.set_env(PROFILE_ENV, "Staging");
            assert_eq!(Profile::from_env(), Profile::Custom("staging".into()));
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_toml_file_with_profile_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "yoai.toml",
                r#"
                [api]
                api_key = "from-file"
                timeout_ms = 5000

                [polling]
                interval_secs = 7

                [[commands]]
                command = "start"
                description = "Start the bot"
                "#,
            )?;
            jail.create_file(
                "yoai.production.toml",
                r#"
                [polling]
                cooldown_secs = 30
                "#,
            )?;
            jail.set_env("YOAI_API__TIMEOUT_MS", "9000");

            let config = ConfigLoader::new()
                .profile("production")
                .search_path(jail.directory())
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.api.api_key, "from-file");
            assert_eq!(config.api.timeout_ms, 9000);
            assert_eq!(config.polling.interval_secs, 7);
            assert_eq!(config.polling.cooldown_secs, 30);
            assert_eq!(config.commands.len(), 1);
            assert_eq!(config.commands[0].command, "start");
            Ok(())
        });
    }

    #[cfg(all(feature = "toml-config", target_os = "linux"))]
    #[test]
    fn test_default_search_reaches_user_config_dir() {
        Jail::expect_with(|jail| {
            jail.set_env("XDG_CONFIG_HOME", jail.directory().join("xdg").display());
            std::fs::create_dir_all(jail.directory().join("xdg/yoai"))
                .map_err(|e| e.to_string())?;
            jail.create_file("xdg/yoai/yoai.toml", "[api]\napi_key = \"from-user-dir\"")?;
            jail.create_file(
                "xdg/yoai/yoai.development.toml",
                "[polling]\ncooldown_secs = 9",
            )?;

            let config = ConfigLoader::new()
                .profile("dev")
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.api.api_key, "from-user-dir");
            assert_eq!(config.polling.cooldown_secs, 9);
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_working_dir_file_comes_first() {
        Jail::expect_with(|jail| {
            jail.create_file("config.toml", "[api]\napi_key = \"fallback\"")?;
            jail.create_file("yoai.toml", "[api]\napi_key = \"preferred\"")?;

            let config = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load()
                .map_err(|e| e.to_string())?;

            assert_eq!(config.api.api_key, "preferred");
            Ok(())
        });
    }

    #[cfg(feature = "toml-config")]
    #[test]
    fn test_malformed_file_is_parse_error() {
        Jail::expect_with(|jail| {
            jail.create_file("yoai.toml", "[polling]\ninterval_secs = \"soon\"")?;
            let result = ConfigLoader::new()
                .search_path(jail.directory())
                .without_env()
                .load();
            assert!(matches!(result, Err(ConfigError::ParseError(_))));
            Ok(())
        });
    }
}
