#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for kiln
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/kiln/config.toml)
//! - Environment variables
//! - CLI flags (applied by the binary)

pub mod cmake;
pub mod constants;

pub use cmake::CMakeSettings;

use kiln_errors::{ConfigError, Error};
use kiln_types::ColorChoice;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub cmake: CMakeSettings,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub compat: CompatConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeneralConfig {
    #[serde(default)]
    pub color: ColorChoice,
}

/// Build execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default)]
    pub thread_count: usize, // 0 = auto-detect
    #[serde(default = "default_prompt")]
    pub prompt: String,
    /// Host variables captured into the build environment snapshot
    #[serde(default = "default_allowed_env_vars")]
    pub allowed_env_vars: Vec<String>,
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PathConfig {
    pub cmake_files_dir: Option<PathBuf>,
    pub template_files_dir: Option<PathBuf>,
    pub local_packages_path: Option<PathBuf>,
    pub release_packages_path: Option<PathBuf>,
}

/// Compatibility switches for projects written against older cmake macros
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatConfig {
    /// Emit `-DCENTRAL=1` for central builds
    #[serde(default)]
    pub cmake_variables: bool,
    /// Master switch; when set no compatibility flags are emitted at all
    #[serde(default = "default_compat_disabled")]
    pub disabled: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            thread_count: 0,
            prompt: default_prompt(),
            allowed_env_vars: default_allowed_env_vars(),
        }
    }
}

impl Default for CompatConfig {
    fn default() -> Self {
        Self {
            cmake_variables: false,
            disabled: default_compat_disabled(),
        }
    }
}

fn default_prompt() -> String {
    constants::BUILD_PROMPT.to_string()
}

fn default_allowed_env_vars() -> Vec<String> {
    [
        "PATH", "HOME", "USER", "SHELL", "TERM", "LANG", "LC_ALL", "TMPDIR", "TMP", "TEMP",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_compat_disabled() -> bool {
    true
}

impl CompatConfig {
    /// Whether central builds get the `-DCENTRAL=1` define
    #[must_use]
    pub fn central_define_enabled(&self) -> bool {
        self.cmake_variables && !self.disabled
    }
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir
            .join(constants::APP_DIR)
            .join(constants::CONFIG_FILE))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path).map_err(|_| ConfigError::NotFound {
            path: path.display().to_string(),
        })?;

        tracing::debug!(path = %path.display(), "loading configuration");

        toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError {
                message: e.to_string(),
            })
            .map_err(Into::into)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path),
            None => Self::load(),
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        // KILN_BUILD_TARGET
        if let Some(target) = env_var("BUILD_TARGET") {
            self.cmake.build_target = target.parse().map_err(|_| ConfigError::InvalidValue {
                field: "KILN_BUILD_TARGET".to_string(),
                value: target,
            })?;
        }

        // KILN_CMAKE_BUILD_SYSTEM
        if let Some(generator) = env_var("CMAKE_BUILD_SYSTEM") {
            self.cmake.build_system = Some(generator).filter(|g| !g.is_empty());
        }

        // KILN_CMAKE_BINARY
        if let Some(binary) = env_var("CMAKE_BINARY") {
            self.cmake.cmake_binary = Some(PathBuf::from(binary));
        }

        // KILN_MAKE_BINARY
        if let Some(binary) = env_var("MAKE_BINARY") {
            self.cmake.make_binary = Some(binary).filter(|b| !b.is_empty());
        }

        // KILN_INSTALL_PYC
        if let Some(flag) = env_var("INSTALL_PYC") {
            self.cmake.install_pyc = parse_bool(&flag).ok_or_else(|| ConfigError::InvalidValue {
                field: "KILN_INSTALL_PYC".to_string(),
                value: flag.clone(),
            })?;
        }

        // KILN_BUILD_THREADS
        if let Some(threads) = env_var("BUILD_THREADS") {
            self.build.thread_count = threads.parse().map_err(|_| ConfigError::InvalidValue {
                field: "KILN_BUILD_THREADS".to_string(),
                value: threads,
            })?;
        }

        Ok(())
    }

    /// Number of build threads handed to make (`-jN`)
    #[must_use]
    pub fn build_thread_count(&self) -> usize {
        calculate_build_jobs(self.build.thread_count)
    }

    /// Directory of cmake macros appended to `CMAKE_MODULE_PATH`
    #[must_use]
    pub fn cmake_files_dir(&self) -> PathBuf {
        self.paths
            .cmake_files_dir
            .clone()
            .unwrap_or_else(|| data_dir().join(constants::CMAKE_FILES_DIR))
    }

    /// Directory holding documentation templates such as the Doxyfile
    #[must_use]
    pub fn template_files_dir(&self) -> PathBuf {
        self.paths
            .template_files_dir
            .clone()
            .unwrap_or_else(|| data_dir().join(constants::TEMPLATE_FILES_DIR))
    }

    /// Install root for local builds
    #[must_use]
    pub fn local_packages_path(&self) -> PathBuf {
        self.paths.local_packages_path.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("packages")
        })
    }

    /// Install root for central (release) builds
    #[must_use]
    pub fn release_packages_path(&self) -> PathBuf {
        self.paths
            .release_packages_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(constants::RELEASE_PACKAGES_DIR))
    }
}

fn env_var(suffix: &str) -> Option<String> {
    std::env::var(format!("{}{suffix}", constants::ENV_PREFIX)).ok()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

/// Directory for `--debug` log files
#[must_use]
pub fn logs_dir() -> PathBuf {
    data_dir().join(constants::LOGS_DIR)
}

fn data_dir() -> PathBuf {
    dirs::data_dir().map_or_else(
        || PathBuf::from(constants::FALLBACK_DATA_DIR),
        |dir| dir.join(constants::APP_DIR),
    )
}

/// Calculate build jobs based on CPU count
#[must_use]
pub fn calculate_build_jobs(config_value: usize) -> usize {
    if config_value > 0 {
        config_value // User override
    } else {
        let cpus = num_cpus::get();

        // Use 75% of CPUs for builds, minimum 1
        (cpus * 3 / 4).max(1)
    }
}
