//! Fixed names and fallback locations used when the config leaves them unset

/// Directory name under the platform config/data dirs
pub const APP_DIR: &str = "kiln";

pub const CONFIG_FILE: &str = "config.toml";

/// Fallback root when no platform data directory can be determined
pub const FALLBACK_DATA_DIR: &str = "/usr/local/share/kiln";

pub const CMAKE_FILES_DIR: &str = "cmake_files";
pub const TEMPLATE_FILES_DIR: &str = "template_files";
pub const LOGS_DIR: &str = "logs";

pub const RELEASE_PACKAGES_DIR: &str = "/opt/kiln/packages";

/// Prompt label shown inside a resumed build shell
pub const BUILD_PROMPT: &str = "BUILD>";

/// Prefix for configuration overrides read from the environment
pub const ENV_PREFIX: &str = "KILN_";
