//! Settings for the CMake build system

use kiln_types::BuildTarget;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CMake build-system settings
///
/// Every field is optional in the TOML file; missing fields take the values
/// documented on [`CMakeSettings::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CMakeSettings {
    /// Value passed as `CMAKE_BUILD_TYPE`
    #[serde(default)]
    pub build_target: BuildTarget,
    /// Generator name or legacy alias; `None` lets cmake pick its default
    #[serde(default)]
    pub build_system: Option<String>,
    /// Arguments passed to every configure run, in order
    #[serde(default = "default_cmake_args")]
    pub cmake_args: Vec<String>,
    /// Explicit cmake executable; searched for when unset
    #[serde(default)]
    pub cmake_binary: Option<PathBuf>,
    /// Explicit make executable; `cmake --build` is used when unset
    #[serde(default)]
    pub make_binary: Option<String>,
    /// Whether the python install macros compile `.pyc` files
    #[serde(default = "default_install_pyc")]
    pub install_pyc: bool,
}

impl Default for CMakeSettings {
    fn default() -> Self {
        Self {
            build_target: BuildTarget::Release,
            build_system: None,
            cmake_args: default_cmake_args(),
            cmake_binary: None,
            make_binary: None,
            install_pyc: default_install_pyc(),
        }
    }
}

impl CMakeSettings {
    /// Generator selection with empty strings treated as unset
    #[must_use]
    pub fn generator(&self) -> Option<&str> {
        self.build_system.as_deref().filter(|name| !name.is_empty())
    }

    /// Make binary with empty strings treated as unset
    #[must_use]
    pub fn make_binary(&self) -> Option<&str> {
        self.make_binary.as_deref().filter(|name| !name.is_empty())
    }
}

/// Baseline flags that keep IDE project generation quiet and compatible
fn default_cmake_args() -> Vec<String> {
    [
        "-Wno-dev",
        "-DCMAKE_ECLIPSE_GENERATE_SOURCE_PROJECT=TRUE",
        "-D_ECLIPSE_VERSION=4.3",
        "--no-warn-unused-cli",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_install_pyc() -> bool {
    true
}
