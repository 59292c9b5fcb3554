//! Standard build variables injected before every phase

use super::ShellEnv;
use crate::package::{DeveloperPackage, Variant};
use kiln_config::Config;
use kiln_types::BuildType;
use std::path::{Path, PathBuf};

const MODULE_PATH_VAR: &str = "CMAKE_MODULE_PATH";
const DOXYFILE: &str = "Doxyfile";

/// Host-level inputs to the injected environment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InjectorSettings {
    /// Directory of cmake macros shipped with kiln
    pub cmake_files_dir: PathBuf,
    pub template_files_dir: PathBuf,
    pub install_pyc: bool,
    pub thread_count: usize,
}

impl InjectorSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            cmake_files_dir: config.cmake_files_dir(),
            template_files_dir: config.template_files_dir(),
            install_pyc: config.cmake.install_pyc,
            thread_count: config.build_thread_count(),
        }
    }
}

/// Environment mutations bound to one package variant build
///
/// The same actions run before configure, build and install. Applying them
/// twice leaves the environment unchanged.
#[derive(Debug, Clone)]
pub struct BuildActions<'a> {
    pub package: &'a DeveloperPackage,
    pub variant: &'a Variant,
    pub build_type: BuildType,
    pub install: bool,
    pub build_path: &'a Path,
    pub install_path: Option<&'a Path>,
    /// Source checkout the package is built from
    pub source_path: &'a Path,
    pub settings: &'a InjectorSettings,
}

impl BuildActions<'_> {
    /// Apply the build variables to `env`
    pub fn apply(&self, env: &mut ShellEnv) {
        self.set_standard_vars(env);

        let macros = forward_slashes(&self.settings.cmake_files_dir);
        env.append_path(MODULE_PATH_VAR, &macros);

        env.set(
            "KILN_BUILD_DOXYFILE",
            self.settings
                .template_files_dir
                .join(DOXYFILE)
                .display()
                .to_string(),
        );
        env.set(
            "KILN_BUILD_INSTALL_PYC",
            if self.settings.install_pyc { "1" } else { "0" },
        );
    }

    fn set_standard_vars(&self, env: &mut ShellEnv) {
        let package = self.package;

        env.set("KILN_BUILD_ENV", "1");
        env.set("KILN_BUILD_PATH", self.build_path.display().to_string());
        env.set(
            "KILN_BUILD_THREAD_COUNT",
            self.settings.thread_count.to_string(),
        );
        env.set("KILN_BUILD_VARIANT_INDEX", self.variant.index.to_string());
        env.set("KILN_BUILD_VARIANT_SUBPATH", self.variant.subpath());
        env.set("KILN_BUILD_PROJECT_NAME", package.name.as_str());
        env.set("KILN_BUILD_PROJECT_VERSION", package.version.as_str());
        env.set(
            "KILN_BUILD_PROJECT_DESCRIPTION",
            package.description.as_deref().unwrap_or_default().trim(),
        );
        env.set("KILN_BUILD_SOURCE_PATH", self.source_path.display().to_string());
        env.set("KILN_BUILD_REQUIRES", package.requires.join(" "));
        env.set("KILN_BUILD_VARIANT_REQUIRES", self.variant.requires.join(" "));
        env.set("KILN_BUILD_TYPE", self.build_type.as_str());
        env.set("KILN_BUILD_INSTALL", if self.install { "1" } else { "0" });

        if let Some(install_path) = self.install_path {
            env.set("KILN_BUILD_INSTALL_PATH", install_path.display().to_string());
        }
    }

    /// Value of `CMAKE_MODULE_PATH` a phase will see when run on top of
    /// `base`, as a cmake `;` list
    #[must_use]
    pub fn cmake_module_path(&self, base: &ShellEnv) -> String {
        let mut env = base.clone();
        self.apply(&mut env);
        env.path_entries(MODULE_PATH_VAR)
            .collect::<Vec<_>>()
            .join(";")
    }
}

fn forward_slashes(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}
