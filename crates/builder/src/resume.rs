//! Re-entering a configured build
//!
//! When a build stops after configure, a small `build-env` script is left in
//! the build directory. Running it calls back into the `kiln build-env`
//! subcommand, which rebuilds the environment from the saved context and drops
//! the user into an interactive shell there.

use crate::context::{ContextLoader, ShellRequest};
use crate::environment::{BuildActions, InjectorSettings, ShellEnv};
use crate::package::PackageLoader;
use kiln_errors::Error;
use kiln_events::{AppEvent, BuildEvent, EventEmitter, EventSender};
use kiln_types::BuildType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Script written to the build directory
pub const BUILD_ENV_SCRIPT: &str = "build-env";
/// Saved context written next to the script
pub const CONTEXT_FILE: &str = "build.rxt";
/// CLI subcommand the script invokes
pub const RESUME_SUBCOMMAND: &str = "build-env";

/// Everything needed to re-enter a configured build
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumableBuildDescriptor {
    pub working_dir: PathBuf,
    pub build_path: PathBuf,
    pub variant_index: usize,
    pub install: bool,
    pub install_path: Option<PathBuf>,
    /// Config file the build was run with, handed back to the launcher
    #[serde(default)]
    pub config_path: Option<PathBuf>,
}

/// Host settings used when resuming
#[derive(Debug, Clone)]
pub struct ResumeSettings {
    pub injector: InjectorSettings,
    /// Prompt label shown by the interactive shell
    pub prompt: String,
}

impl ResumableBuildDescriptor {
    #[must_use]
    pub fn script_path(&self) -> PathBuf {
        self.build_path.join(BUILD_ENV_SCRIPT)
    }

    #[must_use]
    pub fn context_path(&self) -> PathBuf {
        self.build_path.join(CONTEXT_FILE)
    }

    /// Arguments passed to the launcher to resume this build
    #[must_use]
    pub fn launcher_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(config_path) = &self.config_path {
            args.push("--config".to_string());
            args.push(config_path.display().to_string());
        }

        args.extend([
            RESUME_SUBCOMMAND.to_string(),
            "--working-dir".to_string(),
            self.working_dir.display().to_string(),
            "--build-path".to_string(),
            self.build_path.display().to_string(),
            "--variant-index".to_string(),
            self.variant_index.to_string(),
        ]);

        if self.install {
            args.push("--install".to_string());
        }

        if let Some(install_path) = &self.install_path {
            args.push("--install-path".to_string());
            args.push(install_path.display().to_string());
        }

        args
    }

    /// Render the `build-env` script for `launcher`
    #[must_use]
    pub fn render_script(&self, launcher: &Path) -> String {
        let mut line = vec![shell_quote(&launcher.display().to_string())];
        line.extend(self.launcher_args().iter().map(String::as_str).map(shell_quote));

        format!("#!/bin/sh\nexec {}\n", line.join(" "))
    }

    /// Write the `build-env` script into the build directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the script cannot be written or made executable.
    pub fn persist(&self, launcher: &Path) -> Result<PathBuf, Error> {
        let path = self.script_path();
        std::fs::write(&path, self.render_script(launcher))
            .map_err(|e| Error::io_with_path(&e, &path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .map_err(|e| Error::io_with_path(&e, &path))?;
        }

        tracing::debug!(script = %path.display(), "wrote build environment script");
        Ok(path)
    }

    /// Spawn an interactive shell in the saved build environment and return
    /// its exit code.
    ///
    /// # Errors
    ///
    /// Returns an error if the saved context or package cannot be loaded, the
    /// variant no longer exists, or the shell cannot be started.
    pub fn resume(
        &self,
        contexts: &dyn ContextLoader,
        packages: &dyn PackageLoader,
        settings: &ResumeSettings,
        event_sender: Option<&EventSender>,
    ) -> Result<i32, Error> {
        let context = contexts.load(&self.context_path())?;
        let package = packages.load(&self.working_dir)?;
        let variant = package.get_variant(self.variant_index)?;

        let actions = BuildActions {
            package: &package,
            variant: &variant,
            build_type: BuildType::Local,
            install: self.install,
            build_path: &self.build_path,
            install_path: self.install_path.as_deref(),
            source_path: &self.working_dir,
            settings: &settings.injector,
        };

        if let Some(sender) = event_sender {
            sender.emit(AppEvent::Build(BuildEvent::ShellResumed {
                package: package.name.clone(),
                variant: variant.index,
                build_path: self.build_path.clone(),
            }));
        }

        context.execute_shell(&ShellRequest {
            command: None,
            cwd: &self.build_path,
            actions: &|env: &mut ShellEnv| actions.apply(env),
            prompt: Some(&settings.prompt),
        })
    }
}

/// Quote a word for POSIX `sh`
#[must_use]
pub fn shell_quote(word: &str) -> String {
    let safe = !word.is_empty()
        && word
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,+@%".contains(c));

    if safe {
        word.to_string()
    } else {
        format!("'{}'", word.replace('\'', r"'\''"))
    }
}
