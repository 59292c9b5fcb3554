//! Persisted build environments
//!
//! A snapshot records the variables a build ran with, so `build-env` can put
//! the user back into the same environment later. It is stored as JSON in
//! `<build_path>/build.rxt`.

use super::ShellEnv;
use crate::context::{ContextLoader, ResolvedContext, ShellRequest};
use kiln_errors::{BuildError, Error};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};

/// Current snapshot format version
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

#[cfg(windows)]
const DEFAULT_SHELL: &str = "cmd";
#[cfg(not(windows))]
const DEFAULT_SHELL: &str = "/bin/sh";

/// A captured environment that runs commands with exactly its variables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentSnapshot {
    #[serde(rename = "version")]
    pub format_version: u32,
    /// Shell used for interactive sessions
    pub shell: String,
    pub variables: ShellEnv,
    /// Route non-interactive stdout to our stderr
    #[serde(skip)]
    stdout_to_stderr: bool,
}

impl EnvironmentSnapshot {
    #[must_use]
    pub fn new(shell: impl Into<String>, variables: ShellEnv) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            shell: shell.into(),
            variables,
            stdout_to_stderr: false,
        }
    }

    /// Send the stdout of spawned commands to this process's stderr, so
    /// stdout stays free for machine-readable output
    #[must_use]
    pub fn with_stdout_to_stderr(mut self) -> Self {
        self.stdout_to_stderr = true;
        self
    }

    /// Capture the allowed variables from the current process environment
    #[must_use]
    pub fn capture(allowed_vars: &[String]) -> Self {
        let variables = allowed_vars
            .iter()
            .filter_map(|key| std::env::var(key).ok().map(|value| (key.clone(), value)))
            .collect();

        let shell = std::env::var("SHELL")
            .ok()
            .filter(|shell| !shell.is_empty())
            .unwrap_or_else(|| DEFAULT_SHELL.to_string());

        Self::new(shell, variables)
    }

    /// Read a snapshot written by [`ResolvedContext::save`].
    ///
    /// # Errors
    ///
    /// Returns `SnapshotInvalid` if the file cannot be read or parsed, or was
    /// written by a newer format version.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let invalid = |message: String| BuildError::SnapshotInvalid {
            path: path.display().to_string(),
            message,
        };

        let contents = std::fs::read_to_string(path).map_err(|e| invalid(e.to_string()))?;
        let snapshot: Self =
            serde_json::from_str(&contents).map_err(|e| invalid(e.to_string()))?;

        if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(invalid(format!(
                "unsupported format version {}",
                snapshot.format_version
            ))
            .into());
        }

        Ok(snapshot)
    }

    fn command_for(&self, request: &ShellRequest<'_>) -> Result<(Command, String), Error> {
        let mut env = self.variables.clone();
        (request.actions)(&mut env);

        let (mut command, shown) = match request.command {
            Some([program, args @ ..]) => {
                let mut command = Command::new(program);
                command.args(args);
                if self.stdout_to_stderr {
                    command.stdout(Stdio::from(std::io::stderr()));
                }
                (command, program.clone())
            }
            Some([]) => {
                return Err(Error::internal("empty command passed to execute_shell"));
            }
            None => {
                let mut command = Command::new(&self.shell);
                if let Some(prompt) = request.prompt {
                    env.set("PS1", format!("{prompt} "));
                    env.set("PROMPT", format!("{prompt} "));
                    // rc files would reset the prompt
                    command.args(skip_rc_args(&self.shell));
                }
                (command, self.shell.clone())
            }
        };

        command
            .current_dir(request.cwd)
            .env_clear()
            .envs(env.iter());

        Ok((command, shown))
    }
}

impl ResolvedContext for EnvironmentSnapshot {
    fn execute_shell(&self, request: &ShellRequest<'_>) -> Result<i32, Error> {
        let (mut command, shown) = self.command_for(request)?;

        tracing::debug!(
            command = %shown,
            cwd = %request.cwd.display(),
            interactive = request.command.is_none(),
            "spawning process"
        );

        let status = command.status().map_err(|e| BuildError::ShellFailed {
            command: shown,
            message: e.to_string(),
        })?;

        Ok(exit_code(status))
    }

    fn which(&self, name: &str) -> Option<PathBuf> {
        let cwd = std::env::current_dir().ok()?;
        which::which_in(name, self.variables.get("PATH"), cwd).ok()
    }

    fn environment(&self) -> ShellEnv {
        self.variables.clone()
    }

    fn save(&self, path: &Path) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| Error::io_with_path(&e, path))
    }
}

/// Loads [`EnvironmentSnapshot`] files
#[derive(Debug, Clone, Copy, Default)]
pub struct SnapshotLoader;

impl ContextLoader for SnapshotLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn ResolvedContext>, Error> {
        Ok(Box::new(EnvironmentSnapshot::load(path)?))
    }
}

/// Flags that keep an interactive shell from reading the user's rc files
fn skip_rc_args(shell: &str) -> &'static [&'static str] {
    let name = Path::new(shell)
        .file_stem()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    match name {
        "bash" => &["--norc", "--noprofile"],
        "zsh" => &["-f"],
        _ => &[],
    }
}

#[cfg(unix)]
fn exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;

    status
        .code()
        .or_else(|| status.signal().map(|signal| 128 + signal))
        .unwrap_or(1)
}

#[cfg(not(unix))]
fn exit_code(status: ExitStatus) -> i32 {
    status.code().unwrap_or(1)
}
