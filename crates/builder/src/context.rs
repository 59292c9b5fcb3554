//! Execution contexts
//!
//! A resolved context is the environment a build runs inside: its variables,
//! its tool lookup, and the way it spawns commands. The pipeline only talks
//! to contexts through [`ResolvedContext`], so callers can plug in their own.

use crate::environment::ShellEnv;
use kiln_errors::Error;
use std::path::{Path, PathBuf};

/// One shell invocation inside a context
pub struct ShellRequest<'a> {
    /// Command to run; `None` starts an interactive shell
    pub command: Option<&'a [String]>,
    pub cwd: &'a Path,
    /// Called on the context's environment right before the process starts
    pub actions: &'a dyn Fn(&mut ShellEnv),
    /// Prompt label for interactive shells
    pub prompt: Option<&'a str>,
}

impl std::fmt::Debug for ShellRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShellRequest")
            .field("command", &self.command)
            .field("cwd", &self.cwd)
            .field("prompt", &self.prompt)
            .finish_non_exhaustive()
    }
}

/// An environment build phases can execute in
pub trait ResolvedContext {
    /// Run a command, or an interactive shell, and block until it exits.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process could not be started. A process
    /// that runs and fails is reported through its exit code.
    fn execute_shell(&self, request: &ShellRequest<'_>) -> Result<i32, Error>;

    /// Find an executable on the context's `PATH`
    fn which(&self, name: &str) -> Option<PathBuf>;

    /// Variables the context provides before any build actions run
    fn environment(&self) -> ShellEnv;

    /// Persist the context so a later process can load it.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    fn save(&self, path: &Path) -> Result<(), Error>;
}

/// Loads a context persisted with [`ResolvedContext::save`]
pub trait ContextLoader {
    /// # Errors
    ///
    /// Returns an error if the file is missing or not a valid context.
    fn load(&self, path: &Path) -> Result<Box<dyn ResolvedContext>, Error>;
}
