//! Recording collaborators shared by the integration tests

use kiln_builder::*;
use kiln_errors::Error;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// One recorded `execute_shell` call
#[derive(Debug, Clone)]
pub struct Invocation {
    pub command: Option<Vec<String>>,
    pub cwd: PathBuf,
    pub env: ShellEnv,
    pub prompt: Option<String>,
}

/// A context that records every call and replies with scripted exit codes
pub struct RecordingContext {
    base_env: ShellEnv,
    cmake: Option<PathBuf>,
    exit_codes: RefCell<VecDeque<i32>>,
    pub invocations: RefCell<Vec<Invocation>>,
    pub saved: RefCell<Vec<PathBuf>>,
}

impl RecordingContext {
    pub fn new(cmake: Option<PathBuf>) -> Self {
        Self {
            base_env: ShellEnv::new(),
            cmake,
            exit_codes: RefCell::new(VecDeque::new()),
            invocations: RefCell::new(Vec::new()),
            saved: RefCell::new(Vec::new()),
        }
    }

    /// Exit codes for the next calls, in order; further calls exit 0
    pub fn with_exit_codes(self, codes: &[i32]) -> Self {
        self.exit_codes.borrow_mut().extend(codes);
        self
    }

    pub fn with_env(mut self, key: &str, value: &str) -> Self {
        self.base_env.set(key, value);
        self
    }

    pub fn commands(&self) -> Vec<Vec<String>> {
        self.invocations
            .borrow()
            .iter()
            .filter_map(|i| i.command.clone())
            .collect()
    }
}

impl ResolvedContext for RecordingContext {
    fn execute_shell(&self, request: &ShellRequest<'_>) -> Result<i32, Error> {
        let mut env = self.base_env.clone();
        (request.actions)(&mut env);

        self.invocations.borrow_mut().push(Invocation {
            command: request.command.map(<[String]>::to_vec),
            cwd: request.cwd.to_path_buf(),
            env,
            prompt: request.prompt.map(str::to_string),
        });

        Ok(self.exit_codes.borrow_mut().pop_front().unwrap_or(0))
    }

    fn which(&self, name: &str) -> Option<PathBuf> {
        (name == "cmake").then(|| self.cmake.clone()).flatten()
    }

    fn environment(&self) -> ShellEnv {
        self.base_env.clone()
    }

    fn save(&self, path: &Path) -> Result<(), Error> {
        std::fs::write(path, "{}").map_err(|e| Error::io_with_path(&e, path))?;
        self.saved.borrow_mut().push(path.to_path_buf());
        Ok(())
    }
}

/// Create an empty executable-looking file to stand in for cmake
pub fn fake_cmake(dir: &Path) -> PathBuf {
    let path = dir.join("cmake");
    std::fs::write(&path, "").unwrap();
    path
}

pub fn package() -> DeveloperPackage {
    DeveloperPackage {
        name: "foo".to_string(),
        version: "1.0.0".to_string(),
        description: Some("Foo library".to_string()),
        requires: vec!["bar-2".to_string()],
        variants: vec![
            vec!["python-3.10".to_string()],
            vec!["python-3.11".to_string()],
        ],
    }
}

pub fn injector(root: &Path) -> InjectorSettings {
    InjectorSettings {
        cmake_files_dir: root.join("cmake_files"),
        template_files_dir: root.join("template_files"),
        install_pyc: true,
        thread_count: 4,
    }
}

pub fn catalog() -> GeneratorCatalog {
    GeneratorCatalog::from_help_output(
        "Generators\n* Unix Makefiles = Generates makefiles.\n  Ninja = Generates ninja files.\n",
    )
}
