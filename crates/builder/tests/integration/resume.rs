//! Resuming a configured build in an interactive shell

use super::support::*;
use kiln_builder::*;
use kiln_errors::{BuildError, Error};
use kiln_events::{AppEvent, BuildEvent};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use tempfile::tempdir;

/// Hands out a shared recording context regardless of path
struct SharedLoader {
    context: Rc<RecordingContext>,
    requested: std::cell::RefCell<Vec<PathBuf>>,
}

struct SharedContext(Rc<RecordingContext>);

impl ResolvedContext for SharedContext {
    fn execute_shell(&self, request: &ShellRequest<'_>) -> Result<i32, Error> {
        self.0.execute_shell(request)
    }

    fn which(&self, name: &str) -> Option<PathBuf> {
        self.0.which(name)
    }

    fn environment(&self) -> ShellEnv {
        self.0.environment()
    }

    fn save(&self, path: &Path) -> Result<(), Error> {
        self.0.save(path)
    }
}

impl ContextLoader for SharedLoader {
    fn load(&self, path: &Path) -> Result<Box<dyn ResolvedContext>, Error> {
        self.requested.borrow_mut().push(path.to_path_buf());
        Ok(Box::new(SharedContext(Rc::clone(&self.context))))
    }
}

struct FixedPackage(DeveloperPackage);

impl PackageLoader for FixedPackage {
    fn load(&self, _working_dir: &Path) -> Result<DeveloperPackage, Error> {
        Ok(self.0.clone())
    }
}

fn descriptor(build_path: &Path, variant_index: usize) -> ResumableBuildDescriptor {
    ResumableBuildDescriptor {
        working_dir: PathBuf::from("/src/foo"),
        build_path: build_path.to_path_buf(),
        variant_index,
        install: true,
        install_path: Some(PathBuf::from("/opt/packages/foo/1.0.0")),
        config_path: None,
    }
}

fn resume_settings(root: &Path) -> ResumeSettings {
    ResumeSettings {
        injector: injector(root),
        prompt: "BUILD>".to_string(),
    }
}

#[test]
fn test_resume_returns_shell_exit_code() {
    let dir = tempdir().unwrap();
    let loader = SharedLoader {
        context: Rc::new(RecordingContext::new(None).with_exit_codes(&[7])),
        requested: std::cell::RefCell::default(),
    };
    let (tx, mut rx) = kiln_events::channel();

    let code = descriptor(dir.path(), 1)
        .resume(
            &loader,
            &FixedPackage(package()),
            &resume_settings(dir.path()),
            Some(&tx),
        )
        .unwrap();

    assert_eq!(code, 7);
    assert_eq!(*loader.requested.borrow(), vec![dir.path().join(CONTEXT_FILE)]);

    let invocations = loader.context.invocations.borrow();
    assert_eq!(invocations.len(), 1);

    let shell = &invocations[0];
    assert!(shell.command.is_none());
    assert_eq!(shell.cwd, dir.path());
    assert_eq!(shell.prompt.as_deref(), Some("BUILD>"));
    assert_eq!(shell.env.get("KILN_BUILD_TYPE"), Some("local"));
    assert_eq!(shell.env.get("KILN_BUILD_INSTALL"), Some("1"));
    assert_eq!(shell.env.get("KILN_BUILD_VARIANT_INDEX"), Some("1"));
    assert_eq!(shell.env.get("KILN_BUILD_VARIANT_SUBPATH"), Some("python-3.11"));
    assert_eq!(
        shell.env.get("KILN_BUILD_INSTALL_PATH"),
        Some("/opt/packages/foo/1.0.0")
    );

    assert!(matches!(
        rx.try_recv().unwrap(),
        AppEvent::Build(BuildEvent::ShellResumed { variant: 1, .. })
    ));
}

#[test]
fn test_resume_unknown_variant() {
    let dir = tempdir().unwrap();
    let loader = SharedLoader {
        context: Rc::new(RecordingContext::new(None)),
        requested: std::cell::RefCell::default(),
    };

    let err = descriptor(dir.path(), 9)
        .resume(
            &loader,
            &FixedPackage(package()),
            &resume_settings(dir.path()),
            None,
        )
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Build(BuildError::VariantNotFound { index: 9, .. })
    ));
    assert!(loader.context.invocations.borrow().is_empty());
}

#[test]
fn test_resume_without_saved_context() {
    let dir = tempdir().unwrap();

    let result = descriptor(dir.path(), 0).resume(
        &SnapshotLoader,
        &FixedPackage(package()),
        &resume_settings(dir.path()),
        None,
    );

    assert!(matches!(
        result,
        Err(Error::Build(BuildError::SnapshotInvalid { .. }))
    ));
}

#[test]
fn test_persist_then_resume_from_disk() {
    let dir = tempdir().unwrap();
    let working_dir = dir.path().join("src");
    let build_path = working_dir.join("build");
    std::fs::create_dir_all(&build_path).unwrap();
    std::fs::write(
        working_dir.join("package.toml"),
        "name = \"foo\"\nversion = \"1.0.0\"\n",
    )
    .unwrap();

    let snapshot = EnvironmentSnapshot::new("/bin/sh", ShellEnv::new());
    snapshot.save(&build_path.join(CONTEXT_FILE)).unwrap();

    let descriptor = ResumableBuildDescriptor {
        working_dir,
        build_path: build_path.clone(),
        variant_index: 0,
        install: false,
        install_path: None,
        config_path: None,
    };
    let script = descriptor.persist(Path::new("/usr/bin/kiln")).unwrap();
    assert_eq!(script, build_path.join(BUILD_ENV_SCRIPT));

    // the interactive shell itself is not run here; loading must succeed
    let context = SnapshotLoader.load(&descriptor.context_path()).unwrap();
    assert_eq!(context.environment(), ShellEnv::new());
    let package = TomlPackageLoader.load(&descriptor.working_dir).unwrap();
    assert!(package.get_variant(descriptor.variant_index).is_ok());
}
