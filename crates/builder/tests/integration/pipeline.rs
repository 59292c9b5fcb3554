//! Pipeline phase sequencing tests

use super::support::*;
use kiln_builder::*;
use kiln_config::CMakeSettings;
use kiln_errors::{BuildError, Error};
use kiln_events::{AppEvent, BuildEvent, BuildPhase};
use kiln_types::{BuildType, HostPlatform};
use std::path::PathBuf;
use tempfile::tempdir;

struct Fixture {
    _root: tempfile::TempDir,
    working_dir: PathBuf,
    cmake: PathBuf,
    injector: InjectorSettings,
}

fn fixture() -> Fixture {
    let root = tempdir().unwrap();
    let working_dir = root.path().join("src");
    std::fs::create_dir_all(&working_dir).unwrap();
    let cmake = fake_cmake(root.path());
    let injector = injector(root.path());
    Fixture {
        working_dir,
        cmake,
        injector,
        _root: root,
    }
}

fn settings(make_binary: Option<&str>) -> CMakeSettings {
    CMakeSettings {
        cmake_args: vec!["-Wno-dev".to_string()],
        make_binary: make_binary.map(str::to_string),
        ..CMakeSettings::default()
    }
}

fn pipeline(fx: &Fixture, settings: CMakeSettings, options: BuildOptions) -> BuildPipeline {
    let options = BuildOptions {
        working_dir: fx.working_dir.clone(),
        launcher: PathBuf::from("/usr/bin/kiln"),
        ..options
    };
    BuildPipeline::for_platform(
        settings,
        &catalog(),
        fx.injector.clone(),
        options,
        HostPlatform::Linux,
    )
    .unwrap()
}

fn request<'a>(variant: &'a Variant, install: bool) -> BuildRequest<'a> {
    BuildRequest {
        variant,
        build_path: PathBuf::from("build"),
        install_path: PathBuf::from("/opt/packages/foo/1.0.0"),
        install,
        build_type: BuildType::Local,
    }
}

#[test]
fn test_configure_build_install() {
    let fx = fixture();
    let package = package();
    let variant = package.get_variant(1).unwrap();
    let context = RecordingContext::new(Some(fx.cmake.clone()));

    let result = pipeline(&fx, settings(None), BuildOptions::default())
        .build(&context, &package, &request(&variant, true))
        .unwrap();

    assert!(result.success);
    assert_eq!(result.state, PipelineState::Done);
    assert_eq!(result.reached, PipelineState::Installed);
    assert_eq!(result.build_env_script, None);
    assert_eq!(
        result.phases,
        vec![BuildPhase::Configure, BuildPhase::Build, BuildPhase::Install]
    );

    let build_path = fx.working_dir.join("build");
    assert!(build_path.is_dir());

    let commands = context.commands();
    let cmake = fx.cmake.display().to_string();
    let build_dir = build_path.display().to_string();

    assert_eq!(commands[0][0], cmake);
    assert_eq!(commands[0][1], "-S");
    assert_eq!(commands[0][2], fx.working_dir.display().to_string());
    assert_eq!(commands[0][3], "-Wno-dev");
    assert!(commands[0].contains(&"-DCMAKE_INSTALL_PREFIX=/opt/packages/foo/1.0.0".to_string()));
    assert!(commands[0].contains(&"-DKILN_BUILD_INSTALL=1".to_string()));
    assert!(!commands[0].contains(&"-G".to_string()));

    assert_eq!(
        commands[1],
        vec![cmake.clone(), "--build".to_string(), build_dir.clone(), "--target".to_string(), "all".to_string()]
    );
    assert_eq!(
        commands[2],
        vec![cmake, "--build".to_string(), build_dir, "--target".to_string(), "install".to_string()]
    );

    for invocation in context.invocations.borrow().iter() {
        assert_eq!(invocation.cwd, build_path);
        assert_eq!(invocation.env.get("KILN_BUILD_ENV"), Some("1"));
        assert_eq!(invocation.env.get("KILN_BUILD_VARIANT_INDEX"), Some("1"));
        assert_eq!(invocation.env.get("KILN_BUILD_TYPE"), Some("local"));
    }
}

#[test]
fn test_module_path_includes_macro_dir() {
    let fx = fixture();
    let package = package();
    let variant = package.get_variant(0).unwrap();
    let context = RecordingContext::new(Some(fx.cmake.clone()))
        .with_env("CMAKE_MODULE_PATH", "/usr/share/cmake");

    pipeline(&fx, settings(None), BuildOptions::default())
        .build(&context, &package, &request(&variant, false))
        .unwrap();

    let macros = fx.injector.cmake_files_dir.display().to_string();
    let expected = format!("-DCMAKE_MODULE_PATH=/usr/share/cmake;{macros}");
    assert!(context.commands()[0].contains(&expected));
}

#[test]
fn test_configure_failure_stops_pipeline() {
    let fx = fixture();
    let package = package();
    let variant = package.get_variant(0).unwrap();
    let context = RecordingContext::new(Some(fx.cmake.clone())).with_exit_codes(&[1]);

    let result = pipeline(&fx, settings(None), BuildOptions::default())
        .build(&context, &package, &request(&variant, true))
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.state, PipelineState::Failed);
    assert_eq!(result.reached, PipelineState::Init);
    assert_eq!(result.phases, vec![BuildPhase::Configure]);
    assert_eq!(context.invocations.borrow().len(), 1);
}

#[test]
fn test_build_failure_skips_install() {
    let fx = fixture();
    let package = package();
    let variant = package.get_variant(0).unwrap();
    let context = RecordingContext::new(Some(fx.cmake.clone())).with_exit_codes(&[0, 2]);

    let result = pipeline(&fx, settings(None), BuildOptions::default())
        .build(&context, &package, &request(&variant, true))
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.reached, PipelineState::Configured);
    assert_eq!(result.phases, vec![BuildPhase::Configure, BuildPhase::Build]);
    assert_eq!(context.invocations.borrow().len(), 2);
}

#[test]
fn test_install_failure_is_reported() {
    let fx = fixture();
    let package = package();
    let variant = package.get_variant(0).unwrap();
    let context = RecordingContext::new(Some(fx.cmake.clone())).with_exit_codes(&[0, 0, 5]);

    let result = pipeline(&fx, settings(None), BuildOptions::default())
        .build(&context, &package, &request(&variant, true))
        .unwrap();

    assert!(!result.success);
    assert_eq!(result.state, PipelineState::Failed);
    assert_eq!(result.reached, PipelineState::Built);
    assert_eq!(result.phases.len(), 3);
}

#[test]
fn test_no_install_runs_two_phases() {
    let fx = fixture();
    let package = package();
    let variant = package.get_variant(0).unwrap();
    let context = RecordingContext::new(Some(fx.cmake.clone()));

    let result = pipeline(&fx, settings(Some("make")), BuildOptions::default())
        .build(&context, &package, &request(&variant, false))
        .unwrap();

    assert!(result.success);
    assert_eq!(result.reached, PipelineState::Built);
    assert_eq!(result.phases, vec![BuildPhase::Configure, BuildPhase::Build]);
    assert_eq!(context.commands()[1], vec!["make", "-j4"]);
}

#[test]
fn test_install_skipped_when_child_args_install() {
    let fx = fixture();
    let package = package();
    let variant = package.get_variant(0).unwrap();
    let context = RecordingContext::new(Some(fx.cmake.clone()));
    let options = BuildOptions {
        child_build_args: vec!["install".to_string()],
        ..BuildOptions::default()
    };

    let result = pipeline(&fx, settings(Some("make")), options)
        .build(&context, &package, &request(&variant, true))
        .unwrap();

    assert!(result.success);
    assert_eq!(result.phases, vec![BuildPhase::Configure, BuildPhase::Build]);
    assert_eq!(context.commands()[1], vec!["make", "-j4", "install"]);
}

#[test]
fn test_write_build_scripts_defers_to_user() {
    let fx = fixture();
    let package = package();
    let variant = package.get_variant(1).unwrap();
    let context = RecordingContext::new(Some(fx.cmake.clone()));
    let options = BuildOptions {
        write_build_scripts: true,
        ..BuildOptions::default()
    };

    let result = pipeline(&fx, settings(None), options)
        .build(&context, &package, &request(&variant, true))
        .unwrap();

    let build_path = fx.working_dir.join("build");
    assert!(result.success);
    assert_eq!(result.state, PipelineState::Done);
    assert_eq!(result.reached, PipelineState::Configured);
    assert_eq!(result.phases, vec![BuildPhase::Configure]);
    assert_eq!(result.build_env_script, Some(build_path.join(BUILD_ENV_SCRIPT)));
    assert_eq!(*context.saved.borrow(), vec![build_path.join(CONTEXT_FILE)]);

    let script = std::fs::read_to_string(build_path.join(BUILD_ENV_SCRIPT)).unwrap();
    assert!(script.starts_with("#!/bin/sh\nexec /usr/bin/kiln build-env"));
    assert!(script.contains("--variant-index 1"));
    assert!(script.contains("--install "));

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = std::fs::metadata(build_path.join(BUILD_ENV_SCRIPT))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}

#[test]
fn test_build_env_script_reuses_config_file() {
    let fx = fixture();
    let package = package();
    let variant = package.get_variant(0).unwrap();
    let context = RecordingContext::new(Some(fx.cmake.clone()));
    let config_path = fx.working_dir.join("kiln.toml");
    let options = BuildOptions {
        write_build_scripts: true,
        config_path: Some(config_path.clone()),
        ..BuildOptions::default()
    };

    let result = pipeline(&fx, settings(None), options)
        .build(&context, &package, &request(&variant, false))
        .unwrap();

    let script = std::fs::read_to_string(result.build_env_script.unwrap()).unwrap();
    let expected = format!(
        "exec /usr/bin/kiln --config {} build-env ",
        kiln_builder::resume::shell_quote(&config_path.display().to_string())
    );
    assert!(script.contains(&expected), "{script}");
}

#[test]
fn test_explicit_generator_and_central_compat() {
    let fx = fixture();
    let package = package();
    let variant = package.get_variant(0).unwrap();
    let context = RecordingContext::new(Some(fx.cmake.clone()));
    let options = BuildOptions {
        generator: Some("Ninja".to_string()),
        central_compat: true,
        ..BuildOptions::default()
    };

    let mut request = request(&variant, true);
    request.build_type = BuildType::Central;

    pipeline(&fx, settings(None), options)
        .build(&context, &package, &request)
        .unwrap();

    let configure = &context.commands()[0];
    let tail = &configure[configure.len() - 3..];
    assert_eq!(tail, &["-G", "Ninja", "-DCENTRAL=1"]);
}

#[test]
fn test_central_compat_ignored_for_local_builds() {
    let fx = fixture();
    let package = package();
    let variant = package.get_variant(0).unwrap();
    let context = RecordingContext::new(Some(fx.cmake.clone()));
    let options = BuildOptions {
        central_compat: true,
        ..BuildOptions::default()
    };

    pipeline(&fx, settings(None), options)
        .build(&context, &package, &request(&variant, false))
        .unwrap();

    assert!(!context.commands()[0].contains(&"-DCENTRAL=1".to_string()));
}

#[test]
fn test_missing_tool_fails_before_any_phase() {
    let fx = fixture();
    let package = package();
    let variant = package.get_variant(0).unwrap();
    let context = RecordingContext::new(None);
    let settings = CMakeSettings {
        cmake_binary: Some(PathBuf::from("/nonexistent/cmake")),
        ..CMakeSettings::default()
    };

    let err = pipeline(&fx, settings, BuildOptions::default())
        .build(&context, &package, &request(&variant, false))
        .unwrap_err();

    assert!(matches!(err, Error::Build(BuildError::ToolMissing { .. })));
    assert!(context.invocations.borrow().is_empty());
}

#[test]
fn test_phase_events() {
    let fx = fixture();
    let package = package();
    let variant = package.get_variant(0).unwrap();
    let context = RecordingContext::new(Some(fx.cmake.clone())).with_exit_codes(&[0, 3]);
    let (tx, mut rx) = kiln_events::channel();

    pipeline(&fx, settings(None), BuildOptions::default())
        .with_event_sender(tx)
        .build(&context, &package, &request(&variant, false))
        .unwrap();

    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }

    assert!(matches!(
        events[0],
        AppEvent::Build(BuildEvent::PhaseStarted {
            phase: BuildPhase::Configure,
            ..
        })
    ));
    assert!(matches!(
        events[1],
        AppEvent::Build(BuildEvent::PhaseCompleted {
            phase: BuildPhase::Configure,
            ..
        })
    ));
    assert!(matches!(
        events.last(),
        Some(AppEvent::Build(BuildEvent::PhaseFailed {
            phase: BuildPhase::Build,
            exit_code: 3,
            ..
        }))
    ));
}
