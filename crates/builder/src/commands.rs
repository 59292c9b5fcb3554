//! Command line assembly for the configure, build and install phases
//!
//! Everything here is a pure function of its inputs. Argument order is part of
//! the contract: projects and wrapper scripts grep these command lines.

use kiln_config::CMakeSettings;
use kiln_types::{BuildTarget, BuildType, HostPlatform};
use std::path::Path;

/// Inputs for the configure phase
#[derive(Debug, Clone)]
pub struct ConfigureInputs<'a> {
    pub tool: &'a Path,
    pub working_dir: &'a Path,
    pub settings: &'a CMakeSettings,
    /// Extra configure arguments from the command line
    pub extra_args: &'a [String],
    pub install_path: &'a Path,
    pub module_path: &'a str,
    /// Generator resolved from an explicit selection; `None` leaves cmake on
    /// its platform default
    pub generator: Option<&'a str>,
    pub build_target: BuildTarget,
    pub build_type: BuildType,
    pub install: bool,
    pub central_compat: bool,
}

/// Inputs for the build and install phases
#[derive(Debug, Clone)]
pub struct BuildInputs<'a> {
    pub tool: &'a Path,
    pub build_path: &'a Path,
    pub make_binary: Option<&'a str>,
    /// Arguments forwarded to the underlying build tool
    pub child_args: &'a [String],
    pub thread_count: usize,
    pub platform: HostPlatform,
}

/// Assemble the configure command.
#[must_use]
pub fn configure_command(inputs: &ConfigureInputs<'_>) -> Vec<String> {
    let mut cmd = vec![
        inputs.tool.display().to_string(),
        "-S".to_string(),
        inputs.working_dir.display().to_string(),
    ];

    cmd.extend(inputs.settings.cmake_args.iter().cloned());
    cmd.extend(inputs.extra_args.iter().cloned());

    cmd.push(format!(
        "-DCMAKE_INSTALL_PREFIX={}",
        inputs.install_path.display()
    ));
    cmd.push(format!(
        "-DCMAKE_MODULE_PATH={}",
        inputs.module_path.replace('\\', "/")
    ));
    cmd.push(format!("-DCMAKE_BUILD_TYPE={}", inputs.build_target));
    cmd.push(format!("-DKILN_BUILD_TYPE={}", inputs.build_type));
    cmd.push(format!(
        "-DKILN_BUILD_INSTALL={}",
        u8::from(inputs.install)
    ));

    if let Some(generator) = inputs.generator {
        cmd.push("-G".to_string());
        cmd.push(generator.to_string());
    }

    if inputs.central_compat {
        cmd.push("-DCENTRAL=1".to_string());
    }

    cmd
}

/// Assemble the build command.
///
/// `full_build` appends the aggregate target so every target is verified,
/// which only applies when cmake drives the build itself.
#[must_use]
pub fn build_command(inputs: &BuildInputs<'_>, full_build: bool) -> Vec<String> {
    let Some(make) = inputs.make_binary else {
        let mut cmd = vec![
            inputs.tool.display().to_string(),
            "--build".to_string(),
            inputs.build_path.display().to_string(),
        ];
        cmd.extend(inputs.child_args.iter().cloned());

        if full_build {
            let target = if inputs.platform.is_windows() {
                "ALL_BUILD"
            } else {
                "all"
            };
            cmd.push("--target".to_string());
            cmd.push(target.to_string());
        }
        return cmd;
    };

    let mut cmd = vec![make.to_string()];

    let explicit_jobs = inputs.child_args.iter().any(|arg| arg.starts_with("-j"));
    if !is_nmake(make) && !explicit_jobs {
        cmd.push(format!("-j{}", inputs.thread_count));
    }

    cmd.extend(inputs.child_args.iter().cloned());
    cmd
}

/// Assemble the install command, or `None` when the build command already
/// installs.
#[must_use]
pub fn install_command(inputs: &BuildInputs<'_>) -> Option<Vec<String>> {
    let mut cmd = build_command(inputs, false);
    if cmd.iter().any(|arg| arg == "install") {
        return None;
    }

    if inputs.make_binary.is_none() {
        cmd.push("--target".to_string());
    }
    cmd.push("install".to_string());
    Some(cmd)
}

/// nmake has no parallel jobs flag
fn is_nmake(make: &str) -> bool {
    Path::new(make)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .is_some_and(|stem| stem.eq_ignore_ascii_case("nmake"))
}

/// Render a command for logs and events
#[must_use]
pub fn display_command(cmd: &[String]) -> String {
    cmd.iter()
        .map(|arg| {
            if arg.contains(char::is_whitespace) {
                format!("\"{arg}\"")
            } else {
                arg.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
