//! Locating the cmake executable

use crate::context::ResolvedContext;
use kiln_config::CMakeSettings;
use kiln_errors::{BuildError, Error};
use std::path::{Path, PathBuf};

/// Executable name searched for when no binary is configured
pub const CMAKE: &str = "cmake";

/// Find the cmake executable to run.
///
/// An explicitly configured binary wins. Otherwise the context's `PATH` is
/// searched, then the host `PATH`.
///
/// # Errors
///
/// Returns `ToolMissing` when the configured binary does not exist and
/// `ToolNotFound` when no cmake is found on either `PATH`.
pub fn find_cmake(
    settings: &CMakeSettings,
    context: Option<&dyn ResolvedContext>,
) -> Result<PathBuf, Error> {
    if let Some(binary) = settings
        .cmake_binary
        .as_ref()
        .filter(|binary| !binary.as_os_str().is_empty())
    {
        return locate(binary).ok_or_else(|| {
            BuildError::ToolMissing {
                tool: CMAKE.to_string(),
                path: binary.display().to_string(),
            }
            .into()
        });
    }

    search_path(context, |name| which::which(name).ok())
}

/// Search the context's `PATH` first, then `host`
fn search_path(
    context: Option<&dyn ResolvedContext>,
    host: impl FnOnce(&str) -> Option<PathBuf>,
) -> Result<PathBuf, Error> {
    context
        .and_then(|context| context.which(CMAKE))
        .and_then(|found| locate(&found))
        .or_else(|| host(CMAKE))
        .ok_or_else(|| {
            BuildError::ToolNotFound {
                tool: CMAKE.to_string(),
            }
            .into()
        })
}

fn locate(candidate: &Path) -> Option<PathBuf> {
    if candidate.is_absolute() {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    which::which(candidate).ok()
}
