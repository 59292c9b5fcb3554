//! Build system error types

use std::borrow::Cow;

use crate::UserFacingError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum BuildError {
    #[error("could not find {tool} binary")]
    ToolNotFound { tool: String },

    #[error("{tool} binary does not exist: {path}")]
    ToolMissing { tool: String, path: String },

    #[error("unsupported generator '{name}' (available: {})", available.join(", "))]
    GeneratorUnsupported {
        name: String,
        available: Vec<String>,
    },

    #[error("generator '{generator}' is only available on {required} (current platform: {current})")]
    PlatformRestriction {
        generator: String,
        required: String,
        current: String,
    },

    #[error("no generators could be read from `{tool} --help`")]
    ParseDegraded { tool: String },

    #[error("package {package} has no variant with index {index}")]
    VariantNotFound { package: String, index: usize },

    #[error("no package definition found in {path}")]
    ManifestNotFound { path: String },

    #[error("invalid package definition {path}: {message}")]
    ManifestInvalid { path: String, message: String },

    #[error("invalid build environment snapshot {path}: {message}")]
    SnapshotInvalid { path: String, message: String },

    #[error("failed to launch {command}: {message}")]
    ShellFailed { command: String, message: String },
}

impl UserFacingError for BuildError {
    fn user_message(&self) -> Cow<'_, str> {
        Cow::Owned(self.to_string())
    }

    fn user_hint(&self) -> Option<&'static str> {
        match self {
            Self::ToolNotFound { .. } | Self::ToolMissing { .. } => {
                Some("Install cmake or set `cmake_binary` in the [cmake] config section.")
            }
            Self::GeneratorUnsupported { .. } => {
                Some("Run `kiln generators` to list the generators your cmake supports.")
            }
            Self::PlatformRestriction { .. } => {
                Some("Pick a generator that is available on this platform.")
            }
            Self::ParseDegraded { .. } => {
                Some("The platform default generator will be used by cmake.")
            }
            Self::ManifestNotFound { .. } | Self::ManifestInvalid { .. } => {
                Some("Add or fix package.toml in the source directory.")
            }
            Self::SnapshotInvalid { .. } => {
                Some("Re-run the build with --scripts to regenerate the build environment.")
            }
            _ => None,
        }
    }

    fn is_retryable(&self) -> bool {
        false
    }

    fn user_code(&self) -> Option<&'static str> {
        let code = match self {
            Self::ToolNotFound { .. } => "build.tool_not_found",
            Self::ToolMissing { .. } => "build.tool_missing",
            Self::GeneratorUnsupported { .. } => "build.generator_unsupported",
            Self::PlatformRestriction { .. } => "build.platform_restriction",
            Self::ParseDegraded { .. } => "build.parse_degraded",
            Self::VariantNotFound { .. } => "build.variant_not_found",
            Self::ManifestNotFound { .. } => "build.manifest_not_found",
            Self::ManifestInvalid { .. } => "build.manifest_invalid",
            Self::SnapshotInvalid { .. } => "build.snapshot_invalid",
            Self::ShellFailed { .. } => "build.shell_failed",
        };
        Some(code)
    }
}
