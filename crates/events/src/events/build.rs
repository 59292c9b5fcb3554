use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// One external-process step of the build pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildPhase {
    Configure,
    Build,
    Install,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Configure => "configure",
            Self::Build => "build",
            Self::Install => "install",
        })
    }
}

/// Build-specific events for the event system
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BuildEvent {
    /// Generator listing parsed from the tool's help output
    GeneratorsDiscovered {
        tool: PathBuf,
        count: usize,
        default: Option<String>,
    },

    /// Help output could not be read or had no generator section
    GeneratorListingDegraded { tool: PathBuf, reason: String },

    /// A phase is about to launch
    PhaseStarted {
        package: String,
        variant: usize,
        phase: BuildPhase,
        command: String,
        working_dir: PathBuf,
    },

    /// A phase exited with status zero
    PhaseCompleted {
        package: String,
        variant: usize,
        phase: BuildPhase,
    },

    /// A phase exited with a nonzero status
    PhaseFailed {
        package: String,
        variant: usize,
        phase: BuildPhase,
        exit_code: i32,
    },

    /// Configure finished and a build-env script was written instead of building
    BuildEnvWritten {
        package: String,
        variant: usize,
        script: PathBuf,
    },

    /// An interactive build shell is being entered
    ShellResumed {
        package: String,
        variant: usize,
        build_path: PathBuf,
    },
}
