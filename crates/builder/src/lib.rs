#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]
//! CMake build-system adapter for kiln
//!
//! This crate drives cmake for one package variant at a time: it discovers
//! which generators the installed cmake supports, assembles the configure,
//! build and install command lines, runs them inside a resolved context with
//! the standard build variables injected, and can stop after configure to
//! leave a `build-env` script that re-enters the build environment later.

pub mod commands;
pub mod context;
pub mod environment;
pub mod generators;
pub mod package;
pub mod pipeline;
pub mod resume;
pub mod tool;

pub use commands::{
    build_command, configure_command, install_command, BuildInputs, ConfigureInputs,
};
pub use context::{ContextLoader, ResolvedContext, ShellRequest};
pub use environment::{
    BuildActions, EnvironmentSnapshot, InjectorSettings, ShellEnv, SnapshotLoader,
};
pub use generators::{
    legacy_generator, parse_generator_listing, Generator, GeneratorCatalog, LEGACY_GENERATORS,
};
pub use package::{DeveloperPackage, PackageLoader, TomlPackageLoader, Variant};
pub use pipeline::{
    BuildOptions, BuildPipeline, BuildRequest, PipelineResult, PipelineState, BUILD_SYSTEM_NAME,
    CHILD_BUILD_SYSTEM,
};
pub use resume::{ResumableBuildDescriptor, ResumeSettings, BUILD_ENV_SCRIPT, CONTEXT_FILE};
pub use tool::find_cmake;
