//! Command line interface definition

use clap::{Args, Parser, Subcommand};
use kiln_types::{BuildTarget, ColorChoice};
use std::path::PathBuf;

/// kiln - build developer packages with CMake
#[derive(Parser)]
#[command(name = "kiln")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build developer packages with CMake")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to a file
    #[arg(long, global = true)]
    pub debug: bool,

    /// Color output control
    #[arg(long, global = true, value_enum)]
    pub color: Option<ColorChoice>,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Configure, build and optionally install a package
    #[command(alias = "b")]
    Build(BuildArgs),

    /// List the generators supported by the installed cmake
    #[command(alias = "gen")]
    Generators,

    /// Enter the build environment of a configured build
    #[command(name = "build-env", hide = true)]
    BuildEnv(BuildEnvArgs),
}

#[derive(Args)]
pub struct BuildArgs {
    /// Package source directory (defaults to the current directory)
    #[arg(long, value_name = "DIR")]
    pub working_dir: Option<PathBuf>,

    /// Build target
    #[arg(long = "build-target", visible_alias = "bt", value_enum)]
    pub build_target: Option<BuildTarget>,

    /// CMake generator name or legacy alias (eclipse, make, nmake, ...)
    #[arg(long = "cmake-build-system", visible_alias = "bs", value_name = "GENERATOR")]
    pub build_system: Option<String>,

    /// Build directory, relative to the working directory unless absolute
    #[arg(long, value_name = "DIR", default_value = "build")]
    pub build_path: PathBuf,

    /// Install after building
    #[arg(short, long)]
    pub install: bool,

    /// Install root (defaults to the local or release packages path)
    #[arg(long, value_name = "DIR")]
    pub install_path: Option<PathBuf>,

    /// Build for central release instead of local use
    #[arg(long)]
    pub central: bool,

    /// Only build the variant with this index
    #[arg(long = "variant", value_name = "INDEX")]
    pub variants: Vec<usize>,

    /// Stop after configure and write a build-env script
    #[arg(short, long)]
    pub scripts: bool,

    /// Number of parallel build jobs (0=auto)
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Extra argument passed to cmake at configure time
    #[arg(long = "cmake-arg", value_name = "ARG", allow_hyphen_values = true)]
    pub cmake_args: Vec<String>,

    /// Arguments passed to the underlying build tool
    #[arg(last = true, value_name = "CHILD_ARGS")]
    pub child_args: Vec<String>,
}

#[derive(Args)]
pub struct BuildEnvArgs {
    #[arg(long, value_name = "DIR")]
    pub working_dir: PathBuf,

    #[arg(long, value_name = "DIR")]
    pub build_path: PathBuf,

    #[arg(long, value_name = "INDEX")]
    pub variant_index: usize,

    #[arg(long)]
    pub install: bool,

    #[arg(long, value_name = "DIR")]
    pub install_path: Option<PathBuf>,
}
