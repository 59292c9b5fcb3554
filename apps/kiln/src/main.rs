//! kiln - build developer packages with CMake
//!
//! This is the CLI application. It loads configuration, wires the event
//! channel to the terminal and the log, and hands the actual work to the
//! builder crate.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{BuildArgs, BuildEnvArgs, Cli, Commands};
use crate::display::{OutputRenderer, VariantOutcome};
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use kiln_builder::{
    find_cmake, BuildOptions, BuildPipeline, BuildRequest, EnvironmentSnapshot, GeneratorCatalog,
    InjectorSettings, PackageLoader, ResolvedContext, ResumableBuildDescriptor, ResumeSettings,
    SnapshotLoader, TomlPackageLoader,
};
use kiln_config::Config;
use kiln_events::{EventEmitter, EventSender};
use kiln_types::{BuildType, ColorChoice};
use std::path::{Path, PathBuf};
use std::process;
use tracing::{error, info};

/// What a command produced, rendered once all events are drained
enum CommandOutput {
    Build(Vec<VariantOutcome>),
    Generators(GeneratorCatalog, PathBuf),
    /// Exit code of an interactive build shell
    Shell(i32),
}

fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    match run(cli) {
        Ok(code) => process::exit(code),
        Err(e) => {
            error!("Application error: {}", e);
            if !json_mode {
                eprintln!("Error: {e}");
            }
            process::exit(1);
        }
    }
}

/// Main application logic, returning the process exit code
fn run(cli: Cli) -> Result<i32, CliError> {
    info!("Starting kiln v{}", env!("CARGO_PKG_VERSION"));

    // Precedence: defaults < config file < environment < CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref())?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global, &cli.command);
    apply_color_choice(config.general.color);

    let (event_sender, event_receiver) = kiln_events::channel();
    let event_thread =
        EventHandler::new(cli.global.json, cli.global.debug).spawn(event_receiver);

    let output = match cli.command {
        Commands::Build(args) => {
            let session = BuildSession {
                config: &config,
                config_path: cli.global.config.as_deref(),
                json: cli.global.json,
                events: &event_sender,
            };
            run_build(&session, args).map(CommandOutput::Build)
        }
        Commands::Generators => {
            list_generators(&config, &event_sender)
                .map(|(catalog, tool)| CommandOutput::Generators(catalog, tool))
        }
        Commands::BuildEnv(args) => {
            enter_build_env(&config, args, &event_sender).map(CommandOutput::Shell)
        }
    };

    // Closing the channel lets the event thread finish
    drop(event_sender);
    if event_thread.join().is_err() {
        error!("event handler thread panicked");
    }

    let renderer = OutputRenderer::new(cli.global.json);
    match output? {
        CommandOutput::Build(outcomes) => {
            renderer.render_build(&outcomes)?;
            let success = outcomes.iter().all(|o| o.result.success);
            info!(success, "Command completed");
            Ok(i32::from(!success))
        }
        CommandOutput::Generators(catalog, tool) => {
            renderer.render_generators(&catalog, &tool)?;
            Ok(0)
        }
        CommandOutput::Shell(code) => Ok(code),
    }
}

/// Process-wide inputs of a `build` invocation
struct BuildSession<'a> {
    config: &'a Config,
    /// `--config` as given on the command line
    config_path: Option<&'a Path>,
    json: bool,
    events: &'a EventSender,
}

/// Build every selected variant of the package in the working directory
fn run_build(
    session: &BuildSession<'_>,
    args: BuildArgs,
) -> Result<Vec<VariantOutcome>, CliError> {
    let BuildSession {
        config,
        config_path,
        json,
        events,
    } = *session;
    let cwd = std::env::current_dir()?;
    let working_dir = absolute(&cwd, args.working_dir.unwrap_or_else(|| cwd.clone()));

    if !BuildPipeline::is_valid_root(&working_dir) {
        return Err(CliError::InvalidArguments(format!(
            "{} does not contain a CMakeLists.txt",
            working_dir.display()
        )));
    }

    let package = TomlPackageLoader.load(&working_dir)?;
    let variants = match args.variants.as_slice() {
        [] => package.variants(),
        selected => selected
            .iter()
            .map(|index| package.get_variant(*index))
            .collect::<Result<Vec<_>, _>>()?,
    };

    let mut context = EnvironmentSnapshot::capture(&config.build.allowed_env_vars);
    if json {
        // stdout carries the result document
        context = context.with_stdout_to_stderr();
    }
    let tool = find_cmake(&config.cmake, Some(&context as &dyn ResolvedContext))?;
    let catalog = GeneratorCatalog::discover(&tool, Some(events));

    let options = BuildOptions {
        working_dir: working_dir.clone(),
        build_target: args.build_target,
        generator: args.build_system,
        build_args: args.cmake_args,
        child_build_args: args.child_args,
        write_build_scripts: args.scripts,
        central_compat: config.compat.central_define_enabled(),
        launcher: std::env::current_exe()?,
        config_path: config_path.map(|path| absolute(&cwd, path.to_path_buf())),
    };
    let pipeline = BuildPipeline::new(
        config.cmake.clone(),
        &catalog,
        InjectorSettings::from_config(config),
        options,
    )?
    .with_event_sender(events.clone());

    if pipeline.generator().is_none() {
        if let Some(default) = catalog.default_generator() {
            events.emit_debug(format!("Using default generator {default}"));
        }
    }

    let build_type = if args.central {
        BuildType::Central
    } else {
        BuildType::Local
    };
    let install_root = args.install_path.unwrap_or_else(|| match build_type {
        BuildType::Local => config.local_packages_path(),
        BuildType::Central => config.release_packages_path(),
    });

    let mut outcomes = Vec::with_capacity(variants.len());
    for variant in &variants {
        let subpath = variant.subpath();
        let build_path = join_subpath(absolute(&working_dir, args.build_path.clone()), &subpath);
        let install_path = join_subpath(
            install_root.join(&package.name).join(&package.version),
            &subpath,
        );

        let operation = format!("{} {} [{}]", package.name, package.version, variant.index);
        events.emit_operation_started(operation.clone());

        let result = pipeline.build(
            &context,
            &package,
            &BuildRequest {
                variant,
                build_path: build_path.clone(),
                install_path,
                install: args.install,
                build_type,
            },
        )?;

        events.emit_operation_completed(operation, result.success);
        let success = result.success;
        outcomes.push(VariantOutcome {
            package: package.name.clone(),
            variant: variant.index,
            build_path,
            result,
        });

        if !success {
            break;
        }
    }

    Ok(outcomes)
}

/// Discover and list the generators of the configured cmake
fn list_generators(
    config: &Config,
    events: &EventSender,
) -> Result<(GeneratorCatalog, PathBuf), CliError> {
    let tool = find_cmake(&config.cmake, None)?;
    let catalog = GeneratorCatalog::discover(&tool, Some(events));
    Ok((catalog, tool))
}

/// Resume a configured build in an interactive shell
fn enter_build_env(
    config: &Config,
    args: BuildEnvArgs,
    events: &EventSender,
) -> Result<i32, CliError> {
    let descriptor = ResumableBuildDescriptor {
        working_dir: args.working_dir,
        build_path: args.build_path,
        variant_index: args.variant_index,
        install: args.install,
        install_path: args.install_path,
        config_path: None,
    };
    let settings = ResumeSettings {
        injector: InjectorSettings::from_config(config),
        prompt: config.build.prompt.clone(),
    };

    Ok(descriptor.resume(&SnapshotLoader, &TomlPackageLoader, &settings, Some(events))?)
}

fn absolute(base: &Path, path: PathBuf) -> PathBuf {
    if path.is_absolute() {
        path
    } else {
        base.join(path)
    }
}

fn join_subpath(path: PathBuf, subpath: &str) -> PathBuf {
    if subpath.is_empty() {
        path
    } else {
        path.join(subpath)
    }
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if debug_enabled {
        // Debug mode: structured JSON logs to file
        let log_dir = kiln_config::logs_dir();
        if let Err(e) = std::fs::create_dir_all(&log_dir) {
            if !json_mode {
                eprintln!("Warning: Failed to create log directory: {e}");
            }
        }

        let log_file = log_dir.join(format!(
            "kiln-{}.log",
            chrono::Utc::now().format("%Y%m%d-%H%M%S")
        ));

        match std::fs::File::create(&log_file) {
            Ok(file) => {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(file)
                    .with_env_filter(
                        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(
                            |_| tracing_subscriber::EnvFilter::new("info,kiln=debug,kiln_builder=debug"),
                        ),
                    )
                    .init();

                if !json_mode {
                    eprintln!("Debug logging enabled: {}", log_file.display());
                }
                return;
            }
            Err(e) => {
                if !json_mode {
                    eprintln!("Warning: Failed to create log file: {e}");
                }
            }
        }
    }

    if json_mode {
        // JSON mode: keep stdout clean for the result document
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        // Normal mode: minimal logging to stderr
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("warn,kiln=warn,kiln_builder=warn")
                }),
            )
            .init();
    }
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &cli::GlobalArgs, command: &Commands) {
    if let Some(color) = global.color {
        config.general.color = color;
    }

    if let Commands::Build(BuildArgs {
        jobs: Some(jobs), ..
    }) = command
    {
        config.build.thread_count = *jobs;
    }
}

fn apply_color_choice(choice: ColorChoice) {
    let enabled = match choice {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => return,
    };
    console::set_colors_enabled(enabled);
    console::set_colors_enabled_stderr(enabled);
}
