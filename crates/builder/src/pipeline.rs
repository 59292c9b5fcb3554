//! The configure, build and install pipeline

use crate::commands::{
    build_command, configure_command, display_command, install_command, BuildInputs,
    ConfigureInputs,
};
use crate::context::{ResolvedContext, ShellRequest};
use crate::environment::{BuildActions, InjectorSettings, ShellEnv};
use crate::generators::{ensure_platform_supported, GeneratorCatalog};
use crate::package::{DeveloperPackage, Variant};
use crate::resume::{ResumableBuildDescriptor, CONTEXT_FILE};
use crate::tool::find_cmake;
use kiln_config::CMakeSettings;
use kiln_errors::Error;
use kiln_events::{AppEvent, BuildEvent, BuildPhase, EventEmitter, EventSender};
use kiln_types::{BuildTarget, BuildType, HostPlatform};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of this build system
pub const BUILD_SYSTEM_NAME: &str = "cmake";
/// Build system driven by the generated project files
pub const CHILD_BUILD_SYSTEM: &str = "make";
/// File that marks a directory as a cmake project root
pub const PROJECT_FILE: &str = "CMakeLists.txt";

/// Per-invocation options, usually taken from the command line
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Source checkout containing `CMakeLists.txt`
    pub working_dir: PathBuf,
    /// Overrides the configured build target
    pub build_target: Option<BuildTarget>,
    /// Overrides the configured generator
    pub generator: Option<String>,
    /// Extra configure arguments
    pub build_args: Vec<String>,
    /// Arguments forwarded to the underlying build tool
    pub child_build_args: Vec<String>,
    /// Stop after configure and leave a `build-env` script behind
    pub write_build_scripts: bool,
    /// Emit `-DCENTRAL=1` for central builds
    pub central_compat: bool,
    /// Executable the `build-env` script calls back into
    pub launcher: PathBuf,
    /// Config file passed back to the launcher on resume
    pub config_path: Option<PathBuf>,
}

/// One variant build
#[derive(Debug, Clone)]
pub struct BuildRequest<'a> {
    pub variant: &'a Variant,
    /// Build directory; relative paths are resolved against the working dir
    pub build_path: PathBuf,
    pub install_path: PathBuf,
    pub install: bool,
    pub build_type: BuildType,
}

/// Where a pipeline run is, or where it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    Init,
    Configured,
    Built,
    Installed,
    Done,
    Failed,
}

/// Outcome of a pipeline run
///
/// A phase that exits nonzero is reported here, not as an `Err`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineResult {
    pub success: bool,
    /// Set when the run stopped after configure and wrote a script
    pub build_env_script: Option<PathBuf>,
    pub state: PipelineState,
    /// Last state reached before the run ended in `state`
    pub reached: PipelineState,
    /// Phases that ran, in order
    pub phases: Vec<BuildPhase>,
}

impl PipelineResult {
    fn failed(reached: PipelineState, phases: Vec<BuildPhase>) -> Self {
        Self {
            success: false,
            build_env_script: None,
            state: PipelineState::Failed,
            reached,
            phases,
        }
    }

    fn done(
        reached: PipelineState,
        phases: Vec<BuildPhase>,
        build_env_script: Option<PathBuf>,
    ) -> Self {
        Self {
            success: true,
            build_env_script,
            state: PipelineState::Done,
            reached,
            phases,
        }
    }
}

/// Drives cmake through configure, build and install for one variant
#[derive(Debug, Clone)]
pub struct BuildPipeline {
    settings: CMakeSettings,
    build_target: BuildTarget,
    generator: Option<String>,
    injector: InjectorSettings,
    options: BuildOptions,
    platform: HostPlatform,
    event_sender: Option<EventSender>,
}

impl EventEmitter for BuildPipeline {
    fn event_sender(&self) -> Option<&EventSender> {
        self.event_sender.as_ref()
    }
}

impl BuildPipeline {
    /// Create a pipeline for the current host.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected generator is unknown or not available
    /// on this platform.
    pub fn new(
        settings: CMakeSettings,
        catalog: &GeneratorCatalog,
        injector: InjectorSettings,
        options: BuildOptions,
    ) -> Result<Self, Error> {
        Self::for_platform(settings, catalog, injector, options, HostPlatform::current())
    }

    /// Create a pipeline for a specific host platform.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected generator is unknown or not available
    /// on `platform`.
    pub fn for_platform(
        settings: CMakeSettings,
        catalog: &GeneratorCatalog,
        injector: InjectorSettings,
        options: BuildOptions,
        platform: HostPlatform,
    ) -> Result<Self, Error> {
        let selected = options
            .generator
            .as_deref()
            .filter(|name| !name.is_empty())
            .or_else(|| settings.generator());

        let generator = selected
            .map(|name| catalog.resolve(name))
            .transpose()?;

        if let Some(generator) = &generator {
            ensure_platform_supported(generator, platform)?;
        }

        let build_target = options.build_target.unwrap_or(settings.build_target);

        Ok(Self {
            settings,
            build_target,
            generator,
            injector,
            options,
            platform,
            event_sender: None,
        })
    }

    #[must_use]
    pub fn with_event_sender(mut self, event_sender: EventSender) -> Self {
        self.event_sender = Some(event_sender);
        self
    }

    /// Whether `path` looks like a cmake project root
    #[must_use]
    pub fn is_valid_root(path: &Path) -> bool {
        path.join(PROJECT_FILE).is_file()
    }

    /// Generator passed as `-G`, if one was selected
    #[must_use]
    pub fn generator(&self) -> Option<&str> {
        self.generator.as_deref()
    }

    #[must_use]
    pub fn build_target(&self) -> BuildTarget {
        self.build_target
    }

    /// Build one variant of `package` inside `context`.
    ///
    /// # Errors
    ///
    /// Returns an error if cmake cannot be found, the build directory cannot
    /// be created, a phase cannot be started, or the resume files cannot be
    /// written. A phase that runs and fails is not an error.
    pub fn build(
        &self,
        context: &dyn ResolvedContext,
        package: &DeveloperPackage,
        request: &BuildRequest<'_>,
    ) -> Result<PipelineResult, Error> {
        let tool = find_cmake(&self.settings, Some(context))?;
        let working_dir = self.options.working_dir.as_path();

        let build_path = if request.build_path.is_absolute() {
            request.build_path.clone()
        } else {
            working_dir.join(&request.build_path)
        };
        std::fs::create_dir_all(&build_path).map_err(|e| Error::io_with_path(&e, &build_path))?;

        let actions = BuildActions {
            package,
            variant: request.variant,
            build_type: request.build_type,
            install: request.install,
            build_path: &build_path,
            install_path: Some(request.install_path.as_path()),
            source_path: working_dir,
            settings: &self.injector,
        };
        let phase = PhaseRunner {
            pipeline: self,
            context,
            package,
            variant: request.variant,
            cwd: &build_path,
            actions: &actions,
        };

        let module_path = actions.cmake_module_path(&context.environment());
        let configure = configure_command(&ConfigureInputs {
            tool: &tool,
            working_dir,
            settings: &self.settings,
            extra_args: &self.options.build_args,
            install_path: &request.install_path,
            module_path: &module_path,
            generator: self.generator.as_deref(),
            build_target: self.build_target,
            build_type: request.build_type,
            install: request.install,
            central_compat: self.options.central_compat
                && request.build_type == BuildType::Central,
        });

        if self.generator.is_none() {
            tracing::debug!("no generator selected, cmake uses its platform default");
        }

        let mut phases = Vec::new();
        let mut state = PipelineState::Init;

        phases.push(BuildPhase::Configure);
        if phase.run(BuildPhase::Configure, &configure)? != 0 {
            return Ok(PipelineResult::failed(state, phases));
        }
        state = advance(state, PipelineState::Configured);

        if self.options.write_build_scripts {
            let script = self.defer_to_user(context, package, request, &build_path)?;
            return Ok(PipelineResult::done(state, phases, Some(script)));
        }

        let build_inputs = BuildInputs {
            tool: &tool,
            build_path: &build_path,
            make_binary: self.settings.make_binary(),
            child_args: &self.options.child_build_args,
            thread_count: self.injector.thread_count,
            platform: self.platform,
        };

        phases.push(BuildPhase::Build);
        if phase.run(BuildPhase::Build, &build_command(&build_inputs, true))? != 0 {
            return Ok(PipelineResult::failed(state, phases));
        }
        state = advance(state, PipelineState::Built);

        if request.install {
            match install_command(&build_inputs) {
                Some(install) => {
                    phases.push(BuildPhase::Install);
                    if phase.run(BuildPhase::Install, &install)? != 0 {
                        return Ok(PipelineResult::failed(state, phases));
                    }
                    state = advance(state, PipelineState::Installed);
                }
                None => tracing::debug!("build command already installs, skipping install phase"),
            }
        }

        Ok(PipelineResult::done(state, phases, None))
    }

    /// Save everything needed to resume and stop after configure
    fn defer_to_user(
        &self,
        context: &dyn ResolvedContext,
        package: &DeveloperPackage,
        request: &BuildRequest<'_>,
        build_path: &Path,
    ) -> Result<PathBuf, Error> {
        let descriptor = ResumableBuildDescriptor {
            working_dir: self.options.working_dir.clone(),
            build_path: build_path.to_path_buf(),
            variant_index: request.variant.index,
            install: request.install,
            install_path: Some(request.install_path.clone()),
            config_path: self.options.config_path.clone(),
        };

        context.save(&build_path.join(CONTEXT_FILE))?;
        let script = descriptor.persist(&self.options.launcher)?;

        self.emit(AppEvent::Build(BuildEvent::BuildEnvWritten {
            package: package.name.clone(),
            variant: request.variant.index,
            script: script.clone(),
        }));

        Ok(script)
    }
}

fn advance(from: PipelineState, to: PipelineState) -> PipelineState {
    tracing::trace!(?from, ?to, "pipeline state");
    to
}

/// Runs phases of one variant build with shared context and actions
struct PhaseRunner<'a> {
    pipeline: &'a BuildPipeline,
    context: &'a dyn ResolvedContext,
    package: &'a DeveloperPackage,
    variant: &'a Variant,
    cwd: &'a Path,
    actions: &'a BuildActions<'a>,
}

impl PhaseRunner<'_> {
    fn run(&self, phase: BuildPhase, command: &[String]) -> Result<i32, Error> {
        let package = self.package.name.clone();
        let variant = self.variant.index;
        let rendered = display_command(command);

        tracing::info!(%phase, command = %rendered, "executing");
        self.pipeline.emit(AppEvent::Build(BuildEvent::PhaseStarted {
            package: package.clone(),
            variant,
            phase,
            command: rendered,
            working_dir: self.cwd.to_path_buf(),
        }));

        let actions = self.actions;
        let exit_code = self.context.execute_shell(&ShellRequest {
            command: Some(command),
            cwd: self.cwd,
            actions: &|env: &mut ShellEnv| actions.apply(env),
            prompt: None,
        })?;

        let event = if exit_code == 0 {
            BuildEvent::PhaseCompleted {
                package,
                variant,
                phase,
            }
        } else {
            tracing::warn!(%phase, exit_code, "phase failed");
            BuildEvent::PhaseFailed {
                package,
                variant,
                phase,
                exit_code,
            }
        };
        self.pipeline.emit(AppEvent::Build(event));

        Ok(exit_code)
    }
}
