//! Structured logging integration for events
//!
//! Converts domain events into tracing records with structured fields, so a
//! `--debug` log file carries the same information the terminal shows.

use kiln_events::{AppEvent, BuildEvent, GeneralEvent};
use tracing::{debug, error, info, warn};

/// Log an `AppEvent` at its level with structured fields
pub fn log_event_with_tracing(event: &AppEvent) {
    match event {
        AppEvent::Build(build_event) => log_build_event(build_event),
        AppEvent::General(general_event) => log_general_event(general_event),
    }
}

fn log_build_event(event: &BuildEvent) {
    match event {
        BuildEvent::GeneratorsDiscovered {
            tool,
            count,
            default,
        } => {
            debug!(
                tool = %tool.display(),
                count = count,
                default = ?default,
                "Generators discovered"
            );
        }
        BuildEvent::GeneratorListingDegraded { tool, reason } => {
            warn!(
                tool = %tool.display(),
                reason = %reason,
                "Generator listing unavailable"
            );
        }
        BuildEvent::PhaseStarted {
            package,
            variant,
            phase,
            command,
            working_dir,
        } => {
            info!(
                package = %package,
                variant = variant,
                phase = %phase,
                command = %command,
                working_dir = %working_dir.display(),
                "Phase started"
            );
        }
        BuildEvent::PhaseCompleted {
            package,
            variant,
            phase,
        } => {
            info!(
                package = %package,
                variant = variant,
                phase = %phase,
                "Phase completed"
            );
        }
        BuildEvent::PhaseFailed {
            package,
            variant,
            phase,
            exit_code,
        } => {
            error!(
                package = %package,
                variant = variant,
                phase = %phase,
                exit_code = exit_code,
                "Phase failed"
            );
        }
        BuildEvent::BuildEnvWritten {
            package,
            variant,
            script,
        } => {
            info!(
                package = %package,
                variant = variant,
                script = %script.display(),
                "Build environment script written"
            );
        }
        BuildEvent::ShellResumed {
            package,
            variant,
            build_path,
        } => {
            info!(
                package = %package,
                variant = variant,
                build_path = %build_path.display(),
                "Entering build shell"
            );
        }
    }
}

fn log_general_event(event: &GeneralEvent) {
    match event {
        GeneralEvent::Warning { message, context } => {
            warn!(message = %message, context = ?context, "Warning");
        }
        GeneralEvent::DebugLog { message, context } => {
            debug!(message = %message, context = ?context, "Debug log");
        }
        GeneralEvent::OperationStarted { operation } => {
            info!(operation = %operation, "Operation started");
        }
        GeneralEvent::OperationCompleted { operation, success } => {
            if *success {
                info!(operation = %operation, success, "Operation completed");
            } else {
                warn!(operation = %operation, success, "Operation completed");
            }
        }
    }
}
