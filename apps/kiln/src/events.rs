//! Event handling and user feedback

use crate::logging::log_event_with_tracing;
use console::{style, Term};
use kiln_events::{AppEvent, BuildEvent, EventReceiver, GeneralEvent};
use std::thread::JoinHandle;

/// Renders events on stderr and forwards them to tracing
pub struct EventHandler {
    term: Term,
    /// Print nothing but log records, for JSON output
    quiet: bool,
    debug: bool,
}

impl EventHandler {
    pub fn new(quiet: bool, debug: bool) -> Self {
        Self {
            term: Term::stderr(),
            quiet,
            debug,
        }
    }

    /// Drain `receiver` on a background thread until every sender is gone
    pub fn spawn(self, mut receiver: EventReceiver) -> JoinHandle<()> {
        std::thread::spawn(move || {
            while let Some(event) = receiver.blocking_recv() {
                self.handle_event(&event);
            }
        })
    }

    /// Handle incoming event
    pub fn handle_event(&self, event: &AppEvent) {
        log_event_with_tracing(event);

        if self.quiet {
            return;
        }
        if matches!(
            event.tracing_level(),
            tracing::Level::DEBUG | tracing::Level::TRACE
        ) && !self.debug
        {
            return;
        }

        match event {
            AppEvent::Build(build_event) => self.handle_build_event(build_event),
            AppEvent::General(general_event) => self.handle_general_event(general_event),
        }
    }

    fn handle_build_event(&self, event: &BuildEvent) {
        match event {
            BuildEvent::GeneratorsDiscovered { count, default, .. } => {
                let default = default.as_deref().unwrap_or("none");
                self.show_status(&format!("Found {count} generators (default: {default})"));
            }
            BuildEvent::GeneratorListingDegraded { tool, reason } => {
                self.show_warning(&format!(
                    "Could not read generators from {}: {reason}",
                    tool.display()
                ));
            }
            BuildEvent::PhaseStarted {
                package,
                variant,
                phase,
                command,
                ..
            } => {
                self.show_status(&format!(
                    "{} {package} [{variant}] {phase}",
                    style("==>").cyan().bold()
                ));
                self.show_status(&format!("    {}", style(command).dim()));
            }
            BuildEvent::PhaseCompleted { .. } => {}
            BuildEvent::PhaseFailed {
                package,
                variant,
                phase,
                exit_code,
            } => {
                self.show_error(&format!(
                    "{phase} failed for {package} [{variant}] (exit code {exit_code})"
                ));
            }
            BuildEvent::BuildEnvWritten { script, .. } => {
                self.show_status(&format!(
                    "Build environment script written to {}",
                    style(script.display()).bold()
                ));
            }
            BuildEvent::ShellResumed { package, .. } => {
                self.show_status(&format!("Entering build shell for {package}"));
            }
        }
    }

    fn handle_general_event(&self, event: &GeneralEvent) {
        match event {
            GeneralEvent::Warning { message, context } => match context {
                Some(context) => self.show_warning(&format!("{message} ({context})")),
                None => self.show_warning(message),
            },
            GeneralEvent::DebugLog { message, .. } => {
                self.show_status(&format!("{} {message}", style("debug:").dim()));
            }
            GeneralEvent::OperationStarted { operation } => {
                self.show_status(&format!("{} {operation}", style("Building").green().bold()));
            }
            GeneralEvent::OperationCompleted { operation, success } => {
                if *success {
                    self.show_status(&format!("{} {operation}", style("Finished").green().bold()));
                } else {
                    self.show_error(&format!("{operation} did not succeed"));
                }
            }
        }
    }

    fn show_status(&self, message: &str) {
        let _ = self.term.write_line(message);
    }

    fn show_warning(&self, message: &str) {
        let _ = self
            .term
            .write_line(&format!("{} {message}", style("warning:").yellow().bold()));
    }

    fn show_error(&self, message: &str) {
        let _ = self
            .term
            .write_line(&format!("{} {message}", style("error:").red().bold()));
    }
}
