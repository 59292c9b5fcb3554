use serde::{Deserialize, Serialize};

pub mod build;
pub mod general;

pub use build::{BuildEvent, BuildPhase};
pub use general::GeneralEvent;

/// Top-level application event enum that aggregates all domain-specific events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event", rename_all = "snake_case")]
pub enum AppEvent {
    /// General utility events (warnings, errors, operations)
    General(GeneralEvent),

    /// Build pipeline events (discovery, phases, build shells)
    Build(BuildEvent),
}

impl AppEvent {
    /// Log level this event should be recorded at
    #[must_use]
    pub fn tracing_level(&self) -> tracing::Level {
        match self {
            Self::Build(BuildEvent::PhaseFailed { .. }) => tracing::Level::ERROR,
            Self::General(GeneralEvent::Warning { .. })
            | Self::Build(BuildEvent::GeneratorListingDegraded { .. }) => tracing::Level::WARN,
            Self::General(GeneralEvent::DebugLog { .. }) => tracing::Level::DEBUG,
            Self::General(GeneralEvent::OperationCompleted { success, .. }) if !success => {
                tracing::Level::WARN
            }
            _ => tracing::Level::INFO,
        }
    }
}
