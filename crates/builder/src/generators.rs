//! Generator discovery
//!
//! cmake does not offer a machine-readable list of the generators it was
//! built with, so the list is scraped from `cmake --help`. Parsing is kept in
//! [`parse_generator_listing`], a pure function with a "no result" contract:
//! anything it does not recognise yields an empty list rather than an error.

use kiln_errors::{BuildError, Error};
use kiln_events::{AppEvent, BuildEvent, EventEmitter, EventSender};
use kiln_types::HostPlatform;
use std::path::Path;
use std::process::Command;

/// Short names accepted for common generators, kept for older configs
pub const LEGACY_GENERATORS: [(&str, &str); 6] = [
    ("eclipse", "Eclipse CDT4 - Unix Makefiles"),
    ("codeblocks", "CodeBlocks - Unix Makefiles"),
    ("make", "Unix Makefiles"),
    ("nmake", "NMake Makefiles"),
    ("mingw", "MinGW Makefiles"),
    ("xcode", "Xcode"),
];

/// Generators that only work on one host platform
const PLATFORM_GENERATORS: [(&str, HostPlatform); 1] = [("Xcode", HostPlatform::Osx)];

const SECTION_HEADING: &str = "Generators";
const ARCH_PLACEHOLDER: &str = "[arch]";
const DEFAULT_MARKER: &str = "* ";

/// A generator backend reported by cmake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generator {
    pub name: String,
    pub is_platform_default: bool,
}

/// Look up the canonical generator string for a legacy short name
#[must_use]
pub fn legacy_generator(alias: &str) -> Option<&'static str> {
    LEGACY_GENERATORS
        .iter()
        .find(|(name, _)| *name == alias)
        .map(|(_, canonical)| *canonical)
}

/// Parse the generator section of `cmake --help` output.
///
/// Lines are only considered after one starting with `Generators`. Each line
/// containing `=` yields one generator, in order, duplicates included.
#[must_use]
pub fn parse_generator_listing(help: &str) -> Vec<Generator> {
    let mut generators = Vec::new();
    let mut in_section = false;
    // cmake wraps long names and puts "= description" on the next line
    let mut wrapped_name: Option<&str> = None;

    for line in help.lines() {
        if !in_section {
            in_section = line.starts_with(SECTION_HEADING);
            continue;
        }

        let Some((raw_name, _description)) = line.split_once('=') else {
            wrapped_name = Some(line).filter(|l| !l.trim().is_empty());
            continue;
        };

        let raw_name = if raw_name.trim().is_empty() {
            match wrapped_name {
                Some(previous) => previous,
                None => continue,
            }
        } else {
            raw_name
        };
        wrapped_name = None;

        generators.push(parse_generator_name(raw_name));
    }

    generators
}

fn parse_generator_name(raw: &str) -> Generator {
    let name = raw.replace(ARCH_PLACEHOLDER, "");
    let trimmed = name.trim();

    match trimmed.strip_prefix(DEFAULT_MARKER) {
        Some(rest) => Generator {
            name: rest.trim().to_string(),
            is_platform_default: true,
        },
        None => Generator {
            name: trimmed.to_string(),
            is_platform_default: false,
        },
    }
}

/// The set of generators supported by one cmake installation
///
/// Build it once per process with [`GeneratorCatalog::discover`] and pass it
/// by reference to everything that needs it. It is never mutated afterwards.
#[derive(Debug, Clone, Default)]
pub struct GeneratorCatalog {
    generators: Vec<Generator>,
    default: Option<String>,
    degraded: Option<String>,
}

impl GeneratorCatalog {
    /// Run `<tool> --help` once and parse its generator section.
    ///
    /// A tool that cannot be run, or prints no generators, produces an empty
    /// catalog flagged as degraded.
    #[must_use]
    pub fn discover(tool: &Path, event_sender: Option<&EventSender>) -> Self {
        let catalog = match Command::new(tool).arg("--help").output() {
            Ok(output) => Self::from_help_output(&String::from_utf8_lossy(&output.stdout)),
            Err(e) => Self::degraded(format!("failed to run {} --help: {e}", tool.display())),
        };

        catalog.report(tool, event_sender);
        catalog
    }

    /// Build a catalog from captured help text
    #[must_use]
    pub fn from_help_output(help: &str) -> Self {
        let generators = parse_generator_listing(help);
        if generators.is_empty() {
            return Self::degraded("no generator section in help output");
        }
        Self::from_generators(generators)
    }

    /// Build a catalog from an already known generator list.
    ///
    /// When several entries are flagged as the platform default the last one
    /// wins.
    #[must_use]
    pub fn from_generators(generators: Vec<Generator>) -> Self {
        let default = generators
            .iter()
            .rev()
            .find(|g| g.is_platform_default)
            .map(|g| g.name.clone());

        Self {
            generators,
            default,
            degraded: None,
        }
    }

    fn degraded(reason: impl Into<String>) -> Self {
        Self {
            generators: Vec::new(),
            default: None,
            degraded: Some(reason.into()),
        }
    }

    fn report(&self, tool: &Path, event_sender: Option<&EventSender>) {
        let event = match &self.degraded {
            Some(reason) => {
                tracing::warn!(tool = %tool.display(), %reason, "generator discovery degraded");
                BuildEvent::GeneratorListingDegraded {
                    tool: tool.to_path_buf(),
                    reason: reason.clone(),
                }
            }
            None => {
                tracing::debug!(
                    tool = %tool.display(),
                    count = self.generators.len(),
                    default = ?self.default,
                    "discovered generators"
                );
                BuildEvent::GeneratorsDiscovered {
                    tool: tool.to_path_buf(),
                    count: self.generators.len(),
                    default: self.default.clone(),
                }
            }
        };

        if let Some(sender) = event_sender {
            sender.emit(AppEvent::Build(event));
        }
    }

    /// Discovered generators in discovery order
    #[must_use]
    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    /// Generator names in discovery order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.generators.iter().map(|g| g.name.as_str()).collect()
    }

    /// Owned generator names, for user-facing choice lists and diagnostics
    #[must_use]
    pub fn choices(&self) -> Vec<String> {
        self.generators.iter().map(|g| g.name.clone()).collect()
    }

    /// The generator cmake uses when none is given
    #[must_use]
    pub fn default_generator(&self) -> Option<&str> {
        self.default.as_deref()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.generators.iter().any(|g| g.name == name)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    /// Whether discovery failed to produce any generators
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.is_some()
    }

    /// Diagnostic describing a degraded discovery, for display only
    #[must_use]
    pub fn degradation(&self, tool: &Path) -> Option<BuildError> {
        self.degraded.as_ref().map(|_| BuildError::ParseDegraded {
            tool: tool.display().to_string(),
        })
    }

    /// Map a user selection to the string passed to `cmake -G`.
    ///
    /// # Errors
    ///
    /// Returns `GeneratorUnsupported` when the name is neither discovered nor
    /// a legacy alias.
    pub fn resolve(&self, selected: &str) -> Result<String, Error> {
        if self.contains(selected) {
            return Ok(selected.to_string());
        }

        legacy_generator(selected)
            .map(str::to_string)
            .ok_or_else(|| {
                BuildError::GeneratorUnsupported {
                    name: selected.to_string(),
                    available: self.choices(),
                }
                .into()
            })
    }
}

/// Reject generators that cannot run on `platform`.
///
/// # Errors
///
/// Returns `PlatformRestriction` when the generator is tied to another
/// platform.
pub fn ensure_platform_supported(generator: &str, platform: HostPlatform) -> Result<(), Error> {
    match PLATFORM_GENERATORS
        .iter()
        .find(|(name, _)| *name == generator)
    {
        Some((_, required)) if *required != platform => Err(BuildError::PlatformRestriction {
            generator: generator.to_string(),
            required: required.to_string(),
            current: platform.to_string(),
        }
        .into()),
        _ => Ok(()),
    }
}
