//! Developer package definitions
//!
//! A developer package is the unreleased package being built from a source
//! checkout. It is described by `package.toml` at the root of the working
//! directory.

use kiln_errors::{BuildError, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// File name of the package definition inside a working directory
pub const MANIFEST_FILE: &str = "package.toml";

/// A package being built from source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeveloperPackage {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub requires: Vec<String>,
    /// Requirement lists, one per variant
    #[serde(default)]
    pub variants: Vec<Vec<String>>,
}

/// One build permutation of a package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variant {
    pub index: usize,
    pub requires: Vec<String>,
}

impl Variant {
    /// Relative install location of this variant, its requirements joined by `/`
    #[must_use]
    pub fn subpath(&self) -> String {
        self.requires.join("/")
    }
}

impl DeveloperPackage {
    /// Load the package definition from `working_dir`.
    ///
    /// # Errors
    ///
    /// Returns `ManifestNotFound` when `package.toml` is missing, an I/O
    /// error when it exists but cannot be read, and `ManifestInvalid` when it
    /// cannot be parsed.
    pub fn load(working_dir: &Path) -> Result<Self, Error> {
        let path = working_dir.join(MANIFEST_FILE);
        let contents = std::fs::read_to_string(&path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BuildError::ManifestNotFound {
                path: working_dir.display().to_string(),
            }
            .into(),
            _ => Error::io_with_path(&e, &path),
        })?;

        Self::from_toml(&contents).map_err(|message| {
            BuildError::ManifestInvalid {
                path: path.display().to_string(),
                message,
            }
            .into()
        })
    }

    fn from_toml(contents: &str) -> Result<Self, String> {
        let package: Self = toml::from_str(contents).map_err(|e| e.to_string())?;
        if package.name.trim().is_empty() {
            return Err("package name is empty".to_string());
        }
        Ok(package)
    }

    /// All variants of the package.
    ///
    /// A package without explicit variants has a single implicit variant with
    /// no extra requirements.
    #[must_use]
    pub fn variants(&self) -> Vec<Variant> {
        if self.variants.is_empty() {
            return vec![Variant {
                index: 0,
                requires: Vec::new(),
            }];
        }

        self.variants
            .iter()
            .enumerate()
            .map(|(index, requires)| Variant {
                index,
                requires: requires.clone(),
            })
            .collect()
    }

    /// Look up a variant by index.
    ///
    /// # Errors
    ///
    /// Returns `VariantNotFound` when the index is out of range.
    pub fn get_variant(&self, index: usize) -> Result<Variant, Error> {
        self.variants()
            .into_iter()
            .nth(index)
            .ok_or_else(|| {
                BuildError::VariantNotFound {
                    package: self.name.clone(),
                    index,
                }
                .into()
            })
    }
}

/// Loads the developer package for a working directory
pub trait PackageLoader {
    /// # Errors
    ///
    /// Returns an error if no valid package definition exists in `working_dir`.
    fn load(&self, working_dir: &Path) -> Result<DeveloperPackage, Error>;
}

/// Reads `package.toml` from disk
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlPackageLoader;

impl PackageLoader for TomlPackageLoader {
    fn load(&self, working_dir: &Path) -> Result<DeveloperPackage, Error> {
        DeveloperPackage::load(working_dir)
    }
}
