//! Output rendering and formatting

use comfy_table::{presets::UTF8_FULL, Attribute, Cell, ContentArrangement, Table};
use kiln_builder::{GeneratorCatalog, PipelineResult, BUILD_SYSTEM_NAME, CHILD_BUILD_SYSTEM};
use kiln_errors::UserFacingError;
use serde_json::{json, Value};
use std::io;
use std::path::{Path, PathBuf};

/// Result of building one variant
pub struct VariantOutcome {
    pub package: String,
    pub variant: usize,
    pub build_path: PathBuf,
    pub result: PipelineResult,
}

/// Output renderer for CLI results
#[derive(Clone, Copy)]
pub struct OutputRenderer {
    json_output: bool,
}

impl OutputRenderer {
    pub fn new(json_output: bool) -> Self {
        Self { json_output }
    }

    /// Render the generator listing of `tool`
    pub fn render_generators(&self, catalog: &GeneratorCatalog, tool: &Path) -> io::Result<()> {
        if self.json_output {
            println!(
                "{}",
                serde_json::to_string_pretty(&generators_document(catalog, tool))
                    .map_err(io::Error::other)?
            );
            return Ok(());
        }

        if let Some(diagnostic) = catalog.degradation(tool) {
            println!("{}", diagnostic.user_message());
            if let Some(hint) = diagnostic.user_hint() {
                println!("  Hint: {hint}");
            }
            return Ok(());
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("Generator").add_attribute(Attribute::Bold),
                Cell::new("Default").add_attribute(Attribute::Bold),
            ]);

        let default = catalog.default_generator();
        for generator in catalog.generators() {
            let marker = if default == Some(generator.name.as_str()) {
                "*"
            } else {
                ""
            };
            table.add_row(vec![Cell::new(&generator.name), Cell::new(marker)]);
        }

        println!("{BUILD_SYSTEM_NAME} generators ({})", tool.display());
        println!("{table}");
        Ok(())
    }

    /// Render the outcome of a build
    pub fn render_build(&self, outcomes: &[VariantOutcome]) -> io::Result<()> {
        if self.json_output {
            let variants: Vec<_> = outcomes
                .iter()
                .map(|o| {
                    json!({
                        "package": o.package,
                        "variant": o.variant,
                        "build_path": o.build_path,
                        "success": o.result.success,
                        "state": o.result.state,
                        "reached": o.result.reached,
                        "phases": o.result.phases,
                        "build_env_script": o.result.build_env_script,
                    })
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "variants": variants }))
                    .map_err(io::Error::other)?
            );
            return Ok(());
        }

        for outcome in outcomes {
            let status = if outcome.result.success { "ok" } else { "FAILED" };
            println!(
                "{} [{}] {status} ({})",
                outcome.package,
                outcome.variant,
                outcome.build_path.display()
            );
            if let Some(script) = &outcome.result.build_env_script {
                println!("  run {} to enter the build environment", script.display());
            }
        }
        Ok(())
    }
}

/// JSON document describing the generators of `tool`
fn generators_document(catalog: &GeneratorCatalog, tool: &Path) -> Value {
    let generators: Vec<_> = catalog
        .generators()
        .iter()
        .map(|g| json!({ "name": g.name, "default": g.is_platform_default }))
        .collect();
    let diagnostic = catalog.degradation(tool).map(|e| {
        json!({
            "code": e.user_code(),
            "message": e.user_message(),
            "hint": e.user_hint(),
        })
    });

    json!({
        "build_system": BUILD_SYSTEM_NAME,
        "child_build_system": CHILD_BUILD_SYSTEM,
        "tool": tool,
        "generators": generators,
        "default": catalog.default_generator(),
        "degraded": catalog.is_degraded(),
        "diagnostic": diagnostic,
    })
}
