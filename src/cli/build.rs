//! `kiln build`: execute the manifest once and write the output.

use anyhow::{Context, Result};

use crate::compiler::{BuildStats, CompileError, Compiler, format_size};
use crate::config::ProjectConfig;
use crate::logger::is_verbose;
use crate::manifest::Manifest;
use crate::{debug, log};

pub fn build_project(config: &ProjectConfig, manifest: &Manifest) -> Result<()> {
    debug!(
        "build";
        "{} mode, event {}, {} rules, minify {}",
        manifest.mode.as_str(),
        manifest.event,
        manifest.rules.len(),
        manifest.minifies()
    );

    let stats = compile(config, manifest, config.build.clean).context("build failed")?;

    for warning in &stats.warnings {
        log!("warning"; "{}", warning);
    }
    log!("build"; "{}", stats.summary());

    if is_verbose() {
        for asset in &stats.assets {
            log!("asset"; "{:>10}  {}", format_size(asset.size), asset.path);
        }
    }
    Ok(())
}

/// Run the compiler and write its output, replacing the output directory's
/// contents when `clean` is set.
pub fn compile(
    config: &ProjectConfig,
    manifest: &Manifest,
    clean: bool,
) -> Result<BuildStats, CompileError> {
    let output = Compiler::new(config, manifest).run()?;
    output.assets.write_to(&manifest.output.path, clean)?;
    Ok(output.stats)
}
