//! Plugin directives, run in manifest order once the graph is linked.

mod copy_dirs;
mod extract_css;
mod html_page;
mod minify;

use std::path::Path;

use super::CompileError;
use super::graph::ModuleGraph;
use super::output::Assets;
use crate::manifest::Plugin;

/// Inputs shared by every plugin.
pub struct PluginContext<'a> {
    pub root: &'a Path,
    pub graph: &'a ModuleGraph,
    /// Entry module id.
    pub entry: &'a str,
    /// Emitted bundle file name.
    pub bundle: &'a str,
}

pub fn apply(
    plugin: &Plugin,
    ctx: &PluginContext<'_>,
    assets: &mut Assets,
    warnings: &mut Vec<String>,
) -> Result<(), CompileError> {
    match plugin {
        Plugin::ExtractCss { filename } => {
            extract_css::extract(ctx.graph, ctx.entry, filename, assets);
        }
        Plugin::HtmlPage {
            template,
            favicon,
            filename,
        } => html_page::generate(ctx, template, favicon, filename, assets)?,
        Plugin::CopyDirs { patterns } => copy_dirs::copy(ctx.root, patterns, assets, warnings)?,
        Plugin::MinifyJs => minify::minify_bundle(ctx.bundle, assets)?,
    }
    Ok(())
}
