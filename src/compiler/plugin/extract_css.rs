//! Concatenate extracted stylesheets into one file.

use crate::compiler::graph::ModuleGraph;
use crate::compiler::loader::ModuleContent;
use crate::compiler::output::Assets;

/// Emit `filename` holding every extracted stylesheet reachable from
/// `entry`, in import order. Nothing is emitted without stylesheets.
pub(super) fn extract(graph: &ModuleGraph, entry: &str, filename: &str, assets: &mut Assets) {
    let sheets: Vec<&str> = graph
        .post_order(entry)
        .into_iter()
        .filter_map(|module| match &module.content {
            ModuleContent::Style {
                css, extract: true, ..
            } => Some(css.trim_end()),
            _ => None,
        })
        .collect();

    if sheets.is_empty() {
        return;
    }

    let mut css = sheets.join("\n\n");
    css.push('\n');
    crate::debug!("extract"; "{} ({} stylesheets)", filename, sheets.len());
    assets.emit(filename, css);
}
