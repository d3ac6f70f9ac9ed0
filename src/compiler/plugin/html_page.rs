//! Entry document generation.
//!
//! The linked template gets a favicon link and the extracted stylesheet
//! before `</head>`, and the bundle script before `</body>`.

use std::fs;
use std::path::Path;

use super::PluginContext;
use crate::compiler::CompileError;
use crate::compiler::loader::ModuleContent;
use crate::compiler::output::Assets;
use crate::manifest::STYLESHEET_FILENAME;
use crate::utils::path::module_id;

pub(super) fn generate(
    ctx: &PluginContext<'_>,
    template: &Path,
    favicon: &Path,
    filename: &str,
    assets: &mut Assets,
) -> Result<(), CompileError> {
    let template_path = ctx.root.join(template);
    let html = match ctx.graph.get(&module_id(ctx.root, &template_path)) {
        Some(module) => match &module.content {
            ModuleContent::Markup { html } => html.clone(),
            _ => read_text(&template_path)?,
        },
        None => read_text(&template_path)?,
    };

    let favicon_path = ctx.root.join(favicon);
    let favicon_name = favicon_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let bytes = fs::read(&favicon_path).map_err(|e| CompileError::io(&favicon_path, e))?;
    assets.emit(favicon_name.as_str(), bytes);

    let mut head = format!("<link rel=\"icon\" href=\"{favicon_name}\">");
    if assets.contains(STYLESHEET_FILENAME) {
        head.push_str(&format!(
            "<link href=\"{STYLESHEET_FILENAME}\" rel=\"stylesheet\">"
        ));
    }
    let body = format!("<script src=\"{}\"></script>", ctx.bundle);

    assets.emit(filename, inject(&html, &head, &body));
    Ok(())
}

fn read_text(path: &Path) -> Result<String, CompileError> {
    fs::read_to_string(path).map_err(|e| CompileError::io(path, e))
}

/// Insert `head` before `</head>` and `body` before `</body>`.
///
/// Without `</head>` the tags go before `<body`, or first; without
/// `</body>` the script is appended.
fn inject(html: &str, head: &str, body: &str) -> String {
    let mut out = html.to_string();

    let lower = out.to_ascii_lowercase();
    let head_at = lower
        .rfind("</head>")
        .or_else(|| lower.find("<body"))
        .unwrap_or(0);
    out.insert_str(head_at, head);

    let lower = out.to_ascii_lowercase();
    match lower.rfind("</body>") {
        Some(at) => out.insert_str(at, body),
        None => out.push_str(body),
    }
    out
}
