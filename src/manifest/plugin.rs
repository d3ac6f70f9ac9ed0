//! Plugin directives applied after the per-file rules.

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::Mode;

/// Name of the extracted stylesheet.
pub const STYLESHEET_FILENAME: &str = "style.css";

/// Name of the generated entry document.
pub const DOCUMENT_FILENAME: &str = "index.html";

/// One `from → to` mapping of the static copy directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyPattern {
    /// Source directory, relative to the project root.
    pub from: PathBuf,
    /// Destination directory inside the output, with trailing slash.
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "plugin", rename_all = "kebab-case")]
pub enum Plugin {
    /// Concatenate every extracted stylesheet into `filename`.
    ExtractCss { filename: String },
    /// Generate the entry document from `template`.
    HtmlPage {
        template: PathBuf,
        favicon: PathBuf,
        filename: String,
    },
    /// Copy static directories verbatim.
    CopyDirs { patterns: Vec<CopyPattern> },
    /// Minify the bundle. Scripts copied by `CopyDirs` stay verbatim.
    MinifyJs,
}

/// Plugin list for `mode`. Paths are relative to the project root.
///
/// `src` is the source root; the copied static directories are `<src>/img`
/// and `<src>/audio`.
pub fn plugins(mode: Mode, src: &Path, template: &Path, favicon: &Path) -> Vec<Plugin> {
    let mut plugins = vec![
        Plugin::ExtractCss {
            filename: STYLESHEET_FILENAME.into(),
        },
        Plugin::HtmlPage {
            template: template.to_path_buf(),
            favicon: favicon.to_path_buf(),
            filename: DOCUMENT_FILENAME.into(),
        },
        Plugin::CopyDirs {
            patterns: ["img", "audio"]
                .into_iter()
                .map(|dir| CopyPattern {
                    from: src.join(dir),
                    to: format!("{dir}/"),
                })
                .collect(),
        },
    ];

    if mode.is_production() {
        plugins.push(Plugin::MinifyJs);
    }

    plugins
}
