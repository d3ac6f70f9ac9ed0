//! `[build]` section configuration.
//!
//! Contains the project layout: where sources live and where output goes.
//!
//! # Example
//!
//! ```toml
//! [build]
//! src = "src"                         # Source root (static dirs are src/img and src/audio)
//! entry = "src/js/index.js"           # Entry script
//! entry_name = "index"                # Bundle name, emitted as `[name].js`
//! template = "src/index.html"         # HTML template for the entry document
//! favicon = "src/img/rotate.svg"      # Favicon injected into the entry document
//! output = "dist"                     # Output directory
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::ConfigDiagnostics;

pub const FIELD_SRC: &str = "build.src";
pub const FIELD_ENTRY: &str = "build.entry";
pub const FIELD_ENTRY_NAME: &str = "build.entry_name";
pub const FIELD_TEMPLATE: &str = "build.template";
pub const FIELD_FAVICON: &str = "build.favicon";
pub const FIELD_OUTPUT: &str = "build.output";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Source root.
    pub src: PathBuf,

    /// Entry script.
    pub entry: PathBuf,

    /// Entry chunk name, substituted for `[name]` in the bundle filename.
    pub entry_name: String,

    /// Entry document template.
    pub template: PathBuf,

    /// Favicon file.
    pub favicon: PathBuf,

    /// Build output directory.
    pub output: PathBuf,

    /// Clean output directory before building (CLI only).
    #[serde(skip)]
    pub clean: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            src: "src".into(),
            entry: "src/js/index.js".into(),
            entry_name: "index".into(),
            template: "src/index.html".into(),
            favicon: "src/img/rotate.svg".into(),
            output: "dist".into(),
            clean: false,
        }
    }
}

impl BuildConfig {
    /// Resolve every path against the project root.
    pub fn normalize(&mut self, root: &Path) {
        use crate::utils::path::normalize_path;

        self.src = normalize_path(&root.join(&self.src));
        self.entry = normalize_path(&root.join(&self.entry));
        self.template = normalize_path(&root.join(&self.template));
        self.favicon = normalize_path(&root.join(&self.favicon));
        self.output = normalize_path(&root.join(&self.output));
    }

    /// Validate normalized paths. With `require_files` unset only the layout
    /// itself is checked, not whether the sources exist yet.
    pub fn validate(&self, root: &Path, require_files: bool, diag: &mut ConfigDiagnostics) {
        if require_files {
            self.validate_files(diag);
        }

        if self.entry_name.is_empty() || self.entry_name.contains(['/', '\\']) {
            diag.error(
                FIELD_ENTRY_NAME,
                format!("`{}` is not a valid file stem", self.entry_name),
            );
        }

        if self.output == root || self.output == self.src || self.src.starts_with(&self.output) {
            diag.error(FIELD_OUTPUT, "output directory would overwrite sources")
                .hint("use a dedicated directory such as `dist`");
        }
    }

    fn validate_files(&self, diag: &mut ConfigDiagnostics) {
        if !self.src.is_dir() {
            diag.error(
                FIELD_SRC,
                format!("source directory `{}` not found", self.src.display()),
            );
        }

        for (field, path, what) in [
            (FIELD_ENTRY, &self.entry, "entry script"),
            (FIELD_TEMPLATE, &self.template, "template"),
            (FIELD_FAVICON, &self.favicon, "favicon"),
        ] {
            if !path.is_file() {
                diag.error(field, format!("{what} `{}` not found", path.display()))
                    .hint("paths are relative to the directory containing kiln.toml");
            }
        }
    }
}
