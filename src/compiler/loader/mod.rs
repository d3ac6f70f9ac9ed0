//! Loader chains.
//!
//! A module is loaded by running its rule's loaders from last to first. Each
//! loader consumes the previous stage's [`Stage`] and produces the next; the
//! final stage must be a finished [`ModuleContent`].
//!
//! | Loader     | Input         | Output                        |
//! |------------|---------------|-------------------------------|
//! | `sass`     | file          | CSS text                      |
//! | `postcss`  | file or text  | prefixed CSS text             |
//! | `css`      | file or text  | `Style` with URL placeholders |
//! | `extract`  | `Style`       | `Style`, marked for extract   |
//! | `style`    | `Style`       | `Style`, marked for injection |
//! | `html`     | file          | `Markup` with placeholders    |
//! | `transpile`| file          | `Script`                      |
//! | `file`     | file          | `Asset`                       |
//!
//! Scripts no rule matches (dependencies under `node_modules`) load through
//! the passthrough path; JSON files load as plain data modules.

mod css;
mod file;
mod html;
mod js;

pub use css::browsers;

use lightningcss::targets::Browsers;
use std::fs;
use std::path::Path;

use super::CompileError;
use super::resolve::{Request, Resolver};
use crate::manifest::{Loader, RuleSet};
use crate::utils::path::module_id;

/// Prefix of the placeholder substituted with a dependency's public URL.
///
/// `__KILN_URL_3__` stands for the URL of the module's fourth request.
pub const URL_PLACEHOLDER: &str = "__KILN_URL_";

pub fn url_placeholder(index: usize) -> String {
    format!("{URL_PLACEHOLDER}{index}__")
}

/// Loaded, not yet linked, module body.
#[derive(Debug, Clone)]
pub enum ModuleContent {
    /// Rewritten script. `map` is an inline source map data URL.
    Script {
        code: String,
        map: Option<String>,
    },
    /// Stylesheet text, possibly containing URL placeholders.
    Style {
        css: String,
        extract: bool,
        inject: bool,
    },
    /// Document text, possibly containing URL placeholders.
    Markup { html: String },
    /// Emitted file. `output` is relative to the output directory and
    /// doubles as the public URL.
    Asset { output: String, bytes: Vec<u8> },
    /// JSON data exported as `module.exports`.
    Json { source: String },
}

impl ModuleContent {
    pub fn public_url(&self) -> Option<&str> {
        match self {
            Self::Asset { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// Result of running a loader chain.
#[derive(Debug)]
pub struct LoadedModule {
    pub id: String,
    pub content: ModuleContent,
    pub requests: Vec<Request>,
}

/// Shared, read-only inputs for every loader.
pub struct LoadContext<'a> {
    pub root: &'a Path,
    pub rules: &'a RuleSet,
    pub resolver: &'a Resolver,
    /// oxc transform target for project scripts.
    pub js_target: &'a str,
    pub css_targets: Browsers,
    /// Emit inline source maps for project scripts.
    pub source_maps: bool,
}

/// Intermediate value passed between loaders.
enum Stage {
    /// Nothing read yet; loaders that need text read the file.
    File,
    Text(String),
    Done(ModuleContent),
}

impl<'a> LoadContext<'a> {
    pub fn module_id(&self, path: &Path) -> String {
        module_id(self.root, path)
    }

    /// Load `path`, imported by the module `importer`.
    pub fn load(&self, path: &Path, importer: &str) -> Result<LoadedModule, CompileError> {
        let id = self.module_id(path);
        let mut requests = Vec::new();

        let content = match self.rules.find(path) {
            Some(rule) => {
                let mut stage = Stage::File;
                for loader in rule.pipeline() {
                    stage = self.apply(loader, stage, path, &id, &mut requests)?;
                }
                match stage {
                    Stage::Done(content) => content,
                    // rules always end in a module-producing loader
                    Stage::File | Stage::Text(_) => {
                        return Err(CompileError::Unhandled {
                            id,
                            importer: importer.to_string(),
                        });
                    }
                }
            }
            None => match extension(path).as_deref() {
                Some("js" | "mjs" | "cjs") => {
                    let source = read_text(path)?;
                    js::passthrough(&id, path, &source, &mut requests)?
                }
                Some("json") => ModuleContent::Json {
                    source: read_text(path)?,
                },
                _ => {
                    return Err(CompileError::Unhandled {
                        id,
                        importer: importer.to_string(),
                    });
                }
            },
        };

        crate::debug!("load"; "{} ({} requests)", id, requests.len());

        Ok(LoadedModule {
            id,
            content,
            requests,
        })
    }

    fn apply(
        &self,
        loader: Loader,
        stage: Stage,
        path: &Path,
        id: &str,
        requests: &mut Vec<Request>,
    ) -> Result<Stage, CompileError> {
        let text = |stage: Stage| -> Result<String, CompileError> {
            match stage {
                Stage::Text(text) => Ok(text),
                Stage::File | Stage::Done(_) => read_text(path),
            }
        };

        Ok(match loader {
            Loader::Sass => Stage::Text(css::compile_sass(id, path)?),
            Loader::Postcss => Stage::Text(css::prefix(id, &text(stage)?, self.css_targets)?),
            Loader::Css => {
                let css = css::resolve_references(self, id, path, &text(stage)?, requests)?;
                Stage::Done(ModuleContent::Style {
                    css,
                    extract: false,
                    inject: false,
                })
            }
            Loader::Extract | Loader::Style => match stage {
                Stage::Done(ModuleContent::Style {
                    css,
                    extract,
                    inject,
                }) => Stage::Done(ModuleContent::Style {
                    css,
                    extract: extract || loader == Loader::Extract,
                    inject: inject || loader == Loader::Style,
                }),
                other => other,
            },
            Loader::Html { .. } => {
                let html = html::rewrite_sources(path, &text(stage)?, requests);
                Stage::Done(ModuleContent::Markup { html })
            }
            Loader::Transpile => {
                let source = text(stage)?;
                Stage::Done(js::transpile(self, id, path, &source, requests)?)
            }
            Loader::File { output_path, name } => {
                Stage::Done(file::emit(path, output_path, name)?)
            }
        })
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
}

fn read_text(path: &Path) -> Result<String, CompileError> {
    fs::read_to_string(path).map_err(|err| CompileError::io(path, err))
}
