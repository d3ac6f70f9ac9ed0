//! Build failure types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while executing the manifest.
///
/// Module-scoped variants carry the module id (`./src/js/index.js`) so the
/// message points at the file the user edits.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("module not found: cannot resolve `{request}` from {importer}")]
    ModuleNotFound { request: String, importer: String },

    #[error("no rule handles {id} (imported by {importer})")]
    Unhandled { id: String, importer: String },

    #[error("failed to parse {id}\n{message}")]
    Parse { id: String, message: String },

    #[error("failed to transform {id}\n{message}")]
    Transform { id: String, message: String },

    #[error("sass error in {id}\n{message}")]
    Sass { id: String, message: String },

    #[error("css error in {id}: {message}")]
    Css { id: String, message: String },

    #[error("failed to minify {file}\n{message}")]
    Minify { file: String, message: String },

    #[error("{id} references {target}, which does not emit a file")]
    NoPublicUrl { id: String, target: String },

    #[error("IO error on `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
}

impl CompileError {
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io(path.into(), err)
    }
}
