//! Verbatim copy of static directories.

use jwalk::WalkDir;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::compiler::CompileError;
use crate::compiler::output::Assets;
use crate::manifest::CopyPattern;
use crate::utils::path::to_slash;

/// Copy each pattern's directory under its destination prefix. A missing
/// source directory is a warning.
pub(super) fn copy(
    root: &Path,
    patterns: &[CopyPattern],
    assets: &mut Assets,
    warnings: &mut Vec<String>,
) -> Result<(), CompileError> {
    for pattern in patterns {
        let from = root.join(&pattern.from);
        if !from.is_dir() {
            warnings.push(format!(
                "copy: directory `{}` not found",
                pattern.from.display()
            ));
            continue;
        }

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(&from).sort(true) {
            let entry = entry.map_err(|err| {
                let path = err.path().unwrap_or(from.as_path()).to_path_buf();
                CompileError::io(path, err.into())
            })?;
            if entry.file_type().is_file() {
                files.push(entry.path());
            }
        }

        let copied = files
            .par_iter()
            .map(|path| {
                let bytes = fs::read(path).map_err(|e| CompileError::io(path, e))?;
                let rel = path.strip_prefix(&from).unwrap_or(path);
                Ok((format!("{}{}", pattern.to, to_slash(rel)), bytes))
            })
            .collect::<Result<Vec<_>, CompileError>>()?;

        crate::debug!("copy"; "{} → {} ({} files)", pattern.from.display(), pattern.to, copied.len());
        for (path, bytes) in copied {
            assets.emit(path, bytes);
        }
    }
    Ok(())
}
