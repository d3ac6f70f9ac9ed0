//! `file` loader: emit a file and export its public URL.

use std::fs;
use std::path::Path;

use super::ModuleContent;
use crate::compiler::CompileError;
use crate::manifest::FileName;
use crate::utils::hash::content_hash;

pub(super) fn emit(
    path: &Path,
    output_path: &str,
    name: FileName,
) -> Result<ModuleContent, CompileError> {
    let bytes = fs::read(path).map_err(|err| CompileError::io(path, err))?;
    let file_name = match name {
        FileName::Original => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        FileName::ContentHash => {
            let hash = content_hash(&bytes);
            match path.extension() {
                Some(ext) => format!("{hash}.{}", ext.to_string_lossy()),
                None => hash,
            }
        }
    };

    Ok(ModuleContent::Asset {
        output: format!("{output_path}{file_name}"),
        bytes,
    })
}
