//! In-memory build output.
//!
//! Everything a build emits is collected here first and written in one pass,
//! so a failed build never leaves a half-updated output directory.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use std::fs;
use std::path::Path;

use super::CompileError;

/// One emitted file. `path` is relative to the output directory, using `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub path: String,
    pub bytes: Vec<u8>,
}

/// Emitted files in emission order. Emitting an existing path replaces it.
#[derive(Debug, Default)]
pub struct Assets {
    list: Vec<Asset>,
    index: FxHashMap<String, usize>,
}

impl Assets {
    pub fn emit(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let asset = Asset {
            path: path.into(),
            bytes: bytes.into(),
        };
        match self.index.get(&asset.path) {
            Some(&i) => self.list[i] = asset,
            None => {
                self.index.insert(asset.path.clone(), self.list.len());
                self.list.push(asset);
            }
        }
    }

    #[cfg(test)]
    pub fn get(&self, path: &str) -> Option<&Asset> {
        self.index.get(path).map(|&i| &self.list[i])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Asset> {
        self.list.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Asset> {
        self.list.iter_mut()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Write every asset below `output`, removing the directory first when
    /// `clean` is set.
    pub fn write_to(&self, output: &Path, clean: bool) -> Result<(), CompileError> {
        if clean && output.exists() {
            fs::remove_dir_all(output).map_err(|e| CompileError::io(output, e))?;
        }
        fs::create_dir_all(output).map_err(|e| CompileError::io(output, e))?;

        self.list.par_iter().try_for_each(|asset| {
            let dest = output.join(&asset.path);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).map_err(|e| CompileError::io(parent, e))?;
            }
            fs::write(&dest, &asset.bytes).map_err(|e| CompileError::io(&dest, e))
        })
    }
}
