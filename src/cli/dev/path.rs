//! Request URL to output file mapping.

use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// Path component of a request URL, without query or fragment.
pub fn url_path(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

/// Map `url` to a file under `root`. Directories serve their `index.html`.
///
/// `..` segments and anything resolving outside `root` (through symlinks
/// or encoded separators) are rejected.
pub fn resolve_path(url: &str, root: &Path) -> Option<PathBuf> {
    let decoded = percent_decode_str(url_path(url)).decode_utf8().ok()?;

    let mut local = root.to_path_buf();
    for segment in decoded.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => return None,
            segment => local.push(segment),
        }
    }

    let canonical = local.canonicalize().ok()?;
    if !canonical.starts_with(root.canonicalize().ok()?) {
        return None;
    }

    if canonical.is_dir() {
        let index = canonical.join("index.html");
        return index.is_file().then_some(index);
    }
    canonical.is_file().then_some(canonical)
}
