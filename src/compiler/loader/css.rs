//! Stylesheet loaders: `sass`, `postcss` and `css`.

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::{LoadContext, URL_PLACEHOLDER, url_placeholder};
use crate::compiler::CompileError;
use crate::compiler::resolve::{Request, is_external_url, split_suffix};
use crate::config::{CssTargets, encode_version};

/// `@import "a.css" screen;`, `@import url(a.css);`
static IMPORT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"@import\s+(?:url\(\s*)?(?:"([^"]+)"|'([^']+)'|([^\s;)"']+))\s*\)?\s*([^;]*);"#,
    )
    .unwrap()
});

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"url\(\s*(?:"([^"]*)"|'([^']*)'|([^)\s'"]*))\s*\)"#).unwrap()
});

/// Convert configured targets to lightningcss' encoded versions.
pub fn browsers(targets: &CssTargets) -> Browsers {
    let mut browsers = Browsers::default();
    for (name, version) in targets.entries() {
        let version = encode_version(version);
        match name {
            "android" => browsers.android = version,
            "chrome" => browsers.chrome = version,
            "edge" => browsers.edge = version,
            "firefox" => browsers.firefox = version,
            "ie" => browsers.ie = version,
            "ios_saf" => browsers.ios_saf = version,
            "opera" => browsers.opera = version,
            "safari" => browsers.safari = version,
            "samsung" => browsers.samsung = version,
            _ => {}
        }
    }
    browsers
}

/// `sass`: compile a `.scss` file. Relative `@use`/`@import` resolve
/// against the file's directory.
pub(super) fn compile_sass(id: &str, path: &Path) -> Result<String, CompileError> {
    grass::from_path(path, &grass::Options::default()).map_err(|err| CompileError::Sass {
        id: id.to_string(),
        message: err.to_string(),
    })
}

/// `postcss`: add vendor prefixes for `targets`. Output stays readable.
pub(super) fn prefix(id: &str, css: &str, targets: Browsers) -> Result<String, CompileError> {
    let css_error = |message: String| CompileError::Css {
        id: id.to_string(),
        message,
    };

    let options = ParserOptions {
        filename: id.to_string(),
        ..ParserOptions::default()
    };
    let mut sheet = StyleSheet::parse(css, options).map_err(|e| css_error(e.to_string()))?;

    sheet
        .minify(MinifyOptions {
            targets: Targets::from(targets),
            ..MinifyOptions::default()
        })
        .map_err(|e| css_error(e.to_string()))?;

    let printed = sheet
        .to_css(PrinterOptions {
            minify: false,
            targets: Targets::from(targets),
            ..PrinterOptions::default()
        })
        .map_err(|e| css_error(e.to_string()))?;

    Ok(printed.code)
}

/// `css`: inline `@import`s and replace local `url()` references with
/// placeholders for the linker.
///
/// Imported files are inlined as written; they do not pass through the
/// earlier loaders of the chain.
pub(super) fn resolve_references(
    ctx: &LoadContext<'_>,
    id: &str,
    path: &Path,
    css: &str,
    requests: &mut Vec<Request>,
) -> Result<String, CompileError> {
    let mut stack = vec![path.to_path_buf()];
    inline(ctx, id, path, css, requests, &mut stack)
}

fn import_marker(index: usize) -> String {
    format!("/*__KILN_IMPORT_{index}__*/")
}

fn inline(
    ctx: &LoadContext<'_>,
    id: &str,
    file: &Path,
    css: &str,
    requests: &mut Vec<Request>,
    stack: &mut Vec<PathBuf>,
) -> Result<String, CompileError> {
    let mut imports: Vec<(String, String)> = Vec::new();
    let css = IMPORT_RE
        .replace_all(css, |caps: &Captures<'_>| {
            let url = first_group(caps, 1..=3);
            if is_external_url(url) {
                return caps[0].to_string();
            }
            let media = caps.get(4).map_or("", |m| m.as_str().trim());
            imports.push((url.to_string(), media.to_string()));
            import_marker(imports.len() - 1)
        })
        .into_owned();

    let mut out = rewrite_urls(&css, file, requests);

    for (index, (url, media)) in imports.iter().enumerate() {
        let target = ctx
            .resolver
            .resolve(&Request::url(url.as_str(), file))
            .ok_or_else(|| CompileError::ModuleNotFound {
                request: url.clone(),
                importer: id.to_string(),
            })?;

        // an import cycle contributes nothing the second time round
        let inner = if stack.contains(&target) {
            String::new()
        } else {
            let text = fs::read_to_string(&target).map_err(|e| CompileError::io(&target, e))?;
            stack.push(target.clone());
            let inner = inline(ctx, id, &target, &text, requests, stack)?;
            stack.pop();
            inner
        };

        let inner = if media.is_empty() {
            inner
        } else {
            format!("@media {media} {{\n{inner}\n}}")
        };
        out = out.replace(&import_marker(index), &inner);
    }

    Ok(out)
}

fn first_group<'t>(caps: &Captures<'t>, groups: std::ops::RangeInclusive<usize>) -> &'t str {
    groups
        .filter_map(|i| caps.get(i))
        .map(|m| m.as_str())
        .next()
        .unwrap_or("")
}

fn rewrite_urls(css: &str, file: &Path, requests: &mut Vec<Request>) -> String {
    URL_RE
        .replace_all(css, |caps: &Captures<'_>| {
            let raw = first_group(caps, 1..=3).trim();
            if is_external_url(raw) || raw.starts_with(URL_PLACEHOLDER) {
                return caps[0].to_string();
            }
            let (target, suffix) = split_suffix(raw);
            let index = push_request(requests, Request::url(target, file));
            format!("url(\"{}{suffix}\")", url_placeholder(index))
        })
        .into_owned()
}

/// Index of `request`, appending it if new.
pub(super) fn push_request(requests: &mut Vec<Request>, request: Request) -> usize {
    match requests.iter().position(|r| *r == request) {
        Some(index) => index,
        None => {
            requests.push(request);
            requests.len() - 1
        }
    }
}
