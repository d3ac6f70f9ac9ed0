//! Request resolution through `oxc_resolver`.
//!
//! Script requests use the browser-targeted webpack defaults:
//!
//! ```text
//! extensions      .js, .json
//! mainFields      browser, module, main
//! aliasFields     browser
//! conditionNames  import, browser
//! ```
//!
//! Stylesheet and document references (`url(...)`, `src="..."`) prefer the
//! referencing file's directory even without a `./` prefix; `~pkg/file`
//! reaches into `node_modules`.

use oxc_resolver::ResolveOptions;
use std::path::{Path, PathBuf};

use crate::utils::path::normalize_path;

/// What kind of reference produced a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// `import`, `export … from`, `require()` or `import()`.
    Script,
    /// `url()`, `@import` or an HTML attribute.
    Url,
}

/// An unresolved reference found while loading a module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub specifier: String,
    /// File containing the reference; relative specifiers resolve against
    /// its directory.
    pub context: PathBuf,
    pub kind: RequestKind,
    /// A failed optional request is a warning, not an error.
    pub optional: bool,
}

impl Request {
    pub fn script(specifier: impl Into<String>, context: &Path) -> Self {
        Self {
            specifier: specifier.into(),
            context: context.to_path_buf(),
            kind: RequestKind::Script,
            optional: false,
        }
    }

    pub fn url(specifier: impl Into<String>, context: &Path) -> Self {
        Self {
            kind: RequestKind::Url,
            ..Self::script(specifier, context)
        }
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Resolves requests to canonical file paths.
///
/// Both kinds share one file system cache.
#[derive(Debug)]
pub struct Resolver {
    scripts: oxc_resolver::Resolver,
    urls: oxc_resolver::Resolver,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    pub fn new() -> Self {
        let scripts = oxc_resolver::Resolver::new(ResolveOptions {
            extensions: strings(&[".js", ".json"]),
            main_fields: strings(&["browser", "module", "main"]),
            alias_fields: vec![strings(&["browser"])],
            condition_names: strings(&["import", "browser"]),
            ..ResolveOptions::default()
        });
        let urls = scripts.clone_with_options(ResolveOptions {
            extensions: strings(&[".css"]),
            main_fields: strings(&["css", "style", "main"]),
            condition_names: strings(&["style"]),
            prefer_relative: true,
            ..ResolveOptions::default()
        });
        Self { scripts, urls }
    }

    pub fn resolve(&self, request: &Request) -> Option<PathBuf> {
        let dir = request.context.parent()?;
        let (resolver, specifier) = match request.kind {
            RequestKind::Script => (&self.scripts, request.specifier.as_str()),
            RequestKind::Url => (
                &self.urls,
                request
                    .specifier
                    .strip_prefix('~')
                    .unwrap_or(&request.specifier),
            ),
        };

        match resolver.resolve(dir, specifier) {
            Ok(resolution) => Some(normalize_path(resolution.path())),
            Err(err) => {
                crate::debug!("resolve"; "`{}` from {}: {}", specifier, dir.display(), err);
                None
            }
        }
    }
}

/// Whether a stylesheet or document reference points outside the build.
pub fn is_external_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    lower.is_empty()
        || lower.starts_with("data:")
        || lower.starts_with("http:")
        || lower.starts_with("https:")
        || lower.starts_with("mailto:")
        || lower.starts_with("//")
        || lower.starts_with('#')
        || lower.starts_with('/')
}

/// Split `font.eot?#iefix` into (`font.eot`, `?#iefix`).
pub fn split_suffix(url: &str) -> (&str, &str) {
    match url.find(['?', '#']) {
        Some(idx) => url.split_at(idx),
        None => (url, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, content: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        normalize_path(&path)
    }

    #[test]
    fn test_relative_candidates() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let entry = touch(root, "src/js/index.js", "");
        let util = touch(root, "src/js/util.js", "");
        let nested = touch(root, "src/js/lib/index.js", "");
        let data = touch(root, "src/js/data.json", "{}");
        let style = touch(root, "src/css/main.css", "");

        let r = Resolver::new();
        assert_eq!(r.resolve(&Request::script("./util", &entry)), Some(util.clone()));
        assert_eq!(r.resolve(&Request::script("./util.js", &entry)), Some(util));
        assert_eq!(r.resolve(&Request::script("./lib", &entry)), Some(nested));
        assert_eq!(r.resolve(&Request::script("./data", &entry)), Some(data));
        assert_eq!(
            r.resolve(&Request::script("../css/main.css", &entry)),
            Some(style)
        );
        assert_eq!(r.resolve(&Request::script("./missing", &entry)), None);
    }

    #[test]
    fn test_package_main_fields() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let entry = touch(root, "src/js/index.js", "");
        touch(
            root,
            "node_modules/esm-pkg/package.json",
            r#"{"main": "lib/index.js", "module": "es/index.js"}"#,
        );
        let esm = touch(root, "node_modules/esm-pkg/es/index.js", "");
        touch(root, "node_modules/esm-pkg/lib/index.js", "");
        touch(
            root,
            "node_modules/web-pkg/package.json",
            r#"{"main": "node.js", "browser": "web.js"}"#,
        );
        let web = touch(root, "node_modules/web-pkg/web.js", "");
        touch(root, "node_modules/web-pkg/node.js", "");
        touch(root, "node_modules/cjs-pkg/package.json", r#"{"main": "./dist/cjs"}"#);
        let cjs = touch(root, "node_modules/cjs-pkg/dist/cjs.js", "");
        let plain = touch(root, "node_modules/plain/index.js", "");
        let sub = touch(root, "node_modules/@scope/kit/util/math.js", "");

        let r = Resolver::new();
        assert_eq!(r.resolve(&Request::script("esm-pkg", &entry)), Some(esm));
        assert_eq!(r.resolve(&Request::script("web-pkg", &entry)), Some(web));
        assert_eq!(r.resolve(&Request::script("cjs-pkg", &entry)), Some(cjs));
        assert_eq!(r.resolve(&Request::script("plain", &entry)), Some(plain));
        assert_eq!(
            r.resolve(&Request::script("@scope/kit/util/math", &entry)),
            Some(sub)
        );
        assert_eq!(r.resolve(&Request::script("absent", &entry)), None);
    }

    #[test]
    fn test_package_exports() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let entry = touch(root, "src/js/index.js", "");
        touch(
            root,
            "node_modules/modern/package.json",
            r#"{"name": "modern", "exports": {".": "./dist/index.js"}}"#,
        );
        let modern = touch(root, "node_modules/modern/dist/index.js", "");
        touch(
            root,
            "node_modules/dual/package.json",
            r#"{"name": "dual", "exports": {"import": "./esm.js", "require": "./cjs.js"}}"#,
        );
        let esm = touch(root, "node_modules/dual/esm.js", "");
        touch(root, "node_modules/dual/cjs.js", "");

        let r = Resolver::new();
        assert_eq!(r.resolve(&Request::script("modern", &entry)), Some(modern));
        assert_eq!(r.resolve(&Request::script("dual", &entry)), Some(esm));
        // unexported subpaths stay private
        assert_eq!(r.resolve(&Request::script("modern/dist/index.js", &entry)), None);
    }

    #[test]
    fn test_browser_alias_field() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let entry = touch(root, "src/js/index.js", "");
        touch(
            root,
            "node_modules/shim/package.json",
            r#"{"main": "index.js", "browser": {"./fs.js": "./fs-browser.js"}}"#,
        );
        let main = touch(root, "node_modules/shim/index.js", "");
        touch(root, "node_modules/shim/fs.js", "");
        let shimmed = touch(root, "node_modules/shim/fs-browser.js", "");

        let r = Resolver::new();
        assert_eq!(r.resolve(&Request::script("shim", &entry)), Some(main.clone()));
        assert_eq!(r.resolve(&Request::script("./fs.js", &main)), Some(shimmed));
    }

    #[test]
    fn test_url_requests_are_relative_without_prefix() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let template = touch(root, "src/index.html", "");
        let image = touch(root, "src/img/logo.png", "");
        let font = touch(root, "node_modules/fontpkg/a.woff", "");

        let r = Resolver::new();
        assert_eq!(r.resolve(&Request::url("img/logo.png", &template)), Some(image));
        assert_eq!(r.resolve(&Request::url("~fontpkg/a.woff", &template)), Some(font));
        assert_eq!(r.resolve(&Request::url("img/missing.png", &template)), None);
    }

    #[test]
    fn test_external_urls() {
        for url in ["data:image/png;base64,xx", "https://x.org/a.png", "//cdn/a.css", "#icon", "/abs.png", ""] {
            assert!(is_external_url(url), "{url}");
        }
        assert!(!is_external_url("../img/a.png"));
        assert!(!is_external_url("img/a.png"));
    }

    #[test]
    fn test_split_suffix() {
        assert_eq!(split_suffix("font.eot?#iefix"), ("font.eot", "?#iefix"));
        assert_eq!(split_suffix("a.svg#frag"), ("a.svg", "#frag"));
        assert_eq!(split_suffix("a.png"), ("a.png", ""));
    }
}
