//! Manifest executor.
//!
//! # Module Structure
//!
//! ```text
//! compiler/
//! ├── resolve.rs   # Specifier → file
//! ├── loader/      # Rule loader chains (js, css, html, file)
//! ├── graph.rs     # Module discovery and URL linking
//! ├── runtime.rs   # Bundle rendering
//! ├── plugin/      # Plugin directives
//! ├── output.rs    # In-memory emitted files
//! └── stats.rs     # Build report
//! ```
//!
//! # Build phases
//!
//! 1. **Discover** - load the entry and template graphs layer by layer
//! 2. **Link** - substitute emitted URLs into stylesheets and documents
//! 3. **Emit** - rule-emitted files, then the bundle
//! 4. **Plugins** - in manifest order
//!
//! Nothing touches the output directory; callers write [`BuildOutput::assets`].

mod error;
mod graph;
mod loader;
mod output;
mod plugin;
mod resolve;
mod runtime;
mod stats;

pub use error::CompileError;
pub use output::Assets;
pub use stats::{BuildStats, format_size};

use std::path::{Path, PathBuf};
use std::time::Instant;

use graph::ModuleGraph;
use loader::{LoadContext, ModuleContent, browsers};
use plugin::PluginContext;
use resolve::Resolver;

use crate::config::ProjectConfig;
use crate::manifest::{Manifest, Plugin};

/// Result of a successful build.
#[derive(Debug)]
pub struct BuildOutput {
    pub assets: Assets,
    pub stats: BuildStats,
}

/// Executes a [`Manifest`] for a project.
pub struct Compiler<'a> {
    config: &'a ProjectConfig,
    manifest: &'a Manifest,
}

impl<'a> Compiler<'a> {
    pub fn new(config: &'a ProjectConfig, manifest: &'a Manifest) -> Self {
        Self { config, manifest }
    }

    fn root(&self) -> &Path {
        self.config.get_root()
    }

    /// Graph roots: the entry, then the template of each page plugin.
    fn roots(&self) -> Vec<PathBuf> {
        let root = self.root();
        let mut roots = vec![root.join(&self.manifest.entry.path)];
        for plugin in &self.manifest.plugins {
            if let Plugin::HtmlPage { template, .. } = plugin {
                roots.push(root.join(template));
            }
        }
        roots
    }

    pub fn run(&self) -> Result<BuildOutput, CompileError> {
        let start = Instant::now();
        let manifest = self.manifest;
        let root = self.root();

        let resolver = Resolver::new();
        let ctx = LoadContext {
            root,
            rules: &manifest.rules,
            resolver: &resolver,
            js_target: &self.config.js.target,
            css_targets: browsers(&self.config.css.targets),
            source_maps: manifest.devtool.uses_eval(),
        };

        let roots = self.roots();
        let mut graph = ModuleGraph::build(&ctx, &roots)?;
        graph.link()?;
        crate::debug!("compile"; "{} modules discovered", graph.modules().len());

        let mut assets = Assets::default();
        for module in graph.modules() {
            if let ModuleContent::Asset { output, bytes } = &module.content {
                assets.emit(output.as_str(), bytes.as_slice());
            }
        }

        let entry = ctx.module_id(&roots[0]);
        let bundle = manifest.bundle_filename();
        assets.emit(
            bundle.as_str(),
            runtime::render(&graph, &entry, manifest.mode, manifest.devtool),
        );

        let mut warnings = graph.warnings().to_vec();
        let plugin_ctx = PluginContext {
            root,
            graph: &graph,
            entry: &entry,
            bundle: &bundle,
        };
        for directive in &manifest.plugins {
            plugin::apply(directive, &plugin_ctx, &mut assets, &mut warnings)?;
        }

        let stats = BuildStats::new(graph.modules().len(), &assets, warnings, start.elapsed());
        Ok(BuildOutput { assets, stats })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::test_config_at;
    use crate::manifest::LifecycleEvent;
    use crate::utils::hash::content_hash;
    use crate::utils::path::normalize_path;
    use std::fs;
    use tempfile::TempDir;

    /// Write `(relative path, content)` pairs below `root`.
    pub(crate) fn write_files(root: &Path, files: &[(&str, &str)]) {
        for (path, content) in files {
            let path = root.join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
    }

    const INDEX_HTML: &str = "<!DOCTYPE html>\n<html>\n<head>\n<title>demo</title>\n</head>\n<body>\n<img src=\"img/rotate.svg\" alt=\"\">\n</body>\n</html>\n";

    /// A project in the default layout.
    fn project() -> TempDir {
        let dir = TempDir::new().unwrap();
        write_files(
            dir.path(),
            &[
                ("src/index.html", INDEX_HTML),
                (
                    "src/js/index.js",
                    "import '../css/main.scss';\nimport beep from '../audio/beep.mp3';\nimport data from './data.json';\nimport { greet } from './greet';\nexport const run = () => greet(data.name, beep);\nrun();\n",
                ),
                (
                    "src/js/greet.js",
                    "export function greet(name, sound) {\n  return `hello ${name} ${sound}`;\n}\n",
                ),
                ("src/js/data.json", "{ \"name\": \"kiln\" }\n"),
                (
                    "src/css/main.scss",
                    "$accent: #c00;\nbody {\n  color: $accent;\n  background: url(../img/bg.png);\n}\n@font-face {\n  font-family: Display;\n  src: url(../fonts/display.woff2);\n}\n",
                ),
                ("src/img/bg.png", "png"),
                ("src/img/rotate.svg", "<svg/>"),
                ("src/audio/beep.mp3", "mp3"),
                ("src/fonts/display.woff2", "woff2"),
            ],
        );
        dir
    }

    fn build(dir: &TempDir, event: &str) -> Result<BuildOutput, CompileError> {
        let config = test_config_at(&normalize_path(dir.path()));
        let manifest = Manifest::new(LifecycleEvent::parse(event), &config);
        Compiler::new(&config, &manifest).run()
    }

    fn text<'a>(output: &'a BuildOutput, path: &str) -> &'a str {
        let asset = output
            .assets
            .get(path)
            .unwrap_or_else(|| panic!("{path} not emitted"));
        std::str::from_utf8(&asset.bytes).unwrap()
    }

    #[test]
    fn test_dev_build_emits_everything() {
        let dir = project();
        let output = build(&dir, "dev").unwrap();

        let audio = format!("audio/{}.mp3", content_hash("mp3"));
        let font = format!("fonts/{}.woff2", content_hash("woff2"));
        for path in [
            "index.js",
            "style.css",
            "index.html",
            "rotate.svg",
            "img/bg.png",
            "img/rotate.svg",
            "audio/beep.mp3",
            audio.as_str(),
            font.as_str(),
        ] {
            assert!(output.assets.contains(path), "{path} missing");
        }

        let css = text(&output, "style.css");
        assert!(css.contains("url(\"img/bg.png\")"), "{css}");
        assert!(css.contains(&format!("url(\"{font}\")")), "{css}");
        assert!(!css.contains("$accent"));

        let js = text(&output, "index.js");
        assert!(js.contains("eval("));
        assert!(js.contains("//# sourceURL=kiln:///./src/js/index.js"));
        assert!(js.contains("//# sourceURL=kiln:///./src/js/greet.js"));
        assert!(js.contains("NODE_ENV: \"development\""));
        assert!(js.contains(&audio));
        // template-only modules stay out of the bundle
        assert!(!js.contains("kiln:///./src/index.html"));

        let html = text(&output, "index.html");
        assert!(html.contains("<link rel=\"icon\" href=\"rotate.svg\">"));
        assert!(html.contains("<link href=\"style.css\" rel=\"stylesheet\"></head>"));
        assert!(html.contains("<script src=\"index.js\"></script></body>"));
        assert!(html.contains("<img src=\"img/rotate.svg\" alt=\"\">"));

        assert!(output.stats.warnings.is_empty());
        assert_eq!(output.stats.assets.len(), output.assets.len());
    }

    #[test]
    fn test_production_build_is_minified_without_eval() {
        let dir = project();
        let output = build(&dir, "build").unwrap();

        let js = text(&output, "index.js");
        assert!(!js.contains("eval("));
        assert!(!js.contains("sourceURL"));
        assert!(js.contains("hello "));
        assert!(!js.contains("/*"));
        assert!(!js.lines().any(|line| line.trim_start().starts_with("//")));

        let plain = build(&dir, "start").unwrap();
        assert!(js.len() < text(&plain, "index.js").len(), "bundle not minified");
    }

    #[test]
    fn test_other_event_builds_plain_development_bundle() {
        let dir = project();
        let output = build(&dir, "start").unwrap();

        let js = text(&output, "index.js");
        assert!(!js.contains("eval("));
        assert!(js.contains("NODE_ENV: \"development\""));
        assert!(js.contains("\"./src/js/greet.js\": [function (module, exports, require)"));
    }

    #[test]
    fn test_unhandled_import_fails_build() {
        let dir = project();
        write_files(
            dir.path(),
            &[
                ("src/js/index.js", "import notes from '../notes.txt';\nconsole.log(notes);\n"),
                ("src/notes.txt", "plain text"),
            ],
        );

        let err = build(&dir, "build").unwrap_err();
        assert!(matches!(err, CompileError::Unhandled { ref id, .. } if id == "./src/notes.txt"));
    }

    #[test]
    fn test_missing_static_dir_warns() {
        let dir = project();
        fs::remove_dir_all(dir.path().join("src/audio")).unwrap();
        write_files(
            dir.path(),
            &[("src/js/index.js", "import '../css/main.scss';\n")],
        );

        let output = build(&dir, "dev").unwrap();
        assert_eq!(output.stats.warnings.len(), 1);
        assert!(output.stats.warnings[0].contains("audio"));
    }

    #[test]
    fn test_write_output() {
        let dir = project();
        let output = build(&dir, "build").unwrap();
        let out_dir = dir.path().join("dist");
        output.assets.write_to(&out_dir, true).unwrap();

        assert!(out_dir.join("index.html").is_file());
        assert!(out_dir.join("style.css").is_file());
        assert!(out_dir.join("img/bg.png").is_file());
    }
}
