//! Asset rule table.
//!
//! Each rule routes files matching its pattern through a loader chain. Chains
//! are stored in declaration order; the last loader runs first, so
//! `[Style, Extract, Css, Postcss, Sass]` compiles Sass before anything else.

use regex::Regex;
use serde::{Serialize, Serializer};
use std::path::Path;

/// Emitted file name template for the file loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FileName {
    /// Keep the source file name.
    #[serde(rename = "[name].[ext]")]
    Original,
    /// Name the file after a hash of its contents.
    #[serde(rename = "[contenthash].[ext]")]
    ContentHash,
}

/// One step of a rule's transformation chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "loader", rename_all = "kebab-case")]
pub enum Loader {
    /// Export the document text with asset references rewritten.
    Html { minimize: bool },
    /// Rewrite module syntax and lower to the configured target.
    Transpile,
    /// Inject the stylesheet at runtime when no extracted link is present.
    Style,
    /// Hand the stylesheet to the extract plugin.
    Extract,
    /// Inline `@import` and resolve `url()` references.
    Css,
    /// Add vendor prefixes for the configured browser targets.
    Postcss,
    /// Compile Sass to CSS.
    Sass,
    /// Emit the file under `output_path` and export its public URL.
    File {
        output_path: &'static str,
        name: FileName,
    },
}

/// Where a rule's output ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Destination {
    /// Inlined into the importing module or entry document.
    Inline,
    /// Bundled into `[name].js`.
    Bundle,
    /// Concatenated into the extracted stylesheet.
    Stylesheet,
    /// Emitted under an output subdirectory.
    Directory(&'static str),
}

#[derive(Debug, Clone, Serialize)]
pub struct Rule {
    pub name: &'static str,
    #[serde(serialize_with = "serialize_regex")]
    pub test: Regex,
    #[serde(serialize_with = "serialize_opt_regex")]
    pub exclude: Option<Regex>,
    #[serde(rename = "use")]
    pub loaders: Vec<Loader>,
    pub output: Destination,
}

impl Rule {
    fn new(
        name: &'static str,
        test: &str,
        exclude: Option<&str>,
        loaders: Vec<Loader>,
        output: Destination,
    ) -> Self {
        Self {
            name,
            test: compile(test),
            exclude: exclude.map(compile),
            loaders,
            output,
        }
    }

    /// Whether the pattern matches `path` and no exclude pattern does.
    pub fn matches(&self, path: &Path) -> bool {
        let path = path.to_string_lossy().replace('\\', "/");
        self.test.is_match(&path) && !self.exclude.as_ref().is_some_and(|ex| ex.is_match(&path))
    }

    /// Loaders in execution order (last declared runs first).
    pub fn pipeline(&self) -> impl Iterator<Item = Loader> + '_ {
        self.loaders.iter().rev().copied()
    }
}

/// Compile one of the fixed table patterns.
fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("rule table patterns are valid")
}

fn serialize_regex<S: Serializer>(re: &Regex, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(re.as_str())
}

fn serialize_opt_regex<S: Serializer>(re: &Option<Regex>, s: S) -> Result<S::Ok, S::Error> {
    match re {
        Some(re) => s.serialize_some(re.as_str()),
        None => s.serialize_none(),
    }
}

/// The ordered rule table. First match wins.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn default_table() -> Self {
        use Destination::*;
        use Loader::*;

        let stylesheet = |name, test, head: &[Loader]| {
            let mut chain = vec![Style, Extract, Css, Postcss];
            chain.extend_from_slice(head);
            Rule::new(name, test, None, chain, Stylesheet)
        };
        let file = |name, test, output_path, name_tpl| {
            let loader = File {
                output_path,
                name: name_tpl,
            };
            Rule::new(name, test, None, vec![loader], Directory(output_path))
        };

        Self {
            rules: vec![
                Rule::new("html", r"\.html$", None, vec![Html { minimize: false }], Inline),
                Rule::new("js", r"\.js$", Some("node_modules"), vec![Transpile], Bundle),
                stylesheet("css", r"\.css$", &[]),
                stylesheet("scss", r"\.scss$", &[Sass]),
                file("image", r"\.(jpe?g|png|svg|gif)$", "img/", FileName::Original),
                file("font", r"\.(woff|woff2|ttf|otf|eot)$", "fonts/", FileName::ContentHash),
                file("audio", r"(?i)\.(mp3)$", "audio/", FileName::ContentHash),
            ],
        }
    }

    /// First rule matching `path`.
    pub fn find(&self, path: &Path) -> Option<&Rule> {
        self.iter().find(|rule| rule.matches(path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }
}
