//! Build manifest: the static description of how a build routes and
//! transforms assets.
//!
//! # Module Structure
//!
//! ```text
//! manifest/
//! ├── mode.rs        # LifecycleEvent → Mode, Devtool
//! ├── rule.rs        # Rule table and loader chains
//! ├── plugin.rs      # Plugin directives
//! └── dev_server.rs  # Dev-server descriptor
//! ```
//!
//! A manifest is built once per invocation from the lifecycle signal and the
//! project config. It performs no I/O and never fails; the compiler executes
//! it and `kiln inspect` prints it.

mod dev_server;
mod mode;
mod plugin;
mod rule;

pub use dev_server::{DevServer, StatsPreset};
pub use mode::{Devtool, LifecycleEvent, Mode};
pub use plugin::{CopyPattern, Plugin, STYLESHEET_FILENAME, plugins};
pub use rule::{FileName, Loader, RuleSet};

use serde::{Serialize, Serializer, ser::SerializeMap};
use std::path::PathBuf;

use crate::config::ProjectConfig;

/// Bundle runs in a browser as a plain script.
pub const TARGET: &str = "web";

/// Output file name template for script bundles.
pub const BUNDLE_FILENAME: &str = "[name].js";

/// The single named entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    /// Entry script, relative to the project root.
    pub path: PathBuf,
}

impl Serialize for Entry {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        let mut map = s.serialize_map(Some(1))?;
        map.serialize_entry(&self.name, &format!("./{}", self.path.display()))?;
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Output {
    /// Absolute output directory.
    pub path: PathBuf,
    pub filename: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    #[serde(serialize_with = "serialize_event")]
    pub event: LifecycleEvent,
    pub mode: Mode,
    pub devtool: Devtool,
    pub target: &'static str,
    pub entry: Entry,
    pub output: Output,
    pub rules: RuleSet,
    pub plugins: Vec<Plugin>,
    pub dev_server: DevServer,
}

fn serialize_event<S: Serializer>(event: &LifecycleEvent, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(event.as_str())
}

impl Manifest {
    pub fn new(event: LifecycleEvent, config: &ProjectConfig) -> Self {
        let mode = Mode::resolve(&event);
        let devtool = Devtool::resolve(&event);
        let build = &config.build;

        Self {
            event,
            mode,
            devtool,
            target: TARGET,
            entry: Entry {
                name: build.entry_name.clone(),
                path: config.root_relative(&build.entry),
            },
            output: Output {
                path: build.output.clone(),
                filename: BUNDLE_FILENAME,
            },
            rules: RuleSet::default_table(),
            plugins: plugins(
                mode,
                &config.root_relative(&build.src),
                &config.root_relative(&build.template),
                &config.root_relative(&build.favicon),
            ),
            dev_server: DevServer::new(build.output.clone(), config.serve.port),
        }
    }

    /// Bundle file name with `[name]` substituted.
    pub fn bundle_filename(&self) -> String {
        self.output.filename.replace("[name]", &self.entry.name)
    }

    pub fn minifies(&self) -> bool {
        self.plugins.contains(&Plugin::MinifyJs)
    }
}
