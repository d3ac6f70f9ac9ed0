//! Project configuration management for `kiln.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! │   ├── build      # [build]
//! │   ├── css        # [css]
//! │   ├── js         # [js]
//! │   └── serve      # [serve]
//! ├── error.rs       # ConfigError, ConfigDiagnostics
//! └── mod.rs         # ProjectConfig (this file)
//! ```
//!
//! The config file is optional: every field has a default matching the
//! conventional `src/` → `dist/` layout, so a project without `kiln.toml`
//! builds from the current directory.

mod error;
mod section;
mod util;

use util::find_config_file;

pub use error::{ConfigDiagnostics, ConfigError};
pub use section::{BuildConfig, CssConfig, CssTargets, JsConfig, ServeConfig, encode_version};

use crate::{
    cli::{BuildArgs, Cli, Commands},
    log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing kiln.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Absolute path to the config file, if one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Project root directory - parent of config file, or cwd (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    /// Project layout
    #[serde(default)]
    pub build: BuildConfig,

    /// Stylesheet settings
    #[serde(default)]
    pub css: CssConfig,

    /// Script settings
    #[serde(default)]
    pub js: JsConfig,

    /// Development server settings
    #[serde(default)]
    pub serve: ServeConfig,
}

impl ProjectConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. The project root is the
    /// config file's parent directory, or cwd when no file exists.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                config.config_path = Some(path);
                config
            }
            None => {
                crate::debug!("config"; "no {} found, using defaults", cli.config.display());
                Self {
                    root: cwd,
                    ..Self::default()
                }
            }
        };

        config.finalize(cli);
        // the manifest is derived from paths alone
        let require_files = !matches!(cli.command, Commands::Inspect { .. });
        config.validate(require_files)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)
            .map_err(|err| ConfigError::Toml(path.to_path_buf(), err))?;

        if !ignored.is_empty() {
            Self::warn_unknown_fields(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), toml::de::Error> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Unknown keys are most likely typos; they are ignored, not fatal.
    fn warn_unknown_fields(fields: &[String], path: &Path) {
        let name = path.file_name().unwrap_or(path.as_os_str()).to_string_lossy();
        log!("warning"; "ignoring unknown fields in {}: {}", name, fields.join(", "));
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Get path relative to the project root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Normalize paths and apply command-specific options.
    fn finalize(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        Self::update_option(&mut self.build.output, cli.output.as_ref());

        let root = crate::utils::path::normalize_path(&self.root);
        self.build.normalize(&root);
        self.root = root;

        match &cli.command {
            Commands::Build { build_args } => self.apply_build_args(build_args),
            Commands::Dev {
                build_args,
                interface,
                port,
                watch,
            } => {
                self.apply_build_args(build_args);
                Self::update_option(&mut self.serve.interface, interface.as_ref());
                Self::update_option(&mut self.serve.port, port.as_ref());
                Self::update_option(&mut self.serve.watch, watch.as_ref());
            }
            Commands::Inspect { .. } => {}
        }
    }

    fn apply_build_args(&mut self, args: &BuildArgs) {
        self.build.clean = args.clean;
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate configuration, collecting all errors before returning.
    ///
    /// `require_files` also checks that the source layout exists on disk.
    pub fn validate(&self, require_files: bool) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.build.validate(&self.root, require_files, &mut diag);
        self.css.targets.validate(&mut diag);
        self.js.validate(&mut diag);
        self.serve.validate(&mut diag);

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> ProjectConfig {
    let (parsed, ignored) = ProjectConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Build a normalized config rooted at `root` with default settings.
#[cfg(test)]
pub fn test_config_at(root: &Path) -> ProjectConfig {
    let root = crate::utils::path::normalize_path(root);
    let mut config = ProjectConfig {
        root: root.clone(),
        ..ProjectConfig::default()
    };
    config.build.normalize(&root);
    config
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_invalid_toml() {
        let result = ProjectConfig::parse_with_ignored("[build\nentry = \"x\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_project_config_default() {
        let config = ProjectConfig::default();
        assert!(config.config_path.is_none());
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert_eq!(config.serve.port, 3000);
        assert_eq!(config.js.target, "es2015");
    }

    #[test]
    fn test_unknown_fields_detected() {
        let content = "[build]\nentry = \"src/app.js\"\n[bundle]\nsplit = true";
        let (config, ignored) = ProjectConfig::parse_with_ignored(content).unwrap();

        assert_eq!(config.build.entry, PathBuf::from("src/app.js"));
        assert!(ignored.iter().any(|f| f.contains("bundle")));
    }

    #[test]
    fn test_no_unknown_fields() {
        let content = "[build]\noutput = \"public\"\n[serve]\nport = 4000";
        let (_, ignored) = ProjectConfig::parse_with_ignored(content).unwrap();
        assert!(ignored.is_empty());
    }

    #[test]
    fn test_root_relative() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path());
        assert_eq!(
            config.root_relative(config.root.join("src/js/index.js")),
            PathBuf::from("src/js/index.js")
        );
    }

    #[test]
    fn test_validate_reports_all_sections() {
        let dir = TempDir::new().unwrap();
        let mut config = test_config_at(dir.path());
        config.serve.port = 0;
        config.js.target = "es1999".into();

        let err = config.validate(true).unwrap_err();
        let Some(ConfigError::Diagnostics(diag)) = err.downcast_ref::<ConfigError>() else {
            panic!("expected diagnostics, got {err}");
        };
        let fields: Vec<_> = diag.errors().iter().map(|d| d.field).collect();
        assert!(fields.contains(&"serve.port"));
        assert!(fields.contains(&"js.target"));
        assert!(fields.contains(&"build.entry"));
    }

    #[test]
    fn test_inspect_skips_missing_sources() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path());
        assert!(config.validate(true).is_err());
        assert!(config.validate(false).is_ok());
    }
}
