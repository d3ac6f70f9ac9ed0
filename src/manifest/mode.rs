//! Mode and source-map policy resolution from the lifecycle signal.
//!
//! | signal          | mode        | devtool                         |
//! |-----------------|-------------|---------------------------------|
//! | `build`         | production  | `none`                          |
//! | `dev`           | development | `cheap-module-eval-source-map`  |
//! | anything else   | development | `none`                          |
//!
//! Resolution never fails: an unrecognized signal falls back to development
//! with source maps disabled.

use serde::Serialize;
use std::fmt;

/// Environment variable set by npm-style script runners.
pub const LIFECYCLE_ENV: &str = "npm_lifecycle_event";

/// The lifecycle signal naming the invoking script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    Build,
    Dev,
    /// Unrecognized, empty or absent signal.
    Other(String),
}

impl LifecycleEvent {
    pub fn parse(signal: &str) -> Self {
        match signal {
            "build" => Self::Build,
            "dev" => Self::Dev,
            other => Self::Other(other.to_string()),
        }
    }

    /// Read the signal from [`LIFECYCLE_ENV`]; absent reads as empty.
    pub fn from_env() -> Self {
        Self::parse(&std::env::var(LIFECYCLE_ENV).unwrap_or_default())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Build => "build",
            Self::Dev => "dev",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.as_str().is_empty() {
            f.write_str("<none>")
        } else {
            f.write_str(self.as_str())
        }
    }
}

/// Build mode. Controls minification and `process.env.NODE_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    pub fn resolve(event: &LifecycleEvent) -> Self {
        match event {
            LifecycleEvent::Build => Self::Production,
            _ => Self::Development,
        }
    }

    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
        }
    }
}

/// Source-map policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Devtool {
    #[serde(rename = "none")]
    None,
    /// Each module is evaluated with `eval` and carries an inline,
    /// line-granular source map.
    #[serde(rename = "cheap-module-eval-source-map")]
    CheapModuleEvalSourceMap,
}

impl Devtool {
    pub fn resolve(event: &LifecycleEvent) -> Self {
        match event {
            LifecycleEvent::Dev => Self::CheapModuleEvalSourceMap,
            _ => Self::None,
        }
    }

    pub const fn uses_eval(self) -> bool {
        matches!(self, Self::CheapModuleEvalSourceMap)
    }
}
