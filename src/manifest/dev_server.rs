//! Dev-server descriptor. Inert outside `kiln dev`.

use serde::Serialize;
use std::path::PathBuf;

/// Verbosity of the in-browser client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientLogLevel {
    None,
}

/// How much of a build report the dev server prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatsPreset {
    /// Only failures are reported; success summaries need `--verbose`.
    ErrorsOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DevServer {
    /// Directory served as the site root.
    pub content_base: PathBuf,
    /// Gzip compressible responses.
    pub compress: bool,
    pub port: u16,
    /// Show build failures over the page.
    pub overlay: bool,
    pub client_log_level: ClientLogLevel,
    pub stats: StatsPreset,
}

impl DevServer {
    pub fn new(content_base: PathBuf, port: u16) -> Self {
        Self {
            content_base,
            compress: true,
            port,
            overlay: true,
            client_log_level: ClientLogLevel::None,
            stats: StatsPreset::ErrorsOnly,
        }
    }
}
