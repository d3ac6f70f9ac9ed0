//! `[css]` section configuration.
//!
//! Browser targets used when adding vendor prefixes to stylesheets.
//! Versions are `major[.minor[.patch]]` strings; omitted browsers get no
//! prefixes of their own.
//!
//! # Example
//!
//! ```toml
//! [css.targets]
//! chrome = "80"
//! safari = "13.1"
//! ios_saf = "13.4"
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

pub const FIELD_TARGETS: &str = "css.targets";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CssConfig {
    /// Vendor-prefix targets.
    pub targets: CssTargets,
}

/// Minimum browser versions, one optional entry per engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CssTargets {
    pub android: Option<String>,
    pub chrome: Option<String>,
    pub edge: Option<String>,
    pub firefox: Option<String>,
    pub ie: Option<String>,
    pub ios_saf: Option<String>,
    pub opera: Option<String>,
    pub safari: Option<String>,
    pub samsung: Option<String>,
}

impl Default for CssTargets {
    fn default() -> Self {
        Self {
            android: None,
            chrome: Some("61".into()),
            edge: Some("16".into()),
            firefox: Some("60".into()),
            ie: None,
            ios_saf: Some("11".into()),
            opera: None,
            safari: Some("11".into()),
            samsung: None,
        }
    }
}

impl CssTargets {
    /// All configured `(browser, version)` pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("android", &self.android),
            ("chrome", &self.chrome),
            ("edge", &self.edge),
            ("firefox", &self.firefox),
            ("ie", &self.ie),
            ("ios_saf", &self.ios_saf),
            ("opera", &self.opera),
            ("safari", &self.safari),
            ("samsung", &self.samsung),
        ]
        .into_iter()
        .filter_map(|(name, version)| version.as_deref().map(|v| (name, v)))
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        for (name, version) in self.entries() {
            if encode_version(version).is_none() {
                diag.error(FIELD_TARGETS, format!("invalid version `{version}` for `{name}`"))
                    .hint("expected `major`, `major.minor` or `major.minor.patch`");
            }
        }
    }
}

/// Encode `major.minor.patch` as `major << 16 | minor << 8 | patch`.
///
/// ```ignore
/// assert_eq!(encode_version("13.1"), Some(13 << 16 | 1 << 8));
/// ```
pub fn encode_version(version: &str) -> Option<u32> {
    let mut parts = version.trim().split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor = parts.next().map_or(Ok(0), |p| p.parse::<u32>()).ok()?;
    let patch = parts.next().map_or(Ok(0), |p| p.parse::<u32>()).ok()?;
    if parts.next().is_some() || minor > 255 || patch > 255 || major > 0xFFFF {
        return None;
    }
    Some((major << 16) | (minor << 8) | patch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_encode_version() {
        assert_eq!(encode_version("80"), Some(80 << 16));
        assert_eq!(encode_version("13.1"), Some(13 << 16 | 1 << 8));
        assert_eq!(encode_version("13.4.2"), Some(13 << 16 | 4 << 8 | 2));
        assert_eq!(encode_version(""), None);
        assert_eq!(encode_version("x"), None);
        assert_eq!(encode_version("1.2.3.4"), None);
        assert_eq!(encode_version("1.300"), None);
    }

    #[test]
    fn test_targets_override() {
        let config = test_parse_config("[css.targets]\nchrome = \"90\"\nie = \"11\"");
        assert_eq!(config.css.targets.chrome.as_deref(), Some("90"));
        assert_eq!(config.css.targets.ie.as_deref(), Some("11"));
        // untouched entries keep defaults
        assert_eq!(config.css.targets.safari.as_deref(), Some("11"));
    }

    #[test]
    fn test_targets_validate() {
        let targets = CssTargets {
            chrome: Some("latest".into()),
            ..CssTargets::default()
        };
        let mut diag = ConfigDiagnostics::new();
        targets.validate(&mut diag);
        assert_eq!(diag.errors().len(), 1);

        let mut diag = ConfigDiagnostics::new();
        CssTargets::default().validate(&mut diag);
        assert!(!diag.has_errors());
    }
}
