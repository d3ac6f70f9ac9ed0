//! `[js]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [js]
//! target = "es2015"   # Syntax level project scripts are lowered to
//! ```

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

pub const FIELD_TARGET: &str = "js.target";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JsConfig {
    /// Transpile target (`es5`, `es2015` … `es2024`, `esnext`).
    pub target: String,
}

impl Default for JsConfig {
    fn default() -> Self {
        Self {
            target: "es2015".into(),
        }
    }
}

impl JsConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if !is_known_target(&self.target) {
            diag.error(FIELD_TARGET, format!("unknown target `{}`", self.target))
                .hint("use `es2015` through `es2024`, or `esnext`");
        }
    }
}

fn is_known_target(target: &str) -> bool {
    let target = target.to_ascii_lowercase();
    if target == "esnext" || target == "es5" || target == "es6" {
        return true;
    }
    target
        .strip_prefix("es")
        .and_then(|year| year.parse::<u16>().ok())
        .is_some_and(|year| (2015..=2024).contains(&year))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_js_default() {
        let config = test_parse_config("");
        assert_eq!(config.js.target, "es2015");
    }

    #[test]
    fn test_known_targets() {
        assert!(is_known_target("es2015"));
        assert!(is_known_target("ES2020"));
        assert!(is_known_target("esnext"));
        assert!(!is_known_target("es2030"));
        assert!(!is_known_target("chrome80"));
    }

    #[test]
    fn test_validate_unknown_target() {
        let js = JsConfig {
            target: "es3".into(),
        };
        let mut diag = ConfigDiagnostics::new();
        js.validate(&mut diag);
        assert!(diag.has_errors());
    }
}
