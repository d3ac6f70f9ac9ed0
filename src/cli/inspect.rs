//! `kiln inspect`: print the resolved manifest.

use anyhow::{Context, Result};

use super::args::InspectFormat;
use crate::config::ProjectConfig;
use crate::manifest::{LifecycleEvent, Manifest};

/// Print the manifest for `event`, or for `$npm_lifecycle_event` when unset.
pub fn inspect(config: &ProjectConfig, event: Option<&str>, format: InspectFormat) -> Result<()> {
    let event = event.map_or_else(LifecycleEvent::from_env, LifecycleEvent::parse);
    let manifest = Manifest::new(event, config);
    println!("{}", render(&manifest, format)?);
    Ok(())
}

fn render(manifest: &Manifest, format: InspectFormat) -> Result<String> {
    match format {
        InspectFormat::Json => {
            serde_json::to_string_pretty(manifest).context("failed to serialize manifest")
        }
        InspectFormat::Toml => {
            toml::to_string_pretty(manifest).context("failed to serialize manifest")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config_at;
    use tempfile::TempDir;

    #[test]
    fn test_render_json() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path());
        let manifest = Manifest::new(LifecycleEvent::parse("dev"), &config);

        let json = render(&manifest, InspectFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["mode"], "development");
        assert_eq!(value["entry"]["index"], "./src/js/index.js");
        assert_eq!(value["dev_server"]["port"], 3000);
    }

    #[test]
    fn test_render_toml() {
        let dir = TempDir::new().unwrap();
        let config = test_config_at(dir.path());
        let manifest = Manifest::new(LifecycleEvent::parse("build"), &config);

        let toml = render(&manifest, InspectFormat::Toml).unwrap();
        assert!(toml.contains("mode = \"production\""));
    }
}
