//! Build report.

use std::time::Duration;

use super::output::Assets;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetStat {
    pub path: String,
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct BuildStats {
    /// Modules in the graph, including the template's.
    pub modules: usize,
    pub assets: Vec<AssetStat>,
    pub warnings: Vec<String>,
    pub elapsed: Duration,
}

impl BuildStats {
    pub fn new(modules: usize, assets: &Assets, warnings: Vec<String>, elapsed: Duration) -> Self {
        Self {
            modules,
            assets: assets
                .iter()
                .map(|asset| AssetStat {
                    path: asset.path.clone(),
                    size: asset.bytes.len(),
                })
                .collect(),
            warnings,
            elapsed,
        }
    }

    pub fn total_size(&self) -> usize {
        self.assets.iter().map(|a| a.size).sum()
    }

    /// `12 modules, 7 assets (48.2 KiB) in 310ms`
    pub fn summary(&self) -> String {
        format!(
            "{}, {} ({}) in {}ms",
            plural(self.modules, "module"),
            plural(self.assets.len(), "asset"),
            format_size(self.total_size()),
            self.elapsed.as_millis()
        )
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// Human-readable byte count.
pub fn format_size(bytes: usize) -> String {
    const UNITS: [&str; 3] = ["KiB", "MiB", "GiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{size:.1} {}", UNITS[unit])
}
