//! Source watcher: rebuild after changes settle.

use anyhow::{Context, Result};
use crossbeam::channel::{self, Receiver, select};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::ProjectConfig;
use crate::log;
use crate::manifest::Manifest;

/// Quiet period after the last change before rebuilding.
const DEBOUNCE: Duration = Duration::from_millis(200);

/// Start watching the source root. The thread exits on `shutdown`.
pub fn spawn(
    config: Arc<ProjectConfig>,
    manifest: Arc<Manifest>,
    shutdown: Receiver<()>,
) -> Result<JoinHandle<()>> {
    let (tx, events) = channel::unbounded();
    let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })
    .context("failed to create file watcher")?;

    let src = &config.build.src;
    watcher
        .watch(src, RecursiveMode::Recursive)
        .with_context(|| format!("failed to watch {}", src.display()))?;
    crate::debug!("watch"; "{}", src.display());

    Ok(thread::spawn(move || {
        // keep the watcher alive for the thread's lifetime
        let _watcher = watcher;
        let mut pending = false;

        loop {
            select! {
                recv(shutdown) -> _ => break,
                recv(events) -> msg => match msg {
                    Ok(Ok(event)) => pending |= is_relevant(&event, &manifest.output.path),
                    Ok(Err(e)) => log!("watch"; "notify error: {}", e),
                    Err(_) => break,
                },
                default(DEBOUNCE) => {
                    if pending {
                        pending = false;
                        super::rebuild(&config, &manifest);
                    }
                }
            }
        }
    }))
}

/// Content changes outside the output directory.
fn is_relevant(event: &Event, output: &Path) -> bool {
    matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) && event.paths.iter().any(|path| !path.starts_with(output))
}
