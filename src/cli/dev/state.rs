//! Dev server state shared by request handlers and the watcher.
//!
//! - `REVISION`: bumped after every build, polled by the live-reload client
//! - `BUILD_ERROR`: message of the last failed build, shown in the overlay
//! - `SHUTDOWN`: Ctrl+C received

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, OnceLock};

use crossbeam::channel::Sender;
use tiny_http::Server;

static REVISION: AtomicU64 = AtomicU64::new(0);

static BUILD_ERROR: LazyLock<RwLock<Option<String>>> = LazyLock::new(|| RwLock::new(None));

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Stops the watcher thread
static SHUTDOWN_TX: OnceLock<Sender<()>> = OnceLock::new();

/// Serializes tests that touch the build outcome.
#[cfg(test)]
pub static TEST_LOCK: parking_lot::Mutex<()> = parking_lot::const_mutex(());

// =============================================================================
// Build outcome
// =============================================================================

pub fn revision() -> u64 {
    REVISION.load(Ordering::Acquire)
}

pub fn build_error() -> Option<String> {
    BUILD_ERROR.read().clone()
}

pub fn record_success() {
    *BUILD_ERROR.write() = None;
    REVISION.fetch_add(1, Ordering::AcqRel);
}

/// Failed builds bump the revision too, so open pages reload into the overlay.
pub fn record_failure(message: String) {
    *BUILD_ERROR.write() = Some(message);
    REVISION.fetch_add(1, Ordering::AcqRel);
}

// =============================================================================
// Shutdown
// =============================================================================

/// Install the Ctrl+C handler. Call once at program start.
///
/// Before a server is registered the process exits immediately; afterwards
/// the server is unblocked and the watcher notified.
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        if let Some(tx) = SHUTDOWN_TX.get() {
            let _ = tx.send(());
        }

        match SERVER.get() {
            Some(server) => {
                crate::log!("serve"; "shutting down...");
                server.unblock();
            }
            None => std::process::exit(0),
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

pub fn register_server(server: Arc<Server>, shutdown_tx: Sender<()>) {
    let _ = SERVER.set(server);
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_outcome() {
        let _guard = TEST_LOCK.lock();
        let before = revision();

        record_failure("module not found".into());
        assert_eq!(build_error().as_deref(), Some("module not found"));
        assert!(revision() > before);

        let failed_at = revision();
        record_success();
        assert_eq!(build_error(), None);
        assert!(revision() > failed_at);
    }
}
