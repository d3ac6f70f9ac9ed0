//! `kiln dev`: development build, static server and rebuild-on-change.
//!
//! ```text
//! main thread ── request loop ──► rayon pool (4) ──► response
//! watch thread ── notify ──► debounce ──► rebuild ──► state (revision, error)
//! ```
//!
//! Pages poll the revision endpoint and reload when it changes.

mod lifecycle;
mod path;
mod response;
mod state;
mod watch;

pub use state::setup_shutdown_handler;

use anyhow::Result;
use crossbeam::channel;
use std::path::Path;
use std::sync::Arc;
use tiny_http::{Request, Server};

use response::ServeOptions;

use super::build::compile;
use crate::config::ProjectConfig;
use crate::embed::serve::REVISION_PATH;
use crate::logger::{Outcome, is_verbose, status};
use crate::manifest::{Manifest, StatsPreset};
use crate::log;

pub fn serve(config: &ProjectConfig, manifest: &Manifest) -> Result<()> {
    let descriptor = &manifest.dev_server;
    let (server, addr) = lifecycle::bind_with_retry(config.serve.interface, descriptor.port)?;
    let server = Arc::new(server);

    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();
    state::register_server(Arc::clone(&server), shutdown_tx);
    log!("serve"; "http://{}", addr);

    // requests queue up until the first build is written
    build_once(config, manifest, config.build.clean);

    let watcher = if config.serve.watch {
        Some(watch::spawn(
            Arc::new(config.clone()),
            Arc::new(manifest.clone()),
            shutdown_rx,
        )?)
    } else {
        None
    };

    let options = ServeOptions::new(descriptor, config.serve.watch);
    run_request_loop(&server, &descriptor.content_base, options)?;
    lifecycle::wait_for_shutdown(watcher);
    Ok(())
}

/// Rebuild after a source change.
fn rebuild(config: &ProjectConfig, manifest: &Manifest) {
    build_once(config, manifest, false);
}

/// Build, record the outcome for the server and report it.
///
/// With the `errors-only` preset a successful build prints nothing unless
/// `--verbose` is set.
fn build_once(config: &ProjectConfig, manifest: &Manifest, clean: bool) {
    match compile(config, manifest, clean) {
        Ok(stats) => {
            state::record_success();
            let quiet = manifest.dev_server.stats == StatsPreset::ErrorsOnly;
            if !quiet || is_verbose() {
                if stats.warnings.is_empty() {
                    status(Outcome::Ok, &stats.summary());
                } else {
                    let mut message = stats.summary();
                    for warning in &stats.warnings {
                        message.push_str("\n  ");
                        message.push_str(warning);
                    }
                    status(Outcome::Warn, &message);
                }
            }
        }
        Err(e) => {
            let message = e.to_string();
            status(Outcome::Failed, &format!("build failed\n{message}"));
            state::record_failure(message);
        }
    }
}

fn run_request_loop(server: &Server, root: &Path, options: ServeOptions) -> Result<()> {
    let pool = rayon::ThreadPoolBuilder::new().num_threads(4).build()?;

    for request in server.incoming_requests() {
        let root = root.to_path_buf();
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &root, options) {
                log!("serve"; "request error: {e}");
            }
        });
    }
    Ok(())
}

fn handle_request(request: Request, root: &Path, options: ServeOptions) -> Result<()> {
    if state::is_shutdown() {
        return response::respond_unavailable(request);
    }

    if path::url_path(request.url()) == REVISION_PATH {
        return response::respond_revision(request);
    }

    match path::resolve_path(request.url(), root) {
        Some(file) => response::respond_file(request, &file, options),
        None => response::respond_not_found(request, options),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::fs;
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::time::Duration;
    use tempfile::TempDir;

    const OPTIONS: ServeOptions = ServeOptions {
        compress: true,
        overlay: true,
        live_reload: true,
    };

    struct Reply {
        status: u16,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    }

    impl Reply {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.as_str())
        }

        fn text(&self) -> String {
            String::from_utf8_lossy(&self.body).into_owned()
        }
    }

    fn output() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("css")).unwrap();
        fs::write(
            dir.path().join("index.html"),
            "<html><body><p>app</p></body></html>",
        )
        .unwrap();
        fs::write(
            dir.path().join("css/main.css"),
            "body { color: red; }\n".repeat(40),
        )
        .unwrap();
        dir
    }

    /// Send one raw request through a real server and `handle_request`.
    fn fetch(root: &Path, url: &str, extra_headers: &str, options: ServeOptions) -> Reply {
        let server = Server::http("127.0.0.1:0").unwrap();
        let addr = server.server_addr().to_ip().unwrap();

        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        write!(
            stream,
            "GET {url} HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n{extra_headers}\r\n"
        )
        .unwrap();

        let request = server.recv().unwrap();
        handle_request(request, root, options).unwrap();

        let mut raw = Vec::new();
        stream.read_to_end(&mut raw).unwrap();
        parse_reply(&raw)
    }

    fn parse_reply(raw: &[u8]) -> Reply {
        let split = raw.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
        let head = String::from_utf8_lossy(&raw[..split]).into_owned();
        let mut lines = head.lines();
        let status = lines
            .next()
            .and_then(|line| line.split_whitespace().nth(1))
            .and_then(|code| code.parse().ok())
            .unwrap();
        let headers = lines
            .filter_map(|line| line.split_once(':'))
            .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
            .collect();
        Reply {
            status,
            headers,
            body: raw[split + 4..].to_vec(),
        }
    }

    #[test]
    fn test_serves_html_with_live_reload() {
        let _guard = state::TEST_LOCK.lock();
        state::record_success();
        let dir = output();

        let reply = fetch(dir.path(), "/", "", OPTIONS);
        assert_eq!(reply.status, 200);
        assert!(reply.header("Content-Type").unwrap().starts_with("text/html"));
        let body = reply.text();
        let script = body.find("<script>").unwrap();
        assert!(script > body.find("<p>app</p>").unwrap());
        assert!(script < body.find("</body>").unwrap());
    }

    #[test]
    fn test_gzip_follows_accept_encoding() {
        let _guard = state::TEST_LOCK.lock();
        let dir = output();
        let css = fs::read_to_string(dir.path().join("css/main.css")).unwrap();

        let reply = fetch(dir.path(), "/css/main.css", "Accept-Encoding: gzip, br\r\n", OPTIONS);
        assert_eq!(reply.status, 200);
        assert_eq!(reply.header("Content-Encoding"), Some("gzip"));
        let mut decoded = String::new();
        GzDecoder::new(reply.body.as_slice())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, css);

        let plain = fetch(dir.path(), "/css/main.css", "", OPTIONS);
        assert_eq!(plain.header("Content-Encoding"), None);
        assert_eq!(plain.text(), css);

        let off = ServeOptions {
            compress: false,
            ..OPTIONS
        };
        let uncompressed = fetch(dir.path(), "/css/main.css", "Accept-Encoding: gzip\r\n", off);
        assert_eq!(uncompressed.header("Content-Encoding"), None);
    }

    #[test]
    fn test_overlay_after_failed_build() {
        let _guard = state::TEST_LOCK.lock();
        let dir = output();

        state::record_failure("Module not found: <./gone>".into());
        let missing = fetch(dir.path(), "/missing", "", OPTIONS);
        let page = fetch(dir.path(), "/", "", OPTIONS);
        state::record_success();

        assert_eq!(missing.status, 500);
        assert!(missing.text().contains("Module not found: &lt;./gone&gt;"));
        assert!(page.text().contains("Module not found: &lt;./gone&gt;"));

        let recovered = fetch(dir.path(), "/missing", "", OPTIONS);
        assert_eq!(recovered.status, 404);
        assert_eq!(recovered.text(), "404 Not Found");
    }

    #[test]
    fn test_not_found_without_overlay() {
        let _guard = state::TEST_LOCK.lock();
        let dir = output();

        state::record_failure("broken".into());
        let options = ServeOptions {
            overlay: false,
            ..OPTIONS
        };
        let reply = fetch(dir.path(), "/nope.js", "", options);
        state::record_success();
        assert_eq!(reply.status, 404);

        let escape = fetch(dir.path(), "/../etc/passwd", "", OPTIONS);
        assert_eq!(escape.status, 404);
    }

    #[test]
    fn test_revision_endpoint() {
        let _guard = state::TEST_LOCK.lock();
        let dir = output();
        state::record_success();

        let reply = fetch(dir.path(), &format!("{REVISION_PATH}?t=1"), "", OPTIONS);
        assert_eq!(reply.status, 200);
        assert_eq!(reply.header("Cache-Control"), Some("no-store"));
        assert_eq!(reply.text(), state::revision().to_string());
    }
}
