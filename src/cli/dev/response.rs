//! HTTP responses.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::{fs, path::Path};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use super::state;
use crate::embed::serve::{LIVERELOAD_SCRIPT, LiveReloadVars, render_overlay};
use crate::manifest::DevServer;
use crate::utils::mime::{self, types};

/// Response behavior taken from the dev-server descriptor.
#[derive(Debug, Clone, Copy)]
pub struct ServeOptions {
    /// Gzip compressible bodies for clients that accept it.
    pub compress: bool,
    /// Show the last build error over served pages.
    pub overlay: bool,
    /// Inject the live-reload client into HTML.
    pub live_reload: bool,
}

impl ServeOptions {
    pub fn new(descriptor: &DevServer, watch: bool) -> Self {
        Self {
            compress: descriptor.compress,
            overlay: descriptor.overlay,
            live_reload: watch,
        }
    }
}

pub fn respond_file(request: Request, path: &Path, options: ServeOptions) -> Result<()> {
    let content_type = mime::from_path(path);

    if is_head_request(&request) {
        return send_head(request, 200, content_type);
    }

    let body = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let body = if content_type == types::HTML {
        inject_client(&body, options)
    } else {
        body
    };
    send_body(request, 200, content_type, body, options)
}

/// Current build revision, polled by the live-reload client.
pub fn respond_revision(request: Request) -> Result<()> {
    let body = state::revision().to_string().into_bytes();
    let response = Response::from_data(body)
        .with_header(make_header("Content-Type", types::PLAIN))
        .with_header(make_header("Cache-Control", "no-store"));
    request.respond(response)?;
    Ok(())
}

/// 404. While the last build failed, HTML clients get the overlay instead so
/// the page recovers once the build is fixed.
pub fn respond_not_found(request: Request, options: ServeOptions) -> Result<()> {
    if options.overlay
        && state::build_error().is_some()
        && !is_head_request(&request)
    {
        let page = b"<!DOCTYPE html><html><head><title>kiln</title></head><body></body></html>";
        let body = inject_client(page, options);
        return send_body(request, 500, types::HTML, body, options);
    }

    if is_head_request(&request) {
        return send_head(request, 404, types::PLAIN);
    }
    send_body(request, 404, types::PLAIN, b"404 Not Found".to_vec(), options)
}

/// 503 while shutting down.
pub fn respond_unavailable(request: Request) -> Result<()> {
    let response = Response::from_data(b"503 Service Unavailable".to_vec())
        .with_status_code(StatusCode(503))
        .with_header(make_header("Content-Type", types::PLAIN));
    request.respond(response)?;
    Ok(())
}

/// Live-reload client, plus the error overlay after a failed build, before
/// `</body>`.
fn inject_client(content: &[u8], options: ServeOptions) -> Vec<u8> {
    let mut snippet = String::new();
    if options.overlay
        && let Some(error) = state::build_error()
    {
        snippet.push_str(&render_overlay(&error));
    }
    if options.live_reload {
        snippet.push_str(&LIVERELOAD_SCRIPT.render(&LiveReloadVars {
            revision: state::revision(),
        }));
    }
    if snippet.is_empty() {
        return content.to_vec();
    }

    const PATTERN: &[u8] = b"</body>";
    let at = content
        .windows(PATTERN.len())
        .rposition(|w| w.eq_ignore_ascii_case(PATTERN))
        .unwrap_or(content.len());

    let mut out = Vec::with_capacity(content.len() + snippet.len());
    out.extend_from_slice(&content[..at]);
    out.extend_from_slice(snippet.as_bytes());
    out.extend_from_slice(&content[at..]);
    out
}

fn accepts_gzip(request: &Request) -> bool {
    request.headers().iter().any(|h| {
        h.field.equiv("Accept-Encoding")
            && h.value
                .as_str()
                .split(',')
                .any(|enc| enc.trim().split(';').next() == Some("gzip"))
    })
}

fn gzip(body: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(body.len() / 2), Compression::default());
    encoder.write_all(body)?;
    encoder.finish()
}

fn is_head_request(request: &Request) -> bool {
    request.method() == &Method::Head
}

fn send_head(request: Request, status: u16, content_type: &'static str) -> Result<()> {
    let response =
        Response::empty(StatusCode(status)).with_header(make_header("Content-Type", content_type));
    request.respond(response)?;
    Ok(())
}

fn send_body(
    request: Request,
    status: u16,
    content_type: &'static str,
    body: Vec<u8>,
    options: ServeOptions,
) -> Result<()> {
    let compress =
        options.compress && mime::is_compressible(content_type) && accepts_gzip(&request);

    let response = if compress {
        Response::from_data(gzip(&body)?)
            .with_header(make_header("Content-Encoding", "gzip"))
            .with_header(make_header("Vary", "Accept-Encoding"))
    } else {
        Response::from_data(body)
    };

    let response = response
        .with_status_code(StatusCode(status))
        .with_header(make_header("Content-Type", content_type))
        .with_header(make_header("Cache-Control", "no-cache"));
    request.respond(response)?;
    Ok(())
}

fn make_header(key: &'static str, value: &'static str) -> Header {
    Header::from_bytes(key, value).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUIET: ServeOptions = ServeOptions {
        compress: true,
        overlay: false,
        live_reload: false,
    };

    #[test]
    fn test_inject_before_body_close() {
        let options = ServeOptions {
            live_reload: true,
            ..QUIET
        };
        let out = inject_client(b"<html><BODY><p>x</p></BODY></html>", options);
        let out = String::from_utf8(out).unwrap();
        let script = out.find("<script>").unwrap();
        assert!(script > out.find("<p>x</p>").unwrap());
        assert!(script < out.find("</BODY>").unwrap());
    }

    #[test]
    fn test_inject_appends_without_body() {
        let options = ServeOptions {
            live_reload: true,
            ..QUIET
        };
        let out = String::from_utf8(inject_client(b"<p>x</p>", options)).unwrap();
        assert!(out.starts_with("<p>x</p><script>"));
    }

    #[test]
    fn test_no_injection_when_disabled() {
        assert_eq!(inject_client(b"<body></body>", QUIET), b"<body></body>");
    }

    #[test]
    fn test_gzip_roundtrip() {
        use flate2::read::GzDecoder;
        use std::io::Read;

        let body = "body { color: red; }\n".repeat(50);
        let compressed = gzip(body.as_bytes()).unwrap();
        assert!(compressed.len() < body.len());

        let mut decoded = String::new();
        GzDecoder::new(compressed.as_slice())
            .read_to_string(&mut decoded)
            .unwrap();
        assert_eq!(decoded, body);
    }
}
