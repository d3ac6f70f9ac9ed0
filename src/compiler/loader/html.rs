//! `html` loader: export a document with its media sources rewritten.
//!
//! The document is parsed with `tl`; only `src` (and `poster` on `<video>`)
//! attribute values of media tags are replaced in the source text, so
//! everything else, including whitespace, is left as written.

use std::ops::Range;
use std::path::Path;

use super::css::push_request;
use super::url_placeholder;
use crate::compiler::resolve::{Request, is_external_url, split_suffix};

const MEDIA_TAGS: [&str; 5] = ["img", "audio", "video", "source", "input"];
const SOURCE_ATTRS: [&str; 2] = ["src", "poster"];

/// Replace local media sources in `html` with URL placeholders.
///
/// A document `tl` cannot parse is returned unchanged.
pub(super) fn rewrite_sources(path: &Path, html: &str, requests: &mut Vec<Request>) -> String {
    let Ok(dom) = tl::parse(html, tl::ParserOptions::default()) else {
        return html.to_string();
    };

    let mut edits: Vec<(Range<usize>, String)> = Vec::new();
    for node in dom.nodes() {
        let Some(tag) = node.as_tag() else {
            continue;
        };
        let name = tag.name().as_utf8_str().to_ascii_lowercase();
        if !MEDIA_TAGS.contains(&name.as_str()) {
            continue;
        }

        for attr in SOURCE_ATTRS {
            let Some(Some(value)) = tag.attributes().get(attr) else {
                continue;
            };
            let Some(span) = span_in(html, value.as_bytes()) else {
                continue;
            };
            let value = &html[span.clone()];
            if is_external_url(value) {
                continue;
            }
            let (target, suffix) = split_suffix(value);
            let index = push_request(requests, Request::url(target, path));
            edits.push((span, format!("{}{suffix}", url_placeholder(index))));
        }
    }

    edits.sort_by_key(|(span, _)| span.start);
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for (span, replacement) in edits {
        out.push_str(&html[last..span.start]);
        out.push_str(&replacement);
        last = span.end;
    }
    out.push_str(&html[last..]);
    out
}

/// Byte range of `part` within `source`. `tl` hands out attribute values as
/// slices of the parsed input.
fn span_in(source: &str, part: &[u8]) -> Option<Range<usize>> {
    let start = (part.as_ptr() as usize).checked_sub(source.as_ptr() as usize)?;
    let end = start + part.len();
    (end <= source.len() && source.is_char_boundary(start) && source.is_char_boundary(end))
        .then_some(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rewrite_media_sources() {
        let html = r#"<body>
  <img class="logo" src="img/logo.png" alt="">
  <audio src='audio/beep.mp3'></audio>
  <video poster="img/poster.jpg"><source src="img/logo.png"></video>
  <img src="https://example.com/remote.png">
  <img src="data:image/gif;base64,R0lGOD">
  <a href="img/logo.png">link</a>
</body>"#;
        let mut requests = Vec::new();
        let out = rewrite_sources(Path::new("/app/src/index.html"), html, &mut requests);

        let specifiers: Vec<_> = requests.iter().map(|r| r.specifier.as_str()).collect();
        assert_eq!(specifiers, ["img/logo.png", "audio/beep.mp3", "img/poster.jpg"]);
        assert!(out.contains(r#"<img class="logo" src="__KILN_URL_0__" alt="">"#));
        assert!(out.contains("<audio src='__KILN_URL_1__'>"));
        assert!(out.contains(r#"poster="__KILN_URL_2__""#));
        assert!(out.contains(r#"<source src="__KILN_URL_0__">"#));
        assert!(out.contains("https://example.com/remote.png"));
        assert!(out.contains("data:image/gif;base64,R0lGOD"));
        // links are not media sources
        assert!(out.contains(r#"<a href="img/logo.png">"#));
    }

    #[test]
    fn test_comments_and_other_attributes_untouched() {
        let html = "<!-- <img src=\"img/old.png\"> -->\n<img alt=\"a > b\" data-src=\"img/lazy.png\" src=\"img/logo.png\">\n";
        let mut requests = Vec::new();
        let out = rewrite_sources(Path::new("/app/src/index.html"), html, &mut requests);

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].specifier, "img/logo.png");
        assert_eq!(
            out,
            "<!-- <img src=\"img/old.png\"> -->\n<img alt=\"a > b\" data-src=\"img/lazy.png\" src=\"__KILN_URL_0__\">\n"
        );
    }

    #[test]
    fn test_plain_document_unchanged() {
        let html = "<!doctype html>\n<html><head><title>x</title></head><body></body></html>\n";
        let mut requests = Vec::new();
        assert_eq!(rewrite_sources(Path::new("/a/index.html"), html, &mut requests), html);
        assert!(requests.is_empty());
    }
}
