//! Embedded static resources.
//!
//! - `runtime` - the bundle wrapper around the module table
//! - `serve` - dev server snippets (live-reload client, error overlay)

mod template;

pub use template::{Template, TemplateVars};

/// Quote `s` as a JavaScript string literal.
pub fn js_string(s: &str) -> String {
    serde_json::Value::from(s).to_string()
}

pub mod runtime {
    use super::{Template, TemplateVars, js_string};

    /// Variables for bundle.js.
    pub struct BundleVars {
        /// `process.env.NODE_ENV` seen by bundled code.
        pub mode: &'static str,
        /// Id of the module started on load.
        pub entry: String,
        /// Comma-terminated `"id": [factory, requests]` entries.
        pub modules: String,
    }

    impl TemplateVars for BundleVars {
        fn bindings(&self) -> Vec<(&'static str, String)> {
            vec![
                ("__KILN_MODE__", js_string(self.mode)),
                ("__KILN_ENTRY__", js_string(&self.entry)),
                ("/*! KILN_MODULES */", self.modules.clone()),
            ]
        }
    }

    /// Name of the runtime object holding syntax lowering helpers.
    pub const HELPERS_OBJECT: &str = "babelHelpers";

    /// Helpers `HELPERS_OBJECT` defines.
    pub const HELPERS: &[&str] = &[
        "toPrimitive",
        "toPropertyKey",
        "defineProperty",
        "objectSpread2",
        "extends",
        "objectWithoutPropertiesLoose",
        "objectWithoutProperties",
        "objectDestructuringEmpty",
        "asyncToGenerator",
        "taggedTemplateLiteral",
        "classPrivateFieldInitSpec",
        "classPrivateMethodInitSpec",
        "assertClassBrand",
        "classPrivateFieldGet2",
        "classPrivateFieldSet2",
    ];

    /// Browser IIFE wrapping the module table.
    pub const BUNDLE_JS: Template<BundleVars> = Template::new(include_str!("runtime/bundle.js"));
}

pub mod serve {
    use super::{Template, TemplateVars};

    /// Endpoint polled by the live-reload client.
    pub const REVISION_PATH: &str = "/__kiln/revision";

    /// Variables for livereload.html.
    pub struct LiveReloadVars {
        pub revision: u64,
    }

    impl TemplateVars for LiveReloadVars {
        fn bindings(&self) -> Vec<(&'static str, String)> {
            vec![
                ("__KILN_REVISION_PATH__", REVISION_PATH.into()),
                ("__KILN_REVISION__", self.revision.to_string()),
            ]
        }
    }

    /// `<script>` tag of the silent polling client; reloads when the build revision changes.
    pub const LIVERELOAD_SCRIPT: Template<LiveReloadVars> =
        Template::new(include_str!("serve/livereload.html"));

    /// Variables for overlay.html.
    pub struct OverlayVars {
        pub message: String,
    }

    impl TemplateVars for OverlayVars {
        fn bindings(&self) -> Vec<(&'static str, String)> {
            vec![("__KILN_MESSAGE__", escape_html(&self.message))]
        }
    }

    const OVERLAY_HTML: Template<OverlayVars> = Template::new(include_str!("serve/overlay.html"));

    /// Full-screen build error panel.
    pub fn render_overlay(message: &str) -> String {
        OVERLAY_HTML.render(&OverlayVars {
            message: message.to_string(),
        })
    }

    fn escape_html(s: &str) -> String {
        let mut out = String::with_capacity(s.len());
        for c in s.chars() {
            match c {
                '&' => out.push_str("&amp;"),
                '<' => out.push_str("&lt;"),
                '>' => out.push_str("&gt;"),
                '"' => out.push_str("&quot;"),
                _ => out.push(c),
            }
        }
        out
    }
}
