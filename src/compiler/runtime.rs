//! Bundle rendering.
//!
//! Each module reachable from the entry becomes a factory
//! `function (module, exports, require)` in the bundle's module table,
//! paired with the map from its request strings to module ids.

use serde_json::{Map, Value};

use super::graph::{Module, ModuleGraph};
use super::loader::ModuleContent;
use crate::embed::js_string;
use crate::embed::runtime::{BUNDLE_JS, BundleVars};
use crate::manifest::{Devtool, Mode, STYLESHEET_FILENAME};

/// Scheme of `sourceURL`s given to eval'd modules.
const SOURCE_URL_SCHEME: &str = "kiln:///";

/// Render the bundle for `entry`, dependencies first.
pub fn render(graph: &ModuleGraph, entry: &str, mode: Mode, devtool: Devtool) -> String {
    let mut modules = String::new();

    for module in graph.post_order(entry) {
        let body = factory_body(&module.content);
        let body = if devtool.uses_eval() {
            eval_body(module, &body)
        } else {
            body
        };

        let requests: Map<String, Value> = module
            .deps
            .iter()
            .filter_map(|dep| {
                let target = dep.target.clone()?;
                Some((dep.request.clone(), Value::String(target)))
            })
            .collect();

        modules.push_str(&format!(
            "{}: [function (module, exports, require) {{\n{body}\n}}, {}],\n",
            js_string(&module.id),
            Value::Object(requests)
        ));
    }

    BUNDLE_JS.render(&BundleVars {
        mode: mode.as_str(),
        entry: entry.to_string(),
        modules,
    })
}

fn factory_body(content: &ModuleContent) -> String {
    match content {
        ModuleContent::Script { code, .. } => code.clone(),
        ModuleContent::Style { css, inject, .. } => {
            let mut body = String::from("__kiln_esm__(exports);");
            if *inject {
                body.push_str(&format!(
                    " __kiln_style__({}, {});",
                    js_string(css),
                    js_string(STYLESHEET_FILENAME)
                ));
            }
            body
        }
        ModuleContent::Markup { html } => default_export(html),
        ModuleContent::Asset { output, .. } => default_export(output),
        ModuleContent::Json { source } => format!("module.exports = {};", source.trim()),
    }
}

fn default_export(value: &str) -> String {
    format!("__kiln_esm__(exports); exports.default = {};", js_string(value))
}

/// `eval("...")` of `body`, named after the module for devtools.
fn eval_body(module: &Module, body: &str) -> String {
    let mut code = format!("{body}\n//# sourceURL={SOURCE_URL_SCHEME}{}", module.id);
    if let ModuleContent::Script { map: Some(map), .. } = &module.content {
        code.push_str("\n//# sourceMappingURL=");
        code.push_str(map);
    }
    format!("eval({});", js_string(&code))
}
