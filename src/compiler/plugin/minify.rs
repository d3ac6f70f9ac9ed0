//! Production script minification with oxc.

use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;

use crate::compiler::CompileError;
use crate::compiler::output::Assets;

/// Minify the emitted bundle in place.
pub(super) fn minify_bundle(bundle: &str, assets: &mut Assets) -> Result<(), CompileError> {
    let Some(asset) = assets.iter_mut().find(|asset| asset.path == bundle) else {
        return Ok(());
    };
    let source = String::from_utf8_lossy(&asset.bytes).into_owned();
    asset.bytes = minify_js(bundle, &source)?.into_bytes();
    Ok(())
}

/// Minify a classic script. `file` names it in errors.
fn minify_js(file: &str, source: &str) -> Result<String, CompileError> {
    let allocator = Allocator::default();
    let ret = Parser::new(&allocator, source, SourceType::cjs()).parse();
    if !ret.errors.is_empty() || ret.panicked {
        return Err(CompileError::Minify {
            file: file.to_string(),
            message: ret
                .errors
                .iter()
                .map(|e| e.to_string())
                .collect::<Vec<_>>()
                .join("\n"),
        });
    }

    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = Minifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minify_shrinks_script() {
        let source = "(function () {\n  var message = \"hello\";\n  // greet\n  console.log(message);\n})();\n";
        let out = minify_js("index.js", source).unwrap();
        assert!(out.len() < source.len());
        assert!(!out.contains("// greet"));
        assert!(out.contains("hello"));
    }

    #[test]
    fn test_minify_error_names_file() {
        let err = minify_js("index.js", "function (").unwrap_err();
        let CompileError::Minify { file, .. } = err else {
            panic!("expected minify error");
        };
        assert_eq!(file, "index.js");
    }

    #[test]
    fn test_only_bundle_is_minified() {
        let mut assets = Assets::default();
        assets.emit("index.js", "var  a = 1 ;\n\n");
        assets.emit("img/keep.js", "var  b = 2 ;\n\n");
        minify_bundle("index.js", &mut assets).unwrap();
        assert!(assets.get("index.js").unwrap().bytes.len() < "var  a = 1 ;\n\n".len());
        assert_eq!(assets.get("img/keep.js").unwrap().bytes, b"var  b = 2 ;\n\n");
    }
}
