//! Script loaders.
//!
//! Project scripts (`transpile`) are lowered to the configured target with
//! the oxc transformer and printed; dependencies under `node_modules`
//! (passthrough) are used as written. Both then get their ES module syntax
//! rewritten to the bundle's CommonJS-style factory format:
//!
//! ```text
//! import a, { b as c } from "./x"  →  var __kiln_import_0__ = require("./x");   (prologue)
//! a(c)                             →  __kiln_default__(__kiln_import_0__)(__kiln_import_0__.b)
//! export const d = 1               →  const d = 1            + getter for "d"
//! export default expr              →  var __kiln_default_export__ = expr;
//! export * from "./y"              →  __kiln_star__(exports, require("./y"));   (prologue)
//! import("./z")                    →  Promise.resolve().then(function () { return require("./z"); })
//! ```
//!
//! The prologue registers export getters, then requires every static
//! dependency in source order, before any other statement runs. Imported
//! bindings stay live: each reference reads through the required module's
//! exports, so values assigned later, including across circular imports,
//! are observed. Every edit keeps the line count of the text it replaces;
//! line numbers in the rewritten module match the printed source and its
//! source map.
//!
//! Syntax lowering helpers are read from the runtime's `babelHelpers`
//! object; a helper the runtime lacks fails the build.

use oxc::allocator::Allocator;
use oxc::ast::ast::{
    Argument, BindingIdentifier, CallExpression, Declaration, ExportAllDeclaration,
    ExportDefaultDeclaration, ExportDefaultDeclarationKind, ExportNamedDeclaration, Expression,
    IdentifierReference, ImportDeclaration, ImportDeclarationSpecifier, ImportExpression,
    ModuleExportName, NewExpression, ObjectProperty, Program, Statement,
    TaggedTemplateExpression,
};
use oxc::ast_visit::{Visit, walk};
use oxc::codegen::{Codegen, CodegenOptions};
use oxc::diagnostics::OxcDiagnostic;
use oxc::parser::Parser;
use oxc::semantic::{Scoping, SemanticBuilder, SymbolId};
use oxc::span::{GetSpan, SourceType, Span};
use oxc::transformer::{HelperLoaderMode, TransformOptions, Transformer};
use rustc_hash::FxHashMap;
use std::path::Path;

use super::css::push_request;
use super::{LoadContext, ModuleContent};
use crate::compiler::CompileError;
use crate::compiler::resolve::Request;
use crate::embed::js_string;
use crate::embed::runtime::{HELPERS, HELPERS_OBJECT};

/// Binding holding an anonymous default export.
const DEFAULT_EXPORT: &str = "__kiln_default_export__";

/// `transpile`: lower a project script, then rewrite its module syntax.
pub(super) fn transpile(
    ctx: &LoadContext<'_>,
    id: &str,
    path: &Path,
    source: &str,
    requests: &mut Vec<Request>,
) -> Result<ModuleContent, CompileError> {
    let (printed, map) = lower(id, path, source, ctx.js_target, ctx.source_maps)?;
    let rewritten = rewrite_modules(id, &printed)?;
    collect_requests(path, &rewritten, requests, false);
    Ok(ModuleContent::Script {
        code: rewritten.code,
        map,
    })
}

/// Untransformed dependency script. `require()` calls that fail to resolve
/// only warn, since packages often guard optional requires.
pub(super) fn passthrough(
    id: &str,
    path: &Path,
    source: &str,
    requests: &mut Vec<Request>,
) -> Result<ModuleContent, CompileError> {
    let rewritten = rewrite_modules(id, source)?;
    collect_requests(path, &rewritten, requests, true);
    Ok(ModuleContent::Script {
        code: rewritten.code,
        map: None,
    })
}

fn collect_requests(
    path: &Path,
    rewritten: &Rewritten,
    requests: &mut Vec<Request>,
    optional_requires: bool,
) {
    for specifier in &rewritten.imports {
        push_request(requests, Request::script(specifier.as_str(), path));
    }
    for specifier in &rewritten.requires {
        let request = Request::script(specifier.as_str(), path);
        let request = if optional_requires {
            request.optional()
        } else {
            request
        };
        // a static import of the same specifier already covers it
        if !requests.iter().any(|r| r.specifier == *specifier) {
            requests.push(request);
        }
    }
}

fn format_diagnostics(errors: &[OxcDiagnostic]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse as a module, falling back to a sloppy-mode script for CommonJS
/// code that is not valid in strict mode.
fn parse<'a>(allocator: &'a Allocator, id: &str, source: &'a str) -> Result<Program<'a>, CompileError> {
    let ret = Parser::new(allocator, source, SourceType::mjs()).parse();
    if ret.errors.is_empty() && !ret.panicked {
        return Ok(ret.program);
    }

    let fallback = Parser::new(allocator, source, SourceType::cjs()).parse();
    if fallback.errors.is_empty() && !fallback.panicked {
        return Ok(fallback.program);
    }

    Err(CompileError::Parse {
        id: id.to_string(),
        message: format_diagnostics(&ret.errors),
    })
}

/// Lower `source` to `target` and print it, with an inline source map when
/// `source_map` is set.
fn lower(
    id: &str,
    path: &Path,
    source: &str,
    target: &str,
    source_map: bool,
) -> Result<(String, Option<String>), CompileError> {
    let transform_error = |message: String| CompileError::Transform {
        id: id.to_string(),
        message,
    };

    let allocator = Allocator::default();
    let mut program = parse(&allocator, id, source)?;

    let mut options = TransformOptions::from_target(target).map_err(transform_error)?;
    options.helper_loader.mode = HelperLoaderMode::External;
    let scoping = SemanticBuilder::new().build(&program).semantic.into_scoping();
    let ret = Transformer::new(&allocator, path, &options).build_with_scoping(scoping, &mut program);
    if !ret.errors.is_empty() {
        return Err(transform_error(format_diagnostics(&ret.errors)));
    }

    let printed = Codegen::new()
        .with_options(CodegenOptions {
            source_map_path: source_map.then(|| path.to_path_buf()),
            ..CodegenOptions::default()
        })
        .build(&program);

    if let Some(helper) = unsupported_helpers(&printed.code).first() {
        return Err(transform_error(format!(
            "lowering needs the `{helper}` helper, which the bundle runtime does not provide"
        )));
    }

    Ok((printed.code, printed.map.map(|map| map.to_data_url())))
}

/// `babelHelpers.*` names used by `code` that the runtime does not define.
fn unsupported_helpers(code: &str) -> Vec<&str> {
    let prefix = format!("{HELPERS_OBJECT}.");
    let mut names: Vec<&str> = Vec::new();
    for (at, _) in code.match_indices(prefix.as_str()) {
        let rest = &code[at + prefix.len()..];
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
            .unwrap_or(rest.len());
        let name = &rest[..end];
        if !HELPERS.contains(&name) && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

// ============================================================================
// Module syntax rewrite
// ============================================================================

/// A script with module syntax replaced by factory-scope calls.
#[derive(Debug)]
pub struct Rewritten {
    pub code: String,
    /// Specifiers of static imports, re-exports and dynamic imports.
    pub imports: Vec<String>,
    /// Specifiers of literal `require("...")` calls.
    pub requires: Vec<String>,
}

struct Edit {
    start: u32,
    end: u32,
    text: String,
}

/// What a reference to an imported binding reads.
enum ImportBinding {
    /// A named export: `__kiln_import_0__.name`.
    Member(String),
    /// The default export of the module object named here.
    Default(String),
    /// The module object itself.
    Namespace(String),
}

impl ImportBinding {
    fn expression(&self) -> String {
        match self {
            Self::Member(expr) | Self::Namespace(expr) => expr.clone(),
            Self::Default(module) => format!("__kiln_default__({module})"),
        }
    }
}

struct Rewriter<'s> {
    scoping: &'s Scoping,
    bindings: FxHashMap<SymbolId, ImportBinding>,
    edits: Vec<Edit>,
    /// `(exported name, getter body expression)`
    exports: Vec<(String, String)>,
    /// Dependency statements run by the prologue, in source order.
    hoisted: Vec<String>,
    imports: Vec<String>,
    requires: Vec<String>,
    esm: bool,
    counter: usize,
}

/// Rewrite ES module syntax in `source`.
pub fn rewrite_modules(id: &str, source: &str) -> Result<Rewritten, CompileError> {
    let allocator = Allocator::default();
    let program = parse(&allocator, id, source)?;
    let semantic = SemanticBuilder::new().build(&program).semantic;

    let mut rewriter = Rewriter::new(semantic.scoping());
    // dependencies first, so local exports can see imported bindings
    for stmt in &program.body {
        match stmt {
            Statement::ImportDeclaration(decl) => rewriter.import(decl),
            Statement::ExportNamedDeclaration(decl) if decl.source.is_some() => {
                rewriter.reexport(decl);
            }
            Statement::ExportAllDeclaration(decl) => rewriter.export_all(decl),
            _ => {}
        }
    }
    for stmt in &program.body {
        match stmt {
            Statement::ExportNamedDeclaration(decl) if decl.source.is_none() => {
                rewriter.export_named(decl);
            }
            Statement::ExportDefaultDeclaration(decl) => rewriter.export_default(decl),
            _ => {}
        }
    }
    rewriter.visit_program(&program);

    Ok(rewriter.finish(source))
}

fn require_call(specifier: &str) -> String {
    format!("require({})", js_string(specifier))
}

/// `object.name`, or `object["name"]` when `name` is not an identifier.
fn member(object: &str, name: &str) -> String {
    let is_ident = name
        .chars()
        .enumerate()
        .all(|(i, c)| c == '_' || c == '$' || c.is_ascii_alphabetic() || (i > 0 && c.is_ascii_digit()));
    if is_ident && !name.is_empty() {
        format!("{object}.{name}")
    } else {
        format!("{object}[{}]", js_string(name))
    }
}

impl<'s> Rewriter<'s> {
    fn new(scoping: &'s Scoping) -> Self {
        Self {
            scoping,
            bindings: FxHashMap::default(),
            edits: Vec::new(),
            exports: Vec::new(),
            hoisted: Vec::new(),
            imports: Vec::new(),
            requires: Vec::new(),
            esm: false,
            counter: 0,
        }
    }

    fn replace(&mut self, span: Span, text: impl Into<String>) {
        self.edits.push(Edit {
            start: span.start,
            end: span.end,
            text: text.into(),
        });
    }

    fn insert(&mut self, at: u32, text: impl Into<String>) {
        self.replace(Span::new(at, at), text);
    }

    fn binding(&mut self, kind: &str) -> String {
        let name = format!("__kiln_{kind}_{}__", self.counter);
        self.counter += 1;
        name
    }

    fn import_source(&mut self, specifier: &str) {
        if !self.imports.iter().any(|s| s == specifier) {
            self.imports.push(specifier.to_string());
        }
    }

    fn export_local(&mut self, exported: &str, local: &str) {
        self.exports.push((exported.to_string(), local.to_string()));
    }

    /// Import binding `ident` refers to, if any.
    fn binding_of(&self, ident: &IdentifierReference<'_>) -> Option<&ImportBinding> {
        let reference = ident.reference_id.get()?;
        let symbol = self.scoping.get_reference(reference).symbol_id()?;
        self.bindings.get(&symbol)
    }

    fn bind(&mut self, local: &BindingIdentifier<'_>, binding: ImportBinding) {
        if let Some(symbol) = local.symbol_id.get() {
            self.bindings.insert(symbol, binding);
        }
    }

    fn import(&mut self, decl: &ImportDeclaration<'_>) {
        self.esm = true;
        let specifier = decl.source.value.as_str();
        self.import_source(specifier);
        self.replace(decl.span, "");

        let specifiers = decl.specifiers.as_ref().filter(|s| !s.is_empty());
        let Some(specifiers) = specifiers else {
            self.hoisted.push(format!("{};", require_call(specifier)));
            return;
        };

        let module = self.binding("import");
        self.hoisted
            .push(format!("var {module} = {};", require_call(specifier)));
        for spec in specifiers {
            match spec {
                ImportDeclarationSpecifier::ImportDefaultSpecifier(s) => {
                    self.bind(&s.local, ImportBinding::Default(module.clone()));
                }
                ImportDeclarationSpecifier::ImportNamespaceSpecifier(s) => {
                    self.bind(&s.local, ImportBinding::Namespace(module.clone()));
                }
                ImportDeclarationSpecifier::ImportSpecifier(s) => {
                    let imported = s.imported.name();
                    let binding = if imported.as_str() == "default" {
                        ImportBinding::Default(module.clone())
                    } else {
                        ImportBinding::Member(member(&module, imported.as_str()))
                    };
                    self.bind(&s.local, binding);
                }
            }
        }
    }

    /// `export { a, default as b } from "./x"`
    fn reexport(&mut self, decl: &ExportNamedDeclaration<'_>) {
        let Some(source) = &decl.source else {
            return;
        };
        self.esm = true;
        let specifier = source.value.as_str();
        self.import_source(specifier);
        self.replace(decl.span, "");

        let module = self.binding("reexport");
        self.hoisted
            .push(format!("var {module} = {};", require_call(specifier)));
        for spec in &decl.specifiers {
            let local = spec.local.name();
            let value = if local.as_str() == "default" {
                format!("__kiln_default__({module})")
            } else {
                member(&module, local.as_str())
            };
            self.export_local(spec.exported.name().as_str(), &value);
        }
    }

    fn export_named(&mut self, decl: &ExportNamedDeclaration<'_>) {
        self.esm = true;

        if let Some(declaration) = &decl.declaration {
            // drop the `export` keyword, keep the declaration
            self.replace(Span::new(decl.span.start, declaration.span().start), "");
            for name in declared_names(declaration) {
                self.export_local(&name, &name);
            }
            return;
        }

        self.replace(decl.span, "");
        for spec in &decl.specifiers {
            let value = match &spec.local {
                ModuleExportName::IdentifierReference(ident) => self
                    .binding_of(ident)
                    .map_or_else(|| ident.name.to_string(), ImportBinding::expression),
                other => other.name().to_string(),
            };
            self.export_local(spec.exported.name().as_str(), &value);
        }
    }

    fn export_default(&mut self, decl: &ExportDefaultDeclaration<'_>) {
        self.esm = true;
        let body_start = decl.declaration.span().start;
        let prefix = Span::new(decl.span.start, body_start);

        let named = match &decl.declaration {
            ExportDefaultDeclarationKind::FunctionDeclaration(func) => {
                func.id.as_ref().map(|id| id.name.to_string())
            }
            ExportDefaultDeclarationKind::ClassDeclaration(class) => {
                class.id.as_ref().map(|id| id.name.to_string())
            }
            _ => None,
        };

        match named {
            Some(name) => {
                self.replace(prefix, "");
                self.export_local("default", &name);
            }
            None => {
                self.replace(prefix, format!("var {DEFAULT_EXPORT} = "));
                self.insert(decl.span.end, ";");
                self.export_local("default", DEFAULT_EXPORT);
            }
        }
    }

    fn export_all(&mut self, decl: &ExportAllDeclaration<'_>) {
        self.esm = true;
        let specifier = decl.source.value.as_str();
        self.import_source(specifier);
        self.replace(decl.span, "");

        match &decl.exported {
            Some(exported) => {
                let module = self.binding("reexport");
                self.hoisted
                    .push(format!("var {module} = {};", require_call(specifier)));
                self.export_local(exported.name().as_str(), &module);
            }
            None => self.hoisted.push(format!(
                "__kiln_star__(exports, {});",
                require_call(specifier)
            )),
        }
    }

    fn prologue(&self) -> String {
        let mut out = String::from("\"use strict\"; __kiln_esm__(exports);");
        for (exported, value) in &self.exports {
            out.push_str(&format!(
                " __kiln_export__(exports, {}, function () {{ return {value}; }});",
                js_string(exported)
            ));
        }
        for statement in &self.hoisted {
            out.push(' ');
            out.push_str(statement);
        }
        out.push(' ');
        out
    }

    fn finish(mut self, source: &str) -> Rewritten {
        let mut code = if self.esm { self.prologue() } else { String::new() };
        code.push_str(&apply_edits(source, &mut self.edits));
        Rewritten {
            code,
            imports: self.imports,
            requires: self.requires,
        }
    }
}

impl<'a> Visit<'a> for Rewriter<'_> {
    // dependency statements are removed whole
    fn visit_import_declaration(&mut self, _decl: &ImportDeclaration<'a>) {}

    fn visit_export_all_declaration(&mut self, _decl: &ExportAllDeclaration<'a>) {}

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if let Some(declaration) = &decl.declaration {
            self.visit_declaration(declaration);
        }
    }

    fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
        if let Some(binding) = self.binding_of(ident) {
            let text = binding.expression();
            self.replace(ident.span, text);
        }
    }

    fn visit_object_property(&mut self, prop: &ObjectProperty<'a>) {
        if prop.shorthand
            && let Expression::Identifier(ident) = &prop.value
            && let Some(binding) = self.binding_of(ident)
        {
            let text = format!("{}: {}", ident.name, binding.expression());
            self.replace(prop.span, text);
            return;
        }
        walk::walk_object_property(self, prop);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Expression::Identifier(callee) = &call.callee {
            if callee.name.as_str() == "require"
                && call.arguments.len() == 1
                && let Argument::StringLiteral(lit) = &call.arguments[0]
            {
                let specifier = lit.value.to_string();
                if !self.requires.contains(&specifier) {
                    self.requires.push(specifier);
                }
            }

            // imported functions are called without the module as `this`
            if let Some(ImportBinding::Member(expr)) = self.binding_of(callee) {
                let text = format!("(0, {expr})");
                self.replace(callee.span, text);
                self.visit_arguments(&call.arguments);
                return;
            }
        }
        walk::walk_call_expression(self, call);
    }

    fn visit_tagged_template_expression(&mut self, expr: &TaggedTemplateExpression<'a>) {
        if let Expression::Identifier(tag) = &expr.tag
            && let Some(ImportBinding::Member(member)) = self.binding_of(tag)
        {
            let text = format!("(0, {member})");
            self.replace(tag.span, text);
            self.visit_template_literal(&expr.quasi);
            return;
        }
        walk::walk_tagged_template_expression(self, expr);
    }

    fn visit_new_expression(&mut self, expr: &NewExpression<'a>) {
        if let Expression::Identifier(callee) = &expr.callee
            && let Some(binding) = self.binding_of(callee)
            && matches!(binding, ImportBinding::Default(_))
        {
            let text = format!("({})", binding.expression());
            self.replace(callee.span, text);
            self.visit_arguments(&expr.arguments);
            return;
        }
        walk::walk_new_expression(self, expr);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        if let Expression::StringLiteral(lit) = &expr.source {
            let specifier = lit.value.as_str();
            self.import_source(specifier);
            self.replace(
                expr.span,
                format!(
                    "Promise.resolve().then(function () {{ return {}; }})",
                    require_call(specifier)
                ),
            );
            return;
        }
        walk::walk_import_expression(self, expr);
    }
}

/// Names bound by an exported declaration, including destructured ones.
fn declared_names(declaration: &Declaration<'_>) -> Vec<String> {
    let mut collector = BindingNames::default();
    match declaration {
        Declaration::VariableDeclaration(var) => collector.visit_variable_declaration(var),
        Declaration::FunctionDeclaration(func) => collector.names.extend(
            func.id.as_ref().map(|id| id.name.to_string()),
        ),
        Declaration::ClassDeclaration(class) => collector.names.extend(
            class.id.as_ref().map(|id| id.name.to_string()),
        ),
        // type-only declarations bind nothing at runtime
        _ => {}
    }
    collector.names
}

#[derive(Default)]
struct BindingNames {
    names: Vec<String>,
}

impl<'a> Visit<'a> for BindingNames {
    fn visit_binding_identifier(&mut self, ident: &BindingIdentifier<'a>) {
        self.names.push(ident.name.to_string());
    }

    // initializers and default values bind nothing in the enclosing scope
    fn visit_expression(&mut self, _expr: &Expression<'a>) {}
}

/// Apply non-overlapping edits, padding each replacement with the newlines
/// of the text it removed.
fn apply_edits(source: &str, edits: &mut [Edit]) -> String {
    edits.sort_by_key(|e| (e.start, e.end));
    let mut out = String::with_capacity(source.len());
    let mut cursor = 0usize;

    for edit in edits.iter() {
        let (start, end) = (edit.start as usize, edit.end as usize);
        if start < cursor || end > source.len() {
            continue;
        }
        out.push_str(&source[cursor..start]);
        out.push_str(&edit.text);
        let removed = &source[start..end];
        out.extend(std::iter::repeat_n('\n', removed.matches('\n').count()));
        cursor = end;
    }

    out.push_str(&source[cursor..]);
    out
}
