//! Module graph discovery and linking.
//!
//! ```text
//! layer 0: roots                 ─┐
//! layer 1: their dependencies     ├─ each layer loads in parallel (rayon)
//! layer 2: ...                   ─┘
//! ```
//!
//! Modules are stored in discovery order, which is deterministic: a layer's
//! results are collected in request order before the next layer starts.

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::PathBuf;

use super::CompileError;
use super::loader::{LoadContext, LoadedModule, ModuleContent, URL_PLACEHOLDER, url_placeholder};

/// Importer name reported for graph roots.
const ROOT_IMPORTER: &str = "the build configuration";

/// A resolved request of a module.
#[derive(Debug, Clone)]
pub struct Dependency {
    /// Specifier as written in the source.
    pub request: String,
    /// Target module id; `None` for an unresolved optional request.
    pub target: Option<String>,
}

#[derive(Debug)]
pub struct Module {
    pub id: String,
    pub content: ModuleContent,
    /// One entry per request, in request order.
    pub deps: Vec<Dependency>,
}

#[derive(Debug, Default)]
pub struct ModuleGraph {
    modules: Vec<Module>,
    index: FxHashMap<String, usize>,
    warnings: Vec<String>,
}

impl ModuleGraph {
    /// Discover every module reachable from `roots`.
    pub fn build(ctx: &LoadContext<'_>, roots: &[PathBuf]) -> Result<Self, CompileError> {
        let mut graph = Self::default();
        let mut seen: FxHashSet<PathBuf> = FxHashSet::default();
        let mut frontier: Vec<(PathBuf, String)> = roots
            .iter()
            .filter(|path| seen.insert((*path).clone()))
            .map(|path| (path.clone(), ROOT_IMPORTER.to_string()))
            .collect();

        while !frontier.is_empty() {
            let loaded = frontier
                .par_iter()
                .map(|(path, importer)| ctx.load(path, importer))
                .collect::<Result<Vec<_>, _>>()?;

            let mut next = Vec::new();
            for module in loaded {
                graph.insert(ctx, module, &mut seen, &mut next)?;
            }
            frontier = next;
        }

        Ok(graph)
    }

    fn insert(
        &mut self,
        ctx: &LoadContext<'_>,
        module: LoadedModule,
        seen: &mut FxHashSet<PathBuf>,
        next: &mut Vec<(PathBuf, String)>,
    ) -> Result<(), CompileError> {
        let mut deps = Vec::with_capacity(module.requests.len());

        for request in &module.requests {
            let target = match ctx.resolver.resolve(request) {
                Some(path) => {
                    let id = ctx.module_id(&path);
                    if seen.insert(path.clone()) {
                        next.push((path, module.id.clone()));
                    }
                    Some(id)
                }
                None if request.optional => {
                    self.warnings.push(format!(
                        "{}: optional dependency `{}` not found",
                        module.id, request.specifier
                    ));
                    None
                }
                None => {
                    return Err(CompileError::ModuleNotFound {
                        request: request.specifier.clone(),
                        importer: module.id,
                    });
                }
            };
            deps.push(Dependency {
                request: request.specifier.clone(),
                target,
            });
        }

        self.index.insert(module.id.clone(), self.modules.len());
        self.modules.push(Module {
            id: module.id,
            content: module.content,
            deps,
        });
        Ok(())
    }

    /// Replace URL placeholders in stylesheets and documents with the public
    /// URL of the referenced module.
    pub fn link(&mut self) -> Result<(), CompileError> {
        let urls: Vec<Vec<Option<String>>> = self
            .modules
            .iter()
            .map(|module| {
                module
                    .deps
                    .iter()
                    .map(|dep| {
                        dep.target
                            .as_deref()
                            .and_then(|id| self.get(id))
                            .and_then(|target| target.content.public_url())
                            .map(str::to_string)
                    })
                    .collect()
            })
            .collect();

        for (module, urls) in self.modules.iter_mut().zip(urls) {
            let text = match &mut module.content {
                ModuleContent::Style { css, .. } => css,
                ModuleContent::Markup { html } => html,
                _ => continue,
            };
            if !text.contains(URL_PLACEHOLDER) {
                continue;
            }

            for (index, url) in urls.iter().enumerate() {
                let placeholder = url_placeholder(index);
                if !text.contains(&placeholder) {
                    continue;
                }
                let Some(url) = url else {
                    let dep = &module.deps[index];
                    return Err(CompileError::NoPublicUrl {
                        id: module.id.clone(),
                        target: dep.target.clone().unwrap_or_else(|| dep.request.clone()),
                    });
                };
                *text = text.replace(&placeholder, url);
            }
        }

        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Module> {
        self.index.get(id).map(|&i| &self.modules[i])
    }

    /// All modules in discovery order.
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Modules reachable from `root`, each after its dependencies.
    pub fn post_order(&self, root: &str) -> Vec<&Module> {
        let mut visited = FxHashSet::default();
        let mut order = Vec::new();
        self.visit(root, &mut visited, &mut order);
        order
    }

    fn visit<'g>(
        &'g self,
        id: &str,
        visited: &mut FxHashSet<&'g str>,
        order: &mut Vec<&'g Module>,
    ) {
        let Some(module) = self.get(id) else {
            return;
        };
        if !visited.insert(module.id.as_str()) {
            return;
        }
        for dep in &module.deps {
            if let Some(target) = &dep.target {
                self.visit(target, visited, order);
            }
        }
        order.push(module);
    }
}
