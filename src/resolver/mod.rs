//! Dependency expansion and ordering.
//!
//! Resolution runs in two phases over a per-run [`DependencyGraph`]:
//!
//! ## Phase 1: Expansion ([`expansion`])
//! Starting from the declared entities, declaration files are read layer by
//! layer until no new entity appears. Each file item contributes must- and
//! should-edges to its context entity and may remove earlier edges with
//! `noDeps`.
//!
//! ## Phase 2: Ordering ([`scheduler`], [`ordering`])
//! A depth-first walk from the declared entities emits must-dependencies
//! before their dependents and should-dependencies after, using declaration
//! order to break ties. Entities blocked on must-cycles are released by
//! cutting one edge per cycle; strict mode turns any cycle into an error.
//!
//! # Example
//!
//! ```rust,no_run
//! use bemdeps::decl::Declaration;
//! use bemdeps::loader::{LevelIndex, LevelLoader};
//! use bemdeps::resolver::{DepsResolver, ResolveOptions};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let index = LevelIndex::scan(&["common.blocks"])?;
//! let resolver = DepsResolver::new(LevelLoader::new(index), ResolveOptions::default());
//!
//! let declaration = Declaration::parse("page.bemdecl.json".as_ref(), r#"{"blocks": [{"name": "page"}]}"#)?;
//! let resolution = resolver.resolve(&declaration).await?;
//! for entity in resolution.entities() {
//!     println!("{entity}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod expansion;
pub mod graph;
pub mod ordering;
pub mod scheduler;

use anyhow::Result;
use serde_json::{Value, json};
use tracing::info;

use crate::core::Entity;
use crate::decl::{BemDeclBlock, Declaration, bemdecl_from_entities};
use crate::loader::DeclLoader;

pub use expansion::DEFAULT_MAX_ITERATIONS;
pub use graph::{DependencyGraph, DependencyRecord, EdgeKind};
pub use ordering::{Cycle, ResolvedEntity};
pub use scheduler::{Schedule, Scheduler, VisitState};

/// Options of a resolution run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Fail on must-cycles instead of breaking them
    pub strict: bool,
    /// Maximum number of expansion layers
    pub max_iterations: usize,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            strict: false,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

/// Ordered result of a resolution run.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Entities in dependency order, each once
    pub items: Vec<ResolvedEntity>,
    /// Must-cycles broken to produce the order
    pub cycles: Vec<Cycle>,
}

impl Resolution {
    /// The ordered entities.
    pub fn entities(&self) -> Vec<&Entity> {
        self.items.iter().map(|item| &item.entity).collect()
    }

    /// The ordered entities as `{block, elem?, mod?, val?, tech?}` records.
    pub fn to_deps_json(&self) -> Value {
        json!(self.entities())
    }

    /// Broken cycles as `{"mustDeps": [[entity, ...], ...]}`.
    pub fn cycle_report(&self) -> Value {
        json!({ "mustDeps": self.cycles })
    }

    /// The ordered entities folded into a bemdecl tree.
    pub fn to_bemdecl(&self) -> Vec<BemDeclBlock> {
        let entities: Vec<Entity> = self.items.iter().map(|item| item.entity.clone()).collect();
        bemdecl_from_entities(&entities)
    }

    /// Entities grouped by tech, groups in order of first appearance.
    ///
    /// An entity without its own tech falls into the group of the context it
    /// was discovered under; `None` collects the rest.
    pub fn by_tech(&self) -> Vec<(Option<String>, Vec<&Entity>)> {
        let mut groups: Vec<(Option<String>, Vec<&Entity>)> = Vec::new();
        for item in &self.items {
            let tech = item
                .entity
                .tech
                .clone()
                .or_else(|| item.context.as_ref().and_then(|c| c.tech.clone()));
            match groups.iter_mut().find(|(t, _)| *t == tech) {
                Some((_, entities)) => entities.push(&item.entity),
                None => groups.push((tech, vec![&item.entity])),
            }
        }
        groups
    }
}

/// Resolves declarations through a [`DeclLoader`].
#[derive(Debug, Clone)]
pub struct DepsResolver<L> {
    loader: L,
    options: ResolveOptions,
}

impl<L: DeclLoader> DepsResolver<L> {
    /// Create a resolver.
    pub fn new(loader: L, options: ResolveOptions) -> Self {
        Self {
            loader,
            options,
        }
    }

    /// The loader.
    pub fn loader(&self) -> &L {
        &self.loader
    }

    /// The options.
    pub fn options(&self) -> ResolveOptions {
        self.options
    }

    /// Expand a declaration into its dependency graph without ordering it.
    pub async fn expand(&self, declaration: &Declaration) -> Result<DependencyGraph> {
        let roots = declaration.to_entities()?;
        expansion::expand(&self.loader, &roots, self.options.max_iterations).await
    }

    /// Resolve a declaration.
    ///
    /// # Errors
    ///
    /// Fails on loader and parse errors, on the expansion limit, and in strict
    /// mode on must-cycles.
    pub async fn resolve(&self, declaration: &Declaration) -> Result<Resolution> {
        let roots = declaration.to_entities()?;
        self.resolve_entities(&roots).await
    }

    /// Resolve an already normalized entity list.
    pub async fn resolve_entities(&self, roots: &[Entity]) -> Result<Resolution> {
        let mut graph =
            expansion::expand(&self.loader, roots, self.options.max_iterations).await?;
        let ordering = ordering::order(&mut graph, self.options.strict)?;

        info!(
            "Resolved {} declared entit(ies) into {} ({} cycle(s) broken)",
            roots.len(),
            ordering.items.len(),
            ordering.cycles.len()
        );
        Ok(Resolution {
            items: ordering.items,
            cycles: ordering.cycles,
        })
    }
}
