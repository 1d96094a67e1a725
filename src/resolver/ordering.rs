//! Linearization of an expanded dependency graph.
//!
//! Runs the [`Scheduler`] and applies the cycle policy: in strict mode any
//! must-cycle fails the resolution, otherwise each broken cycle is logged and
//! its cut edge is removed from the graph so the graph matches the output.

use std::fmt;

use serde::Serialize;
use tracing::warn;

use super::graph::{DependencyGraph, EdgeKind};
use super::scheduler::{CutCycle, Scheduler};
use crate::core::{BemError, Entity};

/// A must-cycle found while ordering.
///
/// The first entity is required by the second, the second by the third, and
/// the last by the first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cycle {
    /// Cycle members
    pub entities: Vec<Entity>,
}

impl Cycle {
    fn from_cut(graph: &DependencyGraph, cut: &CutCycle) -> Self {
        Self {
            entities: cut.path.iter().map(|&n| graph.entity(n).clone()).collect(),
        }
    }

    /// Render as `a <- b <- a`, each arrow reading "is required by".
    pub fn chain(&self) -> String {
        let mut parts: Vec<String> = self.entities.iter().map(Entity::key).collect();
        if let Some(first) = parts.first().cloned() {
            parts.push(first);
        }
        parts.join(" <- ")
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.chain())
    }
}

/// One entry of the ordered output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEntity {
    /// The entity
    pub entity: Entity,
    /// Entity it was first referenced from; `None` for declared entities
    pub context: Option<Entity>,
}

/// Ordered output of a graph.
#[derive(Debug, Clone, Default)]
pub struct Ordering {
    /// Entities in emission order
    pub items: Vec<ResolvedEntity>,
    /// Broken must-cycles in the order they were cut
    pub cycles: Vec<Cycle>,
}

/// Order `graph`, breaking must-cycles unless `strict` is set.
///
/// # Errors
///
/// Returns [`BemError::CircularDependency`] listing every cycle, one per
/// line, when `strict` is set and the must-subgraph is not acyclic.
pub fn order(graph: &mut DependencyGraph, strict: bool) -> Result<Ordering, BemError> {
    let schedule = Scheduler::new(graph).run();
    let cycles: Vec<Cycle> = schedule.cuts.iter().map(|cut| Cycle::from_cut(graph, cut)).collect();

    if strict && !cycles.is_empty() {
        let chain = cycles.iter().map(Cycle::chain).collect::<Vec<_>>().join("\n");
        return Err(BemError::CircularDependency {
            chain,
        });
    }

    for (cut, cycle) in schedule.cuts.iter().zip(&cycles) {
        let (from, to) = cut.cut;
        graph.remove_edge(from, to, EdgeKind::Must);
        warn!(
            "Broke must-dependency cycle {} by dropping {} -> {}",
            cycle,
            graph.entity(from),
            graph.entity(to)
        );
    }

    let items = schedule
        .order
        .iter()
        .map(|&node| ResolvedEntity {
            entity: graph.entity(node).clone(),
            context: graph.record(node).discovered_under.map(|n| graph.entity(n).clone()),
        })
        .collect();

    Ok(Ordering {
        items,
        cycles,
    })
}
