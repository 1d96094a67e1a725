//! Fixed-point expansion of declared entities into a dependency graph.
//!
//! Expansion proceeds in layers. The first layer is the declared entities;
//! each following layer holds the entities first reached through a live edge
//! while reading the previous one. Declaration files of one layer are fetched
//! concurrently and merged strictly in layer order, so the graph never depends
//! on which read finishes first. Expansion ends with the first layer that
//! reaches nothing new.
//!
//! An entity is queued only after all files of the owner that named it are
//! merged, so a target removed by a later `noDeps` of the same owner is never
//! read, and its own dependencies never enter the graph.

use std::collections::HashSet;

use anyhow::Result;
use futures::future::try_join_all;
use petgraph::graph::NodeIndex;
use tracing::{debug, trace};

use super::graph::{DependencyGraph, EdgeKind};
use crate::core::{BemError, Entity};
use crate::decl::DeclFile;
use crate::loader::DeclLoader;

/// Default cap on expansion layers.
///
/// A layer is one step of dependency depth, so this also bounds the longest
/// chain of entities that can be resolved.
pub const DEFAULT_MAX_ITERATIONS: usize = 10_000;

/// Expand `roots` through `loader` until no new entity is reached.
///
/// # Errors
///
/// Fails on the first loader or parse error, and with
/// [`BemError::ExpansionLimit`] when more than `max_iterations` layers are
/// needed.
pub async fn expand<L: DeclLoader>(
    loader: &L,
    roots: &[Entity],
    max_iterations: usize,
) -> Result<DependencyGraph> {
    let mut graph = DependencyGraph::new();
    let mut queued = HashSet::new();
    let mut layer = Vec::new();
    for root in roots {
        let (node, _) = graph.add_root(root);
        if queued.insert(node) {
            layer.push(node);
        }
    }

    let mut layers = 0usize;
    while !layer.is_empty() {
        layers += 1;
        if layers > max_iterations {
            return Err(BemError::ExpansionLimit {
                iterations: max_iterations,
            }
            .into());
        }
        debug!("Expansion layer {layers}: {} entit(ies)", layer.len());

        let owners: Vec<Entity> = layer.iter().map(|&n| graph.entity(n).clone()).collect();
        let files = try_join_all(owners.iter().map(|owner| loader.files_for(owner))).await?;

        let mut next = Vec::new();
        for ((&node, owner), files) in layer.iter().zip(&owners).zip(files) {
            let touched = merge_files(&mut graph, node, owner, &files)?;
            queue_live_targets(&mut graph, node, &touched, &mut queued, &mut next);
        }
        layer = next;
    }

    debug!(
        "Expansion reached a fixed point after {layers} layer(s): {} node(s), {} edge(s)",
        graph.node_count(),
        graph.edge_count()
    );
    Ok(graph)
}

/// Apply the statements of `owner`'s files to the graph.
///
/// Returns the owner followed by every retargeted context that declared
/// dependencies, in first-seen order.
fn merge_files(
    graph: &mut DependencyGraph,
    node: NodeIndex,
    owner: &Entity,
    files: &[DeclFile],
) -> Result<Vec<NodeIndex>> {
    let mut touched = vec![node];

    for file in files {
        trace!("Merging {} into {owner}", file.path.display());
        for item in file.resolve(owner)? {
            let context = if item.context == *owner {
                node
            } else {
                graph.add_related(node, &item.context).0
            };
            if (!item.must.is_empty() || !item.should.is_empty()) && !touched.contains(&context) {
                touched.push(context);
            }

            for target in &item.must {
                trace!("{} must {target}", item.context);
                graph.add_dependency(context, target, EdgeKind::Must);
            }
            for target in &item.should {
                trace!("{} should {target}", item.context);
                graph.add_dependency(context, target, EdgeKind::Should);
            }
            for target in &item.no {
                if graph.remove_dependency(context, target) {
                    trace!("{} no longer depends on {target}", item.context);
                }
            }
        }
    }
    Ok(touched)
}

/// Queue the touched contexts and their live targets that were never queued,
/// recording the entity each one was reached through.
fn queue_live_targets(
    graph: &mut DependencyGraph,
    owner: NodeIndex,
    touched: &[NodeIndex],
    queued: &mut HashSet<NodeIndex>,
    next: &mut Vec<NodeIndex>,
) {
    for &context in touched {
        let mut reached = vec![(context, owner)];
        reached.extend(
            graph.must(context).iter().chain(graph.should(context)).map(|&target| (target, context)),
        );

        for (target, under) in reached {
            if queued.insert(target) {
                graph.set_discovered_under(target, Some(under));
                next.push(target);
            }
        }
    }
}
