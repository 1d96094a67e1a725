//! Dependency index: the persistent must/should graph of a resolution run.
//!
//! Each entity gets one node and one [`DependencyRecord`] holding its
//! must- and should-dependencies in declared order. The petgraph structure
//! mirrors the records and backs the structural queries (edge lookup, cycle
//! components); the records carry the ordering the scheduler relies on.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;

use crate::core::Entity;

/// Kind of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Hard, order-sensitive dependency.
    Must,
    /// Soft dependency: presence only.
    Should,
}

/// Dependencies of one entity.
#[derive(Debug, Clone, Default)]
pub struct DependencyRecord {
    /// Must-dependencies in declared order.
    pub must: Vec<NodeIndex>,
    /// Should-dependencies in declared order.
    pub should: Vec<NodeIndex>,
    /// The entity whose live edge first led expansion to this node; `None`
    /// for roots.
    pub discovered_under: Option<NodeIndex>,
}

/// Dependency graph for one resolution run.
#[derive(Debug)]
pub struct DependencyGraph {
    /// Structural mirror of the records.
    graph: DiGraph<Entity, EdgeKind>,
    /// Map from entities to their graph indices.
    node_map: HashMap<Entity, NodeIndex>,
    /// Records, indexed by node index.
    records: Vec<DependencyRecord>,
    /// Should-list of the root pseudo-entity.
    roots: Vec<NodeIndex>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph.
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
            records: Vec::new(),
            roots: Vec::new(),
        }
    }

    /// Add a node if it doesn't already exist.
    ///
    /// Returns the index and whether the node was created.
    fn ensure_node(&mut self, entity: &Entity, under: Option<NodeIndex>) -> (NodeIndex, bool) {
        if let Some(&index) = self.node_map.get(entity) {
            return (index, false);
        }
        let index = self.graph.add_node(entity.clone());
        self.node_map.insert(entity.clone(), index);
        self.records.push(DependencyRecord {
            discovered_under: under,
            ..DependencyRecord::default()
        });
        (index, true)
    }

    /// Append a declared entity to the root's should-list.
    ///
    /// Returns the node and whether it was new to the graph.
    pub fn add_root(&mut self, entity: &Entity) -> (NodeIndex, bool) {
        let (index, created) = self.ensure_node(entity, None);
        if !self.roots.contains(&index) {
            self.roots.push(index);
        }
        (index, created)
    }

    /// Ensure a node for an entity named by a declaration of `from` without
    /// depending on it, e.g. an item retargeted to one of `from`'s elements.
    pub fn add_related(&mut self, from: NodeIndex, entity: &Entity) -> (NodeIndex, bool) {
        self.ensure_node(entity, Some(from))
    }

    /// Record that `from` depends on `to`.
    ///
    /// Duplicate edges are ignored. Returns the target node and whether it
    /// was new to the graph.
    pub fn add_dependency(
        &mut self,
        from: NodeIndex,
        to: &Entity,
        kind: EdgeKind,
    ) -> (NodeIndex, bool) {
        let (to_idx, created) = self.ensure_node(to, Some(from));
        let list = match kind {
            EdgeKind::Must => &mut self.records[from.index()].must,
            EdgeKind::Should => &mut self.records[from.index()].should,
        };
        if !list.contains(&to_idx) {
            list.push(to_idx);
            self.graph.add_edge(from, to_idx, kind);
        }
        (to_idx, created)
    }

    /// Remove the edge `from -> to` of the given kind, if present.
    pub fn remove_edge(&mut self, from: NodeIndex, to: NodeIndex, kind: EdgeKind) -> bool {
        let list = match kind {
            EdgeKind::Must => &mut self.records[from.index()].must,
            EdgeKind::Should => &mut self.records[from.index()].should,
        };
        let Some(position) = list.iter().position(|&n| n == to) else {
            return false;
        };
        list.remove(position);

        let edge =
            self.graph.edges_connecting(from, to).find(|e| *e.weight() == kind).map(|e| e.id());
        if let Some(edge) = edge {
            self.graph.remove_edge(edge);
        }
        true
    }

    /// Apply a `noDeps` statement: drop any recorded edge `from -> to`.
    ///
    /// Unknown targets and absent edges are a no-op.
    pub fn remove_dependency(&mut self, from: NodeIndex, to: &Entity) -> bool {
        let Some(&to_idx) = self.node_map.get(to) else {
            return false;
        };
        let must = self.remove_edge(from, to_idx, EdgeKind::Must);
        let should = self.remove_edge(from, to_idx, EdgeKind::Should);
        must || should
    }

    /// Record the entity expansion reached `node` through.
    pub fn set_discovered_under(&mut self, node: NodeIndex, under: Option<NodeIndex>) {
        self.records[node.index()].discovered_under = under;
    }

    /// Nodes reachable from the roots over live edges, breadth-first, each
    /// node's must-list before its should-list.
    ///
    /// Nodes left behind by removed edges are not included.
    pub fn reachable(&self) -> Vec<NodeIndex> {
        let mut seen: HashSet<NodeIndex> = HashSet::new();
        let mut queue: VecDeque<NodeIndex> = VecDeque::new();
        for &root in &self.roots {
            if seen.insert(root) {
                queue.push_back(root);
            }
        }

        let mut out = Vec::new();
        while let Some(node) = queue.pop_front() {
            out.push(node);
            let record = self.record(node);
            for &child in record.must.iter().chain(&record.should) {
                if seen.insert(child) {
                    queue.push_back(child);
                }
            }
        }
        out
    }

    /// Number of live edges leaving reachable nodes.
    pub fn reachable_edge_count(&self) -> usize {
        self.reachable()
            .into_iter()
            .map(|n| self.record(n).must.len() + self.record(n).should.len())
            .sum()
    }

    /// The root's should-list in declaration order.
    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// Must-dependencies of `node` in declared order.
    pub fn must(&self, node: NodeIndex) -> &[NodeIndex] {
        &self.records[node.index()].must
    }

    /// Should-dependencies of `node` in declared order.
    pub fn should(&self, node: NodeIndex) -> &[NodeIndex] {
        &self.records[node.index()].should
    }

    /// The record of `node`.
    pub fn record(&self, node: NodeIndex) -> &DependencyRecord {
        &self.records[node.index()]
    }

    /// The entity of `node`.
    pub fn entity(&self, node: NodeIndex) -> &Entity {
        &self.graph[node]
    }

    /// Look up the node of an entity.
    pub fn index_of(&self, entity: &Entity) -> Option<NodeIndex> {
        self.node_map.get(entity).copied()
    }

    /// Check if the graph is empty.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Get the total number of edges (must and should) in the graph.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// All node indices in creation order.
    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.node_indices()
    }

    /// Strongly connected components of the must-subgraph that form cycles
    /// among reachable nodes.
    ///
    /// Self-edges are not cycles here, matching the scheduler which skips
    /// them. Components are sorted by their smallest node index.
    pub fn must_cycles(&self) -> Vec<Vec<Entity>> {
        let reachable: HashSet<NodeIndex> = self.reachable().into_iter().collect();
        let must_only = self.graph.filter_map(
            |_, entity| Some(entity.clone()),
            |edge, kind| {
                let (a, b) = self.graph.edge_endpoints(edge)?;
                (*kind == EdgeKind::Must && a != b).then_some(())
            },
        );

        let mut components: Vec<Vec<NodeIndex>> = tarjan_scc(&must_only)
            .into_iter()
            .filter(|c| c.len() > 1 && reachable.contains(&c[0]))
            .collect();
        for component in &mut components {
            component.sort();
        }
        components.sort();
        components
            .into_iter()
            .map(|c| c.into_iter().map(|n| self.graph[n].clone()).collect())
            .collect()
    }

    /// Build a human-readable dependency tree starting at the roots.
    pub fn to_tree_string(&self) -> String {
        let mut result = String::new();
        let mut visited = HashSet::new();
        let roots = self.roots.clone();
        for (i, &root) in roots.iter().enumerate() {
            let is_last = i == roots.len() - 1;
            self.build_tree_string(root, None, &mut result, "", is_last, &mut visited);
        }
        result
    }

    fn build_tree_string(
        &self,
        node: NodeIndex,
        kind: Option<EdgeKind>,
        result: &mut String,
        prefix: &str,
        is_last: bool,
        visited: &mut HashSet<NodeIndex>,
    ) {
        let connector = if is_last {
            "└── "
        } else {
            "├── "
        };
        let marker = match kind {
            Some(EdgeKind::Must) => "[must] ",
            Some(EdgeKind::Should) => "[should] ",
            None => "",
        };
        result.push_str(&format!("{prefix}{connector}{marker}{}\n", self.graph[node]));

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };

        if !visited.insert(node) {
            let record = self.record(node);
            if !record.must.is_empty() || !record.should.is_empty() {
                result.push_str(&format!("{child_prefix}└── (already shown)\n"));
            }
            return;
        }

        let record = self.record(node);
        let children: Vec<(NodeIndex, EdgeKind)> = record
            .must
            .iter()
            .map(|&n| (n, EdgeKind::Must))
            .chain(record.should.iter().map(|&n| (n, EdgeKind::Should)))
            .filter(|&(n, _)| n != node)
            .collect();

        for (i, &(child, child_kind)) in children.iter().enumerate() {
            let is_last_child = i == children.len() - 1;
            self.build_tree_string(
                child,
                Some(child_kind),
                result,
                &child_prefix,
                is_last_child,
                visited,
            );
        }
    }
}

impl Default for DependencyGraph {
    fn default() -> Self {
        Self::new()
    }
}
