//! Delay-and-release scheduling of a dependency graph.
//!
//! The scheduler owns the transient state of one traversal and never mutates
//! the [`DependencyGraph`]. It walks the root's should-list depth-first:
//!
//! 1. must-children are visited first, in declared order; a child that is not
//!    emitted afterwards makes the parent wait on it (`ref_count`, `back_refs`);
//! 2. a node with no outstanding waits is emitted, otherwise it is delayed and
//!    stamped with the next sequence number;
//! 3. emitting a node releases the waiters whose count drops to zero; released
//!    nodes are emitted smallest sequence number first, and the release queue is
//!    drained before the walk continues;
//! 4. should-children are visited last and never create waits.
//!
//! Nodes still delayed after the walk sit on must-cycles. [`Scheduler::run`]
//! breaks them one edge at a time and reports each cut.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};

use petgraph::graph::NodeIndex;

use super::graph::DependencyGraph;

/// Traversal state of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitState {
    /// Not reached yet.
    Unvisited,
    /// Must-children are being visited.
    InProgress,
    /// Waiting for must-children to be emitted.
    Delayed,
    /// Part of the output.
    Emitted,
}

#[derive(Debug, Clone)]
struct NodeState {
    visit: VisitState,
    /// Must-children this node still waits on.
    ref_count: usize,
    /// Nodes waiting on this one, in registration order.
    back_refs: Vec<NodeIndex>,
    /// Sequence number assigned when the node was delayed.
    delayed: Option<u64>,
}

impl Default for NodeState {
    fn default() -> Self {
        Self {
            visit: VisitState::Unvisited,
            ref_count: 0,
            back_refs: Vec::new(),
            delayed: None,
        }
    }
}

/// A must-cycle broken by removing one edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutCycle {
    /// Cycle members: each node after the first requires its predecessor, and
    /// the first requires the last.
    pub path: Vec<NodeIndex>,
    /// The removed edge: `cut.0` no longer must-depends on `cut.1`.
    pub cut: (NodeIndex, NodeIndex),
}

/// Result of scheduling a graph.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    /// Every node reachable from the roots, in emission order.
    pub order: Vec<NodeIndex>,
    /// Cycles broken to complete the order, in the order they were cut.
    pub cuts: Vec<CutCycle>,
}

/// One-shot traversal over a [`DependencyGraph`].
pub struct Scheduler<'g> {
    graph: &'g DependencyGraph,
    nodes: Vec<NodeState>,
    next_seq: u64,
    release: BinaryHeap<Reverse<(u64, NodeIndex)>>,
    order: Vec<NodeIndex>,
}

impl<'g> Scheduler<'g> {
    /// Prepare a traversal of `graph`.
    pub fn new(graph: &'g DependencyGraph) -> Self {
        Self {
            graph,
            nodes: vec![NodeState::default(); graph.node_count()],
            next_seq: 0,
            release: BinaryHeap::new(),
            order: Vec::with_capacity(graph.node_count()),
        }
    }

    /// Walk the graph from its roots and break any must-cycles.
    pub fn run(mut self) -> Schedule {
        for &root in self.graph.roots() {
            self.visit(root);
        }
        let cuts = self.break_cycles();
        tracing::trace!(
            "Scheduled {} node(s), {} delayed, {} cycle(s) cut",
            self.order.len(),
            self.next_seq,
            cuts.len()
        );

        Schedule {
            order: self.order,
            cuts,
        }
    }

    /// Current state of `node`.
    pub fn state(&self, node: NodeIndex) -> VisitState {
        self.nodes[node.index()].visit
    }

    fn visit(&mut self, node: NodeIndex) {
        if self.state(node) != VisitState::Unvisited {
            return;
        }
        self.nodes[node.index()].visit = VisitState::InProgress;

        let graph = self.graph;
        for &child in graph.must(node) {
            if child == node {
                continue;
            }
            self.visit(child);
            if self.state(child) != VisitState::Emitted {
                self.nodes[node.index()].ref_count += 1;
                self.nodes[child.index()].back_refs.push(node);
            }
        }

        self.try_emit(node);

        for &child in graph.should(node) {
            if child != node {
                self.visit(child);
            }
        }
    }

    fn try_emit(&mut self, node: NodeIndex) {
        let state = &mut self.nodes[node.index()];
        if state.ref_count == 0 {
            self.emit_and_release(node);
        } else {
            state.visit = VisitState::Delayed;
            state.delayed = Some(self.next_seq);
            self.next_seq += 1;
        }
    }

    /// Emit `node`, then drain every delayed node it transitively releases.
    fn emit_and_release(&mut self, node: NodeIndex) {
        self.emit(node);
        while let Some(Reverse((_, released))) = self.release.pop() {
            self.emit(released);
        }
    }

    fn emit(&mut self, node: NodeIndex) {
        self.nodes[node.index()].visit = VisitState::Emitted;
        self.order.push(node);

        let waiters = std::mem::take(&mut self.nodes[node.index()].back_refs);
        for waiter in waiters {
            let state = &mut self.nodes[waiter.index()];
            state.ref_count -= 1;
            if state.ref_count == 0 && state.visit == VisitState::Delayed {
                let seq = state.delayed.unwrap_or_default();
                self.release.push(Reverse((seq, waiter)));
            }
        }
    }

    /// Delayed nodes that still wait on something, earliest-delayed first.
    fn stuck_nodes(&self) -> Vec<NodeIndex> {
        let mut stuck: Vec<(u64, NodeIndex)> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, s)| s.visit == VisitState::Delayed && s.ref_count > 0)
            .map(|(i, s)| (s.delayed.unwrap_or_default(), NodeIndex::new(i)))
            .collect();
        stuck.sort();
        stuck.into_iter().map(|(_, n)| n).collect()
    }

    fn break_cycles(&mut self) -> Vec<CutCycle> {
        let mut cuts = Vec::new();

        loop {
            let stuck = self.stuck_nodes();
            if stuck.is_empty() {
                break;
            }

            let Some(path) = stuck.iter().find_map(|&start| self.find_cycle(start)) else {
                // Every stuck node waits on a cycle member, so this is unreachable
                // unless the bookkeeping is broken.
                tracing::error!("{} node(s) stuck without a must-cycle", stuck.len());
                break;
            };

            let start = path[0];
            let closing = path[path.len() - 1];
            let waiters = &mut self.nodes[closing.index()].back_refs;
            if let Some(position) = waiters.iter().position(|&w| w == start) {
                waiters.remove(position);
            }
            self.nodes[start.index()].ref_count -= 1;
            tracing::trace!(
                "Cut must edge {} -> {}",
                self.graph.entity(start),
                self.graph.entity(closing)
            );

            cuts.push(CutCycle {
                path,
                cut: (start, closing),
            });

            if self.nodes[start.index()].ref_count == 0 {
                self.emit_and_release(start);
            }
        }

        cuts
    }

    /// Follow back-refs from `start` looking for a path that leads back to it.
    ///
    /// Returns `[start, w1, .., wk]` where each `w(i+1)` waits on `w(i)` and
    /// `start` waits on `wk`.
    fn find_cycle(&self, start: NodeIndex) -> Option<Vec<NodeIndex>> {
        let mut path = Vec::new();
        let mut seen = HashSet::from([start]);
        self.search(start, start, &mut path, &mut seen).then_some(path)
    }

    fn search(
        &self,
        start: NodeIndex,
        node: NodeIndex,
        path: &mut Vec<NodeIndex>,
        seen: &mut HashSet<NodeIndex>,
    ) -> bool {
        path.push(node);
        let back_refs = &self.nodes[node.index()].back_refs;
        if node != start && back_refs.contains(&start) {
            return true;
        }
        for &waiter in back_refs {
            if self.state(waiter) != VisitState::Emitted
                && seen.insert(waiter)
                && self.search(start, waiter, path, seen)
            {
                return true;
            }
        }
        path.pop();
        false
    }
}
