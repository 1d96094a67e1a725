//! Randomized checks of the ordering guarantees.
//!
//! Random must/should graphs are written as in-memory declaration files and
//! resolved end to end; the output is checked against the edge list.
//! Every loader also serves a malformed file for [`GHOST`], which resolution
//! must never read unless a live edge leads to it.

use std::collections::{HashMap, HashSet, VecDeque};

use proptest::prelude::*;
use serde_json::{Map, Value, json};

use bemdeps::core::Entity;
use bemdeps::resolver::{DepsResolver, ResolveOptions, Resolution};
use bemdeps::test_utils::MemoryLoader;

#[derive(Debug, Clone)]
struct RandomGraph {
    nodes: usize,
    /// `(from, to, is_must)` in declaration order
    edges: Vec<(usize, usize, bool)>,
    roots: Vec<usize>,
}

/// Entity with a malformed declaration file.
const GHOST: &str = "ghost";

fn name(i: usize) -> String {
    format!("n{i}")
}

/// A dependency of `from` that is declared and then removed with `noDeps`.
#[derive(Debug, Clone)]
struct Removal {
    from: usize,
    /// Existing node, or [`GHOST`] when `None`
    target: Option<usize>,
    must: bool,
}

impl Removal {
    fn target(&self) -> String {
        self.target.map_or_else(|| GHOST.to_string(), name)
    }
}

fn arb_graph() -> impl Strategy<Value = RandomGraph> {
    (1usize..8).prop_flat_map(|nodes| {
        (
            Just(nodes),
            prop::collection::vec((0..nodes, 0..nodes, any::<bool>()), 0..20),
            prop::collection::vec(0..nodes, 1..4),
        )
            .prop_map(|(nodes, edges, roots)| RandomGraph {
                nodes,
                edges,
                roots,
            })
    })
}

fn arb_removal() -> impl Strategy<Value = (RandomGraph, Removal)> {
    arb_graph().prop_flat_map(|graph| {
        let nodes = graph.nodes;
        (Just(graph), 0..nodes, prop::option::of(0..nodes), any::<bool>()).prop_map(
            |(graph, from, target, must)| {
                (
                    graph,
                    Removal {
                        from,
                        target,
                        must,
                    },
                )
            },
        )
    })
}

impl RandomGraph {
    /// The declaration item of `node`, leaving out edges to `except`.
    fn item(&self, node: usize, except: Option<&str>) -> Value {
        let targets = |must: bool| -> Vec<String> {
            self.edges
                .iter()
                .filter(|&&(from, _, kind)| from == node && kind == must)
                .map(|&(_, to, _)| name(to))
                .filter(|to| Some(to.as_str()) != except)
                .collect()
        };
        json!({ "mustDeps": targets(true), "shouldDeps": targets(false) })
    }

    fn loader(&self) -> MemoryLoader {
        self.loader_with(|node| self.item(node, None))
    }

    fn loader_with(&self, file: impl Fn(usize) -> Value) -> MemoryLoader {
        let mut loader = MemoryLoader::new().with_file(GHOST, "{ broken");
        for node in 0..self.nodes {
            loader = loader.with_file(&name(node), &file(node).to_string());
        }
        loader
    }

    /// `removal.from` never mentions the target.
    fn loader_without(&self, removal: &Removal) -> MemoryLoader {
        let target = removal.target();
        self.loader_with(|node| {
            if node == removal.from {
                self.item(node, Some(target.as_str()))
            } else {
                self.item(node, None)
            }
        })
    }

    /// `removal.from` declares the target in a second item and removes it in
    /// a third.
    fn loader_with_removal(&self, removal: &Removal) -> MemoryLoader {
        let target = removal.target();
        let kind = if removal.must { "mustDeps" } else { "shouldDeps" };
        self.loader_with(|node| {
            if node != removal.from {
                return self.item(node, None);
            }
            let mut declare = Map::new();
            declare.insert(kind.to_string(), json!(target));
            json!([self.item(node, None), declare, { "noDeps": target }])
        })
    }

    fn declaration(&self) -> Vec<Entity> {
        self.roots.iter().map(|&r| Entity::block(name(r))).collect()
    }

    fn reachable(&self) -> HashSet<String> {
        let mut seen: HashSet<usize> = self.roots.iter().copied().collect();
        let mut queue: VecDeque<usize> = self.roots.iter().copied().collect();
        while let Some(node) = queue.pop_front() {
            for &(from, to, _) in &self.edges {
                if from == node && seen.insert(to) {
                    queue.push_back(to);
                }
            }
        }
        seen.into_iter().map(name).collect()
    }

    fn must_edges(&self) -> HashSet<(String, String)> {
        self.edges
            .iter()
            .filter(|&&(from, to, must)| must && from != to)
            .map(|&(from, to, _)| (name(from), name(to)))
            .collect()
    }
}

fn resolve(graph: &RandomGraph, strict: bool) -> anyhow::Result<Resolution> {
    resolve_with(graph.loader(), &graph.declaration(), strict)
}

fn resolve_with(
    loader: MemoryLoader,
    declaration: &[Entity],
    strict: bool,
) -> anyhow::Result<Resolution> {
    let runtime = tokio::runtime::Builder::new_current_thread().build()?;
    let resolver = DepsResolver::new(
        loader,
        ResolveOptions {
            strict,
            ..ResolveOptions::default()
        },
    );
    runtime.block_on(resolver.resolve_entities(declaration))
}

fn keys(resolution: &Resolution) -> Vec<String> {
    resolution.entities().iter().map(|e| e.key()).collect()
}

/// Each entity with the entity it was reached from.
fn contexts(resolution: &Resolution) -> Vec<(String, Option<String>)> {
    resolution
        .items
        .iter()
        .map(|item| (item.entity.key(), item.context.as_ref().map(Entity::key)))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every reachable entity appears exactly once, and nothing else does.
    #[test]
    fn entities_are_reachable_and_unique(graph in arb_graph()) {
        let resolution = resolve(&graph, false).unwrap();
        let order = keys(&resolution);

        let unique: HashSet<String> = order.iter().cloned().collect();
        prop_assert_eq!(unique.len(), order.len());
        prop_assert_eq!(unique, graph.reachable());
    }

    /// Must-dependencies precede their dependents unless the edge was cut.
    #[test]
    fn must_dependencies_come_first(graph in arb_graph()) {
        let resolution = resolve(&graph, false).unwrap();
        let position: HashMap<String, usize> =
            keys(&resolution).into_iter().enumerate().map(|(i, k)| (k, i)).collect();

        let cut: HashSet<(String, String)> = resolution
            .cycles
            .iter()
            .map(|c| (c.entities[0].key(), c.entities[c.entities.len() - 1].key()))
            .collect();

        for (from, to) in graph.must_edges() {
            if cut.contains(&(from.clone(), to.clone())) {
                continue;
            }
            if let (Some(a), Some(b)) = (position.get(&from), position.get(&to)) {
                prop_assert!(b < a, "{} must precede {} in {:?}", to, from, position);
            }
        }
    }

    /// Reported cycles are made of declared must-edges.
    #[test]
    fn cycles_follow_must_edges(graph in arb_graph()) {
        let resolution = resolve(&graph, false).unwrap();
        let must = graph.must_edges();

        for cycle in &resolution.cycles {
            let members: Vec<String> = cycle.entities.iter().map(Entity::key).collect();
            let distinct: HashSet<&String> = members.iter().collect();
            prop_assert!(members.len() >= 2);
            prop_assert_eq!(distinct.len(), members.len());

            for pair in members.windows(2) {
                prop_assert!(must.contains(&(pair[1].clone(), pair[0].clone())));
            }
            let closing = (members[0].clone(), members[members.len() - 1].clone());
            prop_assert!(must.contains(&closing));
        }
    }

    /// Same input, same output; strict mode fails exactly when cycles are cut.
    #[test]
    fn resolution_is_deterministic(graph in arb_graph()) {
        let first = resolve(&graph, false).unwrap();
        let second = resolve(&graph, false).unwrap();
        prop_assert_eq!(keys(&first), keys(&second));
        prop_assert_eq!(&first.cycles, &second.cycles);

        let strict = resolve(&graph, true);
        prop_assert_eq!(strict.is_err(), !first.cycles.is_empty());
    }

    /// Declaring a dependency and removing it in a later item of the same
    /// file is indistinguishable from never declaring it, even when the
    /// target's own file is malformed.
    #[test]
    fn declare_then_remove_equals_never_declared((graph, removal) in arb_removal()) {
        let declaration = graph.declaration();
        let without = resolve_with(graph.loader_without(&removal), &declaration, false).unwrap();
        let with_removal =
            resolve_with(graph.loader_with_removal(&removal), &declaration, false).unwrap();

        prop_assert_eq!(keys(&with_removal), keys(&without));
        prop_assert_eq!(contexts(&with_removal), contexts(&without));
        prop_assert_eq!(&with_removal.cycles, &without.cycles);
    }
}

/// Two waiters released by the same emission come out in the order they
/// were delayed, not in the order they started waiting.
#[tokio::test]
async fn test_release_order_follows_delay_order() {
    let loader = MemoryLoader::new()
        .with_file("a", r#"{"mustDeps": "x"}"#)
        .with_file("x", r#"{"mustDeps": "a", "shouldDeps": "w1"}"#)
        .with_file("w1", r#"{"mustDeps": ["x", "y"]}"#)
        .with_file("y", r#"{"shouldDeps": "w2"}"#)
        .with_file("w2", r#"{"mustDeps": "x"}"#);

    let resolver = DepsResolver::new(loader, ResolveOptions::default());
    let resolution = resolver.resolve_entities(&[Entity::block("a")]).await.unwrap();

    assert_eq!(keys(&resolution), ["y", "x", "w2", "w1", "a"]);
    assert_eq!(resolution.cycles.len(), 1);
    assert_eq!(resolution.cycles[0].chain(), "x <- a <- x");
}
