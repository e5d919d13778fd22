#![deny(unsafe_code)]

//! Dependency graph over quests and hideout levels.
//!
//! Edges point from prerequisite to dependent. The graph is built in one pass
//! over the catalog, every prerequisite reference is resolved, and the build
//! fails as a whole on an unresolved reference or a cycle.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use raidplan_model::NodeId;
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::options::TrackerOptions;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyGraph {
    prerequisites: BTreeMap<NodeId, BTreeSet<NodeId>>,
    dependents: BTreeMap<NodeId, BTreeSet<NodeId>>,
    layers: Vec<Vec<NodeId>>,
    order: Vec<NodeId>,
}

impl DependencyGraph {
    pub fn build(catalog: &Catalog, options: &TrackerOptions) -> Result<Self, CatalogError> {
        let mut prerequisites: BTreeMap<NodeId, BTreeSet<NodeId>> = BTreeMap::new();

        for quest in catalog.quests() {
            let node = NodeId::quest(&quest.id);
            let mut edges = BTreeSet::new();
            for id in &quest.prerequisite_quest_ids {
                edges.insert(resolve(catalog, &node, NodeId::quest(id))?);
            }
            for id in &quest.prerequisite_hideout_level_ids {
                edges.insert(resolve(catalog, &node, NodeId::level(id))?);
            }
            prerequisites.insert(node, edges);
        }

        for level in catalog.levels() {
            let node = NodeId::level(&level.id);
            let mut edges = BTreeSet::new();
            for id in &level.prerequisite_level_ids {
                edges.insert(resolve(catalog, &node, NodeId::level(id))?);
            }
            for id in &level.prerequisite_quest_ids {
                edges.insert(resolve(catalog, &node, NodeId::quest(id))?);
            }
            if options.implicit_station_order && level.level > 1 {
                let previous = catalog
                    .station(&level.station_id)
                    .and_then(|station| station.level_id(level.level - 1));
                if let Some(previous) = previous {
                    edges.insert(NodeId::level(previous));
                }
            }
            prerequisites.insert(node, edges);
        }

        if let Some(cycle) = find_cycle(&prerequisites) {
            return Err(CatalogError::CyclicDependency { cycle });
        }

        let mut dependents: BTreeMap<NodeId, BTreeSet<NodeId>> = prerequisites
            .keys()
            .map(|node| (node.clone(), BTreeSet::new()))
            .collect();
        for (node, edges) in &prerequisites {
            for prerequisite in edges {
                if let Some(set) = dependents.get_mut(prerequisite) {
                    set.insert(node.clone());
                }
            }
        }

        let layers = layer(&prerequisites, &dependents);
        let order: Vec<NodeId> = layers.iter().flatten().cloned().collect();
        debug!(
            nodes = prerequisites.len(),
            edges = prerequisites.values().map(BTreeSet::len).sum::<usize>(),
            layers = layers.len(),
            "dependency graph built"
        );

        Ok(Self {
            prerequisites,
            dependents,
            layers,
            order,
        })
    }

    pub fn contains(&self, node: &NodeId) -> bool {
        self.prerequisites.contains_key(node)
    }

    pub fn len(&self) -> usize {
        self.prerequisites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prerequisites.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &NodeId> {
        self.prerequisites.keys()
    }

    /// Direct prerequisites of a node; `None` if the node is not in the graph.
    pub fn prerequisites_of(&self, node: &NodeId) -> Option<&BTreeSet<NodeId>> {
        self.prerequisites.get(node)
    }

    /// Direct dependents (reverse edges) of a node.
    pub fn dependents_of(&self, node: &NodeId) -> Option<&BTreeSet<NodeId>> {
        self.dependents.get(node)
    }

    /// Nodes ordered so that every prerequisite precedes its dependents.
    /// Ties are broken by node id, so the order is deterministic.
    pub fn topological_order(&self) -> &[NodeId] {
        &self.order
    }

    /// Layer `n` holds the nodes whose longest prerequisite chain has length `n`.
    pub fn layers(&self) -> &[Vec<NodeId>] {
        &self.layers
    }
}

fn resolve(catalog: &Catalog, node: &NodeId, target: NodeId) -> Result<NodeId, CatalogError> {
    if catalog.contains_node(&target) {
        Ok(target)
    } else {
        Err(CatalogError::UnresolvedDependency {
            node: node.clone(),
            missing: target,
        })
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnStack,
    Done,
}

/// Depth-first search with an explicit stack. A prerequisite edge that reaches
/// a node still on the stack closes a cycle; the returned sequence starts and
/// ends at that node, each entry requiring the next.
fn find_cycle(prerequisites: &BTreeMap<NodeId, BTreeSet<NodeId>>) -> Option<Vec<NodeId>> {
    let empty = BTreeSet::new();
    let edges_of = |node: &NodeId| prerequisites.get(node).unwrap_or(&empty).iter();
    let mut marks: HashMap<&NodeId, Mark> = HashMap::new();

    for root in prerequisites.keys() {
        if marks.contains_key(root) {
            continue;
        }
        marks.insert(root, Mark::OnStack);
        let mut stack = vec![(root, edges_of(root))];

        loop {
            let next = match stack.last_mut() {
                Some((_, edges)) => edges.next(),
                None => break,
            };
            match next {
                Some(next) => match marks.get(next).copied() {
                    Some(Mark::OnStack) => {
                        let start = stack
                            .iter()
                            .position(|(node, _)| *node == next)
                            .unwrap_or(0);
                        let mut cycle: Vec<NodeId> = stack[start..]
                            .iter()
                            .map(|(node, _)| (*node).clone())
                            .collect();
                        cycle.push(next.clone());
                        return Some(cycle);
                    }
                    Some(Mark::Done) => {}
                    None => {
                        marks.insert(next, Mark::OnStack);
                        stack.push((next, edges_of(next)));
                    }
                },
                None => {
                    if let Some((done, _)) = stack.pop() {
                        marks.insert(done, Mark::Done);
                    }
                }
            }
        }
    }
    None
}

fn layer(
    prerequisites: &BTreeMap<NodeId, BTreeSet<NodeId>>,
    dependents: &BTreeMap<NodeId, BTreeSet<NodeId>>,
) -> Vec<Vec<NodeId>> {
    let mut remaining: BTreeMap<&NodeId, usize> = prerequisites
        .iter()
        .map(|(node, edges)| (node, edges.len()))
        .collect();
    let mut current: BTreeSet<&NodeId> = remaining
        .iter()
        .filter(|(_, count)| **count == 0)
        .map(|(node, _)| *node)
        .collect();
    let mut layers = Vec::new();

    while !current.is_empty() {
        let mut next = BTreeSet::new();
        for node in &current {
            for dependent in dependents.get(*node).into_iter().flatten() {
                if let Some(count) = remaining.get_mut(dependent) {
                    *count -= 1;
                    if *count == 0 {
                        next.insert(dependent);
                    }
                }
            }
        }
        layers.push(current.into_iter().cloned().collect());
        current = next;
    }
    layers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> NodeId {
        id.parse().expect("node id")
    }

    fn build(json: &str) -> Result<DependencyGraph, CatalogError> {
        let catalog = Catalog::from_json_str(json).expect("catalog");
        DependencyGraph::build(&catalog, &TrackerOptions::default())
    }

    const CHAIN: &str = r#"{
        "quests": [
            {"id": "a", "name": "A"},
            {"id": "b", "name": "B", "prerequisiteQuestIds": ["a"]},
            {"id": "c", "name": "C", "prerequisiteQuestIds": ["a", "b"],
             "prerequisiteHideoutLevelIds": ["stash-2"]}
        ],
        "hideoutLevels": [
            {"id": "stash-1", "stationId": "stash", "level": 1},
            {"id": "stash-2", "stationId": "stash", "level": 2}
        ]
    }"#;

    #[test]
    fn resolves_edges_in_both_directions() {
        let graph = build(CHAIN).expect("graph");
        assert_eq!(graph.len(), 5);
        let c = graph.prerequisites_of(&node("quest:c")).unwrap();
        assert!(c.contains(&node("quest:a")));
        assert!(c.contains(&node("level:stash-2")));
        let a = graph.dependents_of(&node("quest:a")).unwrap();
        assert_eq!(a.len(), 2);
        // implicit sequential edge
        assert!(
            graph
                .prerequisites_of(&node("level:stash-2"))
                .unwrap()
                .contains(&node("level:stash-1"))
        );
    }

    #[test]
    fn declared_only_skips_station_order() {
        let catalog = Catalog::from_json_str(CHAIN).unwrap();
        let graph = DependencyGraph::build(&catalog, &TrackerOptions::declared_only()).unwrap();
        assert!(graph.prerequisites_of(&node("level:stash-2")).unwrap().is_empty());
    }

    #[test]
    fn topological_order_respects_edges() {
        let graph = build(CHAIN).expect("graph");
        let position = |id: &str| {
            graph
                .topological_order()
                .iter()
                .position(|n| *n == node(id))
                .unwrap()
        };
        assert!(position("quest:a") < position("quest:b"));
        assert!(position("quest:b") < position("quest:c"));
        assert!(position("level:stash-1") < position("level:stash-2"));
        assert_eq!(graph.layers().len(), 3);
        assert_eq!(graph.layers()[0], vec![node("quest:a"), node("level:stash-1")]);
    }

    #[test]
    fn unresolved_prerequisite_is_an_error() {
        let error = build(r#"{"quests": [{"id": "a", "name": "A", "prerequisiteQuestIds": ["zzz"]}]}"#)
            .unwrap_err();
        match error {
            CatalogError::UnresolvedDependency { node: from, missing } => {
                assert_eq!(from, node("quest:a"));
                assert_eq!(missing, node("quest:zzz"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn quest_and_level_cycle_is_reported() {
        let error = build(
            r#"{
                "quests": [{"id": "a", "name": "A", "prerequisiteHideoutLevelIds": ["h1"]}],
                "hideoutLevels": [{"id": "h1", "stationId": "s", "level": 1,
                                   "prerequisiteQuestIds": ["a"]}]
            }"#,
        )
        .unwrap_err();
        match error {
            CatalogError::CyclicDependency { cycle } => {
                assert_eq!(cycle.first(), cycle.last());
                assert_eq!(cycle.len(), 3);
                assert!(cycle.contains(&node("quest:a")));
                assert!(cycle.contains(&node("level:h1")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn self_dependency_is_a_cycle() {
        let error =
            build(r#"{"quests": [{"id": "a", "name": "A", "prerequisiteQuestIds": ["a"]}]}"#)
                .unwrap_err();
        assert!(matches!(error, CatalogError::CyclicDependency { ref cycle } if cycle.len() == 2));
    }

    #[test]
    fn long_chain_does_not_overflow() {
        let quests: Vec<String> = (0..20_000)
            .map(|i| {
                if i == 0 {
                    r#"{"id": "q0", "name": "Q"}"#.to_string()
                } else {
                    format!(
                        r#"{{"id": "q{i}", "name": "Q", "prerequisiteQuestIds": ["q{}"]}}"#,
                        i - 1
                    )
                }
            })
            .collect();
        let json = format!(r#"{{"quests": [{}]}}"#, quests.join(","));
        let graph = build(&json).expect("graph");
        assert_eq!(graph.layers().len(), 20_000);
    }
}
