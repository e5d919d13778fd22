//! Requirement aggregation: item totals over a selection of nodes,
//! deduplicated by item id, with provenance.

use std::collections::{BTreeMap, BTreeSet};

use raidplan_model::{DerivedStatus, Disposition, ItemId, NodeId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::graph::DependencyGraph;
use crate::progress::ProgressState;
use crate::status::{derive_status, unlock_distances};

/// Quantities the player already holds, by item.
pub type OwnedQuantities = BTreeMap<ItemId, u64>;

/// Which nodes contribute to an aggregation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Selection {
    /// Nodes whose prerequisites are all completed.
    #[default]
    Available,
    /// Available nodes plus locked nodes that unlock within `depth` waves of
    /// completions. `depth = 0` is the same as `Available`.
    LookAhead { depth: u32 },
    /// Exactly these nodes, whatever their status.
    Nodes { nodes: BTreeSet<NodeId> },
}

/// Node kinds considered by an aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeScope {
    #[default]
    All,
    Quests,
    Hideout,
}

impl NodeScope {
    pub fn includes(self, node: &NodeId) -> bool {
        match self {
            Self::All => true,
            Self::Quests => node.is_quest(),
            Self::Hideout => node.is_hideout_level(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AggregationOptions {
    pub selection: Selection,
    pub scope: NodeScope,
    /// When present, outstanding quantities are reduced by what is owned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned: Option<OwnedQuantities>,
}

impl AggregationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn look_ahead(depth: u32) -> Self {
        Self {
            selection: Selection::LookAhead { depth },
            ..Self::default()
        }
    }

    pub fn nodes<I>(nodes: I) -> Self
    where
        I: IntoIterator<Item = NodeId>,
    {
        Self {
            selection: Selection::Nodes {
                nodes: nodes.into_iter().collect(),
            },
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_scope(mut self, scope: NodeScope) -> Self {
        self.scope = scope;
        self
    }

    #[must_use]
    pub fn with_owned(mut self, owned: OwnedQuantities) -> Self {
        self.owned = Some(owned);
        self
    }
}

/// One node's share of an aggregated entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub node: NodeId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objective_index: Option<usize>,
    pub quantity: u64,
    pub disposition: Disposition,
    pub found_in_raid: bool,
    /// The contributing quest hands this item out when it starts.
    pub provided: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRequirement {
    pub item_id: ItemId,
    pub item_name: String,
    pub required_quantity: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owned_quantity: Option<u64>,
    pub outstanding_quantity: u64,
    /// At least one contribution must be found in raid.
    pub found_in_raid: bool,
    /// At least one contributing quest provides the item on start.
    pub provided: bool,
    pub contributions: Vec<Contribution>,
}

impl AggregatedRequirement {
    /// Distinct contributing nodes, in node order.
    pub fn contributing_nodes(&self) -> Vec<NodeId> {
        let nodes: BTreeSet<&NodeId> = self.contributions.iter().map(|c| &c.node).collect();
        nodes.into_iter().cloned().collect()
    }

    fn apply_owned(&mut self, owned: Option<u64>) {
        self.owned_quantity = owned;
        self.outstanding_quantity = match owned {
            Some(owned) => self.required_quantity.saturating_sub(owned),
            None => self.required_quantity,
        };
    }
}

/// Aggregated requirements of a node selection, ordered by item id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregation {
    pub nodes: BTreeSet<NodeId>,
    pub entries: BTreeMap<ItemId, AggregatedRequirement>,
}

impl Aggregation {
    pub fn get(&self, item: &ItemId) -> Option<&AggregatedRequirement> {
        self.entries.get(item)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AggregatedRequirement> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total_outstanding(&self) -> u64 {
        self.entries.values().map(|e| e.outstanding_quantity).sum()
    }
}

/// Resolve the selection predicate against the current state.
pub fn select_nodes(
    graph: &DependencyGraph,
    state: &ProgressState,
    options: &AggregationOptions,
) -> BTreeSet<NodeId> {
    let scope = options.scope;
    match &options.selection {
        Selection::Available => graph
            .nodes()
            .filter(|node| scope.includes(node))
            .filter(|node| derive_status(graph, state, node) == Some(DerivedStatus::Available))
            .cloned()
            .collect(),
        Selection::LookAhead { depth } => unlock_distances(graph, state)
            .into_iter()
            .filter(|(node, distance)| distance <= depth && scope.includes(node))
            .map(|(node, _)| node)
            .collect(),
        Selection::Nodes { nodes } => nodes
            .iter()
            .filter(|node| {
                let known = graph.contains(node);
                if !known {
                    warn!(node = %node, "ignoring unknown node in aggregation selection");
                }
                known && scope.includes(node)
            })
            .cloned()
            .collect(),
    }
}

/// Aggregate item requirements for the nodes chosen by `options`.
pub fn aggregate(
    catalog: &Catalog,
    graph: &DependencyGraph,
    state: &ProgressState,
    options: &AggregationOptions,
) -> Result<Aggregation, CatalogError> {
    let nodes = select_nodes(graph, state, options);
    let mut aggregation = aggregate_nodes(catalog, nodes)?;
    if let Some(owned) = &options.owned {
        apply_owned(&mut aggregation, owned);
    }
    debug!(
        nodes = aggregation.nodes.len(),
        items = aggregation.entries.len(),
        "aggregated requirements"
    );
    Ok(aggregation)
}

/// Aggregate exactly `nodes`. Unknown nodes contribute nothing.
pub fn aggregate_nodes(
    catalog: &Catalog,
    nodes: BTreeSet<NodeId>,
) -> Result<Aggregation, CatalogError> {
    let mut entries: BTreeMap<ItemId, AggregatedRequirement> = BTreeMap::new();
    for node in &nodes {
        for found in catalog.requirements_of(node).into_iter().flatten() {
            let requirement = found.requirement;
            let item = catalog.item(&requirement.item_id).ok_or_else(|| {
                CatalogError::UnresolvedItem {
                    node: node.clone(),
                    item: requirement.item_id.clone(),
                }
            })?;
            let quantity = u64::from(requirement.quantity);
            let entry = entries
                .entry(item.id.clone())
                .or_insert_with(|| AggregatedRequirement {
                    item_id: item.id.clone(),
                    item_name: item.name.clone(),
                    required_quantity: 0,
                    owned_quantity: None,
                    outstanding_quantity: 0,
                    found_in_raid: false,
                    provided: false,
                    contributions: Vec::new(),
                });
            let provided = catalog.provides(node, &item.id);
            entry.required_quantity += quantity;
            entry.outstanding_quantity += quantity;
            entry.found_in_raid |= requirement.found_in_raid;
            entry.provided |= provided;
            entry.contributions.push(Contribution {
                node: node.clone(),
                objective_index: found.objective_index,
                quantity,
                disposition: requirement.disposition,
                found_in_raid: requirement.found_in_raid,
                provided,
            });
        }
    }
    Ok(Aggregation { nodes, entries })
}

/// Set owned quantities on every entry: outstanding = max(0, required - owned).
///
/// Items owned but not required are ignored.
pub fn apply_owned(aggregation: &mut Aggregation, owned: &OwnedQuantities) {
    for entry in aggregation.entries.values_mut() {
        let held = owned.get(&entry.item_id).copied().unwrap_or(0);
        entry.apply_owned(Some(held));
    }
}

/// Combine two aggregations over disjoint node sets.
///
/// Owned quantities are taken from whichever side has them and outstanding
/// quantities recomputed against the combined total.
pub fn merge(left: Aggregation, right: Aggregation) -> Aggregation {
    let mut nodes = left.nodes;
    nodes.extend(right.nodes);
    let mut entries = left.entries;
    for (item, incoming) in right.entries {
        match entries.get_mut(&item) {
            Some(existing) => {
                existing.required_quantity += incoming.required_quantity;
                existing.found_in_raid |= incoming.found_in_raid;
                existing.provided |= incoming.provided;
                existing.contributions.extend(incoming.contributions);
                existing.contributions.sort_by(|a, b| a.node.cmp(&b.node));
                let owned = existing.owned_quantity.or(incoming.owned_quantity);
                existing.apply_owned(owned);
            }
            None => {
                entries.insert(item, incoming);
            }
        }
    }
    Aggregation { nodes, entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::TrackerOptions;

    const CATALOG: &str = r#"{
        "items": [
            {"id": "bolts", "name": "Bolts"},
            {"id": "gpu", "name": "Graphics card"},
            {"id": "salewa", "name": "Salewa"}
        ],
        "quests": [
            {"id": "q1", "name": "Shortage", "objectives": [
                {"requiredItems": [{"itemId": "salewa", "quantity": 2, "foundInRaid": true}]}
            ]},
            {"id": "q2", "name": "Sanitary", "providedItemIds": ["salewa"], "objectives": [
                {"requiredItems": []},
                {"requiredItems": [{"itemId": "salewa", "quantity": 3}]}
            ]},
            {"id": "q3", "name": "Gunsmith", "prerequisiteQuestIds": ["q1"], "objectives": [
                {"requiredItems": [{"itemId": "gpu", "quantity": 1, "disposition": "kept"}]}
            ]},
            {"id": "q4", "name": "Later", "prerequisiteQuestIds": ["q3"], "objectives": [
                {"requiredItems": [{"itemId": "bolts", "quantity": 4}]}
            ]}
        ],
        "hideoutLevels": [
            {"id": "wb1", "stationId": "workbench", "level": 1,
             "requiredItems": [{"itemId": "bolts", "quantity": 5}]}
        ]
    }"#;

    fn fixture() -> (Catalog, DependencyGraph) {
        let catalog = Catalog::from_json_str(CATALOG).expect("catalog");
        let graph = DependencyGraph::build(&catalog, &TrackerOptions::default()).expect("graph");
        (catalog, graph)
    }

    fn node(id: &str) -> NodeId {
        id.parse().expect("node id")
    }

    fn item(id: &str) -> ItemId {
        ItemId::new(id).expect("item id")
    }

    #[test]
    fn shared_item_is_summed_with_provenance() {
        let (catalog, graph) = fixture();
        let state = ProgressState::new();
        let result =
            aggregate(&catalog, &graph, &state, &AggregationOptions::default()).unwrap();
        let salewa = result.get(&item("salewa")).unwrap();
        assert_eq!(salewa.required_quantity, 5);
        assert_eq!(salewa.outstanding_quantity, 5);
        assert!(salewa.found_in_raid);
        assert_eq!(
            salewa.contributing_nodes(),
            vec![node("quest:q1"), node("quest:q2")]
        );
        assert_eq!(salewa.contributions[1].objective_index, Some(1));
        assert!(salewa.provided);
        assert!(!salewa.contributions[0].provided);
        assert!(salewa.contributions[1].provided);
        assert!(result.get(&item("gpu")).is_none());
    }

    #[test]
    fn scope_limits_node_kinds() {
        let (catalog, graph) = fixture();
        let state = ProgressState::new();
        let options = AggregationOptions::default().with_scope(NodeScope::Hideout);
        let result = aggregate(&catalog, &graph, &state, &options).unwrap();
        assert_eq!(result.nodes, BTreeSet::from([node("level:wb1")]));
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn look_ahead_adds_locked_nodes_by_wave() {
        let (catalog, graph) = fixture();
        let state = ProgressState::new();
        let one = select_nodes(&graph, &state, &AggregationOptions::look_ahead(1));
        assert!(one.contains(&node("quest:q3")));
        assert!(!one.contains(&node("quest:q4")));
        let two = aggregate(&catalog, &graph, &state, &AggregationOptions::look_ahead(2)).unwrap();
        assert_eq!(two.get(&item("bolts")).unwrap().required_quantity, 9);
        let zero = select_nodes(&graph, &state, &AggregationOptions::look_ahead(0));
        assert_eq!(zero, select_nodes(&graph, &state, &AggregationOptions::default()));
    }

    #[test]
    fn completed_nodes_are_not_aggregated() {
        let (catalog, graph) = fixture();
        let state = ProgressState::with_completed([node("quest:q1")]);
        let result =
            aggregate(&catalog, &graph, &state, &AggregationOptions::look_ahead(5)).unwrap();
        assert!(!result.nodes.contains(&node("quest:q1")));
        assert_eq!(result.get(&item("salewa")).unwrap().required_quantity, 3);
    }

    #[test]
    fn owned_quantities_reduce_outstanding() {
        let (catalog, graph) = fixture();
        let state = ProgressState::new();
        let owned = OwnedQuantities::from([(item("salewa"), 7), (item("bolts"), 2)]);
        let options = AggregationOptions::default().with_owned(owned);
        let result = aggregate(&catalog, &graph, &state, &options).unwrap();
        let salewa = result.get(&item("salewa")).unwrap();
        assert_eq!(salewa.owned_quantity, Some(7));
        assert_eq!(salewa.outstanding_quantity, 0);
        let bolts = result.get(&item("bolts")).unwrap();
        assert_eq!((bolts.required_quantity, bolts.outstanding_quantity), (5, 3));
        assert_eq!(result.total_outstanding(), 3);
    }

    #[test]
    fn explicit_selection_skips_unknown_nodes() {
        let selected = {
            let (_, graph) = fixture();
            let options = AggregationOptions::nodes([node("quest:q4"), node("quest:ghost")]);
            select_nodes(&graph, &ProgressState::new(), &options)
        };
        assert_eq!(selected, BTreeSet::from([node("quest:q4")]));
    }

    #[test]
    fn merge_matches_direct_aggregation() {
        let (catalog, _) = fixture();
        let ab = aggregate_nodes(&catalog, BTreeSet::from([node("quest:q1"), node("level:wb1")]));
        let c = aggregate_nodes(&catalog, BTreeSet::from([node("quest:q2"), node("quest:q4")]));
        let all = aggregate_nodes(
            &catalog,
            BTreeSet::from([
                node("quest:q1"),
                node("quest:q2"),
                node("quest:q4"),
                node("level:wb1"),
            ]),
        );
        assert_eq!(merge(ab.unwrap(), c.unwrap()), all.unwrap());
    }

    #[test]
    fn aggregation_report_shape() {
        let (catalog, _) = fixture();
        let result = aggregate_nodes(&catalog, BTreeSet::from([node("quest:q2"), node("quest:q3")]))
            .unwrap();
        insta::assert_json_snapshot!(result, @r#"
        {
          "nodes": [
            "quest:q2",
            "quest:q3"
          ],
          "entries": {
            "gpu": {
              "itemId": "gpu",
              "itemName": "Graphics card",
              "requiredQuantity": 1,
              "outstandingQuantity": 1,
              "foundInRaid": false,
              "provided": false,
              "contributions": [
                {
                  "node": "quest:q3",
                  "objectiveIndex": 0,
                  "quantity": 1,
                  "disposition": "kept",
                  "foundInRaid": false,
                  "provided": false
                }
              ]
            },
            "salewa": {
              "itemId": "salewa",
              "itemName": "Salewa",
              "requiredQuantity": 3,
              "outstandingQuantity": 3,
              "foundInRaid": false,
              "provided": true,
              "contributions": [
                {
                  "node": "quest:q2",
                  "objectiveIndex": 1,
                  "quantity": 3,
                  "disposition": "consumed",
                  "foundInRaid": false,
                  "provided": true
                }
              ]
            }
          }
        }
        "#);
    }
}
