use rstar::{PointDistance, RTree, RTreeObject, AABB};
use thiserror::Error;

use std::collections::HashMap;

use crate::types::{EdgeRecord, Location, NodeId, NodeInfo, SegmentInfo};

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("edge {u} -> {v} (key {key}) has invalid length {length_m}")]
    InvalidLength { u: NodeId, v: NodeId, key: i64, length_m: f64 },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("node {0} is not in the graph")]
    UnknownNode(NodeId),
}

// Node position stored in the spatial index, as [longitude, latitude].
struct IndexedNode {
    id: NodeId,
    position: [f64; 2],
}

impl RTreeObject for IndexedNode {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

// Planar distance in degrees: only used to pick the candidate,
// the reported distance is recomputed with haversine.
impl PointDistance for IndexedNode {
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        dx * dx + dy * dy
    }
}

pub fn distance_meters(a: &Location, b: &Location) -> f64 {
    let ap = haversine_rs::point::Point { latitude: a.latitude, longitude: a.longitude };
    let bp = haversine_rs::point::Point { latitude: b.latitude, longitude: b.longitude };
    haversine_rs::distance(ap, bp, haversine_rs::units::Unit::Meters)
}

/// The read-only base graph: a directed multigraph keyed by OSM node id.
pub struct RoadNetwork {
    nodes: HashMap<NodeId, NodeInfo>,
    index: RTree<IndexedNode>,
    edge_count: usize,
}

impl RoadNetwork {
    /// Builds the base graph from node positions and edge rows.
    ///
    /// Edges whose endpoints are missing from `nodes` are dropped with a warning;
    /// an edge with a negative or non-finite length fails the whole build.
    pub fn build<N, E>(nodes: N, edges: E) -> Result<Self, GraphError>
    where
        N: IntoIterator<Item = (NodeId, Location)>,
        E: IntoIterator<Item = EdgeRecord>,
    {
        let mut graph: HashMap<NodeId, NodeInfo> = HashMap::new();
        for (id, location) in nodes {
            if graph.insert(id, NodeInfo { location, connections: Vec::new() }).is_some() {
                log::warn!("Duplicate node {}, keeping the last position", id);
            }
        }

        let mut edge_count = 0;
        let mut dangling = 0;
        for edge in edges {
            if !edge.length_m.is_finite() || edge.length_m < 0.0 {
                return Err(GraphError::InvalidLength {
                    u: edge.u,
                    v: edge.v,
                    key: edge.key,
                    length_m: edge.length_m,
                });
            }
            if !graph.contains_key(&edge.v) {
                dangling += 1;
                continue;
            }
            match graph.get_mut(&edge.u) {
                Some(start) => {
                    start.connections.push(SegmentInfo { end: edge.v, key: edge.key, length_m: edge.length_m });
                    edge_count += 1;
                }
                None => dangling += 1,
            }
        }
        if dangling > 0 {
            log::warn!("Skipped {} edges referencing unknown nodes", dangling);
        }

        let index = RTree::bulk_load(
            graph
                .iter()
                .map(|(id, info)| IndexedNode {
                    id: *id,
                    position: [info.location.longitude, info.location.latitude],
                })
                .collect(),
        );

        Ok(RoadNetwork { nodes: graph, index, edge_count })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&NodeInfo> {
        self.nodes.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Closest node to `point` and its distance in meters, or `None` on an empty graph.
    pub fn nearest_node(&self, point: &Location) -> Option<(NodeId, f64)> {
        let nearest = self.index.nearest_neighbor(&[point.longitude, point.latitude])?;
        let location = &self.nodes.get(&nearest.id)?.location;
        Some((nearest.id, distance_meters(point, location)))
    }
}

/// Estimate of the remaining cost used to order the A* frontier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Heuristic {
    /// No estimate: the search expands nodes in plain Dijkstra order.
    #[default]
    Zero,
    /// Great-circle distance to the goal, scaled by the cost multiplier.
    Haversine,
}

impl Heuristic {
    pub fn estimate(&self, from: &Location, goal: &Location, multiplier: f64) -> f64 {
        match self {
            Heuristic::Zero => 0.0,
            Heuristic::Haversine => distance_meters(from, goal) * multiplier,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Route {
    pub nodes: Vec<NodeId>,
    pub length_m: f64,
    pub cost: f64,
}

// The search runs on integer millimetres so costs are totally ordered.
fn to_millimetres(meters: f64) -> u64 {
    (meters * 1000.0).round() as u64
}

/// A* search from `start` to `goal`, delegated to `pathfinding`.
///
/// `weight` gives the routing cost of a segment in meters; `estimate` must never
/// exceed the true remaining cost for the result to be optimal. Between two nodes
/// joined by parallel segments the cheapest one is used. Returns `Ok(None)` when
/// the goal cannot be reached.
pub fn astar<W, H>(
    network: &RoadNetwork,
    start: NodeId,
    goal: NodeId,
    weight: W,
    estimate: H,
) -> Result<Option<Route>, SearchError>
where
    W: Fn(&SegmentInfo) -> f64,
    H: Fn(&Location, &Location) -> f64,
{
    if !network.contains(start) {
        return Err(SearchError::UnknownNode(start));
    }
    let goal_location = network.node(goal).ok_or(SearchError::UnknownNode(goal))?.location;

    let found = pathfinding::prelude::astar(
        &start,
        |&id| {
            network
                .node(id)
                .map(|node| {
                    node.connections
                        .iter()
                        .filter(|segment| network.contains(segment.end))
                        .map(|segment| (segment.end, to_millimetres(weight(segment))))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        },
        |&id| {
            network
                .node(id)
                .map(|node| (estimate(&node.location, &goal_location) * 1000.0).floor() as u64)
                .unwrap_or(0)
        },
        |&id| id == goal,
    );

    let Some((nodes, _)) = found else {
        log::info!("No path from {} to {}", start, goal);
        return Ok(None);
    };

    let mut length_m = 0.0;
    let mut cost = 0.0;
    for pair in nodes.windows(2) {
        if let Some(segment) = cheapest_segment(network, pair[0], pair[1], &weight) {
            length_m += segment.length_m;
            cost += weight(segment);
        }
    }
    Ok(Some(Route { nodes, length_m, cost }))
}

fn cheapest_segment<'a, W>(network: &'a RoadNetwork, from: NodeId, to: NodeId, weight: &W) -> Option<&'a SegmentInfo>
where
    W: Fn(&SegmentInfo) -> f64,
{
    network
        .node(from)?
        .connections
        .iter()
        .filter(|segment| segment.end == to)
        .min_by(|a, b| weight(*a).total_cmp(&weight(*b)).then(a.length_m.total_cmp(&b.length_m)))
}
