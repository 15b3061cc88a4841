// ** Coordinates **

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

// ** Road network types **

// OSM ids are stored as `bigint` in the nodes/edges tables.
pub type NodeId = i64;

// A single directed segment going out from a node to a neighbouring one.
// Several segments may share the same `end` (parallel edges, told apart by `key`).
#[derive(Clone, Debug, PartialEq)]
pub struct SegmentInfo {
    pub end: NodeId,
    pub key: i64,
    pub length_m: f64,
}

#[derive(Clone, Debug)]
pub struct NodeInfo {
    pub location: Location,
    pub connections: Vec<SegmentInfo>,
}

/// One row of the `edges` table, before it is attached to its start node.
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeRecord {
    pub u: NodeId,
    pub v: NodeId,
    pub key: i64,
    pub length_m: f64,
}

impl EdgeRecord {
    pub fn new(u: NodeId, v: NodeId, key: i64, length_m: f64) -> Self {
        EdgeRecord { u, v, key, length_m }
    }
}
