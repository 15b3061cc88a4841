use postgres::{Client, NoTls, Row};
use thiserror::Error;
use std::time::Instant;

use crate::graph::{GraphError, RoadNetwork};
use crate::types::{EdgeRecord, Location, NodeId};

// Node positions come from the point geometry, not from the x/y columns,
// so tables written by any importer with a `geometry` column work.
const NODES_QUERY: &str =
    "SELECT osmid::bigint, ST_Y(geometry)::double precision, ST_X(geometry)::double precision FROM nodes";
const EDGES_QUERY: &str =
    "SELECT u::bigint, v::bigint, key::bigint, length::double precision FROM edges";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("database error: {0}")]
    Database(#[from] postgres::Error),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

fn parse_node(row: &Row) -> Result<(NodeId, Location), postgres::Error> {
    let id: i64 = row.try_get(0)?;
    let latitude: f64 = row.try_get(1)?;
    let longitude: f64 = row.try_get(2)?;
    Ok((id, Location { latitude, longitude }))
}

fn parse_edge(row: &Row) -> Result<EdgeRecord, postgres::Error> {
    Ok(EdgeRecord {
        u: row.try_get(0)?,
        v: row.try_get(1)?,
        key: row.try_get(2)?,
        length_m: row.try_get(3)?,
    })
}

/// Reads the whole `nodes` and `edges` tables and builds the base graph.
///
/// Blocking: call it before the async runtime is started.
pub fn load_from_postgis(database_url: &str) -> Result<RoadNetwork, LoadError> {
    let started = Instant::now();
    log::info!("Loading map data from PostGIS...");
    let mut client = Client::connect(database_url, NoTls)?;
    let network = read_network(&mut client)?;
    log::info!(
        "Map data loaded: {} nodes, {} edges in {:.1}s",
        network.node_count(),
        network.edge_count(),
        started.elapsed().as_secs_f32()
    );
    Ok(network)
}

fn read_network(client: &mut Client) -> Result<RoadNetwork, LoadError> {
    let nodes = client
        .query(NODES_QUERY, &[])?
        .iter()
        .map(parse_node)
        .collect::<Result<Vec<_>, _>>()?;
    let edges = client
        .query(EDGES_QUERY, &[])?
        .iter()
        .map(parse_edge)
        .collect::<Result<Vec<_>, _>>()?;
    log::info!("Fetched {} node rows and {} edge rows", nodes.len(), edges.len());
    Ok(RoadNetwork::build(nodes, edges)?)
}
