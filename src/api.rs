//! HTTP surface of the routing service.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::routing::{RouteError, RoutePlanner};
use crate::types::{Location, NodeId};

pub const READY_MESSAGE: &str = "AI Pathfinding API is ready!";
pub const ROUTE_FOUND_MESSAGE: &str = "Smart route found!";

pub fn build_router(planner: Arc<RoutePlanner>) -> Router {
    Router::new()
        .route("/", get(read_root))
        .route("/find_smart_route", get(find_smart_route))
        .route("/nearest_node", get(nearest_node))
        .with_state(planner)
}

pub async fn serve(planner: Arc<RoutePlanner>, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, build_router(planner)).await
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct RouteQuery {
    pub start_node_id: NodeId,
    pub end_node_id: NodeId,
}

#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub message: &'static str,
    pub is_flooded_predicted: bool,
    pub path: Vec<NodeId>,
    pub length_m: f64,
}

#[derive(Debug, Deserialize)]
pub struct NearestQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize)]
pub struct NearestResponse {
    pub node_id: NodeId,
    pub distance_m: f64,
}

/// Error as sent to clients: a status code and an `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError { status, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

impl From<RouteError> for ApiError {
    fn from(err: RouteError) -> Self {
        let status = match &err {
            RouteError::UnknownNode(_) => StatusCode::BAD_REQUEST,
            RouteError::NoPath { .. } => StatusCode::NOT_FOUND,
            RouteError::Weather(_) => StatusCode::BAD_GATEWAY,
            RouteError::Classifier(_) | RouteError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            log::error!("Route request failed: {}", err);
        } else {
            log::info!("Route request rejected: {}", err);
        }
        ApiError::new(status, err.to_string())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, rejection.body_text())
    }
}

async fn read_root() -> Json<MessageResponse> {
    Json(MessageResponse { message: READY_MESSAGE })
}

async fn find_smart_route(
    State(planner): State<Arc<RoutePlanner>>,
    query: Result<Query<RouteQuery>, QueryRejection>,
) -> Result<Json<RouteResponse>, ApiError> {
    let Query(query) = query?;
    let now = chrono::Local::now().naive_local();
    let route = planner.plan(query.start_node_id, query.end_node_id, now).await?;
    Ok(Json(RouteResponse {
        message: ROUTE_FOUND_MESSAGE,
        is_flooded_predicted: route.flood_label.is_flooded(),
        path: route.path,
        length_m: route.length_m,
    }))
}

async fn nearest_node(
    State(planner): State<Arc<RoutePlanner>>,
    query: Result<Query<NearestQuery>, QueryRejection>,
) -> Result<Json<NearestResponse>, ApiError> {
    let Query(query) = query?;
    if !(-90.0..=90.0).contains(&query.lat) || !(-180.0..=180.0).contains(&query.lon) {
        return Err(ApiError::new(StatusCode::BAD_REQUEST, format!("invalid coordinate {}, {}", query.lat, query.lon)));
    }
    let point = Location { latitude: query.lat, longitude: query.lon };
    let (node_id, distance_m) = planner
        .network()
        .nearest_node(&point)
        .ok_or_else(|| ApiError::new(StatusCode::NOT_FOUND, "road network is empty"))?;
    Ok(Json(NearestResponse { node_id, distance_m }))
}
