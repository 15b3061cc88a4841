use chrono::NaiveDateTime;
use thiserror::Error;
use std::sync::Arc;

use crate::classifier::{ClassifierError, FloodClassifier, FloodLabel};
use crate::cost::CostModel;
use crate::features::FeatureVector;
use crate::graph::{astar, Heuristic, RoadNetwork, SearchError};
use crate::types::NodeId;
use crate::weather::{WeatherError, WeatherSource};

#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Weather(#[from] WeatherError),
    #[error("flood classifier failed: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("node {0} is not in the road network")]
    UnknownNode(NodeId),
    #[error("No path found between {start} and {end}")]
    NoPath { start: NodeId, end: NodeId },
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<SearchError> for RouteError {
    fn from(err: SearchError) -> Self {
        match err {
            SearchError::UnknownNode(id) => RouteError::UnknownNode(id),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SmartRoute {
    pub flood_label: FloodLabel,
    pub path: Vec<NodeId>,
    pub length_m: f64,
    pub cost: f64,
}

/// Everything a route request needs, built once at startup and shared by all requests.
pub struct RoutePlanner {
    network: Arc<RoadNetwork>,
    classifier: Arc<dyn FloodClassifier>,
    weather: Arc<dyn WeatherSource>,
    cost_model: CostModel,
    heuristic: Heuristic,
}

impl RoutePlanner {
    pub fn new(
        network: Arc<RoadNetwork>,
        classifier: Arc<dyn FloodClassifier>,
        weather: Arc<dyn WeatherSource>,
        cost_model: CostModel,
        heuristic: Heuristic,
    ) -> Self {
        RoutePlanner { network, classifier, weather, cost_model, heuristic }
    }

    pub fn network(&self) -> &RoadNetwork {
        &self.network
    }

    /// Fetches the weather, classifies it, then searches with the matching edge costs.
    ///
    /// Each step runs once, in order; the first failure ends the request.
    pub async fn plan(&self, start: NodeId, end: NodeId, now: NaiveDateTime) -> Result<SmartRoute, RouteError> {
        let weather = self.weather.current().await?;

        let features = FeatureVector::assemble(&weather, now);
        let flood_label = self.classifier.predict(&features)?;
        if flood_label.is_flooded() {
            log::info!("Flooding predicted, increasing travel costs");
        } else {
            log::info!("Weather is clear, using standard travel costs");
        }

        let weight = self.cost_model.weight_fn(flood_label);
        let multiplier = self.cost_model.multiplier(flood_label);
        let heuristic = self.heuristic;
        let network = Arc::clone(&self.network);
        let found = tokio::task::spawn_blocking(move || {
            astar(&network, start, end, weight, |from, goal| heuristic.estimate(from, goal, multiplier))
        })
        .await
        .map_err(|e| RouteError::Internal(e.to_string()))??;

        let route = found.ok_or(RouteError::NoPath { start, end })?;
        log::info!("Route {} -> {}: {} nodes, {:.0} m", start, end, route.nodes.len(), route.length_m);
        Ok(SmartRoute { flood_label, path: route.nodes, length_m: route.length_m, cost: route.cost })
    }
}
