use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use flood_router::api::build_router;
use flood_router::classifier::ClassifierError;
use flood_router::cost::CostModel;
use flood_router::features::FeatureVector;
use flood_router::types::EdgeRecord;
use flood_router::weather::WeatherError;
use flood_router::{
    FloodClassifier, FloodLabel, ForestModel, Heuristic, Location, OpenWeatherClient, RoadNetwork, RoutePlanner,
    WeatherSnapshot, WeatherSource,
};

struct FixedWeather;

#[async_trait]
impl WeatherSource for FixedWeather {
    async fn current(&self) -> Result<WeatherSnapshot, WeatherError> {
        Ok(WeatherSnapshot { temperature_c: 30.0, humidity_pct: 95.0, wind_speed_ms: 8.0 })
    }
}

struct DownWeather;

#[async_trait]
impl WeatherSource for DownWeather {
    async fn current(&self) -> Result<WeatherSnapshot, WeatherError> {
        Err(WeatherError::Status(500))
    }
}

struct Always(FloodLabel);

impl FloodClassifier for Always {
    fn predict(&self, _: &FeatureVector) -> Result<FloodLabel, ClassifierError> {
        Ok(self.0)
    }
}

struct Broken;

impl FloodClassifier for Broken {
    fn predict(&self, _: &FeatureVector) -> Result<FloodLabel, ClassifierError> {
        Err(ClassifierError::NonFiniteFeature { name: "temp" })
    }
}

// Square 10 -> 11 -> 13 (70m) and 10 -> 12 -> 13 (90m), plus an unreachable node 20.
fn network() -> RoadNetwork {
    let at = |latitude, longitude| Location { latitude, longitude };
    let nodes = vec![
        (10, at(21.0240, 105.8400)),
        (11, at(21.0243, 105.8400)),
        (12, at(21.0240, 105.8403)),
        (13, at(21.0243, 105.8403)),
        (20, at(21.0300, 105.8500)),
    ];
    let edges = vec![
        EdgeRecord::new(10, 11, 0, 35.0),
        EdgeRecord::new(11, 13, 0, 35.0),
        EdgeRecord::new(10, 12, 0, 45.0),
        EdgeRecord::new(12, 13, 0, 45.0),
    ];
    RoadNetwork::build(nodes, edges).unwrap()
}

fn router(weather: Arc<dyn WeatherSource>, classifier: Arc<dyn FloodClassifier>) -> axum::Router {
    let planner = RoutePlanner::new(Arc::new(network()), classifier, weather, CostModel::default(), Heuristic::Zero);
    build_router(Arc::new(planner))
}

async fn get(router: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn root_reports_ready() {
    let (status, body) = get(router(Arc::new(DownWeather), Arc::new(Broken)), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "AI Pathfinding API is ready!"}));
}

#[tokio::test]
async fn route_found_when_clear() {
    let app = router(Arc::new(FixedWeather), Arc::new(Always(FloodLabel::Clear)));
    let (status, body) = get(app, "/find_smart_route?start_node_id=10&end_node_id=13").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Smart route found!");
    assert_eq!(body["is_flooded_predicted"], false);
    assert_eq!(body["path"], json!([10, 11, 13]));
    assert_eq!(body["length_m"], 70.0);
}

#[tokio::test]
async fn flood_flag_follows_the_classifier() {
    let app = router(Arc::new(FixedWeather), Arc::new(Always(FloodLabel::Flooded)));
    let (status, body) = get(app, "/find_smart_route?start_node_id=10&end_node_id=13").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_flooded_predicted"], true);
    assert_eq!(body["path"], json!([10, 11, 13]));
}

#[tokio::test]
async fn same_start_and_end() {
    let app = router(Arc::new(FixedWeather), Arc::new(Always(FloodLabel::Clear)));
    let (status, body) = get(app, "/find_smart_route?start_node_id=12&end_node_id=12").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["path"], json!([12]));
}

#[tokio::test]
async fn no_path_is_not_found() {
    let app = router(Arc::new(FixedWeather), Arc::new(Always(FloodLabel::Clear)));
    let (status, body) = get(app, "/find_smart_route?start_node_id=10&end_node_id=20").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "No path found between 10 and 20"}));
}

#[tokio::test]
async fn unknown_node_is_bad_request() {
    let app = router(Arc::new(FixedWeather), Arc::new(Always(FloodLabel::Clear)));
    let (status, body) = get(app, "/find_smart_route?start_node_id=10&end_node_id=999").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("999"));
}

#[tokio::test]
async fn malformed_query_is_bad_request() {
    let app = router(Arc::new(FixedWeather), Arc::new(Always(FloodLabel::Clear)));
    let (status, body) = get(app, "/find_smart_route?start_node_id=ten&end_node_id=13").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn weather_outage_is_bad_gateway() {
    let app = router(Arc::new(DownWeather), Arc::new(Always(FloodLabel::Clear)));
    let (status, body) = get(app, "/find_smart_route?start_node_id=10&end_node_id=13").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body["error"].as_str().unwrap().contains("500"));
}

#[tokio::test]
async fn classifier_failure_is_internal_error() {
    let app = router(Arc::new(FixedWeather), Arc::new(Broken));
    let (status, body) = get(app, "/find_smart_route?start_node_id=10&end_node_id=13").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("temp"));
}

#[tokio::test]
async fn nearest_node_snaps_coordinates() {
    let app = router(Arc::new(FixedWeather), Arc::new(Always(FloodLabel::Clear)));
    let (status, body) = get(app, "/nearest_node?lat=21.02431&lon=105.84029").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["node_id"], 13);
    assert!(body["distance_m"].as_f64().unwrap() < 5.0);
}

#[tokio::test]
async fn nearest_node_on_empty_network_is_not_found() {
    let empty = RoadNetwork::build(vec![], vec![]).unwrap();
    let planner = RoutePlanner::new(
        Arc::new(empty),
        Arc::new(Always(FloodLabel::Clear)),
        Arc::new(FixedWeather),
        CostModel::default(),
        Heuristic::Zero,
    );
    let (status, body) = get(build_router(Arc::new(planner)), "/nearest_node?lat=21.02&lon=105.84").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "road network is empty"}));
}

#[tokio::test]
async fn nearest_node_rejects_bad_coordinates() {
    let app = router(Arc::new(FixedWeather), Arc::new(Always(FloodLabel::Clear)));
    let (status, _) = get(app, "/nearest_node?lat=95&lon=105.84").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// Weather provider mocked over HTTP, model loaded from its JSON export.
#[tokio::test]
async fn full_pipeline_with_mocked_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "main": {"temp": 28.0, "humidity": 93},
            "wind": {"speed": 9.5}
        })))
        .mount(&server)
        .await;

    let model = ForestModel::from_json(
        r#"{
            "feature_names": ["temp", "humidity", "wind_speed", "month", "hour", "is_rainy_season"],
            "trees": [[
                {"feature": 1, "threshold": 90.0, "left": 1, "right": 2},
                {"value": 0},
                {"value": 1}
            ]]
        }"#,
    )
    .unwrap();
    let weather = OpenWeatherClient::new(&server.uri(), "key", Location { latitude: 21.0245, longitude: 105.8412 }, None)
        .unwrap();

    let app = router(Arc::new(weather), Arc::new(model));
    let (status, body) = get(app, "/find_smart_route?start_node_id=10&end_node_id=13").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_flooded_predicted"], true);
    assert_eq!(body["path"], json!([10, 11, 13]));
}
