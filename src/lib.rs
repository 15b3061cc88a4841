pub mod api;
pub mod classifier;
pub mod config;
pub mod cost;
pub mod features;
pub mod graph;
pub mod graph_loader;
pub mod routing;
pub mod types;
pub mod weather;

pub use self::classifier::{FloodClassifier, FloodLabel, ForestModel};
pub use self::graph::{Heuristic, RoadNetwork};
pub use self::routing::{RouteError, RoutePlanner, SmartRoute};
pub use self::types::{Location, NodeId};
pub use self::weather::{OpenWeatherClient, WeatherSnapshot, WeatherSource};
